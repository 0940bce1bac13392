//! Best-effort captcha recognition.
//!
//! The portals render short lowercase-alphanumeric codes in a plain font,
//! so recognition is template matching: upscale, grayscale, stretch the
//! contrast, binarize and despeckle, segment on column gaps, then score
//! each glyph against a fixed 5x7 font by Hamming distance. The output is
//! a suggestion with a confidence, never a guarantee; callers fall back
//! to showing the image.

use ecourts_api::{CaptchaChallenge, CaptchaGuess, CaptchaSolver, Error};
use image::GrayImage;

const UPSCALE: u32 = 2;
const INK_THRESHOLD: u8 = 128;
const FONT_WIDTH: usize = 5;
const FONT_HEIGHT: usize = 7;

#[derive(Debug, Default)]
pub struct OcrSolver;

impl OcrSolver {
    pub fn new() -> Self {
        Self
    }

    /// Recognizes the text in a captcha image. Undecodable bytes and
    /// images with no discernible glyphs are [`Error::Recognition`].
    pub fn recognize(&self, image_bytes: &[u8]) -> Result<CaptchaGuess, Error> {
        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| Error::Recognition(format!("undecodable captcha image: {e}")))?;
        let gray = decoded.to_luma8();
        let mut gray = image::imageops::resize(
            &gray,
            gray.width() * UPSCALE,
            gray.height() * UPSCALE,
            image::imageops::FilterType::Nearest,
        );
        stretch_contrast(&mut gray);
        let bitmap = binarize(&gray);
        let glyphs = segment(&bitmap);
        if glyphs.is_empty() {
            return Err(Error::Recognition("no glyphs found in captcha".into()));
        }

        let mut text = String::with_capacity(glyphs.len());
        let mut confidence = 1.0f32;
        for glyph in &glyphs {
            let (ch, score) = best_match(&bitmap, glyph);
            text.push(ch);
            confidence = confidence.min(score);
        }
        tracing::debug!(%text, confidence, glyphs = glyphs.len(), "captcha recognized");
        Ok(CaptchaGuess { text, confidence })
    }
}

impl CaptchaSolver for OcrSolver {
    fn solve(&self, challenge: &CaptchaChallenge) -> Result<CaptchaGuess, Error> {
        self.recognize(challenge.manual())
    }
}

struct Bitmap {
    width: usize,
    height: usize,
    ink: Vec<bool>,
}

impl Bitmap {
    fn get(&self, x: usize, y: usize) -> bool {
        self.ink[y * self.width + x]
    }
}

/// Rescales the gray levels to span the full range, so faint renders
/// still clear the fixed ink threshold. A flat image is left alone.
fn stretch_contrast(gray: &mut GrayImage) {
    let (mut min, mut max) = (u8::MAX, u8::MIN);
    for p in gray.pixels() {
        min = min.min(p.0[0]);
        max = max.max(p.0[0]);
    }
    if min == max {
        return;
    }
    let range = (max - min) as u16;
    for p in gray.pixels_mut() {
        p.0[0] = ((p.0[0] - min) as u16 * 255 / range) as u8;
    }
}

/// Dark-on-light thresholding followed by lone-pixel removal.
fn binarize(gray: &GrayImage) -> Bitmap {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let raw: Vec<bool> = gray.pixels().map(|p| p.0[0] < INK_THRESHOLD).collect();

    let mut ink = vec![false; raw.len()];
    for y in 0..height {
        for x in 0..width {
            if !raw[y * width + x] {
                continue;
            }
            let mut neighbors = 0;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    if nx >= 0
                        && ny >= 0
                        && (nx as usize) < width
                        && (ny as usize) < height
                        && raw[ny as usize * width + nx as usize]
                    {
                        neighbors += 1;
                    }
                }
            }
            ink[y * width + x] = neighbors >= 2;
        }
    }
    Bitmap { width, height, ink }
}

/// Bounding box of one glyph in the bitmap.
struct Glyph {
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
}

/// Splits the bitmap into glyphs on empty columns and trims each span to
/// its inked rows.
fn segment(bitmap: &Bitmap) -> Vec<Glyph> {
    let mut inked_columns = vec![false; bitmap.width];
    for x in 0..bitmap.width {
        inked_columns[x] = (0..bitmap.height).any(|y| bitmap.get(x, y));
    }

    let mut glyphs = Vec::new();
    let mut start = None;
    for x in 0..=bitmap.width {
        let inked = x < bitmap.width && inked_columns[x];
        match (start, inked) {
            (None, true) => start = Some(x),
            (Some(x0), false) => {
                if let Some(glyph) = row_bounds(bitmap, x0, x) {
                    glyphs.push(glyph);
                }
                start = None;
            }
            _ => {}
        }
    }
    glyphs
}

fn row_bounds(bitmap: &Bitmap, x0: usize, x1: usize) -> Option<Glyph> {
    let inked_row = |y: usize| (x0..x1).any(|x| bitmap.get(x, y));
    let y0 = (0..bitmap.height).find(|&y| inked_row(y))?;
    let y1 = (0..bitmap.height).rev().find(|&y| inked_row(y))?;
    Some(Glyph {
        x0,
        y0,
        width: x1 - x0,
        height: y1 - y0 + 1,
    })
}

/// Scores the glyph against every font template at the template's own
/// trimmed size, sampling the glyph box at cell centers so the match is
/// independent of rendering scale.
fn best_match(bitmap: &Bitmap, glyph: &Glyph) -> (char, f32) {
    let mut best = ('?', 0.0f32);
    for &(ch, rows) in FONT {
        let template = trim_template(rows);
        let cells = template.width * template.height;
        let mut distance = 0usize;
        for ty in 0..template.height {
            for tx in 0..template.width {
                let sx = glyph.x0 + (2 * tx + 1) * glyph.width / (2 * template.width);
                let sy = glyph.y0 + (2 * ty + 1) * glyph.height / (2 * template.height);
                if bitmap.get(sx, sy) != template.ink[ty * template.width + tx] {
                    distance += 1;
                }
            }
        }
        let score = 1.0 - distance as f32 / cells as f32;
        if score > best.1 {
            best = (ch, score);
        }
    }
    best
}

struct Template {
    width: usize,
    height: usize,
    ink: Vec<bool>,
}

/// Trims a 5x7 font entry to its inked bounding box.
fn trim_template(rows: [&str; FONT_HEIGHT]) -> Template {
    let bits: Vec<Vec<bool>> = rows
        .iter()
        .map(|row| row.bytes().map(|b| b == b'1').collect())
        .collect();
    let row_used = |y: usize| bits[y].iter().any(|&b| b);
    let col_used = |x: usize| bits.iter().any(|row| row[x]);

    let y0 = (0..FONT_HEIGHT).find(|&y| row_used(y)).unwrap_or(0);
    let y1 = (0..FONT_HEIGHT).rev().find(|&y| row_used(y)).unwrap_or(0);
    let x0 = (0..FONT_WIDTH).find(|&x| col_used(x)).unwrap_or(0);
    let x1 = (0..FONT_WIDTH).rev().find(|&x| col_used(x)).unwrap_or(0);

    let width = x1 - x0 + 1;
    let height = y1 - y0 + 1;
    let mut ink = Vec::with_capacity(width * height);
    for row in bits.iter().take(y1 + 1).skip(y0) {
        ink.extend(row.iter().take(x1 + 1).skip(x0));
    }
    Template { width, height, ink }
}

/// 5x7 glyph shapes for the portals' lowercase-alphanumeric alphabet.
#[rustfmt::skip]
const FONT: &[(char, [&str; FONT_HEIGHT])] = &[
    ('a', ["01110", "10001", "10001", "11111", "10001", "10001", "10001"]),
    ('b', ["11110", "10001", "11110", "10001", "10001", "10001", "11110"]),
    ('c', ["01110", "10001", "10000", "10000", "10000", "10001", "01110"]),
    ('d', ["11100", "10010", "10001", "10001", "10001", "10010", "11100"]),
    ('e', ["11111", "10000", "11110", "10000", "10000", "10000", "11111"]),
    ('f', ["11111", "10000", "11110", "10000", "10000", "10000", "10000"]),
    ('g', ["01110", "10001", "10000", "10111", "10001", "10001", "01111"]),
    ('h', ["10001", "10001", "11111", "10001", "10001", "10001", "10001"]),
    ('i', ["01110", "00100", "00100", "00100", "00100", "00100", "01110"]),
    ('j', ["00111", "00010", "00010", "00010", "00010", "10010", "01100"]),
    ('k', ["10001", "10010", "10100", "11000", "10100", "10010", "10001"]),
    ('l', ["10000", "10000", "10000", "10000", "10000", "10000", "11111"]),
    ('m', ["10001", "11011", "10101", "10101", "10001", "10001", "10001"]),
    ('n', ["10001", "11001", "10101", "10011", "10001", "10001", "10001"]),
    ('o', ["01110", "10001", "10001", "10001", "10001", "10001", "01110"]),
    ('p', ["11110", "10001", "10001", "11110", "10000", "10000", "10000"]),
    ('q', ["01110", "10001", "10001", "10001", "10101", "10010", "01101"]),
    ('r', ["11110", "10001", "10001", "11110", "10100", "10010", "10001"]),
    ('s', ["01111", "10000", "10000", "01110", "00001", "00001", "11110"]),
    ('t', ["11111", "00100", "00100", "00100", "00100", "00100", "00100"]),
    ('u', ["10001", "10001", "10001", "10001", "10001", "10001", "01110"]),
    ('v', ["10001", "10001", "10001", "10001", "10001", "01010", "00100"]),
    ('w', ["10001", "10001", "10001", "10101", "10101", "11011", "10001"]),
    ('x', ["10001", "01010", "00100", "00100", "00100", "01010", "10001"]),
    ('y', ["10001", "01010", "00100", "00100", "00100", "00100", "00100"]),
    ('z', ["11111", "00001", "00010", "00100", "01000", "10000", "11111"]),
    ('0', ["01110", "10001", "10011", "10101", "11001", "10001", "01110"]),
    ('1', ["00100", "01100", "00100", "00100", "00100", "00100", "01110"]),
    ('2', ["01110", "10001", "00001", "00110", "01000", "10000", "11111"]),
    ('3', ["11111", "00010", "00100", "00010", "00001", "10001", "01110"]),
    ('4', ["00010", "00110", "01010", "10010", "11111", "00010", "00010"]),
    ('5', ["11111", "10000", "11110", "00001", "00001", "10001", "01110"]),
    ('6', ["00110", "01000", "10000", "11110", "10001", "10001", "01110"]),
    ('7', ["11111", "00001", "00010", "00100", "01000", "01000", "01000"]),
    ('8', ["01110", "10001", "10001", "01110", "10001", "10001", "01110"]),
    ('9', ["01110", "10001", "10001", "01111", "00001", "00010", "01100"]),
];
