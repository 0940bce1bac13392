use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use ecourts_lib::{
    PortalIdentity, ResultSink, SearchQuery, SearchReply, SearchService, StartedSearch,
};

use crate::output::{print_json, print_record_table, OutputFormat};

#[derive(Args)]
pub struct SearchArgs {
    /// Portal family: high-court or district
    #[arg(long, default_value = "high-court")]
    pub portal: String,

    /// High Court bench code (high-court only)
    #[arg(long)]
    pub court_code: Option<String>,

    /// State code (both portals)
    #[arg(long)]
    pub state_code: String,

    /// District code (district only)
    #[arg(long)]
    pub district_code: Option<String>,

    /// Court complex code, `complex@establishment@flag` (district only)
    #[arg(long)]
    pub complex_code: Option<String>,

    /// Portal case-type code (see `ecourts case-types`)
    #[arg(long)]
    pub case_type: String,

    /// Case number (registration serial)
    #[arg(long)]
    pub case_number: String,

    /// Registration year
    #[arg(long)]
    pub year: String,

    /// Submit the OCR suggestion automatically when one is available
    #[arg(long)]
    pub ocr: bool,
}

fn identity(args: &SearchArgs) -> Result<PortalIdentity> {
    match args.portal.as_str() {
        "high-court" => {
            let Some(court_code) = &args.court_code else {
                bail!("--court-code is required for the high-court portal");
            };
            Ok(PortalIdentity::high_court(court_code, &args.state_code))
        }
        "district" => {
            let (Some(district_code), Some(complex_code)) =
                (&args.district_code, &args.complex_code)
            else {
                bail!("--district-code and --complex-code are required for the district portal");
            };
            Ok(PortalIdentity::district_court(
                &args.state_code,
                district_code,
                complex_code,
            ))
        }
        other => bail!("unknown portal {other:?}, expected high-court or district"),
    }
}

/// Asks for the captcha answer: the OCR suggestion when trusted and
/// `--ocr` is set, otherwise the image goes to a temp file and the answer
/// is read from stdin.
fn captcha_answer(
    session_id: &str,
    image: &[u8],
    suggestion: Option<&str>,
    use_ocr: bool,
) -> Result<String> {
    if use_ocr {
        if let Some(text) = suggestion {
            eprintln!("Submitting OCR suggestion: {text}");
            return Ok(text.to_string());
        }
        eprintln!("No usable OCR suggestion, falling back to manual entry.");
    }

    let path = std::env::temp_dir().join(format!("ecourts_captcha_{session_id}.png"));
    std::fs::write(&path, image).context("writing captcha image")?;
    eprintln!("Captcha image written to {}", path.display());
    if let Some(text) = suggestion {
        eprintln!("OCR suggestion: {text}");
    }
    eprint!("Enter captcha text: ");
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let _ = std::fs::remove_file(&path);

    let answer = answer.trim().to_string();
    if answer.is_empty() {
        bail!("empty captcha answer");
    }
    Ok(answer)
}

pub async fn run(args: &SearchArgs, db_path: &str, format: &OutputFormat) -> Result<()> {
    let identity = identity(args)?;
    let query = SearchQuery::new(&args.case_type, &args.case_number, &args.year);

    let sink = ResultSink::open(db_path)?;
    let service = SearchService::new(sink);

    let StartedSearch {
        session_id,
        mut captcha_image,
        mut suggested_text,
        ..
    } = service.start_search(identity, query).await?;

    loop {
        let answer = captcha_answer(
            &session_id,
            &captcha_image,
            suggested_text.as_deref(),
            args.ocr,
        )?;
        match service.verify_search(&session_id, &answer).await? {
            SearchReply::Case { record } => {
                match format {
                    OutputFormat::Table => print_record_table(&record),
                    OutputFormat::Json => print_json(&record),
                }
                return Ok(());
            }
            SearchReply::NotFound => {
                eprintln!("No matching case found.");
                return Ok(());
            }
            SearchReply::CaptchaRetry {
                captcha_image: image,
                suggested_text: suggestion,
                attempt,
            } => {
                eprintln!("Captcha rejected, fresh challenge issued (attempt {attempt}).");
                captcha_image = image;
                suggested_text = suggestion;
            }
        }
    }
}
