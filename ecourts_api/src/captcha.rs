//! Captcha challenges and the solver contract.

use chrono::{DateTime, Utc};

use crate::Error;

/// A captcha image tied to one open session. Valid for exactly one
/// verification attempt; a rejected guess triggers re-issuance of a fresh
/// challenge on the same session.
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    /// Back-reference to the owning session; non-owning.
    pub session_id: String,
    pub image: Vec<u8>,
    pub issued_at: DateTime<Utc>,
    /// 1-based issuance counter within the owning search.
    pub attempt: u32,
}

impl CaptchaChallenge {
    pub(crate) fn new(session_id: &str, image: Vec<u8>, attempt: u32) -> Self {
        Self {
            session_id: session_id.to_string(),
            image,
            issued_at: Utc::now(),
            attempt,
        }
    }

    /// The raw image, for handing off to a human when automated solving is
    /// disabled or not trusted.
    pub fn manual(&self) -> &[u8] {
        &self.image
    }
}

/// A best-effort reading of a captcha image.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptchaGuess {
    pub text: String,
    /// 0.0..=1.0. Low confidence means "show the image to a human", not an
    /// error; verification is the only source of truth for correctness.
    pub confidence: f32,
}

/// Turns a challenge image into a text guess.
///
/// Solving is an optimization layered above the deterministic verify/retry
/// loop: implementations may be probabilistic, and callers must not assume
/// repeatability. A solver failure ([`Error::Recognition`]) is internal to
/// the solver and never a protocol failure.
pub trait CaptchaSolver {
    fn solve(&self, challenge: &CaptchaChallenge) -> Result<CaptchaGuess, Error>;
}
