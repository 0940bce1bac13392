//! Protocol core for the eCourts case-status portals.
//!
//! Drives the session-bound, captcha-gated search flow of the High Court
//! and District Court portals and normalizes their case-history markup into
//! a single [`types::CaseRecord`] shape. Storage, OCR, and the caller-facing
//! service layer live in `ecourts_lib`.

mod captcha;
mod errors;
mod identity;
pub mod parser;
mod portal;
mod protocol;
mod session;
pub mod types;
mod user_agent;

pub use self::captcha::{CaptchaChallenge, CaptchaGuess, CaptchaSolver};
pub use self::errors::Error;
pub use self::identity::{PortalIdentity, PortalKind, DISTRICT_BASE_URL, HIGH_COURT_BASE_URL};
pub use self::protocol::{
    ProtocolConfig, Search, SearchResult, SearchState, VerifyOutcome,
};
pub use self::session::PortalSession;
pub use self::types::{CaseRecord, RawResponse, SearchQuery};
