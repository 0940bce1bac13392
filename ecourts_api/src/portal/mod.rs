//! Per-portal wire drivers.
//!
//! Each portal kind implements the same contract (fetch a captcha image,
//! submit the search with a captcha guess, fetch the case history) over its
//! own endpoints and markup. Dispatch is a `match` on the identity variant.

mod district;
mod high_court;

use crate::{identity::PortalIdentity, session::PortalSession, types::SearchQuery, Error};

/// Outcome of submitting a search with a captcha guess.
#[derive(Debug)]
pub(crate) enum VerifyReply {
    /// Accepted: the case-history payload to hand to the parser.
    Record(String),
    /// The portal rejected the captcha guess. Carries the portal's message.
    BadCaptcha(String),
    /// The portal accepted the request but found no matching case. Carries
    /// the raw reply body for audit storage.
    NoRecord(String),
}

pub(crate) async fn fetch_captcha(
    session: &mut PortalSession,
    identity: &PortalIdentity,
) -> Result<Vec<u8>, Error> {
    match identity {
        PortalIdentity::HighCourt { .. } => high_court::fetch_captcha(session).await,
        PortalIdentity::DistrictCourt { .. } => district::fetch_captcha(session).await,
    }
}

pub(crate) async fn verify(
    session: &mut PortalSession,
    identity: &PortalIdentity,
    query: &SearchQuery,
    captcha_text: &str,
) -> Result<VerifyReply, Error> {
    match identity {
        PortalIdentity::HighCourt { .. } => {
            high_court::verify(session, identity, query, captcha_text).await
        }
        PortalIdentity::DistrictCourt { .. } => {
            district::verify(session, identity, query, captcha_text).await
        }
    }
}

/// Both portals report `status` as either the string `"1"` or the number 1.
pub(crate) fn status_ok(value: &serde_json::Value) -> bool {
    match value.get("status") {
        Some(serde_json::Value::String(s)) => s == "1",
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

/// Bad-captcha rejections are signaled in-band by message text; anything
/// else on an otherwise clean reply means no matching record.
pub(crate) fn mentions_captcha(message: &str) -> bool {
    message.to_ascii_lowercase().contains("captcha")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_ok_accepts_string_and_number() {
        assert!(status_ok(&json!({"status": "1"})));
        assert!(status_ok(&json!({"status": 1})));
        assert!(!status_ok(&json!({"status": "0"})));
        assert!(!status_ok(&json!({"error": "x"})));
    }

    #[test]
    fn captcha_rejections_are_recognized() {
        assert!(mentions_captcha("Invalid Captcha"));
        assert!(mentions_captcha("CAPTCHA mismatch, try again"));
        assert!(!mentions_captcha("Record not found"));
    }
}
