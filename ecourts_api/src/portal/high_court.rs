//! High Court services portal (`hcservices.ecourts.gov.in`).
//!
//! Search replies are JSON with an `Error` field and a `con` array of
//! JSON-encoded strings; the case history is a separate HTML document
//! fetched with the `case_no`/`cino` pair from the accepted search.

use rand::Rng;

use super::{mentions_captcha, VerifyReply};
use crate::{identity::PortalIdentity, session::PortalSession, types::SearchQuery, Error};

const SEARCH_PATH: &str = "cases_qry/index_qry.php?action_code=showRecords";
const HISTORY_PATH: &str = "cases_qry/o_civil_case_history.php";

pub(crate) async fn fetch_captcha(session: &mut PortalSession) -> Result<Vec<u8>, Error> {
    // Random two-digit cache-buster, as the portal's own frontend sends.
    let bust: u8 = rand::thread_rng().gen_range(10..100);
    session
        .get_bytes(&format!("securimage/securimage_show.php?{bust}"))
        .await
}

pub(crate) async fn verify(
    session: &mut PortalSession,
    identity: &PortalIdentity,
    query: &SearchQuery,
    captcha_text: &str,
) -> Result<VerifyReply, Error> {
    let PortalIdentity::HighCourt {
        court_code,
        state_code,
        complex_code,
        ..
    } = identity
    else {
        return Err(Error::Protocol("high court driver given wrong identity".into()));
    };

    let params = vec![
        ("court_code".to_string(), court_code.clone()),
        ("state_code".to_string(), state_code.clone()),
        ("court_complex_code".to_string(), complex_code.clone()),
        ("caseStatusSearchType".to_string(), "CScaseNumber".to_string()),
        ("captcha".to_string(), captcha_text.to_string()),
        ("case_type".to_string(), query.case_type.clone()),
        ("case_no".to_string(), query.case_number.clone()),
        ("rgyear".to_string(), query.year.clone()),
        ("caseNoType".to_string(), "new".to_string()),
        ("displayOldCaseNo".to_string(), "NO".to_string()),
    ];
    let reply = session.post_json(SEARCH_PATH, &params).await?;

    let error = reply
        .get("Error")
        .and_then(|e| e.as_str())
        .ok_or_else(|| Error::Protocol("search reply missing Error field".into()))?;
    if !error.is_empty() {
        return Ok(if mentions_captcha(error) {
            VerifyReply::BadCaptcha(error.to_string())
        } else {
            VerifyReply::NoRecord(reply.to_string())
        });
    }

    let (case_no, cino) = case_handle(&reply)?;
    tracing::debug!(session_id = %session.id(), %case_no, %cino, "search accepted, fetching history");

    let params = vec![
        ("court_code".to_string(), court_code.clone()),
        ("state_code".to_string(), state_code.clone()),
        ("court_complex_code".to_string(), complex_code.clone()),
        ("case_no".to_string(), case_no),
        ("cino".to_string(), cino),
        ("appFlag".to_string(), String::new()),
    ];
    let history = session.post_form(HISTORY_PATH, &params).await?;
    Ok(VerifyReply::Record(history))
}

/// Pulls the `case_no`/`cino` pair out of the accepted search reply. The
/// `con` field is an array of JSON-encoded strings, each an array of case
/// objects.
fn case_handle(reply: &serde_json::Value) -> Result<(String, String), Error> {
    let encoded = reply
        .get("con")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Protocol("search reply missing con payload".into()))?;
    let cases: serde_json::Value = serde_json::from_str(encoded)?;
    let first = cases
        .as_array()
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Protocol("empty con payload in search reply".into()))?;
    let case_no = first
        .get("case_no")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Protocol("con payload missing case_no".into()))?;
    let cino = first
        .get("cino")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Protocol("con payload missing cino".into()))?;
    Ok((case_no.to_string(), cino.to_string()))
}
