//! District court portal (`services.ecourts.gov.in/ecourtindia_v6`).
//!
//! Every POST carries `ajax_req=true` plus the rotating `app_token`; replies
//! are JSON envelopes wrapping HTML fragments. A successful search needs a
//! second `viewHistory` call, with parameters scraped from an onclick
//! attribute in the first reply, to obtain the full case history.

use scraper::{Html, Selector};

use super::{mentions_captcha, status_ok, VerifyReply};
use crate::{identity::PortalIdentity, session::PortalSession, types::SearchQuery, Error};

const CAPTCHA_PATH: &str = "ecourtindia_v6/?p=casestatus/getCaptcha";
const SEARCH_PATH: &str = "ecourtindia_v6/?p=casestatus/submitCaseNo";
const HISTORY_PATH: &str = "ecourtindia_v6/?p=home/viewHistory";

pub(crate) async fn fetch_captcha(session: &mut PortalSession) -> Result<Vec<u8>, Error> {
    let params = session.with_token(Vec::new());
    let reply = session.post_json(CAPTCHA_PATH, &params).await?;
    let div = reply
        .get("div_captcha")
        .and_then(|d| d.as_str())
        .ok_or_else(|| Error::Protocol("getCaptcha reply missing div_captcha".into()))?;
    let src = captcha_src(div)
        .ok_or_else(|| Error::Protocol("captcha_image tag missing from div_captcha".into()))?;
    session.get_bytes(&src).await
}

pub(crate) async fn verify(
    session: &mut PortalSession,
    identity: &PortalIdentity,
    query: &SearchQuery,
    captcha_text: &str,
) -> Result<VerifyReply, Error> {
    let PortalIdentity::DistrictCourt {
        state_code,
        district_code,
        ..
    } = identity
    else {
        return Err(Error::Protocol("district driver given wrong identity".into()));
    };
    let (complex, est_code) = identity.complex_parts();

    let params = session.with_token(vec![
        ("state_code".to_string(), state_code.clone()),
        ("dist_code".to_string(), district_code.clone()),
        ("court_complex_code".to_string(), complex.to_string()),
        ("est_code".to_string(), est_code.to_string()),
        ("case_type".to_string(), query.case_type.clone()),
        ("case_no".to_string(), query.case_number.clone()),
        ("rgyear".to_string(), query.year.clone()),
        ("case_captcha_code".to_string(), captcha_text.to_string()),
    ]);
    let reply = session.post_json(SEARCH_PATH, &params).await?;

    if !status_ok(&reply) {
        let message = reply
            .get("errormsg")
            .or_else(|| reply.get("error"))
            .and_then(|m| m.as_str())
            .unwrap_or("");
        return Ok(if mentions_captcha(message) {
            VerifyReply::BadCaptcha(message.to_string())
        } else {
            VerifyReply::NoRecord(reply.to_string())
        });
    }

    let case_data = reply
        .get("case_data")
        .and_then(|d| d.as_str())
        .ok_or_else(|| Error::Protocol("submitCaseNo reply missing case_data".into()))?;

    // Without a viewHistory link the result list itself is all the portal
    // offers; parse it as a partial record rather than failing.
    let Some(args) = view_history_args(case_data) else {
        tracing::warn!(session_id = %session.id(), "no viewHistory link, degrading to result-list parse");
        return Ok(VerifyReply::Record(case_data.to_string()));
    };

    let params = session.with_token(vec![
        ("court_code".to_string(), args.court_code),
        ("state_code".to_string(), args.state_code),
        ("dist_code".to_string(), args.dist_code),
        ("court_complex_code".to_string(), args.complex_code),
        ("case_no".to_string(), args.case_no),
        ("cino".to_string(), args.cino),
        ("hideparty".to_string(), args.hideparty),
        ("search_flag".to_string(), args.search_flag),
        ("search_by".to_string(), args.search_by),
    ]);
    let history = session.post_json(HISTORY_PATH, &params).await?;
    match history.get("data_list").and_then(|d| d.as_str()) {
        Some(data_list) if status_ok(&history) => Ok(VerifyReply::Record(data_list.to_string())),
        _ => Ok(VerifyReply::Record(case_data.to_string())),
    }
}

fn captcha_src(div_html: &str) -> Option<String> {
    let doc = Html::parse_fragment(div_html);
    let selector = Selector::parse("img#captcha_image").ok()?;
    let img = doc.select(&selector).next()?;
    img.value().attr("src").map(str::to_string)
}

struct ViewHistoryArgs {
    case_no: String,
    cino: String,
    court_code: String,
    hideparty: String,
    search_flag: String,
    state_code: String,
    dist_code: String,
    complex_code: String,
    search_by: String,
}

/// Scrapes the `viewHistory('…','…',…)` onclick arguments from the result
/// list. Argument order follows the portal's inline handler.
fn view_history_args(case_data: &str) -> Option<ViewHistoryArgs> {
    let doc = Html::parse_fragment(case_data);
    let selector = Selector::parse("a[onclick]").ok()?;
    let onclick = doc
        .select(&selector)
        .filter_map(|a| a.value().attr("onclick"))
        .find(|attr| attr.contains("viewHistory"))?
        .to_string();

    let start = onclick.find("viewHistory(")? + "viewHistory(".len();
    let end = onclick[start..].find(')')? + start;
    let args: Vec<String> = onclick[start..end]
        .split(',')
        .map(|arg| arg.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .collect();
    if args.len() < 9 {
        return None;
    }
    Some(ViewHistoryArgs {
        case_no: args[0].clone(),
        cino: args[1].clone(),
        court_code: args[2].clone(),
        hideparty: args[3].clone(),
        search_flag: args[4].clone(),
        state_code: args[5].clone(),
        dist_code: args[6].clone(),
        complex_code: args[7].clone(),
        search_by: args[8].clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captcha_src_found_in_div() {
        let div = r#"<div><img id="captcha_image" src="/ecourtindia_v6/vendor/securimage/securimage_show.php?x=1" alt=""></div>"#;
        assert_eq!(
            captcha_src(div).as_deref(),
            Some("/ecourtindia_v6/vendor/securimage/securimage_show.php?x=1")
        );
        assert!(captcha_src("<div>no image</div>").is_none());
    }

    #[test]
    fn view_history_args_parsed_from_onclick() {
        let html = r##"<table><tr><td>
            <a href="#" onclick="viewHistory('100591/2016','MHNG030012342016','2','N','CScaseNumber','1','22','1010','CSCaseNumber'); return false;">View</a>
        </td></tr></table>"##;
        let args = view_history_args(html).unwrap();
        assert_eq!(args.case_no, "100591/2016");
        assert_eq!(args.cino, "MHNG030012342016");
        assert_eq!(args.court_code, "2");
        assert_eq!(args.search_by, "CSCaseNumber");
    }

    #[test]
    fn missing_or_short_onclick_yields_none() {
        assert!(view_history_args("<div><a href='#'>View</a></div>").is_none());
        assert!(view_history_args(
            r#"<a onclick="viewHistory('a','b')">View</a>"#
        )
        .is_none());
    }
}
