use std::time::Duration;

use ecourts_api::{
    Error, PortalIdentity, ProtocolConfig, Search, SearchQuery, SearchState, VerifyOutcome,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn identity(server: &MockServer) -> PortalIdentity {
    PortalIdentity::district_court("1", "22", "1010@3@N").with_base_url(&server.uri())
}

fn fast_config() -> ProtocolConfig {
    ProtocolConfig {
        backoff: Duration::from_millis(1),
        ..ProtocolConfig::default()
    }
}

const LANDING: &str = r#"<html><body><form>
<input type="hidden" id="app_token" name="app_token" value="tok1">
</form></body></html>"#;

async fn mount_landing_and_captcha(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ecourtindia_v6/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LANDING))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ecourtindia_v6/"))
        .and(query_param("p", "casestatus/getCaptcha"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "div_captcha": "<img id=\"captcha_image\" src=\"/captcha.png\" alt=\"\">",
            "app_token": "tok2"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/captcha.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a]),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_flow_rotates_token_and_parses_history() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;

    // submitCaseNo must carry the token rotated in by getCaptcha, and
    // viewHistory the one rotated in by submitCaseNo.
    Mock::given(method("POST"))
        .and(path("/ecourtindia_v6/"))
        .and(query_param("p", "casestatus/submitCaseNo"))
        .and(body_string_contains("app_token=tok2"))
        .and(body_string_contains("ajax_req=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "case_data": load_fixture("district_case_data.html"),
            "app_token": "tok3"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ecourtindia_v6/"))
        .and(query_param("p", "home/viewHistory"))
        .and(body_string_contains("app_token=tok3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "data_list": load_fixture("district_history.html"),
            "app_token": "tok4"
        })))
        .mount(&server)
        .await;

    let query = SearchQuery::new("52", "100591", "2016");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();
    assert_eq!(search.state(), SearchState::CaptchaIssued);

    let outcome = search.verify("x9y2z").await.unwrap();
    let VerifyOutcome::Complete { record, raw } = outcome else {
        panic!("expected a completed search");
    };
    assert_eq!(record.cnr.as_deref(), Some("MHNG030012342016"));
    assert_eq!(record.registration_number.as_deref(), Some("100591/2016"));
    assert_eq!(record.status.as_deref(), Some("Evidence"));
    assert_eq!(record.parties.petitioners, vec!["SUNITA DEVI"]);
    assert_eq!(record.acts.len(), 2);
    assert_eq!(record.hearing_history.len(), 3);
    assert_eq!(record.orders.len(), 2);
    assert_eq!(
        record.orders[0].document_ref.as_deref(),
        Some("reports/order1.pdf&t=1")
    );
    assert!(raw.payload.contains("history_table"));
    assert!(search.session_closed());
}

#[tokio::test]
async fn missing_app_token_is_a_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ecourtindia_v6/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>bare</body></html>"))
        .mount(&server)
        .await;

    let query = SearchQuery::new("52", "100591", "2016");
    let err = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn rejected_captcha_yields_fresh_challenge() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;

    Mock::given(method("POST"))
        .and(path("/ecourtindia_v6/"))
        .and(query_param("p", "casestatus/submitCaseNo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "errormsg": "Invalid Captcha",
            "app_token": "tok3"
        })))
        .mount(&server)
        .await;

    let query = SearchQuery::new("52", "100591", "2016");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();
    let outcome = search.verify("wrong").await.unwrap();
    let VerifyOutcome::Retry { challenge } = outcome else {
        panic!("expected a fresh challenge");
    };
    assert_eq!(challenge.attempt, 2);
    assert_eq!(search.state(), SearchState::CaptchaIssued);
    assert!(!search.session_closed());
}

#[tokio::test]
async fn result_list_without_history_degrades_to_partial_record() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;

    Mock::given(method("POST"))
        .and(path("/ecourtindia_v6/"))
        .and(query_param("p", "casestatus/submitCaseNo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "case_data": load_fixture("district_result_list.html"),
            "app_token": "tok3"
        })))
        .mount(&server)
        .await;

    let query = SearchQuery::new("52", "100591", "2016");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();
    let outcome = search.verify("x9y2z").await.unwrap();
    let VerifyOutcome::Complete { record, .. } = outcome else {
        panic!("expected a partial record");
    };
    assert_eq!(
        record.registration_number.as_deref(),
        Some("Reg. Civil Suit/100591/2016")
    );
    assert!(record.cnr.is_none());
    assert!(record.orders.is_empty());
}

#[tokio::test]
async fn no_matching_case_reports_not_found() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;

    Mock::given(method("POST"))
        .and(path("/ecourtindia_v6/"))
        .and(query_param("p", "casestatus/submitCaseNo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "errormsg": "There is no case",
            "app_token": "tok3"
        })))
        .mount(&server)
        .await;

    let query = SearchQuery::new("52", "424242", "2016");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();
    let outcome = search.verify("x9y2z").await.unwrap();
    let VerifyOutcome::NotFound { raw } = outcome else {
        panic!("expected a clean miss");
    };
    assert!(raw.payload.contains("There is no case"));
    assert_eq!(search.state(), SearchState::Failed);
    assert!(search.session_closed());
}
