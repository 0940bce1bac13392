use std::time::Duration;

use ecourts_api::{
    Error, PortalIdentity, ProtocolConfig, Search, SearchQuery, SearchState, VerifyOutcome,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn identity(server: &MockServer) -> PortalIdentity {
    PortalIdentity::high_court("31", "26").with_base_url(&server.uri())
}

fn fast_config() -> ProtocolConfig {
    ProtocolConfig {
        backoff: Duration::from_millis(1),
        ..ProtocolConfig::default()
    }
}

async fn mount_landing_and_captcha(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/main.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/securimage/securimage_show.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a]),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn correct_captcha_yields_parsed_record() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;

    let accepted = json!({
        "Error": "",
        "con": ["[{\"case_no\":\"201600016516\",\"cino\":\"DLHC010451232022\"}]"]
    });
    Mock::given(method("POST"))
        .and(path("/cases_qry/index_qry.php"))
        .and(query_param("action_code", "showRecords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&accepted))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cases_qry/o_civil_case_history.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("hc_history.html")))
        .mount(&server)
        .await;

    let query = SearchQuery::new("134", "16516", "2022");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();
    assert_eq!(search.state(), SearchState::CaptchaIssued);
    assert!(!search.challenge().manual().is_empty());
    assert_eq!(search.challenge().attempt, 1);

    let outcome = search.verify("ab1c2d").await.unwrap();
    let VerifyOutcome::Complete { record, raw } = outcome else {
        panic!("expected a completed search");
    };
    assert_eq!(search.state(), SearchState::ResultFetched);
    assert!(search.session_closed());

    assert_eq!(record.cnr.as_deref(), Some("DLHC010451232022"));
    assert_eq!(record.registration_number.as_deref(), Some("16516/2022"));
    assert_eq!(record.status.as_deref(), Some("Pending"));
    assert_eq!(record.parties.petitioners, vec!["RAJESH KUMAR"]);
    assert_eq!(
        record.parties.respondents,
        vec!["UNION OF INDIA", "GOVT OF NCT OF DELHI"]
    );
    assert_eq!(record.orders.len(), 2);
    assert_eq!(raw.session_id, search.session_id());
    assert!(raw.payload.contains("case_details_table"));
}

#[tokio::test]
async fn rejected_captcha_reissues_then_exhausts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/main.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;
    // One issuance at start plus one per rejected guess, three in total.
    Mock::given(method("GET"))
        .and(path("/securimage/securimage_show.php"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cases_qry/index_qry.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Error": "Invalid Captcha"})),
        )
        .mount(&server)
        .await;

    let query = SearchQuery::new("134", "16516", "2022");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();

    let outcome = search.verify("wrong1").await.unwrap();
    let VerifyOutcome::Retry { challenge } = outcome else {
        panic!("expected a fresh challenge");
    };
    assert_eq!(challenge.attempt, 2);
    assert_eq!(search.state(), SearchState::CaptchaIssued);
    assert!(!search.session_closed());

    let outcome = search.verify("wrong2").await.unwrap();
    assert!(matches!(outcome, VerifyOutcome::Retry { ref challenge } if challenge.attempt == 3));

    let err = search.verify("wrong3").await.unwrap_err();
    assert!(matches!(err, Error::CaptchaExhausted { attempts: 3 }));
    assert_eq!(search.state(), SearchState::Failed);
    assert!(search.session_closed());
}

#[tokio::test]
async fn clean_miss_reports_not_found_with_raw_reply() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;
    Mock::given(method("POST"))
        .and(path("/cases_qry/index_qry.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"Error": "Case Code does not exists"})),
        )
        .mount(&server)
        .await;

    let query = SearchQuery::new("134", "99999", "2022");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();

    let outcome = search.verify("ab1c2d").await.unwrap();
    let VerifyOutcome::NotFound { raw } = outcome else {
        panic!("expected a clean miss");
    };
    assert!(raw.payload.contains("Case Code does not exists"));
    assert_eq!(search.state(), SearchState::Failed);
    assert!(search.session_closed());
}

#[tokio::test]
async fn unparseable_history_fails_the_search() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;
    let accepted = json!({
        "Error": "",
        "con": ["[{\"case_no\":\"201600016516\",\"cino\":\"DLHC010451232022\"}]"]
    });
    Mock::given(method("POST"))
        .and(path("/cases_qry/index_qry.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&accepted))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cases_qry/o_civil_case_history.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("malformed.html")))
        .mount(&server)
        .await;

    let query = SearchQuery::new("134", "16516", "2022");
    let mut search = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();
    let err = search.verify("ab1c2d").await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
    assert_eq!(search.state(), SearchState::Failed);
    assert!(search.session_closed());
}

#[tokio::test]
async fn landing_failure_aborts_the_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/main.php"))
        .respond_with(ResponseTemplate::new(500).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let query = SearchQuery::new("134", "16516", "2022");
    let err = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { .. }));
}

#[tokio::test]
async fn transient_open_failures_stop_after_bounded_retries() {
    let server = MockServer::start().await;
    // Every landing reply outlasts the request timeout, so each attempt
    // surfaces as a transport error. Two retries, then done.
    Mock::given(method("GET"))
        .and(path("/main.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("<html>ok</html>"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let config = ProtocolConfig {
        backoff: Duration::from_millis(1),
        request_timeout: Duration::from_millis(50),
        ..ProtocolConfig::default()
    };
    let query = SearchQuery::new("134", "16516", "2022");
    let err = Search::start(identity(&server), query, config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    server.verify().await;
}

#[tokio::test]
async fn http_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/main.php"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let query = SearchQuery::new("134", "16516", "2022");
    let err = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { .. }));
    server.verify().await;
}

#[tokio::test]
async fn concurrent_searches_get_distinct_sessions() {
    let server = MockServer::start().await;
    mount_landing_and_captcha(&server).await;

    let query = SearchQuery::new("134", "16516", "2022");
    let first = Search::start(identity(&server), query.clone(), fast_config())
        .await
        .unwrap();
    let second = Search::start(identity(&server), query, fast_config())
        .await
        .unwrap();
    assert_ne!(first.session_id(), second.session_id());
}
