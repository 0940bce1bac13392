use chrono::NaiveDate;
use ecourts_api::types::RawResponse;
use ecourts_api::{parser, Error, PortalKind};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn raw(name: &str) -> RawResponse {
    RawResponse::new("feedcafe00000001", load_fixture(name))
}

#[test]
fn high_court_history_extracts_all_sections() {
    let record = parser::parse(PortalKind::HighCourt, &raw("hc_history.html")).unwrap();

    assert_eq!(record.cnr.as_deref(), Some("DLHC010451232022"));
    assert_eq!(record.registration_number.as_deref(), Some("16516/2022"));
    assert_eq!(
        record.filing_date,
        NaiveDate::from_ymd_opt(2022, 11, 1)
    );
    assert_eq!(record.status.as_deref(), Some("Pending"));
    assert_eq!(
        record.next_hearing_date,
        NaiveDate::from_ymd_opt(2023, 2, 15)
    );
    assert_eq!(record.parties.petitioners, vec!["RAJESH KUMAR"]);
    assert_eq!(
        record.parties.respondents,
        vec!["UNION OF INDIA", "GOVT OF NCT OF DELHI"]
    );

    assert_eq!(record.orders.len(), 2);
    assert_eq!(record.orders[0].date, NaiveDate::from_ymd_opt(2022, 11, 9));
    assert_eq!(
        record.orders[0].document_ref.as_deref(),
        Some("https://hcservices.ecourts.gov.in/orders/1.pdf")
    );
    assert_eq!(record.orders[0].description, "HON'BLE THE CHIEF JUSTICE");
}

#[test]
fn district_history_extracts_acts_hearings_and_orders() {
    let record = parser::parse(PortalKind::DistrictCourt, &raw("district_history.html")).unwrap();

    assert_eq!(record.cnr.as_deref(), Some("MHNG030012342016"));
    assert_eq!(record.registration_number.as_deref(), Some("100591/2016"));
    assert_eq!(record.status.as_deref(), Some("Evidence"));

    assert_eq!(record.acts.len(), 2);
    assert_eq!(record.acts[0].act, "Specific Relief Act");
    assert_eq!(record.acts[0].sections, "34");

    assert_eq!(record.hearing_history.len(), 3);
    assert_eq!(
        record.hearing_history[0].date,
        NaiveDate::from_ymd_opt(2016, 7, 21)
    );
    assert_eq!(record.hearing_history[0].purpose, "Appearance");
    assert_eq!(
        record.hearing_history[0].outcome.as_deref(),
        Some("18-08-2016")
    );
    // Last hearing has no onward listing yet.
    assert!(record.hearing_history[2].outcome.is_none());

    assert_eq!(record.orders.len(), 2);
    assert_eq!(
        record.orders[0].document_ref.as_deref(),
        Some("reports/order1.pdf&t=1")
    );
    assert!(record.orders[1].document_ref.is_none());
}

#[test]
fn parsing_is_deterministic_across_runs() {
    let payload = raw("district_history.html");
    let first = parser::parse(PortalKind::DistrictCourt, &payload).unwrap();
    let second = parser::parse(PortalKind::DistrictCourt, &payload).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}

#[test]
fn result_list_yields_partial_record() {
    let record =
        parser::parse(PortalKind::DistrictCourt, &raw("district_result_list.html")).unwrap();
    assert_eq!(
        record.registration_number.as_deref(),
        Some("Reg. Civil Suit/100591/2016")
    );
    assert!(record.cnr.is_none());
    assert!(record.parties.petitioners.is_empty());
    assert!(record.hearing_history.is_empty());
}

#[test]
fn document_without_case_identity_is_malformed() {
    for kind in [PortalKind::HighCourt, PortalKind::DistrictCourt] {
        let result = parser::parse(kind, &raw("malformed.html"));
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }
}

#[test]
fn details_only_document_still_parses() {
    let payload = RawResponse::new(
        "feedcafe00000002",
        r#"<table class="case_details_table">
            <tr><td>CNR Number</td><td>DLHC010000012020</td></tr>
        </table>"#
            .to_string(),
    );
    let record = parser::parse(PortalKind::HighCourt, &payload).unwrap();
    assert_eq!(record.cnr.as_deref(), Some("DLHC010000012020"));
    assert!(record.status.is_none());
    assert!(record.orders.is_empty());
}
