use ecourts_lib::catalog::{CatalogEntry, CourtBench};
use ecourts_lib::sink::QueryRow;
use ecourts_lib::types::CaseRecord;
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct BenchRow {
    #[tabled(rename = "Court Code")]
    #[serde(rename = "Court Code")]
    court_code: &'static str,
    #[tabled(rename = "State Code")]
    #[serde(rename = "State Code")]
    state_code: &'static str,
    #[tabled(rename = "High Court")]
    #[serde(rename = "High Court")]
    name: &'static str,
}

#[derive(Tabled, Serialize)]
struct EntryRow {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Tabled, Serialize)]
struct HistoryRow {
    #[tabled(rename = "Id")]
    #[serde(rename = "Id")]
    id: i64,
    #[tabled(rename = "Portal")]
    #[serde(rename = "Portal")]
    portal: String,
    #[tabled(rename = "Case")]
    #[serde(rename = "Case")]
    case: String,
    #[tabled(rename = "Recorded")]
    #[serde(rename = "Recorded")]
    recorded_at: String,
    #[tabled(rename = "Outcome")]
    #[serde(rename = "Outcome")]
    outcome: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn print_benches_table(benches: &[CourtBench]) {
    println!("{}", Table::new(build_bench_rows(benches)));
}

pub fn print_entries_table(entries: &[CatalogEntry]) {
    println!("{}", Table::new(build_entry_rows(entries)));
}

pub fn print_states_table(states: &[(&'static str, &'static str)]) {
    let entries: Vec<CatalogEntry> = states
        .iter()
        .map(|&(name, code)| CatalogEntry {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect();
    print_entries_table(&entries);
}

pub fn print_history_table(rows: &[QueryRow]) {
    println!("{}", Table::new(build_history_rows(rows)));
}

pub fn print_record_table(record: &CaseRecord) {
    println!("{}", Table::new(build_record_rows(record)));
    if !record.orders.is_empty() {
        let orders: Vec<EntryRow> = record
            .orders
            .iter()
            .map(|order| EntryRow {
                code: order
                    .date
                    .map(|d| d.format("%d-%m-%Y").to_string())
                    .unwrap_or_default(),
                name: order.description.clone(),
            })
            .collect();
        println!("{}", Table::new(orders));
    }
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn build_bench_rows(benches: &[CourtBench]) -> Vec<BenchRow> {
    benches
        .iter()
        .map(|bench| BenchRow {
            court_code: bench.court_code,
            state_code: bench.state_code,
            name: bench.name,
        })
        .collect()
}

fn build_entry_rows(entries: &[CatalogEntry]) -> Vec<EntryRow> {
    entries
        .iter()
        .map(|entry| EntryRow {
            code: entry.code.clone(),
            name: entry.name.clone(),
        })
        .collect()
}

fn build_history_rows(rows: &[QueryRow]) -> Vec<HistoryRow> {
    rows.iter()
        .map(|row| HistoryRow {
            id: row.id,
            portal: row.court_type.clone(),
            case: format!(
                "{}/{}/{}",
                row.query.case_type, row.query.case_number, row.query.year
            ),
            recorded_at: row.recorded_at.clone(),
            outcome: match &row.case_data {
                Some(record) => record
                    .cnr
                    .clone()
                    .or_else(|| record.registration_number.clone())
                    .unwrap_or_else(|| "record".to_string()),
                None => "-".to_string(),
            },
        })
        .collect()
}

fn build_record_rows(record: &CaseRecord) -> Vec<FieldRow> {
    let mut rows = Vec::new();
    let mut push = |field: &str, value: String| {
        if !value.is_empty() {
            rows.push(FieldRow {
                field: field.to_string(),
                value,
            });
        }
    };

    push("CNR", record.cnr.clone().unwrap_or_default());
    push(
        "Registration Number",
        record.registration_number.clone().unwrap_or_default(),
    );
    push(
        "Filing Date",
        record
            .filing_date
            .map(|d| d.format("%d-%m-%Y").to_string())
            .unwrap_or_default(),
    );
    push("Status", record.status.clone().unwrap_or_default());
    push(
        "Next Hearing",
        record
            .next_hearing_date
            .map(|d| d.format("%d-%m-%Y").to_string())
            .unwrap_or_default(),
    );
    push("Petitioners", record.parties.petitioners.join("; "));
    push("Respondents", record.parties.respondents.join("; "));
    push(
        "Acts",
        record
            .acts
            .iter()
            .map(|act| format!("{} s.{}", act.act, act.sections))
            .collect::<Vec<_>>()
            .join("; "),
    );
    push("Hearings", record.hearing_history.len().to_string());
    push("Orders", record.orders.len().to_string());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecourts_lib::types::Parties;

    #[test]
    fn history_rows_summarize_query_and_outcome() {
        let rows = build_history_rows(&[QueryRow {
            id: 7,
            court_type: "high_court".to_string(),
            query: ecourts_lib::SearchQuery::new("134", "16516", "2022"),
            recorded_at: "2026-08-30 10:00:00".to_string(),
            case_data: None,
        }]);
        assert_eq!(rows[0].case, "134/16516/2022");
        assert_eq!(rows[0].outcome, "-");
    }

    #[test]
    fn record_rows_skip_empty_fields() {
        let record = CaseRecord {
            cnr: Some("DLHC010451232022".to_string()),
            parties: Parties {
                petitioners: vec!["RAJESH KUMAR".to_string()],
                respondents: Vec::new(),
            },
            ..CaseRecord::default()
        };
        let rows = build_record_rows(&record);
        assert!(rows.iter().any(|r| r.field == "CNR"));
        assert!(rows.iter().any(|r| r.field == "Petitioners"));
        assert!(!rows.iter().any(|r| r.field == "Respondents"));
        assert!(!rows.iter().any(|r| r.field == "Status"));
    }
}
