//! District court case-history markup.
//!
//! Richer than the High Court variant: adds `acts_table`, a four-column
//! `history_table` of hearings, and a three-column `order_table`. The
//! degraded path (a bare result list with no history document) yields only
//! a case number scraped from the first populated cell.

use scraper::{Html, Selector};

use super::html::{clean, element_text, inner_htmls, parse_date, party_names, table_pairs, table_rows};
use crate::types::{ActEntry, CaseRecord, HearingEntry, OrderEntry};

pub(super) fn parse(payload: &str) -> CaseRecord {
    let doc = Html::parse_document(payload);

    let details = table_pairs(&doc, "case_details_table");
    let status_fields = table_pairs(&doc, "case_status_table");
    let mut record = super::empty_record(details, status_fields);

    if record.details.is_empty() {
        // Result-list fallback: no history document was available, so the
        // only identity on offer is the case number in the listing row.
        record.registration_number = first_cell_text(&doc);
        return record;
    }

    for cell in inner_htmls(&doc, "table.Petitioner_Advocate_table td") {
        record.parties.petitioners.extend(party_names(&cell));
    }
    for cell in inner_htmls(&doc, "table.Respondent_Advocate_table td") {
        record.parties.respondents.extend(party_names(&cell));
    }

    for (cells, _) in table_rows(&doc, "acts_table") {
        if cells.len() < 2 {
            continue;
        }
        let act = clean(&cells[0]);
        let sections = clean(&cells[1]);
        if !act.is_empty() || !sections.is_empty() {
            record.acts.push(ActEntry { act, sections });
        }
    }

    // history_table columns: judge, business on date, hearing date, purpose.
    for (cells, _) in table_rows(&doc, "history_table") {
        if cells.len() < 4 {
            continue;
        }
        let entry = HearingEntry {
            date: parse_date(&cells[1]),
            purpose: cells[3].clone(),
            outcome: match cells[2].as_str() {
                "" => None,
                text => Some(text.to_string()),
            },
        };
        if entry.date.is_some() || !entry.purpose.is_empty() {
            record.hearing_history.push(entry);
        }
    }

    for (cells, link) in table_rows(&doc, "order_table") {
        if cells.len() < 3 {
            continue;
        }
        record.orders.push(OrderEntry {
            date: parse_date(&cells[1]),
            description: cells[2].clone(),
            document_ref: link,
        });
    }

    record
}

fn first_cell_text(doc: &Html) -> Option<String> {
    let selector = Selector::parse("td").ok()?;
    doc.select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}
