//! High Court case-history markup.
//!
//! Details in `case_details_table`, status in `table_r`, parties in
//! `Petitioner_Advocate_table`/`Respondent_Advocate_table` spans, orders in
//! a five-column `order_table` (number, case no, judge, date, view link).

use scraper::Html;

use super::html::{inner_htmls, parse_date, party_names, table_pairs, table_rows};
use crate::types::{CaseRecord, OrderEntry};

pub(super) fn parse(payload: &str) -> CaseRecord {
    let doc = Html::parse_document(payload);

    let details = table_pairs(&doc, "case_details_table");
    let status_fields = table_pairs(&doc, "table_r");
    let mut record = super::empty_record(details, status_fields);

    for cell in inner_htmls(&doc, "span.Petitioner_Advocate_table, table.Petitioner_Advocate_table td") {
        record.parties.petitioners.extend(party_names(&cell));
    }
    for cell in inner_htmls(&doc, "span.Respondent_Advocate_table, table.Respondent_Advocate_table td") {
        record.parties.respondents.extend(party_names(&cell));
    }

    for (cells, link) in table_rows(&doc, "order_table") {
        if cells.len() < 4 {
            continue;
        }
        record.orders.push(OrderEntry {
            date: parse_date(&cells[3]),
            description: cells[2].clone(),
            document_ref: link,
        });
    }

    record
}
