//! Shared HTML extraction helpers for the case-history parsers.
//!
//! Everything here degrades instead of failing: missing tables yield empty
//! collections and unparseable dates yield `None`, because portals omit
//! sections freely and a partial record is still a valid record.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Collapses runs of whitespace and trims.
pub(super) fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(super) fn element_text(el: ElementRef<'_>) -> String {
    clean(&el.text().collect::<String>())
}

fn table_selector(class: &str) -> Option<Selector> {
    Selector::parse(&format!("table.{class}")).ok()
}

/// Key/value pairs from a label table. Rows carry either one pair
/// (2 cells) or two pairs side by side (4 cells).
pub(super) fn table_pairs(doc: &Html, class: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    let Some(table) = table_selector(class) else {
        return pairs;
    };
    let row_sel = Selector::parse("tr").expect("static selector");
    let cell_sel = Selector::parse("td").expect("static selector");
    for table_el in doc.select(&table) {
        for row in table_el.select(&row_sel) {
            let cells: Vec<String> = row.select(&cell_sel).map(element_text).collect();
            for pair in cells.chunks(2) {
                if let [key, value] = pair {
                    if !key.is_empty() && !value.is_empty() {
                        pairs.insert(key.clone(), value.clone());
                    }
                }
            }
        }
    }
    pairs
}

/// Data rows from a listing table, header rows (th-only) excluded. Each row
/// is the cell texts plus the first link target found in the row, if any:
/// an href, or the quoted argument of a `displayPdf('…')` onclick.
pub(super) fn table_rows(doc: &Html, class: &str) -> Vec<(Vec<String>, Option<String>)> {
    let mut rows = Vec::new();
    let Some(table) = table_selector(class) else {
        return rows;
    };
    let row_sel = Selector::parse("tr").expect("static selector");
    let cell_sel = Selector::parse("td").expect("static selector");
    let link_sel = Selector::parse("a").expect("static selector");
    for table_el in doc.select(&table) {
        for row in table_el.select(&row_sel) {
            let cells: Vec<String> = row.select(&cell_sel).map(element_text).collect();
            if cells.is_empty() {
                continue;
            }
            let link = row.select(&link_sel).find_map(link_target);
            rows.push((cells, link));
        }
    }
    rows
}

fn link_target(a: ElementRef<'_>) -> Option<String> {
    if let Some(href) = a.value().attr("href") {
        let href = href.trim();
        if !href.is_empty() && href != "#" {
            return Some(href.to_string());
        }
    }
    let onclick = a.value().attr("onclick")?;
    let re = Regex::new(r"displayPdf\('([^']+)'\)").expect("static regex");
    re.captures(onclick).map(|cap| cap[1].to_string())
}

/// Party names from the inner HTML of an advocate table cell or span:
/// one name per `<br>`-separated line, advocate annotations and `N)`
/// numbering stripped.
pub(super) fn party_names(inner_html: &str) -> Vec<String> {
    let br = Regex::new(r"(?i)<br\s*/?>").expect("static regex");
    let tag = Regex::new(r"<[^>]+>").expect("static regex");
    let numbering = Regex::new(r"^\d+\)\s*").expect("static regex");
    let advocate = Regex::new(r"(?i)advocate\s*[:\-]?\s*.*$").expect("static regex");

    br.split(inner_html)
        .filter_map(|line| {
            let text = clean(&tag.replace_all(line, " "));
            let text = advocate.replace(&text, "").to_string();
            let name = numbering.replace(text.trim(), "").trim().to_string();
            match name.as_str() {
                "" | "Vs" | "vs" | "V/s" => None,
                _ => Some(name),
            }
        })
        .collect()
}

/// Inner HTML of every cell (or the element itself, for spans) of the
/// elements matching `selector_str`.
pub(super) fn inner_htmls(doc: &Html, selector_str: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };
    doc.select(&selector).map(|el| el.inner_html()).collect()
}

/// Dates appear as dd-mm-yyyy on most pages, with slashed and ISO variants
/// on older benches.
pub(super) fn parse_date(text: &str) -> Option<NaiveDate> {
    let cleaned = clean(text);
    let candidate = cleaned.split(' ').next()?;
    for format in ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
            return Some(date);
        }
    }
    None
}

/// First value whose key contains all of the given lowercase fragments.
pub(super) fn lookup(map: &BTreeMap<String, String>, fragments: &[&str]) -> Option<String> {
    map.iter()
        .find(|(key, _)| {
            let key = key.to_ascii_lowercase();
            fragments.iter().all(|f| key.contains(f))
        })
        .map(|(_, value)| value.clone())
}
