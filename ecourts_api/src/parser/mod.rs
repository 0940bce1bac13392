//! Pure parsing of portal case-history payloads into [`CaseRecord`]s.
//!
//! Parsing does no I/O: a stored [`RawResponse`] can be replayed through
//! here at any time, and parsing the same payload twice yields an identical
//! record. Missing optional sections degrade to empty fields; only an
//! absent case identity (no CNR and no registration/case number) is an
//! error.

mod district;
mod high_court;
mod html;

use std::collections::BTreeMap;

use crate::{
    identity::PortalKind,
    types::{CaseRecord, RawResponse},
    Error,
};

/// Parses a raw case-history payload for the given portal kind.
pub fn parse(kind: PortalKind, raw: &RawResponse) -> Result<CaseRecord, Error> {
    let record = match kind {
        PortalKind::HighCourt => high_court::parse(&raw.payload),
        PortalKind::DistrictCourt => district::parse(&raw.payload),
    };
    finish(record)
}

/// Applies the shared normalization over the extracted field maps and
/// enforces the mandatory-identity rule.
fn finish(mut record: CaseRecord) -> Result<CaseRecord, Error> {
    if record.cnr.is_none() {
        record.cnr = html::lookup(&record.details, &["cnr"]).map(|v| html::clean(&v));
    }
    if record.registration_number.is_none() {
        record.registration_number = html::lookup(&record.details, &["registration", "number"])
            .or_else(|| html::lookup(&record.details, &["case", "number"]))
            .or_else(|| html::lookup(&record.details, &["case", "no"]))
            .or_else(|| html::lookup(&record.details, &["filing", "number"]));
    }
    if record.filing_date.is_none() {
        record.filing_date = html::lookup(&record.details, &["filing", "date"])
            .as_deref()
            .and_then(html::parse_date);
    }
    if record.status.is_none() {
        record.status = html::lookup(&record.status_fields, &["case", "status"])
            .or_else(|| html::lookup(&record.status_fields, &["stage"]));
    }
    if record.next_hearing_date.is_none() {
        record.next_hearing_date = html::lookup(&record.status_fields, &["next", "date"])
            .as_deref()
            .and_then(html::parse_date);
    }

    if record.cnr.is_none() && record.registration_number.is_none() {
        return Err(Error::MalformedResponse(
            "neither CNR nor registration number present".into(),
        ));
    }
    Ok(record)
}

pub(crate) fn empty_record(
    details: BTreeMap<String, String>,
    status_fields: BTreeMap<String, String>,
) -> CaseRecord {
    CaseRecord {
        details,
        status_fields,
        ..CaseRecord::default()
    }
}
