//! Normalized data model: queries, raw payloads, and parsed case records.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The caller-supplied case selector. Immutable once a search begins; the
/// portal hierarchy (bench / district / complex) lives in `PortalIdentity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Portal case-type code, e.g. "134" for W.P.(C) on the Delhi bench.
    pub case_type: String,
    pub case_number: String,
    /// Registration year, four digits.
    pub year: String,
}

impl SearchQuery {
    pub fn new(case_type: &str, case_number: &str, year: &str) -> Self {
        Self {
            case_type: case_type.to_string(),
            case_number: case_number.to_string(),
            year: year.to_string(),
        }
    }
}

/// A portal reply preserved verbatim for audit and offline reparsing.
/// Immutable once captured; a `CaseRecord` is derived from exactly one of
/// these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Id of the session that fetched this payload. The durable query id is
    /// assigned by the result sink when the pair is persisted.
    pub session_id: String,
    pub payload: String,
    pub fetched_at: DateTime<Utc>,
}

impl RawResponse {
    pub fn new(session_id: &str, payload: String) -> Self {
        Self {
            session_id: session_id.to_string(),
            payload,
            fetched_at: Utc::now(),
        }
    }
}

/// Petitioners and respondents in portal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parties {
    pub petitioners: Vec<String>,
    pub respondents: Vec<String>,
}

/// One entry from the order/judgment table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub date: Option<NaiveDate>,
    pub description: String,
    /// Link or portal-internal path to the order document, when present.
    pub document_ref: Option<String>,
}

/// One entry from the hearing history table (district portal only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HearingEntry {
    /// Date the business was taken up.
    pub date: Option<NaiveDate>,
    pub purpose: String,
    /// The next-listing note recorded against the hearing, when present.
    pub outcome: Option<String>,
}

/// Act and sections the case is registered under (district portal only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActEntry {
    pub act: String,
    pub sections: String,
}

/// The single normalized record shape both portals map onto.
///
/// Partial population is valid: portals routinely omit sections, and absent
/// optional data is represented as `None` / empty rather than a parse error.
/// Only the identifying fields (CNR or registration number) are mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Case Number Record, the nationwide unique identifier, when present.
    pub cnr: Option<String>,
    pub registration_number: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub next_hearing_date: Option<NaiveDate>,
    pub parties: Parties,
    pub orders: Vec<OrderEntry>,
    pub hearing_history: Vec<HearingEntry>,
    pub acts: Vec<ActEntry>,
    /// Raw key/value pairs from the case-details table, keys as the portal
    /// labels them. Ordered map so repeated parses serialize identically.
    pub details: BTreeMap<String, String>,
    /// Raw key/value pairs from the case-status table.
    pub status_fields: BTreeMap<String, String>,
}
