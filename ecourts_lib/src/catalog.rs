//! Court, state, district, and case-type catalogs.
//!
//! The High Court bench list and the district-portal state table are fixed
//! and shipped in the binary; districts, court complexes, and case types
//! are looked up live over a [`PortalSession`], since they change as courts
//! are reorganized.

use std::time::Duration;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::EcourtsError;
use ecourts_api::{PortalIdentity, PortalKind, PortalSession};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// One High Court bench as the portal addresses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CourtBench {
    pub court_code: &'static str,
    pub state_code: &'static str,
    pub name: &'static str,
}

/// A code/name pair from a live portal lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
}

/// The High Court benches reachable through the case-status portal.
pub const HIGH_COURT_BENCHES: &[CourtBench] = &[
    CourtBench { court_code: "1", state_code: "26", name: "Delhi High Court" },
    CourtBench { court_code: "2", state_code: "1", name: "Allahabad High Court" },
    CourtBench { court_code: "3", state_code: "2", name: "Andhra Pradesh High Court" },
    CourtBench { court_code: "4", state_code: "3", name: "Bombay High Court" },
    CourtBench { court_code: "5", state_code: "4", name: "Calcutta High Court" },
    CourtBench { court_code: "6", state_code: "5", name: "Chhattisgarh High Court" },
    CourtBench { court_code: "7", state_code: "7", name: "Gujarat High Court" },
    CourtBench { court_code: "8", state_code: "8", name: "Guwahati High Court" },
    CourtBench { court_code: "9", state_code: "9", name: "Himachal Pradesh High Court" },
    CourtBench { court_code: "10", state_code: "10", name: "Jammu & Kashmir High Court" },
    CourtBench { court_code: "11", state_code: "11", name: "Jharkhand High Court" },
    CourtBench { court_code: "12", state_code: "12", name: "Karnataka High Court" },
    CourtBench { court_code: "13", state_code: "13", name: "Kerala High Court" },
    CourtBench { court_code: "14", state_code: "14", name: "Madhya Pradesh High Court" },
    CourtBench { court_code: "15", state_code: "15", name: "Madras High Court" },
    CourtBench { court_code: "16", state_code: "17", name: "Orissa High Court" },
    CourtBench { court_code: "17", state_code: "18", name: "Patna High Court" },
    CourtBench { court_code: "18", state_code: "19", name: "Punjab & Haryana High Court" },
    CourtBench { court_code: "19", state_code: "20", name: "Rajasthan High Court" },
    CourtBench { court_code: "20", state_code: "21", name: "Sikkim High Court" },
    CourtBench { court_code: "21", state_code: "22", name: "Telangana High Court" },
    CourtBench { court_code: "22", state_code: "24", name: "Tripura High Court" },
    CourtBench { court_code: "23", state_code: "25", name: "Uttarakhand High Court" },
    CourtBench { court_code: "24", state_code: "27", name: "Manipur High Court" },
    CourtBench { court_code: "25", state_code: "28", name: "Meghalaya High Court" },
];

/// District-portal state names and codes. The codes are portal-internal
/// and do not follow census ordering.
pub const DISTRICT_STATES: &[(&str, &str)] = &[
    ("Andhra Pradesh", "2"),
    ("Arunachal Pradesh", "36"),
    ("Andaman and Nicobar", "28"),
    ("Assam", "6"),
    ("Bihar", "8"),
    ("Chandigarh", "27"),
    ("Chhattisgarh", "18"),
    ("Delhi", "26"),
    ("Goa", "30"),
    ("Gujarat", "17"),
    ("Haryana", "14"),
    ("Himachal Pradesh", "5"),
    ("Jammu and Kashmir", "12"),
    ("Jharkhand", "7"),
    ("Karnataka", "9"),
    ("Kerala", "4"),
    ("Ladakh", "33"),
    ("Lakshadweep", "37"),
    ("Madhya Pradesh", "23"),
    ("Maharashtra", "1"),
    ("Manipur", "25"),
    ("Meghalaya", "21"),
    ("Mizoram", "19"),
    ("Nagaland", "34"),
    ("Uttarakhand", "15"),
    ("Odisha", "11"),
    ("Puducherry", "35"),
    ("Punjab", "22"),
    ("Rajasthan", "3"),
    ("Sikkim", "24"),
    ("Tamil Nadu", "10"),
    ("Telangana", "29"),
    ("The Dadra And Nagar Haveli And Daman And Diu", "38"),
    ("Tripura", "20"),
    ("Uttar Pradesh", "13"),
    ("West Bengal", "16"),
];

/// Live catalog lookups bound to one portal session.
pub struct PortalCatalog {
    identity: PortalIdentity,
    session: PortalSession,
}

impl PortalCatalog {
    /// Opens a session against the portal named by `identity`.
    pub async fn open(identity: PortalIdentity) -> Result<Self, EcourtsError> {
        let session = PortalSession::open(&identity, LOOKUP_TIMEOUT).await?;
        Ok(Self { identity, session })
    }

    pub fn benches() -> &'static [CourtBench] {
        HIGH_COURT_BENCHES
    }

    pub fn states() -> &'static [(&'static str, &'static str)] {
        DISTRICT_STATES
    }

    /// Case types for the bound portal. High Court replies are
    /// `code~name#…` delimited text; district replies are option-list HTML.
    pub async fn case_types(&mut self) -> Result<Vec<CatalogEntry>, EcourtsError> {
        match self.identity.clone() {
            PortalIdentity::HighCourt {
                court_code,
                state_code,
                ..
            } => {
                let params = vec![
                    ("court_code".to_string(), court_code),
                    ("state_code".to_string(), state_code),
                ];
                let body = self
                    .session
                    .post_form("cases_qry/index_qry.php?action_code=fillCaseType", &params)
                    .await?;
                Ok(parse_delimited(&body))
            }
            PortalIdentity::DistrictCourt {
                state_code,
                district_code,
                ..
            } => {
                let (complex, est_code) = {
                    let (complex, est) = self.identity.complex_parts();
                    (complex.to_string(), est.to_string())
                };
                let params = self.session.with_token(vec![
                    ("state_code".to_string(), state_code),
                    ("dist_code".to_string(), district_code),
                    ("court_complex_code".to_string(), complex),
                    ("est_code".to_string(), est_code),
                    ("search_type".to_string(), "c_no".to_string()),
                ]);
                let reply = self
                    .session
                    .post_json("ecourtindia_v6/?p=casestatus/fillCaseType", &params)
                    .await?;
                let html = reply
                    .get("case_type")
                    .or_else(|| reply.get("casetype_list"))
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ecourts_api::Error::Protocol("fillCaseType reply missing option list".into())
                    })?;
                Ok(parse_options(html))
            }
        }
    }

    /// Districts of a state, district portal only.
    pub async fn districts(&mut self, state_code: &str) -> Result<Vec<CatalogEntry>, EcourtsError> {
        self.require_district("districts")?;
        let params = self
            .session
            .with_token(vec![("state_code".to_string(), state_code.to_string())]);
        let reply = self
            .session
            .post_json("ecourtindia_v6/?p=casestatus/fillDistrict", &params)
            .await?;
        let html = reply
            .get("dist_list")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ecourts_api::Error::Protocol("fillDistrict reply missing dist_list".into())
            })?;
        Ok(parse_options(html))
    }

    /// Court complexes of a district. Entry codes are the portal's
    /// `complex@establishment@flag` triples.
    pub async fn court_complexes(
        &mut self,
        state_code: &str,
        district_code: &str,
    ) -> Result<Vec<CatalogEntry>, EcourtsError> {
        self.require_district("court complexes")?;
        let params = self.session.with_token(vec![
            ("state_code".to_string(), state_code.to_string()),
            ("dist_code".to_string(), district_code.to_string()),
        ]);
        let reply = self
            .session
            .post_json("ecourtindia_v6/?p=casestatus/fillcomplex", &params)
            .await?;
        let html = reply
            .get("complex_list")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ecourts_api::Error::Protocol("fillcomplex reply missing complex_list".into())
            })?;
        Ok(parse_options(html))
    }

    fn require_district(&self, what: &str) -> Result<(), EcourtsError> {
        match self.identity.kind() {
            PortalKind::DistrictCourt => Ok(()),
            PortalKind::HighCourt => Err(EcourtsError::InvalidInput(format!(
                "{what} are a district-portal lookup"
            ))),
        }
    }
}

/// Parses the High Court `code~name#code~name#…` case-type format. The
/// `0~Select` entry is dropped, as is a trailing `-CODE` echo in the name.
fn parse_delimited(body: &str) -> Vec<CatalogEntry> {
    body.split('#')
        .filter_map(|item| {
            let (code, name) = item.trim().split_once('~')?;
            let code = code.trim();
            let mut name = name.trim();
            if code.is_empty() || code == "0" || name.to_lowercase().contains("select") {
                return None;
            }
            if let Some((head, tail)) = name.rsplit_once('-') {
                if tail.trim() == code {
                    name = head.trim();
                }
            }
            if name.is_empty() {
                return None;
            }
            Some(CatalogEntry {
                code: code.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

/// Parses `<option value="…">name</option>` lists, dropping placeholder
/// entries.
fn parse_options(html: &str) -> Vec<CatalogEntry> {
    let doc = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse("option") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|option| {
            let code = option.value().attr("value")?.trim().to_string();
            let name = option
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if code.is_empty() || code == "0" || name.is_empty() || name.to_lowercase().contains("select") {
                return None;
            }
            Some(CatalogEntry { code, name })
        })
        .collect()
}
