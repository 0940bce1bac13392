//! Portal identities: which remote eCourts service a search talks to.

use serde::{Deserialize, Serialize};

pub const HIGH_COURT_BASE_URL: &str = "https://hcservices.ecourts.gov.in/hcservices/";
pub const DISTRICT_BASE_URL: &str = "https://services.ecourts.gov.in/";

/// Discriminates the two portal families. They share the captcha-gated
/// two-phase flow but differ in endpoints, form fields, and result markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalKind {
    HighCourt,
    DistrictCourt,
}

impl PortalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortalKind::HighCourt => "high_court",
            PortalKind::DistrictCourt => "district_court",
        }
    }
}

/// Everything needed to address one remote portal. Immutable once a session
/// is opened against it.
///
/// A tagged variant per kind: the two portals carry different selector
/// hierarchies (a High Court bench vs. a state/district/complex triple), and
/// the protocol dispatches on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortalIdentity {
    HighCourt {
        base_url: String,
        /// Bench code, e.g. "1" for Delhi High Court.
        court_code: String,
        state_code: String,
        complex_code: String,
    },
    DistrictCourt {
        base_url: String,
        state_code: String,
        district_code: String,
        /// `complex@establishment@flag` triple as the portal encodes it.
        complex_code: String,
    },
}

impl PortalIdentity {
    /// Identity for a High Court bench on the production portal.
    pub fn high_court(court_code: &str, state_code: &str) -> Self {
        PortalIdentity::HighCourt {
            base_url: HIGH_COURT_BASE_URL.to_string(),
            court_code: court_code.to_string(),
            state_code: state_code.to_string(),
            complex_code: "1".to_string(),
        }
    }

    /// Identity for a district court complex on the production portal.
    pub fn district_court(state_code: &str, district_code: &str, complex_code: &str) -> Self {
        PortalIdentity::DistrictCourt {
            base_url: DISTRICT_BASE_URL.to_string(),
            state_code: state_code.to_string(),
            district_code: district_code.to_string(),
            complex_code: complex_code.to_string(),
        }
    }

    /// Repoints the identity at a custom base URL. Used for testing with
    /// wiremock. The URL must end with a trailing slash.
    pub fn with_base_url(mut self, url: &str) -> Self {
        let normalized = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{}/", url)
        };
        match &mut self {
            PortalIdentity::HighCourt { base_url, .. } => *base_url = normalized,
            PortalIdentity::DistrictCourt { base_url, .. } => *base_url = normalized,
        }
        self
    }

    pub fn kind(&self) -> PortalKind {
        match self {
            PortalIdentity::HighCourt { .. } => PortalKind::HighCourt,
            PortalIdentity::DistrictCourt { .. } => PortalKind::DistrictCourt,
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            PortalIdentity::HighCourt { base_url, .. } => base_url,
            PortalIdentity::DistrictCourt { base_url, .. } => base_url,
        }
    }

    /// The complex code split into its `complex@establishment` parts.
    /// High Court identities have no establishment component.
    pub fn complex_parts(&self) -> (&str, &str) {
        let code = match self {
            PortalIdentity::HighCourt { complex_code, .. } => complex_code,
            PortalIdentity::DistrictCourt { complex_code, .. } => complex_code,
        };
        let mut parts = code.split('@');
        let complex = parts.next().unwrap_or(code);
        let est = parts.next().unwrap_or("");
        (complex, est)
    }
}
