//! Library layer for the eCourts case-search core: catalogs, captcha OCR,
//! SQLite history, and the search service façade.
//!
//! Wraps the `ecourts_api` protocol crate with input validation, an
//! automated captcha solver, durable query history, and the session map a
//! UI layer drives through `start_search` / `verify_search`.

pub mod catalog;
pub mod error;
pub mod service;
pub mod sink;
pub mod solver;
pub mod validation;

pub use ecourts_api;
pub use ecourts_api::types;
pub use ecourts_api::{
    CaptchaSolver, PortalIdentity, PortalKind, ProtocolConfig, SearchQuery,
};

pub use catalog::{CatalogEntry, CourtBench, PortalCatalog, DISTRICT_STATES, HIGH_COURT_BENCHES};
pub use error::EcourtsError;
pub use service::{SearchReply, SearchService, ServiceConfig, StartedSearch};
pub use sink::{QueryRow, ResultSink, SinkError};
pub use solver::OcrSolver;
