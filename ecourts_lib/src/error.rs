//! Error types for the library layer.

use std::fmt;

use crate::sink::SinkError;

/// Errors produced by the library layer, wrapping protocol errors and
/// adding storage, serialization, and input validation failures.
#[derive(Debug)]
pub enum EcourtsError {
    /// An error from the underlying portal protocol.
    Api(ecourts_api::Error),
    /// The result sink failed to read or write.
    Sink(SinkError),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// Caller-provided input failed validation.
    InvalidInput(String),
    /// No pending search is registered under the given session id.
    UnknownSession(String),
}

impl fmt::Display for EcourtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "portal error: {}", e),
            Self::Sink(e) => write!(f, "sink error: {}", e),
            Self::Serialization(e) => write!(f, "serialization error: {}", e),
            Self::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            Self::UnknownSession(id) => write!(f, "no pending search for session {}", id),
        }
    }
}

impl std::error::Error for EcourtsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Sink(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ecourts_api::Error> for EcourtsError {
    fn from(e: ecourts_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<SinkError> for EcourtsError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

impl From<serde_json::Error> for EcourtsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
