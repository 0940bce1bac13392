//! Error taxonomy for the portal protocol and parsers.

use reqwest::StatusCode;

/// Errors produced while driving a portal search or parsing its responses.
///
/// `Transport` and a bad captcha guess are handled inside the protocol up to
/// their bounded retry limits; everything else surfaces to the caller as a
/// typed outcome. `Protocol` and `MalformedResponse` mean the portal changed
/// shape and the scraper needs maintenance, not that the user made a mistake.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Network-level failure: connect error, timeout, TLS failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The portal answered with a non-success HTTP status.
    #[error("unexpected status {status}")]
    HttpStatus { status: StatusCode },
    /// Expected markup or token was absent from an otherwise successful
    /// response. Not retried; the portal layout has changed.
    #[error("portal protocol error: {0}")]
    Protocol(String),
    /// The captcha retry budget was spent without an accepted guess.
    #[error("captcha rejected after {attempts} attempts")]
    CaptchaExhausted { attempts: u32 },
    /// The captcha image could not be decoded or segmented. Solver-internal;
    /// distinct from "solved but wrong", which only verification can reveal.
    #[error("captcha recognition failed: {0}")]
    Recognition(String),
    /// The portal answered cleanly but reported no matching case.
    #[error("no matching case record")]
    NotFound,
    /// A fetched result lacked the mandatory identifying fields
    /// (CNR or registration/case number).
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// A JSON payload from the portal failed to parse.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures worth a bounded retry at the transport level.
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
