//! Caller-facing search façade.
//!
//! Owns the map of in-flight searches keyed by session id, runs OCR over
//! every issued captcha to offer an auto-fill suggestion, and records every
//! query and outcome in the [`ResultSink`]. Sink failures are logged, never
//! fatal: losing history must not lose a live search.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::EcourtsError;
use crate::sink::{QueryRow, ResultSink};
use crate::solver::OcrSolver;
use crate::validation;
use ecourts_api::types::{CaseRecord, SearchQuery};
use ecourts_api::{PortalIdentity, ProtocolConfig, Search, SearchState, VerifyOutcome};

/// Suggestions below this confidence are withheld; the caller then shows
/// the image unprefilled.
const MIN_SUGGESTION_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub protocol: ProtocolConfig,
    /// Pending searches idle longer than this are evicted.
    pub idle_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolConfig::default(),
            idle_timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// A search waiting for its captcha answer.
#[derive(Debug)]
pub struct StartedSearch {
    pub session_id: String,
    /// `None` when the history write failed; the search still runs.
    pub query_id: Option<i64>,
    pub captcha_image: Vec<u8>,
    pub suggested_text: Option<String>,
    pub attempt: u32,
}

/// Outcome of one verification round.
#[derive(Debug)]
pub enum SearchReply {
    Case { record: CaseRecord },
    NotFound,
    CaptchaRetry {
        captcha_image: Vec<u8>,
        suggested_text: Option<String>,
        attempt: u32,
    },
}

struct PendingSearch {
    search: Search,
    query_id: Option<i64>,
    last_touched: Instant,
}

pub struct SearchService {
    sink: ResultSink,
    solver: OcrSolver,
    pending: DashMap<String, PendingSearch>,
    config: ServiceConfig,
}

impl SearchService {
    pub fn new(sink: ResultSink) -> Self {
        Self::with_config(sink, ServiceConfig::default())
    }

    pub fn with_config(sink: ResultSink, config: ServiceConfig) -> Self {
        Self {
            sink,
            solver: OcrSolver::new(),
            pending: DashMap::new(),
            config,
        }
    }

    /// Opens a session, fetches the first captcha, and registers the
    /// pending search. The query is recorded up front so even abandoned
    /// searches leave a history row; a failed history write is logged
    /// and the search proceeds without one.
    pub async fn start_search(
        &self,
        identity: PortalIdentity,
        query: SearchQuery,
    ) -> Result<StartedSearch, EcourtsError> {
        validation::validate_query(&query)?;
        self.evict_idle();

        let query_id = match self.sink.record_query(identity.kind(), &query) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "failed to record query");
                None
            }
        };
        let search = Search::start(identity, query, self.config.protocol.clone()).await?;

        let session_id = search.session_id().to_string();
        let challenge = search.challenge();
        let started = StartedSearch {
            session_id: session_id.clone(),
            query_id,
            captcha_image: challenge.manual().to_vec(),
            suggested_text: self.suggestion(challenge.manual()),
            attempt: challenge.attempt,
        };

        self.pending.insert(
            session_id,
            PendingSearch {
                search,
                query_id,
                last_touched: Instant::now(),
            },
        );
        Ok(started)
    }

    /// Submits a captcha answer for a pending search. On a rejected guess
    /// the search stays pending under the same session id with a fresh
    /// challenge; on any terminal outcome it is deregistered.
    pub async fn verify_search(
        &self,
        session_id: &str,
        captcha_text: &str,
    ) -> Result<SearchReply, EcourtsError> {
        let (_, mut pending) = self
            .pending
            .remove(session_id)
            .ok_or_else(|| EcourtsError::UnknownSession(session_id.to_string()))?;

        match pending.search.verify(captcha_text).await {
            Ok(VerifyOutcome::Complete { record, raw }) => {
                if let Some(query_id) = pending.query_id {
                    if let Err(e) = self.sink.record_result(query_id, Some(&record), &raw) {
                        tracing::warn!(query_id, error = %e, "failed to record result");
                    }
                }
                Ok(SearchReply::Case { record })
            }
            Ok(VerifyOutcome::NotFound { raw }) => {
                if let Some(query_id) = pending.query_id {
                    if let Err(e) = self.sink.record_result(query_id, None, &raw) {
                        tracing::warn!(query_id, error = %e, "failed to record miss");
                    }
                }
                Ok(SearchReply::NotFound)
            }
            Ok(VerifyOutcome::Retry { challenge }) => {
                let reply = SearchReply::CaptchaRetry {
                    captcha_image: challenge.image.clone(),
                    suggested_text: self.suggestion(&challenge.image),
                    attempt: challenge.attempt,
                };
                pending.last_touched = Instant::now();
                self.pending.insert(session_id.to_string(), pending);
                Ok(reply)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drops a pending search, closing its session. Returns whether one
    /// was registered under the id.
    pub fn abandon(&self, session_id: &str) -> bool {
        match self.pending.remove(session_id) {
            Some((_, mut pending)) => {
                pending.search.abort();
                true
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn history(&self, limit: u32) -> Result<Vec<QueryRow>, EcourtsError> {
        Ok(self.sink.history(limit)?)
    }

    fn suggestion(&self, image: &[u8]) -> Option<String> {
        match self.solver.recognize(image) {
            Ok(guess) if guess.confidence >= MIN_SUGGESTION_CONFIDENCE => Some(guess.text),
            Ok(guess) => {
                tracing::debug!(confidence = guess.confidence, "suggestion withheld");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "captcha recognition unavailable");
                None
            }
        }
    }

    fn evict_idle(&self) {
        let timeout = self.config.idle_timeout;
        self.pending.retain(|session_id, pending| {
            let keep = pending.last_touched.elapsed() < timeout
                && pending.search.state() == SearchState::CaptchaIssued;
            if !keep {
                tracing::info!(%session_id, "evicting idle search");
            }
            keep
        });
    }
}
