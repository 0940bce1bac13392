//! The two-phase search protocol state machine.
//!
//! `INIT → CAPTCHA_ISSUED → VERIFYING → RESULT_FETCHED | FAILED`. A search
//! owns its session for its whole life: opened at start, closed at every
//! terminal transition, never reused for another query. A rejected captcha
//! re-issues a fresh challenge on the same session, since a full session
//! renegotiation is what the portals rate-limit, but only up to a bounded
//! attempt budget.

use std::fmt;
use std::time::Duration;

use crate::{
    captcha::{CaptchaChallenge, CaptchaSolver},
    identity::PortalIdentity,
    parser,
    portal::{self, VerifyReply},
    session::PortalSession,
    types::{CaseRecord, RawResponse, SearchQuery},
    Error,
};

/// Retry and timeout policy. The defaults are working values, not an
/// observed portal contract.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Extra attempts after a transport failure while opening the session
    /// or fetching the first captcha. Never applied to semantic errors.
    pub transport_retries: u32,
    /// Total captcha guesses allowed per search before
    /// [`Error::CaptchaExhausted`].
    pub captcha_attempts: u32,
    /// Base backoff between transport retries; doubles per attempt.
    pub backoff: Duration,
    /// Per-request timeout. A hung portal connection must not outlive this.
    pub request_timeout: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            transport_retries: 2,
            captcha_attempts: 3,
            backoff: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Observable protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Init,
    CaptchaIssued,
    Verifying,
    ResultFetched,
    Failed,
}

/// Result of one verification attempt.
#[derive(Debug)]
pub enum VerifyOutcome {
    /// The portal accepted the search and returned case data.
    Complete { record: CaseRecord, raw: RawResponse },
    /// Clean reply, no matching case. The raw reply is preserved so the
    /// sink can still record it for audit.
    NotFound { raw: RawResponse },
    /// Bad captcha guess; a fresh challenge was issued on the same session.
    Retry { challenge: CaptchaChallenge },
}

/// Terminal result of a solver-driven search.
#[derive(Debug)]
pub enum SearchResult {
    Case { record: CaseRecord, raw: RawResponse },
    NotFound { raw: RawResponse },
}

/// One in-flight search against one portal.
pub struct Search {
    identity: PortalIdentity,
    query: SearchQuery,
    config: ProtocolConfig,
    session: PortalSession,
    state: SearchState,
    challenge: CaptchaChallenge,
}

impl Search {
    /// Opens a session and issues the first captcha challenge. Transport
    /// failures here are retried up to `transport_retries` with doubling
    /// backoff; anything else fails immediately.
    pub async fn start(
        identity: PortalIdentity,
        query: SearchQuery,
        config: ProtocolConfig,
    ) -> Result<Self, Error> {
        let mut session = open_with_retries(&identity, &config).await?;
        let image = match captcha_with_retries(&mut session, &identity, &config).await {
            Ok(image) => image,
            Err(e) => {
                session.close();
                return Err(e);
            }
        };
        let challenge = CaptchaChallenge::new(session.id(), image, 1);
        tracing::info!(session_id = %session.id(), kind = identity.kind().as_str(), "search started, captcha issued");
        Ok(Self {
            identity,
            query,
            config,
            session,
            state: SearchState::CaptchaIssued,
            challenge,
        })
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    pub fn session_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// The currently outstanding challenge. Each issuance is valid for
    /// exactly one verification attempt.
    pub fn challenge(&self) -> &CaptchaChallenge {
        &self.challenge
    }

    pub fn identity(&self) -> &PortalIdentity {
        &self.identity
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Submits the search with a captcha guess.
    ///
    /// On a rejected guess a fresh challenge is issued on the same session,
    /// until the attempt budget is spent. Transport failures here are
    /// terminal: replaying a verify POST could double-submit a consumed
    /// captcha issuance. The session is closed at every terminal
    /// transition, whatever the parse outcome.
    pub async fn verify(&mut self, captcha_text: &str) -> Result<VerifyOutcome, Error> {
        if self.state != SearchState::CaptchaIssued {
            return Err(Error::Protocol(format!(
                "verify called in {:?} state",
                self.state
            )));
        }
        self.state = SearchState::Verifying;

        let reply =
            match portal::verify(&mut self.session, &self.identity, &self.query, captcha_text)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    self.fail();
                    return Err(e);
                }
            };

        match reply {
            VerifyReply::BadCaptcha(message) => {
                let attempts = self.challenge.attempt;
                tracing::info!(session_id = %self.session.id(), attempts, %message, "captcha rejected");
                if attempts >= self.config.captcha_attempts {
                    self.fail();
                    return Err(Error::CaptchaExhausted { attempts });
                }
                match portal::fetch_captcha(&mut self.session, &self.identity).await {
                    Ok(image) => {
                        self.challenge =
                            CaptchaChallenge::new(self.session.id(), image, attempts + 1);
                        self.state = SearchState::CaptchaIssued;
                        Ok(VerifyOutcome::Retry {
                            challenge: self.challenge.clone(),
                        })
                    }
                    Err(e) => {
                        self.fail();
                        Err(e)
                    }
                }
            }
            VerifyReply::NoRecord(body) => {
                let raw = RawResponse::new(self.session.id(), body);
                self.fail();
                Ok(VerifyOutcome::NotFound { raw })
            }
            VerifyReply::Record(payload) => {
                let raw = RawResponse::new(self.session.id(), payload);
                self.session.close();
                match parser::parse(self.identity.kind(), &raw) {
                    Ok(record) => {
                        self.state = SearchState::ResultFetched;
                        Ok(VerifyOutcome::Complete { record, raw })
                    }
                    Err(e) => {
                        self.state = SearchState::Failed;
                        Err(e)
                    }
                }
            }
        }
    }

    /// Drives the whole verify loop with an automated solver. A
    /// [`Error::Recognition`] surfaces as-is so the caller can fall back to
    /// manual solving; it is never conflated with a protocol failure.
    pub async fn run_with_solver<S>(mut self, solver: &S) -> Result<SearchResult, Error>
    where
        S: CaptchaSolver + ?Sized,
    {
        loop {
            let guess = solver.solve(&self.challenge)?;
            tracing::debug!(
                session_id = %self.session.id(),
                text = %guess.text,
                confidence = guess.confidence,
                "solver guess"
            );
            match self.verify(&guess.text).await? {
                VerifyOutcome::Complete { record, raw } => {
                    return Ok(SearchResult::Case { record, raw })
                }
                VerifyOutcome::NotFound { raw } => return Ok(SearchResult::NotFound { raw }),
                VerifyOutcome::Retry { .. } => continue,
            }
        }
    }

    /// Abandons the search and releases transport resources. The portal is
    /// not notified; an unverified challenge expires server-side on its own.
    pub fn abort(&mut self) {
        self.fail();
    }

    fn fail(&mut self) {
        self.session.close();
        self.state = SearchState::Failed;
    }
}

impl fmt::Debug for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Search")
            .field("session_id", &self.session.id())
            .field("state", &self.state)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl Drop for Search {
    fn drop(&mut self) {
        // Close is idempotent; this covers callers that drop mid-flow.
        self.session.close();
    }
}

async fn open_with_retries(
    identity: &PortalIdentity,
    config: &ProtocolConfig,
) -> Result<PortalSession, Error> {
    let mut attempt = 0;
    loop {
        match PortalSession::open(identity, config.request_timeout).await {
            Ok(session) => return Ok(session),
            Err(e) if e.is_transient() && attempt < config.transport_retries => {
                let delay = config.backoff * 2u32.pow(attempt);
                tracing::warn!(error = %e, attempt, "session open failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn captcha_with_retries(
    session: &mut PortalSession,
    identity: &PortalIdentity,
    config: &ProtocolConfig,
) -> Result<Vec<u8>, Error> {
    let mut attempt = 0;
    loop {
        match portal::fetch_captcha(session, identity).await {
            Ok(image) => return Ok(image),
            Err(e) if e.is_transient() && attempt < config.transport_retries => {
                let delay = config.backoff * 2u32.pow(attempt);
                tracing::warn!(error = %e, attempt, "captcha fetch failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
