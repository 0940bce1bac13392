//! Per-search portal sessions: cookie jar, hidden tokens, and transport.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use scraper::{Html, Selector};
use url::Url;

use crate::{
    identity::{PortalIdentity, PortalKind},
    user_agent::get_user_agent,
    Error,
};

/// One logical conversation with a remote portal.
///
/// Owns a dedicated cookie jar and, for the district portal, the rotating
/// `app_token` hidden field. A session is owned exclusively by one in-flight
/// search and never pooled or shared; transport resources release when the
/// session drops.
pub struct PortalSession {
    id: String,
    kind: PortalKind,
    base_url: String,
    http: reqwest::Client,
    app_token: Option<String>,
    created_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
    closed: bool,
}

impl PortalSession {
    /// Opens a session: builds a cookie-holding client, performs the landing
    /// GET, and captures any hidden state tokens embedded in the page.
    ///
    /// Fails with [`Error::Transport`] on network failure and
    /// [`Error::Protocol`] if the landing page lacks an expected token
    /// (portal markup changed). No retry logic lives here; retry policy
    /// belongs to the protocol layer.
    pub async fn open(identity: &PortalIdentity, timeout: Duration) -> Result<Self, Error> {
        let base_url = identity.base_url().to_string();
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(timeout)
            .cookie_store(true)
            .default_headers(browser_headers(&base_url))
            .build()?;

        let mut session = Self {
            id: new_session_id(),
            kind: identity.kind(),
            base_url,
            http,
            app_token: None,
            created_at: Utc::now(),
            last_used_at: Utc::now(),
            closed: false,
        };

        match session.kind {
            PortalKind::HighCourt => {
                // Landing page only seeds cookies; there is no hidden token.
                session.get_text("main.php").await?;
            }
            PortalKind::DistrictCourt => {
                let landing = session.get_text("ecourtindia_v6/").await?;
                let token = extract_app_token(&landing).ok_or_else(|| {
                    Error::Protocol("app_token input missing from landing page".into())
                })?;
                session.app_token = Some(token);
            }
        }
        tracing::debug!(session_id = %session.id, kind = session.kind.as_str(), "session opened");
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> PortalKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used_at(&self) -> DateTime<Utc> {
        self.last_used_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn app_token(&self) -> Option<&str> {
        self.app_token.as_deref()
    }

    /// Marks the session finished. Idempotent; the cookie jar and connection
    /// pool are released when the session is dropped.
    pub fn close(&mut self) {
        if !self.closed {
            tracing::debug!(session_id = %self.id, "session closed");
            self.closed = true;
        }
    }

    /// GET returning the response body as text, BOM stripped.
    pub async fn get_text(&mut self, path: &str) -> Result<String, Error> {
        self.ensure_open()?;
        let url = self.join(path)?;
        let resp = self.http.get(url).send().await?;
        self.last_used_at = Utc::now();
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { status });
        }
        Ok(strip_bom(resp.text().await?))
    }

    /// GET returning raw bytes; used for captcha images. Accepts absolute
    /// URLs or paths relative to the portal base.
    pub async fn get_bytes(&mut self, path: &str) -> Result<Vec<u8>, Error> {
        self.ensure_open()?;
        let url = self.join(path)?;
        let resp = self.http.get(url).send().await?;
        self.last_used_at = Utc::now();
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { status });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// POSTs a form and returns the body as text.
    pub async fn post_form(
        &mut self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<String, Error> {
        self.ensure_open()?;
        let url = self.join(path)?;
        let resp = self
            .http
            .post(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(params)
            .send()
            .await?;
        self.last_used_at = Utc::now();
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            tracing::error!(session_id = %self.id, %status, body = %truncate(&body), "portal request failed");
            return Err(Error::HttpStatus { status });
        }
        Ok(strip_bom(body))
    }

    /// POSTs a form and parses the JSON reply. Cookies are adopted by the
    /// jar and, when the reply carries a rotated `app_token`, the token is
    /// replaced in the same call: the pair always moves as one unit.
    pub async fn post_json(
        &mut self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<serde_json::Value, Error> {
        let body = self.post_form(path, params).await?;
        let value: serde_json::Value = serde_json::from_str(body.trim()).map_err(|e| {
            tracing::error!(session_id = %self.id, body = %truncate(&body), "unparseable portal reply");
            Error::Json(e)
        })?;
        if let Some(token) = value.get("app_token").and_then(|t| t.as_str()) {
            self.app_token = Some(token.to_string());
        }
        Ok(value)
    }

    /// Appends the district portal's mandatory `ajax_req` and `app_token`
    /// fields to a parameter list.
    pub fn with_token(&self, mut params: Vec<(String, String)>) -> Vec<(String, String)> {
        params.push(("ajax_req".into(), "true".into()));
        params.push((
            "app_token".into(),
            self.app_token.clone().unwrap_or_default(),
        ));
        params
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::Protocol("session already closed".into()));
        }
        Ok(())
    }

    fn join(&self, path: &str) -> Result<Url, Error> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| Error::Protocol(format!("invalid base url: {e}")))?;
        base.join(path)
            .map_err(|e| Error::Protocol(format!("invalid request path {path:?}: {e}")))
    }
}

fn new_session_id() -> String {
    let mut rng = rand::thread_rng();
    (0..16)
        .map(|_| format!("{:x}", rng.gen_range(0..16u8)))
        .collect()
}

fn browser_headers(base_url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    if let Ok(origin) = HeaderValue::from_str(base_url.trim_end_matches('/')) {
        headers.insert(ORIGIN, origin);
    }
    if let Ok(referer) = HeaderValue::from_str(base_url) {
        headers.insert(REFERER, referer);
    }
    headers
}

fn extract_app_token(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("input#app_token").ok()?;
    let input = doc.select(&selector).next()?;
    let value = input.value().attr("value")?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn strip_bom(body: String) -> String {
    match body.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => body,
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_app_token_from_landing_markup() {
        let html = r#"<form><input type="hidden" id="app_token" name="app_token" value="abc123"></form>"#;
        assert_eq!(extract_app_token(html).as_deref(), Some("abc123"));
        assert_eq!(extract_app_token("<html><body>plain</body></html>"), None);
        assert_eq!(
            extract_app_token(r#"<input id="app_token" value="">"#),
            None
        );
    }

    #[test]
    fn session_ids_are_opaque_hex() {
        let a = new_session_id();
        let b = new_session_id();
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn bom_is_stripped() {
        assert_eq!(strip_bom("\u{feff}{\"a\":1}".to_string()), "{\"a\":1}");
        assert_eq!(strip_bom("{}".to_string()), "{}");
    }
}
