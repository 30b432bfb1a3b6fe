//! Shared HTTP transport: base URL, timeout and bearer handling.

use std::time::Duration;

use reqwest::{IntoUrl, Method, RequestBuilder, Response, Url};
use serde_json::Value;

// ── TokenSource ─────────────────────────────────────────────────────

/// Pluggable bearer-token provider, consulted before each authenticated
/// request. `None` sends the request anonymously.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Option<String>;
}

/// Anonymous requests only.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Option<String> {
        None
    }
}

/// A token obtained elsewhere, used as-is.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// Thin wrapper over a `reqwest::Client` bound to the API base URL.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Build a transport. The timeout applies to every request; a timeout
    /// surfaces as a transport error, never as a hang.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/Skill/GetList`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL for `path/{segment}` with the segment percent-encoded.
    pub fn segment_url(&self, path: &str, segment: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.url(path)).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot carry a path segment", self.base_url))?
            .push(segment);
        Ok(url)
    }

    /// Start a request, attaching `Authorization: Bearer` only when a
    /// token is supplied.
    pub fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        self.request_to(method, self.url(path), token)
    }

    pub fn request_to(&self, method: Method, url: impl IntoUrl, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Read a non-2xx body into a human-readable message. Prefers the
/// backend's `message`/`title`/`error` field when the body is JSON.
pub(crate) async fn failure_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    message_from_body(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    })
}

fn message_from_body(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ["message", "title", "error"]
            .iter()
            .filter_map(|k| map.get(*k))
            .find_map(|v| v.as_str().map(str::to_string))
            .or_else(|| Some(body.to_string())),
        _ => Some(body.trim().to_string()),
    }
}

/// Parse a success body as JSON. An empty body reads as `null`.
pub(crate) async fn json_body(resp: Response) -> Result<Value, reqwest::Error> {
    let bytes = resp.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    // Plain-text success bodies ("Deleted") are not an error.
    Ok(serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())))
}
