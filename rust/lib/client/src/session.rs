//! Session lifecycle: expiry checks and the single-flight refresh.
//!
//! At most one refresh exchange per refresh token is in flight at any
//! time. Concurrent callers join the same [`Shared`] future. The exchange
//! runs in its own task, so a caller that goes away (a cancelled guard
//! mount, a dropped request) never aborts an exchange whose refresh token
//! the backend may already have consumed.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::claims::{self, Claims};
use crate::error::RefreshError;
use crate::http::{json_body, TokenSource, Transport};
use crate::store::{CredentialStore, TokenPair};

pub const REFRESH_PATH: &str = "/Authentication/RefreshToken";

const ACCESS_KEYS: &[&str] = &["token", "accessToken", "access_token"];
const REFRESH_KEYS: &[&str] = &["refreshToken", "refresh_token"];

type Flight = Shared<BoxFuture<'static, Result<TokenPair, RefreshError>>>;
type Inflight = Arc<Mutex<HashMap<String, Flight>>>;

/// Outcome of a successful [`SessionManager::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refreshed {
    /// The access token is still valid; nothing was sent.
    Current,
    /// A new pair, already written to the credential store.
    Renewed(TokenPair),
}

/// Owns the credential store and the refresh protocol. Build one per
/// process and share it behind an `Arc`.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    transport: Transport,
    leeway_secs: i64,
    inflight: Inflight,
}

impl SessionManager {
    pub const DEFAULT_LEEWAY_SECS: i64 = 30;

    pub fn new(store: Arc<dyn CredentialStore>, transport: Transport) -> Self {
        Self {
            store,
            transport,
            leeway_secs: Self::DEFAULT_LEEWAY_SECS,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Treat tokens expiring within `secs` as already expired.
    pub fn with_leeway(mut self, secs: i64) -> Self {
        self.leeway_secs = secs.max(0);
        self
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn leeway_secs(&self) -> i64 {
        self.leeway_secs
    }

    /// Token presence only; says nothing about expiry.
    pub fn is_logged_in(&self) -> bool {
        self.store.get().access_token.is_some()
    }

    /// The stored access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.store.get().access_token
    }

    /// Decoded identity of the stored session. An undecodable token ends
    /// the session.
    pub fn current(&self) -> Option<Claims> {
        let token = self.store.get().access_token?;
        match claims::decode(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!("stored access token is malformed, ending session: {e}");
                self.clear();
                None
            }
        }
    }

    /// Drop the local session. Errors are logged, not returned: a store
    /// that cannot be cleared reads as logged out anyway on the next
    /// failed decode.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            warn!("failed to clear credential store: {e}");
        }
    }

    /// End the session that `access_token` belongs to, unless the store
    /// has since moved on to a different one.
    pub fn clear_if_current(&self, access_token: &str) {
        teardown(self.store.as_ref(), access_token);
    }

    /// Exchange an expired pair for a new one.
    ///
    /// - still valid → [`Refreshed::Current`], no network call
    /// - expired, no refresh token → [`RefreshError::NoRefreshToken`], no
    ///   network call
    /// - expired with refresh token → one exchange per refresh token,
    ///   shared by every concurrent caller. Success writes the new pair
    ///   to the store before returning. Failure clears the store unless it
    ///   already holds a different session.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<Refreshed, RefreshError> {
        let claims = claims::decode(access_token)?;
        if !claims.is_expired(self.leeway_secs) {
            return Ok(Refreshed::Current);
        }
        let Some(refresh_token) = refresh_token.filter(|t| !t.is_empty()) else {
            return Err(RefreshError::NoRefreshToken);
        };
        self.renew(access_token, refresh_token)
            .await
            .map(Refreshed::Renewed)
    }

    async fn renew(&self, access_token: &str, refresh_token: &str) -> Result<TokenPair, RefreshError> {
        let flight = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(refresh_token) {
                Some(flight) => {
                    debug!("joining in-flight session refresh");
                    flight.clone()
                }
                None => {
                    // A flight for this token may have finished just before
                    // we took the lock.
                    if let Some(pair) = self.replacement_for(access_token) {
                        debug!("session already refreshed by another caller");
                        return Ok(pair);
                    }
                    let flight = self.start_flight(access_token, refresh_token);
                    inflight.insert(refresh_token.to_string(), flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    /// A different, still-valid pair in the store.
    fn replacement_for(&self, access_token: &str) -> Option<TokenPair> {
        let pair = self.store.get().pair()?;
        if pair.access_token == access_token {
            return None;
        }
        let claims = claims::decode(&pair.access_token).ok()?;
        (!claims.is_expired(self.leeway_secs)).then_some(pair)
    }

    fn start_flight(&self, access_token: &str, refresh_token: &str) -> Flight {
        let transport = self.transport.clone();
        let store = Arc::clone(&self.store);
        let inflight = Arc::clone(&self.inflight);
        let access_token = access_token.to_string();
        let refresh_token = refresh_token.to_string();

        let handle = tokio::spawn(async move {
            info!("refreshing session");
            let result = match exchange(&transport, &access_token, &refresh_token).await {
                Ok(pair) => match store.set(&pair) {
                    Ok(()) => {
                        info!("session refreshed");
                        Ok(pair)
                    }
                    Err(e) => {
                        teardown(store.as_ref(), &access_token);
                        Err(RefreshError::Store(e.to_string()))
                    }
                },
                Err(err) => {
                    warn!("session refresh failed: {err}");
                    teardown(store.as_ref(), &access_token);
                    Err(err)
                }
            };
            // Store is settled before the entry disappears, so a late
            // caller either joins this flight or sees the new pair.
            inflight.lock().await.remove(&refresh_token);
            result
        });

        async move {
            handle.await.unwrap_or_else(|e| {
                Err(RefreshError::Transport(format!("refresh task failed: {e}")))
            })
        }
        .boxed()
        .shared()
    }
}

/// Bearer for resource calls: the stored access token, renewed first when
/// it has expired. A session that cannot be renewed sends the request
/// anonymously, so the backend's 401 reaches the view.
#[async_trait::async_trait]
impl TokenSource for SessionManager {
    async fn token(&self) -> Option<String> {
        let stored = self.store.get();
        let access = stored.access_token?;
        match self.refresh(&access, stored.refresh_token.as_deref()).await {
            Ok(Refreshed::Current) => Some(access),
            Ok(Refreshed::Renewed(pair)) => Some(pair.access_token),
            Err(e) => {
                debug!("no usable session for request: {e}");
                self.clear_if_current(&access);
                None
            }
        }
    }
}

async fn exchange(
    transport: &Transport,
    access_token: &str,
    refresh_token: &str,
) -> Result<TokenPair, RefreshError> {
    debug!("POST {}", transport.url(REFRESH_PATH));
    let resp = transport
        .request(Method::POST, REFRESH_PATH, None)
        .json(&json!({ "token": access_token, "refreshToken": refresh_token }))
        .send()
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(RefreshError::BackendRejected {
            status: Some(status.as_u16()),
        });
    }

    let body = json_body(resp)
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;
    token_pair_from(&body).ok_or(RefreshError::BackendRejected { status: None })
}

/// Clear the store unless it already holds a different access token (a
/// newer login must survive a stale refresh failing).
fn teardown(store: &dyn CredentialStore, attempted_access: &str) {
    let current = store.get();
    if current
        .access_token
        .as_deref()
        .is_some_and(|token| token != attempted_access)
    {
        debug!("credential store changed during refresh; keeping newer session");
        return;
    }
    if let Err(e) = store.clear() {
        warn!("failed to clear credential store: {e}");
    }
}

/// Pull a token pair out of a login or refresh body, at top level or
/// under `data`. Both tokens must be non-empty strings.
pub(crate) fn token_pair_from(body: &Value) -> Option<TokenPair> {
    let from = |obj: &Value| -> Option<TokenPair> {
        let access = text(obj, ACCESS_KEYS)?;
        let refresh = text(obj, REFRESH_KEYS)?;
        Some(TokenPair::new(access, refresh))
    };
    from(body).or_else(|| body.get("data").and_then(from))
}

fn text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
