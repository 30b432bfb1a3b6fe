//! Authorization guard.
//!
//! `Checking → {Authorized, Unauthorized}`, evaluated once per mount of a
//! protected view. Every failure path ends the stored session and yields a
//! re-authentication prompt; the guard never redirects on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::claims::{self, Claims};
use crate::error::{DecodeError, RefreshError};
use crate::session::{Refreshed, SessionManager};

pub const LOGIN_ROUTE: &str = "/form";

// ── Decision ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// No access token in the store.
    NoSession,
    /// The stored token could not be decoded.
    Malformed(DecodeError),
    /// Expired with no refresh token to renew it.
    Expired,
    /// Renewal was attempted and failed.
    RefreshFailed(RefreshError),
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnauthorizedReason::NoSession => f.write_str("not logged in"),
            UnauthorizedReason::Malformed(e) => write!(f, "stored session is invalid: {e}"),
            UnauthorizedReason::Expired => f.write_str("session expired"),
            UnauthorizedReason::RefreshFailed(e) => write!(f, "session could not be renewed: {e}"),
        }
    }
}

/// Result of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Authorized(Claims),
    Unauthorized(UnauthorizedReason),
}

impl Decision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Decision::Authorized(_))
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Decision::Authorized(claims) => Some(claims),
            Decision::Unauthorized(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&UnauthorizedReason> {
        match self {
            Decision::Authorized(_) => None,
            Decision::Unauthorized(reason) => Some(reason),
        }
    }
}

/// What an unauthorized view shows instead of its content. The user has
/// to act on it; nothing navigates automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReauthPrompt {
    pub reason: UnauthorizedReason,
    pub title: &'static str,
    pub message: &'static str,
    pub action_label: &'static str,
    pub login_route: &'static str,
}

impl ReauthPrompt {
    pub fn new(reason: UnauthorizedReason) -> Self {
        Self {
            reason,
            title: "Session ended",
            message: "Your session has expired. Please log in again to continue.",
            action_label: "Log in again",
            login_route: LOGIN_ROUTE,
        }
    }
}

/// Per-mount guard state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized(Claims),
    Unauthorized(ReauthPrompt),
}

impl From<Decision> for GuardState {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Authorized(claims) => GuardState::Authorized(claims),
            Decision::Unauthorized(reason) => GuardState::Unauthorized(ReauthPrompt::new(reason)),
        }
    }
}

// ── AuthGuard ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AuthGuard {
    session: Arc<SessionManager>,
}

impl AuthGuard {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Run the check: store read → decode → (refresh) → decision.
    pub async fn evaluate(&self) -> Decision {
        let stored = self.session.store().get();

        let Some(access) = stored.access_token else {
            if stored.refresh_token.is_some() {
                self.session.clear();
            }
            return Decision::Unauthorized(UnauthorizedReason::NoSession);
        };

        let claims = match claims::decode(&access) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("guard: stored token is malformed");
                self.session.clear_if_current(&access);
                return Decision::Unauthorized(UnauthorizedReason::Malformed(e));
            }
        };

        if !claims.is_expired(self.session.leeway_secs()) {
            return Decision::Authorized(claims);
        }

        debug!("guard: token expired, renewing");
        match self
            .session
            .refresh(&access, stored.refresh_token.as_deref())
            .await
        {
            Ok(Refreshed::Current) => Decision::Authorized(claims),
            // The renewed token is accepted as-is, even close to expiry;
            // re-checking it here could loop. Identity carries over when
            // the new token is opaque.
            Ok(Refreshed::Renewed(pair)) => match claims::decode(&pair.access_token) {
                Ok(renewed) => Decision::Authorized(renewed),
                Err(e) => {
                    debug!("guard: renewed token is opaque ({e}), keeping prior identity");
                    Decision::Authorized(claims)
                }
            },
            Err(RefreshError::NoRefreshToken) => {
                self.session.clear_if_current(&access);
                Decision::Unauthorized(UnauthorizedReason::Expired)
            }
            Err(err) => {
                self.session.clear_if_current(&access);
                Decision::Unauthorized(UnauthorizedReason::RefreshFailed(err))
            }
        }
    }

    /// Start a guarded view. The check runs when the mount is resolved.
    pub fn mount(&self) -> GuardMount {
        let (state, _) = watch::channel(GuardState::Checking);
        GuardMount {
            guard: self.clone(),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            state,
        }
    }
}

// ── GuardMount ──────────────────────────────────────────────────────

/// Guard state scoped to one mount of a protected view.
///
/// Unmounting (or dropping) before the check finishes discards its
/// result. A refresh already under way still completes in the
/// background and updates the store.
pub struct GuardMount {
    guard: AuthGuard,
    cancel: CancellationToken,
    started: AtomicBool,
    state: watch::Sender<GuardState>,
}

impl GuardMount {
    /// Run the check for this mount. Only the first call evaluates; later
    /// calls return the current state. `None` once unmounted.
    pub async fn resolve(&self) -> Option<GuardState> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Some(self.state());
        }

        let decision = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("guard mount cancelled before the check resolved");
                return None;
            }
            decision = self.guard.evaluate() => decision,
        };

        if self.cancel.is_cancelled() {
            return None;
        }
        let state = GuardState::from(decision);
        self.state.send_replace(state.clone());
        Some(state)
    }

    pub fn state(&self) -> GuardState {
        self.state.borrow().clone()
    }

    /// Watch state transitions of this mount.
    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Navigate away. Idempotent.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for GuardMount {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
