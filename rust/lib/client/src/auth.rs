//! Authentication endpoints: login, logout, current user, registration.

use std::sync::Arc;

use reqwest::{Method, Response};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::claims::{self, Claims};
use crate::error::AuthError;
use crate::http::{failure_message, json_body, TokenSource};
use crate::session::{token_pair_from, SessionManager};
use crate::store::TokenPair;

pub const LOGIN_PATH: &str = "/Authentication/login";
pub const LOGOUT_PATH: &str = "/Authentication/Logout";
pub const USER_PATH: &str = "/Authentication/GetUser";
pub const REGISTER_PATH: &str = "/Authentication/CreateUser";

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    /// Backend greeting, when it sends one.
    pub message: Option<String>,
    /// `None` if the issued token does not decode.
    pub claims: Option<Claims>,
}

/// Login and account calls. Writes go straight to the session's store.
#[derive(Clone)]
pub struct AuthClient {
    session: Arc<SessionManager>,
}

impl AuthClient {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Exchange credentials for a token pair and store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let resp = self
            .session
            .transport()
            .request(Method::POST, LOGIN_PATH, None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = parse(resp).await?;

        let tokens = token_pair_from(&body)
            .ok_or_else(|| AuthError::Decode("login response carries no token pair".into()))?;
        self.session.store().set(&tokens)?;

        let claims = claims::decode(&tokens.access_token).ok();
        info!(
            user = claims.as_ref().map(|c| c.display_name()).unwrap_or("Guest"),
            "logged in"
        );
        Ok(LoginOutcome {
            message: body.get("message").and_then(Value::as_str).map(str::to_string),
            claims,
            tokens,
        })
    }

    /// Tell the backend the session ended, then drop it locally. The local
    /// session is cleared even when the backend call fails; the backend's
    /// error is still returned.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let stored = self.session.store().get();
        let user_id = stored
            .access_token
            .as_deref()
            .and_then(|token| claims::decode(token).ok())
            .and_then(|claims| claims.user_id);

        let remote = match user_id {
            Some(id) => self.remote_logout(&id).await,
            None => Ok(()),
        };
        if let Err(e) = &remote {
            warn!("backend logout failed, clearing local session anyway: {e}");
        }

        self.session.store().clear()?;
        info!("logged out");
        remote
    }

    async fn remote_logout(&self, user_id: &str) -> Result<(), AuthError> {
        let resp = self
            .session
            .transport()
            .request(Method::DELETE, LOGOUT_PATH, None)
            .query(&[("id", user_id)])
            .send()
            .await?;
        parse(resp).await.map(|_| ())
    }

    /// The backend's user document for the current session.
    pub async fn current_user(&self) -> Result<Value, AuthError> {
        let token = self.session.token().await.ok_or(AuthError::NotLoggedIn)?;
        let resp = self
            .session
            .transport()
            .request(Method::GET, USER_PATH, Some(&token))
            .send()
            .await?;
        Ok(unwrap_data(parse(resp).await?))
    }

    /// Create a user account. Requires an authenticated session.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Value, AuthError> {
        let token = self.session.token().await.ok_or(AuthError::NotLoggedIn)?;
        let resp = self
            .session
            .transport()
            .request(Method::GET, REGISTER_PATH, Some(&token))
            .query(&[("Username", username), ("Password", password), ("Email", email)])
            .send()
            .await?;
        parse(resp).await
    }
}

async fn parse(resp: Response) -> Result<Value, AuthError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            message: failure_message(resp).await,
        });
    }
    Ok(json_body(resp).await?)
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
