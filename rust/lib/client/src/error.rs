use thiserror::Error;

// ── DecodeError ─────────────────────────────────────────────────────

/// A token that cannot be turned into [`crate::Claims`].
///
/// Callers treat every variant exactly like "not logged in".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),

    #[error("payload is not valid base64url: {0}")]
    Base64(String),

    #[error("payload is not a JSON object: {0}")]
    Payload(String),

    #[error("payload has no usable exp claim")]
    MissingExpiry,
}

// ── RefreshError ────────────────────────────────────────────────────

/// Session refresh failure. Always ends the session.
///
/// `Clone` because every waiter on a single-flight refresh receives the
/// same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("session has no refresh token")]
    NoRefreshToken,

    #[error("refresh rejected by backend{}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    BackendRejected { status: Option<u16> },

    #[error("refresh transport failure: {0}")]
    Transport(String),

    #[error("access token is malformed: {0}")]
    InvalidToken(#[from] DecodeError),

    #[error("credential store: {0}")]
    Store(String),
}

// ── ResourceError ───────────────────────────────────────────────────

/// Which adapter call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

/// Resource adapter failure, surfaced to the view as-is.
///
/// `status` is `None` for transport failures (connect, timeout, body read).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} {entity} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct ResourceError {
    pub entity: &'static str,
    pub operation: Operation,
    pub status: Option<u16>,
    pub message: String,
}

impl ResourceError {
    pub(crate) fn transport(entity: &'static str, operation: Operation, err: reqwest::Error) -> Self {
        Self {
            entity,
            operation,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    /// 401/403: the view should send the user back through the guard.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }
}

// ── AuthError ───────────────────────────────────────────────────────

/// Login / logout / user endpoint failure.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("credential store: {0}")]
    Store(#[from] StoreError),
}

// ── StoreError ──────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

// ── ConfigError ─────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid server URL {0:?}")]
    InvalidServer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_display_includes_status() {
        let err = ResourceError {
            entity: "Experience",
            operation: Operation::List,
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "list Experience failed (HTTP 500): boom");
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn resource_error_without_status() {
        let err = ResourceError {
            entity: "Skill",
            operation: Operation::Delete,
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "delete Skill failed: connection refused");
    }

    #[test]
    fn auth_failures_are_401_and_403() {
        for (status, expected) in [(401, true), (403, true), (404, false), (500, false)] {
            let err = ResourceError {
                entity: "Project",
                operation: Operation::Get,
                status: Some(status),
                message: String::new(),
            };
            assert_eq!(err.is_auth_failure(), expected, "status {status}");
        }
    }

    #[test]
    fn refresh_error_display() {
        assert_eq!(
            RefreshError::BackendRejected { status: Some(401) }.to_string(),
            "refresh rejected by backend (HTTP 401)"
        );
        assert_eq!(
            RefreshError::BackendRejected { status: None }.to_string(),
            "refresh rejected by backend"
        );
    }
}
