//! Access-token claims, decoded client-side for UI decisions only.
//!
//! The payload segment is read without verifying the signature. The
//! backend re-validates every authenticated request; nothing here is an
//! authorization boundary.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Claim keys tried in order for each field. The backend has issued
/// tokens with short names, camelCase names and the long .NET claim URIs.
const EXP_KEYS: &[&str] = &["exp"];
const USER_ID_KEYS: &[&str] = &[
    "userid",
    "userId",
    "UserId",
    "nameid",
    "sub",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
];
const USERNAME_KEYS: &[&str] = &[
    "username",
    "Username",
    "Name",
    "name",
    "unique_name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
];
const ROLE_KEYS: &[&str] = &[
    "role",
    "Role",
    "roleId",
    "RoleId",
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];

// ── Role ────────────────────────────────────────────────────────────

/// Role of an authenticated user.
///
/// Role id 1 is the portfolio owner, 2 an elevated viewer; any other
/// value (including garbage) is a plain viewer with no elevated privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Owner,
    Reviewer,
    Viewer,
}

impl Role {
    pub const OWNER_ID: i64 = 1;
    pub const REVIEWER_ID: i64 = 2;

    pub fn from_id(id: i64) -> Self {
        match id {
            Self::OWNER_ID => Role::Owner,
            Self::REVIEWER_ID => Role::Reviewer,
            _ => Role::Viewer,
        }
    }

    /// Map a raw claim value. Numbers, numeric strings (`"1"`) and
    /// integral floats are accepted; for an array the first entry counts.
    /// Total: never fails.
    pub fn from_claim(value: &Value) -> Self {
        role_id(value).map(Self::from_id).unwrap_or(Role::Viewer)
    }

    pub fn is_owner(self) -> bool {
        self == Role::Owner
    }
}

fn role_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => items.first().and_then(role_id),
        _ => None,
    }
}

// ── Claims ──────────────────────────────────────────────────────────

/// Decoded identity. Recomputed from the stored token every time it is
/// needed, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Expiry, seconds since the epoch.
    pub expires_at: i64,
    pub user_id: Option<String>,
    pub username: Option<String>,
    /// `None` when the token carries no role claim at all.
    pub role: Option<Role>,
}

impl Claims {
    /// Expired relative to `now` (epoch seconds), treating tokens that
    /// expire within `leeway_secs` as already expired.
    pub fn is_expired_at(&self, now: i64, leeway_secs: i64) -> bool {
        self.expires_at < now.saturating_add(leeway_secs)
    }

    pub fn is_expired(&self, leeway_secs: i64) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp(), leeway_secs)
    }

    /// Name for greetings; `"Guest"` when the token has none.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Guest")
    }
}

/// Decode a JWT-shaped token (`header.payload.signature`).
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    let raw = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let payload: Map<String, Value> =
        serde_json::from_slice(&raw).map_err(|e| DecodeError::Payload(e.to_string()))?;

    let expires_at = first(&payload, EXP_KEYS)
        .and_then(epoch_seconds)
        .ok_or(DecodeError::MissingExpiry)?;

    Ok(Claims {
        expires_at,
        user_id: first(&payload, USER_ID_KEYS).and_then(as_text),
        username: first(&payload, USERNAME_KEYS).and_then(as_text),
        role: first(&payload, ROLE_KEYS).map(Role::from_claim),
    })
}

fn first<'a>(payload: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| payload.get(*k))
        .find(|v| !v.is_null())
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(payload: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn decodes_short_claim_names() {
        let claims = decode(&token_with(json!({
            "exp": 1_900_000_000,
            "userid": 42,
            "username": "andi",
            "role": 1,
        })))
        .unwrap();
        assert_eq!(
            claims,
            Claims {
                expires_at: 1_900_000_000,
                user_id: Some("42".into()),
                username: Some("andi".into()),
                role: Some(Role::Owner),
            }
        );
    }

    #[test]
    fn decodes_dotnet_claim_uris() {
        let claims = decode(&token_with(json!({
            "exp": "1900000000",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier": "u-7",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name": "karna",
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": "2",
        })))
        .unwrap();
        assert_eq!(claims.expires_at, 1_900_000_000);
        assert_eq!(claims.user_id.as_deref(), Some("u-7"));
        assert_eq!(claims.username.as_deref(), Some("karna"));
        assert_eq!(claims.role, Some(Role::Reviewer));
    }

    #[test]
    fn username_falls_back_to_name_claim() {
        let claims = decode(&token_with(json!({"exp": 1, "Name": "Andi"}))).unwrap();
        assert_eq!(claims.display_name(), "Andi");

        let anonymous = decode(&token_with(json!({"exp": 1}))).unwrap();
        assert_eq!(anonymous.display_name(), "Guest");
        assert_eq!(anonymous.role, None);
    }

    #[test]
    fn padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":10}"#);
        let claims = decode(&format!("{header}.{body}.sig")).unwrap();
        assert_eq!(claims.expires_at, 10);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(decode("not-a-token"), Err(DecodeError::Segments(1)));
        assert_eq!(decode("a.b"), Err(DecodeError::Segments(2)));
        assert!(matches!(decode("a.!!!.c"), Err(DecodeError::Base64(_))));

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(decode(&not_json), Err(DecodeError::Payload(_))));

        let array = format!("h.{}.s", URL_SAFE_NO_PAD.encode("[1,2]"));
        assert!(matches!(decode(&array), Err(DecodeError::Payload(_))));
    }

    #[test]
    fn missing_expiry_is_a_decode_error() {
        let token = token_with(json!({"username": "x", "role": 1}));
        assert_eq!(decode(&token), Err(DecodeError::MissingExpiry));
    }

    #[test]
    fn expiry_compares_seconds_with_seconds() {
        let claims = Claims {
            expires_at: 1_000,
            user_id: None,
            username: None,
            role: None,
        };
        assert!(!claims.is_expired_at(999, 0));
        assert!(!claims.is_expired_at(1_000, 0));
        assert!(claims.is_expired_at(1_001, 0));
        // Leeway pulls expiry earlier.
        assert!(claims.is_expired_at(980, 30));
    }

    #[test]
    fn role_mapping_is_total() {
        assert_eq!(Role::from_claim(&json!(1)), Role::Owner);
        assert_eq!(Role::from_claim(&json!("1")), Role::Owner);
        assert_eq!(Role::from_claim(&json!(1.0)), Role::Owner);
        assert_eq!(Role::from_claim(&json!(" 2 ")), Role::Reviewer);
        assert_eq!(Role::from_claim(&json!(["2", "1"])), Role::Reviewer);
        assert_eq!(Role::from_claim(&json!(3)), Role::Viewer);
        assert_eq!(Role::from_claim(&json!(1.5)), Role::Viewer);
        assert_eq!(Role::from_claim(&json!("garbage")), Role::Viewer);
        assert_eq!(Role::from_claim(&json!(null)), Role::Viewer);
        assert_eq!(Role::from_claim(&json!({"id": 1})), Role::Viewer);
    }
}
