//! Session token pair and auth-state events

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::user::User;

/// Marker prefixed to the encoded session cookie value
const COOKIE_VALUE_PREFIX: &str = "base64-";

/// Access/refresh token pair issued by the auth backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token expires
    pub expires_at: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// True if the access token expires within `margin_secs` of `now`
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at <= now + margin_secs
    }

    pub fn is_expired(&self, margin_secs: i64) -> bool {
        self.expires_within(Utc::now().timestamp(), margin_secs)
    }

    /// Encode as an opaque cookie value
    pub fn to_cookie_value(&self) -> String {
        // Serializing plain strings and integers cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        format!("{}{}", COOKIE_VALUE_PREFIX, URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a cookie value; anything unrecognized is treated as no session
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let encoded = value.strip_prefix(COOKIE_VALUE_PREFIX)?;
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Session plus the user it belongs to, as returned by sign-in and refresh
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session: Session,
    pub user: User,
}

/// Auth-state transition delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: i64) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            token_type: "bearer".to_string(),
        }
    }

    #[test]
    fn test_cookie_value_round_trip() {
        let s = session(1_700_000_000);
        let value = s.to_cookie_value();
        assert!(value.starts_with("base64-"));
        assert_eq!(Session::from_cookie_value(&value), Some(s));
    }

    #[test]
    fn test_garbage_cookie_is_no_session() {
        assert_eq!(Session::from_cookie_value(""), None);
        assert_eq!(Session::from_cookie_value("plain-token"), None);
        assert_eq!(Session::from_cookie_value("base64-!!!"), None);
        assert_eq!(Session::from_cookie_value("base64-e30"), None); // "{}"
    }

    #[test]
    fn test_expires_within_margin() {
        let s = session(1_000);
        assert!(s.expires_within(1_000, 0));
        assert!(s.expires_within(950, 60));
        assert!(!s.expires_within(900, 60));
    }
}
