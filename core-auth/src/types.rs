use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token attached to Web API requests.
///
/// # Security
///
/// Tokens must never be logged. The `Debug` implementation redacts the secret.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
/// use chrono::{Duration, Utc};
///
/// let token = AccessToken::new("BQD...").expiring_at(Utc::now() + Duration::hours(1));
/// assert!(!token.is_expired());
/// assert!(!format!("{:?}", token).contains("BQD"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    secret: String,
    /// When the token stops being accepted; `None` if unknown
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Wrap a raw bearer token with unknown expiry
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
        }
    }

    /// Set the expiry instant
    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiry relative to now, as token endpoints report it
    pub fn expiring_in(self, seconds: i64) -> Self {
        self.expiring_at(Utc::now() + Duration::seconds(seconds))
    }

    /// The raw token for the `Authorization` header
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Expired, or expiring within the next minute
    pub fn is_expired(&self) -> bool {
        self.is_expired_with_buffer(60)
    }

    /// Expired, or expiring within `buffer_seconds`
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at - Duration::seconds(buffer_seconds),
            None => false,
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Lifecycle state of a [`SessionContext`](crate::SessionContext).
///
/// # State Transitions
///
/// ```text
/// SignedOut -> SignedIn -> Invalidated
///     ^                        |
///     +------ start() ---------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthState {
    /// No session has been started
    #[default]
    SignedOut,
    /// Credentials are available; `user_id` is set once the account is resolved
    SignedIn { user_id: Option<String> },
    /// The session was ended by logout or by rejected credentials
    Invalidated { reason: String },
}

impl AuthState {
    /// Check if requests may be made on behalf of the user
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }

    /// Resolved account identifier, if any
    pub fn user_id(&self) -> Option<&str> {
        match self {
            AuthState::SignedIn { user_id } => user_id.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::SignedOut => write!(f, "Signed Out"),
            AuthState::SignedIn { user_id: Some(id) } => write!(f, "Signed In ({})", id),
            AuthState::SignedIn { user_id: None } => write!(f, "Signed In"),
            AuthState::Invalidated { reason } => write!(f, "Invalidated: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("BQDsecret");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("BQDsecret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(token.secret(), "BQDsecret");
    }

    #[test]
    fn test_token_expiry() {
        assert!(!AccessToken::new("t").is_expired());
        assert!(!AccessToken::new("t").expiring_in(3600).is_expired());
        assert!(AccessToken::new("t").expiring_in(30).is_expired());
        assert!(!AccessToken::new("t").expiring_in(30).is_expired_with_buffer(0));
        assert!(AccessToken::new("t")
            .expiring_at(Utc::now() - Duration::seconds(1))
            .is_expired_with_buffer(0));
    }

    #[test]
    fn test_auth_state() {
        assert!(!AuthState::default().is_authenticated());

        let state = AuthState::SignedIn {
            user_id: Some("wizzler".to_string()),
        };
        assert!(state.is_authenticated());
        assert_eq!(state.user_id(), Some("wizzler"));
        assert_eq!(state.to_string(), "Signed In (wizzler)");

        let state = AuthState::Invalidated {
            reason: "logout".to_string(),
        };
        assert!(!state.is_authenticated());
        assert_eq!(state.user_id(), None);
    }

    #[test]
    fn test_auth_state_serialization() {
        let state = AuthState::SignedIn { user_id: None };
        let json = serde_json::to_string(&state).unwrap();
        let back: AuthState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
