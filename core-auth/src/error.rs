use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session was invalidated: {reason}")]
    SessionInvalidated { reason: String },

    #[error("Access token expired at {expires_at}")]
    TokenExpired {
        expires_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("Credential provider failed: {0}")]
    Provider(String),
}

impl From<AuthError> for BridgeError {
    fn from(error: AuthError) -> Self {
        BridgeError::Unauthenticated(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_maps_to_unauthenticated() {
        let bridge: BridgeError = AuthError::NotAuthenticated.into();
        assert!(bridge.is_auth_failure());
        assert!(matches!(bridge, BridgeError::Unauthenticated(ref m) if m == "Not authenticated"));
    }
}
