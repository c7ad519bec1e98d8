//! Error types for the Spotify provider

use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use thiserror::Error;

/// Spotify provider errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// API request returned an unexpected status
    #[error("Spotify API error on {endpoint} (status {status_code}): {message}")]
    ApiError {
        endpoint: String,
        status_code: u16,
        message: String,
    },

    /// The account is not allowed to use this application
    #[error("Account has no access to this application")]
    NoAccess,

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// No usable session
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

impl From<SpotifyError> for BridgeError {
    fn from(error: SpotifyError) -> Self {
        match error {
            SpotifyError::ApiError {
                status_code: 401, ..
            } => BridgeError::Unauthenticated(error.to_string()),
            SpotifyError::ApiError {
                endpoint,
                status_code,
                message,
            } => BridgeError::Status {
                status: status_code,
                message: format!("{}: {}", endpoint, message),
            },
            SpotifyError::NoAccess => BridgeError::NoAccess(error.to_string()),
            SpotifyError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            SpotifyError::Auth(e) => e.into(),
            SpotifyError::BridgeError(e) => e,
        }
    }
}
