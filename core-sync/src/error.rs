use bridge_traits::error::BridgeError;
use core_cover::{ContainerError, GenerateError, TransportError};
use thiserror::Error;

/// Failures turning a [`Definition`](crate::Definition) into bytes and back
///
/// During discovery this is a classification signal only: a cover whose
/// comment does not decode simply belongs to an unmanaged playlist.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Malformed definition: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Encoded definition is {len} bytes, limit is {max}")]
    TooLarge { len: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote store error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Cover container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Cover transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Cover generation error: {0}")]
    Generate(#[from] GenerateError),

    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Playlist {playlist_id} has no cover")]
    MissingCover { playlist_id: String },

    #[error("Cover upload for playlist {playlist_id} gave up after {attempts} attempts: {message}")]
    CoverUploadExhausted {
        playlist_id: String,
        attempts: u32,
        message: String,
    },
}

impl SyncError {
    /// `true` when the remote store rejected the session's credentials
    pub fn is_auth_failure(&self) -> bool {
        match self {
            SyncError::Bridge(e) => e.is_auth_failure(),
            SyncError::Transport(TransportError::Bridge(e)) => e.is_auth_failure(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        assert!(SyncError::Bridge(BridgeError::NoAccess("403".to_string())).is_auth_failure());
        assert!(SyncError::Bridge(BridgeError::Unauthenticated("expired".to_string())).is_auth_failure());
        assert!(!SyncError::Bridge(BridgeError::NotAvailable("x".to_string())).is_auth_failure());
        assert!(!SyncError::MissingCover {
            playlist_id: "p".to_string()
        }
        .is_auth_failure());
    }
}
