use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Remote store error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),
}

impl CoreError {
    /// Whether the error means the session can no longer be used
    pub fn is_auth_failure(&self) -> bool {
        match self {
            CoreError::Auth(_) => true,
            CoreError::Bridge(e) => e.is_auth_failure(),
            CoreError::Sync(e) => e.is_auth_failure(),
            CoreError::InitializationFailed(_) | CoreError::Runtime(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
