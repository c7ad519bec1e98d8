use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Remote request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Access denied: {0}")]
    NoAccess(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure is a credential or permission problem rather than a
    /// transient transport failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, BridgeError::NoAccess(_) | BridgeError::Unauthenticated(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
