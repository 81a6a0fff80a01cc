use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Whether a failed store call may succeed if repeated unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network hiccups, timeouts, throttling. Safe to retry.
    Transient,
    /// Permission, missing object, malformed request. Retrying will not help.
    Terminal,
}

/// Errors raised by an [`ObjectStore`](crate::storage::ObjectStore) implementation.
///
/// The core never retries on its own; it only exposes [`StoreError::kind`] so
/// callers can pick a retry policy.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Store temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Invalid object key: {key}")]
    InvalidKey { key: String },

    #[error("Store rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Timeout(_) | StoreError::Network(_) | StoreError::Unavailable(_) => {
                ErrorKind::Transient
            }
            // Throttling and server-side failures, same split the HTTP providers retry on
            StoreError::Rejected { status, .. } if *status == 429 || (500..600).contains(status) => {
                ErrorKind::Transient
            }
            StoreError::Io(e) => match e.kind() {
                std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::WouldBlock
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted => ErrorKind::Transient,
                _ => ErrorKind::Terminal,
            },
            _ => ErrorKind::Terminal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
