use bridge_traits::StoreError;
use thiserror::Error;

/// A reconciliation run aborted. The live catalog was left untouched.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Listing page {page} failed: {source}")]
    PageFailed {
        page: u32,
        #[source]
        source: StoreError,
    },

    #[error("Sync timeout after {0} seconds")]
    Timeout(u64),
}

impl SyncError {
    /// Whether running the same reconciliation again may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::PageFailed { source, .. } => source.is_transient(),
            SyncError::Timeout(_) => true,
        }
    }
}

/// Rejections raised before the store is contacted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File {name} is {size} bytes, exceeding the limit of {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("Malformed key component {value:?}: {reason}")]
    MalformedKey { value: String, reason: String },
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upload of {key} failed: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Upload of {key} was cancelled")]
    Cancelled { key: String },
}

impl UploadError {
    /// Generated key, when the upload got far enough to have one.
    pub fn key(&self) -> Option<&str> {
        match self {
            UploadError::Validation(_) => None,
            UploadError::Store { key, .. } | UploadError::Cancelled { key } => Some(key),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, UploadError::Store { source, .. } if source.is_transient())
    }
}

#[derive(Error, Debug)]
pub enum DeleteError {
    /// The key was rejected before the store was contacted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Delete of {key} failed: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },
}

impl DeleteError {
    pub fn key(&self) -> Option<&str> {
        match self {
            DeleteError::Validation(_) => None,
            DeleteError::Store { key, .. } => Some(key),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, DeleteError::Store { source, .. } if source.is_transient())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_transience_follows_store() {
        let transient = SyncError::PageFailed {
            page: 2,
            source: StoreError::Timeout("list".to_string()),
        };
        let terminal = SyncError::PageFailed {
            page: 1,
            source: StoreError::PermissionDenied("expired".to_string()),
        };

        assert!(transient.is_transient());
        assert!(!terminal.is_transient());
        assert!(SyncError::Timeout(30).is_transient());
        assert!(transient.to_string().contains("page 2"));
    }

    #[test]
    fn test_upload_error_carries_key() {
        let err = UploadError::Store {
            key: "vacation/1-photo.png".to_string(),
            source: StoreError::Network("reset".to_string()),
        };
        assert_eq!(err.key(), Some("vacation/1-photo.png"));
        assert!(err.is_transient());

        let err = UploadError::from(ValidationError::FileTooLarge {
            name: "big.mp4".to_string(),
            size: 10,
            limit: 5,
        });
        assert_eq!(err.key(), None);
        assert!(!err.is_transient());
        assert!(err.to_string().contains("big.mp4"));
    }

    #[test]
    fn test_delete_validation_is_not_a_store_failure() {
        let err = DeleteError::from(ValidationError::MalformedKey {
            value: String::new(),
            reason: "key is empty".to_string(),
        });
        assert_eq!(err.key(), None);
        assert!(!err.is_transient());

        let err = DeleteError::Store {
            key: "a.png".to_string(),
            source: StoreError::Unavailable("503".to_string()),
        };
        assert_eq!(err.key(), Some("a.png"));
        assert!(err.is_transient());
    }
}
