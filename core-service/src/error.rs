use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] core_catalog::CatalogError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Upload error: {0}")]
    Upload(#[from] core_sync::UploadError),

    #[error("Delete error: {0}")]
    Delete(#[from] core_sync::DeleteError),

    #[error("Service has been shut down")]
    ShutDown,
}

impl CoreError {
    /// Whether repeating the failed call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Sync(e) => e.is_transient(),
            CoreError::Upload(e) => e.is_transient(),
            CoreError::Delete(e) => e.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
