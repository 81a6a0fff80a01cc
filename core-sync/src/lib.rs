//! # Sync & Transfer Module
//!
//! Keeps the catalog consistent with the remote store.
//!
//! ## Overview
//!
//! The reconciler and the two transfer coordinators are the only writers of
//! the [`CatalogStore`](core_catalog::CatalogStore):
//! - Listing reconciliation walks the paged listing and swaps in a fresh
//!   snapshot only when every page succeeded
//! - Uploads are validated, keyed, streamed with progress, optimistically
//!   committed and then reconciled
//! - Deletions are idempotent and drop the record before a best-effort
//!   reconciliation
//!
//! ## Components
//!
//! - **Listing Synchronizer** (`reconciler`): paged listing into candidate snapshot, atomic swap
//! - **Key Generator** (`keygen`): monotonic timestamped keys
//! - **Upload Coordinator** (`upload`): validation, progress, cancellation
//! - **Deletion Coordinator** (`deletion`): idempotent delete

pub mod deletion;
pub mod error;
pub mod keygen;
pub mod reconciler;
pub mod upload;

pub use deletion::DeletionCoordinator;
pub use error::{DeleteError, Result, SyncError, UploadError, ValidationError};
pub use keygen::KeyGenerator;
pub use reconciler::{listing_pages, ListingSynchronizer, SyncConfig};
pub use upload::{no_progress, ProgressCallback, UploadConfig, UploadCoordinator, UploadSource};
pub use tokio_util::sync::CancellationToken;
