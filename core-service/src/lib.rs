//! Core service façade and bootstrap helpers.
//!
//! This crate wires an injected [`ObjectStore`](bridge_traits::ObjectStore)
//! and the rest of [`CoreConfig`] into the catalog, reconciler and transfer
//! coordinators, and exposes the catalog-facing API a presentation layer
//! talks to. Desktop hosts typically enable the `local-store` feature (which
//! depends on `bridge-desktop`) to run against a directory on disk.
//!
//! ```ignore
//! use core_service::MediaDriveService;
//! use core_catalog::{SortDirection, SortKey};
//!
//! let service = MediaDriveService::bootstrap(config).await?;
//! let view = service.list_categorized("beach", SortKey::Date, SortDirection::Desc);
//! for record in &view.images {
//!     println!("{}", record.display_name());
//! }
//! ```

pub mod error;

pub use error::{CoreError, Result};

pub use core_catalog::{
    format_size, CatalogSnapshot, CategorizedView, Category, ObjectRecord, SortDirection, SortKey,
    SortOrder,
};
pub use core_runtime::config::CoreConfig;
pub use core_runtime::events::{CoreEvent, EventStream};
pub use core_sync::{no_progress, ProgressCallback, UploadSource};
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "local-store")]
pub use bridge_desktop::LocalDirectoryStore;

use core_catalog::{list_categorized, CatalogStore};
use core_runtime::events::EventBus;
use core_sync::{
    DeletionCoordinator, ListingSynchronizer, SyncConfig, UploadConfig, UploadCoordinator,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

struct ServiceInner {
    config: CoreConfig,
    events: EventBus,
    catalog: Arc<CatalogStore>,
    synchronizer: Arc<ListingSynchronizer>,
    uploads: UploadCoordinator,
    deletes: DeletionCoordinator,
    shutdown: CancellationToken,
}

/// Primary façade exposed to host applications.
///
/// Cheap to clone; clones share one catalog.
#[derive(Clone)]
pub struct MediaDriveService {
    inner: Arc<ServiceInner>,
}

impl MediaDriveService {
    /// Assemble the service from a validated configuration.
    ///
    /// The catalog starts empty; call [`resync`](Self::resync) or use
    /// [`bootstrap`](Self::bootstrap) to load it.
    pub fn new(config: CoreConfig) -> Self {
        let events = EventBus::new(config.event_buffer_size);
        let catalog = Arc::new(CatalogStore::new(events.clone()));
        let synchronizer = Arc::new(ListingSynchronizer::new(
            Arc::clone(&config.object_store),
            Arc::clone(&catalog),
            events.clone(),
            SyncConfig::from(&config),
        ));
        let uploads = UploadCoordinator::new(
            Arc::clone(&config.object_store),
            Arc::clone(&synchronizer),
            Arc::clone(&config.clock),
            events.clone(),
            UploadConfig::from(&config),
        );
        let deletes = DeletionCoordinator::new(
            Arc::clone(&config.object_store),
            Arc::clone(&synchronizer),
            events.clone(),
        );

        Self {
            inner: Arc::new(ServiceInner {
                config,
                events,
                catalog,
                synchronizer,
                uploads,
                deletes,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Assemble the service and load the catalog from the store.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        let service = Self::new(config);
        service.resync().await?;
        info!(objects = service.inner.catalog.len(), "Media drive ready");
        Ok(service)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// Latest committed catalog.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.inner.catalog.get_all()
    }

    /// Filtered, sorted catalog split into sections.
    pub fn list_categorized(
        &self,
        search_term: &str,
        sort_key: SortKey,
        direction: SortDirection,
    ) -> CategorizedView {
        self.list_categorized_by(search_term, SortOrder::new(sort_key, direction))
    }

    pub fn list_categorized_by(&self, search_term: &str, order: SortOrder) -> CategorizedView {
        list_categorized(&self.inner.catalog.get_all(), search_term, order)
    }

    /// Like [`list_categorized_by`](Self::list_categorized_by), taking a
    /// picker value such as `size-desc`.
    pub fn list_categorized_with_option(
        &self,
        search_term: &str,
        sort_option: &str,
    ) -> Result<CategorizedView> {
        let order: SortOrder = sort_option.parse()?;
        Ok(self.list_categorized_by(search_term, order))
    }

    /// Uploads a file and returns its generated key.
    pub async fn upload(
        &self,
        file: UploadSource,
        folder: &str,
        on_progress: ProgressCallback,
    ) -> Result<String> {
        self.upload_with_cancellation(file, folder, on_progress, CancellationToken::new())
            .await
    }

    /// Uploads a file, abandoning it when `cancel` fires or the service
    /// shuts down.
    pub async fn upload_with_cancellation(
        &self,
        file: UploadSource,
        folder: &str,
        on_progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<String> {
        self.ensure_running()?;

        // Fires on either the caller's token or service shutdown
        let linked = self.inner.shutdown.child_token();
        if cancel.is_cancelled() {
            linked.cancel();
        }
        let upload = self.inner.uploads.upload_with_cancellation(
            file,
            folder,
            on_progress,
            linked.clone(),
        );
        tokio::pin!(upload);

        let key = tokio::select! {
            biased;
            _ = cancel.cancelled(), if !linked.is_cancelled() => {
                linked.cancel();
                upload.await?
            }
            result = &mut upload => result?,
        };
        Ok(key)
    }

    /// Deletes an object. Unknown keys succeed.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.ensure_running()?;
        self.inner.deletes.delete_object(key).await?;
        Ok(())
    }

    /// Reconciles the catalog with the store.
    #[instrument(skip(self))]
    pub async fn resync(&self) -> Result<()> {
        self.ensure_running()?;
        self.inner.synchronizer.reconcile().await?;
        Ok(())
    }

    /// Stream of catalog, sync and transfer events.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Cancels in-flight uploads and flushes the host log sink.
    ///
    /// Later calls to mutating operations fail with [`CoreError::ShutDown`];
    /// reads keep serving the last catalog.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        self.inner.shutdown.cancel();

        if let Some(sink) = &self.inner.config.logger_sink {
            if let Err(e) = sink.flush().await {
                warn!(error = %e, "Failed to flush logger sink");
            }
        }
        info!("Media drive shut down");
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(CoreError::ShutDown);
        }
        Ok(())
    }
}

/// Convenience bootstrapper for desktop hosts storing objects under `root`.
///
/// ```no_run
/// # #[cfg(feature = "local-store")]
/// # async fn example() -> core_service::Result<()> {
/// let service = core_service::bootstrap_local("/tmp/media-drive").await?;
/// println!("{} objects", service.snapshot().len());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "local-store")]
pub async fn bootstrap_local(root: impl Into<std::path::PathBuf>) -> Result<MediaDriveService> {
    let config = CoreConfig::builder()
        .object_store(Arc::new(LocalDirectoryStore::new(root)))
        .build()?;
    MediaDriveService::bootstrap(config).await
}
