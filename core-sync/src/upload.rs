//! # Upload Coordinator
//!
//! Validates a file, generates its key, streams it to the store and commits
//! the result to the catalog.
//!
//! ## Workflow
//!
//! 1. Reject oversize files and malformed names before touching the store
//! 2. Generate a collision-free key
//! 3. Stream the body, reporting progress as a non-decreasing percentage
//! 4. On success, upsert an optimistic record, then reconcile with the store
//!
//! A failed or cancelled upload never mutates the catalog. A failed
//! reconciliation after a stored upload is reported through events and logs
//! and does not turn the upload into a failure.

use crate::error::{UploadError, ValidationError};
use crate::keygen::{validate_name, KeyGenerator};
use crate::reconciler::ListingSynchronizer;
use bridge_traits::{chunked_stream, ByteStream, Clock, ObjectStore, TransferCallback};
use bytes::Bytes;
use core_catalog::{CatalogStore, ObjectRecord};
use core_runtime::config::{CoreConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_CHUNK_SIZE};
use core_runtime::events::{CoreEvent, EventBus, TransferEvent};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Receives upload progress as a percentage in `0..=100`.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Callback that ignores progress.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Upload coordinator configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Files larger than this are rejected
    pub max_upload_bytes: u64,
    /// Chunk size used to stream in-memory bodies
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
        }
    }
}

impl From<&CoreConfig> for UploadConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            chunk_size: config.upload_chunk_size,
        }
    }
}

enum UploadBody {
    Buffered(Bytes),
    Streamed(ByteStream),
}

/// A local file about to be uploaded.
pub struct UploadSource {
    name: String,
    size_bytes: u64,
    body: UploadBody,
}

impl UploadSource {
    /// In-memory file; its size is the buffer length.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            body: UploadBody::Buffered(data),
        }
    }

    /// Streamed file of a declared size.
    pub fn from_stream(name: impl Into<String>, size_bytes: u64, body: ByteStream) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            body: UploadBody::Streamed(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn into_stream(self, chunk_size: usize) -> ByteStream {
        match self.body {
            UploadBody::Buffered(data) => chunked_stream(data, chunk_size),
            UploadBody::Streamed(stream) => stream,
        }
    }
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSource")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Turns cumulative byte counts into a clamped, never-decreasing percentage.
struct ProgressTracker {
    upload_id: String,
    total_bytes: u64,
    last_reported: Mutex<Option<u8>>,
    callback: ProgressCallback,
    events: EventBus,
}

impl ProgressTracker {
    fn new(upload_id: String, total_bytes: u64, callback: ProgressCallback, events: EventBus) -> Self {
        Self {
            upload_id,
            total_bytes,
            last_reported: Mutex::new(None),
            callback,
            events,
        }
    }

    fn percent_of(&self, transferred: u64) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let total = u128::from(self.total_bytes);
        let rounded = (u128::from(transferred) * 100 + total / 2) / total;
        rounded.min(100) as u8
    }

    fn on_bytes(&self, transferred: u64) {
        self.report(self.percent_of(transferred));
    }

    fn report(&self, percent: u8) {
        let mut last = self
            .last_reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if matches!(*last, Some(previous) if percent <= previous) {
            return;
        }
        *last = Some(percent);

        // Called under the lock so concurrent transfer callbacks stay ordered
        (self.callback)(percent);
        let _ = self
            .events
            .emit(CoreEvent::Transfer(TransferEvent::UploadProgress {
                upload_id: self.upload_id.clone(),
                percent,
            }));
    }
}

pub struct UploadCoordinator {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<CatalogStore>,
    synchronizer: Arc<ListingSynchronizer>,
    keys: KeyGenerator,
    clock: Arc<dyn Clock>,
    events: EventBus,
    config: UploadConfig,
}

impl UploadCoordinator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        synchronizer: Arc<ListingSynchronizer>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        config: UploadConfig,
    ) -> Self {
        Self {
            store,
            catalog: Arc::clone(synchronizer.catalog()),
            synchronizer,
            keys: KeyGenerator::new(Arc::clone(&clock)),
            clock,
            events,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Checks a file against the upload rules without contacting the store.
    pub fn validate(&self, file: &UploadSource) -> Result<(), ValidationError> {
        if file.size_bytes > self.config.max_upload_bytes {
            return Err(ValidationError::FileTooLarge {
                name: file.name.clone(),
                size: file.size_bytes,
                limit: self.config.max_upload_bytes,
            });
        }
        validate_name(&file.name)
    }

    /// Generates a fresh key for `name` under `folder`.
    pub fn generate_key(&self, folder: &str, name: &str) -> Result<String, ValidationError> {
        self.keys.generate(folder, name)
    }

    /// Uploads `file` under `folder` and returns the generated key.
    pub async fn upload(
        &self,
        file: UploadSource,
        folder: &str,
        on_progress: ProgressCallback,
    ) -> Result<String, UploadError> {
        self.upload_with_cancellation(file, folder, on_progress, CancellationToken::new())
            .await
    }

    /// Like [`upload`](Self::upload), abandoning the transfer once `cancel`
    /// fires. A cancelled upload leaves the catalog untouched.
    #[instrument(skip(self, file, on_progress, cancel), fields(file = %file.name, size = file.size_bytes))]
    pub async fn upload_with_cancellation(
        &self,
        file: UploadSource,
        folder: &str,
        on_progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<String, UploadError> {
        self.validate(&file)?;
        let key = self.generate_key(folder, &file.name)?;
        let size_bytes = file.size_bytes;
        let upload_id = Uuid::new_v4().to_string();

        self.emit(TransferEvent::UploadStarted {
            upload_id: upload_id.clone(),
            key: key.clone(),
            size_bytes,
        });

        let tracker = Arc::new(ProgressTracker::new(
            upload_id.clone(),
            size_bytes,
            on_progress,
            self.events.clone(),
        ));
        tracker.report(0);

        let on_transfer: TransferCallback = {
            let tracker = Arc::clone(&tracker);
            Arc::new(move |transferred| tracker.on_bytes(transferred))
        };
        let body = file.into_stream(self.config.chunk_size);

        if cancel.is_cancelled() {
            return Err(self.cancelled(upload_id, key));
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.store.put(&key, body, on_transfer) => Some(result),
        };

        match outcome {
            None => Err(self.cancelled(upload_id, key)),
            Some(Err(source)) => {
                warn!(key = %key, error = %source, transient = source.is_transient(), "Upload failed");
                self.emit(TransferEvent::UploadFailed {
                    upload_id,
                    key: key.clone(),
                    message: source.to_string(),
                    transient: source.is_transient(),
                });
                Err(UploadError::Store { key, source })
            }
            Some(Ok(())) => {
                tracker.report(100);

                let record = ObjectRecord::new(key.clone(), size_bytes, Some(self.clock.now()));
                self.catalog.upsert(record);
                info!(key = %key, size_bytes, "Upload stored");
                self.emit(TransferEvent::UploadCompleted {
                    upload_id,
                    key: key.clone(),
                });

                if let Err(e) = self.synchronizer.reconcile().await {
                    warn!(key = %key, error = %e, "Reconciliation after upload failed");
                }

                Ok(key)
            }
        }
    }

    fn cancelled(&self, upload_id: String, key: String) -> UploadError {
        debug!(key = %key, "Upload cancelled");
        self.emit(TransferEvent::UploadCancelled {
            upload_id,
            key: key.clone(),
        });
        UploadError::Cancelled { key }
    }

    fn emit(&self, event: TransferEvent) {
        let _ = self.events.emit(CoreEvent::Transfer(event));
    }
}
