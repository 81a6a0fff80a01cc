//! # Core Configuration Module
//!
//! Provides configuration management for the media drive core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the collaborators and tunables the core needs. It
//! enforces fail-fast validation so a missing object store is reported at
//! startup rather than on the first upload.
//!
//! ## Required Dependencies
//!
//! - `ObjectStore` - The remote blob store the catalog mirrors
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source for upload keys (default: `SystemClock`)
//! - `LoggerSink` - Host log forwarding (default: none)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .object_store(Arc::new(MyBlobContainer::new(sas_url)))
//!     .max_upload_bytes(100 * 1024 * 1024)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics: no object store was provided
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing object store");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, LoggerSink, ObjectStore, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Default upload size limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Default upper bound for one full listing walk.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(300);

/// Default chunk size used when streaming in-memory uploads.
pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 256 * 1024;

/// Core configuration for the media drive core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Remote blob store (required)
    pub object_store: Arc<dyn ObjectStore>,

    /// Time source for generated keys and optimistic records
    pub clock: Arc<dyn Clock>,

    /// Optional sink mirroring log events to the host
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Files larger than this are rejected before any store contact
    pub max_upload_bytes: u64,

    /// Per-subscriber event buffer
    pub event_buffer_size: usize,

    /// Upper bound for a full listing walk
    pub sync_timeout: Duration,

    /// Chunk size for streaming in-memory upload bodies
    pub upload_chunk_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("object_store", &"ObjectStore { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("sync_timeout", &self.sync_timeout)
            .field("upload_chunk_size", &self.upload_chunk_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Upload limit is greater than zero
    /// - Event buffer holds at least one event
    /// - Sync timeout is non-zero
    /// - Upload chunk size is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_bytes == 0 {
            return Err(Error::Config(
                "Upload size limit must be greater than 0 bytes".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.sync_timeout.is_zero() {
            return Err(Error::Config(
                "Sync timeout must be greater than 0".to_string(),
            ));
        }

        if self.upload_chunk_size == 0 {
            return Err(Error::Config(
                "Upload chunk size must be greater than 0 bytes".to_string(),
            ));
        }

        Ok(())
    }
}

fn object_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ObjectStore".to_string(),
        message: "ObjectStore implementation is required to list, upload and delete objects. \
                 Desktop: enable the 'local-store' feature and pass a LocalDirectoryStore. \
                 Cloud: inject an adapter wrapping the provider SDK."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    object_store: Option<Arc<dyn ObjectStore>>,
    clock: Option<Arc<dyn Clock>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    max_upload_bytes: Option<u64>,
    event_buffer_size: Option<usize>,
    sync_timeout: Option<Duration>,
    upload_chunk_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the object store the catalog mirrors.
    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Overrides the time source (tests inject a `ManualClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Sets the upload size limit in bytes.
    ///
    /// Defaults to 50 MiB.
    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = Some(bytes);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = Some(timeout);
        self
    }

    pub fn upload_chunk_size(mut self, bytes: usize) -> Self {
        self.upload_chunk_size = Some(bytes);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - No object store was provided
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let object_store = self.object_store.ok_or_else(object_store_missing_error)?;

        let config = CoreConfig {
            object_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            logger_sink: self.logger_sink,
            max_upload_bytes: self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            sync_timeout: self.sync_timeout.unwrap_or(DEFAULT_SYNC_TIMEOUT),
            upload_chunk_size: self.upload_chunk_size.unwrap_or(DEFAULT_UPLOAD_CHUNK_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
