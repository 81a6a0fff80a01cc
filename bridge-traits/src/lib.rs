//! # Host Bridge Traits
//!
//! Collaborator contracts that the media drive core consumes but never
//! implements itself.
//!
//! ## Overview
//!
//! This crate defines the contract between the core and the outside world.
//! The core is handed these implementations explicitly at construction time;
//! nothing is initialized through process-wide globals.
//!
//! ## Traits
//!
//! ### Storage
//! - [`ObjectStore`](storage::ObjectStore) - Paginated listing, streamed puts, idempotent deletes
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Implementations
//!
//! | Store | Implementation Crate | Status |
//! |-------|---------------------|--------|
//! | Local directory | `bridge-desktop` | ✅ Available |
//! | Cloud blob container | host-provided | 📋 Host responsibility |
//!
//! ## Error Handling
//!
//! Store calls fail with [`StoreError`](error::StoreError), which classifies
//! itself as transient or terminal. Implementations should:
//!
//! - Map timeouts, resets and throttling to transient variants
//! - Map permission and missing-object failures to terminal variants
//! - Keep retry loops inside the implementation, never in the core
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so a single store handle can
//! serve concurrent uploads, deletes and listings.

pub mod error;
pub mod storage;
pub mod time;

pub use error::{BridgeError, ErrorKind, StoreError, StoreResult};

// Re-export commonly used types
pub use storage::{
    chunked_stream, ByteStream, ListPage, ObjectStore, ObjectSummary, TransferCallback,
};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
