//! # Event Bus System
//!
//! Change notification for the media drive core, built on `tokio::sync::broadcast`.
//! Presentation layers subscribe here instead of polling the catalog.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐
//! │ CatalogStore ├────────────>│           │
//! └──────────────┘             │           │    subscribe   ┌────────────┐
//! ┌──────────────┐    emit     │ EventBus  ├───────────────>│ UI / host  │
//! │ Synchronizer ├────────────>│ (broadcast│                └────────────┘
//! └──────────────┘             │  channel) │
//! ┌──────────────┐    emit     │           │
//! │ Coordinators ├────────────>│           │
//! └──────────────┘             └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Catalog(CatalogEvent::RecordRemoved {
//!         key: "old.txt".to_string(),
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Catalog(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; re-read the catalog snapshot and keep listening.
//! - **`RecvError::Closed`**: All senders have been dropped. Treat as shutdown.
//!
//! Publishing with no subscribers returns an error which emitters ignore: a
//! catalog nobody is watching is still a valid catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Committed catalog mutations
    Catalog(CatalogEvent),
    /// Listing reconciliation runs
    Sync(SyncEvent),
    /// Uploads and deletions against the store
    Transfer(TransferEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Catalog(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Transfer(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Sync(SyncEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Transfer(TransferEvent::UploadFailed { .. }) => EventSeverity::Error,
            CoreEvent::Transfer(TransferEvent::DeleteFailed { .. }) => EventSeverity::Error,
            CoreEvent::Transfer(TransferEvent::UploadCancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Sync(SyncEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Transfer(TransferEvent::UploadCompleted { .. }) => EventSeverity::Info,
            CoreEvent::Transfer(TransferEvent::Deleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Catalog Events
// ============================================================================

/// Emitted by the catalog store after a mutation has been committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// A record was inserted or overwritten.
    RecordUpserted {
        /// Object key of the record.
        key: String,
    },
    /// A record was removed.
    RecordRemoved {
        /// Object key of the removed record.
        key: String,
    },
    /// The whole catalog was swapped for a reconciled snapshot.
    Replaced {
        /// Keys new to the catalog.
        added: u64,
        /// Keys present before and after.
        updated: u64,
        /// Keys dropped because the listing no longer had them.
        removed: u64,
        /// Size of the new catalog.
        total: u64,
    },
    /// The catalog was emptied.
    Cleared,
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::RecordUpserted { .. } => "Catalog record upserted",
            CatalogEvent::RecordRemoved { .. } => "Catalog record removed",
            CatalogEvent::Replaced { .. } => "Catalog replaced by reconciled snapshot",
            CatalogEvent::Cleared => "Catalog cleared",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Events related to reconciling the remote listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Reconciliation started.
    Started {
        /// Identifier of this run.
        run_id: String,
    },
    /// One listing page was fetched.
    PageFetched {
        /// Identifier of this run.
        run_id: String,
        /// One-based page number.
        page: u32,
        /// Items on this page.
        items: u64,
    },
    /// Reconciliation committed a new catalog.
    Completed {
        /// Identifier of this run.
        run_id: String,
        added: u64,
        updated: u64,
        removed: u64,
        /// Size of the new catalog.
        total: u64,
        /// Wall time of the run in milliseconds.
        duration_ms: u64,
    },
    /// Reconciliation aborted; the catalog was left untouched.
    Failed {
        /// Identifier of this run.
        run_id: String,
        /// Human-readable error message.
        message: String,
        /// Pages fetched before the failure.
        pages_fetched: u32,
        /// Whether a retry may succeed.
        recoverable: bool,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Sync started",
            SyncEvent::PageFetched { .. } => "Listing page fetched",
            SyncEvent::Completed { .. } => "Sync completed successfully",
            SyncEvent::Failed { .. } => "Sync failed",
        }
    }
}

// ============================================================================
// Transfer Events
// ============================================================================

/// Events related to uploads and deletions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TransferEvent {
    /// Upload accepted and streaming started.
    UploadStarted {
        upload_id: String,
        key: String,
        size_bytes: u64,
    },
    /// Upload progress changed (0-100, never decreasing per upload).
    UploadProgress { upload_id: String, percent: u8 },
    /// Upload stored and committed to the catalog.
    UploadCompleted { upload_id: String, key: String },
    /// Upload failed; the catalog was not touched.
    UploadFailed {
        upload_id: String,
        key: String,
        message: String,
        /// Whether the failure is transient.
        transient: bool,
    },
    /// Upload was cancelled by the caller; the catalog was not touched.
    UploadCancelled { upload_id: String, key: String },
    /// Object deleted (or already absent) and removed from the catalog.
    Deleted { key: String },
    /// Delete failed; the catalog was not touched.
    DeleteFailed {
        key: String,
        message: String,
        transient: bool,
    },
}

impl TransferEvent {
    fn description(&self) -> &str {
        match self {
            TransferEvent::UploadStarted { .. } => "Upload started",
            TransferEvent::UploadProgress { .. } => "Upload in progress",
            TransferEvent::UploadCompleted { .. } => "Upload completed",
            TransferEvent::UploadFailed { .. } => "Upload failed",
            TransferEvent::UploadCancelled { .. } => "Upload cancelled",
            TransferEvent::Deleted { .. } => "Object deleted",
            TransferEvent::DeleteFailed { .. } => "Delete failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future events.
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let catalog_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Catalog(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
