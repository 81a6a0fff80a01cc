//! # Listing Synchronizer
//!
//! Pages through the remote listing and swaps the result into the catalog.
//!
//! ## Workflow
//!
//! 1. Take the run lock so reconciliations commit in the order they started
//! 2. Consume the listing as a lazy stream of pages
//! 3. Build a candidate snapshot from every item, classifying each key
//! 4. Only once the last page has arrived, replace the live catalog
//!
//! A failed page or a timeout aborts the run before step 4, so readers never
//! see a partially reconciled catalog.

use crate::error::{Result, SyncError};
use bridge_traits::{ListPage, ObjectStore};
use core_catalog::{CatalogSnapshot, CatalogStore, ObjectRecord};
use core_runtime::config::{CoreConfig, DEFAULT_SYNC_TIMEOUT};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use futures::stream::{self, Stream, TryStreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Listing synchronizer configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound for one full listing walk
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

impl From<&CoreConfig> for SyncConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            timeout: config.sync_timeout,
        }
    }
}

/// Lazily walks the listing, one store call per polled page.
///
/// Yields `(page_number, page)` with one-based page numbers and stops after
/// the first page without a continuation token.
pub fn listing_pages(
    store: Arc<dyn ObjectStore>,
) -> impl Stream<Item = Result<(u32, ListPage)>> + Send {
    // None: listing exhausted. Some(token): fetch the next page with `token`.
    let start: Option<Option<String>> = Some(None);

    stream::try_unfold((start, 0u32), move |(cursor, fetched)| {
        let store = Arc::clone(&store);
        async move {
            let Some(token) = cursor else {
                return Ok(None);
            };

            let page_number = fetched + 1;
            let page = store
                .list(token)
                .await
                .map_err(|source| SyncError::PageFailed {
                    page: page_number,
                    source,
                })?;

            let next = page
                .next_token
                .clone()
                .filter(|token| !token.is_empty())
                .map(Some);

            Ok(Some(((page_number, page), (next, page_number))))
        }
    })
}

pub struct ListingSynchronizer {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<CatalogStore>,
    events: EventBus,
    config: SyncConfig,
    run_lock: Mutex<()>,
}

impl ListingSynchronizer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        catalog: Arc<CatalogStore>,
        events: EventBus,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            events,
            config,
            run_lock: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    /// Reconciles the catalog with the remote listing.
    ///
    /// On success returns the snapshot that was committed. On failure the
    /// live catalog is exactly what it was before the call.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<CatalogSnapshot> {
        let _run = self.run_lock.lock().await;

        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        self.emit(SyncEvent::Started {
            run_id: run_id.clone(),
        });

        let mut pages_fetched = 0u32;
        let walk = self.collect_candidate(&run_id, &mut pages_fetched);
        let outcome = match timeout(self.config.timeout, walk).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(self.config.timeout.as_secs())),
        };

        let candidate = match outcome {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(
                    run_id = %run_id,
                    pages_fetched,
                    error = %e,
                    "Reconciliation aborted, catalog left unchanged"
                );
                self.emit(SyncEvent::Failed {
                    run_id,
                    message: e.to_string(),
                    pages_fetched,
                    recoverable: e.is_transient(),
                });
                return Err(e);
            }
        };

        let summary = self.catalog.replace(candidate.clone());
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            pages = pages_fetched,
            added = summary.added,
            updated = summary.updated,
            removed = summary.removed,
            total = summary.total,
            duration_ms,
            "Reconciliation completed"
        );
        self.emit(SyncEvent::Completed {
            run_id,
            added: summary.added as u64,
            updated: summary.updated as u64,
            removed: summary.removed as u64,
            total: summary.total as u64,
            duration_ms,
        });

        Ok(candidate)
    }

    async fn collect_candidate(
        &self,
        run_id: &str,
        pages_fetched: &mut u32,
    ) -> Result<CatalogSnapshot> {
        let pages = listing_pages(Arc::clone(&self.store));
        futures::pin_mut!(pages);

        let mut records = Vec::new();
        while let Some((page_number, page)) = pages.try_next().await? {
            *pages_fetched = page_number;
            let items = page.items.len();
            debug!(run_id, page = page_number, items, "Fetched listing page");

            records.extend(page.items.iter().map(ObjectRecord::from_summary));
            self.emit(SyncEvent::PageFetched {
                run_id: run_id.to_string(),
                page: page_number,
                items: items as u64,
            });
        }

        // Duplicate keys across pages: the later entry wins
        Ok(records.into_iter().collect())
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.emit(CoreEvent::Sync(event));
    }
}
