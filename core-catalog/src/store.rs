//! # Catalog Store
//!
//! In-memory index of known objects and the single source of truth for
//! readers.
//!
//! ## Consistency
//!
//! The map lives behind `RwLock<Arc<HashMap>>`. Writers take the write lock,
//! copy-on-write the map through [`Arc::make_mut`], and publish a change event
//! before releasing the lock, so the event order matches the commit order.
//! Readers clone the `Arc` under a read lock and never observe a half-applied
//! write. The lock is never held across an `.await`.

use crate::models::{CatalogSnapshot, ObjectRecord};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use tracing::{debug, trace};

/// Outcome of swapping in a new snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// Keys present only in the new snapshot.
    pub added: usize,
    /// Keys present in both whose record changed.
    pub updated: usize,
    /// Keys dropped because the new snapshot lacks them.
    pub removed: usize,
    /// Size of the new snapshot.
    pub total: usize,
}

pub struct CatalogStore {
    records: RwLock<Arc<HashMap<String, ObjectRecord>>>,
    events: EventBus,
}

impl CatalogStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            records: RwLock::new(Arc::new(HashMap::new())),
            events,
        }
    }

    /// Inserts or overwrites the record under its key.
    pub fn upsert(&self, record: ObjectRecord) {
        let key = record.key().to_string();
        let mut guard = self.write();
        Arc::make_mut(&mut guard).insert(key.clone(), record);
        trace!(key = %key, "Catalog record upserted");
        self.publish(CatalogEvent::RecordUpserted { key });
    }

    /// Removes `key`. Returns whether a record was present; absent keys are a
    /// silent no-op.
    pub fn remove(&self, key: &str) -> bool {
        let mut guard = self.write();
        if !guard.contains_key(key) {
            return false;
        }
        Arc::make_mut(&mut guard).remove(key);
        trace!(key = %key, "Catalog record removed");
        self.publish(CatalogEvent::RecordRemoved {
            key: key.to_string(),
        });
        true
    }

    /// Latest committed snapshot.
    pub fn get_all(&self) -> CatalogSnapshot {
        let guard = self.records.read().unwrap_or_else(PoisonError::into_inner);
        CatalogSnapshot::from_shared(Arc::clone(&guard))
    }

    pub fn get(&self, key: &str) -> Option<ObjectRecord> {
        let guard = self.records.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut guard = self.write();
        *guard = Arc::new(HashMap::new());
        debug!("Catalog cleared");
        self.publish(CatalogEvent::Cleared);
    }

    /// Atomically swaps the live catalog for `candidate`.
    ///
    /// Keys missing from the candidate are dropped, new keys are added and
    /// shared keys take the candidate's record.
    pub fn replace(&self, candidate: CatalogSnapshot) -> ReplaceSummary {
        let incoming = candidate.into_shared();
        let mut guard = self.write();

        let mut summary = ReplaceSummary {
            total: incoming.len(),
            ..ReplaceSummary::default()
        };
        for (key, record) in incoming.iter() {
            match guard.get(key) {
                None => summary.added += 1,
                Some(existing) if existing != record => summary.updated += 1,
                Some(_) => {}
            }
        }
        summary.removed = guard
            .keys()
            .filter(|key| !incoming.contains_key(key.as_str()))
            .count();

        *guard = incoming;
        debug!(
            added = summary.added,
            updated = summary.updated,
            removed = summary.removed,
            total = summary.total,
            "Catalog replaced"
        );
        self.publish(CatalogEvent::Replaced {
            added: summary.added as u64,
            updated: summary.updated as u64,
            removed: summary.removed as u64,
            total: summary.total as u64,
        });

        summary
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<HashMap<String, ObjectRecord>>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: CatalogEvent) {
        // No subscribers is fine
        let _ = self.events.emit(CoreEvent::Catalog(event));
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("records", &self.len())
            .finish()
    }
}
