//! # Deletion Coordinator
//!
//! Deletes an object from the store, drops it from the catalog, then runs a
//! best-effort reconciliation. Deleting a key that does not exist succeeds.

use crate::error::{DeleteError, ValidationError};
use crate::reconciler::ListingSynchronizer;
use bridge_traits::{ObjectStore, StoreError};
use core_catalog::CatalogStore;
use core_runtime::events::{CoreEvent, EventBus, TransferEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct DeletionCoordinator {
    store: Arc<dyn ObjectStore>,
    catalog: Arc<CatalogStore>,
    synchronizer: Arc<ListingSynchronizer>,
    events: EventBus,
}

impl DeletionCoordinator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        synchronizer: Arc<ListingSynchronizer>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            catalog: Arc::clone(synchronizer.catalog()),
            synchronizer,
            events,
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_object(&self, key: &str) -> Result<(), DeleteError> {
        if key.is_empty() {
            warn!("Delete rejected: empty key");
            return Err(ValidationError::MalformedKey {
                value: String::new(),
                reason: "key is empty".to_string(),
            }
            .into());
        }

        match self.store.delete_if_exists(key).await {
            Ok(()) => {}
            Err(StoreError::NotFound { .. }) => {
                debug!(key, "Object already absent from store");
            }
            Err(source) => return Err(self.failed(key, source)),
        }

        let removed = self.catalog.remove(key);
        info!(key, removed, "Object deleted");
        let _ = self
            .events
            .emit(CoreEvent::Transfer(TransferEvent::Deleted {
                key: key.to_string(),
            }));

        // The local removal stands even if this fails
        if let Err(e) = self.synchronizer.reconcile().await {
            warn!(key, error = %e, "Reconciliation after delete failed");
        }

        Ok(())
    }

    fn failed(&self, key: &str, source: StoreError) -> DeleteError {
        warn!(key, error = %source, transient = source.is_transient(), "Delete failed");
        let _ = self
            .events
            .emit(CoreEvent::Transfer(TransferEvent::DeleteFailed {
                key: key.to_string(),
                message: source.to_string(),
                transient: source.is_transient(),
            }));
        DeleteError::Store {
            key: key.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::SyncConfig;
    use async_trait::async_trait;
    use bridge_traits::{ByteStream, ListPage, ObjectSummary, StoreResult, TransferCallback};
    use core_catalog::ObjectRecord;
    use mockall::mock;

    mock! {
        Store {}

        #[async_trait]
        impl ObjectStore for Store {
            async fn list(&self, continuation_token: Option<String>) -> StoreResult<ListPage>;
            async fn put(&self, key: &str, body: ByteStream, on_transfer: TransferCallback) -> StoreResult<()>;
            async fn delete_if_exists(&self, key: &str) -> StoreResult<()>;
        }
    }

    fn coordinator(store: MockStore) -> (DeletionCoordinator, Arc<CatalogStore>) {
        let store: Arc<dyn ObjectStore> = Arc::new(store);
        let events = EventBus::new(64);
        let catalog = Arc::new(CatalogStore::new(events.clone()));
        let sync = Arc::new(ListingSynchronizer::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            events.clone(),
            SyncConfig::default(),
        ));
        (DeletionCoordinator::new(store, sync, events), catalog)
    }

    fn listing(keys: &'static [&'static str]) -> impl Fn(Option<String>) -> StoreResult<ListPage> {
        move |_| {
            Ok(ListPage {
                items: keys.iter().map(|k| ObjectSummary::new(*k)).collect(),
                next_token: None,
            })
        }
    }

    #[tokio::test]
    async fn test_delete_removes_from_catalog() {
        let mut store = MockStore::new();
        store
            .expect_delete_if_exists()
            .withf(|key| key == "a.png")
            .times(1)
            .returning(|_| Ok(()));
        store.expect_list().returning(listing(&["b.png"]));

        let (deleter, catalog) = coordinator(store);
        catalog.upsert(ObjectRecord::new("a.png", 0, None));
        catalog.upsert(ObjectRecord::new("b.png", 0, None));

        deleter.delete_object("a.png").await.unwrap();
        assert_eq!(catalog.get_all().sorted_keys(), vec!["b.png"]);
    }

    #[tokio::test]
    async fn test_delete_unknown_key_is_silent() {
        let mut store = MockStore::new();
        store.expect_delete_if_exists().returning(|_| Ok(()));
        store.expect_list().returning(listing(&["b.png"]));

        let (deleter, catalog) = coordinator(store);
        catalog.upsert(ObjectRecord::new("b.png", 0, None));
        let before = catalog.get_all();

        deleter.delete_object("ghost.png").await.unwrap();
        assert_eq!(catalog.get_all(), before);
    }

    #[tokio::test]
    async fn test_not_found_is_treated_as_deleted() {
        let mut store = MockStore::new();
        store.expect_delete_if_exists().returning(|key| {
            Err(StoreError::NotFound {
                key: key.to_string(),
            })
        });
        store.expect_list().returning(listing(&[]));

        let (deleter, catalog) = coordinator(store);
        catalog.upsert(ObjectRecord::new("a.png", 0, None));

        deleter.delete_object("a.png").await.unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_record() {
        let mut store = MockStore::new();
        store
            .expect_delete_if_exists()
            .returning(|_| Err(StoreError::Timeout("delete".to_string())));
        store.expect_list().never();

        let (deleter, catalog) = coordinator(store);
        catalog.upsert(ObjectRecord::new("a.png", 0, None));

        let err = deleter.delete_object("a.png").await.unwrap_err();
        assert_eq!(err.key(), Some("a.png"));
        assert!(err.is_transient());
        assert!(catalog.get("a.png").is_some());
    }

    #[tokio::test]
    async fn test_empty_key_rejected_without_store_call() {
        let mut store = MockStore::new();
        store.expect_delete_if_exists().never();
        store.expect_list().never();

        let (deleter, catalog) = coordinator(store);
        catalog.upsert(ObjectRecord::new("a.png", 0, None));

        let err = deleter.delete_object("").await.unwrap_err();
        assert!(matches!(
            err,
            DeleteError::Validation(ValidationError::MalformedKey { .. })
        ));
        assert!(!err.is_transient());
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_resync_does_not_undo_removal() {
        let mut store = MockStore::new();
        store.expect_delete_if_exists().returning(|_| Ok(()));
        store
            .expect_list()
            .returning(|_| Err(StoreError::Unavailable("503".to_string())));

        let (deleter, catalog) = coordinator(store);
        catalog.upsert(ObjectRecord::new("a.png", 0, None));
        catalog.upsert(ObjectRecord::new("b.png", 0, None));

        deleter.delete_object("a.png").await.unwrap();
        assert_eq!(catalog.get_all().sorted_keys(), vec!["b.png"]);
    }
}
