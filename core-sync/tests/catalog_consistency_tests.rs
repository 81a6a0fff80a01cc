//! Integration tests for catalog consistency across reconcile, upload and
//! delete, run against an in-memory object store.
//!
//! These tests verify:
//! - Reconciliation swaps the catalog only after every page succeeds
//! - Uploads commit a classified record and report ordered progress
//! - Concurrent uploads get distinct keys and independent progress
//! - Cancellation and store failures leave the catalog untouched
//! - Deletes are idempotent

mod common;

use bridge_traits::{ManualClock, ObjectStore};
use chrono::{TimeZone, Utc};
use common::InMemoryStore;
use core_catalog::{CatalogStore, Category, ObjectRecord};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent, TransferEvent};
use core_sync::{
    no_progress, CancellationToken, DeletionCoordinator, ListingSynchronizer, SyncConfig,
    SyncError, UploadConfig, UploadCoordinator, UploadError, UploadSource,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    store: Arc<InMemoryStore>,
    catalog: Arc<CatalogStore>,
    events: EventBus,
    sync: Arc<ListingSynchronizer>,
    uploads: Arc<UploadCoordinator>,
    deletes: DeletionCoordinator,
}

impl Harness {
    fn new(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        let dyn_store: Arc<dyn ObjectStore> = store.clone();
        let events = EventBus::new(1024);
        let catalog = Arc::new(CatalogStore::new(events.clone()));
        let sync = Arc::new(ListingSynchronizer::new(
            Arc::clone(&dyn_store),
            Arc::clone(&catalog),
            events.clone(),
            SyncConfig::default(),
        ));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 27, 8, 0, 0).unwrap(),
        ));
        let uploads = Arc::new(UploadCoordinator::new(
            Arc::clone(&dyn_store),
            Arc::clone(&sync),
            clock,
            events.clone(),
            UploadConfig {
                max_upload_bytes: 1024 * 1024,
                chunk_size: 16,
            },
        ));
        let deletes = DeletionCoordinator::new(dyn_store, Arc::clone(&sync), events.clone());

        Self {
            store,
            catalog,
            events,
            sync,
            uploads,
            deletes,
        }
    }

    fn catalog_keys(&self) -> Vec<String> {
        self.catalog
            .get_all()
            .sorted_keys()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn recording_progress() -> (core_sync::ProgressCallback, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (Arc::new(move |p| sink.lock().unwrap().push(p)), seen)
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn reconcile_converges_to_remote_listing() {
    let h = Harness::new(InMemoryStore::with_objects(2, &["a", "b", "c"]));
    for key in ["a", "b", "d"] {
        h.catalog.upsert(ObjectRecord::new(key, 1, None));
    }

    h.sync.reconcile().await.unwrap();

    assert_eq!(h.catalog_keys(), vec!["a", "b", "c"]);
    assert_eq!(h.store.list_calls(), 2);
}

#[tokio::test]
async fn reconcile_failure_midway_keeps_prior_catalog() {
    let h = Harness::new(InMemoryStore::with_objects(2, &["a", "b", "c"]));
    h.store.fail_listing_on_page(Some(2));
    for key in ["a", "b", "d"] {
        h.catalog.upsert(ObjectRecord::new(key, 1, None));
    }
    let before = h.catalog.get_all();

    let err = h.sync.reconcile().await.unwrap_err();

    assert!(matches!(err, SyncError::PageFailed { page: 2, .. }));
    assert_eq!(h.catalog.get_all(), before);
}

#[tokio::test]
async fn reconcile_emits_lifecycle_events() {
    let h = Harness::new(InMemoryStore::with_objects(1, &["x.png", "y.png"]));
    let mut rx = h.events.subscribe();

    h.sync.reconcile().await.unwrap();

    let mut sync_events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Sync(e) = event {
            sync_events.push(e);
        }
    }
    assert!(matches!(sync_events.first(), Some(SyncEvent::Started { .. })));
    assert_eq!(
        sync_events
            .iter()
            .filter(|e| matches!(e, SyncEvent::PageFetched { .. }))
            .count(),
        2
    );
    assert!(matches!(
        sync_events.last(),
        Some(SyncEvent::Completed { added: 2, removed: 0, total: 2, .. })
    ));
}

#[tokio::test]
async fn empty_listing_clears_stale_records() {
    let h = Harness::new(InMemoryStore::new(10));
    h.catalog.upsert(ObjectRecord::new("stale.pdf", 1, None));

    let snapshot = h.sync.reconcile().await.unwrap();

    assert!(snapshot.is_empty());
    assert!(h.catalog.is_empty());
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn upload_end_to_end_commits_classified_record() {
    let h = Harness::new(InMemoryStore::new(10));
    let (progress, seen) = recording_progress();

    let key = h
        .uploads
        .upload(
            UploadSource::from_bytes("photo.png", vec![7u8; 100]),
            "vacation",
            progress,
        )
        .await
        .unwrap();

    let timestamp = key
        .strip_prefix("vacation/")
        .and_then(|rest| rest.strip_suffix("-photo.png"))
        .expect("key layout");
    assert!(timestamp.parse::<i64>().is_ok());

    let record = h.catalog.get(&key).expect("record committed");
    assert_eq!(record.category(), Category::Image);
    assert_eq!(record.size_bytes(), 100);
    assert_eq!(h.store.get(&key).map(|o| o.size), Some(100));

    let seen = seen.lock().unwrap().clone();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.iter().all(|p| *p <= 100));
}

#[tokio::test]
async fn oversize_upload_never_calls_put() {
    let h = Harness::new(InMemoryStore::new(10));

    let err = h
        .uploads
        .upload(
            UploadSource::from_bytes("huge.mp4", vec![0u8; 1024 * 1024 + 1]),
            "",
            no_progress(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Validation(_)));
    assert_eq!(h.store.put_calls(), 0);
    assert!(h.catalog.is_empty());
}

#[tokio::test]
async fn empty_file_reports_full_progress() {
    let h = Harness::new(InMemoryStore::new(10));
    let (progress, seen) = recording_progress();

    h.uploads
        .upload(UploadSource::from_bytes("empty.txt", Vec::new()), "", progress)
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().last(), Some(&100));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_get_distinct_keys() {
    let h = Harness::new(InMemoryStore::new(100));

    let tasks: Vec<_> = (0..12)
        .map(|_| {
            let uploads = Arc::clone(&h.uploads);
            let (progress, seen) = recording_progress();
            tokio::spawn(async move {
                let key = uploads
                    .upload(
                        UploadSource::from_bytes("same.mp3", vec![1u8; 64]),
                        "music",
                        progress,
                    )
                    .await
                    .unwrap();
                (key, seen)
            })
        })
        .collect();

    let mut keys = HashSet::new();
    for task in tasks {
        let (key, seen) = task.await.unwrap();
        let seen = seen.lock().unwrap().clone();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&100));
        assert!(keys.insert(key));
    }

    assert_eq!(keys.len(), 12);
    let catalog = h.catalog.get_all();
    for key in &keys {
        assert!(catalog.contains_key(key));
    }
}

#[tokio::test]
async fn cancelled_upload_leaves_catalog_untouched() {
    let h = Harness::new(InMemoryStore::new(10));
    h.store.stall_puts();
    let cancel = CancellationToken::new();

    let upload = {
        let uploads = Arc::clone(&h.uploads);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            uploads
                .upload_with_cancellation(
                    UploadSource::from_bytes("clip.webm", vec![0u8; 64]),
                    "clips",
                    no_progress(),
                    cancel,
                )
                .await
        })
    };

    h.store.wait_for_first_chunk().await;
    cancel.cancel();

    let err = upload.await.unwrap().unwrap_err();
    assert!(matches!(err, UploadError::Cancelled { .. }));
    assert!(h.catalog.is_empty());
    assert_eq!(h.store.list_calls(), 0);
}

#[tokio::test]
async fn upload_emits_transfer_events_in_order() {
    let h = Harness::new(InMemoryStore::new(10));
    let mut rx = h.events.subscribe();

    h.uploads
        .upload(UploadSource::from_bytes("a.gif", vec![0u8; 32]), "", no_progress())
        .await
        .unwrap();

    let mut transfer = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Transfer(e) = event {
            transfer.push(e);
        }
    }
    assert!(matches!(transfer.first(), Some(TransferEvent::UploadStarted { .. })));
    assert!(matches!(transfer.last(), Some(TransferEvent::UploadCompleted { .. })));
    assert!(transfer
        .iter()
        .any(|e| matches!(e, TransferEvent::UploadProgress { percent: 100, .. })));
}

// ============================================================================
// Deletes
// ============================================================================

#[tokio::test]
async fn delete_unknown_key_succeeds_without_change() {
    let h = Harness::new(InMemoryStore::with_objects(10, &["keep.png"]));
    h.sync.reconcile().await.unwrap();
    let before = h.catalog.get_all();

    h.deletes.delete_object("missing.png").await.unwrap();

    assert_eq!(h.catalog.get_all(), before);
}

#[tokio::test]
async fn upload_then_delete_round_trip() {
    let h = Harness::new(InMemoryStore::new(10));

    let key = h
        .uploads
        .upload(UploadSource::from_bytes("notes.txt", "hello"), "docs", no_progress())
        .await
        .unwrap();
    assert_eq!(h.catalog_keys(), vec![key.clone()]);

    h.deletes.delete_object(&key).await.unwrap();
    h.deletes.delete_object(&key).await.unwrap();

    assert!(h.catalog.is_empty());
    assert!(h.store.keys().is_empty());
}
