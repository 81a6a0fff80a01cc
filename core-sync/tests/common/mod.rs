//! In-memory object store shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    ByteStream, ListPage, ObjectStore, ObjectSummary, StoreError, StoreResult, TransferCallback,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Ordered map of objects with offset-based continuation tokens.
pub struct InMemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    page_size: usize,
    fail_on_page: Mutex<Option<u32>>,
    stall_puts: AtomicBool,
    first_chunk_seen: Arc<Notify>,
    put_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
            fail_on_page: Mutex::new(None),
            stall_puts: AtomicBool::new(false),
            first_chunk_seen: Arc::new(Notify::new()),
            put_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_objects(page_size: usize, keys: &[&str]) -> Self {
        let store = Self::new(page_size);
        for key in keys {
            store.insert(key, 1);
        }
        store
    }

    pub fn insert(&self, key: &str, size: u64) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                size,
                last_modified: Utc::now(),
            },
        );
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Makes the given one-based listing page fail with a network error.
    pub fn fail_listing_on_page(&self, page: Option<u32>) {
        *self.fail_on_page.lock().unwrap() = page;
    }

    /// Puts hang forever after their first chunk.
    pub fn stall_puts(&self) {
        self.stall_puts.store(true, Ordering::SeqCst);
    }

    /// Resolves once a stalled put has transferred its first chunk.
    pub async fn wait_for_first_chunk(&self) {
        self.first_chunk_seen.notified().await;
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn list(&self, continuation_token: Option<String>) -> StoreResult<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let offset = match continuation_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::Rejected {
                    status: 400,
                    message: format!("bad continuation token {token}"),
                })?,
            None => 0,
        };
        let page_number = (offset / self.page_size) as u32 + 1;
        if *self.fail_on_page.lock().unwrap() == Some(page_number) {
            return Err(StoreError::Network("connection reset".to_string()));
        }

        let objects = self.objects.lock().unwrap();
        let items: Vec<ObjectSummary> = objects
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|(key, object)| {
                ObjectSummary::new(key.clone())
                    .with_size(object.size)
                    .with_last_modified(object.last_modified)
            })
            .collect();
        let next = offset + items.len();
        let next_token = (next < objects.len()).then(|| next.to_string());

        Ok(ListPage { items, next_token })
    }

    async fn put(
        &self,
        key: &str,
        mut body: ByteStream,
        on_transfer: TransferCallback,
    ) -> StoreResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        let mut transferred = 0u64;
        while let Some(chunk) = body.next().await {
            transferred += chunk?.len() as u64;
            on_transfer(transferred);

            if self.stall_puts.load(Ordering::SeqCst) {
                self.first_chunk_seen.notify_one();
                std::future::pending::<()>().await;
            }
        }

        self.insert(key, transferred);
        Ok(())
    }

    async fn delete_if_exists(&self, key: &str) -> StoreResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
