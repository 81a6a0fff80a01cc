//! Object Store Abstractions
//!
//! Provides the platform-agnostic contract for the remote blob store the
//! catalog mirrors: paginated listing, streamed uploads with transfer
//! progress, and idempotent deletion.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

use crate::error::StoreResult;

/// One entry of a remote listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key, including any folder prefix
    pub key: String,
    /// Content length in bytes, if the store reported one
    pub size: Option<u64>,
    /// Last modification time, if the store reported one
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectSummary {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            last_modified: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// A single page of a remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub items: Vec<ObjectSummary>,
    /// Continuation token for the next page; `None` on the last page
    pub next_token: Option<String>,
}

/// Streamed upload body.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Invoked by the store with the cumulative number of bytes transferred.
pub type TransferCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Split an in-memory buffer into a chunked [`ByteStream`].
pub fn chunked_stream(data: Bytes, chunk_size: usize) -> ByteStream {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(data.len() / chunk_size + 1);
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + chunk_size).min(data.len());
        chunks.push(Ok(data.slice(offset..end)));
        offset = end;
    }
    stream::iter(chunks).boxed()
}

/// Remote blob store trait
///
/// Implemented outside the core (cloud SDK wrapper, local directory, test
/// fake). Authentication, request signing and retries belong to the
/// implementation.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::ObjectStore;
///
/// async fn count_objects(store: &dyn ObjectStore) -> StoreResult<usize> {
///     let mut total = 0;
///     let mut token = None;
///     loop {
///         let page = store.list(token).await?;
///         total += page.items.len();
///         token = page.next_token;
///         if token.is_none() {
///             return Ok(total);
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one listing page
    ///
    /// Pass `None` for the first page and the previous page's `next_token`
    /// afterwards.
    async fn list(&self, continuation_token: Option<String>) -> StoreResult<ListPage>;

    /// Upload `body` under `key`, overwriting any existing object
    ///
    /// Implementations report cumulative transferred bytes through
    /// `on_transfer` as the body is consumed.
    async fn put(&self, key: &str, body: ByteStream, on_transfer: TransferCallback)
        -> StoreResult<()>;

    /// Delete `key`; succeeds when the object does not exist
    async fn delete_if_exists(&self, key: &str) -> StoreResult<()>;
}
