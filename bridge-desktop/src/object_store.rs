//! Object store backed by a local directory tree, using Tokio.

use async_trait::async_trait;
use bridge_traits::{
    error::{StoreError, StoreResult},
    storage::{ByteStream, ListPage, ObjectStore, ObjectSummary, TransferCallback},
};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory (under the root) holding in-flight uploads. Never listed.
const STAGING_DIR: &str = ".staging";

/// Default number of objects per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Local directory object store
///
/// Maps object keys onto relative file paths under a root directory:
/// - Keys use `/` separators; each segment becomes a path component
/// - Listing is a sorted walk of the tree, paged by offset tokens
/// - Puts stream into a staging file and are renamed into place, so a
///   failed upload never leaves a partial object behind
/// - Deletes succeed when the object is already gone
pub struct LocalDirectoryStore {
    root: PathBuf,
    page_size: usize,
}

impl LocalDirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Store under the platform data directory (`<data_dir>/media-drive/objects`).
    pub fn in_data_dir() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("media-drive")
            .join("objects");
        Self::new(root)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let invalid = || StoreError::InvalidKey {
            key: key.to_string(),
        };

        if key.is_empty() || key.contains('\\') || key.contains('\0') {
            return Err(invalid());
        }

        let mut path = self.root.clone();
        for (index, segment) in key.split('/').enumerate() {
            match segment {
                "" | "." | ".." => return Err(invalid()),
                STAGING_DIR if index == 0 => return Err(invalid()),
                _ => path.push(segment),
            }
        }
        Ok(path)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(segments.join("/"))
    }

    /// Every stored object, sorted by key.
    async fn walk(&self) -> StoreResult<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                // Root not created yet: nothing stored
                Err(e) if e.kind() == io::ErrorKind::NotFound && dir == self.root => {
                    return Ok(objects);
                }
                Err(e) => return Err(map_io_error(e)),
            };

            while let Some(entry) = entries.next_entry().await.map_err(map_io_error)? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(map_io_error)?;

                if file_type.is_dir() {
                    if dir == self.root && entry.file_name() == STAGING_DIR {
                        continue;
                    }
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let Some(key) = self.key_for(&path) else {
                    warn!(path = ?path, "Skipping object with non UTF-8 name");
                    continue;
                };
                let metadata = entry.metadata().await.map_err(map_io_error)?;
                let mut summary = ObjectSummary::new(key).with_size(metadata.len());
                if let Ok(modified) = metadata.modified() {
                    summary = summary.with_last_modified(DateTime::<Utc>::from(modified));
                }
                objects.push(summary);
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn write_staged(
        &self,
        staged: &Path,
        mut body: ByteStream,
        on_transfer: &TransferCallback,
    ) -> StoreResult<u64> {
        let mut file = fs::File::create(staged).await.map_err(map_io_error)?;
        let mut transferred = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(map_io_error)?;
            transferred += chunk.len() as u64;
            on_transfer(transferred);
        }

        file.flush().await.map_err(map_io_error)?;
        file.sync_all().await.map_err(map_io_error)?;
        Ok(transferred)
    }

    /// Removes now-empty directories between `path` and the root.
    async fn prune_empty_parents(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

/// Staging file removed on drop unless it was renamed into place.
///
/// Covers errors as well as puts whose future is dropped mid-stream.
struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "Removed abandoned staging file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "Failed to remove staging file"),
        }
    }
}

fn map_io_error(e: io::Error) -> StoreError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => StoreError::PermissionDenied(e.to_string()),
        _ => StoreError::Io(e),
    }
}

#[async_trait]
impl ObjectStore for LocalDirectoryStore {
    async fn list(&self, continuation_token: Option<String>) -> StoreResult<ListPage> {
        let offset = match continuation_token {
            Some(token) => token.parse::<usize>().map_err(|_| StoreError::Rejected {
                status: 400,
                message: format!("Invalid continuation token: {}", token),
            })?,
            None => 0,
        };

        let objects = self.walk().await?;
        let total = objects.len();
        let items: Vec<ObjectSummary> = objects
            .into_iter()
            .skip(offset)
            .take(self.page_size)
            .collect();

        let next = offset + items.len();
        let next_token = (next < total).then(|| next.to_string());

        debug!(offset, items = items.len(), total, "Listed local objects");
        Ok(ListPage { items, next_token })
    }

    async fn put(&self, key: &str, body: ByteStream, on_transfer: TransferCallback) -> StoreResult<()> {
        let target = self.path_for(key)?;
        let staging = self.root.join(STAGING_DIR);
        fs::create_dir_all(&staging).await.map_err(map_io_error)?;

        let staged = StagedFile::new(staging.join(Uuid::new_v4().to_string()));
        let written = self.write_staged(staged.path(), body, &on_transfer).await?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(map_io_error)?;
        }
        fs::rename(staged.path(), &target)
            .await
            .map_err(map_io_error)?;
        staged.commit();

        debug!(key, size = written, "Stored local object");
        Ok(())
    }

    async fn delete_if_exists(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Deleted local object");
                self.prune_empty_parents(&path).await;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(key, "Local object already absent");
                Ok(())
            }
            Err(e) => Err(map_io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::storage::chunked_stream;
    use bytes::Bytes;
    use std::env;
    use std::sync::{Arc, Mutex};

    fn temp_root() -> PathBuf {
        env::temp_dir().join(format!("media-drive-store-{}", Uuid::new_v4()))
    }

    fn ignore_progress() -> TransferCallback {
        Arc::new(|_| {})
    }

    async fn put_str(store: &LocalDirectoryStore, key: &str, data: &'static str) {
        store
            .put(key, chunked_stream(Bytes::from(data), 4), ignore_progress())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_root_lists_empty() {
        let store = LocalDirectoryStore::new(temp_root());
        let page = store.list(None).await.unwrap();

        assert!(page.items.is_empty());
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_put_then_list() {
        let root = temp_root();
        let store = LocalDirectoryStore::new(&root);

        put_str(&store, "vacation/1-photo.png", "pixels").await;
        put_str(&store, "notes.txt", "hi").await;

        let page = store.list(None).await.unwrap();
        let keys: Vec<_> = page.items.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["notes.txt", "vacation/1-photo.png"]);
        assert_eq!(page.items[1].size, Some(6));
        assert!(page.items[1].last_modified.is_some());

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_pagination_tokens() {
        let root = temp_root();
        let store = LocalDirectoryStore::new(&root).with_page_size(2);
        for key in ["a", "b", "c", "d", "e"] {
            put_str(&store, key, "x").await;
        }

        let mut token = None;
        let mut seen = Vec::new();
        loop {
            let page = store.list(token).await.unwrap();
            seen.extend(page.items.into_iter().map(|o| o.key));
            token = page.next_token;
            if token.is_none() {
                break;
            }
        }
        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);

        assert!(matches!(
            store.list(Some("oops".to_string())).await,
            Err(StoreError::Rejected { status: 400, .. })
        ));

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_put_reports_cumulative_bytes() {
        let root = temp_root();
        let store = LocalDirectoryStore::new(&root);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        store
            .put(
                "clip.mp4",
                chunked_stream(Bytes::from(vec![0u8; 10]), 4),
                Arc::new(move |n| sink.lock().unwrap().push(n)),
            )
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![4, 8, 10]);
        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_no_object() {
        let root = temp_root();
        let store = LocalDirectoryStore::new(&root);
        let body: ByteStream = Box::pin(futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"part")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]));

        let err = store
            .put("broken.bin", body, ignore_progress())
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(store.list(None).await.unwrap().items.is_empty());

        let _ = fs::remove_dir_all(&root).await;
    }

    async fn staged_entries(root: &Path) -> usize {
        let Ok(mut entries) = fs::read_dir(root.join(STAGING_DIR)).await else {
            return 0;
        };
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        count
    }

    #[tokio::test]
    async fn test_abandoned_put_leaves_no_staging_file() {
        let root = temp_root();
        let store = LocalDirectoryStore::new(&root);
        let body: ByteStream = Box::pin(
            futures_util::stream::iter(vec![Ok(Bytes::from_static(b"first chunk"))])
                .chain(futures_util::stream::pending()),
        );

        let stalled = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            store.put("stalled.bin", body, ignore_progress()),
        )
        .await;

        assert!(stalled.is_err());
        assert_eq!(staged_entries(&root).await, 0);
        assert!(store.list(None).await.unwrap().items.is_empty());

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_failed_and_successful_puts_clean_staging() {
        let root = temp_root();
        let store = LocalDirectoryStore::new(&root);
        put_str(&store, "kept.txt", "kept").await;

        let body: ByteStream = Box::pin(futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"part")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]));
        assert!(store.put("broken.bin", body, ignore_progress()).await.is_err());

        assert_eq!(staged_entries(&root).await, 0);
        assert!(root.join("kept.txt").exists());

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let root = temp_root();
        let store = LocalDirectoryStore::new(&root);
        put_str(&store, "docs/2024/report.pdf", "pdf").await;

        store.delete_if_exists("docs/2024/report.pdf").await.unwrap();
        store.delete_if_exists("docs/2024/report.pdf").await.unwrap();
        store.delete_if_exists("never-existed.txt").await.unwrap();

        assert!(store.list(None).await.unwrap().items.is_empty());
        assert!(!root.join("docs").exists());

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_invalid_keys_rejected() {
        let store = LocalDirectoryStore::new(temp_root());

        for key in ["", "/abs", "a//b", "../escape", "a/./b", "dir\\file", ".staging/x"] {
            assert!(
                matches!(
                    store.delete_if_exists(key).await,
                    Err(StoreError::InvalidKey { .. })
                ),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
