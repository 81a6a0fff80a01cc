//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `ObjectStore` using a local directory tree and `tokio::fs`
//!
//! The local store lets the core run end-to-end without a cloud account,
//! and doubles as a fixture for integration tests.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::LocalDirectoryStore;
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let store = LocalDirectoryStore::in_data_dir();
//! let config = CoreConfig::builder()
//!     .object_store(Arc::new(store))
//!     .build()?;
//! ```

mod object_store;

pub use object_store::{LocalDirectoryStore, DEFAULT_PAGE_SIZE};
