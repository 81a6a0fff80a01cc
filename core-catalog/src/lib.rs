//! # Core Catalog
//!
//! In-memory catalog of the objects held by the remote store.
//!
//! ## Components
//!
//! - [`store::CatalogStore`] - the live index, written only by the sync and
//!   transfer coordinators
//! - [`classifier`] - pure key to [`Category`] mapping
//! - [`query`] - filtering, sorting and sectioning of snapshots
//!
//! Readers work on [`CatalogSnapshot`] values, which never change after they
//! are handed out.

pub mod classifier;
pub mod error;
pub mod models;
pub mod query;
pub mod store;

pub use classifier::{classify, icon_for};
pub use error::{CatalogError, Result};
pub use models::{CatalogSnapshot, Category, ObjectRecord};
pub use query::{
    categorize, filter, format_size, list_categorized, sort, CategorizedView, SortDirection,
    SortKey, SortOrder,
};
pub use store::{CatalogStore, ReplaceSummary};
