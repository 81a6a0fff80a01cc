//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the catalog, sync and
//! service crates:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus for catalog, sync and transfer notifications
//!
//! ## Overview
//!
//! Nothing here owns the catalog itself. This crate establishes the logging
//! conventions, the builder that gathers injected collaborators, and the
//! broadcast channel every other crate reports state changes through.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CatalogEvent, CoreEvent, EventBus, EventStream, SyncEvent, TransferEvent};
