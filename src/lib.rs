//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service` with the `local-store` adapter).
//! Host applications can depend on `media-drive-workspace` and enable the
//! documented features without needing to wire each crate individually.

#[cfg(feature = "local-store")]
pub use core_service;
