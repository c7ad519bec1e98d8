//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on
//! `synchronized-playlists-workspace` and enable `desktop-shims` to get the
//! [`SyncService`] façade with the reqwest client and tokio sleeper wired in.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, Result, SyncService};
