//! # Synchronization Module
//!
//! Keeps virtual playlists in sync with the playlists they are defined over.
//!
//! ## Overview
//!
//! A managed playlist's definition lives in its own cover image, so there is
//! no database. This crate:
//! - Encodes and decodes definitions (`definition`)
//! - Computes the target track list with set algebra (`resolver`)
//! - Retries cover uploads and polls for their visibility (`retry`)
//! - Drives create, discovery and re-synchronization against a
//!   `PlaylistStore` (`orchestrator`)
//!
//! ## Components
//!
//! - **Definition** (`definition`): rule set plus its compact JSON encoding
//! - **Resolver** (`resolver`): pure include / exclude / require pipeline
//! - **Retry** (`retry`): fixed-delay retry and bounded polling over a `Sleeper`
//! - **State** (`state`): `ManagedPlaylist` and `SyncState`
//! - **Orchestrator** (`orchestrator`): `SyncOrchestrator`

pub mod definition;
pub mod error;
pub mod orchestrator;
pub mod resolver;
pub mod retry;
pub mod state;

pub use definition::{decode, encode, Definition, RangeLimits};
pub use error::{DefinitionError, Result, SyncError};
pub use orchestrator::{CreateRequest, SyncConfig, SyncOrchestrator, UpdateRequest};
pub use resolver::{resolve, Filters};
pub use retry::RetryPolicy;
pub use state::{ManagedPlaylist, SyncState};
