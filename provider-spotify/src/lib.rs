//! # Spotify Provider
//!
//! Implements `PlaylistStore` for the Spotify Web API.
//!
//! ## Overview
//!
//! This module provides:
//! - Playlist, track and artist reads with pagination
//! - Chunked track writes and base64 JPEG cover uploads
//! - An LRU request cache that is emptied by every write

pub mod cache;
pub mod connector;
pub mod error;
pub mod types;

pub use cache::CachedHttpClient;
pub use connector::{SpotifyConnector, SPOTIFY_API_BASE};
pub use error::{Result, SpotifyError};
