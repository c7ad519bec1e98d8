//! # Host Bridge Traits
//!
//! Abstraction traits that separate the synchronization core from the
//! environment it runs in.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the concrete
//! adapters that talk to the outside world. Each trait represents a capability
//! the core requires but does not implement itself: moving bytes over HTTP,
//! waiting between retries, and reading or writing the remote playlist store.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//!
//! ### Remote Store
//! - [`PlaylistStore`](playlist::PlaylistStore) - Playlists, tracks, cover images and artists
//!
//! ### Utilities
//! - [`Sleeper`](time::Sleeper) - Injectable delay used by retry loops
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Adapters
//!
//! | Capability     | Implementation                          |
//! |----------------|-----------------------------------------|
//! | `HttpClient`   | `bridge-desktop::ReqwestHttpClient`     |
//! | `Sleeper`      | `bridge-desktop::TokioSleeper`          |
//! | `PlaylistStore`| `provider-spotify::SpotifyConnector`    |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Implementations should:
//!
//! - Convert adapter-specific errors to `BridgeError`
//! - Keep the HTTP status of failed remote calls (`BridgeError::Status`)
//! - Report permission failures as `BridgeError::NoAccess`
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so they can be shared across
//! async tasks behind an `Arc`.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod playlist;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use playlist::{Artist, CoverImage, Playlist, PlaylistStore, Track, User, Visibility};
pub use time::{LogEntry, LogLevel, LoggerSink, Sleeper};
