//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `Sleeper` using the Tokio timer
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioSleeper};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = Arc::new(ReqwestHttpClient::new());
//!     let sleeper = Arc::new(TokioSleeper);
//!
//!     // Use in core configuration
//! }
//! ```

mod http;
mod time;

pub use http::ReqwestHttpClient;
pub use time::TokioSleeper;
