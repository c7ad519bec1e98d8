//! # Cover Image Module
//!
//! Reads and writes metadata carried inside playlist cover JPEGs.
//!
//! ## Overview
//!
//! A synchronized playlist stores its definition inside its own cover image,
//! in the JPEG comment segment. This crate owns everything that touches those
//! bytes:
//! - **Marker codec** (`marker`): locate, read, write and replace the comment
//!   segment without altering any other part of the container
//! - **Transport** (`transport`): fetch remote cover bytes and convert them to
//!   the base64 form the upload endpoint expects
//! - **Generation** (`generate`): synthesize plain JPEG covers for new playlists
//!
//! The codec never decodes pixels. It walks the raw marker stream only.
//!
//! ## Usage
//!
//! ```ignore
//! use core_cover::{generate, marker, transport};
//!
//! let cover = generate::single_color_jpeg(300, 300, [0, 0, 0])?;
//! let with_comment = marker::embed_comment(&cover, br#"{"included_playlist_ids":[]}"#)?;
//! let payload = transport::to_upload_payload(&with_comment);
//! assert_eq!(marker::extract_comment(&with_comment)?, r#"{"included_playlist_ids":[]}"#);
//! ```

pub mod error;
pub mod generate;
pub mod marker;
pub mod transport;

pub use error::{ContainerError, GenerateError, Result, TransportError};
pub use marker::{embed_comment, extract_comment};
pub use transport::{fetch_bytes, to_upload_payload};
