//! Remote Playlist Store Abstraction
//!
//! Models and trait for the remote service that owns playlists, their tracks
//! and their cover images. The synchronization core only ever talks to the
//! store through [`PlaylistStore`]; concrete connectors live in provider crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum number of track URIs accepted by a single add-tracks request
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// The account the store's credentials belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
}

/// Playlist visibility on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A playlist cover image reference
///
/// Covers uploaded through the API are reported without intrinsic
/// dimensions, while covers the store generates or the user picks carry a
/// width and height. That difference is what marks a cover as synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CoverImage {
    /// `true` when the store reports no width and no height for this image
    pub fn is_dimensionless(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// Remote playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub cover: Option<CoverImage>,
    pub external_url: String,
}

/// Remote track as listed in a playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Store identifier; local files added to a playlist have none
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    pub duration_ms: u64,
    /// Year of the album release, when the store reports a parseable date
    pub release_year: Option<i32>,
    pub artist_ids: Vec<String>,
}

/// Remote artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

/// Remote playlist store
///
/// All list operations return every page; implementations follow the
/// store's pagination internally.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::playlist::PlaylistStore;
///
/// async fn count_tracks(store: &dyn PlaylistStore, id: &str) -> Result<usize> {
///     Ok(store.get_tracks(id).await?.len())
/// }
/// ```
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Fetch the account the credentials belong to
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NoAccess` when the account is not allowed to use
    /// the application, distinct from other failures.
    async fn current_user(&self) -> Result<User>;

    /// Create an empty playlist owned by the current user
    async fn create_playlist(
        &self,
        name: &str,
        visibility: Visibility,
        description: &str,
    ) -> Result<Playlist>;

    /// Fetch a single playlist
    async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist>;

    /// List every playlist the current user follows
    async fn list_playlists(&self) -> Result<Vec<Playlist>>;

    /// List every track of a playlist in playlist order
    async fn get_tracks(&self, playlist_id: &str) -> Result<Vec<Track>>;

    /// Append tracks, chunked at [`MAX_TRACKS_PER_REQUEST`]
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    /// Replace the whole track list
    async fn replace_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    /// Upload a cover image given as base64-encoded JPEG bytes
    async fn set_cover_image(&self, playlist_id: &str, jpeg_base64: &str) -> Result<()>;

    /// Fetch the current cover image reference, if the playlist has one
    async fn get_cover_image(&self, playlist_id: &str) -> Result<Option<CoverImage>>;

    /// Resolve artists by identifier
    async fn get_artists(&self, artist_ids: &[String]) -> Result<Vec<Artist>>;

    /// Remove the playlist from the current user's library
    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()>;
}
