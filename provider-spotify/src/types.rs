//! Spotify Web API response types
//!
//! Data structures for (de)serializing the subset of the Web API the
//! connector uses, and their conversion into bridge models.

use bridge_traits::playlist::{Artist, CoverImage, Playlist, Track, User};
use serde::{Deserialize, Serialize};

/// Paging object wrapping list endpoints
///
/// See: https://developer.spotify.com/documentation/web-api/concepts/api-calls#paging
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,

    /// Absolute URL of the next page
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserObject {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl From<UserObject> for User {
    fn from(user: UserObject) -> Self {
        User {
            id: user.id,
            display_name: user.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageObject {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl From<ImageObject> for CoverImage {
    fn from(image: ImageObject) -> Self {
        CoverImage {
            url: image.url,
            width: image.width,
            height: image.height,
        }
    }
}

/// The cover of a playlist is the last entry of its images array
pub fn cover_of(images: Option<Vec<ImageObject>>) -> Option<CoverImage> {
    images?.pop().map(CoverImage::from)
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` for playlists without any image
    #[serde(default)]
    pub images: Option<Vec<ImageObject>>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl From<PlaylistObject> for Playlist {
    fn from(playlist: PlaylistObject) -> Self {
        Playlist {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description.unwrap_or_default(),
            cover: cover_of(playlist.images),
            external_url: playlist.external_urls.spotify.unwrap_or_default(),
        }
    }
}

/// Entry of a playlist's track list
#[derive(Debug, Deserialize)]
pub struct PlaylistTrackObject {
    /// `null` when the item is no longer available
    #[serde(default)]
    pub track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct TrackObject {
    /// `null` for local files
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub album: Option<AlbumObject>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtistObject>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumObject {
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimplifiedArtistObject {
    #[serde(default)]
    pub id: Option<String>,
}

fn release_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

impl From<TrackObject> for Track {
    fn from(track: TrackObject) -> Self {
        Track {
            id: track.id,
            uri: track.uri,
            name: track.name,
            duration_ms: track.duration_ms,
            release_year: track
                .album
                .and_then(|album| album.release_date)
                .and_then(|date| release_year(&date)),
            artist_ids: track.artists.into_iter().filter_map(|a| a.id).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    pub id: String,
    pub name: String,
}

impl From<ArtistObject> for Artist {
    fn from(artist: ArtistObject) -> Self {
        Artist {
            id: artist.id,
            name: artist.name,
        }
    }
}

/// Response of the several-artists endpoint; unknown ids come back as `null`
#[derive(Debug, Deserialize)]
pub struct ArtistsResponse {
    pub artists: Vec<Option<ArtistObject>>,
}

#[derive(Debug, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub public: bool,
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct TrackUrisRequest<'a> {
    pub uris: &'a [String],
}
