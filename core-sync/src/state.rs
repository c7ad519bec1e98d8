//! # Managed Playlist State
//!
//! A managed playlist is a remote playlist whose cover carries a decodable
//! definition, together with everything recovered from that definition.
//!
//! ```text
//! Idle ──synchronize──> Synchronizing ──cover visible──> Idle
//!                             │
//!                             └──cover not visible──> Unconverged
//! ```

use bridge_traits::playlist::{Artist, Playlist};
use serde::{Deserialize, Serialize};

use crate::definition::{Definition, RangeLimits};
use crate::resolver::Filters;

/// Synchronization state of a managed playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Tracks and cover are in place
    #[default]
    Idle,
    /// An operation is pushing tracks or a cover
    Synchronizing,
    /// Tracks were pushed but the uploaded cover did not become visible in
    /// time; the playlist is returned without a cover
    Unconverged,
}

impl SyncState {
    pub fn is_converged(&self) -> bool {
        matches!(self, SyncState::Idle)
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Synchronizing => write!(f, "synchronizing"),
            SyncState::Unconverged => write!(f, "unconverged"),
        }
    }
}

/// A playlist kept in sync with its sources
///
/// Built fresh from the remote store on every discovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedPlaylist {
    pub playlist: Playlist,
    pub included: Vec<Playlist>,
    pub excluded: Vec<Playlist>,
    pub required: Vec<Playlist>,
    pub required_artists: Vec<Artist>,
    pub duration_limits: RangeLimits<u64>,
    pub release_year_limits: RangeLimits<i32>,
    pub state: SyncState,
}

impl ManagedPlaylist {
    /// The definition this playlist was built from
    pub fn definition(&self) -> Definition {
        build_definition(
            &self.included,
            &self.excluded,
            &self.required,
            &self.required_artists,
            self.duration_limits,
            self.release_year_limits,
        )
    }

    pub fn filters(&self) -> Filters {
        Filters::from(&self.definition())
    }
}

/// Both range filters are written out so the cover always carries them;
/// the release-year filter only once it is bounded.
pub(crate) fn build_definition(
    included: &[Playlist],
    excluded: &[Playlist],
    required: &[Playlist],
    required_artists: &[Artist],
    duration_limits: RangeLimits<u64>,
    release_year_limits: RangeLimits<i32>,
) -> Definition {
    let mut definition = Definition::new(ids(included), ids(excluded), ids(required))
        .with_duration_limits(duration_limits);

    if !release_year_limits.is_unbounded() {
        definition = definition.with_release_year_limits(release_year_limits);
    }
    definition.with_required_artists(required_artists.iter().map(|a| a.id.clone()))
}

fn ids(playlists: &[Playlist]) -> Vec<String> {
    playlists.iter().map(|p| p.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(id: &str) -> Playlist {
        Playlist {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            cover: None,
            external_url: format!("https://open.spotify.com/playlist/{id}"),
        }
    }

    #[test]
    fn test_definition_round_trip() {
        let managed = ManagedPlaylist {
            playlist: playlist("target"),
            included: vec![playlist("a"), playlist("b")],
            excluded: vec![playlist("c")],
            required: vec![],
            required_artists: vec![Artist {
                id: "artist1".to_string(),
                name: "Artist".to_string(),
            }],
            duration_limits: RangeLimits::new(Some(60_000), None),
            release_year_limits: RangeLimits::unbounded(),
            state: SyncState::Idle,
        };

        let definition = managed.definition();
        assert_eq!(definition.included, vec!["a", "b"]);
        assert_eq!(definition.excluded, vec!["c"]);
        assert_eq!(
            definition.duration_limits,
            Some(RangeLimits::new(Some(60_000), None))
        );
        assert_eq!(definition.release_year_limits, None);
        assert_eq!(definition.required_artists, vec!["artist1"]);

        let filters = managed.filters();
        assert_eq!(filters.duration.min, Some(60_000));
        assert!(filters.required_artists.contains("artist1"));
    }

    #[test]
    fn test_sync_state() {
        assert!(SyncState::default().is_converged());
        assert!(!SyncState::Unconverged.is_converged());
        assert_eq!(SyncState::Synchronizing.to_string(), "synchronizing");
        assert_eq!(
            serde_json::to_string(&SyncState::Unconverged).unwrap(),
            "\"unconverged\""
        );
    }
}
