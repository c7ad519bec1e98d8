//! # Playlist Definition
//!
//! The rule set of a synchronized playlist and its JSON encoding.
//!
//! ## Wire Format
//!
//! The definition travels inside the playlist's cover comment as compact JSON.
//! Payloads written by earlier releases look like:
//!
//! ```json
//! {"included_playlist_ids":["a"],"excluded_playlist_ids":[],"required_playlist_ids":[],"duration_limits":{"min":0,"max":null}}
//! ```
//!
//! The three id lists are mandatory. Range filters are written with both
//! bounds, `null` meaning unbounded, and only when present. The artist filter
//! is written only when non-empty. Unknown keys are ignored on decode.

use std::ops::{Bound, RangeBounds};

use core_cover::marker::MAX_SEGMENT_PAYLOAD;
use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;

/// Inclusive range with optional bounds
///
/// `None` on either side means unbounded on that side, and serializes as
/// `null`.
///
/// ```
/// use core_sync::RangeLimits;
/// use std::ops::RangeBounds;
///
/// let limits = RangeLimits::new(Some(60_000u64), None);
/// assert!(limits.contains(&60_000));
/// assert!(limits.contains(&u64::MAX));
/// assert!(!limits.contains(&59_999));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeLimits<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> RangeLimits<T> {
    pub const fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl<T> Default for RangeLimits<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> RangeBounds<T> for RangeLimits<T> {
    fn start_bound(&self) -> Bound<&T> {
        match &self.min {
            Some(min) => Bound::Included(min),
            None => Bound::Unbounded,
        }
    }

    fn end_bound(&self) -> Bound<&T> {
        match &self.max {
            Some(max) => Bound::Included(max),
            None => Bound::Unbounded,
        }
    }
}

/// Rule set of a synchronized playlist
///
/// Ids are kept in the order the user picked them; duplicates are dropped by
/// [`Definition::new`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Definition {
    /// Playlists whose tracks make up the candidate set
    #[serde(rename = "included_playlist_ids")]
    pub included: Vec<String>,

    /// Playlists whose tracks are removed from the result
    #[serde(rename = "excluded_playlist_ids")]
    pub excluded: Vec<String>,

    /// When non-empty, only tracks present in one of these playlists survive
    #[serde(rename = "required_playlist_ids")]
    pub required: Vec<String>,

    /// Track duration bounds in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_limits: Option<RangeLimits<u64>>,

    /// Album release year bounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year_limits: Option<RangeLimits<i32>>,

    /// When non-empty, tracks need at least one of these artists
    #[serde(
        rename = "required_artist_ids",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required_artists: Vec<String>,
}

impl Definition {
    pub fn new(
        included: impl IntoIterator<Item = String>,
        excluded: impl IntoIterator<Item = String>,
        required: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            included: unique(included),
            excluded: unique(excluded),
            required: unique(required),
            ..Self::default()
        }
    }

    pub fn with_duration_limits(mut self, limits: RangeLimits<u64>) -> Self {
        self.duration_limits = Some(limits);
        self
    }

    pub fn with_release_year_limits(mut self, limits: RangeLimits<i32>) -> Self {
        self.release_year_limits = Some(limits);
        self
    }

    pub fn with_required_artists(mut self, artists: impl IntoIterator<Item = String>) -> Self {
        self.required_artists = unique(artists);
        self
    }

    /// Every playlist id the definition reads from, without duplicates
    pub fn source_playlist_ids(&self) -> Vec<String> {
        unique(
            self.included
                .iter()
                .chain(&self.excluded)
                .chain(&self.required)
                .cloned(),
        )
    }
}

fn unique(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Encode a definition as compact JSON
///
/// # Errors
///
/// Returns `TooLarge` when the encoding would not fit a single comment
/// segment.
pub fn encode(definition: &Definition) -> Result<Vec<u8>, DefinitionError> {
    let bytes = serde_json::to_vec(definition)?;
    if bytes.len() > MAX_SEGMENT_PAYLOAD {
        return Err(DefinitionError::TooLarge {
            len: bytes.len(),
            max: MAX_SEGMENT_PAYLOAD,
        });
    }
    Ok(bytes)
}

/// Decode a definition
///
/// # Errors
///
/// Returns `Malformed` when the input is not JSON, or when any of the three
/// id lists is missing or not an array of strings.
pub fn decode(bytes: &[u8]) -> Result<Definition, DefinitionError> {
    Ok(serde_json::from_slice(bytes)?)
}
