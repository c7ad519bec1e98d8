//! # Track Set Resolver
//!
//! Pure set algebra computing the tracks a synchronized playlist should hold.
//!
//! ## Pipeline
//!
//! 1. Deduplicate included tracks by URI, keeping the first occurrence
//! 2. Keep tracks whose duration lies inside the duration limits
//! 3. Keep tracks whose release year lies inside the year limits
//! 4. Keep tracks by a required artist, if any artists are required
//! 5. Drop tracks whose URI appears in the excluded set
//! 6. Keep only URIs in the required set, if that set is non-empty
//!
//! All bounds are inclusive. The output is deterministic for fixed inputs and
//! preserves the relative order of the included tracks.

use std::collections::HashSet;
use std::ops::RangeBounds;

use bridge_traits::playlist::Track;

use crate::definition::{Definition, RangeLimits};

/// Track-level filters of a definition with absent filters made unbounded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Duration bounds in milliseconds
    pub duration: RangeLimits<u64>,
    pub release_year: RangeLimits<i32>,
    pub required_artists: HashSet<String>,
}

impl Filters {
    pub fn matches(&self, track: &Track) -> bool {
        self.duration.contains(&track.duration_ms)
            && self.matches_year(track.release_year)
            && self.matches_artists(&track.artist_ids)
    }

    fn matches_year(&self, year: Option<i32>) -> bool {
        match year {
            Some(year) => self.release_year.contains(&year),
            // Unknown years only pass an unbounded filter
            None => self.release_year.is_unbounded(),
        }
    }

    fn matches_artists(&self, artist_ids: &[String]) -> bool {
        self.required_artists.is_empty()
            || artist_ids.iter().any(|id| self.required_artists.contains(id))
    }
}

impl From<&Definition> for Filters {
    fn from(definition: &Definition) -> Self {
        Self {
            duration: definition.duration_limits.unwrap_or_default(),
            release_year: definition.release_year_limits.unwrap_or_default(),
            required_artists: definition.required_artists.iter().cloned().collect(),
        }
    }
}

/// Compute the resolved track list
///
/// # Example
///
/// ```ignore
/// let tracks = resolve(included, &excluded, &[], &Filters::default());
/// ```
pub fn resolve(
    included: Vec<Track>,
    excluded: &[Track],
    required: &[Track],
    filters: &Filters,
) -> Vec<Track> {
    let excluded: HashSet<&str> = excluded.iter().map(|t| t.uri.as_str()).collect();
    let required: HashSet<&str> = required.iter().map(|t| t.uri.as_str()).collect();
    let mut seen = HashSet::new();

    included
        .into_iter()
        .filter(|track| seen.insert(track.uri.clone()))
        .filter(|track| filters.matches(track))
        .filter(|track| !excluded.contains(track.uri.as_str()))
        .filter(|track| required.is_empty() || required.contains(track.uri.as_str()))
        .collect()
}
