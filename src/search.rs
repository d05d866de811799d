//! Catalog search interface shared by the match strategies.
//!
//! The [`CatalogSearch`] trait is the seam between the decision logic in
//! [`crate::matcher`] and a concrete backend such as
//! [`crate::musicbrainz::MusicBrainzSearch`].

use crate::error::Result;

/// One recording returned by a catalog search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMatch {
    /// Canonical recording identifier (MBID for MusicBrainz)
    pub recording_id: String,
    pub title: String,
    /// Full artist-credit display string, join phrases included
    pub artist_credit: String,
    /// Backend confidence, higher is better.  Not comparable across backends.
    pub score: u32,
    /// Title of the first release carrying the recording (may be empty)
    pub release: String,
}

impl CandidateMatch {
    /// Case-insensitive substring check of `expected` against the artist credit.
    /// An empty expectation never matches.
    pub fn artist_matches(&self, expected: &str) -> bool {
        let expected = expected.trim().to_lowercase();
        !expected.is_empty() && self.artist_credit.to_lowercase().contains(&expected)
    }
}

/// Structured query fields.  Empty strings are treated like absent fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchQuery<'a> {
    pub artist: Option<&'a str>,
    pub recording: Option<&'a str>,
    pub release: Option<&'a str>,
}

impl<'a> SearchQuery<'a> {
    pub fn artist_recording(artist: &'a str, recording: &'a str) -> Self {
        SearchQuery {
            artist: Some(artist),
            recording: Some(recording),
            release: None,
        }
    }

    pub fn recording_release(recording: &'a str, release: &'a str) -> Self {
        SearchQuery {
            artist: None,
            recording: Some(recording),
            release: Some(release),
        }
    }

    pub fn recording(recording: &'a str) -> Self {
        SearchQuery {
            artist: None,
            recording: Some(recording),
            release: None,
        }
    }

    /// Non-empty fields as `(field, value)` pairs in artist, recording, release order.
    pub fn fields(&self) -> Vec<(&'static str, &'a str)> {
        [
            ("artist", self.artist),
            ("recording", self.recording),
            ("release", self.release),
        ]
        .into_iter()
        .filter_map(|(field, value)| match value {
            Some(v) if !v.trim().is_empty() => Some((field, v)),
            _ => None,
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// A backend that can search the recording catalog.
pub trait CatalogSearch {
    /// Short display name, e.g. "MusicBrainz".
    fn name(&self) -> &str;

    /// Return up to `limit` candidates, best first.
    ///
    /// An empty query returns `Ok(vec![])` without contacting the backend.
    /// Implementations downgrade transport and HTTP status failures to an
    /// empty list; an `Err` means something unexpected happened and the
    /// listen being processed should be reported as failed.
    fn search(&mut self, query: &SearchQuery<'_>, limit: u32) -> Result<Vec<CandidateMatch>>;
}
