//! MusicBrainz recording search.
//!
//! Builds a Lucene query from the structured fields, escapes user text, and
//! flattens the recording search response into [`CandidateMatch`] values.
//! Requests go through the client's own [`RateLimiter`] (MusicBrainz allows one
//! request per second).

use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{MapperError, Result};
use crate::rate_limiter::RateLimiter;
use crate::search::{CandidateMatch, CatalogSearch, SearchQuery};

pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";

const USER_AGENT: &str = concat!("lbmapper/", env!("CARGO_PKG_VERSION"));

/// Characters with meaning in the Lucene query syntax.
const LUCENE_SPECIAL: &str = "+-&|!(){}[]^\"~*?:\\/";

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RecordingSearchResponse {
    #[serde(default)]
    recordings: Vec<ApiRecording>,
}

#[derive(Debug, Deserialize)]
struct ApiRecording {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: u32,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ApiArtistCredit>,
    #[serde(default)]
    releases: Vec<ApiRelease>,
}

#[derive(Debug, Deserialize)]
struct ApiArtistCredit {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    joinphrase: String,
    #[serde(default)]
    artist: Option<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    #[serde(default)]
    title: String,
}

// ── Query building ───────────────────────────────────────────────────────────

/// Backslash-escape every Lucene special character in `value`.
pub fn escape_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if LUCENE_SPECIAL.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `artist:"…" AND recording:"…" AND release:"…"` for the non-empty fields,
/// or `None` when there is nothing to search for.
pub fn build_query(query: &SearchQuery<'_>) -> Option<String> {
    let parts: Vec<String> = query
        .fields()
        .into_iter()
        .map(|(field, value)| format!("{}:\"{}\"", field, escape_query_value(value)))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" AND "))
    }
}

fn artist_credit_string(credits: &[ApiArtistCredit]) -> String {
    let mut out = String::new();
    for credit in credits {
        let name = match credit.name.as_deref() {
            Some(n) if !n.is_empty() => n,
            _ => credit.artist.as_ref().map(|a| a.name.as_str()).unwrap_or(""),
        };
        out.push_str(name);
        out.push_str(&credit.joinphrase);
    }
    out.trim().to_string()
}

fn candidates_from(response: RecordingSearchResponse) -> Vec<CandidateMatch> {
    response
        .recordings
        .into_iter()
        .map(|rec| CandidateMatch {
            artist_credit: artist_credit_string(&rec.artist_credit),
            release: rec
                .releases
                .into_iter()
                .next()
                .map(|r| r.title)
                .unwrap_or_default(),
            recording_id: rec.id,
            title: rec.title,
            score: rec.score,
        })
        .collect()
}

/// Parse a raw `/recording` search response body.
pub fn parse_recordings(json: &str) -> Result<Vec<CandidateMatch>> {
    let response: RecordingSearchResponse = serde_json::from_str(json)?;
    Ok(candidates_from(response))
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct MusicBrainzSearch {
    agent: ureq::Agent,
    base_url: String,
    limiter: RateLimiter,
}

impl MusicBrainzSearch {
    pub fn new(base_url: &str, timeout: Duration, limiter: RateLimiter) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        MusicBrainzSearch {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.musicbrainz_url(),
            config.timeout(),
            RateLimiter::from_millis("MusicBrainz", config.min_request_interval_ms()),
        )
    }
}

impl CatalogSearch for MusicBrainzSearch {
    fn name(&self) -> &str {
        "MusicBrainz"
    }

    fn search(&mut self, query: &SearchQuery<'_>, limit: u32) -> Result<Vec<CandidateMatch>> {
        let lucene = match build_query(query) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };

        self.limiter.wait_if_needed();
        debug!("MusicBrainz query: {} (limit {})", lucene, limit);

        let url = format!("{}/recording", self.base_url);
        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .query("query", &lucene)
            .query("limit", &limit.to_string())
            .query("fmt", "json")
            .call();

        match response {
            Ok(resp) => {
                self.limiter.report_success();
                let body: RecordingSearchResponse = resp
                    .into_json()
                    .map_err(|e| MapperError::Parse(format!("MusicBrainz response: {e}")))?;
                let candidates = candidates_from(body);
                debug!("MusicBrainz returned {} candidate(s)", candidates.len());
                Ok(candidates)
            }
            Err(ureq::Error::Status(code, _)) => {
                if code == 429 || code == 503 {
                    self.limiter.report_failure();
                }
                warn!("MusicBrainz search failed with status {}: {}", code, lucene);
                Ok(Vec::new())
            }
            Err(ureq::Error::Transport(t)) => {
                warn!("MusicBrainz search failed: {}", t);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("AC/DC"), "AC\\/DC");
        assert_eq!(escape_query_value("What?"), "What\\?");
        assert_eq!(escape_query_value("a+b-c"), "a\\+b\\-c");
        assert_eq!(escape_query_value("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_query_value("back\\slash"), "back\\\\slash");
        assert_eq!(escape_query_value("初音ミク"), "初音ミク");
    }

    #[test]
    fn test_build_query_joins_present_fields() {
        let q = SearchQuery::artist_recording("Foo", "Bar (Live)");
        assert_eq!(
            build_query(&q).as_deref(),
            Some("artist:\"Foo\" AND recording:\"Bar \\(Live\\)\"")
        );

        let q = SearchQuery::recording_release("Song", "Album");
        assert_eq!(
            build_query(&q).as_deref(),
            Some("recording:\"Song\" AND release:\"Album\"")
        );
    }

    #[test]
    fn test_empty_query_builds_nothing() {
        assert_eq!(build_query(&SearchQuery::default()), None);
        assert_eq!(build_query(&SearchQuery::artist_recording("", "")), None);
    }

    #[test]
    fn test_empty_query_does_not_call_backend() {
        // Unroutable base URL: any request attempt would surface as a warning
        // and an empty list, but an empty query must return before that.
        let mut mb = MusicBrainzSearch::new(
            "http://127.0.0.1:9",
            Duration::from_millis(10),
            RateLimiter::with_clock("test", 1000, Box::new(crate::testing::FakeClock::new())),
        );
        let results = mb.search(&SearchQuery::default(), 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_recordings() {
        let json = r#"{
            "created": "2024-01-01T00:00:00.000Z",
            "count": 2,
            "recordings": [
                {
                    "id": "11111111-1111-1111-1111-111111111111",
                    "score": 100,
                    "title": "World is Mine",
                    "artist-credit": [
                        {"name": "ryo", "joinphrase": " feat. ", "artist": {"id": "a", "name": "ryo"}},
                        {"name": "初音ミク", "artist": {"id": "b", "name": "初音ミク"}}
                    ],
                    "releases": [{"id": "r1", "title": "supercell"}, {"id": "r2", "title": "Other"}]
                },
                {
                    "id": "22222222-2222-2222-2222-222222222222",
                    "score": 64,
                    "title": "World is Mine",
                    "artist-credit": [{"artist": {"id": "c", "name": "Cover Band"}}]
                }
            ]
        }"#;

        let candidates = parse_recordings(json).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].recording_id, "11111111-1111-1111-1111-111111111111");
        assert_eq!(candidates[0].artist_credit, "ryo feat. 初音ミク");
        assert_eq!(candidates[0].release, "supercell");
        assert_eq!(candidates[0].score, 100);
        assert_eq!(candidates[1].artist_credit, "Cover Band");
        assert_eq!(candidates[1].release, "");
    }

    #[test]
    fn test_parse_recordings_without_results() {
        assert!(parse_recordings(r#"{"count": 0}"#).unwrap().is_empty());
        assert!(parse_recordings("not json").is_err());
    }
}
