//! ListenBrainz Labs recording search (free-text, typo tolerant).
//!
//! A secondary backend used by the batch tool.  It takes a single query string
//! rather than fielded Lucene, and every failure collapses to "no results".

use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::rate_limiter::RateLimiter;
use crate::translate::contains_non_latin_script;

pub const DEFAULT_BASE_URL: &str = "https://labs.api.listenbrainz.org";

/// The backend errors out on very long queries.
const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabsRecording {
    #[serde(default)]
    pub recording_mbid: String,
    #[serde(default)]
    pub recording_name: String,
    #[serde(default)]
    pub release_name: String,
    #[serde(default)]
    pub release_mbid: String,
    #[serde(default)]
    pub artist_credit_name: String,
    #[serde(default)]
    pub artist_credit_id: i64,
}

/// `"<artist> <recording>"`, trimmed, cut back to a word boundary if too long.
/// `None` when there is nothing to search for.
pub fn build_query(artist: &str, recording: &str) -> Option<String> {
    let query = format!("{} {}", artist, recording).trim().to_string();
    if query.is_empty() {
        return None;
    }
    if query.chars().count() <= MAX_QUERY_CHARS {
        return Some(query);
    }
    let head: String = query.chars().take(MAX_QUERY_CHARS).collect();
    let cut = match head.rfind(' ') {
        Some(idx) => head[..idx].to_string(),
        None => head,
    };
    Some(cut)
}

pub trait RecordingSearch {
    /// Matches for a free-text artist + recording query; empty on any failure.
    fn search_recording(&mut self, artist: &str, recording: &str) -> Vec<LabsRecording>;
}

pub struct LabsClient {
    agent: ureq::Agent,
    base_url: String,
    limiter: RateLimiter,
}

impl LabsClient {
    pub fn new(base_url: &str, timeout: Duration, limiter: RateLimiter) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("lbmapper/", env!("CARGO_PKG_VERSION")))
            .build();
        LabsClient {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.labs_url(),
            config.timeout(),
            RateLimiter::from_millis("Labs", config.min_request_interval_ms()),
        )
    }
}

impl RecordingSearch for LabsClient {
    fn search_recording(&mut self, artist: &str, recording: &str) -> Vec<LabsRecording> {
        let query = match build_query(artist, recording) {
            Some(q) => q,
            None => return Vec::new(),
        };

        self.limiter.wait_if_needed();
        let url = format!("{}/recording-search/json", self.base_url);
        let response = self
            .agent
            .post(&url)
            .set("Accept", "application/json")
            .send_json(serde_json::json!([{ "query": query }]));

        let preview: String = query.chars().take(80).collect();
        match response {
            Ok(resp) => {
                self.limiter.report_success();
                match resp.into_json::<Vec<LabsRecording>>() {
                    Ok(results) => {
                        debug!("Labs query {:?}: {} result(s)", preview, results.len());
                        results
                    }
                    Err(e) => {
                        debug!("Labs search failed for query {:?}: {}", preview, e);
                        Vec::new()
                    }
                }
            }
            Err(e) => {
                if let ureq::Error::Status(429, _) | ureq::Error::Status(503, _) = e {
                    self.limiter.report_failure();
                }
                debug!("Labs search failed for query {:?}: {}", preview, e);
                Vec::new()
            }
        }
    }
}

// ── Batch items ──────────────────────────────────────────────────────────────

/// One entry of the batch tool's input.  Absent keys stay absent on output
/// and unknown keys are carried through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Artist name before translation, if the caller translated it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_artist: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BatchItem {
    pub fn artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("")
    }

    pub fn track(&self) -> &str {
        self.track.as_deref().unwrap_or("")
    }

    pub fn original_artist(&self) -> &str {
        self.original_artist.as_deref().unwrap_or("")
    }
}

/// The input entry with its search results appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    #[serde(flatten)]
    pub item: BatchItem,
    pub results: Vec<LabsRecording>,
}

/// Search for one item; if nothing is found and the original artist name is
/// in a non-Latin script, search again with that name.
pub fn search_batch_item(search: &mut dyn RecordingSearch, item: BatchItem) -> BatchResult {
    let mut results = search.search_recording(item.artist(), item.track());

    let original = item.original_artist();
    if results.is_empty() && !original.is_empty() && contains_non_latin_script(original) {
        info!("No results for {:?}, retrying with {:?}", item.artist(), original);
        results = search.search_recording(original, item.track());
    }

    BatchResult { item, results }
}
