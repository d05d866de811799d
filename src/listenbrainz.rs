//! ListenBrainz API client: fetch listens, submit manual mappings, delete listens.
//!
//! Authentication uses the user token (`Authorization: Token …`).  The server
//! reports its own rate limit in `X-RateLimit-Remaining` / `X-RateLimit-Reset-In`
//! headers; when the budget is nearly spent the client sleeps for the reset
//! period before returning.

use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{MapperError, Result};
use crate::rate_limiter::{Clock, SystemClock};

pub const DEFAULT_BASE_URL: &str = "https://api.listenbrainz.org";

/// Listens requested per page when scanning history for unlinked listens.
pub const PAGE_SIZE: u32 = 100;

/// One playback event.
#[derive(Debug, Clone, PartialEq)]
pub struct Listen {
    /// Seconds since the epoch
    pub listened_at: i64,
    /// Source-assigned id of the submitted recording
    pub recording_msid: String,
    pub artist_name: String,
    pub track_name: String,
    /// Empty when the submission had no release
    pub release_name: String,
    /// Existing link to a canonical recording, as sent by the server
    pub mbid_mapping: Option<serde_json::Value>,
}

impl Listen {
    pub fn is_linked(&self) -> bool {
        self.mbid_mapping.is_some()
    }

    /// Build a listen from one entry of `payload.listens`.
    pub fn from_api(value: serde_json::Value) -> Result<Listen> {
        let api: ApiListen = serde_json::from_value(value)?;
        let tm = api.track_metadata;
        let recording_msid = tm
            .additional_info
            .recording_msid
            .or(api.recording_msid)
            .unwrap_or_default();
        Ok(Listen {
            listened_at: api.listened_at,
            recording_msid,
            artist_name: tm.artist_name.unwrap_or_default(),
            track_name: tm.track_name.unwrap_or_default(),
            release_name: tm.release_name.unwrap_or_default(),
            mbid_mapping: tm.mbid_mapping.filter(|v| !v.is_null()),
        })
    }
}

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiListen {
    listened_at: i64,
    #[serde(default)]
    recording_msid: Option<String>,
    track_metadata: ApiTrackMetadata,
}

#[derive(Debug, Deserialize)]
struct ApiTrackMetadata {
    #[serde(default)]
    artist_name: Option<String>,
    #[serde(default)]
    track_name: Option<String>,
    #[serde(default)]
    release_name: Option<String>,
    #[serde(default)]
    mbid_mapping: Option<serde_json::Value>,
    #[serde(default)]
    additional_info: ApiAdditionalInfo,
}

#[derive(Debug, Default, Deserialize)]
struct ApiAdditionalInfo {
    #[serde(default)]
    recording_msid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListensResponse {
    payload: ListensPayload,
}

#[derive(Debug, Deserialize)]
struct ListensPayload {
    #[serde(default)]
    listens: Vec<serde_json::Value>,
}

/// Parse a `/1/user/{user}/listens` response body.
pub fn parse_listens(json: &str) -> Result<Vec<Listen>> {
    let response: ListensResponse = serde_json::from_str(json)?;
    response.payload.listens.into_iter().map(Listen::from_api).collect()
}

// ── Service trait ────────────────────────────────────────────────────────────

/// Result of scanning history for unlinked listens.
#[derive(Debug, Clone, Default)]
pub struct ListenScan {
    /// Listens examined
    pub total: usize,
    /// Of those, how many were already linked
    pub linked: usize,
    /// Unlinked listens, newest first
    pub unlinked: Vec<Listen>,
}

pub trait ListenService {
    /// Up to `count` listens, newest first, optionally only those before `max_ts`.
    fn fetch_listens(&mut self, user: &str, count: u32, max_ts: Option<i64>) -> Result<Vec<Listen>>;

    /// Link a submitted recording to a canonical recording.
    fn submit_mapping(&mut self, recording_msid: &str, recording_mbid: &str) -> Result<()>;

    fn delete_listen(&mut self, listened_at: i64, recording_msid: &str) -> Result<()>;

    /// Walk history backwards until `limit` unlinked listens are found or the
    /// history is exhausted.
    fn fetch_unlinked_listens(&mut self, user: &str, limit: usize) -> Result<ListenScan> {
        let mut scan = ListenScan::default();
        let mut max_ts: Option<i64> = None;

        while scan.unlinked.len() < limit {
            let page = self.fetch_listens(user, PAGE_SIZE, max_ts)?;
            let oldest = match page.last() {
                Some(l) => l.listened_at,
                None => break,
            };

            for listen in page {
                scan.total += 1;
                if listen.is_linked() {
                    scan.linked += 1;
                } else {
                    scan.unlinked.push(listen);
                    if scan.unlinked.len() >= limit {
                        break;
                    }
                }
            }

            // Stop if the server did not move the window back
            if max_ts.map_or(false, |ts| oldest >= ts) {
                break;
            }
            max_ts = Some(oldest);
            debug!(
                "Scanned {} listens, {} unlinked so far",
                scan.total,
                scan.unlinked.len()
            );
        }

        Ok(scan)
    }
}

// ── HTTP client ──────────────────────────────────────────────────────────────

/// How long to pause given the server's rate-limit headers, if at all.
pub fn rate_limit_pause(remaining: Option<&str>, reset_in: Option<&str>) -> Option<Duration> {
    let remaining: i64 = remaining?.trim().parse().ok()?;
    if remaining > 1 {
        return None;
    }
    let secs = reset_in
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(1.0);
    Some(Duration::from_secs_f64(secs))
}

pub struct ListenBrainzClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    clock: Box<dyn Clock>,
}

impl ListenBrainzClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("lbmapper/", env!("CARGO_PKG_VERSION")))
            .build();
        ListenBrainzClient {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn from_config(config: &Config, token: &str) -> Self {
        Self::new(&config.listenbrainz_url(), token, config.timeout())
    }

    fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }

    fn respect_rate_limit(&self, resp: &ureq::Response) {
        if let Some(pause) = rate_limit_pause(
            resp.header("X-RateLimit-Remaining"),
            resp.header("X-RateLimit-Reset-In"),
        ) {
            info!(
                "[ListenBrainz] rate limit nearly exhausted, waiting {:.1}s",
                pause.as_secs_f64()
            );
            self.clock.sleep(pause);
        }
    }

    /// Apply the rate-limit headers on both success and error responses.
    fn finish(&self, result: std::result::Result<ureq::Response, ureq::Error>) -> Result<ureq::Response> {
        match result {
            Ok(resp) => {
                self.respect_rate_limit(&resp);
                Ok(resp)
            }
            Err(ureq::Error::Status(code, resp)) => {
                self.respect_rate_limit(&resp);
                let body = resp.into_string().unwrap_or_default();
                Err(MapperError::Http(format!(
                    "ListenBrainz returned status {}: {}",
                    code,
                    body.trim()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ListenService for ListenBrainzClient {
    fn fetch_listens(&mut self, user: &str, count: u32, max_ts: Option<i64>) -> Result<Vec<Listen>> {
        let url = format!("{}/1/user/{}/listens", self.base_url, user);
        let mut request = self
            .agent
            .get(&url)
            .set("Authorization", &self.authorization())
            .query("count", &count.to_string());
        if let Some(ts) = max_ts {
            request = request.query("max_ts", &ts.to_string());
        }

        let resp = self.finish(request.call())?;
        let body = resp.into_string()?;
        let listens = parse_listens(&body)?;
        debug!("Fetched {} listen(s) for {}", listens.len(), user);
        Ok(listens)
    }

    fn submit_mapping(&mut self, recording_msid: &str, recording_mbid: &str) -> Result<()> {
        let url = format!("{}/1/metadata/submit_manual_mapping/", self.base_url);
        let result = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization())
            .send_json(serde_json::json!({
                "recording_msid": recording_msid,
                "recording_mbid": recording_mbid,
            }));
        self.finish(result)?;
        Ok(())
    }

    fn delete_listen(&mut self, listened_at: i64, recording_msid: &str) -> Result<()> {
        let url = format!("{}/1/delete-listen", self.base_url);
        let result = self
            .agent
            .post(&url)
            .set("Authorization", &self.authorization())
            .send_json(serde_json::json!({
                "listened_at": listened_at,
                "recording_msid": recording_msid,
            }));
        self.finish(result)?;
        Ok(())
    }
}
