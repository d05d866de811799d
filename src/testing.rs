//! Deterministic test doubles shared by the unit tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{MapperError, Result};
use crate::listenbrainz::{Listen, ListenService};
use crate::rate_limiter::Clock;
use crate::search::{CandidateMatch, CatalogSearch, SearchQuery};
use crate::translate::Translator;

pub fn listen(artist: &str, track: &str, release: &str) -> Listen {
    Listen {
        listened_at: 1_700_000_000,
        recording_msid: format!("msid-{artist}-{track}"),
        artist_name: artist.to_string(),
        track_name: track.to_string(),
        release_name: release.to_string(),
        mbid_mapping: None,
    }
}

pub fn linked_listen(artist: &str, track: &str) -> Listen {
    let mut l = listen(artist, track, "");
    l.mbid_mapping = Some(serde_json::json!({"recording_mbid": "already"}));
    l
}

pub fn candidate(recording_id: &str, artist_credit: &str, score: u32) -> CandidateMatch {
    CandidateMatch {
        recording_id: recording_id.to_string(),
        title: format!("title of {recording_id}"),
        artist_credit: artist_credit.to_string(),
        score,
        release: String::new(),
    }
}

// ── Clock ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct FakeClockState {
    start: Instant,
    offset: Duration,
    sleeps: Vec<Duration>,
}

/// Clock that only moves when told to (or when slept on).  Clones share state.
#[derive(Debug, Clone)]
pub struct FakeClock {
    state: Arc<Mutex<FakeClockState>>,
}

impl FakeClock {
    pub fn new() -> Self {
        FakeClock {
            state: Arc::new(Mutex::new(FakeClockState {
                start: Instant::now(),
                offset: Duration::ZERO,
                sleeps: Vec::new(),
            })),
        }
    }

    pub fn advance(&self, d: Duration) {
        self.state.lock().unwrap().offset += d;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap().sleeps.clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let s = self.state.lock().unwrap();
        s.start + s.offset
    }

    fn sleep(&self, duration: Duration) {
        let mut s = self.state.lock().unwrap();
        s.sleeps.push(duration);
        s.offset += duration;
    }
}

// ── Search ───────────────────────────────────────────────────────────────────

/// Owned form of a [`SearchQuery`], used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub artist: Option<String>,
    pub recording: Option<String>,
    pub release: Option<String>,
}

impl QueryKey {
    pub fn artist_recording(artist: &str, recording: &str) -> Self {
        QueryKey {
            artist: Some(artist.into()),
            recording: Some(recording.into()),
            release: None,
        }
    }

    pub fn recording_release(recording: &str, release: &str) -> Self {
        QueryKey {
            artist: None,
            recording: Some(recording.into()),
            release: Some(release.into()),
        }
    }

    pub fn recording(recording: &str) -> Self {
        QueryKey {
            artist: None,
            recording: Some(recording.into()),
            release: None,
        }
    }

    fn from_query(q: &SearchQuery<'_>) -> Self {
        QueryKey {
            artist: q.artist.map(str::to_string),
            recording: q.recording.map(str::to_string),
            release: q.release.map(str::to_string),
        }
    }
}

enum Scripted {
    Candidates(Vec<CandidateMatch>),
    Fail(String),
}

/// Search backend answering from a fixed script and recording every query.
/// Unscripted queries return no candidates.
#[derive(Default)]
pub struct ScriptedSearch {
    script: HashMap<QueryKey, Scripted>,
    calls: Vec<QueryKey>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, key: QueryKey, candidates: Vec<CandidateMatch>) {
        self.script.insert(key, Scripted::Candidates(candidates));
    }

    pub fn fail(&mut self, key: QueryKey, message: &str) {
        self.script.insert(key, Scripted::Fail(message.to_string()));
    }

    pub fn calls(&self) -> Vec<QueryKey> {
        self.calls.clone()
    }
}

impl CatalogSearch for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    fn search(&mut self, query: &SearchQuery<'_>, limit: u32) -> Result<Vec<CandidateMatch>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let key = QueryKey::from_query(query);
        self.calls.push(key.clone());
        match self.script.get(&key) {
            Some(Scripted::Candidates(c)) => Ok(c.iter().take(limit as usize).cloned().collect()),
            Some(Scripted::Fail(msg)) => Err(MapperError::Http(msg.clone())),
            None => Ok(Vec::new()),
        }
    }
}

// ── Translator ───────────────────────────────────────────────────────────────

/// Translator backed by a fixed table; unknown names come back unchanged.
/// Clones share the call counter.
#[derive(Clone)]
pub struct MapTranslator {
    table: HashMap<String, String>,
    fail: bool,
    calls: Rc<Cell<usize>>,
}

impl MapTranslator {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        MapTranslator {
            table: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fail: false,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing() -> Self {
        MapTranslator {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Translator for MapTranslator {
    fn translate(&mut self, text: &str) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(MapperError::Translation("translator unavailable".into()));
        }
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string()))
    }
}

// ── Listen service ───────────────────────────────────────────────────────────

/// In-memory history; records fetch windows, submissions and deletions.
#[derive(Default)]
pub struct FakeListenService {
    history: Vec<Listen>,
    pub fetch_calls: Vec<Option<i64>>,
    pub submitted: Vec<(String, String)>,
    pub deleted: Vec<(i64, String)>,
    /// Submissions for these msids fail
    pub reject_msids: Vec<String>,
}

impl FakeListenService {
    pub fn new() -> Self {
        Self::default()
    }

    /// `history` must be newest first.
    pub fn with_history(history: Vec<Listen>) -> Self {
        FakeListenService {
            history,
            ..Self::default()
        }
    }
}

impl ListenService for FakeListenService {
    fn fetch_listens(&mut self, _user: &str, count: u32, max_ts: Option<i64>) -> Result<Vec<Listen>> {
        self.fetch_calls.push(max_ts);
        Ok(self
            .history
            .iter()
            .filter(|l| max_ts.map_or(true, |ts| l.listened_at < ts))
            .take(count as usize)
            .cloned()
            .collect())
    }

    fn submit_mapping(&mut self, recording_msid: &str, recording_mbid: &str) -> Result<()> {
        if self.reject_msids.iter().any(|m| m == recording_msid) {
            return Err(MapperError::Http("submission rejected".into()));
        }
        self.submitted
            .push((recording_msid.to_string(), recording_mbid.to_string()));
        Ok(())
    }

    fn delete_listen(&mut self, listened_at: i64, recording_msid: &str) -> Result<()> {
        self.deleted.push((listened_at, recording_msid.to_string()));
        Ok(())
    }
}
