//! Match selection: decide which catalog recording, if any, an unlinked listen is.
//!
//! The [`MatchStrategy`] trait defines one way of finding an acceptable
//! candidate.  [`MatchSelector`] runs an ordered list of them and stops at the
//! first that accepts.  The default order goes from most to least precise:
//!
//! 1. [`ExactSearch`]: artist + track, score threshold
//! 2. [`NormalizedTitle`]: artist + cleaned-up track, score threshold
//! 3. [`TranslatedArtist`]: 1 and 2 again with a romanized artist name
//! 4. [`TrackRelease`]: track + release, artist credit must match
//! 5. [`TrackOnly`]: track alone, score threshold *and* artist credit match
//!
//! The score alone is trusted only when the query carried the artist.  Once the
//! artist is dropped from the query the artist-credit check is mandatory.

use log::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::listenbrainz::Listen;
use crate::normalize::{normalize_track, release_variants, track_variants};
use crate::search::{CandidateMatch, CatalogSearch, SearchQuery};
use crate::translate::{contains_non_latin_script, Translator};

/// Tunables for the acceptance rules.  The score scale belongs to the search
/// backend, so `auto_accept_score` must be recalibrated for another backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSettings {
    pub auto_accept_score: u32,
    /// Result count for artist + track queries
    pub search_limit: u32,
    /// Result count for the artist-less fallback queries
    pub fallback_search_limit: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        MatchSettings {
            auto_accept_score: 90,
            search_limit: 5,
            fallback_search_limit: 10,
        }
    }
}

impl MatchSettings {
    pub fn from_config(config: &Config) -> Self {
        MatchSettings {
            auto_accept_score: config.auto_accept_score(),
            search_limit: config.search_limit(),
            fallback_search_limit: config.fallback_search_limit(),
        }
    }
}

/// Per-listen state shared by the strategies.
#[derive(Debug)]
pub struct MatchContext<'a> {
    pub listen: &'a Listen,
    /// Romanized artist name, once computed.  Later strategies use it as the
    /// expected artist whether or not the translated search succeeded.
    pub translated_artist: Option<String>,
}

impl<'a> MatchContext<'a> {
    pub fn new(listen: &'a Listen) -> Self {
        MatchContext {
            listen,
            translated_artist: None,
        }
    }

    /// The artist name a candidate's credit must contain.
    pub fn expected_artist(&self) -> &str {
        self.translated_artist
            .as_deref()
            .unwrap_or(&self.listen.artist_name)
    }
}

/// Collaborators the strategies may call.
pub struct MatchEnv<'a> {
    pub search: &'a mut dyn CatalogSearch,
    pub translator: &'a mut dyn Translator,
    pub settings: &'a MatchSettings,
}

/// One step of the fallback chain.
pub trait MatchStrategy {
    /// Short display name used in logs and results.
    fn name(&self) -> &'static str;

    /// Return a candidate only if it satisfies this strategy's acceptance rule.
    /// `Ok(None)` means "no acceptable match here", not an error.
    fn find_match(
        &self,
        ctx: &mut MatchContext<'_>,
        env: &mut MatchEnv<'_>,
    ) -> Result<Option<CandidateMatch>>;
}

// ── Acceptance rules ─────────────────────────────────────────────────────────

/// First candidate at or above the threshold.
fn accept_by_score(candidates: Vec<CandidateMatch>, min_score: u32) -> Option<CandidateMatch> {
    candidates.into_iter().find(|c| c.score >= min_score)
}

/// First candidate whose artist credit contains the expected artist.
fn accept_by_artist(candidates: Vec<CandidateMatch>, expected: &str) -> Option<CandidateMatch> {
    candidates.into_iter().find(|c| c.artist_matches(expected))
}

/// First candidate passing both the threshold and the artist check.
fn accept_by_score_and_artist(
    candidates: Vec<CandidateMatch>,
    min_score: u32,
    expected: &str,
) -> Option<CandidateMatch> {
    candidates
        .into_iter()
        .find(|c| c.score >= min_score && c.artist_matches(expected))
}

/// Score-only acceptance, so the query must carry a non-empty artist.
fn search_artist_recording(
    env: &mut MatchEnv<'_>,
    artist: &str,
    recording: &str,
) -> Result<Option<CandidateMatch>> {
    if artist.trim().is_empty() {
        return Ok(None);
    }
    let candidates = env
        .search
        .search(&SearchQuery::artist_recording(artist, recording), env.settings.search_limit)?;
    Ok(accept_by_score(candidates, env.settings.auto_accept_score))
}

/// The normalized track name, or `None` when it is empty or unchanged and a
/// second query would be pointless.
fn normalized_retry(track: &str) -> Option<String> {
    let normalized = normalize_track(track);
    if normalized.is_empty() || normalized == track {
        None
    } else {
        Some(normalized)
    }
}

// ── Strategies ───────────────────────────────────────────────────────────────

/// Artist + track exactly as listened.
pub struct ExactSearch;

impl MatchStrategy for ExactSearch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn find_match(
        &self,
        ctx: &mut MatchContext<'_>,
        env: &mut MatchEnv<'_>,
    ) -> Result<Option<CandidateMatch>> {
        search_artist_recording(env, &ctx.listen.artist_name, &ctx.listen.track_name)
    }
}

/// Artist + normalized track, only when normalization changed the track name.
pub struct NormalizedTitle;

impl MatchStrategy for NormalizedTitle {
    fn name(&self) -> &'static str {
        "normalized-title"
    }

    fn find_match(
        &self,
        ctx: &mut MatchContext<'_>,
        env: &mut MatchEnv<'_>,
    ) -> Result<Option<CandidateMatch>> {
        match normalized_retry(&ctx.listen.track_name) {
            Some(track) => search_artist_recording(env, &ctx.listen.artist_name, &track),
            None => Ok(None),
        }
    }
}

/// Exact and normalized searches again with a translated artist name.
/// Only for artist names in CJK / Hangul / Kana script.
pub struct TranslatedArtist;

impl MatchStrategy for TranslatedArtist {
    fn name(&self) -> &'static str {
        "translated-artist"
    }

    fn find_match(
        &self,
        ctx: &mut MatchContext<'_>,
        env: &mut MatchEnv<'_>,
    ) -> Result<Option<CandidateMatch>> {
        let original = ctx.listen.artist_name.as_str();
        if !contains_non_latin_script(original) {
            return Ok(None);
        }

        if ctx.translated_artist.is_none() {
            let translated = env.translator.translate(original)?;
            let translated = translated.trim();
            if translated.is_empty() || translated == original {
                debug!("No usable translation for {:?}", original);
                return Ok(None);
            }
            ctx.translated_artist = Some(translated.to_string());
        }

        let artist = ctx.expected_artist().to_string();
        if let Some(found) = search_artist_recording(env, &artist, &ctx.listen.track_name)? {
            return Ok(Some(found));
        }
        match normalized_retry(&ctx.listen.track_name) {
            Some(track) => search_artist_recording(env, &artist, &track),
            None => Ok(None),
        }
    }
}

/// Track + release without the artist; the artist credit must contain the
/// expected artist.  No score threshold.  An empty expected artist matches
/// no credit, so listens without an artist are never accepted here.
pub struct TrackRelease;

impl MatchStrategy for TrackRelease {
    fn name(&self) -> &'static str {
        "track-release"
    }

    fn find_match(
        &self,
        ctx: &mut MatchContext<'_>,
        env: &mut MatchEnv<'_>,
    ) -> Result<Option<CandidateMatch>> {
        if ctx.listen.release_name.trim().is_empty() {
            return Ok(None);
        }

        let expected = ctx.expected_artist().to_string();
        for release in release_variants(&ctx.listen.release_name) {
            for track in track_variants(&ctx.listen.track_name) {
                let candidates = env.search.search(
                    &SearchQuery::recording_release(&track, &release),
                    env.settings.fallback_search_limit,
                )?;
                if let Some(found) = accept_by_artist(candidates, &expected) {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }
}

/// Track name alone.  Needs both the score threshold and an artist-credit match;
/// an empty expected artist matches no credit.
pub struct TrackOnly;

impl MatchStrategy for TrackOnly {
    fn name(&self) -> &'static str {
        "track-only"
    }

    fn find_match(
        &self,
        ctx: &mut MatchContext<'_>,
        env: &mut MatchEnv<'_>,
    ) -> Result<Option<CandidateMatch>> {
        let expected = ctx.expected_artist().to_string();
        for track in track_variants(&ctx.listen.track_name) {
            let candidates = env.search.search(
                &SearchQuery::recording(&track),
                env.settings.fallback_search_limit,
            )?;
            if let Some(found) =
                accept_by_score_and_artist(candidates, env.settings.auto_accept_score, &expected)
            {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// The standard five-step order.
pub fn default_strategies() -> Vec<Box<dyn MatchStrategy>> {
    vec![
        Box::new(ExactSearch),
        Box::new(NormalizedTitle),
        Box::new(TranslatedArtist),
        Box::new(TrackRelease),
        Box::new(TrackOnly),
    ]
}

// ── Selector ─────────────────────────────────────────────────────────────────

/// A candidate together with the strategy that accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedMatch {
    pub candidate: CandidateMatch,
    pub strategy: &'static str,
}

/// Outcome of running the strategy chain for one listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub accepted: Option<AcceptedMatch>,
    pub translated_artist: Option<String>,
}

pub struct MatchSelector {
    strategies: Vec<Box<dyn MatchStrategy>>,
    settings: MatchSettings,
}

impl MatchSelector {
    pub fn new(settings: MatchSettings) -> Self {
        Self::with_strategies(default_strategies(), settings)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn MatchStrategy>>, settings: MatchSettings) -> Self {
        MatchSelector { strategies, settings }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order and return the first accepted candidate.
    pub fn select(
        &self,
        listen: &Listen,
        search: &mut dyn CatalogSearch,
        translator: &mut dyn Translator,
    ) -> Result<Selection> {
        let mut ctx = MatchContext::new(listen);
        let mut env = MatchEnv {
            search,
            translator,
            settings: &self.settings,
        };

        for strategy in &self.strategies {
            debug!(
                "Trying {} for {} - {}",
                strategy.name(),
                listen.artist_name,
                listen.track_name
            );
            if let Some(candidate) = strategy.find_match(&mut ctx, &mut env)? {
                info!(
                    "{}: {} - {} => {} ({}, score {})",
                    strategy.name(),
                    listen.artist_name,
                    listen.track_name,
                    candidate.title,
                    candidate.recording_id,
                    candidate.score
                );
                return Ok(Selection {
                    accepted: Some(AcceptedMatch {
                        candidate,
                        strategy: strategy.name(),
                    }),
                    translated_artist: ctx.translated_artist,
                });
            }
        }

        Ok(Selection {
            accepted: None,
            translated_artist: ctx.translated_artist,
        })
    }
}
