//! Per-listen orchestration: linked check → match selection → submission.
//!
//! Listens are processed strictly one at a time in input order.  A failure
//! while handling one listen is recorded as [`MappingOutcome::Error`] for that
//! listen and processing carries on with the next.

use log::{info, warn};

use crate::listenbrainz::{Listen, ListenService};
use crate::matcher::MatchSelector;
use crate::search::{CandidateMatch, CatalogSearch};
use crate::translate::Translator;

/// What happened to one listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOutcome {
    /// The listen already carried a recording link; nothing was searched.
    AlreadyLinked,
    /// A candidate was accepted (and submitted unless running dry).
    Mapped {
        candidate: CandidateMatch,
        strategy: &'static str,
        translated_artist: Option<String>,
    },
    NoMatch {
        translated_artist: Option<String>,
    },
    Error {
        message: String,
    },
}

impl MappingOutcome {
    pub fn translated_artist(&self) -> Option<&str> {
        match self {
            MappingOutcome::Mapped {
                translated_artist, ..
            }
            | MappingOutcome::NoMatch { translated_artist } => translated_artist.as_deref(),
            _ => None,
        }
    }
}

/// A listen paired with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingResult {
    pub listen: Listen,
    pub outcome: MappingOutcome,
}

pub struct Pipeline<'a> {
    selector: &'a MatchSelector,
    search: &'a mut dyn CatalogSearch,
    translator: &'a mut dyn Translator,
    listens: &'a mut dyn ListenService,
    dry_run: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        selector: &'a MatchSelector,
        search: &'a mut dyn CatalogSearch,
        translator: &'a mut dyn Translator,
        listens: &'a mut dyn ListenService,
    ) -> Self {
        Pipeline {
            selector,
            search,
            translator,
            listens,
            dry_run: false,
        }
    }

    /// Simulate only: select matches but never submit them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// One result per input listen, in input order.
    pub fn process(&mut self, listens: &[Listen]) -> Vec<MappingResult> {
        let total = listens.len();
        listens
            .iter()
            .enumerate()
            .map(|(i, listen)| {
                info!(
                    "[{}/{}] {} - {}",
                    i + 1,
                    total,
                    listen.artist_name,
                    listen.track_name
                );
                MappingResult {
                    listen: listen.clone(),
                    outcome: self.process_one(listen),
                }
            })
            .collect()
    }

    pub fn process_one(&mut self, listen: &Listen) -> MappingOutcome {
        if listen.is_linked() {
            return MappingOutcome::AlreadyLinked;
        }

        let selection = match self.selector.select(listen, &mut *self.search, &mut *self.translator) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "Error processing {} - {}: {}",
                    listen.artist_name, listen.track_name, e
                );
                return MappingOutcome::Error {
                    message: e.to_string(),
                };
            }
        };

        let accepted = match selection.accepted {
            Some(a) => a,
            None => {
                return MappingOutcome::NoMatch {
                    translated_artist: selection.translated_artist,
                }
            }
        };

        if !self.dry_run {
            if let Err(e) = self
                .listens
                .submit_mapping(&listen.recording_msid, &accepted.candidate.recording_id)
            {
                warn!(
                    "Submitting {} for {} failed: {}",
                    accepted.candidate.recording_id, listen.recording_msid, e
                );
                return MappingOutcome::Error {
                    message: format!("submit failed: {e}"),
                };
            }
        }

        MappingOutcome::Mapped {
            candidate: accepted.candidate,
            strategy: accepted.strategy,
            translated_artist: selection.translated_artist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchSettings;
    use crate::testing::{
        candidate, linked_listen, listen, FakeListenService, MapTranslator, QueryKey,
        ScriptedSearch,
    };

    fn run(
        listens: &[Listen],
        search: &mut ScriptedSearch,
        translator: &mut MapTranslator,
        service: &mut FakeListenService,
        dry_run: bool,
    ) -> Vec<MappingResult> {
        let selector = MatchSelector::new(MatchSettings::default());
        let mut pipeline = Pipeline::new(&selector, search, translator, service).dry_run(dry_run);
        pipeline.process(listens)
    }

    #[test]
    fn test_already_linked_skips_search_and_submit() {
        let listens = vec![linked_listen("Foo", "Song"), linked_listen("Bar", "Other")];
        let mut search = ScriptedSearch::new();
        let mut translator = MapTranslator::new(&[]);
        let mut service = FakeListenService::new();

        let results = run(&listens, &mut search, &mut translator, &mut service, false);
        assert!(results
            .iter()
            .all(|r| r.outcome == MappingOutcome::AlreadyLinked));
        assert!(search.calls().is_empty());
        assert!(service.submitted.is_empty());
        assert_eq!(translator.calls(), 0);
    }

    #[test]
    fn test_mapped_listen_is_submitted() {
        let l = listen("Foo", "Song", "");
        let mut search = ScriptedSearch::new();
        search.respond(
            QueryKey::artist_recording("Foo", "Song"),
            vec![candidate("mbid-1", "Foo", 100)],
        );
        let mut service = FakeListenService::new();

        let results = run(
            &[l.clone()],
            &mut search,
            &mut MapTranslator::new(&[]),
            &mut service,
            false,
        );
        match &results[0].outcome {
            MappingOutcome::Mapped {
                candidate,
                strategy,
                translated_artist,
            } => {
                assert_eq!(candidate.recording_id, "mbid-1");
                assert_eq!(*strategy, "exact");
                assert_eq!(*translated_artist, None);
            }
            other => panic!("expected Mapped, got {other:?}"),
        }
        assert_eq!(
            service.submitted,
            vec![(l.recording_msid.clone(), "mbid-1".to_string())]
        );
    }

    #[test]
    fn test_dry_run_never_submits() {
        let l = listen("Foo", "Song", "");
        let mut search = ScriptedSearch::new();
        search.respond(
            QueryKey::artist_recording("Foo", "Song"),
            vec![candidate("mbid-1", "Foo", 100)],
        );
        let mut service = FakeListenService::new();

        let results = run(&[l], &mut search, &mut MapTranslator::new(&[]), &mut service, true);
        assert!(matches!(results[0].outcome, MappingOutcome::Mapped { .. }));
        assert!(service.submitted.is_empty());
    }

    #[test]
    fn test_submit_failure_is_error_not_mapped() {
        let l = listen("Foo", "Song", "");
        let mut search = ScriptedSearch::new();
        search.respond(
            QueryKey::artist_recording("Foo", "Song"),
            vec![candidate("mbid-1", "Foo", 100)],
        );
        let mut service = FakeListenService::new();
        service.reject_msids.push(l.recording_msid.clone());

        let results = run(&[l], &mut search, &mut MapTranslator::new(&[]), &mut service, false);
        match &results[0].outcome {
            MappingOutcome::Error { message } => assert!(message.contains("submit failed")),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_one_failure_does_not_abort_batch() {
        let listens = vec![
            listen("Foo", "First", ""),
            listen("Bar", "Second", ""),
            listen("Baz", "Third", ""),
        ];
        let mut search = ScriptedSearch::new();
        search.respond(
            QueryKey::artist_recording("Foo", "First"),
            vec![candidate("mbid-1", "Foo", 99)],
        );
        search.fail(QueryKey::artist_recording("Bar", "Second"), "backend exploded");
        search.respond(
            QueryKey::artist_recording("Baz", "Third"),
            vec![candidate("mbid-3", "Baz", 97)],
        );
        let mut service = FakeListenService::new();

        let results = run(&listens, &mut search, &mut MapTranslator::new(&[]), &mut service, false);
        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].outcome, MappingOutcome::Mapped { .. }));
        match &results[1].outcome {
            MappingOutcome::Error { message } => assert!(message.contains("backend exploded")),
            other => panic!("expected Error, got {other:?}"),
        }
        assert!(matches!(results[2].outcome, MappingOutcome::Mapped { .. }));
        assert_eq!(service.submitted.len(), 2);
        // Output order follows input order
        let tracks: Vec<&str> = results.iter().map(|r| r.listen.track_name.as_str()).collect();
        assert_eq!(tracks, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_no_match_carries_translation() {
        let l = listen("初音ミク", "Unknown", "");
        let mut translator = MapTranslator::new(&[("初音ミク", "Hatsune Miku")]);
        let results = run(
            &[l],
            &mut ScriptedSearch::new(),
            &mut translator,
            &mut FakeListenService::new(),
            false,
        );
        assert_eq!(
            results[0].outcome,
            MappingOutcome::NoMatch {
                translated_artist: Some("Hatsune Miku".into())
            }
        );
        assert_eq!(results[0].outcome.translated_artist(), Some("Hatsune Miku"));
    }

    #[test]
    fn test_track_only_wrong_artist_is_no_match() {
        let l = listen("Real Artist", "Song", "");
        let mut search = ScriptedSearch::new();
        search.respond(
            QueryKey::recording("Song"),
            vec![candidate("mbid-x", "Someone Else", 95)],
        );
        let mut service = FakeListenService::new();
        let results = run(&[l], &mut search, &mut MapTranslator::new(&[]), &mut service, false);
        assert_eq!(
            results[0].outcome,
            MappingOutcome::NoMatch {
                translated_artist: None
            }
        );
        assert!(service.submitted.is_empty());
    }
}
