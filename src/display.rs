//! Human-readable rendering of mapping outcomes.

use std::fmt;

use crate::pipeline::{MappingOutcome, MappingResult};

/// Per-listen report line(s); `None` for listens that were already linked.
pub fn display_result(result: &MappingResult) -> Option<String> {
    let listen = &result.listen;
    let artist = match result.outcome.translated_artist() {
        Some(t) => format!("{} → {}", listen.artist_name, t),
        None => listen.artist_name.clone(),
    };

    match &result.outcome {
        MappingOutcome::AlreadyLinked => None,
        MappingOutcome::Mapped { candidate, .. } => Some(format!(
            "  ✓ {} - {}\n    → {} - {} (score: {})",
            artist, listen.track_name, candidate.artist_credit, candidate.title, candidate.score
        )),
        MappingOutcome::NoMatch { .. } => Some(format!("  ✗ {} - {}", artist, listen.track_name)),
        MappingOutcome::Error { message } => Some(format!(
            "  ! {} - {} (error: {})",
            artist, listen.track_name, message
        )),
    }
}

/// Outcome tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub mapped: usize,
    pub no_match: usize,
    pub already_linked: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_results(results: &[MappingResult]) -> Self {
        let mut summary = Summary::default();
        for r in results {
            match r.outcome {
                MappingOutcome::AlreadyLinked => summary.already_linked += 1,
                MappingOutcome::Mapped { .. } => summary.mapped += 1,
                MappingOutcome::NoMatch { .. } => summary.no_match += 1,
                MappingOutcome::Error { .. } => summary.errors += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.mapped + self.no_match + self.already_linked + self.errors
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done: {} mapped, {} unmatched, {} already linked.",
            self.mapped, self.no_match, self.already_linked
        )?;
        if self.errors > 0 {
            write!(f, " {} errors.", self.errors)?;
        }
        Ok(())
    }
}
