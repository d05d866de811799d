//! Reviewed batches of mappings and deletions, applied one item at a time.

use log::{info, warn};
use serde::Deserialize;

use crate::listenbrainz::ListenService;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlannedMapping {
    pub recording_msid: String,
    pub recording_mbid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlannedDeletion {
    pub listened_at: i64,
    pub recording_msid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub mappings: Vec<PlannedMapping>,
    #[serde(default)]
    pub deletions: Vec<PlannedDeletion>,
}

/// Counts of applied items; failures are logged, not returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub mapped: usize,
    pub mappings: usize,
    pub deleted: usize,
    pub deletions: usize,
}

impl std::fmt::Display for PlanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Done: {}/{} mapped, {}/{} deleted.",
            self.mapped, self.mappings, self.deleted, self.deletions
        )
    }
}

fn short_msid(msid: &str) -> &str {
    match msid.char_indices().nth(12) {
        Some((idx, _)) => &msid[..idx],
        None => msid,
    }
}

/// Submit every mapping, then delete every listen.  A failing item does not
/// stop the batch.
pub fn apply_plan(service: &mut dyn ListenService, plan: &Plan) -> PlanReport {
    let mut report = PlanReport {
        mappings: plan.mappings.len(),
        deletions: plan.deletions.len(),
        ..PlanReport::default()
    };

    if !plan.mappings.is_empty() {
        info!("Submitting {} mappings...", plan.mappings.len());
    }
    for (i, m) in plan.mappings.iter().enumerate() {
        match service.submit_mapping(&m.recording_msid, &m.recording_mbid) {
            Ok(()) => {
                info!(
                    "  [{}/{}] MAPPED {}...",
                    i + 1,
                    report.mappings,
                    short_msid(&m.recording_msid)
                );
                report.mapped += 1;
            }
            Err(e) => warn!("  [{}/{}] ERROR: {}", i + 1, report.mappings, e),
        }
    }

    if !plan.deletions.is_empty() {
        info!("Deleting {} listens...", plan.deletions.len());
    }
    for (i, d) in plan.deletions.iter().enumerate() {
        match service.delete_listen(d.listened_at, &d.recording_msid) {
            Ok(()) => {
                info!(
                    "  [{}/{}] DELETED {}...",
                    i + 1,
                    report.deletions,
                    short_msid(&d.recording_msid)
                );
                report.deleted += 1;
            }
            Err(e) => warn!("  [{}/{}] ERROR: {}", i + 1, report.deletions, e),
        }
    }

    report
}
