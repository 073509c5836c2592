use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Lane;
use super::matching::ManualMatch;
use super::pipeline::StageId;

/// Stage recorded on every archived deal.
///
/// Archival does not look at where the lanes actually stood: a match archived
/// from `viewing` is still recorded as `completed`. The lane stages at the time
/// of archival remain available on the embedded match record.
pub const ARCHIVED_FINAL_STAGE: StageId = StageId::Completed;

/// Historical record of a match removed from active tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedMatch {
    #[serde(flatten)]
    pub record: ManualMatch,
    pub archived_at: DateTime<Utc>,
    pub final_stage: StageId,
}

impl ArchivedMatch {
    /// Where a lane actually was when the match was archived.
    pub fn stage_at_archive(&self, lane: Lane) -> StageId {
        self.record.lane_stage(lane)
    }

    pub fn reached_terminal_stage(&self) -> bool {
        self.record.applicant_stage == StageId::terminal()
            && self.record.property_stage == StageId::terminal()
    }
}

/// Builds the archive record; no stage completeness is required.
pub fn archive(record: ManualMatch, now: DateTime<Utc>) -> ArchivedMatch {
    ArchivedMatch {
        record,
        archived_at: now,
        final_stage: ARCHIVED_FINAL_STAGE,
    }
}
