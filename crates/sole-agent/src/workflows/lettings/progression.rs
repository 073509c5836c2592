use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Lane, MatchId};
use super::error::LettingsError;
use super::matching::ManualMatch;
use super::pipeline::{StageId, StageProgress, TaskSlot};
use super::store::LettingsSnapshot;

/// Result of a stage move. `changed` is false when the lane was already there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageChange {
    pub lane: Lane,
    pub previous: StageId,
    pub stage: StageId,
    pub changed: bool,
    #[serde(rename = "match")]
    pub record: ManualMatch,
}

/// Result of flipping one checklist task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistToggle {
    pub stage: StageId,
    pub slot: TaskSlot,
    pub task: &'static str,
    pub done: bool,
    pub progress: StageProgress,
    #[serde(rename = "match")]
    pub record: ManualMatch,
}

impl LettingsSnapshot {
    /// Moves one lane (or both, plus the combined stage) to `stage`.
    ///
    /// Any stage can be reached from any other. Repeating a move is a no-op that
    /// leaves `updated_at` alone.
    pub fn update_stage(
        &mut self,
        match_id: &MatchId,
        stage: StageId,
        lane: Lane,
        now: DateTime<Utc>,
    ) -> Result<StageChange, LettingsError> {
        let record = self.match_mut(match_id)?;
        let previous = record.lane_stage(lane);

        let already_there = match lane {
            Lane::Applicant => record.applicant_stage == stage,
            Lane::Property => record.property_stage == stage,
            Lane::Both => {
                record.current_stage == stage
                    && record.applicant_stage == stage
                    && record.property_stage == stage
            }
        };

        if !already_there {
            match lane {
                Lane::Applicant => record.applicant_stage = stage,
                Lane::Property => record.property_stage = stage,
                Lane::Both => {
                    record.current_stage = stage;
                    record.applicant_stage = stage;
                    record.property_stage = stage;
                }
            }
            record.updated_at = now;
        }

        Ok(StageChange {
            lane,
            previous,
            stage,
            changed: !already_there,
            record: record.clone(),
        })
    }

    /// Flips a task in any stage's checklist, whatever stage the lanes are at.
    pub fn toggle_checklist_task(
        &mut self,
        match_id: &MatchId,
        stage: StageId,
        slot: TaskSlot,
        now: DateTime<Utc>,
    ) -> Result<ChecklistToggle, LettingsError> {
        let record = self.match_mut(match_id)?;
        let done = record.checklist.toggle(stage, slot);
        record.updated_at = now;

        Ok(ChecklistToggle {
            stage,
            slot,
            task: slot.description(stage),
            done,
            progress: record.stage_progress(stage),
            record: record.clone(),
        })
    }

    pub fn set_notes(
        &mut self,
        match_id: &MatchId,
        notes: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<ManualMatch, LettingsError> {
        let record = self.match_mut(match_id)?;
        record.notes = notes.into();
        record.updated_at = now;
        Ok(record.clone())
    }

    pub fn stage_progress(
        &self,
        match_id: &MatchId,
        stage: StageId,
    ) -> Result<StageProgress, LettingsError> {
        self.find_match(match_id)
            .map(|record| record.stage_progress(stage))
            .ok_or_else(|| LettingsError::match_not_found(match_id))
    }
}
