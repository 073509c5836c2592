use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::archive::{self, ArchivedMatch};
use super::domain::{ApplicantId, ApplicantStatus, Lane, MatchId, PropertyId, PropertyStatus};
use super::error::LettingsError;
use super::pipeline::{Checklist, StageId, StageProgress};
use super::store::LettingsSnapshot;

/// An active pairing of one applicant with one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredMatch")]
pub struct ManualMatch {
    pub match_id: MatchId,
    pub applicant_id: ApplicantId,
    pub property_id: PropertyId,
    pub matched_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Combined stage, only moved when both lanes are moved together.
    pub current_stage: StageId,
    pub applicant_stage: StageId,
    pub property_stage: StageId,
    pub checklist: Checklist,
    pub notes: String,
}

// Older records predate per-lane stages and may omit the checklist entirely.
#[derive(Deserialize)]
struct StoredMatch {
    match_id: MatchId,
    applicant_id: ApplicantId,
    property_id: PropertyId,
    matched_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(default = "StageId::initial")]
    current_stage: StageId,
    applicant_stage: Option<StageId>,
    property_stage: Option<StageId>,
    #[serde(default)]
    checklist: Option<Checklist>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<StoredMatch> for ManualMatch {
    fn from(stored: StoredMatch) -> Self {
        Self {
            updated_at: stored.updated_at.unwrap_or(stored.matched_at),
            applicant_stage: stored.applicant_stage.unwrap_or(stored.current_stage),
            property_stage: stored.property_stage.unwrap_or(stored.current_stage),
            checklist: stored.checklist.unwrap_or_default(),
            notes: stored.notes.unwrap_or_default(),
            match_id: stored.match_id,
            applicant_id: stored.applicant_id,
            property_id: stored.property_id,
            matched_at: stored.matched_at,
            current_stage: stored.current_stage,
        }
    }
}

impl ManualMatch {
    pub(crate) fn new(
        match_id: MatchId,
        applicant_id: ApplicantId,
        property_id: PropertyId,
        now: DateTime<Utc>,
    ) -> Self {
        let initial = StageId::initial();
        Self {
            match_id,
            applicant_id,
            property_id,
            matched_at: now,
            updated_at: now,
            current_stage: initial,
            applicant_stage: initial,
            property_stage: initial,
            checklist: Checklist::fresh(),
            notes: String::new(),
        }
    }

    /// Stage the given lane sits at; `Both` reads the combined stage.
    pub fn lane_stage(&self, lane: Lane) -> StageId {
        match lane {
            Lane::Applicant => self.applicant_stage,
            Lane::Property => self.property_stage,
            Lane::Both => self.current_stage,
        }
    }

    pub fn links(&self, applicant_id: &ApplicantId, property_id: &PropertyId) -> bool {
        &self.applicant_id == applicant_id && &self.property_id == property_id
    }

    pub fn stage_progress(&self, stage: StageId) -> StageProgress {
        self.checklist.progress(stage)
    }

    pub fn lane_progress(&self, lane: Lane) -> StageProgress {
        self.stage_progress(self.lane_stage(lane))
    }
}

impl LettingsSnapshot {
    /// Pairs an available applicant with an available property.
    pub fn create_match(
        &mut self,
        applicant_id: &ApplicantId,
        property_id: &PropertyId,
        now: DateTime<Utc>,
    ) -> Result<ManualMatch, LettingsError> {
        let applicant = self
            .find_applicant(applicant_id)
            .ok_or_else(|| LettingsError::applicant_not_found(applicant_id))?;
        let property = self
            .find_property(property_id)
            .ok_or_else(|| LettingsError::property_not_found(property_id))?;

        if self
            .matches()
            .iter()
            .any(|record| record.links(applicant_id, property_id))
        {
            return Err(LettingsError::AlreadyMatched {
                applicant_id: applicant_id.clone(),
                property_id: property_id.clone(),
            });
        }
        if applicant.status != ApplicantStatus::Active {
            return Err(LettingsError::ApplicantUnavailable(applicant_id.clone()));
        }
        if property.status != PropertyStatus::Available {
            return Err(LettingsError::PropertyUnavailable(property_id.clone()));
        }

        let match_id = MatchId(self.allocate_id(MatchId::PREFIX));
        let record = ManualMatch::new(match_id, applicant_id.clone(), property_id.clone(), now);

        self.set_applicant_status(applicant_id, ApplicantStatus::Matched);
        self.set_property_status(property_id, PropertyStatus::Matched);
        self.matches_mut().push(record.clone());

        Ok(record)
    }

    /// Deletes an active match and frees both sides.
    pub fn remove_match(&mut self, match_id: &MatchId) -> Result<ManualMatch, LettingsError> {
        let index = self
            .match_index(match_id)
            .ok_or_else(|| LettingsError::match_not_found(match_id))?;

        let record = self.matches_mut().remove(index);
        self.release(&record);
        Ok(record)
    }

    /// Moves an active match into the archive and frees both sides.
    pub fn archive_match(
        &mut self,
        match_id: &MatchId,
        now: DateTime<Utc>,
    ) -> Result<ArchivedMatch, LettingsError> {
        let index = self
            .match_index(match_id)
            .ok_or_else(|| LettingsError::match_not_found(match_id))?;

        let record = self.matches_mut().remove(index);
        self.release(&record);

        let archived = archive::archive(record, now);
        self.archived_matches_mut().push(archived.clone());
        Ok(archived)
    }

    fn release(&mut self, record: &ManualMatch) {
        self.set_applicant_status(&record.applicant_id, ApplicantStatus::Active);
        self.set_property_status(&record.property_id, PropertyStatus::Available);
    }
}
