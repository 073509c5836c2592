use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::archive::ArchivedMatch;
use super::domain::{
    Applicant, ApplicantDraft, ApplicantId, ApplicantStatus, EntityKind, MatchId, Property,
    PropertyDraft, PropertyId, PropertyStatus,
};
use super::error::LettingsError;
use super::matching::ManualMatch;

/// The whole lettings state: every applicant, property, active match and archived match.
///
/// Commands take `&mut self` and validate fully before touching anything, so a
/// failed command leaves the value exactly as it was. Callers that share a
/// snapshot should go through [`LettingsSnapshot::transition`], which applies a
/// command to a copy and hands back the new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LettingsSnapshot {
    #[serde(default)]
    applicants: Vec<Applicant>,
    #[serde(default)]
    properties: Vec<Property>,
    #[serde(default, rename = "manual_matches")]
    matches: Vec<ManualMatch>,
    #[serde(default)]
    archived_matches: Vec<ArchivedMatch>,
    #[serde(default)]
    sequence: u64,
    #[serde(default, rename = "lastSaved", skip_serializing_if = "Option::is_none")]
    last_saved: Option<DateTime<Utc>>,
}

impl LettingsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `command` to a copy of this snapshot, returning the new snapshot and the
    /// command's output. `self` is never modified.
    pub fn transition<T, F>(&self, command: F) -> Result<(Self, T), LettingsError>
    where
        F: FnOnce(&mut Self) -> Result<T, LettingsError>,
    {
        let mut next = self.clone();
        let output = command(&mut next)?;
        Ok((next, output))
    }

    pub fn applicants(&self) -> &[Applicant] {
        &self.applicants
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn matches(&self) -> &[ManualMatch] {
        &self.matches
    }

    pub fn archived_matches(&self) -> &[ArchivedMatch] {
        &self.archived_matches
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn set_last_saved(&mut self, saved_at: Option<DateTime<Utc>>) {
        self.last_saved = saved_at;
    }

    pub fn is_empty(&self) -> bool {
        self.applicants.is_empty()
            && self.properties.is_empty()
            && self.matches.is_empty()
            && self.archived_matches.is_empty()
    }

    pub fn find_applicant(&self, id: &ApplicantId) -> Option<&Applicant> {
        self.applicants
            .iter()
            .find(|applicant| &applicant.applicant_id == id)
    }

    pub fn find_property(&self, id: &PropertyId) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| &property.property_id == id)
    }

    pub fn find_match(&self, id: &MatchId) -> Option<&ManualMatch> {
        self.matches.iter().find(|record| &record.match_id == id)
    }

    pub fn find_archived_match(&self, id: &MatchId) -> Option<&ArchivedMatch> {
        self.archived_matches
            .iter()
            .find(|archived| &archived.record.match_id == id)
    }

    pub fn active_match_for_applicant(&self, id: &ApplicantId) -> Option<&ManualMatch> {
        self.matches.iter().find(|record| &record.applicant_id == id)
    }

    pub fn active_match_for_property(&self, id: &PropertyId) -> Option<&ManualMatch> {
        self.matches.iter().find(|record| &record.property_id == id)
    }

    pub fn add_applicant(
        &mut self,
        draft: ApplicantDraft,
        now: DateTime<Utc>,
    ) -> Result<Applicant, LettingsError> {
        let details = draft.validated()?;
        let applicant = Applicant {
            applicant_id: ApplicantId(self.allocate_id(ApplicantId::PREFIX)),
            details,
            status: ApplicantStatus::Active,
            created_at: now,
            last_updated: now,
        };

        self.applicants.push(applicant.clone());
        Ok(applicant)
    }

    /// Replaces the editable fields, keeping id, status and creation time.
    pub fn update_applicant(
        &mut self,
        id: &ApplicantId,
        draft: ApplicantDraft,
        now: DateTime<Utc>,
    ) -> Result<Applicant, LettingsError> {
        let details = draft.validated()?;
        let applicant = self
            .applicants
            .iter_mut()
            .find(|applicant| &applicant.applicant_id == id)
            .ok_or_else(|| LettingsError::applicant_not_found(id))?;

        applicant.details = details;
        applicant.last_updated = now;
        Ok(applicant.clone())
    }

    pub fn remove_applicant(&mut self, id: &ApplicantId) -> Result<Applicant, LettingsError> {
        let index = self
            .applicants
            .iter()
            .position(|applicant| &applicant.applicant_id == id)
            .ok_or_else(|| LettingsError::applicant_not_found(id))?;

        if let Some(record) = self.active_match_for_applicant(id) {
            return Err(LettingsError::Referenced {
                kind: EntityKind::Applicant,
                id: id.to_string(),
                match_id: record.match_id.clone(),
            });
        }

        Ok(self.applicants.remove(index))
    }

    pub fn add_property(
        &mut self,
        draft: PropertyDraft,
        now: DateTime<Utc>,
    ) -> Result<Property, LettingsError> {
        let details = draft.validated()?;
        let property = Property {
            property_id: PropertyId(self.allocate_id(PropertyId::PREFIX)),
            details,
            status: PropertyStatus::Available,
            created_at: now,
            last_updated: now,
        };

        self.properties.push(property.clone());
        Ok(property)
    }

    pub fn update_property(
        &mut self,
        id: &PropertyId,
        draft: PropertyDraft,
        now: DateTime<Utc>,
    ) -> Result<Property, LettingsError> {
        let details = draft.validated()?;
        let property = self
            .properties
            .iter_mut()
            .find(|property| &property.property_id == id)
            .ok_or_else(|| LettingsError::property_not_found(id))?;

        property.details = details;
        property.last_updated = now;
        Ok(property.clone())
    }

    pub fn remove_property(&mut self, id: &PropertyId) -> Result<Property, LettingsError> {
        let index = self
            .properties
            .iter()
            .position(|property| &property.property_id == id)
            .ok_or_else(|| LettingsError::property_not_found(id))?;

        if let Some(record) = self.active_match_for_property(id) {
            return Err(LettingsError::Referenced {
                kind: EntityKind::Property,
                id: id.to_string(),
                match_id: record.match_id.clone(),
            });
        }

        Ok(self.properties.remove(index))
    }

    // Ids loaded from older data may already occupy a sequence number.
    pub(crate) fn allocate_id(&mut self, prefix: &str) -> String {
        loop {
            self.sequence += 1;
            let candidate = format!("{prefix}-{:06}", self.sequence);
            if !self.id_in_use(&candidate) {
                return candidate;
            }
        }
    }

    fn id_in_use(&self, candidate: &str) -> bool {
        self.applicants
            .iter()
            .any(|applicant| applicant.applicant_id.as_str() == candidate)
            || self
                .properties
                .iter()
                .any(|property| property.property_id.as_str() == candidate)
            || self
                .matches
                .iter()
                .any(|record| record.match_id.as_str() == candidate)
            || self
                .archived_matches
                .iter()
                .any(|archived| archived.record.match_id.as_str() == candidate)
    }

    pub(crate) fn match_index(&self, id: &MatchId) -> Option<usize> {
        self.matches.iter().position(|record| &record.match_id == id)
    }

    pub(crate) fn match_mut(&mut self, id: &MatchId) -> Result<&mut ManualMatch, LettingsError> {
        self.matches
            .iter_mut()
            .find(|record| &record.match_id == id)
            .ok_or_else(|| LettingsError::match_not_found(id))
    }

    pub(crate) fn matches_mut(&mut self) -> &mut Vec<ManualMatch> {
        &mut self.matches
    }

    pub(crate) fn archived_matches_mut(&mut self) -> &mut Vec<ArchivedMatch> {
        &mut self.archived_matches
    }

    pub(crate) fn set_applicant_status(&mut self, id: &ApplicantId, status: ApplicantStatus) {
        if let Some(applicant) = self
            .applicants
            .iter_mut()
            .find(|applicant| &applicant.applicant_id == id)
        {
            applicant.status = status;
        }
    }

    pub(crate) fn set_property_status(&mut self, id: &PropertyId, status: PropertyStatus) {
        if let Some(property) = self
            .properties
            .iter_mut()
            .find(|property| &property.property_id == id)
        {
            property.status = status;
        }
    }
}
