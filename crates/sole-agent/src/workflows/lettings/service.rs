use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::archive::ArchivedMatch;
use super::board::{
    ApplicantSortKey, LaneBoard, ListOrder, PipelineSummary, PropertySortKey, StorageInfo,
};
use super::domain::{
    Applicant, ApplicantDraft, ApplicantId, Lane, MatchId, Property, PropertyDraft, PropertyId,
};
use super::error::LettingsError;
use super::export::ExportTables;
use super::matching::ManualMatch;
use super::persistence::{SnapshotStore, StoreError};
use super::pipeline::{StageId, StageProgress, TaskSlot};
use super::progression::{ChecklistToggle, StageChange};
use super::store::LettingsSnapshot;

/// Command/query façade over the current snapshot.
///
/// There is exactly one writer at a time: each command clones the current
/// snapshot, applies itself to the clone and publishes the clone only if it
/// succeeded. Readers holding an earlier `Arc` keep a consistent view.
pub struct LettingsService<S> {
    store: Arc<S>,
    current: Mutex<Arc<LettingsSnapshot>>,
    persist_failed: AtomicBool,
    clock: fn() -> DateTime<Utc>,
}

impl<S> LettingsService<S>
where
    S: SnapshotStore + 'static,
{
    /// Loads the persisted snapshot, or starts empty when the store has none.
    pub fn open(store: Arc<S>) -> Result<Self, StoreError> {
        let snapshot = match store.load()? {
            Some(snapshot) => {
                info!(
                    applicants = snapshot.applicants().len(),
                    properties = snapshot.properties().len(),
                    matches = snapshot.matches().len(),
                    "loaded lettings snapshot"
                );
                snapshot
            }
            None => LettingsSnapshot::new(),
        };

        Ok(Self::with_snapshot(store, snapshot))
    }

    pub fn with_snapshot(store: Arc<S>, snapshot: LettingsSnapshot) -> Self {
        Self {
            store,
            current: Mutex::new(Arc::new(snapshot)),
            persist_failed: AtomicBool::new(false),
            clock: Utc::now,
        }
    }

    /// Replaces the time source, mainly so tests get stable timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn snapshot(&self) -> Arc<LettingsSnapshot> {
        Arc::clone(&self.current.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// True when the most recent save attempt failed.
    pub fn last_persist_failed(&self) -> bool {
        self.persist_failed.load(Ordering::Acquire)
    }

    fn commit<T, F>(&self, command: F) -> Result<T, LettingsError>
    where
        F: FnOnce(&mut LettingsSnapshot, DateTime<Utc>) -> Result<T, LettingsError>,
    {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let now = (self.clock)();
        let (mut next, output) = current.transition(|snapshot| command(snapshot, now))?;

        if self.store.is_durable() {
            let previous_saved = next.last_saved();
            next.set_last_saved(Some(now));
            match self.store.save(&next) {
                Ok(()) => self.persist_failed.store(false, Ordering::Release),
                Err(err) => {
                    warn!(error = %err, "failed to persist lettings snapshot");
                    next.set_last_saved(previous_saved);
                    self.persist_failed.store(true, Ordering::Release);
                }
            }
        }

        *current = Arc::new(next);
        Ok(output)
    }

    pub fn add_applicant(&self, draft: ApplicantDraft) -> Result<Applicant, LettingsError> {
        let applicant = self.commit(|snapshot, now| snapshot.add_applicant(draft, now))?;
        info!(applicant_id = %applicant.applicant_id, "applicant added");
        Ok(applicant)
    }

    pub fn update_applicant(
        &self,
        id: &ApplicantId,
        draft: ApplicantDraft,
    ) -> Result<Applicant, LettingsError> {
        let applicant = self.commit(|snapshot, now| snapshot.update_applicant(id, draft, now))?;
        debug!(applicant_id = %id, "applicant updated");
        Ok(applicant)
    }

    pub fn remove_applicant(&self, id: &ApplicantId) -> Result<Applicant, LettingsError> {
        let applicant = self.commit(|snapshot, _| snapshot.remove_applicant(id))?;
        info!(applicant_id = %id, "applicant removed");
        Ok(applicant)
    }

    pub fn add_property(&self, draft: PropertyDraft) -> Result<Property, LettingsError> {
        let property = self.commit(|snapshot, now| snapshot.add_property(draft, now))?;
        info!(property_id = %property.property_id, "property added");
        Ok(property)
    }

    pub fn update_property(
        &self,
        id: &PropertyId,
        draft: PropertyDraft,
    ) -> Result<Property, LettingsError> {
        let property = self.commit(|snapshot, now| snapshot.update_property(id, draft, now))?;
        debug!(property_id = %id, "property updated");
        Ok(property)
    }

    pub fn remove_property(&self, id: &PropertyId) -> Result<Property, LettingsError> {
        let property = self.commit(|snapshot, _| snapshot.remove_property(id))?;
        info!(property_id = %id, "property removed");
        Ok(property)
    }

    pub fn create_match(
        &self,
        applicant_id: &ApplicantId,
        property_id: &PropertyId,
    ) -> Result<ManualMatch, LettingsError> {
        let record =
            self.commit(|snapshot, now| snapshot.create_match(applicant_id, property_id, now))?;
        info!(
            match_id = %record.match_id,
            applicant_id = %applicant_id,
            property_id = %property_id,
            "match created"
        );
        Ok(record)
    }

    pub fn remove_match(&self, match_id: &MatchId) -> Result<ManualMatch, LettingsError> {
        let record = self.commit(|snapshot, _| snapshot.remove_match(match_id))?;
        info!(match_id = %match_id, "match removed");
        Ok(record)
    }

    pub fn archive_match(&self, match_id: &MatchId) -> Result<ArchivedMatch, LettingsError> {
        let archived = self.commit(|snapshot, now| snapshot.archive_match(match_id, now))?;
        info!(
            match_id = %match_id,
            applicant_stage = %archived.record.applicant_stage,
            property_stage = %archived.record.property_stage,
            "match archived"
        );
        Ok(archived)
    }

    /// `stage` is the wire name of a stage (`let_agreed`); anything else is rejected
    /// before the match is looked up.
    pub fn update_stage(
        &self,
        match_id: &MatchId,
        stage: &str,
        lane: Lane,
    ) -> Result<StageChange, LettingsError> {
        let stage: StageId = stage.parse()?;
        let change =
            self.commit(|snapshot, now| snapshot.update_stage(match_id, stage, lane, now))?;
        debug!(
            match_id = %match_id,
            lane = %lane,
            from = %change.previous,
            to = %change.stage,
            changed = change.changed,
            "stage updated"
        );
        Ok(change)
    }

    pub fn toggle_checklist_task(
        &self,
        match_id: &MatchId,
        stage: &str,
        slot: u8,
    ) -> Result<ChecklistToggle, LettingsError> {
        let stage: StageId = stage.parse()?;
        let slot = TaskSlot::new(slot)?;
        let toggle = self.commit(|snapshot, now| {
            snapshot.toggle_checklist_task(match_id, stage, slot, now)
        })?;
        debug!(
            match_id = %match_id,
            stage = %stage,
            slot = slot.get(),
            done = toggle.done,
            "checklist task toggled"
        );
        Ok(toggle)
    }

    pub fn set_notes(
        &self,
        match_id: &MatchId,
        notes: impl Into<String>,
    ) -> Result<ManualMatch, LettingsError> {
        let notes = notes.into();
        let record = self.commit(|snapshot, now| snapshot.set_notes(match_id, notes, now))?;
        debug!(match_id = %match_id, "notes updated");
        Ok(record)
    }

    pub fn list_applicants(&self) -> Vec<Applicant> {
        self.snapshot().applicants().to_vec()
    }

    pub fn list_properties(&self) -> Vec<Property> {
        self.snapshot().properties().to_vec()
    }

    pub fn list_matches(&self) -> Vec<ManualMatch> {
        self.snapshot().matches().to_vec()
    }

    pub fn list_archived_matches(&self) -> Vec<ArchivedMatch> {
        self.snapshot().archived_matches().to_vec()
    }

    pub fn find_applicant(&self, id: &ApplicantId) -> Option<Applicant> {
        self.snapshot().find_applicant(id).cloned()
    }

    pub fn find_property(&self, id: &PropertyId) -> Option<Property> {
        self.snapshot().find_property(id).cloned()
    }

    pub fn find_match(&self, id: &MatchId) -> Option<ManualMatch> {
        self.snapshot().find_match(id).cloned()
    }

    pub fn stage_progress(
        &self,
        match_id: &MatchId,
        stage: &str,
    ) -> Result<StageProgress, LettingsError> {
        let stage: StageId = stage.parse()?;
        self.snapshot().stage_progress(match_id, stage)
    }

    pub fn search_applicants(
        &self,
        term: &str,
        order: ListOrder<ApplicantSortKey>,
    ) -> Vec<Applicant> {
        self.snapshot()
            .search_applicants(term, order)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn search_properties(
        &self,
        term: &str,
        order: ListOrder<PropertySortKey>,
    ) -> Vec<Property> {
        self.snapshot()
            .search_properties(term, order)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn lane_board(&self, lane: Lane, filter: Option<&str>) -> LaneBoard {
        self.snapshot().lane_board(lane, filter)
    }

    pub fn pipeline_summary(&self) -> PipelineSummary {
        self.snapshot().pipeline_summary()
    }

    pub fn storage_info(&self) -> StorageInfo {
        self.snapshot().storage_info()
    }

    pub fn export_tables(&self) -> ExportTables {
        self.snapshot().export_tables()
    }

    /// Drops the persisted blob and resets to an empty snapshot.
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.clear()?;
        *current = Arc::new(LettingsSnapshot::new());
        warn!("lettings data cleared");
        Ok(())
    }
}
