//! Match lifecycle and dual-lane progression for a sole lettings agency.
//!
//! Applicants and properties are paired one-to-one into manual matches. Each
//! match advances through a fixed five-stage pipeline on two independent lanes
//! (the applicant's side and the property's side) with a three-task checklist
//! per stage, and is finally archived. All state lives in one
//! [`LettingsSnapshot`] value that is swapped atomically by [`LettingsService`]
//! and saved through a [`SnapshotStore`] after every committed command.

pub mod archive;
pub mod board;
pub mod domain;
pub mod error;
pub mod export;
pub mod matching;
pub mod persistence;
pub mod pipeline;
pub mod progression;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use archive::{ArchivedMatch, ARCHIVED_FINAL_STAGE};
pub use board::{
    ApplicantCounts, ApplicantSortKey, LaneBoard, ListOrder, MatchCard, PipelineSummary,
    PropertyCounts, PropertySortKey, SortDirection, StageColumn, StageCountEntry, StorageInfo,
};
pub use domain::{
    Applicant, ApplicantDraft, ApplicantId, ApplicantStatus, EntityKind, FinancialProfile,
    HouseholdComposition, Lane, MatchId, Property, PropertyDraft, PropertyId, PropertyStatus,
    SearchPreferences,
};
pub use error::LettingsError;
pub use export::{ExportSection, ExportTables};
pub use matching::ManualMatch;
pub use persistence::{
    JsonFileSnapshotStore, MemorySnapshotStore, NoopSnapshotStore, SnapshotStore, StoreError,
};
pub use pipeline::{
    Checklist, ProgressionBlueprint, StageChecklist, StageDefinition, StageId, StageProgress,
    TaskSlot, TASKS_PER_STAGE,
};
pub use progression::{ChecklistToggle, StageChange};
pub use router::lettings_router;
pub use service::LettingsService;
pub use store::LettingsSnapshot;
