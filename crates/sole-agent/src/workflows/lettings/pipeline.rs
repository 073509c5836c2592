use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::LettingsError;

/// Every stage carries exactly this many canonical checklist tasks.
pub const TASKS_PER_STAGE: usize = 3;

/// Steps of the deal pipeline, declared in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Matched,
    Viewing,
    Offer,
    LetAgreed,
    Completed,
}

impl StageId {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Matched,
            Self::Viewing,
            Self::Offer,
            Self::LetAgreed,
            Self::Completed,
        ]
    }

    pub const fn initial() -> Self {
        Self::Matched
    }

    pub const fn terminal() -> Self {
        Self::Completed
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Viewing => "viewing",
            Self::Offer => "offer",
            Self::LetAgreed => "let_agreed",
            Self::Completed => "completed",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::Viewing => "Viewing",
            Self::Offer => "Offer",
            Self::LetAgreed => "Let Agreed",
            Self::Completed => "Completed",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Matched => "#3B82F6",
            Self::Viewing => "#F59E0B",
            Self::Offer => "#8B5CF6",
            Self::LetAgreed => "#10B981",
            Self::Completed => "#6B7280",
        }
    }

    pub const fn tasks(self) -> [&'static str; TASKS_PER_STAGE] {
        match self {
            Self::Matched => [
                "Initial contact made with applicant",
                "Property details sent to applicant",
                "Landlord notified of potential match",
            ],
            Self::Viewing => [
                "Viewing appointment scheduled",
                "Property keys arranged",
                "Viewing completed and feedback received",
            ],
            Self::Offer => [
                "Offer submitted to landlord",
                "References requested from applicant",
                "Offer negotiation in progress",
            ],
            Self::LetAgreed => [
                "Offer accepted by landlord",
                "Tenancy agreement prepared",
                "Deposit and first month rent collected",
            ],
            Self::Completed => [
                "Keys handed over to tenant",
                "Inventory completed and signed",
                "Move-in process completed",
            ],
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = LettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Self::ordered()
            .into_iter()
            .find(|stage| stage.as_str() == needle)
            .ok_or_else(|| LettingsError::UnknownStage(value.to_string()))
    }
}

/// Display metadata and canonical tasks for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDefinition {
    pub stage_id: StageId,
    pub name: &'static str,
    pub color: &'static str,
    pub tasks: [&'static str; TASKS_PER_STAGE],
}

impl StageDefinition {
    pub fn for_stage(stage: StageId) -> Self {
        Self {
            stage_id: stage,
            name: stage.label(),
            color: stage.color(),
            tasks: stage.tasks(),
        }
    }
}

/// The fixed, process-wide stage set.
#[derive(Debug)]
pub struct ProgressionBlueprint {
    stages: Vec<StageDefinition>,
}

impl ProgressionBlueprint {
    pub fn standard() -> Self {
        Self {
            stages: StageId::ordered()
                .into_iter()
                .map(StageDefinition::for_stage)
                .collect(),
        }
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn definition(&self, stage: StageId) -> Option<&StageDefinition> {
        self.stages.iter().find(|definition| definition.stage_id == stage)
    }
}

/// Position of a task within a stage's checklist, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskSlot(u8);

impl TaskSlot {
    pub const ALL: [TaskSlot; TASKS_PER_STAGE] = [TaskSlot(1), TaskSlot(2), TaskSlot(3)];

    pub fn new(slot: u8) -> Result<Self, LettingsError> {
        if (1..=TASKS_PER_STAGE as u8).contains(&slot) {
            Ok(Self(slot))
        } else {
            Err(LettingsError::InvalidTaskSlot(slot))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn description(self, stage: StageId) -> &'static str {
        stage.tasks()[usize::from(self.0 - 1)]
    }
}

/// Completion flags for one stage, serialised as `task1`..`task3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageChecklist {
    pub task1: bool,
    pub task2: bool,
    pub task3: bool,
}

impl StageChecklist {
    pub fn is_done(&self, slot: TaskSlot) -> bool {
        match slot.get() {
            1 => self.task1,
            2 => self.task2,
            _ => self.task3,
        }
    }

    fn flag_mut(&mut self, slot: TaskSlot) -> &mut bool {
        match slot.get() {
            1 => &mut self.task1,
            2 => &mut self.task2,
            _ => &mut self.task3,
        }
    }

    /// Flips the flag and returns its new value.
    pub fn toggle(&mut self, slot: TaskSlot) -> bool {
        let flag = self.flag_mut(slot);
        *flag = !*flag;
        *flag
    }

    pub fn completed(&self) -> usize {
        TaskSlot::ALL
            .into_iter()
            .filter(|slot| self.is_done(*slot))
            .count()
    }
}

/// Completed vs. total canonical tasks for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageProgress {
    pub completed: usize,
    pub total: usize,
}

impl StageProgress {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

/// Per-match checklist keyed by stage. Stages with no entry read as all-false.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checklist(BTreeMap<StageId, StageChecklist>);

impl Checklist {
    /// A checklist with an explicit all-false entry for every stage.
    pub fn fresh() -> Self {
        Self(
            StageId::ordered()
                .into_iter()
                .map(|stage| (stage, StageChecklist::default()))
                .collect(),
        )
    }

    pub fn stage(&self, stage: StageId) -> StageChecklist {
        self.0.get(&stage).copied().unwrap_or_default()
    }

    pub fn is_done(&self, stage: StageId, slot: TaskSlot) -> bool {
        self.stage(stage).is_done(slot)
    }

    pub fn toggle(&mut self, stage: StageId, slot: TaskSlot) -> bool {
        self.0.entry(stage).or_default().toggle(slot)
    }

    pub fn progress(&self, stage: StageId) -> StageProgress {
        StageProgress {
            completed: self.stage(stage).completed(),
            total: TASKS_PER_STAGE,
        }
    }
}
