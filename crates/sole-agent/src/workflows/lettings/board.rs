use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    Applicant, ApplicantId, ApplicantStatus, Lane, MatchId, Property, PropertyId, PropertyStatus,
};
use super::error::LettingsError;
use super::matching::ManualMatch;
use super::pipeline::{StageId, StageProgress};
use super::store::LettingsSnapshot;

/// A match as it appears in a lane column.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCard {
    pub match_id: MatchId,
    pub applicant_id: ApplicantId,
    pub applicant_name: String,
    pub property_id: PropertyId,
    pub property_address: String,
    pub postcode: String,
    pub stage: StageId,
    pub progress: StageProgress,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageColumn {
    pub stage: StageId,
    pub stage_label: &'static str,
    pub color: &'static str,
    pub cards: Vec<MatchCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaneBoard {
    pub lane: Lane,
    pub columns: Vec<StageColumn>,
}

impl LaneBoard {
    pub fn column(&self, stage: StageId) -> Option<&StageColumn> {
        self.columns.iter().find(|column| column.stage == stage)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageCountEntry {
    pub stage: StageId,
    pub stage_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicantCounts {
    pub active: usize,
    pub matched: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PropertyCounts {
    pub available: usize,
    pub matched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub applicant_lane: Vec<StageCountEntry>,
    pub property_lane: Vec<StageCountEntry>,
    pub active_matches: usize,
    pub archived_matches: usize,
    pub applicants: ApplicantCounts,
    pub properties: PropertyCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub has_data: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub applicant_count: usize,
    pub property_count: usize,
    pub match_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = LettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(LettingsError::InvalidRecord {
                field: "dir",
                reason: format!("'{value}' is not one of asc, desc"),
            }),
        }
    }
}

/// Column an applicant list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantSortKey {
    #[default]
    Name,
    BudgetMax,
    MonthlyIncome,
    PreferredMoveIn,
}

impl ApplicantSortKey {
    fn compare(self, left: &Applicant, right: &Applicant) -> Ordering {
        let (left, right) = (&left.details, &right.details);
        match self {
            Self::Name => left.name.to_lowercase().cmp(&right.name.to_lowercase()),
            Self::BudgetMax => left
                .preferences
                .budget_max
                .cmp(&right.preferences.budget_max),
            Self::MonthlyIncome => left
                .finances
                .monthly_income
                .cmp(&right.finances.monthly_income),
            Self::PreferredMoveIn => left
                .preferences
                .preferred_move_in
                .cmp(&right.preferences.preferred_move_in),
        }
    }
}

impl FromStr for ApplicantSortKey {
    type Err = LettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "budget_max" => Ok(Self::BudgetMax),
            "monthly_income" => Ok(Self::MonthlyIncome),
            "preferred_move_in" => Ok(Self::PreferredMoveIn),
            _ => Err(LettingsError::InvalidRecord {
                field: "sort",
                reason: format!(
                    "'{value}' is not one of name, budget_max, monthly_income, preferred_move_in"
                ),
            }),
        }
    }
}

/// Column a property list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySortKey {
    #[default]
    Address,
    Rent,
    LastUpdated,
}

impl PropertySortKey {
    fn compare(self, left: &Property, right: &Property) -> Ordering {
        match self {
            Self::Address => left
                .address()
                .to_lowercase()
                .cmp(&right.address().to_lowercase()),
            Self::Rent => left.details.rent.cmp(&right.details.rent),
            Self::LastUpdated => left.last_updated.cmp(&right.last_updated),
        }
    }
}

impl FromStr for PropertySortKey {
    type Err = LettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "address" => Ok(Self::Address),
            "rent" => Ok(Self::Rent),
            "last_updated" => Ok(Self::LastUpdated),
            _ => Err(LettingsError::InvalidRecord {
                field: "sort",
                reason: format!("'{value}' is not one of address, rent, last_updated"),
            }),
        }
    }
}

/// Ordering for a filtered list. Ties keep insertion order in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOrder<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K> ListOrder<K> {
    pub fn new(key: K, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(term)
}

fn normalise_term(term: &str) -> String {
    term.trim().to_lowercase()
}

impl LettingsSnapshot {
    /// Groups active matches into stage columns for one lane.
    ///
    /// Matches whose applicant or property no longer resolves are left off the board,
    /// and `filter` narrows cards by applicant name, address or postcode.
    pub fn lane_board(&self, lane: Lane, filter: Option<&str>) -> LaneBoard {
        let cards: Vec<MatchCard> = self
            .search_matches(filter.unwrap_or_default())
            .into_iter()
            .filter_map(|record| self.card_for(record, lane))
            .collect();

        let columns = StageId::ordered()
            .into_iter()
            .map(|stage| StageColumn {
                stage,
                stage_label: stage.label(),
                color: stage.color(),
                cards: cards
                    .iter()
                    .filter(|card| card.stage == stage)
                    .cloned()
                    .collect(),
            })
            .collect();

        LaneBoard { lane, columns }
    }

    fn card_for(&self, record: &ManualMatch, lane: Lane) -> Option<MatchCard> {
        let applicant = self.find_applicant(&record.applicant_id)?;
        let property = self.find_property(&record.property_id)?;
        Some(MatchCard {
            match_id: record.match_id.clone(),
            applicant_id: applicant.applicant_id.clone(),
            applicant_name: applicant.name().to_string(),
            property_id: property.property_id.clone(),
            property_address: property.address().to_string(),
            postcode: property.postcode().to_string(),
            stage: record.lane_stage(lane),
            progress: record.lane_progress(lane),
            updated_at: record.updated_at,
        })
    }

    pub fn pipeline_summary(&self) -> PipelineSummary {
        let lane_counts = |lane: Lane| -> Vec<StageCountEntry> {
            StageId::ordered()
                .into_iter()
                .map(|stage| StageCountEntry {
                    stage,
                    stage_label: stage.label(),
                    count: self
                        .matches()
                        .iter()
                        .filter(|record| record.lane_stage(lane) == stage)
                        .count(),
                })
                .collect()
        };

        let mut applicants = ApplicantCounts::default();
        for applicant in self.applicants() {
            match applicant.status {
                ApplicantStatus::Active => applicants.active += 1,
                ApplicantStatus::Matched => applicants.matched += 1,
            }
        }

        let mut properties = PropertyCounts::default();
        for property in self.properties() {
            match property.status {
                PropertyStatus::Available => properties.available += 1,
                PropertyStatus::Matched => properties.matched += 1,
            }
        }

        PipelineSummary {
            applicant_lane: lane_counts(Lane::Applicant),
            property_lane: lane_counts(Lane::Property),
            active_matches: self.matches().len(),
            archived_matches: self.archived_matches().len(),
            applicants,
            properties,
        }
    }

    pub fn storage_info(&self) -> StorageInfo {
        StorageInfo {
            has_data: self.last_saved().is_some(),
            last_saved: self.last_saved(),
            applicant_count: self.applicants().len(),
            property_count: self.properties().len(),
            match_count: self.matches().len(),
        }
    }

    /// Case-insensitive search over name, email, phone, preferred areas and notes,
    /// ordered by `order`. Text columns compare without regard to case.
    pub fn search_applicants(
        &self,
        term: &str,
        order: ListOrder<ApplicantSortKey>,
    ) -> Vec<&Applicant> {
        let term = normalise_term(term);
        let mut found: Vec<&Applicant> = self
            .applicants()
            .iter()
            .filter(|applicant| {
                let details = &applicant.details;
                term.is_empty()
                    || contains_term(&details.name, &term)
                    || contains_term(&details.email, &term)
                    || contains_term(&details.phone, &term)
                    || contains_term(&details.preferences.preferred_areas.join(" "), &term)
                    || contains_term(&details.preferences.notes, &term)
            })
            .collect();
        found.sort_by(|left, right| order.direction.apply(order.key.compare(left, right)));
        found
    }

    pub fn search_properties(
        &self,
        term: &str,
        order: ListOrder<PropertySortKey>,
    ) -> Vec<&Property> {
        let term = normalise_term(term);
        let mut found: Vec<&Property> = self
            .properties()
            .iter()
            .filter(|property| {
                let details = &property.details;
                term.is_empty()
                    || contains_term(&details.address, &term)
                    || contains_term(&details.postcode, &term)
                    || contains_term(&details.name, &term)
            })
            .collect();
        found.sort_by(|left, right| order.direction.apply(order.key.compare(left, right)));
        found
    }

    pub fn search_matches(&self, term: &str) -> Vec<&ManualMatch> {
        let term = normalise_term(term);
        self.matches()
            .iter()
            .filter(|record| {
                if term.is_empty() {
                    return true;
                }
                let applicant_hit = self
                    .find_applicant(&record.applicant_id)
                    .is_some_and(|applicant| contains_term(applicant.name(), &term));
                let property_hit = self
                    .find_property(&record.property_id)
                    .is_some_and(|property| {
                        contains_term(property.address(), &term)
                            || contains_term(property.postcode(), &term)
                    });
                applicant_hit || property_hit
            })
            .collect()
    }
}
