use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::LettingsError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub(crate) const PREFIX: &'static str = $prefix;

            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Stable identifier for an applicant (`app-000001`).
    ApplicantId,
    "app"
);
entity_id!(
    /// Stable identifier for a property (`prop-000001`).
    PropertyId,
    "prop"
);
entity_id!(
    /// Stable identifier for a match (`match-000001`).
    MatchId,
    "match"
);

/// Collection an identifier belongs to, used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Applicant,
    Property,
    Match,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Property => "property",
            Self::Match => "match",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    #[default]
    Active,
    Matched,
}

impl ApplicantStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Matched => "matched",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Available,
    Matched,
}

impl PropertyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Matched => "matched",
        }
    }
}

/// One of the two progress tracks a match advances through; `Both` moves them together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Applicant,
    Property,
    #[default]
    Both,
}

impl Lane {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Property => "property",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Lane {
    type Err = LettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "applicant" => Ok(Self::Applicant),
            "property" => Ok(Self::Property),
            "both" => Ok(Self::Both),
            _ => Err(LettingsError::InvalidRecord {
                field: "lane",
                reason: format!("'{value}' is not one of applicant, property, both"),
            }),
        }
    }
}

/// Household counters captured on the intake form.
///
/// Serialises with a derived `total_children` alongside the counters so saved
/// records keep the intake form's shape; the field is ignored when loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct HouseholdComposition {
    pub is_couple: bool,
    pub other_adults: u8,
    pub female_children_10_15: u8,
    pub male_children_10_15: u8,
    pub female_children_under_10: u8,
    pub male_children_under_10: u8,
}

impl HouseholdComposition {
    pub fn total_children(&self) -> u32 {
        [
            self.female_children_10_15,
            self.male_children_10_15,
            self.female_children_under_10,
            self.male_children_under_10,
        ]
        .iter()
        .map(|count| u32::from(*count))
        .sum()
    }

    pub fn adults(&self) -> u32 {
        1 + u32::from(self.is_couple) + u32::from(self.other_adults)
    }

    pub fn size(&self) -> u32 {
        self.adults() + self.total_children()
    }
}

impl Serialize for HouseholdComposition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("HouseholdComposition", 7)?;
        state.serialize_field("is_couple", &self.is_couple)?;
        state.serialize_field("other_adults", &self.other_adults)?;
        state.serialize_field("female_children_10_15", &self.female_children_10_15)?;
        state.serialize_field("male_children_10_15", &self.male_children_10_15)?;
        state.serialize_field("female_children_under_10", &self.female_children_under_10)?;
        state.serialize_field("male_children_under_10", &self.male_children_under_10)?;
        state.serialize_field("total_children", &self.total_children())?;
        state.end()
    }
}

/// Income, employment and benefit answers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialProfile {
    pub monthly_income: u32,
    pub employment_status: String,
    pub anyone_working: bool,
    pub housing_benefits: bool,
    pub receives_pip_dla: bool,
    pub receives_carers_allowance: bool,
    pub receives_lcwra: bool,
    pub council_assistance: bool,
    pub can_provide_guarantor: bool,
    pub credit_issues: bool,
}

/// What the applicant is looking for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPreferences {
    pub budget_min: u32,
    pub budget_max: u32,
    pub bedrooms: u8,
    pub preferred_areas: Vec<String>,
    pub viewing_availability: String,
    #[serde(deserialize_with = "deserialize_blank_date")]
    pub preferred_move_in: Option<NaiveDate>,
    pub notes: String,
}

// Intake forms submit an empty string when no move-in date was picked.
fn deserialize_blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Editable applicant fields, as submitted by an intake form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u8,
    pub enquired_property: Option<PropertyId>,
    #[serde(flatten)]
    pub household: HouseholdComposition,
    #[serde(flatten)]
    pub finances: FinancialProfile,
    #[serde(flatten)]
    pub preferences: SearchPreferences,
}

impl ApplicantDraft {
    /// Trims free text, drops blank or repeated areas and checks required fields.
    pub fn validated(mut self) -> Result<Self, LettingsError> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.phone = self.phone.trim().to_string();

        if self.name.is_empty() {
            return Err(LettingsError::InvalidRecord {
                field: "name",
                reason: "applicant name is required".to_string(),
            });
        }

        let budget = &self.preferences;
        if budget.budget_max > 0 && budget.budget_min > budget.budget_max {
            return Err(LettingsError::InvalidRecord {
                field: "budget_min",
                reason: format!(
                    "minimum budget {} exceeds maximum budget {}",
                    budget.budget_min, budget.budget_max
                ),
            });
        }

        let mut areas: Vec<String> = Vec::with_capacity(self.preferences.preferred_areas.len());
        for area in self.preferences.preferred_areas.drain(..) {
            let area = area.trim().to_string();
            if !area.is_empty() && !areas.contains(&area) {
                areas.push(area);
            }
        }
        self.preferences.preferred_areas = areas;

        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub applicant_id: ApplicantId,
    #[serde(flatten)]
    pub details: ApplicantDraft,
    #[serde(default)]
    pub status: ApplicantStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Applicant {
    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn household_size(&self) -> u32 {
        self.details.household.size()
    }

    pub fn is_available(&self) -> bool {
        self.status == ApplicantStatus::Active
    }
}

/// Editable property fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDraft {
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub bedrooms: u8,
    pub rent: u32,
    pub property_type: String,
    pub landlord_name: String,
    pub eligibility_cases: Vec<String>,
    pub property_url: Option<String>,
}

impl PropertyDraft {
    pub fn validated(mut self) -> Result<Self, LettingsError> {
        self.name = self.name.trim().to_string();
        self.address = self.address.trim().to_string();
        self.postcode = self.postcode.trim().to_ascii_uppercase();

        if self.address.is_empty() {
            return Err(LettingsError::InvalidRecord {
                field: "address",
                reason: "property address is required".to_string(),
            });
        }
        if self.postcode.is_empty() {
            return Err(LettingsError::InvalidRecord {
                field: "postcode",
                reason: "property postcode is required".to_string(),
            });
        }
        if self.name.is_empty() {
            self.name = self.address.clone();
        }

        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub property_id: PropertyId,
    #[serde(flatten)]
    pub details: PropertyDraft,
    #[serde(default)]
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Property {
    pub fn address(&self) -> &str {
        &self.details.address
    }

    pub fn postcode(&self) -> &str {
        &self.details.postcode
    }

    pub fn is_available(&self) -> bool {
        self.status == PropertyStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_size_counts_lead_partner_adults_and_children() {
        let household = HouseholdComposition {
            is_couple: true,
            other_adults: 1,
            female_children_10_15: 1,
            male_children_under_10: 2,
            ..HouseholdComposition::default()
        };

        assert_eq!(household.total_children(), 3);
        assert_eq!(household.adults(), 3);
        assert_eq!(household.size(), 6);
    }

    #[test]
    fn applicant_draft_requires_a_name() {
        let draft = ApplicantDraft {
            name: "   ".to_string(),
            ..ApplicantDraft::default()
        };

        match draft.validated() {
            Err(LettingsError::InvalidRecord { field, .. }) => assert_eq!(field, "name"),
            other => panic!("expected invalid record, got {other:?}"),
        }
    }

    #[test]
    fn applicant_draft_rejects_inverted_budget() {
        let draft = ApplicantDraft {
            name: "Jane".to_string(),
            preferences: SearchPreferences {
                budget_min: 2000,
                budget_max: 1500,
                ..SearchPreferences::default()
            },
            ..ApplicantDraft::default()
        };

        assert!(matches!(
            draft.validated(),
            Err(LettingsError::InvalidRecord {
                field: "budget_min",
                ..
            })
        ));
    }

    #[test]
    fn applicant_draft_dedupes_preferred_areas() {
        let draft = ApplicantDraft {
            name: " Jane ".to_string(),
            preferences: SearchPreferences {
                preferred_areas: vec![
                    "Hackney".to_string(),
                    " Hackney ".to_string(),
                    "".to_string(),
                    "Camden".to_string(),
                ],
                ..SearchPreferences::default()
            },
            ..ApplicantDraft::default()
        };

        let draft = draft.validated().expect("valid draft");
        assert_eq!(draft.name, "Jane");
        assert_eq!(draft.preferences.preferred_areas, vec!["Hackney", "Camden"]);
    }

    #[test]
    fn property_draft_normalises_postcode_and_defaults_name() {
        let draft = PropertyDraft {
            address: "12 Oak St".to_string(),
            postcode: " e8 1aa".to_string(),
            ..PropertyDraft::default()
        };

        let draft = draft.validated().expect("valid property");
        assert_eq!(draft.postcode, "E8 1AA");
        assert_eq!(draft.name, "12 Oak St");
    }

    #[test]
    fn lane_parses_case_insensitively() {
        assert_eq!("Applicant".parse::<Lane>().expect("lane"), Lane::Applicant);
        assert_eq!("both".parse::<Lane>().expect("lane"), Lane::Both);
        assert!("tenant".parse::<Lane>().is_err());
    }

    #[test]
    fn applicant_round_trips_through_flat_json() {
        let raw = r#"{
            "applicant_id": "app-1712",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "is_couple": true,
            "male_children_under_10": 1,
            "budget_min": 1200,
            "budget_max": 1600,
            "preferred_areas": ["Hackney"],
            "preferred_move_in": "",
            "status": "matched",
            "created_at": "2025-01-01T09:00:00Z",
            "last_updated": "2025-01-02T09:00:00Z"
        }"#;

        let applicant: Applicant = serde_json::from_str(raw).expect("legacy applicant parses");
        assert_eq!(applicant.applicant_id, ApplicantId::new("app-1712"));
        assert_eq!(applicant.status, ApplicantStatus::Matched);
        assert_eq!(applicant.household_size(), 3);
        assert_eq!(applicant.details.preferences.budget_max, 1600);

        let value = serde_json::to_value(&applicant).expect("serializes");
        assert_eq!(value["name"], "Jane Doe");
        assert_eq!(value["status"], "matched");
    }

    #[test]
    fn saved_applicants_carry_total_children() {
        let raw = r#"{
            "applicant_id": "app-1713",
            "name": "Amara Obi",
            "female_children_10_15": 1,
            "male_children_under_10": 2,
            "total_children": 99,
            "created_at": "2025-01-01T09:00:00Z",
            "last_updated": "2025-01-01T09:00:00Z"
        }"#;

        let applicant: Applicant = serde_json::from_str(raw).expect("applicant parses");
        assert_eq!(applicant.details.household.total_children(), 3);

        let value = serde_json::to_value(&applicant).expect("serializes");
        assert_eq!(value["total_children"], 3);
        assert_eq!(value["male_children_under_10"], 2);

        let reloaded: Applicant = serde_json::from_value(value).expect("reloads");
        assert_eq!(reloaded, applicant);
    }
}
