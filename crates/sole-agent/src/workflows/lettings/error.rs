use super::domain::{ApplicantId, EntityKind, MatchId, PropertyId};

/// Validation failures raised by lettings commands. A failed command never alters state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LettingsError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("applicant {applicant_id} is already matched to property {property_id}")]
    AlreadyMatched {
        applicant_id: ApplicantId,
        property_id: PropertyId,
    },
    #[error("applicant {0} is already matched to another property")]
    ApplicantUnavailable(ApplicantId),
    #[error("property {0} is already matched to another applicant")]
    PropertyUnavailable(PropertyId),
    #[error("cannot remove {kind} {id} while match {match_id} references it")]
    Referenced {
        kind: EntityKind,
        id: String,
        match_id: MatchId,
    },
    #[error("unknown progression stage '{0}'")]
    UnknownStage(String),
    #[error("checklist task slot {0} is outside 1..=3")]
    InvalidTaskSlot(u8),
    #[error("invalid {field}: {reason}")]
    InvalidRecord { field: &'static str, reason: String },
}

impl LettingsError {
    pub(crate) fn applicant_not_found(id: &ApplicantId) -> Self {
        Self::NotFound {
            kind: EntityKind::Applicant,
            id: id.to_string(),
        }
    }

    pub(crate) fn property_not_found(id: &PropertyId) -> Self {
        Self::NotFound {
            kind: EntityKind::Property,
            id: id.to_string(),
        }
    }

    pub(crate) fn match_not_found(id: &MatchId) -> Self {
        Self::NotFound {
            kind: EntityKind::Match,
            id: id.to_string(),
        }
    }
}
