use super::common::*;

use crate::workflows::lettings::{
    ApplicantId, ApplicantStatus, EntityKind, Lane, LettingsError, ManualMatch, MatchId,
    PropertyId, PropertyStatus, StageId, StageProgress,
};

#[test]
fn create_match_couples_statuses_and_starts_both_lanes_at_matched() {
    let (snapshot, record) = seeded_match();

    let applicant = snapshot
        .find_applicant(&record.applicant_id)
        .expect("applicant present");
    let property = snapshot
        .find_property(&record.property_id)
        .expect("property present");

    assert_eq!(applicant.status, ApplicantStatus::Matched);
    assert_eq!(property.status, PropertyStatus::Matched);
    assert_eq!(record.match_id.as_str(), "match-000003");
    assert_eq!(record.applicant_stage, StageId::Matched);
    assert_eq!(record.property_stage, StageId::Matched);
    assert_eq!(record.current_stage, StageId::Matched);
    assert_eq!(record.matched_at, later(5));
    assert!(record.notes.is_empty());

    let linking: Vec<&ManualMatch> = snapshot
        .matches()
        .iter()
        .filter(|candidate| candidate.links(&applicant.applicant_id, &property.property_id))
        .collect();
    assert_eq!(linking.len(), 1);
}

#[test]
fn fresh_match_has_an_empty_checklist_for_every_stage() {
    let (_, record) = seeded_match();

    for stage in StageId::ordered() {
        assert_eq!(
            record.stage_progress(stage),
            StageProgress {
                completed: 0,
                total: 3
            }
        );
    }
}

#[test]
fn second_identical_pairing_is_rejected() {
    let (mut snapshot, record) = seeded_match();
    let before = snapshot.clone();

    let err = snapshot
        .create_match(&record.applicant_id, &record.property_id, later(10))
        .expect_err("duplicate pairing");

    assert_eq!(
        err,
        LettingsError::AlreadyMatched {
            applicant_id: record.applicant_id.clone(),
            property_id: record.property_id.clone(),
        }
    );
    assert_eq!(snapshot, before);
}

#[test]
fn matched_applicant_or_property_cannot_join_a_second_match() {
    let (mut snapshot, record) = seeded_match();
    let spare_property = snapshot
        .add_property(property_at("4 Elm Rd", "N1 2BB"), later(6))
        .expect("property added");
    let spare_applicant = snapshot
        .add_applicant(applicant_named("Omar"), later(6))
        .expect("applicant added");

    assert_eq!(
        snapshot.create_match(&record.applicant_id, &spare_property.property_id, later(7)),
        Err(LettingsError::ApplicantUnavailable(record.applicant_id.clone()))
    );
    assert_eq!(
        snapshot.create_match(&spare_applicant.applicant_id, &record.property_id, later(7)),
        Err(LettingsError::PropertyUnavailable(record.property_id.clone()))
    );
    assert_eq!(snapshot.matches().len(), 1);
}

#[test]
fn unknown_sides_are_reported_before_anything_else() {
    let (mut snapshot, _, property) = seeded();

    assert_eq!(
        snapshot.create_match(&ApplicantId::new("app-404"), &property.property_id, later(1)),
        Err(LettingsError::NotFound {
            kind: EntityKind::Applicant,
            id: "app-404".to_string(),
        })
    );
    assert!(snapshot.matches().is_empty());
    assert_eq!(
        snapshot
            .find_property(&property.property_id)
            .map(|property| property.status),
        Some(PropertyStatus::Available)
    );
}

#[test]
fn removing_a_match_restores_both_records_exactly() {
    let (mut snapshot, applicant, property) = seeded();
    let applicant_before = applicant.clone();
    let property_before = property.clone();

    let record = snapshot
        .create_match(&applicant.applicant_id, &property.property_id, later(5))
        .expect("match created");
    let removed = snapshot
        .remove_match(&record.match_id)
        .expect("match removed");

    assert_eq!(removed, record);
    assert!(snapshot.matches().is_empty());
    assert!(snapshot.archived_matches().is_empty());
    assert_eq!(
        snapshot.find_applicant(&applicant.applicant_id),
        Some(&applicant_before)
    );
    assert_eq!(
        snapshot.find_property(&property.property_id),
        Some(&property_before)
    );
}

#[test]
fn removing_an_unknown_match_fails_without_side_effects() {
    let (mut snapshot, _) = seeded_match();
    let before = snapshot.clone();

    assert_eq!(
        snapshot.remove_match(&MatchId::new("match-404")),
        Err(LettingsError::NotFound {
            kind: EntityKind::Match,
            id: "match-404".to_string(),
        })
    );
    assert_eq!(snapshot, before);
}

#[test]
fn archiving_frees_both_sides_and_records_completed() {
    let (mut snapshot, record) = seeded_match();
    snapshot
        .update_stage(&record.match_id, StageId::Viewing, Lane::Applicant, later(20))
        .expect("stage moved");

    let archived = snapshot
        .archive_match(&record.match_id, later(90))
        .expect("match archived");

    assert_eq!(archived.final_stage, StageId::Completed);
    assert_eq!(archived.archived_at, later(90));
    assert_eq!(archived.stage_at_archive(Lane::Applicant), StageId::Viewing);
    assert!(snapshot.find_match(&record.match_id).is_none());
    assert!(snapshot.find_archived_match(&record.match_id).is_some());
    assert!(snapshot
        .find_applicant(&record.applicant_id)
        .is_some_and(|applicant| applicant.is_available()));
    assert!(snapshot
        .find_property(&record.property_id)
        .is_some_and(|property| property.is_available()));

    assert!(matches!(
        snapshot.archive_match(&record.match_id, later(91)),
        Err(LettingsError::NotFound { .. })
    ));
}

#[test]
fn freed_sides_can_be_matched_again_after_archive() {
    let (mut snapshot, record) = seeded_match();
    snapshot
        .archive_match(&record.match_id, later(30))
        .expect("archived");

    let again = snapshot
        .create_match(&record.applicant_id, &record.property_id, later(40))
        .expect("pair may be matched again");

    assert_ne!(again.match_id, record.match_id);
    assert_eq!(snapshot.matches().len(), 1);
    assert_eq!(snapshot.archived_matches().len(), 1);
}

#[test]
fn legacy_match_records_default_lanes_to_the_combined_stage() {
    let raw = r#"{
        "match_id": "match-1700000000000",
        "applicant_id": "app-1",
        "property_id": "prop-1",
        "matched_at": "2024-11-02T10:00:00Z",
        "current_stage": "offer"
    }"#;

    let record: ManualMatch = serde_json::from_str(raw).expect("legacy match parses");

    assert_eq!(record.applicant_stage, StageId::Offer);
    assert_eq!(record.property_stage, StageId::Offer);
    assert_eq!(record.updated_at, record.matched_at);
    assert_eq!(record.stage_progress(StageId::Offer).completed, 0);
    assert_eq!(record.applicant_id, ApplicantId::new("app-1"));
    assert_eq!(record.property_id, PropertyId::new("prop-1"));
}
