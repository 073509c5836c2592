use super::common::*;

use crate::workflows::lettings::{
    ApplicantId, ApplicantStatus, EntityKind, LettingsError, LettingsSnapshot, PropertyStatus,
};

#[test]
fn new_records_get_sequential_prefixed_ids() {
    let (snapshot, applicant, property) = seeded();

    assert_eq!(applicant.applicant_id.as_str(), "app-000001");
    assert_eq!(property.property_id.as_str(), "prop-000002");
    assert_eq!(applicant.status, ApplicantStatus::Active);
    assert_eq!(property.status, PropertyStatus::Available);
    assert_eq!(applicant.created_at, fixed_now());
    assert_eq!(snapshot.applicants().len(), 1);
    assert_eq!(snapshot.properties().len(), 1);
}

#[test]
fn allocation_skips_ids_already_present_in_loaded_data() {
    let raw = r#"{
        "applicants": [{
            "applicant_id": "app-000001",
            "name": "Imported",
            "created_at": "2024-12-01T10:00:00Z",
            "last_updated": "2024-12-01T10:00:00Z"
        }]
    }"#;
    let mut snapshot: LettingsSnapshot = serde_json::from_str(raw).expect("snapshot parses");

    let added = snapshot
        .add_applicant(applicant_named("Fresh"), fixed_now())
        .expect("applicant added");

    assert_eq!(added.applicant_id.as_str(), "app-000002");
}

#[test]
fn invalid_drafts_leave_the_snapshot_untouched() {
    let (mut snapshot, _, _) = seeded();
    let before = snapshot.clone();

    let err = snapshot
        .add_applicant(applicant_named(""), later(1))
        .expect_err("blank name rejected");
    assert!(matches!(err, LettingsError::InvalidRecord { field: "name", .. }));

    let err = snapshot
        .add_property(property_at("", "E8 1AA"), later(1))
        .expect_err("blank address rejected");
    assert!(matches!(
        err,
        LettingsError::InvalidRecord {
            field: "address",
            ..
        }
    ));

    assert_eq!(snapshot, before);
}

#[test]
fn update_applicant_keeps_identity_status_and_creation_time() {
    let (mut snapshot, record) = seeded_match();
    let mut draft = jane();
    draft.phone = "07700 900999".to_string();

    let updated = snapshot
        .update_applicant(&record.applicant_id, draft, later(30))
        .expect("applicant updated");

    assert_eq!(updated.applicant_id, record.applicant_id);
    assert_eq!(updated.status, ApplicantStatus::Matched);
    assert_eq!(updated.created_at, fixed_now());
    assert_eq!(updated.last_updated, later(30));
    assert_eq!(updated.details.phone, "07700 900999");
}

#[test]
fn update_unknown_property_reports_not_found() {
    let (mut snapshot, _, _) = seeded();

    let err = snapshot
        .update_property(
            &crate::workflows::lettings::PropertyId::new("prop-404"),
            oak_street(),
            later(1),
        )
        .expect_err("unknown property");

    assert_eq!(
        err,
        LettingsError::NotFound {
            kind: EntityKind::Property,
            id: "prop-404".to_string(),
        }
    );
}

#[test]
fn referenced_applicant_cannot_be_removed_until_match_is_gone() {
    let (mut snapshot, record) = seeded_match();

    let err = snapshot
        .remove_applicant(&record.applicant_id)
        .expect_err("applicant is referenced");
    assert_eq!(
        err,
        LettingsError::Referenced {
            kind: EntityKind::Applicant,
            id: record.applicant_id.to_string(),
            match_id: record.match_id.clone(),
        }
    );
    assert!(snapshot.find_applicant(&record.applicant_id).is_some());

    snapshot
        .remove_match(&record.match_id)
        .expect("match removed");
    let removed = snapshot
        .remove_applicant(&record.applicant_id)
        .expect("applicant now removable");
    assert_eq!(removed.name(), "Jane");
    assert!(snapshot.find_applicant(&record.applicant_id).is_none());
}

#[test]
fn referenced_property_cannot_be_removed() {
    let (mut snapshot, record) = seeded_match();

    assert!(matches!(
        snapshot.remove_property(&record.property_id),
        Err(LettingsError::Referenced {
            kind: EntityKind::Property,
            ..
        })
    ));
}

#[test]
fn archived_matches_do_not_block_removal() {
    let (mut snapshot, record) = seeded_match();
    snapshot
        .archive_match(&record.match_id, later(60))
        .expect("archived");

    snapshot
        .remove_property(&record.property_id)
        .expect("property removable after archive");
    assert_eq!(snapshot.archived_matches().len(), 1);
}

#[test]
fn transition_applies_to_a_copy() {
    let (snapshot, _, _) = seeded();

    let (next, added) = snapshot
        .transition(|draft| draft.add_applicant(applicant_named("Omar"), later(2)))
        .expect("transition succeeds");

    assert_eq!(snapshot.applicants().len(), 1);
    assert_eq!(next.applicants().len(), 2);
    assert!(next.find_applicant(&added.applicant_id).is_some());

    let failed = snapshot.transition(|draft| {
        draft.add_applicant(applicant_named("Priya"), later(3))?;
        draft.remove_applicant(&ApplicantId::new("app-missing"))
    });
    assert!(failed.is_err());
    assert_eq!(snapshot.applicants().len(), 1);
}
