use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::lettings::{
    Applicant, ApplicantDraft, LettingsService, LettingsSnapshot, ManualMatch,
    MemorySnapshotStore, Property, PropertyDraft, SearchPreferences, SnapshotStore, StoreError,
};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn later(minutes: i64) -> DateTime<Utc> {
    fixed_now() + chrono::Duration::minutes(minutes)
}

pub(super) fn jane() -> ApplicantDraft {
    ApplicantDraft {
        name: "Jane".to_string(),
        email: "jane@example.com".to_string(),
        phone: "07700 900123".to_string(),
        age: 31,
        preferences: SearchPreferences {
            budget_min: 1200,
            budget_max: 1600,
            bedrooms: 2,
            preferred_areas: vec!["Hackney".to_string()],
            ..SearchPreferences::default()
        },
        ..ApplicantDraft::default()
    }
}

pub(super) fn applicant_named(name: &str) -> ApplicantDraft {
    ApplicantDraft {
        name: name.to_string(),
        ..ApplicantDraft::default()
    }
}

pub(super) fn oak_street() -> PropertyDraft {
    PropertyDraft {
        address: "12 Oak St".to_string(),
        postcode: "E8 1AA".to_string(),
        bedrooms: 2,
        rent: 1500,
        property_type: "Flat".to_string(),
        landlord_name: "Mr Patel".to_string(),
        ..PropertyDraft::default()
    }
}

pub(super) fn property_at(address: &str, postcode: &str) -> PropertyDraft {
    PropertyDraft {
        address: address.to_string(),
        postcode: postcode.to_string(),
        ..PropertyDraft::default()
    }
}

/// A snapshot holding Jane and 12 Oak St, unmatched.
pub(super) fn seeded() -> (LettingsSnapshot, Applicant, Property) {
    let mut snapshot = LettingsSnapshot::new();
    let applicant = snapshot
        .add_applicant(jane(), fixed_now())
        .expect("applicant added");
    let property = snapshot
        .add_property(oak_street(), fixed_now())
        .expect("property added");
    (snapshot, applicant, property)
}

/// As [`seeded`], with Jane matched to 12 Oak St.
pub(super) fn seeded_match() -> (LettingsSnapshot, ManualMatch) {
    let (mut snapshot, applicant, property) = seeded();
    let record = snapshot
        .create_match(&applicant.applicant_id, &property.property_id, later(5))
        .expect("match created");
    (snapshot, record)
}

pub(super) fn build_service() -> (LettingsService<MemorySnapshotStore>, Arc<MemorySnapshotStore>) {
    let store = Arc::new(MemorySnapshotStore::default());
    let service = LettingsService::open(store.clone())
        .expect("memory store opens")
        .with_clock(fixed_now);
    (service, store)
}

/// Accepts loads but refuses every save.
#[derive(Debug, Default)]
pub(super) struct ReadOnlyStore;

impl SnapshotStore for ReadOnlyStore {
    fn save(&self, _snapshot: &LettingsSnapshot) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    fn load(&self) -> Result<Option<LettingsSnapshot>, StoreError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
