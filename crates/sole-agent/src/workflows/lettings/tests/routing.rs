use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;

use crate::workflows::lettings::{lettings_router, LettingsService, MemorySnapshotStore};

type MemoryService = LettingsService<MemorySnapshotStore>;

fn router_with(service: MemoryService) -> (axum::Router, Arc<MemoryService>) {
    let service = Arc::new(service);
    (lettings_router(service.clone()), service)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn seeded_router() -> (axum::Router, String, String, String) {
    let (service, _) = build_service();
    let applicant = service.add_applicant(jane()).expect("applicant");
    let property = service.add_property(oak_street()).expect("property");
    let record = service
        .create_match(&applicant.applicant_id, &property.property_id)
        .expect("match");
    let (router, _) = router_with(service);
    (
        router,
        applicant.applicant_id.to_string(),
        property.property_id.to_string(),
        record.match_id.to_string(),
    )
}

#[tokio::test]
async fn intake_routes_create_and_list_records() {
    let (service, _) = build_service();
    let (router, service) = router_with(service);

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/applicants",
            json!({
                "name": "Jane",
                "email": "jane@example.com",
                "budget_min": 1200,
                "budget_max": 1600,
                "preferred_move_in": ""
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["applicant_id"], "app-000001");
    assert_eq!(body["status"], "active");

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/properties",
            json!({ "address": "12 Oak St", "postcode": "e8 1aa", "rent": 1500 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json_body(response).await["postcode"], "E8 1AA");

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/applicants?q=jane"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(service.list_properties().len(), 1);
}

#[tokio::test]
async fn invalid_drafts_are_unprocessable() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/properties",
            json!({ "address": "12 Oak St" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("postcode")));
}

#[tokio::test]
async fn duplicate_match_is_a_conflict() {
    let (router, applicant_id, property_id, _) = seeded_router().await;

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/matches",
            json!({ "applicant_id": applicant_id, "property_id": property_id }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn referenced_applicant_delete_is_a_conflict() {
    let (router, applicant_id, _, _) = seeded_router().await;

    let response = router
        .oneshot(empty_request(
            Method::DELETE,
            &format!("/api/v1/applicants/{applicant_id}"),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stage_route_moves_one_lane() {
    let (router, _, _, match_id) = seeded_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/matches/{match_id}/stage"),
            json!({ "stage": "viewing", "lane": "applicant" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["match"]["applicant_stage"], "viewing");
    assert_eq!(body["match"]["property_stage"], "matched");

    let response = router
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/matches/{match_id}/stage"),
            json!({ "stage": "signed" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn checklist_and_progress_routes_report_counts() {
    let (router, _, _, match_id) = seeded_router().await;

    for slot in [1, 2] {
        let response = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/matches/{match_id}/checklist"),
                json!({ "stage": "matched", "slot": slot }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/matches/{match_id}/progress?stage=matched"),
        ))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body, json!({ "completed": 2, "total": 3 }));

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/matches/{match_id}/progress"),
        ))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["applicant_progress"]["completed"], 2);
    assert_eq!(body["stages"].as_array().map(Vec::len), Some(5));

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/matches/{match_id}/checklist"),
            json!({ "stage": "matched", "slot": 0 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn archive_route_moves_match_into_history() {
    let (router, applicant_id, _, match_id) = seeded_router().await;

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::POST,
            &format!("/api/v1/matches/{match_id}/archive"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["final_stage"], "completed");

    let response = router
        .clone()
        .oneshot(empty_request(Method::GET, "/api/v1/archive"))
        .await
        .expect("response");
    assert_eq!(
        read_json_body(response).await.as_array().map(Vec::len),
        Some(1)
    );

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/applicants/{applicant_id}"),
        ))
        .await
        .expect("response");
    assert_eq!(read_json_body(response).await["status"], "active");

    let response = router
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/matches/{match_id}"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pipeline_routes_render_boards_and_summary() {
    let (router, _, _, match_id) = seeded_router().await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/matches/{match_id}/notes"),
            json!({ "notes": "Keys with porter" }),
        ))
        .await
        .expect("response");
    assert_eq!(read_json_body(response).await["notes"], "Keys with porter");

    let response = router
        .clone()
        .oneshot(empty_request(Method::GET, "/api/v1/pipeline/property"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["lane"], "property");
    assert_eq!(body["columns"][0]["cards"][0]["applicant_name"], "Jane");

    let response = router
        .clone()
        .oneshot(empty_request(Method::GET, "/api/v1/pipeline/tenant"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .clone()
        .oneshot(empty_request(Method::GET, "/api/v1/pipeline"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["active_matches"], 1);
    assert_eq!(body["applicants"]["matched"], 1);

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/storage"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["has_data"], true);
    assert_eq!(body["persist_failed"], false);
    assert_eq!(body["match_count"], 1);
}

#[tokio::test]
async fn property_list_accepts_sort_and_direction() {
    let (service, _) = build_service();
    service.add_property(oak_street()).expect("property");
    service
        .add_property(property_at("4 Elm Rd", "N1 2BB"))
        .expect("property");
    let (router, _) = router_with(service);

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::GET,
            "/api/v1/properties?sort=rent&dir=desc",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body[0]["address"], "12 Oak St");
    assert_eq!(body[1]["address"], "4 Elm Rd");

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/properties?sort=budget_max"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_match_is_not_found() {
    let (service, _) = build_service();
    let (router, _) = router_with(service);

    let response = router
        .oneshot(empty_request(Method::DELETE, "/api/v1/matches/match-404"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "match match-404 not found");
}
