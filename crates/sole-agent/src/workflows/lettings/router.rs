use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::board::{ApplicantSortKey, ListOrder, PropertySortKey, SortDirection};
use super::domain::{ApplicantDraft, ApplicantId, Lane, MatchId, PropertyDraft, PropertyId};
use super::error::LettingsError;
use super::persistence::SnapshotStore;
use super::pipeline::StageId;
use super::service::LettingsService;

impl LettingsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LettingsError::NotFound { .. } => StatusCode::NOT_FOUND,
            LettingsError::AlreadyMatched { .. }
            | LettingsError::ApplicantUnavailable(_)
            | LettingsError::PropertyUnavailable(_)
            | LettingsError::Referenced { .. } => StatusCode::CONFLICT,
            LettingsError::UnknownStage(_)
            | LettingsError::InvalidTaskSlot(_)
            | LettingsError::InvalidRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for LettingsError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.to_string(),
        });
        (self.status_code(), Json(payload)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// `?q=&sort=&dir=` for the applicant and property lists.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

impl ListQuery {
    fn order<K>(&self) -> Result<ListOrder<K>, LettingsError>
    where
        K: FromStr<Err = LettingsError> + Default,
    {
        let key = match self.sort.as_deref() {
            Some(sort) => sort.parse()?,
            None => K::default(),
        };
        let direction = match self.dir.as_deref() {
            Some(dir) => dir.parse()?,
            None => SortDirection::default(),
        };
        Ok(ListOrder::new(key, direction))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub applicant_id: ApplicantId,
    pub property_id: PropertyId,
}

#[derive(Debug, Deserialize)]
pub struct StageUpdateRequest {
    pub stage: String,
    #[serde(default)]
    pub lane: Lane,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistToggleRequest {
    pub stage: String,
    pub slot: u8,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    pub stage: Option<String>,
}

/// Router builder exposing the lettings command and query API under `/api/v1`.
pub fn lettings_router<S>(service: Arc<LettingsService<S>>) -> Router
where
    S: SnapshotStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/applicants",
            get(list_applicants::<S>).post(add_applicant::<S>),
        )
        .route(
            "/api/v1/applicants/:applicant_id",
            get(get_applicant::<S>)
                .put(update_applicant::<S>)
                .delete(remove_applicant::<S>),
        )
        .route(
            "/api/v1/properties",
            get(list_properties::<S>).post(add_property::<S>),
        )
        .route(
            "/api/v1/properties/:property_id",
            get(get_property::<S>)
                .put(update_property::<S>)
                .delete(remove_property::<S>),
        )
        .route(
            "/api/v1/matches",
            get(list_matches::<S>).post(create_match::<S>),
        )
        .route(
            "/api/v1/matches/:match_id",
            get(get_match::<S>).delete(remove_match::<S>),
        )
        .route(
            "/api/v1/matches/:match_id/archive",
            post(archive_match::<S>),
        )
        .route("/api/v1/matches/:match_id/stage", put(update_stage::<S>))
        .route(
            "/api/v1/matches/:match_id/checklist",
            post(toggle_checklist::<S>),
        )
        .route("/api/v1/matches/:match_id/notes", put(set_notes::<S>))
        .route(
            "/api/v1/matches/:match_id/progress",
            get(match_progress::<S>),
        )
        .route("/api/v1/archive", get(list_archive::<S>))
        .route("/api/v1/pipeline", get(pipeline_summary::<S>))
        .route("/api/v1/pipeline/:lane", get(lane_board::<S>))
        .route("/api/v1/storage", get(storage_info::<S>))
        .with_state(service)
}

type Service<S> = State<Arc<LettingsService<S>>>;

pub(crate) async fn list_applicants<S>(
    State(service): Service<S>,
    Query(query): Query<ListQuery>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let order = query.order::<ApplicantSortKey>()?;
    let applicants = service.search_applicants(query.q.as_deref().unwrap_or_default(), order);
    Ok(Json(applicants).into_response())
}

pub(crate) async fn add_applicant<S>(
    State(service): Service<S>,
    Json(draft): Json<ApplicantDraft>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let applicant = service.add_applicant(draft)?;
    Ok((StatusCode::CREATED, Json(applicant)).into_response())
}

pub(crate) async fn get_applicant<S>(
    State(service): Service<S>,
    Path(applicant_id): Path<String>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let id = ApplicantId(applicant_id);
    let applicant = service
        .find_applicant(&id)
        .ok_or_else(|| LettingsError::applicant_not_found(&id))?;
    Ok(Json(applicant).into_response())
}

pub(crate) async fn update_applicant<S>(
    State(service): Service<S>,
    Path(applicant_id): Path<String>,
    Json(draft): Json<ApplicantDraft>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let applicant = service.update_applicant(&ApplicantId(applicant_id), draft)?;
    Ok(Json(applicant).into_response())
}

pub(crate) async fn remove_applicant<S>(
    State(service): Service<S>,
    Path(applicant_id): Path<String>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let applicant = service.remove_applicant(&ApplicantId(applicant_id))?;
    Ok(Json(applicant).into_response())
}

pub(crate) async fn list_properties<S>(
    State(service): Service<S>,
    Query(query): Query<ListQuery>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let order = query.order::<PropertySortKey>()?;
    let properties = service.search_properties(query.q.as_deref().unwrap_or_default(), order);
    Ok(Json(properties).into_response())
}

pub(crate) async fn add_property<S>(
    State(service): Service<S>,
    Json(draft): Json<PropertyDraft>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let property = service.add_property(draft)?;
    Ok((StatusCode::CREATED, Json(property)).into_response())
}

pub(crate) async fn get_property<S>(
    State(service): Service<S>,
    Path(property_id): Path<String>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let id = PropertyId(property_id);
    let property = service
        .find_property(&id)
        .ok_or_else(|| LettingsError::property_not_found(&id))?;
    Ok(Json(property).into_response())
}

pub(crate) async fn update_property<S>(
    State(service): Service<S>,
    Path(property_id): Path<String>,
    Json(draft): Json<PropertyDraft>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let property = service.update_property(&PropertyId(property_id), draft)?;
    Ok(Json(property).into_response())
}

pub(crate) async fn remove_property<S>(
    State(service): Service<S>,
    Path(property_id): Path<String>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let property = service.remove_property(&PropertyId(property_id))?;
    Ok(Json(property).into_response())
}

pub(crate) async fn list_matches<S>(
    State(service): Service<S>,
    Query(query): Query<SearchQuery>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let snapshot = service.snapshot();
    let matches: Vec<_> = snapshot
        .search_matches(query.q.as_deref().unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();
    Json(matches).into_response()
}

pub(crate) async fn create_match<S>(
    State(service): Service<S>,
    Json(request): Json<CreateMatchRequest>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let record = service.create_match(&request.applicant_id, &request.property_id)?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

pub(crate) async fn get_match<S>(
    State(service): Service<S>,
    Path(match_id): Path<String>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let id = MatchId(match_id);
    let record = service
        .find_match(&id)
        .ok_or_else(|| LettingsError::match_not_found(&id))?;
    Ok(Json(record).into_response())
}

pub(crate) async fn remove_match<S>(
    State(service): Service<S>,
    Path(match_id): Path<String>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let record = service.remove_match(&MatchId(match_id))?;
    Ok(Json(record).into_response())
}

pub(crate) async fn archive_match<S>(
    State(service): Service<S>,
    Path(match_id): Path<String>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let archived = service.archive_match(&MatchId(match_id))?;
    Ok(Json(archived).into_response())
}

pub(crate) async fn update_stage<S>(
    State(service): Service<S>,
    Path(match_id): Path<String>,
    Json(request): Json<StageUpdateRequest>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let change = service.update_stage(&MatchId(match_id), &request.stage, request.lane)?;
    Ok(Json(change).into_response())
}

pub(crate) async fn toggle_checklist<S>(
    State(service): Service<S>,
    Path(match_id): Path<String>,
    Json(request): Json<ChecklistToggleRequest>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let toggle =
        service.toggle_checklist_task(&MatchId(match_id), &request.stage, request.slot)?;
    Ok(Json(toggle).into_response())
}

pub(crate) async fn set_notes<S>(
    State(service): Service<S>,
    Path(match_id): Path<String>,
    Json(request): Json<NotesRequest>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let record = service.set_notes(&MatchId(match_id), request.notes)?;
    Ok(Json(record).into_response())
}

/// Progress for one stage when `?stage=` is given, otherwise for every stage
/// plus where each lane currently sits.
pub(crate) async fn match_progress<S>(
    State(service): Service<S>,
    Path(match_id): Path<String>,
    Query(query): Query<ProgressQuery>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let id = MatchId(match_id);
    if let Some(stage) = query.stage.as_deref() {
        let progress = service.stage_progress(&id, stage)?;
        return Ok(Json(progress).into_response());
    }

    let record = service
        .find_match(&id)
        .ok_or_else(|| LettingsError::match_not_found(&id))?;
    let stages: Vec<_> = StageId::ordered()
        .into_iter()
        .map(|stage| {
            let progress = record.stage_progress(stage);
            json!({
                "stage": stage,
                "completed": progress.completed,
                "total": progress.total,
            })
        })
        .collect();

    let payload = json!({
        "match_id": record.match_id,
        "applicant_stage": record.applicant_stage,
        "applicant_progress": record.lane_progress(Lane::Applicant),
        "property_stage": record.property_stage,
        "property_progress": record.lane_progress(Lane::Property),
        "stages": stages,
    });
    Ok(Json(payload).into_response())
}

pub(crate) async fn list_archive<S>(State(service): Service<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    Json(service.list_archived_matches()).into_response()
}

pub(crate) async fn pipeline_summary<S>(State(service): Service<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    Json(service.pipeline_summary()).into_response()
}

pub(crate) async fn lane_board<S>(
    State(service): Service<S>,
    Path(lane): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, LettingsError>
where
    S: SnapshotStore + 'static,
{
    let lane: Lane = lane.parse()?;
    Ok(Json(service.lane_board(lane, query.q.as_deref())).into_response())
}

pub(crate) async fn storage_info<S>(State(service): Service<S>) -> Response
where
    S: SnapshotStore + 'static,
{
    let info = service.storage_info();
    let payload = json!({
        "has_data": info.has_data,
        "last_saved": info.last_saved,
        "applicant_count": info.applicant_count,
        "property_count": info.property_count,
        "match_count": info.match_count,
        "persist_failed": service.last_persist_failed(),
    });
    Json(payload).into_response()
}
