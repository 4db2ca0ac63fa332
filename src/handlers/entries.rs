use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::Identity;
use crate::error::{ActionResult, AppResult};
use crate::models::draft::{Draft, SaveDraftRequest};
use crate::models::entry::{
    CreateEntryRequest, EntriesPage, Entry, EntryQuery, EntryWithMood, UpdateEntryRequest,
};
use crate::services::entries;
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<Entry>)> {
    let entry = entries::create_entry(&state, &identity, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<EntryQuery>, QueryRejection>,
) -> ActionResult<EntriesPage> {
    match query {
        Ok(Query(query)) => entries::get_entries(&state, &identity, query).await,
        Err(rejection) => rejected(rejection.body_text()),
    }
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<EntryWithMood>> {
    Ok(Json(entries::get_entry(&state, &identity, entry_id).await?))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(entry_id): Path<Uuid>,
    Json(req): Json<UpdateEntryRequest>,
) -> AppResult<Json<Entry>> {
    Ok(Json(entries::update_entry(&state, &identity, entry_id, req).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    entries::delete_entry(&state, &identity, entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_draft(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ActionResult<Option<Draft>> {
    entries::get_draft(&state, &identity).await
}

pub async fn save_draft(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    req: Result<Json<SaveDraftRequest>, JsonRejection>,
) -> ActionResult<Draft> {
    match req {
        Ok(Json(req)) => entries::save_draft(&state, &identity, req).await,
        Err(rejection) => rejected(rejection.body_text()),
    }
}

/// Malformed input on an envelope route is reported in the envelope, never as a bare 4xx.
pub(crate) fn rejected<T>(detail: String) -> ActionResult<T> {
    tracing::debug!(detail = %detail, "Rejected malformed request");
    ActionResult::failed("Invalid request")
}
