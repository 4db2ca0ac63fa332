use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::Identity;
use crate::error::AppResult;
use crate::models::collection::{Collection, CreateCollectionRequest};
use crate::services::collections;
use crate::AppState;

pub async fn create_collection(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateCollectionRequest>,
) -> AppResult<(StatusCode, Json<Collection>)> {
    let collection = collections::create_collection(&state, &identity, req).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn list_collections(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> AppResult<Json<Vec<Collection>>> {
    Ok(Json(collections::get_collections(&state, &identity).await?))
}

/// Responds `null` rather than 404 for a collection the caller cannot see.
pub async fn get_collection(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(collection_id): Path<Uuid>,
) -> AppResult<Json<Option<Collection>>> {
    Ok(Json(
        collections::get_collection(&state, &identity, collection_id).await?,
    ))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(collection_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    collections::delete_collection(&state, &identity, collection_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
