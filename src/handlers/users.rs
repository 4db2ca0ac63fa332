use axum::{extract::State, Extension, Json};

use crate::auth::middleware::Identity;
use crate::error::{AppError, AppResult};
use crate::models::user::{SyncUserRequest, User};
use crate::AppState;

/// Creates or refreshes the internal user behind the caller's session.
/// Called by the frontend after sign-in; no journal operation provisions users.
pub async fn sync_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SyncUserRequest>,
) -> AppResult<Json<User>> {
    let external_id = identity
        .external_id
        .as_deref()
        .ok_or(AppError::Unauthenticated)?;

    let user = state.store.upsert_user(external_id, req).await?;
    tracing::info!(user_id = %user.id, "User synced");

    Ok(Json(user))
}
