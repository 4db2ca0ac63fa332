use uuid::Uuid;
use validator::Validate;

use crate::auth::admission::{admit, WRITE_COST};
use crate::auth::identity::resolve_user;
use crate::auth::middleware::Identity;
use crate::error::{AppError, AppResult};
use crate::models::collection::{Collection, CreateCollectionRequest};
use crate::services::revalidate::{collection_path, revalidate_path, DASHBOARD};
use crate::AppState;

pub async fn create_collection(
    state: &AppState,
    identity: &Identity,
    req: CreateCollectionRequest,
) -> AppResult<Collection> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    req.validate()?;
    admit(
        state.admission.as_ref(),
        identity,
        WRITE_COST,
        state.admission_timeout(),
    )
    .await?;

    let collection = state
        .store
        .insert_collection(user.id, &req.name, req.description.as_deref())
        .await?;

    tracing::info!(user_id = %user.id, collection_id = %collection.id, "Collection created");

    revalidate_path(state, user.id, DASHBOARD);
    Ok(collection)
}

pub async fn get_collections(state: &AppState, identity: &Identity) -> AppResult<Vec<Collection>> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    state.store.list_collections(user.id).await
}

/// Unlike `get_entry`, a missing or foreign collection is `None`, not an error.
pub async fn get_collection(
    state: &AppState,
    identity: &Identity,
    collection_id: Uuid,
) -> AppResult<Option<Collection>> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    state.store.find_collection(user.id, collection_id).await
}

/// Entries in the collection are kept and become unorganized.
pub async fn delete_collection(
    state: &AppState,
    identity: &Identity,
    collection_id: Uuid,
) -> AppResult<bool> {
    let user = resolve_user(state.store.as_ref(), identity).await?;

    if !state.store.delete_collection(user.id, collection_id).await? {
        return Err(AppError::NotFound("Collection not found".into()));
    }

    tracing::info!(user_id = %user.id, collection_id = %collection_id, "Collection deleted");

    revalidate_path(state, user.id, DASHBOARD);
    revalidate_path(state, user.id, &collection_path(collection_id));
    Ok(true)
}
