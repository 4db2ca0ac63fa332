use crate::auth::middleware::Identity;
use crate::db::JournalStore;
use crate::error::{AppError, AppResult};
use crate::models::user::User;

/// Maps the caller's external identity to the internal user record. Users are
/// provisioned by the presentation layer, never here.
pub async fn resolve_user(store: &dyn JournalStore, identity: &Identity) -> AppResult<User> {
    let external_id = identity
        .external_id
        .as_deref()
        .ok_or(AppError::Unauthenticated)?;

    store
        .find_user_by_external_id(external_id)
        .await?
        .ok_or(AppError::UserNotFound)
}
