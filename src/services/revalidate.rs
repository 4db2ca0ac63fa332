use serde_json::json;
use uuid::Uuid;

use crate::AppState;

pub const DASHBOARD: &str = "/dashboard";

pub fn journal_path(entry_id: Uuid) -> String {
    format!("/journal/{}", entry_id)
}

pub fn collection_path(collection_id: Uuid) -> String {
    format!("/collection/{}", collection_id)
}

/// Tells the user's connected clients that `path` is stale. Fire-and-forget:
/// having no subscribers is normal.
pub fn revalidate_path(state: &AppState, user_id: Uuid, path: &str) {
    if let Some(tx) = state.ws_tx.as_ref() {
        let msg = json!({
            "type": "revalidate",
            "user_id": user_id,
            "path": path,
        });
        let _ = tx.send(msg.to_string());
    }
}
