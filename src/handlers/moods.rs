use axum::Json;

use crate::models::mood::{Mood, MOODS};

pub async fn list_moods() -> Json<&'static [Mood]> {
    Json(MOODS)
}
