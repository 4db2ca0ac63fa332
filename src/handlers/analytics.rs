use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
};

use crate::auth::middleware::Identity;
use crate::error::ActionResult;
use crate::handlers::entries::rejected;
use crate::models::analytics::{AnalyticsQuery, MoodAnalytics};
use crate::services::analytics;
use crate::AppState;

pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> ActionResult<MoodAnalytics> {
    match query {
        Ok(Query(query)) => analytics::get_analytics(&state, &identity, query).await,
        Err(rejection) => rejected(rejection.body_text()),
    }
}
