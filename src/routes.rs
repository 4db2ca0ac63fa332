use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::identify;
use crate::handlers;
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/moods", get(handlers::moods::list_moods))
        .route("/ws", get(handlers::ws::ws_handler));

    let journal_routes = Router::new()
        .route(
            "/api/users/sync",
            post(handlers::users::sync_user),
        )
        // Entries
        .route(
            "/api/entries",
            get(handlers::entries::list_entries).post(handlers::entries::create_entry),
        )
        .route(
            "/api/entries/:id",
            get(handlers::entries::get_entry)
                .put(handlers::entries::update_entry)
                .delete(handlers::entries::delete_entry),
        )
        .route(
            "/api/draft",
            get(handlers::entries::get_draft).put(handlers::entries::save_draft),
        )
        // Collections
        .route(
            "/api/collections",
            get(handlers::collections::list_collections)
                .post(handlers::collections::create_collection),
        )
        .route(
            "/api/collections/:id",
            get(handlers::collections::get_collection)
                .delete(handlers::collections::delete_collection),
        )
        // Analytics
        .route("/api/analytics", get(handlers::analytics::get_analytics))
        .layer(middleware::from_fn_with_state(state.clone(), identify));

    Router::new()
        .merge(public_routes)
        .merge(journal_routes)
        .layer(cors_layer(&state))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = std::iter::once(&state.config.frontend_url)
        .chain(state.config.cors_extra_origins.iter())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::admission::AdmissionDecision;
    use crate::auth::jwt::sign_test_token;
    use crate::test_support::TestContext;

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn bearer(ctx: &TestContext, sub: &str) -> String {
        format!("Bearer {}", sign_test_token(sub, 600, &ctx.state.config))
    }

    fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let ctx = TestContext::new();
        let (status, body) = send(build_router(ctx.state.clone()), get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = send(build_router(ctx.state.clone()), get_request("/readyz", None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_moods_are_listed_in_order() {
        let ctx = TestContext::new();
        let (status, body) = send(build_router(ctx.state.clone()), get_request("/api/moods", None)).await;
        assert_eq!(status, StatusCode::OK);

        let moods = body.as_array().unwrap();
        assert_eq!(moods.len(), 13);
        assert_eq!(moods[0]["id"], "happy");
        assert_eq!(moods[0]["score"], 9);
        assert!(moods[0].get("key").is_none());
    }

    #[tokio::test]
    async fn test_anonymous_reads_get_failure_envelope() {
        let ctx = TestContext::new();
        let (status, body) = send(build_router(ctx.state.clone()), get_request("/api/entries", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": false, "error": "Unauthorized" }));

        let (status, body) = send(build_router(ctx.state.clone()), get_request("/api/analytics", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_anonymous_write_is_unauthorized() {
        let ctx = TestContext::new();
        let req = json_request(
            "POST",
            "/api/entries",
            None,
            json!({ "title": "t", "content": "c", "mood": "HAPPY" }),
        );
        let (status, body) = send(build_router(ctx.state.clone()), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Unauthorized");
        assert_eq!(body["error"]["code"], 401);
    }

    #[tokio::test]
    async fn test_expired_token_is_anonymous() {
        let ctx = TestContext::new();
        ctx.identity("user_alice").await;
        let expired = format!("Bearer {}", sign_test_token("user_alice", -600, &ctx.state.config));

        let (_, body) = send(
            build_router(ctx.state.clone()),
            get_request("/api/entries", Some(&expired)),
        )
        .await;
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_unsynced_user_is_not_found() {
        let ctx = TestContext::new();
        let auth = bearer(&ctx, "user_ghost");
        let req = json_request(
            "POST",
            "/api/collections",
            Some(&auth),
            json!({ "name": "Work" }),
        );
        let (status, body) = send(build_router(ctx.state.clone()), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "User not found");
    }

    #[tokio::test]
    async fn test_sync_then_journal_flow() {
        let ctx = TestContext::new();
        let auth = bearer(&ctx, "user_alice");

        let sync = json_request(
            "POST",
            "/api/users/sync",
            Some(&auth),
            json!({ "email": "alice@example.com" }),
        );
        let (status, user) = send(build_router(ctx.state.clone()), sync).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["external_id"], "user_alice");

        let create = json_request(
            "POST",
            "/api/entries",
            Some(&auth),
            json!({ "title": "Walk", "content": "Long walk by the river", "mood": "PEACEFUL" }),
        );
        let (status, entry) = send(build_router(ctx.state.clone()), create).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["mood"], "peaceful");
        assert_eq!(entry["mood_score"], 8);

        let (status, page) = send(
            build_router(ctx.state.clone()),
            get_request("/api/entries?collection_id=unorganized", Some(&auth)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["success"], true);
        assert_eq!(page["data"]["entries"][0]["mood_data"]["label"], "Peaceful");

        let uri = format!("/api/entries/{}", entry["id"].as_str().unwrap());
        let delete = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::AUTHORIZATION, &auth)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(build_router(ctx.state.clone()), delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(build_router(ctx.state.clone()), get_request(&uri, Some(&auth))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Entry not found");
    }

    #[tokio::test]
    async fn test_invalid_mood_is_unprocessable() {
        let ctx = TestContext::new();
        ctx.identity("user_alice").await;
        let auth = bearer(&ctx, "user_alice");

        let req = json_request(
            "POST",
            "/api/entries",
            Some(&auth),
            json!({ "title": "t", "content": "c", "mood": "ELATED" }),
        );
        let (status, body) = send(build_router(ctx.state.clone()), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["message"], "Invalid mood");
    }

    #[tokio::test]
    async fn test_rate_limited_write() {
        let ctx = TestContext::with_decision(AdmissionDecision::RateLimited {
            remaining: 0,
            reset_in_secs: 120,
        });
        ctx.identity("user_alice").await;
        let auth = bearer(&ctx, "user_alice");

        let req = json_request(
            "POST",
            "/api/collections",
            Some(&auth),
            json!({ "name": "Work" }),
        );
        let (status, body) = send(build_router(ctx.state.clone()), req).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["message"], "Too many requests. Please try again later.");
    }

    #[tokio::test]
    async fn test_missing_collection_is_null() {
        let ctx = TestContext::new();
        ctx.identity("user_alice").await;
        let auth = bearer(&ctx, "user_alice");

        let uri = format!("/api/collections/{}", uuid::Uuid::new_v4());
        let (status, body) = send(build_router(ctx.state.clone()), get_request(&uri, Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_draft_round_trip() {
        let ctx = TestContext::new();
        ctx.identity("user_alice").await;
        let auth = bearer(&ctx, "user_alice");

        let (_, empty) = send(build_router(ctx.state.clone()), get_request("/api/draft", Some(&auth))).await;
        assert_eq!(empty, json!({ "success": true, "data": null }));

        let save = json_request(
            "PUT",
            "/api/draft",
            Some(&auth),
            json!({ "title": "Half a thought", "mood": "tired" }),
        );
        let (status, saved) = send(build_router(ctx.state.clone()), save).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["success"], true);
        assert_eq!(saved["data"]["title"], "Half a thought");
        assert_eq!(saved["data"]["content"], "");
    }

    #[tokio::test]
    async fn test_bad_sort_order_is_failure_envelope() {
        let ctx = TestContext::new();
        ctx.identity("user_alice").await;
        let auth = bearer(&ctx, "user_alice");

        let (status, body) = send(
            build_router(ctx.state.clone()),
            get_request("/api/entries?order=sideways", Some(&auth)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "success": false, "error": "Validation error: Invalid sort order" })
        );

        let (_, body) = send(
            build_router(ctx.state.clone()),
            get_request("/api/entries?order=asc", Some(&auth)),
        )
        .await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_malformed_draft_is_failure_envelope() {
        let ctx = TestContext::new();
        ctx.identity("user_alice").await;
        let auth = bearer(&ctx, "user_alice");

        let req = json_request("PUT", "/api/draft", Some(&auth), json!({ "title": 5 }));
        let (status, body) = send(build_router(ctx.state.clone()), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": false, "error": "Invalid request" }));
    }

    #[tokio::test]
    async fn test_malformed_analytics_query_is_failure_envelope() {
        let ctx = TestContext::new();
        ctx.identity("user_alice").await;
        let auth = bearer(&ctx, "user_alice");

        let (status, body) = send(
            build_router(ctx.state.clone()),
            get_request("/api/analytics?period=90d", Some(&auth)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Validation error: Invalid period");
    }
}
