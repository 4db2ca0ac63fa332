use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::auth::jwt::verify_token;
use crate::AppState;

/// The caller as seen by the identity provider. `external_id` is `None` when
/// no valid session token accompanied the request.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub external_id: Option<String>,
}

impl Identity {
    pub fn external(id: impl Into<String>) -> Self {
        Self {
            external_id: Some(id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Attaches an [`Identity`] to every request. Never rejects: each operation
/// decides for itself how an absent identity is reported.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let external_id = bearer_token(req.headers()).and_then(|token| {
        match verify_token(&token, &state.config) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                None
            }
        }
    });

    req.extensions_mut().insert(Identity { external_id });
    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}
