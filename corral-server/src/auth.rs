use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::api::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

/// Check if request carries the configured bearer token
fn is_authenticated(req: &Request, expected: &str) -> bool {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .is_some_and(|token| token == expected)
}

/// Authentication middleware
pub async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.api_token.as_deref() else {
        return next.run(req).await;
    };

    // Public routes that don't require auth
    if !req.uri().path().starts_with("/api/") {
        return next.run(req).await;
    }

    if is_authenticated(&req, expected) {
        return next.run(req).await;
    }

    tracing::warn!("Rejected unauthenticated request to {}", req.uri().path());
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": "a valid bearer token is required"
        })),
    )
        .into_response()
}
