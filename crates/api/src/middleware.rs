use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    api_auth: Arc<str>,
}

impl AuthState {
    pub fn new(api_auth: impl Into<Arc<str>>) -> Self {
        Self {
            api_auth: api_auth.into(),
        }
    }
}

/// Reject requests whose `Authorization` header is not exactly the shared key.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if !is_authorized(req.headers(), &state.api_auth) {
        return errors::json_error(StatusCode::UNAUTHORIZED, "Unauthorized.");
    }

    next.run(req).await
}

fn is_authorized(headers: &HeaderMap, api_auth: &str) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == api_auth)
}
