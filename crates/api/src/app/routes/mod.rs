use axum::{
    routing::{get, post},
    Router,
};

pub mod analytics;
pub mod system;

/// Router for all endpoints behind the API key.
pub fn router() -> Router {
    Router::new()
        .route("/stats", get(system::stats))
        .route("/event", post(analytics::post_event))
        .route(
            "/analytics",
            get(analytics::get_analytics).delete(analytics::delete_analytics),
        )
}
