//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the shared `Analytics` engine
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: response envelope and error mapping

use std::sync::Arc;

use analytics_infra::config::Config;
use analytics_infra::event_store::EventStoreError;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Fails only when a configured Redis store cannot be reached.
pub async fn build_app(config: &Config) -> Result<Router, EventStoreError> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(build_router(services, config.api_auth.clone()))
}

/// Router over already-built services.
pub fn build_router(services: Arc<AppServices>, api_auth: String) -> Router {
    let auth_state = middleware::AuthState::new(api_auth);

    // Protected routes: require the shared API key. `route_layer` keeps the
    // check off the fallback so unknown paths answer 404.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/", get(routes::system::info))
        .merge(protected)
        .fallback(routes::system::not_found)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

pub use services::AppServices;
