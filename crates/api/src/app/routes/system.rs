use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use crate::app::dto::StatsResponse;
use crate::app::errors;
use crate::app::services::AppServices;

pub async fn info() -> axum::response::Response {
    errors::json_ok("Analytics Engine is running.")
}

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let total_keys = match services.analytics.size().await {
        Ok(n) => n,
        Err(e) => return errors::analytics_error_to_response(e),
    };
    let uptime_seconds = services.uptime_seconds();

    errors::json_ok(StatsResponse {
        total_keys,
        uptime_seconds,
        uptime: format_uptime(uptime_seconds),
    })
}

pub async fn not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "Route not found.")
}

/// Render seconds as `1mo 2d 3h 4m 5s`, with 30-day months and zero units left out.
pub fn format_uptime(seconds: u64) -> String {
    const UNITS: [(u64, &str); 5] = [(30 * 86_400, "mo"), (86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    let mut rest = seconds;
    let mut parts = Vec::new();
    for (size, suffix) in UNITS {
        let count = rest / size;
        rest %= size;
        if count > 0 {
            parts.push(format!("{count}{suffix}"));
        }
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
