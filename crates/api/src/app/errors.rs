use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use analytics_infra::engine::AnalyticsError;

pub fn analytics_error_to_response(err: AnalyticsError) -> axum::response::Response {
    match &err {
        AnalyticsError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, msg.clone()),
        AnalyticsError::Serialization { .. } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        AnalyticsError::StoreUnavailable { .. } => {
            tracing::error!(error = %err, "store unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    }
}

/// `{"status": <code>, "data": <payload>}`
pub fn json_ok(data: impl Serialize) -> axum::response::Response {
    (
        StatusCode::OK,
        axum::Json(json!({
            "status": StatusCode::OK.as_u16(),
            "data": data,
        })),
    )
        .into_response()
}

/// `{"status": <code>, "error": <message>}`
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "status": status.as_u16(),
            "error": message.into(),
        })),
    )
        .into_response()
}
