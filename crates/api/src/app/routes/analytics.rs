use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    Json,
};

use analytics_core::{EventDraft, Lookback};

use crate::app::dto::AnalyticsQuery;
use crate::app::errors;
use crate::app::services::AppServices;

pub async fn post_event(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<EventDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                format!("Invalid input: {}", rejection.body_text()),
            );
        }
    };

    match services.analytics.submit_event(draft).await {
        Ok(()) => errors::json_ok("Event stored successfully!"),
        Err(e) => errors::analytics_error_to_response(e),
    }
}

pub async fn get_analytics(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<AnalyticsQuery>,
) -> axum::response::Response {
    let lookback = Lookback::from_param(query.lookback.as_deref());
    let unique_id = query.unique_id.as_deref();

    match services
        .analytics
        .query_aggregation(query.event_type(), lookback, unique_id)
        .await
    {
        Ok(result) => errors::json_ok(result),
        Err(e) => errors::analytics_error_to_response(e),
    }
}

pub async fn delete_analytics(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<AnalyticsQuery>,
) -> axum::response::Response {
    match services.analytics.flush_partition(query.event_type()).await {
        Ok(()) => errors::json_ok("Data flushed successfully!"),
        Err(e) => errors::analytics_error_to_response(e),
    }
}
