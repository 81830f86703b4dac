use serde::{Deserialize, Serialize};

// -------------------------
// Request DTOs
// -------------------------

/// Query string of `GET /analytics` and `DELETE /analytics`.
///
/// `lookback` stays a raw string so unparsable values fall back to the
/// default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub lookback: Option<String>,
    pub unique_id: Option<String>,
}

impl AnalyticsQuery {
    pub fn event_type(&self) -> &str {
        self.event_type.as_deref().unwrap_or_default()
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_keys: u64,
    pub uptime_seconds: u64,
    pub uptime: String,
}
