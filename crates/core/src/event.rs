//! The recorded event and its unvalidated ingestion shape.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A single recorded occurrence.
///
/// `name`, `created_at` and `event_type` are always present: the only ways to
/// obtain an `Event` are [`Event::new`], [`EventDraft::validate`] and
/// [`crate::codec::decode`], and all of them enforce that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    name: String,
    /// Caller-supplied creation time, epoch milliseconds.
    created_at: i64,
    /// Selects the storage partition.
    #[serde(rename = "type")]
    event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        created_at: i64,
        event_type: impl Into<String>,
    ) -> DomainResult<Self> {
        EventDraft {
            name: Some(name.into()),
            created_at: Some(created_at),
            event_type: Some(event_type.into()),
            unique_id: None,
        }
        .validate()
    }

    /// Attach the identity used by query-time filtering. Empty ids are dropped.
    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = normalize_unique_id(Some(unique_id.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// Whether this event passes an identity filter (`None` passes everything).
    pub fn matches_identity(&self, filter: Option<&str>) -> bool {
        match filter {
            None | Some("") => true,
            Some(wanted) => self.unique_id.as_deref() == Some(wanted),
        }
    }
}

/// Unvalidated event as submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
}

impl EventDraft {
    /// Check required fields and produce an immutable [`Event`].
    pub fn validate(self) -> DomainResult<Event> {
        let name = required_text(self.name, "name")?;

        let created_at = match self.created_at {
            None => return Err(DomainError::validation("createdAt is required")),
            Some(ms) if ms <= 0 => {
                return Err(DomainError::validation(format!(
                    "createdAt must be a positive epoch-millisecond timestamp, got {ms}"
                )));
            }
            Some(ms) => ms,
        };

        let event_type = required_text(self.event_type, "type")?;

        Ok(Event {
            name,
            created_at,
            event_type,
            unique_id: normalize_unique_id(self.unique_id),
        })
    }
}

fn required_text(value: Option<String>, field: &'static str) -> DomainResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(DomainError::validation(format!("{field} must not be empty"))),
        None => Err(DomainError::validation(format!("{field} is required"))),
    }
}

fn normalize_unique_id(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
