//! Stored form of an [`Event`]: compact JSON, one member per event.
//!
//! The backing store persists raw members, so the encoding must stay stable and
//! round-trippable. Field order is `name, createdAt, type, uniqueId?`.

use crate::error::{DomainError, DomainResult};
use crate::event::{Event, EventDraft};

/// Encode an event into its stored member form.
pub fn encode(event: &Event) -> DomainResult<String> {
    serde_json::to_string(event).map_err(|e| DomainError::serialization(e.to_string()))
}

/// Decode a stored member.
///
/// Strict: anything that would not pass ingestion validation is a decode error,
/// so a corrupt member can never reach aggregation half-populated.
pub fn decode(raw: &str) -> DomainResult<Event> {
    let draft: EventDraft =
        serde_json::from_str(raw).map_err(|e| DomainError::decode(e.to_string()))?;

    draft.validate().map_err(|e| match e {
        DomainError::Validation(msg) => DomainError::decode(msg),
        other => other,
    })
}
