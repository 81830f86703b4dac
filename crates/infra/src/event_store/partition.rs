//! Partitions: the unit of storage, retention and deletion.
//!
//! A partition holds every event of one `type`, addressed by
//! `"{prefix}-{type}"`. It is created implicitly by the first append, has its
//! absolute expiry re-armed by every append, and disappears either when that
//! expiry passes or when it is flushed as a whole.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

/// Address of one partition in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn new(prefix: &str, event_type: &str) -> Self {
        Self(format!("{prefix}-{event_type}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Retention horizon applied on every append (non-zero days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetentionDays(u32);

impl RetentionDays {
    pub fn new(days: u32) -> Option<Self> {
        (days > 0).then_some(Self(days))
    }

    pub fn days(self) -> u32 {
        self.0
    }

    pub fn as_secs(self) -> u64 {
        u64::from(self.0) * 86_400
    }

    pub fn as_delta(self) -> TimeDelta {
        TimeDelta::days(i64::from(self.0))
    }
}

/// Sorted-set partition used by the in-memory backend.
///
/// Members are unique: re-inserting a byte-identical member updates its score.
#[derive(Debug, Clone)]
pub struct Partition {
    members: HashMap<String, i64>,
    expires_at: DateTime<Utc>,
}

impl Partition {
    /// A fresh, empty partition expiring `retention` after `now`.
    pub fn create(now: DateTime<Utc>, retention: RetentionDays) -> Self {
        Self {
            members: HashMap::new(),
            expires_at: expiry(now, retention),
        }
    }

    pub fn insert(&mut self, member: String, score: i64) {
        self.members.insert(member, score);
    }

    /// Reset the absolute expiry to `now + retention`.
    pub fn rearm(&mut self, now: DateTime<Utc>, retention: RetentionDays) {
        self.expires_at = expiry(now, retention);
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Members scored at or above `min_score`, in no particular order.
    pub fn range_from(&self, min_score: i64) -> Vec<String> {
        self.members
            .iter()
            .filter(|(_, score)| **score >= min_score)
            .map(|(member, _)| member.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Saturates at the end of the calendar for absurd retentions.
fn expiry(now: DateTime<Utc>, retention: RetentionDays) -> DateTime<Utc> {
    now.checked_add_signed(retention.as_delta())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
