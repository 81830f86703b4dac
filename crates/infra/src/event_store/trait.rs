use std::sync::Arc;

use analytics_core::Event;
use thiserror::Error;

use super::partition::{PartitionKey, RetentionDays};

/// Store operation, carried in errors for context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Connect,
    Append,
    RangeFrom,
    DeletePartition,
    Size,
}

impl core::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            StoreOperation::Connect => "connect",
            StoreOperation::Append => "append",
            StoreOperation::RangeFrom => "range_from",
            StoreOperation::DeletePartition => "delete_partition",
            StoreOperation::Size => "size",
        })
    }
}

/// Event store operation error.
///
/// These are **infrastructure errors**. Every variant names the partition it
/// concerns so it can be surfaced to the caller verbatim.
///
/// ## Error Categories
///
/// - **Unavailable**: the backing store could not be reached or rejected the command
/// - **Serialization**: the event could not be encoded into a stored member
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("store unavailable during {operation} on '{partition}': {message}")]
    Unavailable {
        operation: StoreOperation,
        partition: String,
        message: String,
    },

    #[error("failed to serialize event for '{partition}': {message}")]
    Serialization { partition: String, message: String },
}

impl EventStoreError {
    pub fn unavailable(
        operation: StoreOperation,
        partition: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self::Unavailable {
            operation,
            partition: partition.to_string(),
            message: message.into(),
        }
    }

    pub fn serialization(partition: impl ToString, message: impl Into<String>) -> Self {
        Self::Serialization {
            partition: partition.to_string(),
            message: message.into(),
        }
    }
}

/// Label used in errors for operations that span every partition.
pub const ALL_PARTITIONS: &str = "*";

/// Partitioned, time-scored event store.
///
/// Each partition is a sorted set of serialized events scored by `createdAt`.
/// The store owns partition lifetime: partitions appear on first append and
/// vanish on expiry or flush. Nothing outside the store tracks them.
///
/// ## Operation Semantics
///
/// - `append`: serialize, insert scored by `createdAt`, then re-arm the
///   partition expiry to `now + retention`
/// - `range_from`: every member with score `>= min_score`, unordered; a missing
///   or expired partition yields an empty vector, not an error
/// - `delete_partition`: idempotent
/// - `size`: number of keys held by the store
///
/// Per-key operations are atomic with respect to each other. There is no
/// cross-partition transaction and no read-after-write guarantee between a
/// concurrent append and range fetch.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    async fn append(
        &self,
        partition: &PartitionKey,
        event: &Event,
        retention: RetentionDays,
    ) -> Result<(), EventStoreError>;

    async fn range_from(
        &self,
        partition: &PartitionKey,
        min_score: i64,
    ) -> Result<Vec<String>, EventStoreError>;

    async fn delete_partition(&self, partition: &PartitionKey) -> Result<(), EventStoreError>;

    async fn size(&self) -> Result<u64, EventStoreError>;
}

#[async_trait::async_trait]
impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    async fn append(
        &self,
        partition: &PartitionKey,
        event: &Event,
        retention: RetentionDays,
    ) -> Result<(), EventStoreError> {
        (**self).append(partition, event, retention).await
    }

    async fn range_from(
        &self,
        partition: &PartitionKey,
        min_score: i64,
    ) -> Result<Vec<String>, EventStoreError> {
        (**self).range_from(partition, min_score).await
    }

    async fn delete_partition(&self, partition: &PartitionKey) -> Result<(), EventStoreError> {
        (**self).delete_partition(partition).await
    }

    async fn size(&self) -> Result<u64, EventStoreError> {
        (**self).size().await
    }
}

/// Encode an event for `partition`, mapping failures to a store error.
pub(crate) fn encode_member(partition: &PartitionKey, event: &Event) -> Result<String, EventStoreError> {
    analytics_core::codec::encode(event)
        .map_err(|e| EventStoreError::serialization(partition, e.to_string()))
}
