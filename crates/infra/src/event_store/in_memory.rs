use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use analytics_core::{Clock, Event, SystemClock};

use super::partition::{Partition, PartitionKey, RetentionDays};
use super::r#trait::{encode_member, EventStore, EventStoreError, StoreOperation, ALL_PARTITIONS};

/// In-memory partitioned event store.
///
/// Intended for tests/dev. Expiry is evaluated against the injected clock and
/// expired partitions are reaped lazily on the next write.
pub struct InMemoryEventStore {
    partitions: RwLock<HashMap<PartitionKey, Partition>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn poisoned(operation: StoreOperation, partition: impl ToString) -> EventStoreError {
        EventStoreError::unavailable(operation, partition, "lock poisoned")
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for InMemoryEventStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let partitions = self.partitions.read().map(|p| p.len()).unwrap_or_default();
        f.debug_struct("InMemoryEventStore")
            .field("partitions", &partitions)
            .finish()
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        partition: &PartitionKey,
        event: &Event,
        retention: RetentionDays,
    ) -> Result<(), EventStoreError> {
        let member = encode_member(partition, event)?;
        let now = self.clock.now();

        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| Self::poisoned(StoreOperation::Append, partition))?;

        partitions.retain(|_, p| !p.is_expired(now));

        let entry = partitions
            .entry(partition.clone())
            .or_insert_with(|| Partition::create(now, retention));
        entry.insert(member, event.created_at());
        entry.rearm(now, retention);

        Ok(())
    }

    async fn range_from(
        &self,
        partition: &PartitionKey,
        min_score: i64,
    ) -> Result<Vec<String>, EventStoreError> {
        let now = self.clock.now();
        let partitions = self
            .partitions
            .read()
            .map_err(|_| Self::poisoned(StoreOperation::RangeFrom, partition))?;

        Ok(partitions
            .get(partition)
            .filter(|p| !p.is_expired(now))
            .map(|p| p.range_from(min_score))
            .unwrap_or_default())
    }

    async fn delete_partition(&self, partition: &PartitionKey) -> Result<(), EventStoreError> {
        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| Self::poisoned(StoreOperation::DeletePartition, partition))?;

        partitions.remove(partition);
        Ok(())
    }

    async fn size(&self) -> Result<u64, EventStoreError> {
        let now = self.clock.now();
        let partitions = self
            .partitions
            .read()
            .map_err(|_| Self::poisoned(StoreOperation::Size, ALL_PARTITIONS))?;

        Ok(partitions.values().filter(|p| !p.is_expired(now)).count() as u64)
    }
}
