//! Redis-backed partitioned event store (sorted set per partition).
//!
//! - **Partition**: one sorted set per key, members are encoded events, scores are `createdAt`
//! - **Append**: `ZADD` + `EXPIRE` in a single `MULTI`/`EXEC` pipeline
//! - **Range**: `ZRANGEBYSCORE key <min> +inf`
//! - **Flush**: `DEL` (idempotent)
//! - **Size**: `DBSIZE`
//!
//! Retention uses Redis' native key TTL, so an expired partition simply stops
//! existing. Expiry is reaped by Redis on its own schedule.

use analytics_core::Event;
use redis::aio::MultiplexedConnection;
use tracing::{error, instrument};

use super::partition::{PartitionKey, RetentionDays};
use super::r#trait::{encode_member, EventStore, EventStoreError, StoreOperation, ALL_PARTITIONS};

#[derive(Clone)]
pub struct RedisEventStore {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl core::fmt::Debug for RedisEventStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisEventStore")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl RedisEventStore {
    /// Open a shared multiplexed connection and verify it with `PING`.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, EventStoreError> {
        let unavailable =
            |e: redis::RedisError| EventStoreError::unavailable(StoreOperation::Connect, ALL_PARTITIONS, e.to_string());

        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(Self { client, conn })
    }
}

fn command_failed(
    operation: StoreOperation,
    partition: impl ToString,
) -> impl FnOnce(redis::RedisError) -> EventStoreError {
    move |e| {
        let err = EventStoreError::unavailable(operation, partition, e.to_string());
        error!(error = %err, "redis command failed");
        err
    }
}

#[async_trait::async_trait]
impl EventStore for RedisEventStore {
    #[instrument(skip(self, event), fields(partition = %partition, created_at = event.created_at()), err)]
    async fn append(
        &self,
        partition: &PartitionKey,
        event: &Event,
        retention: RetentionDays,
    ) -> Result<(), EventStoreError> {
        let member = encode_member(partition, event)?;
        let mut conn = self.conn.clone();

        redis::pipe()
            .atomic()
            .cmd("ZADD")
            .arg(partition.as_str())
            .arg(event.created_at())
            .arg(&member)
            .ignore()
            .cmd("EXPIRE")
            .arg(partition.as_str())
            .arg(retention.as_secs())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(command_failed(StoreOperation::Append, partition))
    }

    #[instrument(skip(self), fields(partition = %partition), err)]
    async fn range_from(
        &self,
        partition: &PartitionKey,
        min_score: i64,
    ) -> Result<Vec<String>, EventStoreError> {
        let mut conn = self.conn.clone();

        redis::cmd("ZRANGEBYSCORE")
            .arg(partition.as_str())
            .arg(min_score)
            .arg("+inf")
            .query_async::<_, Vec<String>>(&mut conn)
            .await
            .map_err(command_failed(StoreOperation::RangeFrom, partition))
    }

    #[instrument(skip(self), fields(partition = %partition), err)]
    async fn delete_partition(&self, partition: &PartitionKey) -> Result<(), EventStoreError> {
        let mut conn = self.conn.clone();

        redis::cmd("DEL")
            .arg(partition.as_str())
            .query_async::<_, u64>(&mut conn)
            .await
            .map(|_| ())
            .map_err(command_failed(StoreOperation::DeletePartition, partition))
    }

    async fn size(&self) -> Result<u64, EventStoreError> {
        let mut conn = self.conn.clone();

        redis::cmd("DBSIZE")
            .query_async::<_, u64>(&mut conn)
            .await
            .map_err(command_failed(StoreOperation::Size, ALL_PARTITIONS))
    }
}
