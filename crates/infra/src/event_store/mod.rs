//! Partitioned event store boundary.
//!
//! Defines the storage abstraction the engine depends on plus its backends:
//! an in-memory store for tests/dev and a Redis sorted-set store (`redis` feature).

pub mod in_memory;
pub mod partition;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use partition::{Partition, PartitionKey, RetentionDays};
#[cfg(feature = "redis")]
pub use redis_store::RedisEventStore;
pub use r#trait::{EventStore, EventStoreError, StoreOperation, ALL_PARTITIONS};
