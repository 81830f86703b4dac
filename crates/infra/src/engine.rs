//! The analytics engine: ingestion, aggregation queries and partition flushes.
//!
//! ```text
//! submit_event:      EventDraft → validate → EventStore::append (+ re-arm retention)
//! query_aggregation: type, lookback → Cutoffs → EventStore::range_from(monthly) → fold
//! flush_partition:   type → EventStore::delete_partition
//! ```
//!
//! The engine keeps no state between calls. It holds the store handle, the
//! clock used as "now", and the calendar zone used for bucket labels, all
//! injected at construction.

use std::sync::Arc;

use analytics_core::{
    fold, AggregationResult, Clock, Cutoffs, DomainError, EventDraft, Lookback, SystemClock,
};
use chrono::{Local, TimeZone};
use thiserror::Error;
use tracing::{info, instrument};

use crate::event_store::{EventStore, EventStoreError, PartitionKey, RetentionDays, StoreOperation};

/// Engine configuration consumed from the surrounding process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub store_prefix: String,
    pub max_age: RetentionDays,
}

impl EngineConfig {
    pub const DEFAULT_PREFIX: &'static str = "analyticsEngine";

    pub fn new(max_age: RetentionDays) -> Self {
        Self {
            store_prefix: Self::DEFAULT_PREFIX.to_string(),
            max_age,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.store_prefix = prefix.into();
        self
    }

    pub fn partition_key(&self, event_type: &str) -> PartitionKey {
        PartitionKey::new(&self.store_prefix, event_type)
    }
}

/// Errors surfaced by the engine.
///
/// Store failures keep the operation and partition key so they can be shown
/// to the caller as-is. Nothing is retried.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A required field was missing or malformed; the store was not touched.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to serialize event for '{partition}': {message}")]
    Serialization { partition: String, message: String },

    #[error("store unavailable during {operation} on '{partition}': {message}")]
    StoreUnavailable {
        operation: StoreOperation,
        partition: String,
        message: String,
    },
}

impl From<EventStoreError> for AnalyticsError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Unavailable {
                operation,
                partition,
                message,
            } => AnalyticsError::StoreUnavailable {
                operation,
                partition,
                message,
            },
            EventStoreError::Serialization { partition, message } => {
                AnalyticsError::Serialization { partition, message }
            }
        }
    }
}

/// Ingestion only ever fails validation; keep the field message as-is.
fn rejected(err: DomainError) -> AnalyticsError {
    match err {
        DomainError::Validation(msg) => AnalyticsError::Validation(msg),
        other => AnalyticsError::Validation(other.to_string()),
    }
}

/// Event aggregation engine over a partitioned store.
///
/// `S` is the store backend, `Tz` the calendar zone for bucket labels (the
/// server's local zone unless a test pins another one).
pub struct Analytics<S, Tz = Local>
where
    Tz: TimeZone,
{
    store: S,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl<S> Analytics<S, Local>
where
    S: EventStore,
{
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock), Local)
    }
}

impl<S, Tz> Analytics<S, Tz>
where
    S: EventStore,
    Tz: TimeZone + Send + Sync,
{
    pub fn with_clock(store: S, config: EngineConfig, clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self {
            store,
            config,
            clock,
            tz,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate and persist one event into its `type` partition.
    ///
    /// Validation runs before any store interaction.
    #[instrument(skip(self, draft), fields(event_type = ?draft.event_type), err)]
    pub async fn submit_event(&self, draft: EventDraft) -> Result<(), AnalyticsError> {
        let event = draft.validate().map_err(rejected)?;
        let partition = self.config.partition_key(event.event_type());

        self.store
            .append(&partition, &event, self.config.max_age)
            .await?;

        info!(partition = %partition, name = event.name(), "event stored");
        Ok(())
    }

    /// Aggregate one partition into daily/weekly/monthly count tables.
    ///
    /// A single range fetch anchored at the monthly cutoff feeds all three
    /// granularities; the narrower cutoffs are applied in memory.
    #[instrument(skip(self), fields(lookback = lookback.days()), err)]
    pub async fn query_aggregation(
        &self,
        event_type: &str,
        lookback: Lookback,
        unique_id: Option<&str>,
    ) -> Result<AggregationResult, AnalyticsError> {
        let partition = self.partition_for(event_type)?;
        let cutoffs = {
            let now = self.clock.now().with_timezone(&self.tz);
            Cutoffs::compute(&now, lookback)
        };

        let records = self.store.range_from(&partition, cutoffs.oldest()).await?;
        let fetched = records.len();
        let result = fold(&records, &cutoffs, unique_id, &self.tz);

        info!(partition = %partition, fetched, names = result.usages.len(), "aggregation computed");
        Ok(result)
    }

    /// Delete a whole partition. Flushing an absent partition succeeds.
    #[instrument(skip(self), err)]
    pub async fn flush_partition(&self, event_type: &str) -> Result<(), AnalyticsError> {
        let partition = self.partition_for(event_type)?;
        self.store.delete_partition(&partition).await?;

        info!(partition = %partition, "partition flushed");
        Ok(())
    }

    /// Number of keys held by the store.
    pub async fn size(&self) -> Result<u64, AnalyticsError> {
        Ok(self.store.size().await?)
    }

    fn partition_for(&self, event_type: &str) -> Result<PartitionKey, AnalyticsError> {
        if event_type.trim().is_empty() {
            return Err(AnalyticsError::Validation("type is required".to_string()));
        }
        Ok(self.config.partition_key(event_type))
    }
}
