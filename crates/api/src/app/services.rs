use std::sync::Arc;
use std::time::Instant;

use analytics_infra::{
    config::Config,
    engine::Analytics,
    event_store::{EventStore, EventStoreError, InMemoryEventStore},
};

#[cfg(feature = "redis")]
use analytics_infra::event_store::RedisEventStore;

/// Type-erased engine: the store backend is picked at startup.
pub type SharedAnalytics = Analytics<Arc<dyn EventStore>>;

pub struct AppServices {
    pub analytics: SharedAnalytics,
    pub started_at: Instant,
}

impl AppServices {
    pub fn new(analytics: SharedAnalytics) -> Self {
        Self {
            analytics,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Wire the store and engine from configuration.
///
/// Redis is used when `REDIS_URL` is set; otherwise the process keeps events
/// in memory, which loses them on restart.
pub async fn build_services(config: &Config) -> Result<AppServices, EventStoreError> {
    let store = build_store(config).await?;
    Ok(AppServices::new(Analytics::new(store, config.engine.clone())))
}

#[cfg(feature = "redis")]
async fn build_store(config: &Config) -> Result<Arc<dyn EventStore>, EventStoreError> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisEventStore::connect(url).await?;
            tracing::info!("using redis event store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("REDIS_URL not set; using in-memory event store");
            Ok(Arc::new(InMemoryEventStore::new()))
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn build_store(config: &Config) -> Result<Arc<dyn EventStore>, EventStoreError> {
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL set but built without the redis feature; using in-memory event store");
    } else {
        tracing::warn!("REDIS_URL not set; using in-memory event store");
    }
    Ok(Arc::new(InMemoryEventStore::new()))
}
