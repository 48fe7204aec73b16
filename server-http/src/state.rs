use recs::ports::Predictor;
use recs::{ReadThroughCache, Timeouts};
use shared::config::Config;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: ReadThroughCache,
    pub predictor: Arc<dyn Predictor>,
}

impl AppState {
    pub fn new(cache: ReadThroughCache, predictor: Arc<dyn Predictor>) -> Self {
        Self { cache, predictor }
    }

    /// Wire the configured store and prediction backend into the read-through cache
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let store = storage_engine::build_store(config)?;
        let predictor = prediction::build_predictor(config)?;

        let timeouts = Timeouts {
            store: config.store_timeout,
            fetch: config.fetch_timeout,
        };
        let mut cache = ReadThroughCache::new(store, timeouts);
        if config.single_flight {
            cache = cache.with_single_flight();
        }

        tracing::info!(
            "Read-through cache ready: store={}, store_timeout={:?}, fetch_timeout={:?}, single_flight={}",
            cache.store_name(),
            timeouts.store,
            timeouts.fetch,
            config.single_flight
        );

        Ok(Self::new(cache, predictor))
    }
}
