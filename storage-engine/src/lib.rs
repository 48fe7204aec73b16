//! Store adapters for the recommendation cache

mod moka_cache;
mod redis_store;

pub use moka_cache::MokaCache;
pub use redis_store::RedisStore;

use recs::ports::CacheStore;
use shared::Result;
use shared::config::{Config, StoreBackend};
use std::sync::Arc;
use tracing::info;

/// Entry bound for the in-process backend
const MEMORY_MAX_ENTRIES: u64 = 100_000;

/// Build the store selected by `config.store_backend`
pub fn build_store(config: &Config) -> Result<Arc<dyn CacheStore>> {
    match config.store_backend {
        StoreBackend::Redis => {
            let url = config.redis_url();
            info!("Using Redis store at {}", url);
            Ok(Arc::new(RedisStore::new(&url, config.store_timeout)?))
        }
        StoreBackend::Memory => {
            info!("Using in-process store (max {} entries)", MEMORY_MAX_ENTRIES);
            Ok(Arc::new(MokaCache::new_bounded(MEMORY_MAX_ENTRIES)))
        }
    }
}
