use crate::domain::{CacheKey, Lookup, Source};
use crate::planes::data::single_flight::SingleFlight;
use crate::planes::data::stats::{CacheStats, StatsSnapshot};
use crate::ports::CacheStore;
use shared::{FetchError, Result, ServingError, Ttl};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Upper bounds for the two external calls made on a lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub store: Duration,
    pub fetch: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            store: Duration::from_millis(250),
            fetch: Duration::from_secs(5),
        }
    }
}

/// Read-through cache in front of an external lookup
///
/// Holds no cached data itself; everything lives in the injected store.
/// Store failures never fail a lookup: an unreadable store is treated as a
/// miss and an unwritable one only loses the cache population. Both are
/// logged and counted.
#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn CacheStore>,
    timeouts: Timeouts,
    stats: Arc<CacheStats>,
    single_flight: Option<Arc<SingleFlight<Result<String>>>>,
}

impl ReadThroughCache {
    pub fn new(store: Arc<dyn CacheStore>, timeouts: Timeouts) -> Self {
        Self {
            store,
            timeouts,
            stats: Arc::new(CacheStats::default()),
            single_flight: None,
        }
    }

    /// Coalesce concurrent misses on the same key into one fetch
    pub fn with_single_flight(mut self) -> Self {
        self.single_flight = Some(Arc::new(SingleFlight::new()));
        self
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Serve `key` from the store, or compute it with `fetch` and populate the store
    ///
    /// `fetch` is invoked at most once and never on a hit. A failed fetch is
    /// returned as `UpstreamFailure` and nothing is written.
    pub async fn get_or_compute<F, Fut>(&self, key: &CacheKey, ttl: Ttl, fetch: F) -> Result<Lookup>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<String, FetchError>> + Send + 'static,
    {
        if let Some(value) = self.read(key).await {
            self.stats.record_hit();
            debug!(key = %key, "cache hit");
            return Ok(Lookup::new(value, Source::Cache));
        }

        self.stats.record_miss();
        debug!(key = %key, "cache miss, fetching");

        let populate = Populate {
            store: Arc::clone(&self.store),
            stats: Arc::clone(&self.stats),
            timeouts: self.timeouts,
            key: key.clone(),
            ttl,
        };

        let value = match &self.single_flight {
            Some(group) => {
                let (result, leader) = group
                    .work(key.as_str(), move || populate.run(fetch()))
                    .await;
                if !leader {
                    self.stats.record_coalesced();
                    debug!(key = %key, "joined in-flight fetch");
                }
                result.map_err(|e| {
                    self.stats.record_fetch_failure();
                    warn!(key = %key, error = %e, "in-flight fetch ended without a value");
                    ServingError::upstream(e.to_string())
                })??
            }
            None => populate.run(fetch()).await?,
        };

        Ok(Lookup::new(value, Source::Computed))
    }

    async fn read(&self, key: &CacheKey) -> Option<String> {
        match timeout(self.timeouts.store, self.store.get(key)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.stats.record_store_read_failure();
                warn!(key = %key, store = self.store.name(), error = %e, "store read failed, computing fresh value");
                None
            }
            Err(_) => {
                self.stats.record_store_read_failure();
                warn!(
                    key = %key,
                    store = self.store.name(),
                    timeout_ms = self.timeouts.store.as_millis() as u64,
                    "store read timed out, computing fresh value"
                );
                None
            }
        }
    }
}

impl fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("store", &self.store.name())
            .field("timeouts", &self.timeouts)
            .field("single_flight", &self.single_flight.is_some())
            .finish()
    }
}

/// Owned state for the miss path, so it can run as a shared future
struct Populate {
    store: Arc<dyn CacheStore>,
    stats: Arc<CacheStats>,
    timeouts: Timeouts,
    key: CacheKey,
    ttl: Ttl,
}

impl Populate {
    async fn run<Fut>(self, fetch: Fut) -> Result<String>
    where
        Fut: Future<Output = std::result::Result<String, FetchError>>,
    {
        let value = match timeout(self.timeouts.fetch, fetch).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.stats.record_fetch_failure();
                warn!(key = %self.key, error = %e, "fetch failed, nothing cached");
                return Err(e.into());
            }
            Err(_) => {
                self.stats.record_fetch_failure();
                warn!(
                    key = %self.key,
                    timeout_ms = self.timeouts.fetch.as_millis() as u64,
                    "fetch timed out, nothing cached"
                );
                return Err(ServingError::upstream_timeout(self.timeouts.fetch));
            }
        };

        let write = self.store.set_ex(&self.key, &value, self.ttl);
        match timeout(self.timeouts.store, write).await {
            Ok(Ok(())) => {
                debug!(key = %self.key, ttl_secs = self.ttl.as_secs_ceil(), "cached fresh value");
            }
            Ok(Err(e)) => {
                self.stats.record_store_write_failure();
                warn!(key = %self.key, store = self.store.name(), error = %e, "store write failed, serving uncached value");
            }
            Err(_) => {
                self.stats.record_store_write_failure();
                warn!(
                    key = %self.key,
                    store = self.store.name(),
                    timeout_ms = self.timeouts.store.as_millis() as u64,
                    "store write timed out, serving uncached value"
                );
            }
        }

        Ok(value)
    }
}
