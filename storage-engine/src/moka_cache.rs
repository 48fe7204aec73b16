use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use recs::domain::CacheKey;
use recs::ports::CacheStore;
use shared::{Result, Ttl};
use std::fmt::Debug;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Moka-based in-process store with per-entry TTL
/// Provides lock-free, concurrent cache with optional size bound
pub struct MokaCache {
    cache: Cache<String, Entry>,
}

impl MokaCache {
    /// Create a new unbounded Moka store
    pub fn new_unbounded() -> Self {
        Self {
            cache: Cache::builder().expire_after(PerEntryTtl).build(),
        }
    }

    /// Create a new bounded Moka store holding at most `max_entries`
    pub fn new_bounded(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

#[async_trait]
impl CacheStore for MokaCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        // Expired entries are never returned, even before they are evicted
        Ok(self.cache.get(key.as_str()).await.map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &CacheKey, value: &str, ttl: Ttl) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            ttl: ttl.as_duration(),
        };
        self.cache.insert(key.as_str().to_string(), entry).await;
        Ok(())
    }
}

impl Debug for MokaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
