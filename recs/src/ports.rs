#![deny(clippy::all)]

use crate::domain::CacheKey;
use async_trait::async_trait;
use shared::{FetchError, Result, Ttl};

// Ports are the pluggable extension points for the store and the prediction backend

/// Port for a key-value store with per-entry expiry (e.g., Redis)
///
/// Implementations must never return an entry after its TTL has elapsed and
/// report connectivity problems as `ServingError::StoreUnavailable`.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Short backend name used in logs and health output
    fn name(&self) -> &'static str;

    async fn get(&self, key: &CacheKey) -> Result<Option<String>>;

    async fn set_ex(&self, key: &CacheKey, value: &str, ttl: Ttl) -> Result<()>;
}

/// Port for the external prediction backend
#[async_trait]
pub trait Predictor: Send + Sync + 'static {
    async fn predict(&self, user_id: &str) -> std::result::Result<String, FetchError>;
}
