use async_trait::async_trait;
use recs::domain::CacheKey;
use recs::ports::CacheStore;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use shared::{Result, ServingError, Ttl};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

/// Redis-backed store using `GET` and `SETEX`
///
/// The connection is opened on first use rather than at startup, so the
/// service comes up (and keeps serving fresh values) while Redis is down.
/// Once established, the connection manager reconnects on its own.
/// Connection attempts and individual commands both give up after
/// `timeout`.
pub struct RedisStore {
    client: redis::Client,
    timeout: Duration,
    connection: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Validate `url` and prepare a lazily connected store
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(store_error)?;
        Ok(Self {
            client,
            timeout,
            connection: OnceCell::new(),
        })
    }

    fn manager_config(&self) -> ConnectionManagerConfig {
        ConnectionManagerConfig::new()
            .set_connection_timeout(self.timeout)
            .set_response_timeout(self.timeout)
            .set_number_of_retries(1)
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let manager =
                    ConnectionManager::new_with_config(self.client.clone(), self.manager_config())
                        .await?;
                info!("Connected to Redis at {:?}", self.client.get_connection_info().addr);
                Ok::<_, redis::RedisError>(manager)
            })
            .await
            .map_err(store_error)?;

        // Cheap handle onto the shared multiplexed connection
        Ok(connection.clone())
    }
}

fn store_error(err: redis::RedisError) -> ServingError {
    ServingError::store(err.to_string())
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key.as_str()).await.map_err(store_error)?;
        Ok(value)
    }

    async fn set_ex(&self, key: &CacheKey, value: &str, ttl: Ttl) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(key.as_str(), value, ttl.as_secs_ceil())
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("timeout", &self.timeout)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}
