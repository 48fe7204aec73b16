use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Redis => "redis",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" | "moka" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub redis_host: String,
    pub redis_port: u16,
    pub store_backend: StoreBackend,
    pub store_timeout: Duration,
    pub fetch_timeout: Duration,
    pub single_flight: bool,
    pub prediction_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const DEFAULT_REDIS_HOST: &str = "localhost";
    const DEFAULT_REDIS_PORT: u16 = 6379;
    const DEFAULT_STORE_TIMEOUT_MS: u64 = 250;
    const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_timeout_ms = parse_or(&lookup, "STORE_TIMEOUT_MS", Self::DEFAULT_STORE_TIMEOUT_MS);
        let fetch_timeout_ms = parse_or(&lookup, "FETCH_TIMEOUT_MS", Self::DEFAULT_FETCH_TIMEOUT_MS);

        Self {
            host: lookup("HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", Self::DEFAULT_PORT),
            redis_host: lookup("REDIS_HOST").unwrap_or_else(|| Self::DEFAULT_REDIS_HOST.to_string()),
            redis_port: parse_or(&lookup, "REDIS_PORT", Self::DEFAULT_REDIS_PORT),
            store_backend: parse_or(&lookup, "STORE_BACKEND", StoreBackend::Redis),
            store_timeout: Duration::from_millis(store_timeout_ms.max(1)),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms.max(1)),
            single_flight: lookup("SINGLE_FLIGHT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            prediction_endpoint: lookup("PREDICTION_ENDPOINT")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
