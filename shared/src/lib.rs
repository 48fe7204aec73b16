// shared/src/lib.rs

use std::time::Duration;

/// Errors surfaced while serving a recommendation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServingError {
    /// The prediction backend failed or did not answer in time
    #[error("upstream failure: {reason}")]
    UpstreamFailure { reason: String, timed_out: bool },
    /// The cache backend could not be reached for a read or a write
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ServingError {
    pub fn upstream(reason: impl Into<String>) -> Self {
        ServingError::UpstreamFailure {
            reason: reason.into(),
            timed_out: false,
        }
    }

    pub fn upstream_timeout(after: Duration) -> Self {
        ServingError::UpstreamFailure {
            reason: format!("no answer within {}ms", after.as_millis()),
            timed_out: true,
        }
    }

    pub fn store(reason: impl Into<String>) -> Self {
        ServingError::StoreUnavailable(reason.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ServingError::UpstreamFailure { timed_out: true, .. })
    }
}

/// Failure reported by a prediction backend
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("prediction backend unreachable: {0}")]
    Transport(String),
    #[error("prediction backend returned status {0}")]
    Status(u16),
    #[error("malformed prediction response: {0}")]
    Malformed(String),
    #[error("prediction backend timed out: {0}")]
    Timeout(String),
}

impl From<FetchError> for ServingError {
    fn from(err: FetchError) -> Self {
        let timed_out = matches!(err, FetchError::Timeout(_));
        ServingError::UpstreamFailure {
            reason: err.to_string(),
            timed_out,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServingError>;

/// Strictly positive time-to-live for a cache entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ttl(Duration);

impl Ttl {
    /// TTL applied to every recommendation entry
    pub const RECOMMENDATIONS: Ttl = Ttl(Duration::from_secs(3600));

    pub fn new(duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(ServingError::InvalidRequest(
                "ttl must be greater than zero".to_string(),
            ));
        }
        Ok(Self(duration))
    }

    pub fn from_secs(secs: u64) -> Result<Self> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Whole seconds, rounded up so sub-second TTLs never become zero
    pub fn as_secs_ceil(&self) -> u64 {
        let secs = self.0.as_secs();
        if self.0.subsec_nanos() > 0 { secs + 1 } else { secs }
    }
}

pub mod config;
