use serde::Serialize;
use shared::{Result, ServingError};
use std::fmt;

/// Key under which a user's recommendations are cached
///
/// Keys are derived as `recs:{user_id}`. The prefix is fixed and the user id
/// is embedded verbatim, so two distinct user ids never map to the same key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub const PREFIX: &'static str = "recs";

    pub fn for_user(user_id: &str) -> Result<Self> {
        if user_id.is_empty() {
            return Err(ServingError::InvalidRequest(
                "user id must not be empty".to_string(),
            ));
        }
        Ok(Self(format!("{}:{}", Self::PREFIX, user_id)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a served value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Source {
    #[serde(rename = "cache")]
    Cache,
    #[serde(rename = "model")]
    Computed,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Computed => "model",
        }
    }
}

/// Result of a read-through lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup {
    pub value: String,
    pub source: Source,
}

impl Lookup {
    pub fn new(value: impl Into<String>, source: Source) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }
}
