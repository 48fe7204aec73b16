use recs::{Source, StatsSnapshot};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub source: Source,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub stats: StatsSnapshot,
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
