//! Prediction backends that produce recommendations on a cache miss

mod http;
mod placeholder;

pub use http::HttpPredictor;
pub use placeholder::PlaceholderPredictor;

use recs::ports::Predictor;
use shared::FetchError;
use shared::config::Config;
use std::sync::Arc;
use tracing::{info, warn};

/// Pick the HTTP backend when an endpoint is configured, the placeholder otherwise
pub fn build_predictor(config: &Config) -> Result<Arc<dyn Predictor>, FetchError> {
    match &config.prediction_endpoint {
        Some(endpoint) => {
            info!("Using prediction endpoint {}", endpoint);
            Ok(Arc::new(HttpPredictor::new(endpoint, config.fetch_timeout)?))
        }
        None => {
            warn!("PREDICTION_ENDPOINT not set, serving placeholder recommendations");
            Ok(Arc::new(PlaceholderPredictor))
        }
    }
}
