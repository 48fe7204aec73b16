use async_trait::async_trait;
use recs::ports::Predictor;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::FetchError;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct Instance<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Value,
}

/// Client for an online prediction endpoint
///
/// Sends `{"instances":[{"user_id": ...}]}` and reads back `{"predictions": ...}`.
/// String predictions are returned as-is; anything else is returned as JSON text.
#[derive(Clone, Debug)]
pub struct HttpPredictor {
    client: Client,
    endpoint: Url,
}

impl HttpPredictor {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| FetchError::Transport(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, user_id: &str) -> Result<String, FetchError> {
        let request = PredictRequest {
            instances: [Instance { user_id }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: PredictResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::Malformed(e.to_string())
            }
        })?;

        debug!(user_id, "prediction received");

        match body.predictions {
            Value::String(text) => Ok(text),
            Value::Null => Err(FetchError::Malformed("predictions is null".to_string())),
            other => Ok(other.to_string()),
        }
    }
}
