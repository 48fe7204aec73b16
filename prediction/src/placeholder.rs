use async_trait::async_trait;
use recs::ports::Predictor;
use shared::FetchError;

/// Fixed stand-in for the model, used until a real endpoint is configured
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderPredictor;

#[async_trait]
impl Predictor for PlaceholderPredictor {
    async fn predict(&self, user_id: &str) -> Result<String, FetchError> {
        Ok(format!(
            "Recommended properties for user {}: [prop_123, prop_456, prop_789]",
            user_id
        ))
    }
}
