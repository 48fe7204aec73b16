use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Liveness
        .route("/health", get(handlers::health_check))
        .route(
            "/recommendations/{user_id}",
            get(handlers::get_recommendations),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router wrapped so trailing slashes are trimmed before routing
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use recs::ports::Predictor;
    use recs::{ReadThroughCache, Timeouts};
    use serde_json::Value;
    use shared::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use storage_engine::MokaCache;
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingPredictor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Predictor for CountingPredictor {
        async fn predict(&self, user_id: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("recs for {}", user_id))
        }
    }

    struct FailingPredictor;

    #[async_trait]
    impl Predictor for FailingPredictor {
        async fn predict(&self, _user_id: &str) -> Result<String, FetchError> {
            Err(FetchError::Status(500))
        }
    }

    struct SlowPredictor;

    #[async_trait]
    impl Predictor for SlowPredictor {
        async fn predict(&self, _user_id: &str) -> Result<String, FetchError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    struct TimingOutPredictor;

    #[async_trait]
    impl Predictor for TimingOutPredictor {
        async fn predict(&self, _user_id: &str) -> Result<String, FetchError> {
            Err(FetchError::Timeout("operation timed out".to_string()))
        }
    }

    fn test_state(predictor: Arc<dyn Predictor>) -> AppState {
        let timeouts = Timeouts {
            store: Duration::from_millis(250),
            fetch: Duration::from_millis(50),
        };
        let cache = ReadThroughCache::new(Arc::new(MokaCache::new_unbounded()), timeouts)
            .with_single_flight();
        AppState::new(cache, predictor)
    }

    async fn get_json(app: &NormalizePath<Router>, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let predictor = Arc::new(CountingPredictor::default());
        let app = build_app(test_state(predictor.clone()));

        let (status, body) = get_json(&app, "/recommendations/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "model");
        assert_eq!(body["data"], "recs for 42");

        let (status, body) = get_json(&app, "/recommendations/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "cache");
        assert_eq!(body["data"], "recs for 42");

        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_trailing_slash_is_normalized() {
        let predictor = Arc::new(CountingPredictor::default());
        let app = build_app(test_state(predictor));

        let (status, body) = get_json(&app, "/recommendations/7/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "recs for 7");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let app = build_app(test_state(Arc::new(FailingPredictor)));

        let (status, body) = get_json(&app, "/recommendations/42").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("prediction backend returned status 500"));
    }

    #[tokio::test]
    async fn test_upstream_timeout_is_gateway_timeout() {
        let app = build_app(test_state(Arc::new(SlowPredictor)));

        let (status, body) = get_json(&app, "/recommendations/42").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_client_side_timeout_is_gateway_timeout() {
        let app = build_app(test_state(Arc::new(TimingOutPredictor)));

        let (status, body) = get_json(&app, "/recommendations/42").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_whitespace_user_id_is_served() {
        let predictor = Arc::new(CountingPredictor::default());
        let app = build_app(test_state(predictor));

        let (status, body) = get_json(&app, "/recommendations/%20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "model");
    }

    #[tokio::test]
    async fn test_health_reports_store_and_stats() {
        let predictor = Arc::new(CountingPredictor::default());
        let app = build_app(test_state(predictor));

        get_json(&app, "/recommendations/1").await;
        get_json(&app, "/recommendations/1").await;

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["stats"]["hits"], 1);
        assert_eq!(body["stats"]["misses"], 1);
    }
}
