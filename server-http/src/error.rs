use crate::models::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ServingError;

/// Handler error carrying the serving failure to the client
#[derive(Debug)]
pub struct ApiError(pub ServingError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServingError::UpstreamFailure {
                timed_out: false, ..
            } => StatusCode::BAD_GATEWAY,
            ServingError::UpstreamFailure { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            ServingError::StoreUnavailable(_) => StatusCode::GATEWAY_TIMEOUT,
            ServingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ServingError> for ApiError {
    fn from(err: ServingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}
