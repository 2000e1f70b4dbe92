use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use vigil_domain::VigilError;

/// JSON error body `{"error": "..."}` with the status derived from the
/// domain error. Internal details are logged, not returned.
#[derive(Debug)]
pub struct ApiError(pub VigilError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            VigilError::Validation(_) => StatusCode::BAD_REQUEST,
            VigilError::Unauthorized => StatusCode::UNAUTHORIZED,
            VigilError::NotFound(_) => StatusCode::NOT_FOUND,
            VigilError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VigilError> for ApiError {
    fn from(err: VigilError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(VigilError::Internal(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            VigilError::Internal(e) => {
                error!("request failed: {e:#}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
