use crate::domain::error::DomainError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const GENERIC_ERROR_MESSAGE: &str = "I encountered an error processing your request. Please try again.";

/// Handler error. Client input errors echo their message; anything else is
/// logged and answered with a generic message.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(DomainError::InvalidInput(format!(
            "invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            DomainError::InvalidInput(msg) => {
                tracing::warn!(error = %msg, "rejected request");
                (StatusCode::BAD_REQUEST, msg)
            }
            e => {
                tracing::error!(error = %e, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
