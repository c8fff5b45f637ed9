use crate::types::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Everything a handler can fail with. Upstream trouble is not here: it is
/// absorbed into fallback answers before it gets this far.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed. Use POST.")]
    MethodNotAllowed,

    #[error("Missing 'question' field in request body.")]
    MissingQuestion,

    #[error("Invalid sensor readings in request body.")]
    InvalidReadings,

    #[error("Missing 'message' field in request body.")]
    MissingMessage,

    #[error("Invalid chat history in request body.")]
    InvalidChat,

    #[error("Missing 'query' or 'location' field in request body.")]
    MissingResourceQuery,

    #[error("Request body too large.")]
    BodyTooLarge(String),

    #[error("API key not configured")]
    MissingApiKey,

    #[error("Failed to process request")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::MissingQuestion
            | AppError::InvalidReadings
            | AppError::MissingMessage
            | AppError::InvalidChat
            | AppError::MissingResourceQuery => StatusCode::BAD_REQUEST,
            AppError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MissingApiKey | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(msg) | AppError::BodyTooLarge(msg) => Some(msg.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
