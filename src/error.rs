use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A required field was missing from an otherwise well-formed body.
    #[error("{0}")]
    Validation(&'static str),
    /// The request body could not be read as the expected JSON shape.
    #[error("{0}")]
    MalformedInput(#[from] serde_json::Error),
    #[error("{0}")]
    Processing(String),
    /// Sending to the messaging provider failed. Callers turn this into a flag; it never
    /// becomes a response.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl From<time::error::Format> for AppError {
    fn from(e: time::error::Format) -> Self {
        AppError::Processing(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Delivery(e.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedInput(_) | AppError::Processing(_) | AppError::Delivery(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn handle_error(e: impl std::error::Error) {
    error!("ERROR: {e}")
}
