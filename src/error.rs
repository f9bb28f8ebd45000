//! Request-level errors and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::session::SessionError;
use crate::store::StoreError;

/// Everything a handler can fail with. The [`IntoResponse`] impl is the single
/// place where failures become HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// The request needs a signed-in session.
    #[error("Session required")]
    Unauthorized,
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to encode auth session: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Storage(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Session(_) | Self::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
            return (status, "Internal Server Error").into_response();
        }
        (status, format!("Error: {self}")).into_response()
    }
}
