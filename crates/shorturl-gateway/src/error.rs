use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shorturl_core::ResolveError;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("request did not complete within {0:?}")]
    DeadlineExceeded(Duration),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::Resolve(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Resolve(_) | AppError::DeadlineExceeded(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors are answered as `text/plain` with the error message as the body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "rejected request");
        }
        (status, self.to_string()).into_response()
    }
}
