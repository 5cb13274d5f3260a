//! Error types for the nbpdf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::convert::ConversionError;
use crate::notebook::ParseError;
use crate::upload::UploadError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Upload(e) => e.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors are sent as plain text. Server-side failures carry the underlying
/// error message so the uploader can see what the toolchain complained about.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Upload(e) => {
                tracing::warn!("Rejected upload: {}", e);
                e.to_string()
            }
            AppError::Parse(e) => {
                tracing::error!("Notebook parse error: {}", e);
                format!("Conversion failed: {}", e)
            }
            AppError::Conversion(e) => {
                tracing::error!("Conversion error: {}", e);
                format!("Conversion failed: {}", e)
            }
            AppError::Staging(e) => {
                tracing::error!("Staging error: {}", e);
                format!("Conversion failed: {}", self)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                format!("Conversion failed: {}", msg)
            }
        };

        (status, message).into_response()
    }
}
