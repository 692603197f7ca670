use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::EmbedError;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Request failures of the HTTP service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("FACTURX_TOKEN missing on server")]
    TokenNotConfigured,

    #[error("Missing or invalid Authorization header")]
    MissingAuthorization,

    #[error("Invalid bearer token")]
    InvalidToken,

    #[error("Invalid content type for {0}")]
    UnsupportedMediaType(String),

    #[error("{0} is empty")]
    EmptyUpload(String),

    #[error("{name} exceeds {limit}")]
    PayloadTooLarge { name: String, limit: String },

    #[error("missing multipart field `{0}`")]
    MissingField(&'static str),

    #[error("invalid multipart body: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Invalid XML payload: {0}")]
    InvalidXml(String),

    #[error("Unable to process PDF: {0}")]
    Pdf(EmbedError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TokenNotConfigured | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingAuthorization | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::EmptyUpload(_) | Self::InvalidXml(_) | Self::Pdf(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::Multipart { status, .. } => *status,
        }
    }
}

impl From<EmbedError> for ServiceError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::InvalidXml(cause) => Self::InvalidXml(cause),
            EmbedError::AttachmentNotFound(_) => Self::Internal(err.to_string()),
            other => Self::Pdf(other),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Render an upload limit the way it is configured: whole MB when it is
/// a multiple of 1 MiB, bytes otherwise.
pub(crate) fn describe_limit(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
