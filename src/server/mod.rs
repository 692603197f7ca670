//! HTTP service around [`embed_in_pdf`](crate::facturx::embed_in_pdf).
//!
//! `POST /embed` takes a multipart body with a `pdf` part
//! (`application/pdf`) and an `xml` part (`application/xml`) and answers
//! with the hybrid PDF. Requests must carry `Authorization: Bearer <token>`.
//! Errors are JSON objects of the form `{"detail": "..."}`.

mod auth;
mod config;
mod error;
mod routes;
mod upload;

pub use auth::{REQUEST_ID_HEADER, authorize, new_request_id};
pub use config::{ConfigError, DEFAULT_BIND, DEFAULT_MAX_UPLOAD_BYTES, ServiceConfig};
pub use error::{ErrorResponse, ServiceError};
pub use routes::app;
pub use upload::{EmbedUploads, PDF_CONTENT_TYPE, Upload, XML_CONTENT_TYPE, output_filename, read_uploads};
