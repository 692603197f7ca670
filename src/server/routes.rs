use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth::{REQUEST_ID_HEADER, authorize};
use super::config::ServiceConfig;
use super::error::ServiceError;
use super::upload::{EmbedUploads, PDF_CONTENT_TYPE, output_filename, read_uploads};
use crate::core::EmbedOptions;
use crate::facturx::embed_in_pdf;
use crate::xml::validate_xml;

/// Room for multipart boundaries and part headers on top of the payloads.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the service router: `POST /embed` and `GET /healthz`.
pub fn app(config: ServiceConfig) -> Router {
    let body_limit = config
        .max_upload_bytes
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/embed", post(embed))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

/// Embed the uploaded XML into the uploaded PDF and return the result.
async fn embed(
    State(config): State<Arc<ServiceConfig>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let request_id = authorize(&config, &headers)?;
    let EmbedUploads { pdf, xml } =
        read_uploads(multipart, config.max_upload_bytes, &request_id).await?;
    info!(
        request_id = %request_id,
        pdf_name = pdf.label(),
        xml_name = xml.label(),
        "uploads_received"
    );

    validate_xml(&xml.bytes)?;

    let output_name = output_filename(pdf.file_name.as_deref());
    let options = EmbedOptions::new()
        .producer(config.producer.clone())
        .request_id(request_id.clone());
    let output = tokio::task::spawn_blocking(move || embed_in_pdf(&pdf.bytes, &xml.bytes, &options))
        .await
        .map_err(|e| ServiceError::Internal(format!("embedding task failed: {e}")))??;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{output_name}\""),
            ),
            (HeaderName::from_static(REQUEST_ID_HEADER), request_id),
        ],
        output,
    )
        .into_response())
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
