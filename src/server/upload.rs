use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use tracing::warn;

use super::error::{ServiceError, describe_limit};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// One accepted multipart file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// The name used in error messages.
    pub fn label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("file")
    }
}

/// The two parts of an `/embed` request.
#[derive(Debug)]
pub struct EmbedUploads {
    pub pdf: Upload,
    pub xml: Upload,
}

/// Read the `pdf` and `xml` parts, enforcing content type and size limits.
///
/// Parts are checked as they arrive; other fields are ignored.
pub async fn read_uploads(
    mut multipart: Multipart,
    max_bytes: usize,
    request_id: &str,
) -> Result<EmbedUploads, ServiceError> {
    let mut pdf = None;
    let mut xml = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("pdf") => pdf = Some(read_field(field, PDF_CONTENT_TYPE, max_bytes, request_id).await?),
            Some("xml") => xml = Some(read_field(field, XML_CONTENT_TYPE, max_bytes, request_id).await?),
            _ => {}
        }
    }

    Ok(EmbedUploads {
        pdf: pdf.ok_or(ServiceError::MissingField("pdf"))?,
        xml: xml.ok_or(ServiceError::MissingField("xml"))?,
    })
}

async fn read_field(
    mut field: Field<'_>,
    expected_content_type: &str,
    max_bytes: usize,
    request_id: &str,
) -> Result<Upload, ServiceError> {
    let file_name = field.file_name().map(str::to_string);
    let label = file_name.clone().unwrap_or_else(|| "file".to_string());

    let content_type = field.content_type().unwrap_or_default().to_string();
    if content_type != expected_content_type {
        warn!(
            request_id,
            field = %label,
            content_type = %content_type,
            expected = expected_content_type,
            "invalid_content_type"
        );
        return Err(ServiceError::UnsupportedMediaType(label));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(ServiceError::PayloadTooLarge {
                name: label,
                limit: describe_limit(max_bytes),
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    if bytes.is_empty() {
        return Err(ServiceError::EmptyUpload(label));
    }

    Ok(Upload { file_name, bytes })
}

fn multipart_error(err: MultipartError) -> ServiceError {
    ServiceError::Multipart {
        status: err.status(),
        message: err.body_text(),
    }
}

/// `<base>_FacturX.pdf`, where `base` is the upload name up to its first dot.
pub fn output_filename(pdf_name: Option<&str>) -> String {
    let base = pdf_name
        .and_then(|name| name.split('.').next())
        .map(|base| base.replace(['"', '\\', '\r', '\n'], ""))
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| "facture".to_string());
    format!("{base}_FacturX.pdf")
}
