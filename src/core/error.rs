use thiserror::Error;

/// Errors that can occur while embedding an XML invoice into a PDF.
///
/// Every variant is terminal for the invocation that produced it: no output
/// buffer is returned and nothing is retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmbedError {
    /// The input bytes could not be parsed into a PDF object graph.
    #[error("malformed PDF document: {0}")]
    MalformedDocument(String),

    /// The object graph rejected a mutation, or the document failed to serialize.
    #[error("PDF processing error: {0}")]
    PdfProcessing(String),

    /// The document's structure cannot be extended safely (e.g. `/Names` is
    /// not a dictionary). A specialization of [`EmbedError::PdfProcessing`].
    #[error("unsupported PDF structure: {0}")]
    UnsupportedStructure(String),

    /// The XML payload is not well-formed.
    #[error("invalid XML payload: {0}")]
    InvalidXml(String),

    /// The requested attachment does not exist in the document.
    #[error("attachment not found: {0}")]
    AttachmentNotFound(String),
}

impl EmbedError {
    /// True for errors raised while mutating or writing a loaded document,
    /// including [`EmbedError::UnsupportedStructure`].
    pub fn is_pdf_processing(&self) -> bool {
        matches!(self, Self::PdfProcessing(_) | Self::UnsupportedStructure(_))
    }
}
