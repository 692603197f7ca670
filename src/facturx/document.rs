use std::time::Instant;

use lopdf::{Document, ObjectId};
use tracing::{debug, error, info, info_span, warn};

use super::{dedup, extract, filespec, load, save, stamp, wiring};
use crate::core::{EmbedError, EmbedOptions};
use crate::xml::validate_xml;

/// Embed an XML invoice into a PDF, producing a PDF/A-3 hybrid document.
///
/// The XML is stored verbatim as the attachment named by
/// [`EmbedOptions::attachment_name`] (`facturx.xml` by default). Existing
/// attachments with the same name are replaced, others are kept. The
/// catalog `/AF` array ends up holding only the new file specification.
///
/// Inputs are never modified; on error no output is produced.
///
/// ```no_run
/// use facturx_embed::core::EmbedOptions;
/// use facturx_embed::facturx::embed_in_pdf;
///
/// let pdf = std::fs::read("invoice.pdf").unwrap();
/// let xml = std::fs::read("factur-x.xml").unwrap();
/// let hybrid = embed_in_pdf(&pdf, &xml, &EmbedOptions::default()).unwrap();
/// std::fs::write("invoice_FacturX.pdf", hybrid).unwrap();
/// ```
pub fn embed_in_pdf(
    pdf_bytes: &[u8],
    xml_bytes: &[u8],
    options: &EmbedOptions,
) -> Result<Vec<u8>, EmbedError> {
    let span = info_span!(
        "facturx_embed",
        request_id = options.request_id.as_deref().unwrap_or("-")
    );
    let _enter = span.enter();

    let started = Instant::now();
    info!(
        pdf_size = pdf_bytes.len(),
        xml_size = xml_bytes.len(),
        "embed_start"
    );

    let result = HybridDocument::load(pdf_bytes).and_then(|mut doc| {
        doc.attach_xml(xml_bytes, options)?;
        doc.to_bytes()
    });

    match &result {
        Ok(output) => info!(
            output_size = output.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "embed_success"
        ),
        Err(e) if e.is_pdf_processing() => error!(error = %e, "pdf_processing_error"),
        Err(e) => warn!(error = %e, "embed_rejected"),
    }
    result
}

/// A loaded PDF that XML attachments can be added to.
///
/// Each [`attach_xml`](Self::attach_xml) call is all-or-nothing: it works
/// on a copy of the object graph and only keeps the result on success.
#[derive(Debug, Clone)]
pub struct HybridDocument {
    doc: Document,
    catalog_id: ObjectId,
}

impl HybridDocument {
    pub fn load(pdf_bytes: &[u8]) -> Result<Self, EmbedError> {
        let (doc, catalog_id) = load::load_document(pdf_bytes)?;
        debug!(
            version = %doc.version,
            objects = doc.objects.len(),
            "loaded PDF"
        );
        Ok(Self { doc, catalog_id })
    }

    /// Validate `xml_bytes` and embed them as a PDF/A-3 associated file.
    pub fn attach_xml(&mut self, xml_bytes: &[u8], options: &EmbedOptions) -> Result<(), EmbedError> {
        validate_xml(xml_bytes)?;

        let name = options.attachment_name.as_str();
        let timestamp = options.timestamp_string();
        let mut working = self.doc.clone();
        let catalog_id = self.catalog_id;

        let retained = dedup::retained_pairs(&working, catalog_id, name)?.unwrap_or_default();
        let attachment = filespec::build_filespec(&mut working, xml_bytes, name, &options.description);
        debug!(
            stream = attachment.stream_id.0,
            filespec = attachment.filespec_id.0,
            retained = retained.len(),
            "built file specification"
        );

        wiring::install_in_name_tree(&mut working, catalog_id, retained, name, attachment.filespec_id)?;
        wiring::replace_associated_files(&mut working, catalog_id, attachment.filespec_id)?;
        stamp::stamp_metadata(&mut working, catalog_id, name, &options.producer, &timestamp)?;

        self.doc = working;
        Ok(())
    }

    /// Serialize the document with a static trailer `/ID`.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, EmbedError> {
        save::save_document(&mut self.doc)
    }

    /// The raw bytes of the embedded file registered under `name`.
    pub fn attachment(&self, name: &str) -> Result<Vec<u8>, EmbedError> {
        extract::find_attachment(&self.doc, self.catalog_id, name)
    }

    /// The underlying object graph.
    pub fn document(&self) -> &Document {
        &self.doc
    }
}
