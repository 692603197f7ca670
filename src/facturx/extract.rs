use lopdf::{Dictionary, Document, Object, ObjectId};

use super::{dedup, graph, load};
use crate::core::EmbedError;

/// Read back the embedded file registered under `name`.
///
/// Looks in the `/Names` → `/EmbeddedFiles` tree first, then in the
/// catalog `/AF` array. Names are compared case-insensitively.
pub fn extract_attachment(pdf_bytes: &[u8], name: &str) -> Result<Vec<u8>, EmbedError> {
    let (doc, catalog_id) = load::load_document(pdf_bytes)?;
    find_attachment(&doc, catalog_id, name)
}

pub(crate) fn find_attachment(
    doc: &Document,
    catalog_id: ObjectId,
    name: &str,
) -> Result<Vec<u8>, EmbedError> {
    via_names(doc, catalog_id, name)
        .or_else(|_| via_associated_files(doc, catalog_id, name))
        .map_err(|reason| EmbedError::AttachmentNotFound(format!("{name}: {reason}")))
}

fn via_names(doc: &Document, catalog_id: ObjectId, name: &str) -> Result<Vec<u8>, String> {
    let pairs = dedup::embedded_files(doc, catalog_id)
        .map_err(|e| e.to_string())?
        .ok_or("document has no embedded files name tree")?;

    let (_, filespec) = pairs
        .iter()
        .rev()
        .find(|(key, _)| dedup::is_same_name(doc, key, name))
        .ok_or("not in embedded files name tree")?;
    match graph::resolve(doc, filespec) {
        Some(Object::Dictionary(dict)) => file_content(doc, dict),
        _ => Err("name tree entry is not a file specification".into()),
    }
}

fn via_associated_files(doc: &Document, catalog_id: ObjectId, name: &str) -> Result<Vec<u8>, String> {
    let catalog = graph::dictionary(doc, catalog_id).map_err(|e| e.to_string())?;
    let Some(Object::Array(files)) = catalog.get(b"AF").ok().and_then(|af| graph::resolve(doc, af))
    else {
        return Err("catalog has no /AF array".into());
    };

    for entry in files {
        let Some(Object::Dictionary(filespec)) = graph::resolve(doc, entry) else {
            continue;
        };
        let file_name = filespec
            .get(b"UF")
            .or_else(|_| filespec.get(b"F"))
            .ok()
            .and_then(|obj| graph::text_of(doc, obj))
            .unwrap_or_default();
        if file_name.to_lowercase() == name.to_lowercase() {
            return file_content(doc, filespec);
        }
    }
    Err("not in /AF array".into())
}

fn file_content(doc: &Document, filespec: &Dictionary) -> Result<Vec<u8>, String> {
    let Some(Object::Dictionary(ef)) = filespec.get(b"EF").ok().and_then(|obj| graph::resolve(doc, obj))
    else {
        return Err("file specification has no /EF dictionary".into());
    };
    let stream = ef
        .get(b"UF")
        .or_else(|_| ef.get(b"F"))
        .ok()
        .and_then(|obj| graph::resolve(doc, obj));
    match stream {
        // Uncompressed streams have no filter to decode.
        Some(Object::Stream(stream)) => Ok(stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())),
        _ => Err("/EF does not reference a stream".into()),
    }
}
