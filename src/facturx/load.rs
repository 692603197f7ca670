use lopdf::{Document, Object, ObjectId};

use super::graph;
use crate::core::EmbedError;

/// Parse PDF bytes into an object graph ready for mutation.
///
/// Rejects anything the pipeline cannot safely rewrite: unparseable input,
/// encrypted documents and trailers without a `/Root` catalog.
pub(crate) fn load_document(pdf_bytes: &[u8]) -> Result<(Document, ObjectId), EmbedError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| EmbedError::MalformedDocument(format!("failed to load PDF: {e}")))?;

    if doc.trailer.has(b"Encrypt") {
        return Err(EmbedError::MalformedDocument(
            "encrypted documents are not supported".into(),
        ));
    }

    let catalog_id = catalog_id(&doc)?;
    Ok((doc, catalog_id))
}

/// The object id of the document catalog.
pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId, EmbedError> {
    let id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        Ok(other) => {
            return Err(EmbedError::MalformedDocument(format!(
                "trailer /Root is a {} instead of a reference",
                graph::kind(other)
            )));
        }
        Err(_) => {
            return Err(EmbedError::MalformedDocument(
                "trailer has no /Root catalog".into(),
            ));
        }
    };

    graph::dictionary(doc, id)
        .map_err(|e| EmbedError::MalformedDocument(format!("invalid /Root catalog: {e}")))?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn garbage_is_malformed() {
        let err = load_document(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, EmbedError::MalformedDocument(_)), "{err}");
    }

    #[test]
    fn empty_input_is_malformed() {
        assert!(matches!(
            load_document(b""),
            Err(EmbedError::MalformedDocument(_))
        ));
    }

    #[test]
    fn root_must_be_a_dictionary() {
        let mut doc = Document::with_version("1.7");
        let bogus = doc.add_object(Object::Integer(1));
        doc.trailer.set("Root", Object::Reference(bogus));

        assert!(matches!(
            catalog_id(&doc),
            Err(EmbedError::MalformedDocument(_))
        ));
    }

    #[test]
    fn finds_catalog() {
        let mut doc = Document::with_version("1.7");
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog" });
        doc.trailer.set("Root", Object::Reference(catalog));
        assert_eq!(catalog_id(&doc).unwrap(), catalog);
    }
}
