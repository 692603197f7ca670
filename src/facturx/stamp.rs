use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::graph::{self, text_string};
use super::xmp::{self, DC_NS, FX_NS, PDFAID_NS, XMP_NS, XmpProperty};
use crate::core::EmbedError;

/// Factur-X profile declared in the XMP extension properties.
pub const CONFORMANCE_LEVEL: &str = "BASIC";
/// Factur-X schema version declared in the XMP extension properties.
pub const FACTURX_VERSION: &str = "1.0";

/// Declare PDF/A-3u and Factur-X conformance in the catalog `/Metadata`
/// packet and stamp `/Producer` and `/ModDate` in the document info.
///
/// `timestamp` is written verbatim to every date field so that the XMP
/// and info dictionary agree.
pub(crate) fn stamp_metadata(
    doc: &mut Document,
    catalog_id: ObjectId,
    attachment_name: &str,
    producer: &str,
    timestamp: &str,
) -> Result<(), EmbedError> {
    let (metadata_id, existing) = current_metadata(doc, catalog_id)?;
    debug!(
        existing_packet = existing.is_some(),
        "stamping XMP metadata"
    );

    let properties = facturx_properties(attachment_name, timestamp);
    let packet = xmp::stamp_packet(existing.as_deref(), &properties)?;
    let stream = Stream::new(
        dictionary! {
            "Type" => "Metadata",
            "Subtype" => "XML",
        },
        packet,
    )
    .with_compression(false);

    match metadata_id {
        Some(id) => {
            doc.objects.insert(id, Object::Stream(stream));
        }
        None => {
            let id = doc.add_object(stream);
            graph::dictionary_mut(doc, catalog_id)?.set("Metadata", Object::Reference(id));
        }
    }

    stamp_document_info(doc, producer, timestamp)
}

fn facturx_properties(attachment_name: &str, timestamp: &str) -> Vec<XmpProperty> {
    vec![
        XmpProperty::new(PDFAID_NS, "pdfaid", "part", "3"),
        XmpProperty::new(PDFAID_NS, "pdfaid", "conformance", "U"),
        XmpProperty::new(FX_NS, "fx", "DocumentFileName", attachment_name),
        XmpProperty::new(FX_NS, "fx", "Version", FACTURX_VERSION),
        XmpProperty::new(FX_NS, "fx", "ConformanceLevel", CONFORMANCE_LEVEL),
        XmpProperty::new(XMP_NS, "xmp", "CreateDate", timestamp),
        XmpProperty::new(XMP_NS, "xmp", "ModifyDate", timestamp),
        XmpProperty::new(XMP_NS, "xmp", "MetadataDate", timestamp),
        XmpProperty::new(DC_NS, "dc", "format", "application/pdf"),
    ]
}

/// The indirect metadata stream to overwrite, and the packet it holds.
fn current_metadata(
    doc: &Document,
    catalog_id: ObjectId,
) -> Result<(Option<ObjectId>, Option<Vec<u8>>), EmbedError> {
    let catalog = graph::dictionary(doc, catalog_id)?;
    let (id, stream) = match catalog.get(b"Metadata") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Stream(stream)) => (Some(*id), stream),
            _ => return Ok((None, None)),
        },
        Ok(Object::Stream(stream)) => (None, stream),
        _ => return Ok((None, None)),
    };

    // Uncompressed streams have no filter to decode.
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Ok((id, Some(content)))
}

fn stamp_document_info(doc: &mut Document, producer: &str, timestamp: &str) -> Result<(), EmbedError> {
    let info_id = match doc.trailer.get(b"Info").ok().cloned() {
        Some(Object::Reference(id)) if matches!(doc.get_object(id), Ok(Object::Dictionary(_))) => id,
        Some(Object::Dictionary(direct)) => doc.add_object(direct),
        _ => doc.add_object(Dictionary::new()),
    };
    doc.trailer.set("Info", Object::Reference(info_id));

    let info = graph::dictionary_mut(doc, info_id)?;
    info.set("Producer", text_string(producer));
    info.set("ModDate", Object::string_literal(timestamp));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2024-06-15T08:30:00Z";

    fn catalog_doc(catalog: Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.7");
        let id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(id));
        (doc, id)
    }

    fn metadata_text(doc: &Document, catalog: ObjectId) -> String {
        let root = doc.get_dictionary(catalog).unwrap();
        let id = root.get(b"Metadata").unwrap().as_reference().unwrap();
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert!(!stream.dict.has(b"Filter"));
        String::from_utf8(stream.content.clone()).unwrap()
    }

    #[test]
    fn creates_metadata_and_info() {
        let (mut doc, catalog) = catalog_doc(dictionary! { "Type" => "Catalog" });
        stamp_metadata(&mut doc, catalog, "facturx.xml", "ACME Billing", TS).unwrap();

        let xmp = metadata_text(&doc, catalog);
        for expected in [
            "<pdfaid:part>3</pdfaid:part>",
            "<pdfaid:conformance>U</pdfaid:conformance>",
            "<fx:DocumentFileName>facturx.xml</fx:DocumentFileName>",
            "<fx:Version>1.0</fx:Version>",
            "<fx:ConformanceLevel>BASIC</fx:ConformanceLevel>",
            "<xmp:CreateDate>2024-06-15T08:30:00Z</xmp:CreateDate>",
            "<xmp:ModifyDate>2024-06-15T08:30:00Z</xmp:ModifyDate>",
            "<xmp:MetadataDate>2024-06-15T08:30:00Z</xmp:MetadataDate>",
            "<dc:format>application/pdf</dc:format>",
        ] {
            assert!(xmp.contains(expected), "missing {expected}");
        }

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(graph::text_of(&doc, info.get(b"Producer").unwrap()).unwrap(), "ACME Billing");
        assert_eq!(graph::text_of(&doc, info.get(b"ModDate").unwrap()).unwrap(), TS);
    }

    #[test]
    fn replaces_indirect_metadata_in_place() {
        let mut doc = Document::with_version("1.7");
        let old = doc.add_object(Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:creator>Jane</dc:creator></rdf:Description></rdf:RDF>"#.to_vec(),
        ));
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Metadata" => Object::Reference(old),
        });

        stamp_metadata(&mut doc, catalog, "facturx.xml", "p", TS).unwrap();

        let root = doc.get_dictionary(catalog).unwrap();
        assert_eq!(root.get(b"Metadata").unwrap().as_reference().unwrap(), old);
        let xmp = metadata_text(&doc, catalog);
        assert!(xmp.contains("<dc:creator>Jane</dc:creator>"));
        assert!(xmp.contains("<pdfaid:part>3</pdfaid:part>"));
    }

    #[test]
    fn keeps_existing_info_entries() {
        let (mut doc, catalog) = catalog_doc(dictionary! { "Type" => "Catalog" });
        let info = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Rechnung"),
            "Producer" => Object::string_literal("old"),
        });
        doc.trailer.set("Info", Object::Reference(info));

        stamp_metadata(&mut doc, catalog, "facturx.xml", "new", TS).unwrap();

        assert_eq!(doc.trailer.get(b"Info").unwrap().as_reference().unwrap(), info);
        let info = doc.get_dictionary(info).unwrap();
        assert_eq!(graph::text_of(&doc, info.get(b"Title").unwrap()).unwrap(), "Rechnung");
        assert_eq!(graph::text_of(&doc, info.get(b"Producer").unwrap()).unwrap(), "new");
    }

    #[test]
    fn direct_info_is_lifted() {
        let (mut doc, catalog) = catalog_doc(dictionary! { "Type" => "Catalog" });
        doc.trailer.set("Info", dictionary! { "Author" => Object::string_literal("Jane") });

        stamp_metadata(&mut doc, catalog, "facturx.xml", "p", TS).unwrap();

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert!(info.has(b"Author"));
        assert!(info.has(b"ModDate"));
    }
}
