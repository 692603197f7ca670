use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use super::graph::text_string;

/// MIME type of the embedded payload; written as `/application#2Fxml`.
pub(crate) const XML_SUBTYPE: &[u8] = b"application/xml";

/// Relationship of the invoice data to the visual document.
pub(crate) const AF_RELATIONSHIP: &[u8] = b"Data";

/// Ids of the objects created for one attachment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Attachment {
    pub stream_id: ObjectId,
    pub filespec_id: ObjectId,
}

/// Add the embedded-file stream and its file specification to `doc`.
///
/// The payload is stored uncompressed and unmodified. `/EF` refers to the
/// single stream object under both `/F` and `/UF`.
pub(crate) fn build_filespec(
    doc: &mut Document,
    xml_bytes: &[u8],
    name: &str,
    description: &str,
) -> Attachment {
    let stream = Stream::new(
        dictionary! {
            "Type" => "EmbeddedFile",
            "Subtype" => Object::Name(XML_SUBTYPE.to_vec()),
            "Params" => dictionary! {
                "Size" => Object::Integer(xml_bytes.len() as i64),
            },
        },
        xml_bytes.to_vec(),
    )
    .with_compression(false);
    let stream_id = doc.add_object(stream);

    let filespec = dictionary! {
        "Type" => "Filespec",
        "F" => text_string(name),
        "UF" => text_string(name),
        "AFRelationship" => Object::Name(AF_RELATIONSHIP.to_vec()),
        "Desc" => text_string(description),
        "EF" => dictionary! {
            "F" => Object::Reference(stream_id),
            "UF" => Object::Reference(stream_id),
        },
    };
    let filespec_id = doc.add_object(filespec);

    Attachment {
        stream_id,
        filespec_id,
    }
}
