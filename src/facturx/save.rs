use std::collections::HashSet;

use lopdf::{Document, Object, ObjectId, StringFormat};
use tracing::debug;

use crate::core::EmbedError;

/// Fixed `/ID` written to every output so that identical inputs produce
/// byte-identical files.
pub(crate) const STATIC_ID: [u8; 16] = [
    0x31, 0x41, 0x59, 0x26, 0x53, 0x58, 0x97, 0x93, 0x23, 0x84, 0x62, 0x64, 0x33, 0x83, 0x27, 0x95,
];

/// Trailer keys that describe the input file's layout. The output is a
/// single revision with its own cross-reference section, so offsets into
/// the input (`/Prev`, `/XRefStm`) and the input's xref stream encoding
/// must not leak into it.
const STALE_TRAILER_KEYS: [&[u8]; 8] = [
    b"Prev",
    b"XRefStm",
    b"Type",
    b"W",
    b"Index",
    b"Filter",
    b"DecodeParms",
    b"Length",
];

/// Write the document to a fresh buffer.
///
/// Objects no longer reachable from the trailer (replaced arrays, the
/// previous cross-reference streams) are dropped first.
pub(crate) fn save_document(doc: &mut Document) -> Result<Vec<u8>, EmbedError> {
    for key in STALE_TRAILER_KEYS {
        doc.trailer.remove(key);
    }
    let pruned = prune_unreachable(doc);
    debug!(pruned, objects = doc.objects.len(), "serializing PDF");

    let id = Object::String(STATIC_ID.to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| EmbedError::PdfProcessing(format!("failed to save PDF: {e}")))?;
    Ok(output)
}

/// Drop every object not reachable from the trailer; returns how many.
fn prune_unreachable(doc: &mut Document) -> usize {
    let mut reachable = HashSet::new();
    let mut pending = Vec::new();
    for (_, value) in doc.trailer.iter() {
        push_references(value, &mut pending);
    }
    while let Some(id) = pending.pop() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(object) = doc.objects.get(&id) {
            push_references(object, &mut pending);
        }
    }

    let before = doc.objects.len();
    doc.objects.retain(|id, _| reachable.contains(id));
    before - doc.objects.len()
}

fn push_references(object: &Object, pending: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => pending.push(*id),
        Object::Array(items) => items.iter().for_each(|item| push_references(item, pending)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, value)| push_references(value, pending)),
        Object::Stream(stream) => stream
            .dict
            .iter()
            .for_each(|(_, value)| push_references(value, pending)),
        _ => {}
    }
}
