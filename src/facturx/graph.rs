use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::core::EmbedError;

/// Reference chains longer than this are treated as broken.
const MAX_REFERENCE_DEPTH: usize = 32;

/// Follow indirect references until a direct value is reached.
///
/// Returns `None` for `null`, dangling references and over-long chains,
/// which PDF treats the same as an absent entry.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            Object::Null => return None,
            other => return Some(other),
        }
    }
    None
}

/// Short type label used in error messages.
pub(crate) fn kind(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) | Object::Real(_) => "number",
        Object::Name(_) => "name",
        Object::String(..) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
    }
}

pub(crate) fn key_label(key: &[u8]) -> String {
    format!("/{}", String::from_utf8_lossy(key))
}

pub(crate) fn dictionary(doc: &Document, id: ObjectId) -> Result<&Dictionary, EmbedError> {
    match doc.get_object(id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        Ok(other) => Err(not_a_dictionary(id, kind(other))),
        Err(e) => Err(EmbedError::PdfProcessing(format!(
            "object {} {} is missing: {e}",
            id.0, id.1
        ))),
    }
}

pub(crate) fn dictionary_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary, EmbedError> {
    match doc.get_object_mut(id) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        Ok(other) => Err(not_a_dictionary(id, kind(other))),
        Err(e) => Err(EmbedError::PdfProcessing(format!(
            "object {} {} is missing: {e}",
            id.0, id.1
        ))),
    }
}

fn not_a_dictionary(id: ObjectId, found: &str) -> EmbedError {
    EmbedError::UnsupportedStructure(format!(
        "object {} {} is a {found} instead of a dictionary",
        id.0, id.1
    ))
}

/// Look up `key` in `dict` and return the dictionary it designates, if any.
pub(crate) fn lookup_dictionary<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Result<Option<&'a Dictionary>, EmbedError> {
    match dict.get(key).ok().and_then(|obj| resolve(doc, obj)) {
        None => Ok(None),
        Some(Object::Dictionary(found)) => Ok(Some(found)),
        Some(other) => Err(EmbedError::UnsupportedStructure(format!(
            "{} is a {} instead of a dictionary",
            key_label(key),
            kind(other)
        ))),
    }
}

/// Encode a PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
pub(crate) fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string (UTF-16BE or UTF-8 with BOM, else byte-per-char).
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}

/// The decoded text of a string value, following references.
pub(crate) fn text_of(doc: &Document, obj: &Object) -> Option<String> {
    match resolve(doc, obj)? {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    }
}
