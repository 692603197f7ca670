//! Well-formedness check for the XML payload.
//!
//! Only well-formedness is checked. The payload is never rewritten and no
//! schema (EN 16931, CII) validation takes place.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use crate::core::EmbedError;

/// Check that `xml` is a well-formed, namespace-well-formed XML document.
///
/// Requires UTF-8 (an optional BOM is accepted), exactly one root element,
/// balanced and matching tags, unique attributes and resolvable entity
/// references. Element and attribute names must be valid qualified names
/// with declared prefixes, and character data may only hold XML `Char`s.
/// No content other than whitespace, comments and processing instructions
/// may appear outside the root element.
pub fn validate_xml(xml: &[u8]) -> Result<(), EmbedError> {
    let body = xml.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(xml);
    let text = std::str::from_utf8(body)
        .map_err(|e| EmbedError::InvalidXml(format!("payload is not valid UTF-8: {e}")))?;

    let mut reader = NsReader::from_str(text);
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let (resolved, event) = match reader.read_resolved_event() {
            Ok(pair) => pair,
            Err(e) => {
                return Err(EmbedError::InvalidXml(format!(
                    "{e} at position {}",
                    reader.error_position()
                )));
            }
        };
        let outside_root = depth == 0;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if outside_root && seen_root {
                    return Err(invalid(&reader, "document has more than one root element"));
                }
                seen_root = true;
                if let ResolveResult::Unknown(prefix) = resolved {
                    return Err(undeclared(&reader, &prefix));
                }
                check_element(&reader, e)?;
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(ref e) => {
                if e.windows(3).any(|w| w == b"]]>") {
                    return Err(invalid(&reader, "']]>' in character data"));
                }
                let text = e.unescape().map_err(|e| invalid(&reader, &e.to_string()))?;
                check_chars(&reader, &text)?;
                if outside_root && !text.trim().is_empty() {
                    return Err(invalid(&reader, "text outside the root element"));
                }
            }
            Event::CData(_) if outside_root => {
                return Err(invalid(&reader, "CDATA outside the root element"));
            }
            Event::CData(ref e) => check_chars(&reader, &utf8(&reader, e)?)?,
            Event::Comment(ref e) => {
                let comment = utf8(&reader, e)?;
                if comment.contains("--") || comment.ends_with('-') {
                    return Err(invalid(&reader, "'--' inside a comment"));
                }
                check_chars(&reader, &comment)?;
            }
            Event::DocType(_) if seen_root => {
                return Err(invalid(&reader, "DOCTYPE after the root element"));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(EmbedError::InvalidXml("document has no root element".into()));
    }
    if depth > 0 {
        return Err(EmbedError::InvalidXml(format!(
            "{depth} element(s) not closed at end of document"
        )));
    }
    Ok(())
}

fn check_element(reader: &NsReader<&[u8]>, element: &BytesStart) -> Result<(), EmbedError> {
    check_qname(reader, element.name().as_ref())?;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| invalid(reader, &e.to_string()))?;
        check_qname(reader, attr.key.as_ref())?;
        if let (ResolveResult::Unknown(prefix), _) = reader.resolve_attribute(attr.key) {
            return Err(undeclared(reader, &prefix));
        }
        let value = attr
            .unescape_value()
            .map_err(|e| invalid(reader, &e.to_string()))?;
        check_chars(reader, &value)?;
    }
    Ok(())
}

/// `Name` with at most one colon separating two non-empty parts.
fn check_qname(reader: &NsReader<&[u8]>, name: &[u8]) -> Result<(), EmbedError> {
    let name = utf8(reader, name)?;
    let mut parts = name.split(':');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), None, _) => is_name(local),
        (Some(prefix), Some(local), None) => is_name(prefix) && is_name(local),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid(reader, &format!("'{name}' is not a valid XML name")))
    }
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// Reject characters outside the XML `Char` production.
fn check_chars(reader: &NsReader<&[u8]>, text: &str) -> Result<(), EmbedError> {
    match text
        .chars()
        .find(|&c| !matches!(c, '\t' | '\n' | '\r' | ' '..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'))
    {
        Some(c) => Err(invalid(reader, &format!("character U+{:04X} is not allowed", c as u32))),
        None => Ok(()),
    }
}

fn utf8<'a>(reader: &NsReader<&[u8]>, bytes: &'a [u8]) -> Result<&'a str, EmbedError> {
    std::str::from_utf8(bytes).map_err(|e| invalid(reader, &e.to_string()))
}

fn undeclared(reader: &NsReader<&[u8]>, prefix: &[u8]) -> EmbedError {
    invalid(
        reader,
        &format!("namespace prefix '{}' is not declared", String::from_utf8_lossy(prefix)),
    )
}

fn invalid(reader: &NsReader<&[u8]>, reason: &str) -> EmbedError {
    EmbedError::InvalidXml(format!("{reason} at position {}", reader.buffer_position()))
}
