use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::warn;

use crate::core::EmbedError;

pub(crate) const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub(crate) const PDFAID_NS: &str = "http://www.aiim.org/pdfa/ns/id/";
pub(crate) const XMP_NS: &str = "http://ns.adobe.com/xap/1.0/";
pub(crate) const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub(crate) const FX_NS: &str = "urn:factur-x:pdfa:CrossIndustryDocument:invoice:1p0#";

/// A simple (text-valued) XMP property to set.
#[derive(Debug, Clone)]
pub(crate) struct XmpProperty {
    pub namespace: &'static str,
    pub prefix: &'static str,
    pub name: &'static str,
    pub value: String,
}

impl XmpProperty {
    pub fn new(
        namespace: &'static str,
        prefix: &'static str,
        name: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            prefix,
            name,
            value: value.into(),
        }
    }
}

/// Set `properties` on an XMP packet, overwriting any previous values.
///
/// Properties are matched by namespace URI and local name, so a packet that
/// binds e.g. `xap:` instead of `xmp:` is still updated in place. Properties
/// the packet lacks are added in a new `rdf:Description`. Without a usable
/// packet a fresh one is built.
pub(crate) fn stamp_packet(
    existing: Option<&[u8]>,
    properties: &[XmpProperty],
) -> Result<Vec<u8>, EmbedError> {
    if let Some(packet) = existing {
        match rewrite_packet(packet, properties) {
            Ok(Some(stamped)) => return Ok(stamped),
            Ok(None) => warn!("XMP packet has no rdf:RDF element, replacing it"),
            Err(e) => warn!(error = %e, "XMP packet is not well-formed, replacing it"),
        }
    }

    rewrite_packet(fresh_packet().as_bytes(), properties)
        .map_err(|e| EmbedError::PdfProcessing(format!("failed to build XMP packet: {e}")))?
        .ok_or_else(|| EmbedError::PdfProcessing("XMP template has no rdf:RDF element".into()))
}

/// Stream `packet` through, replacing matched properties.
///
/// Returns `None` when the packet has no `rdf:RDF` element to extend.
fn rewrite_packet(
    packet: &[u8],
    properties: &[XmpProperty],
) -> Result<Option<Vec<u8>>, String> {
    let mut reader = NsReader::from_reader(packet);
    let mut writer = Writer::new(Vec::with_capacity(packet.len() + 1024));
    let mut stamped = vec![false; properties.len()];
    let mut found_rdf = false;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| e.to_string())?;
        match event {
            Event::Eof => break,
            Event::Start(start) => {
                if let Some(index) = matching_property(&reader, start.name(), properties) {
                    let start = start.into_owned();
                    skip_content(&mut reader)?;
                    write_property(&mut writer, start, &properties[index].value)?;
                    stamped[index] = true;
                } else if is_rdf(&reader, start.name(), b"Description") {
                    let start = stamp_attributes(&reader, start, properties, &mut stamped)?;
                    write(&mut writer, Event::Start(start))?;
                } else {
                    write(&mut writer, Event::Start(start))?;
                }
            }
            Event::Empty(start) => {
                if let Some(index) = matching_property(&reader, start.name(), properties) {
                    write_property(&mut writer, start.into_owned(), &properties[index].value)?;
                    stamped[index] = true;
                } else if is_rdf(&reader, start.name(), b"Description") {
                    let start = stamp_attributes(&reader, start, properties, &mut stamped)?;
                    write(&mut writer, Event::Empty(start))?;
                } else {
                    write(&mut writer, Event::Empty(start))?;
                }
            }
            Event::End(end) => {
                if !found_rdf && is_rdf(&reader, end.name(), b"RDF") {
                    found_rdf = true;
                    write_description(&mut writer, properties, &stamped)?;
                    stamped.iter_mut().for_each(|flag| *flag = true);
                }
                write(&mut writer, Event::End(end))?;
            }
            other => write(&mut writer, other)?,
        }
        buf.clear();
    }

    Ok(found_rdf.then(|| writer.into_inner()))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}

fn matching_property(
    reader: &NsReader<&[u8]>,
    name: QName<'_>,
    properties: &[XmpProperty],
) -> Option<usize> {
    let (ns, local) = reader.resolve_element(name);
    property_index(ns, local.as_ref(), properties)
}

fn property_index(ns: ResolveResult<'_>, local: &[u8], properties: &[XmpProperty]) -> Option<usize> {
    let ResolveResult::Bound(Namespace(uri)) = ns else {
        return None;
    };
    properties
        .iter()
        .position(|p| p.namespace.as_bytes() == uri && p.name.as_bytes() == local)
}

fn is_rdf(reader: &NsReader<&[u8]>, name: QName<'_>, local_name: &[u8]) -> bool {
    let (ns, local) = reader.resolve_element(name);
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == RDF_NS.as_bytes())
        && local.as_ref() == local_name
}

/// Consume everything up to the end tag of the element just opened.
fn skip_content(reader: &mut NsReader<&[u8]>) -> Result<(), String> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    while depth > 0 {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err("unexpected end of XMP packet".into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn write_property(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'static>,
    value: &str,
) -> Result<(), String> {
    let end = start.to_end().into_owned();
    write(writer, Event::Start(start))?;
    write(writer, Event::Text(BytesText::new(value)))?;
    write(writer, Event::End(end))
}

/// Rewrite attribute-form properties (`<rdf:Description pdfaid:part="1">`).
fn stamp_attributes<'a>(
    reader: &NsReader<&[u8]>,
    start: BytesStart<'a>,
    properties: &[XmpProperty],
    stamped: &mut [bool],
) -> Result<BytesStart<'a>, String> {
    let mut rewritten = Vec::new();
    let mut any_match = false;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        let value = match property_index(ns, local.as_ref(), properties) {
            Some(index) => {
                stamped[index] = true;
                any_match = true;
                properties[index].value.clone()
            }
            None => attr.unescape_value().map_err(|e| e.to_string())?.into_owned(),
        };
        rewritten.push((attr.key.as_ref().to_vec(), value));
    }
    if !any_match {
        return Ok(start);
    }

    let mut out = BytesStart::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for (key, value) in &rewritten {
        out.push_attribute(Attribute {
            key: QName(key),
            value: escape(value.as_str()).into_owned().into_bytes().into(),
        });
    }
    Ok(out)
}

/// Append a description carrying every property not stamped yet.
fn write_description(
    writer: &mut Writer<Vec<u8>>,
    properties: &[XmpProperty],
    stamped: &[bool],
) -> Result<(), String> {
    let missing: Vec<&XmpProperty> = properties
        .iter()
        .zip(stamped)
        .filter(|(_, done)| !**done)
        .map(|(property, _)| property)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut description = BytesStart::new("rdf:Description");
    description.push_attribute(("xmlns:rdf", RDF_NS));
    description.push_attribute(("rdf:about", ""));
    let mut declared: Vec<&str> = Vec::new();
    for property in &missing {
        if !declared.contains(&property.prefix) {
            declared.push(property.prefix);
            let key = format!("xmlns:{}", property.prefix);
            description.push_attribute((key.as_str(), property.namespace));
        }
    }

    write(writer, Event::Text(BytesText::new("  ")))?;
    write(writer, Event::Start(description))?;
    for property in missing {
        let tag = format!("{}:{}", property.prefix, property.name);
        write(writer, Event::Text(BytesText::new("\n      ")))?;
        write(writer, Event::Start(BytesStart::new(tag.as_str())))?;
        write(writer, Event::Text(BytesText::new(&property.value)))?;
        write(writer, Event::End(BytesEnd::new(tag.as_str())))?;
    }
    write(writer, Event::Text(BytesText::new("\n    ")))?;
    write(writer, Event::End(BytesEnd::new("rdf:Description")))?;
    write(writer, Event::Text(BytesText::new("\n  ")))
}

/// Skeleton packet declaring the Factur-X PDF/A extension schema.
fn fresh_packet() -> String {
    format!(
        r#"<?xpacket begin="{BOM}" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="{RDF_NS}">
    <rdf:Description rdf:about=""
        xmlns:pdfaExtension="http://www.aiim.org/pdfa/ns/extension/"
        xmlns:pdfaSchema="http://www.aiim.org/pdfa/ns/schema#"
        xmlns:pdfaProperty="http://www.aiim.org/pdfa/ns/property#">
      <pdfaExtension:schemas>
        <rdf:Bag>
          <rdf:li rdf:parseType="Resource">
            <pdfaSchema:schema>Factur-X PDFA Extension Schema</pdfaSchema:schema>
            <pdfaSchema:namespaceURI>{FX_NS}</pdfaSchema:namespaceURI>
            <pdfaSchema:prefix>fx</pdfaSchema:prefix>
            <pdfaSchema:property>
              <rdf:Seq>
                <rdf:li rdf:parseType="Resource">
                  <pdfaProperty:name>DocumentFileName</pdfaProperty:name>
                  <pdfaProperty:valueType>Text</pdfaProperty:valueType>
                  <pdfaProperty:category>external</pdfaProperty:category>
                  <pdfaProperty:description>name of the embedded XML invoice file</pdfaProperty:description>
                </rdf:li>
                <rdf:li rdf:parseType="Resource">
                  <pdfaProperty:name>Version</pdfaProperty:name>
                  <pdfaProperty:valueType>Text</pdfaProperty:valueType>
                  <pdfaProperty:category>external</pdfaProperty:category>
                  <pdfaProperty:description>The actual version of the Factur-X XML schema</pdfaProperty:description>
                </rdf:li>
                <rdf:li rdf:parseType="Resource">
                  <pdfaProperty:name>ConformanceLevel</pdfaProperty:name>
                  <pdfaProperty:valueType>Text</pdfaProperty:valueType>
                  <pdfaProperty:category>external</pdfaProperty:category>
                  <pdfaProperty:description>The conformance level of the embedded Factur-X data</pdfaProperty:description>
                </rdf:li>
              </rdf:Seq>
            </pdfaSchema:property>
          </rdf:li>
        </rdf:Bag>
      </pdfaExtension:schemas>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#,
        BOM = '\u{FEFF}',
    )
}
