//! PDF fixtures and inspection helpers shared by the integration tests.

#![allow(dead_code)]

use lopdf::xref::XrefType;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Build a one-page PDF; `extend` may add catalog entries.
///
/// The file uses a cross-reference stream, lopdf's default.
pub fn pdf_with(extend: impl FnOnce(&mut Document) -> Vec<(&'static str, Object)>) -> Vec<u8> {
    save(&mut one_page(extend))
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut output = Vec::new();
    doc.save_to(&mut output).expect("save fixture PDF");
    output
}

fn one_page(extend: impl FnOnce(&mut Document) -> Vec<(&'static str, Object)>) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 100 700 Td (Rechnung) Tj ET".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    };
    for (key, value) in extend(&mut doc) {
        catalog.set(key, value);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub fn minimal_pdf() -> Vec<u8> {
    pdf_with(|_| Vec::new())
}

/// One-page PDF with a classic `xref` table and `trailer` dictionary.
pub fn classic_xref_pdf() -> Vec<u8> {
    let mut doc = one_page(|_| Vec::new());
    doc.reference_table.cross_reference_type = XrefType::CrossReferenceTable;
    save(&mut doc)
}

/// [`classic_xref_pdf`] followed by one incremental update that replaces
/// the catalog with a revision carrying `/Lang (de-DE)`. The update's
/// trailer links back to the first revision through `/Prev`.
pub fn incrementally_updated_pdf() -> Vec<u8> {
    let mut bytes = classic_xref_pdf();
    let base = load(&bytes);
    let catalog_id = base.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let pages_id = base
        .catalog()
        .unwrap()
        .get(b"Pages")
        .unwrap()
        .as_reference()
        .unwrap();
    let prev = base.xref_start;
    let size = base.max_id + 1;

    if bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    let object_offset = bytes.len();
    bytes.extend_from_slice(
        format!(
            "{} 0 obj\n<< /Type /Catalog /Pages {} 0 R /Lang (de-DE) >>\nendobj\n",
            catalog_id.0, pages_id.0
        )
        .as_bytes(),
    );
    let xref_offset = bytes.len();
    bytes.extend_from_slice(
        format!(
            "xref\n0 1\n0000000000 65535 f \n{} 1\n{:010} 00000 n \n\
             trailer\n<< /Size {} /Root {} 0 R /Prev {} >>\n\
             startxref\n{}\n%%EOF\n",
            catalog_id.0, object_offset, size, catalog_id.0, prev, xref_offset
        )
        .as_bytes(),
    );
    bytes
}

/// Add an embedded file and return its filespec id.
pub fn add_attachment(doc: &mut Document, name: &str, content: &[u8]) -> ObjectId {
    let stream = doc.add_object(Stream::new(
        dictionary! { "Type" => "EmbeddedFile" },
        content.to_vec(),
    ));
    doc.add_object(dictionary! {
        "Type" => "Filespec",
        "F" => Object::string_literal(name),
        "UF" => Object::string_literal(name),
        "EF" => dictionary! { "F" => Object::Reference(stream) },
    })
}

/// PDF whose EmbeddedFiles tree holds `names` in order.
pub fn pdf_with_attachments(names: &[&str]) -> Vec<u8> {
    let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    pdf_with(move |doc| {
        let mut entries = Vec::new();
        for name in &names {
            let filespec = add_attachment(doc, name, format!("content of {name}").as_bytes());
            entries.push(Object::string_literal(name.as_str()));
            entries.push(Object::Reference(filespec));
        }
        let tree = doc.add_object(dictionary! { "Names" => entries });
        let names_dict = doc.add_object(dictionary! { "EmbeddedFiles" => Object::Reference(tree) });
        vec![("Names", Object::Reference(names_dict))]
    })
}

pub fn load(bytes: &[u8]) -> Document {
    Document::load_mem(bytes).expect("output must reload")
}

pub fn deref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).expect("dangling reference"),
        other => other,
    }
}

pub fn dict<'a>(doc: &'a Document, parent: &'a Dictionary, key: &[u8]) -> &'a Dictionary {
    deref(doc, parent.get(key).expect("missing key"))
        .as_dict()
        .expect("not a dictionary")
}

/// The flat `/Names` array of the EmbeddedFiles tree.
pub fn embedded_names(doc: &Document) -> Vec<Object> {
    let catalog = doc.catalog().unwrap();
    let names = dict(doc, catalog, b"Names");
    let tree = dict(doc, names, b"EmbeddedFiles");
    deref(doc, tree.get(b"Names").unwrap())
        .as_array()
        .unwrap()
        .clone()
}

pub fn embedded_labels(doc: &Document) -> Vec<String> {
    embedded_names(doc)
        .chunks(2)
        .map(|pair| match deref(doc, &pair[0]) {
            Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
            other => panic!("name tree key is not a string: {other:?}"),
        })
        .collect()
}

pub fn associated_files(doc: &Document) -> Vec<Object> {
    let catalog = doc.catalog().unwrap();
    deref(doc, catalog.get(b"AF").unwrap())
        .as_array()
        .unwrap()
        .clone()
}

pub fn xmp_text(doc: &Document) -> String {
    let catalog = doc.catalog().unwrap();
    let stream = deref(doc, catalog.get(b"Metadata").unwrap())
        .as_stream()
        .unwrap();
    String::from_utf8(stream.content.clone()).unwrap()
}

/// Text content of the first `<tag>` element in `xml`.
pub fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    Some(&xml[start..end])
}
