use lopdf::{Dictionary, Document, Object, ObjectId};

use super::dedup::NamePair;
use super::graph::{self, key_label, kind, text_string};
use crate::core::EmbedError;

/// Register `filespec_id` under `name` in the EmbeddedFiles name tree.
///
/// Builds `Root → /Names → /EmbeddedFiles → /Names` as needed and writes
/// `retained` followed by the new pair. Entries are appended, never sorted.
pub(crate) fn install_in_name_tree(
    doc: &mut Document,
    catalog_id: ObjectId,
    retained: Vec<NamePair>,
    name: &str,
    filespec_id: ObjectId,
) -> Result<(), EmbedError> {
    let names_id = ensure_indirect_dictionary(doc, catalog_id, b"Names")?;
    let tree_id = ensure_indirect_dictionary(doc, names_id, b"EmbeddedFiles")?;

    let mut entries: Vec<Object> = Vec::with_capacity(retained.len() * 2 + 2);
    for (key, value) in retained {
        entries.push(key);
        entries.push(value);
    }
    entries.push(text_string(name));
    entries.push(Object::Reference(filespec_id));

    match indirect_array(doc, tree_id, b"Names")? {
        Some(array_id) => {
            doc.objects.insert(array_id, Object::Array(entries));
        }
        None => {
            let array_id = doc.add_object(Object::Array(entries));
            graph::dictionary_mut(doc, tree_id)?.set("Names", Object::Reference(array_id));
        }
    }

    // The root node now holds every leaf directly.
    let tree = graph::dictionary_mut(doc, tree_id)?;
    tree.remove(b"Kids");
    tree.remove(b"Limits");
    Ok(())
}

/// Make the catalog's `/AF` array contain exactly `filespec_id`.
///
/// Earlier associated files are dropped from `/AF`; their filespecs may
/// still be reachable through the name tree.
pub(crate) fn replace_associated_files(
    doc: &mut Document,
    catalog_id: ObjectId,
    filespec_id: ObjectId,
) -> Result<(), EmbedError> {
    let associated = Object::Array(vec![Object::Reference(filespec_id)]);

    match indirect_array(doc, catalog_id, b"AF")? {
        Some(array_id) => {
            doc.objects.insert(array_id, associated);
        }
        None => {
            let array_id = doc.add_object(associated);
            graph::dictionary_mut(doc, catalog_id)?.set("AF", Object::Reference(array_id));
        }
    }
    Ok(())
}

/// Return the id of the dictionary stored under `key` in `parent`.
///
/// A missing entry (or dangling reference) gets a new empty indirect
/// dictionary; a direct dictionary is moved into its own indirect object.
fn ensure_indirect_dictionary(
    doc: &mut Document,
    parent: ObjectId,
    key: &[u8],
) -> Result<ObjectId, EmbedError> {
    let entry = graph::dictionary(doc, parent)?.get(key).ok().cloned();

    let id = match entry {
        Some(Object::Reference(id)) => {
            match doc.get_object(id).ok() {
                Some(Object::Dictionary(_)) => return Ok(id),
                None | Some(Object::Null) => {}
                Some(other) => return Err(not_a_dictionary(key, other)),
            }
            doc.add_object(Dictionary::new())
        }
        None | Some(Object::Null) => doc.add_object(Dictionary::new()),
        Some(Object::Dictionary(direct)) => doc.add_object(direct),
        Some(other) => return Err(not_a_dictionary(key, &other)),
    };

    graph::dictionary_mut(doc, parent)?.set(key.to_vec(), Object::Reference(id));
    Ok(id)
}

/// The id of the array that `parent[key]` references, if it is one.
fn indirect_array(
    doc: &Document,
    parent: ObjectId,
    key: &[u8],
) -> Result<Option<ObjectId>, EmbedError> {
    let id = match graph::dictionary(doc, parent)?.get(key) {
        Ok(Object::Reference(id)) => *id,
        _ => return Ok(None),
    };
    Ok(matches!(doc.get_object(id), Ok(Object::Array(_))).then_some(id))
}

fn not_a_dictionary(key: &[u8], found: &Object) -> EmbedError {
    EmbedError::UnsupportedStructure(format!(
        "{} is a {} instead of a dictionary",
        key_label(key),
        kind(found)
    ))
}
