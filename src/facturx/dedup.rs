use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use super::graph;
use crate::core::EmbedError;

/// One `(name, filespec)` entry of the EmbeddedFiles name tree.
pub(crate) type NamePair = (Object, Object);

/// Collect the EmbeddedFiles entries that survive re-embedding `target`.
///
/// Returns `None` when the document has no `/Names` → `/EmbeddedFiles`
/// structure yet. Otherwise returns every pair whose name does not match
/// `target` case-insensitively, in document order. Leaves of a tree with
/// `/Kids` are flattened into one sequence. The document is not modified.
pub(crate) fn retained_pairs(
    doc: &Document,
    catalog_id: ObjectId,
    target: &str,
) -> Result<Option<Vec<NamePair>>, EmbedError> {
    let Some(mut pairs) = embedded_files(doc, catalog_id)? else {
        return Ok(None);
    };

    let found = pairs.len();
    pairs.retain(|(key, _)| !is_same_name(doc, key, target));
    debug!(
        entries = found,
        removed = found - pairs.len(),
        "scanned embedded files name tree"
    );
    Ok(Some(pairs))
}

/// Every EmbeddedFiles entry in document order, or `None` without a tree.
pub(crate) fn embedded_files(
    doc: &Document,
    catalog_id: ObjectId,
) -> Result<Option<Vec<NamePair>>, EmbedError> {
    let catalog = graph::dictionary(doc, catalog_id)?;
    let Some(names) = graph::lookup_dictionary(doc, catalog, b"Names")? else {
        return Ok(None);
    };
    let Some(tree) = graph::lookup_dictionary(doc, names, b"EmbeddedFiles")? else {
        return Ok(None);
    };

    // A /Kids entry pointing back at the root must not revisit it.
    let mut visited = HashSet::new();
    if let Ok(Object::Reference(root_id)) = names.get(b"EmbeddedFiles") {
        visited.insert(*root_id);
    }

    let mut pairs = Vec::new();
    collect_pairs(doc, tree, &mut visited, &mut pairs)?;
    Ok(Some(pairs))
}

fn collect_pairs(
    doc: &Document,
    node: &Dictionary,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<NamePair>,
) -> Result<(), EmbedError> {
    match node.get(b"Names").ok().and_then(|obj| graph::resolve(doc, obj)) {
        None => {}
        Some(Object::Array(items)) => {
            let mut chunks = items.chunks_exact(2);
            for pair in &mut chunks {
                out.push((pair[0].clone(), pair[1].clone()));
            }
            if !chunks.remainder().is_empty() {
                warn!("dropping unpaired trailing entry of embedded files name tree");
            }
        }
        Some(other) => {
            return Err(EmbedError::UnsupportedStructure(format!(
                "embedded files /Names is a {} instead of an array",
                graph::kind(other)
            )));
        }
    }

    let Some(Object::Array(kids)) = node.get(b"Kids").ok().and_then(|obj| graph::resolve(doc, obj))
    else {
        return Ok(());
    };
    for kid in kids {
        if let Object::Reference(id) = kid {
            if !visited.insert(*id) {
                warn!(object = id.0, "skipping name tree node visited twice");
                continue;
            }
        }
        match graph::resolve(doc, kid) {
            Some(Object::Dictionary(child)) => collect_pairs(doc, child, visited, out)?,
            _ => warn!("skipping name tree kid that is not a dictionary"),
        }
    }
    Ok(())
}

pub(crate) fn is_same_name(doc: &Document, key: &Object, target: &str) -> bool {
    graph::text_of(doc, key)
        .map(|name| name.to_lowercase() == target.to_lowercase())
        .unwrap_or(false)
}
