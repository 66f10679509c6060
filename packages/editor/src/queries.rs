//! # Read-only selection queries
//!
//! Extract the selected text and find the annotations a selection
//! touches, without opening a transaction.

use crate::{EditorError, Selection};
use quire_annotations::{props, AnnotationIndex};
use quire_model::{ContainerIndex, Document, Path};
use std::cmp::Ordering;

/// The text covered by the selection; container selections join the
/// spanned properties with newlines. Null and node selections yield the
/// empty string.
pub fn text_for_selection(doc: &Document, selection: &Selection) -> Result<String, EditorError> {
    match selection {
        Selection::Null | Selection::Node(_) => Ok(String::new()),
        Selection::Property(s) => {
            let text: String = doc
                .get_text(&s.path)?
                .chars()
                .skip(s.start_offset)
                .take(s.end_offset - s.start_offset)
                .collect();
            Ok(text)
        }
        Selection::Container(_) => {
            let parts = selection.split_into_property_selections(doc)?;
            let mut pieces = Vec::with_capacity(parts.len());
            for part in parts {
                let text: String = doc
                    .get_text(&part.path)?
                    .chars()
                    .skip(part.start_offset)
                    .take(part.end_offset - part.start_offset)
                    .collect();
                pieces.push(text);
            }
            Ok(pieces.join("\n"))
        }
    }
}

/// Ids of annotations whose span overlaps the selection, including ones
/// that only touch at a boundary. `node_type` narrows the result to one
/// annotation type.
pub fn annotations_for_selection(
    doc: &Document,
    index: &AnnotationIndex,
    selection: &Selection,
    node_type: Option<&str>,
) -> Result<Vec<String>, EditorError> {
    let mut found = Vec::new();

    match selection {
        Selection::Null | Selection::Node(_) => return Ok(found),
        Selection::Property(s) => {
            collect_property_overlaps(doc, index, &s.path, s.start_offset, s.end_offset, &mut found);
        }
        Selection::Container(sel) => {
            let parts = selection.split_into_property_selections(doc)?;
            for part in &parts {
                collect_property_overlaps(
                    doc,
                    index,
                    &part.path,
                    part.start_offset,
                    part.end_offset,
                    &mut found,
                );
            }
            collect_container_overlaps(doc, sel, &mut found)?;
        }
    }

    if let Some(wanted) = node_type {
        found.retain(|id| {
            doc.get_node(id)
                .map(|n| n.node_type == wanted)
                .unwrap_or(false)
        });
    }
    found.sort();
    found.dedup();
    Ok(found)
}

fn collect_property_overlaps(
    doc: &Document,
    index: &AnnotationIndex,
    path: &Path,
    start: usize,
    end: usize,
    found: &mut Vec<String>,
) {
    for id in index.annotations_on(path) {
        let Some(node) = doc.get_node(&id) else {
            continue;
        };
        let (Some(a_start), Some(a_end)) = (
            node.offset(props::START_OFFSET),
            node.offset(props::END_OFFSET),
        ) else {
            continue;
        };
        if a_start <= end && a_end >= start {
            found.push(id);
        }
    }
}

fn collect_container_overlaps(
    doc: &Document,
    sel: &crate::ContainerSelection,
    found: &mut Vec<String>,
) -> Result<(), EditorError> {
    let index = ContainerIndex::new(doc, &sel.container_id)?;
    for node in doc.annotation_nodes() {
        if node.text(props::CONTAINER_ID) != Some(sel.container_id.as_str()) {
            continue;
        }
        let (Some(start_path), Some(end_path)) =
            (node.path(props::START_PATH), node.path(props::END_PATH))
        else {
            continue;
        };
        let (Some(start_off), Some(end_off)) = (
            node.offset(props::START_OFFSET),
            node.offset(props::END_OFFSET),
        ) else {
            continue;
        };
        let starts_before_sel_end = matches!(
            index.compare_coordinates((start_path, start_off), (&sel.end_path, sel.end_offset)),
            Some(Ordering::Less) | Some(Ordering::Equal)
        );
        let ends_after_sel_start = matches!(
            index.compare_coordinates((end_path, end_off), (&sel.start_path, sel.start_offset)),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        );
        if starts_before_sel_end && ends_after_sel_start {
            found.push(node.id.clone());
        }
    }
    Ok(())
}
