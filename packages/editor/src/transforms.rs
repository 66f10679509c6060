//! # Editing transforms
//!
//! Selection-driven edits built on the transaction primitives: typing,
//! range deletion (including container ranges that merge partially
//! deleted boundary nodes), and splitting a text node. Each transform
//! returns the selection after the edit and records it on the
//! transaction.

use crate::transaction::container_of;
use crate::{EditorError, Selection, Transaction};
use quire_model::{ContainerIndex, NodeSpec, Path};

/// Insert `text` at the selection, replacing a non-collapsed range.
/// Returns the collapsed selection after the inserted text.
pub fn insert_text(
    tx: &mut Transaction,
    selection: &Selection,
    text: &str,
) -> Result<Selection, EditorError> {
    match selection {
        Selection::Property(s) => {
            if s.start_offset != s.end_offset {
                tx.delete_text_range(&s.path, s.start_offset, s.end_offset)?;
            }
            tx.insert_text_at(&s.path, s.start_offset, text)?;
            let caret = s.start_offset + text.chars().count();
            let after = Selection::collapsed(tx.doc(), s.path.clone(), caret)?;
            tx.set_selection(after.clone());
            Ok(after)
        }
        Selection::Container(_) => {
            let collapsed = delete_selection(tx, selection)?;
            insert_text(tx, &collapsed, text)
        }
        _ => Err(EditorError::SelectionRequired),
    }
}

/// Delete the selected range. For container selections the partially
/// deleted first and last nodes are merged: the tail of the last node is
/// appended to the first and its annotations are re-anchored there.
/// Returns the collapsed selection at the deletion point.
pub fn delete_selection(
    tx: &mut Transaction,
    selection: &Selection,
) -> Result<Selection, EditorError> {
    match selection {
        Selection::Null => Err(EditorError::SelectionRequired),
        Selection::Property(s) => {
            tx.delete_text_range(&s.path, s.start_offset, s.end_offset)?;
            let after = Selection::collapsed(tx.doc(), s.path.clone(), s.start_offset)?;
            tx.set_selection(after.clone());
            Ok(after)
        }
        Selection::Container(s) => {
            let paths = ContainerIndex::new(tx.doc(), &s.container_id)?
                .path_range(&s.start_path, &s.end_path);
            if paths.is_empty() {
                return Err(EditorError::InvalidSelection(format!(
                    "selection endpoints are not addressable in container {}",
                    s.container_id
                )));
            }

            if paths.len() == 1 {
                tx.delete_text_range(&paths[0], s.start_offset, s.end_offset)?;
                let after = Selection::collapsed(tx.doc(), paths[0].clone(), s.start_offset)?;
                tx.set_selection(after.clone());
                return Ok(after);
            }

            let first = paths.first().cloned().unwrap_or_else(|| s.start_path.clone());
            let last = paths.last().cloned().unwrap_or_else(|| s.end_path.clone());

            // Trim the boundary properties.
            let first_len = tx.doc().text_len(&first)?;
            tx.delete_text_range(&first, s.start_offset, first_len)?;
            tx.delete_text_range(&last, 0, s.end_offset)?;

            // Fully covered interior: clear properties belonging to the
            // boundary nodes, delete everything else.
            let mut interior_nodes: Vec<String> = Vec::new();
            for path in &paths[1..paths.len() - 1] {
                if path.node_id == first.node_id || path.node_id == last.node_id {
                    let len = tx.doc().text_len(path)?;
                    tx.delete_text_range(path, 0, len)?;
                } else if !interior_nodes.contains(&path.node_id) {
                    interior_nodes.push(path.node_id.clone());
                }
            }
            for node_id in interior_nodes {
                tx.delete_node(&node_id)?;
            }

            // Merge the remaining tail of the last node into the first.
            if first.node_id != last.node_id {
                let tail = tx.doc().get_text(&last)?.to_string();
                tx.insert_text_at(&first, s.start_offset, &tail)?;
                tx.transfer_annotations(&last, 0, &first, s.start_offset);
                tx.delete_node(&last.node_id)?;
            }

            let after = Selection::collapsed(tx.doc(), first, s.start_offset)?;
            tx.set_selection(after.clone());
            Ok(after)
        }
        Selection::Node(s) => {
            tx.delete_node(&s.node_id)?;
            let after = Selection::null();
            tx.set_selection(after.clone());
            Ok(after)
        }
    }
}

/// Split a text node at a collapsed property selection ("insert new block
/// mid-paragraph"): the text and annotations after the caret move to a
/// fresh node of the same type inserted right after the original. Returns
/// the collapsed selection at the start of the new node.
pub fn break_node(
    tx: &mut Transaction,
    selection: &Selection,
) -> Result<Selection, EditorError> {
    let selection = if selection.is_collapsed() {
        selection.clone()
    } else {
        delete_selection(tx, selection)?
    };
    let Selection::Property(s) = &selection else {
        return Err(EditorError::SelectionRequired);
    };

    let (container_id, position) = container_of(tx.doc(), &s.path.node_id)
        .ok_or_else(|| {
            EditorError::InvalidSelection(format!(
                "node {} is not shown in any container",
                s.path.node_id
            ))
        })?;

    let node_type = tx.doc().node(&s.path.node_id)?.node_type.clone();
    let text_len = tx.doc().text_len(&s.path)?;
    let tail: String = tx
        .doc()
        .get_text(&s.path)?
        .chars()
        .skip(s.start_offset)
        .collect();

    let new_id = tx.create(NodeSpec::new(node_type).prop(s.path.property.as_str(), tail))?;
    let new_path = Path::new(new_id.as_str(), s.path.property.as_str());

    tx.transfer_annotations(&s.path, s.start_offset, &new_path, 0);
    tx.delete_text_range(&s.path, s.start_offset, text_len)?;
    tx.show_node(&container_id, &new_id, position + 1)?;

    let after = Selection::collapsed(tx.doc(), new_path, 0)?;
    tx.set_selection(after.clone());
    Ok(after)
}
