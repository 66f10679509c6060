//! # Transaction
//!
//! Op recorder over a session's stage document. Every primitive goes
//! through here so that (a) the op is applied to the stage, (b) the
//! annotation index stays current, and (c) the annotation engine hooks
//! fire synchronously after every text update, so the next op in the same
//! transaction already observes consistent annotations. The recorded op
//! list becomes the committed Change.

use crate::{EditorError, Selection};
use quire_annotations::{AnnotationIndex, AnnotationUpdater};
use quire_model::{Document, DocumentOp, Node, NodeSpec, Path, TextDiff, Value};
use std::collections::HashMap;

pub struct Transaction<'a> {
    doc: &'a mut Document,
    index: &'a mut AnnotationIndex,
    ops: Vec<DocumentOp>,
    selection: Selection,
    info: HashMap<String, serde_json::Value>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(
        doc: &'a mut Document,
        index: &'a mut AnnotationIndex,
        selection: Selection,
    ) -> Self {
        Self {
            doc,
            index,
            ops: Vec::new(),
            selection,
            info: HashMap::new(),
        }
    }

    pub fn doc(&self) -> &Document {
        self.doc
    }

    pub fn annotation_index(&self) -> &AnnotationIndex {
        self.index
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The selection recorded into the Change's `after` state.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Attach a caller-supplied field to the Change's `after` state.
    pub fn set_info(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.info.insert(key.into(), value);
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Vec<DocumentOp>, Selection, HashMap<String, serde_json::Value>) {
        (self.ops, self.selection, self.info)
    }

    // --- primitive ops -------------------------------------------------

    /// Create a node from a spec, returning its id.
    pub fn create(&mut self, spec: NodeSpec) -> Result<String, EditorError> {
        let node = self.doc.build_node(spec)?;
        let id = node.id.clone();
        self.doc.insert(node.clone())?;
        self.record(DocumentOp::Create { node });
        Ok(id)
    }

    /// Delete a node with full bookkeeping: annotations overlaying it are
    /// removed, container-annotation anchors bound to it transfer to the
    /// adjacent sibling, and the id is removed from any container listing
    /// it.
    pub fn delete_node(&mut self, id: &str) -> Result<Node, EditorError> {
        // Engine first, while the node is still addressable.
        AnnotationUpdater::new(self.doc, self.index, &mut self.ops).node_deleted(id);
        self.remove_from_containers(id)?;
        let node = self.doc.delete(id)?;
        self.record(DocumentOp::Delete { node: node.clone() });
        Ok(node)
    }

    /// Replace a property value, returning the previous one.
    pub fn set(&mut self, path: &Path, value: impl Into<Value>) -> Result<Value, EditorError> {
        let value = value.into();
        let old = self.doc.set(path, value.clone())?;
        self.record(DocumentOp::Set {
            path: path.clone(),
            old: old.clone(),
            new: value,
        });
        Ok(old)
    }

    /// Insert text at a character offset; annotation hooks fire after the
    /// update. An anchor exactly at `offset` shifts right.
    pub fn insert_text_at(
        &mut self,
        path: &Path,
        offset: usize,
        text: &str,
    ) -> Result<(), EditorError> {
        self.insert_text_coord(path, offset, false, text)
    }

    /// Like [`Self::insert_text_at`], but an anchor exactly at `offset`
    /// stays put (the insertion counts as after it).
    pub fn insert_text_after(
        &mut self,
        path: &Path,
        offset: usize,
        text: &str,
    ) -> Result<(), EditorError> {
        self.insert_text_coord(path, offset, true, text)
    }

    fn insert_text_coord(
        &mut self,
        path: &Path,
        offset: usize,
        after: bool,
        text: &str,
    ) -> Result<(), EditorError> {
        if text.is_empty() {
            return Ok(());
        }
        let diff = TextDiff::Insert {
            offset,
            text: text.to_string(),
        };
        let length = diff.len();
        self.doc.update_text(path, &diff)?;
        self.record(DocumentOp::UpdateText {
            path: path.clone(),
            diff,
        });
        AnnotationUpdater::new(self.doc, self.index, &mut self.ops)
            .inserted_text(path, offset, after, length);
        Ok(())
    }

    /// Delete the character range `[start, end)`; annotation hooks fire
    /// after the update. Annotations removed because the deletion collapsed
    /// them are returned, for callers implementing replace semantics.
    pub fn delete_text_range(
        &mut self,
        path: &Path,
        start: usize,
        end: usize,
    ) -> Result<Vec<Node>, EditorError> {
        if end <= start {
            return Ok(Vec::new());
        }
        let removed_text: String = self
            .doc
            .get_text(path)?
            .chars()
            .skip(start)
            .take(end - start)
            .collect();
        let diff = TextDiff::Delete {
            offset: start,
            text: removed_text,
        };
        self.doc.update_text(path, &diff)?;
        self.record(DocumentOp::UpdateText {
            path: path.clone(),
            diff,
        });
        let removed =
            AnnotationUpdater::new(self.doc, self.index, &mut self.ops).deleted_text(path, start, end);
        Ok(removed)
    }

    /// Move annotations and anchors at or after `at` from `path` onto
    /// `new_path` (node split).
    pub fn transfer_annotations(
        &mut self,
        path: &Path,
        at: usize,
        new_path: &Path,
        new_offset: usize,
    ) {
        AnnotationUpdater::new(self.doc, self.index, &mut self.ops)
            .transfer_annotations(path, at, new_path, new_offset);
    }

    // --- container helpers ---------------------------------------------

    /// The container listing `node_id`, with its position, if any.
    pub fn container_of(&self, node_id: &str) -> Option<(String, usize)> {
        container_of(self.doc, node_id)
    }

    /// Insert `node_id` into a container's child list at `position`.
    pub fn show_node(
        &mut self,
        container_id: &str,
        node_id: &str,
        position: usize,
    ) -> Result<(), EditorError> {
        let path = self.doc.container_path(container_id)?;
        let mut ids = self.doc.container_ids(container_id)?.to_vec();
        let position = position.min(ids.len());
        ids.insert(position, node_id.to_string());
        self.set(&path, Value::Ids(ids))?;
        Ok(())
    }

    fn remove_from_containers(&mut self, node_id: &str) -> Result<(), EditorError> {
        let memberships: Vec<(Path, Vec<String>)> = self
            .doc
            .nodes()
            .filter_map(|node| {
                let node_type = self.doc.schema().node_type(&node.node_type)?;
                let prop = node_type.container_property.as_deref()?;
                let ids = node.ids(prop)?;
                if ids.iter().any(|id| id == node_id) {
                    let remaining: Vec<String> =
                        ids.iter().filter(|id| *id != node_id).cloned().collect();
                    Some((Path::new(node.id.as_str(), prop), remaining))
                } else {
                    None
                }
            })
            .collect();
        for (path, remaining) in memberships {
            self.set(&path, Value::Ids(remaining))?;
        }
        Ok(())
    }

    fn record(&mut self, op: DocumentOp) {
        self.index.on_op(self.doc, &op);
        self.ops.push(op);
    }
}

/// The container listing `node_id`, with its position, if any.
pub(crate) fn container_of(doc: &Document, node_id: &str) -> Option<(String, usize)> {
    doc.nodes().find_map(|node| {
        let node_type = doc.schema().node_type(&node.node_type)?;
        let prop = node_type.container_property.as_deref()?;
        let position = node.ids(prop)?.iter().position(|id| id == node_id)?;
        Some((node.id.clone(), position))
    })
}
