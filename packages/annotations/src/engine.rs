//! # Offset-maintenance engine
//!
//! Recomputes annotation offsets and container-annotation anchors after
//! text insertion, deletion and node splitting. Every adjustment goes
//! through the document's primitive surface and is pushed onto the
//! enclosing op list, so the caller's Change record replays the
//! maintenance exactly as it happened.

use crate::index::{AnchorKind, AnchorRef, AnnotationIndex};
use crate::props;
use quire_model::{ContainerIndex, Document, DocumentOp, Node, Path, Value};
use std::cmp::Ordering;

/// Op-recording view over a document and its annotation index.
pub struct AnnotationUpdater<'a> {
    doc: &'a mut Document,
    index: &'a mut AnnotationIndex,
    ops: &'a mut Vec<DocumentOp>,
}

impl<'a> AnnotationUpdater<'a> {
    pub fn new(
        doc: &'a mut Document,
        index: &'a mut AnnotationIndex,
        ops: &'a mut Vec<DocumentOp>,
    ) -> Self {
        Self { doc, index, ops }
    }

    /// Text of length `length` was inserted into `path` at `offset`.
    ///
    /// Starts shift right when the insertion is at or before them; ends
    /// shift when it is strictly inside, or exactly at the end for types
    /// that extend at their right edge. Anchors honor the `after` flag of
    /// the insertion coordinate: an anchor exactly at the offset stays put
    /// only when the insertion is marked as happening after it.
    pub fn inserted_text(&mut self, path: &Path, offset: usize, after: bool, length: usize) {
        if length == 0 {
            return;
        }
        for id in self.index.annotations_on(path) {
            let Some((start, end)) = self.span_of(&id) else {
                continue;
            };
            let extends = self
                .doc
                .get_node(&id)
                .and_then(|n| self.doc.schema().annotation_behavior(&n.node_type))
                .map(|b| b.extends_right_edge)
                .unwrap_or(true);

            let new_start = if offset <= start { start + length } else { start };
            let mut new_end = if offset < end || (offset == end && extends) {
                end + length
            } else {
                end
            };
            // A collapsed non-extending annotation at the insertion point
            // must not end up inverted.
            new_end = new_end.max(new_start);

            if new_start != start {
                self.set_offset(&id, props::START_OFFSET, new_start);
            }
            if new_end != end {
                self.set_offset(&id, props::END_OFFSET, new_end);
            }
        }

        for anchor in self.index.anchors_on(path) {
            let Some(off) = self.anchor_offset(&anchor) else {
                continue;
            };
            let shifts = offset < off || (offset == off && !after);
            if shifts {
                self.set_offset(&anchor.annotation_id, anchor.offset_prop(), off + length);
            }
        }
    }

    /// The character range `[start, end)` of `path` was deleted.
    ///
    /// Annotations after the range shift left; boundaries inside it clamp
    /// independently to the deletion start. An annotation collapsed by the
    /// clamp is removed (unless non-collapsible) and returned, so callers
    /// implementing replace semantics can recreate an equivalent one.
    pub fn deleted_text(&mut self, path: &Path, start: usize, end: usize) -> Vec<Node> {
        let mut removed = Vec::new();
        if end <= start {
            return removed;
        }
        let length = end - start;
        let clamp = |x: usize| {
            if x <= start {
                x
            } else if x >= end {
                x - length
            } else {
                start
            }
        };

        for id in self.index.annotations_on(path) {
            let Some((anno_start, anno_end)) = self.span_of(&id) else {
                continue;
            };
            let new_start = clamp(anno_start);
            let new_end = clamp(anno_end);

            if new_start == new_end && anno_start != anno_end && self.is_collapsible(&id) {
                tracing::debug!(annotation = %id, "deleting annotation collapsed by text deletion");
                if let Some(node) = self.delete_annotation(&id) {
                    removed.push(node);
                }
                continue;
            }
            if new_start != anno_start {
                self.set_offset(&id, props::START_OFFSET, new_start);
            }
            if new_end != anno_end {
                self.set_offset(&id, props::END_OFFSET, new_end);
            }
        }

        let anchors = self.index.anchors_on(path);
        for anchor in &anchors {
            let Some(off) = self.anchor_offset(anchor) else {
                continue;
            };
            let new_off = clamp(off);
            if new_off != off {
                self.set_offset(&anchor.annotation_id, anchor.offset_prop(), new_off);
            }
        }
        // Anchor updates may have collapsed a container annotation's span.
        for anchor in anchors {
            if self.doc.contains(&anchor.annotation_id)
                && self.container_span_collapsed(&anchor.annotation_id)
                && self.is_collapsible(&anchor.annotation_id)
            {
                tracing::debug!(
                    annotation = %anchor.annotation_id,
                    "deleting container annotation with collapsed span"
                );
                self.delete_annotation(&anchor.annotation_id);
            }
        }
        removed
    }

    /// The text of `path` at and after `at` moved to `new_path` starting at
    /// `new_offset` (node split).
    ///
    /// Annotations entirely at or after the split move whole; a straddling
    /// annotation is truncated at the split and, if its type is splittable,
    /// a sibling annotation is created over the tail on `new_path`.
    pub fn transfer_annotations(
        &mut self,
        path: &Path,
        at: usize,
        new_path: &Path,
        new_offset: usize,
    ) {
        for id in self.index.annotations_on(path) {
            let Some((start, end)) = self.span_of(&id) else {
                continue;
            };
            if start >= at {
                self.set_path(&id, props::PATH, new_path.clone());
                self.set_offset(&id, props::START_OFFSET, start - at + new_offset);
                self.set_offset(&id, props::END_OFFSET, end - at + new_offset);
            } else if end > at {
                // Straddles the split point.
                let splittable = self
                    .doc
                    .get_node(&id)
                    .and_then(|n| self.doc.schema().annotation_behavior(&n.node_type))
                    .map(|b| b.splittable)
                    .unwrap_or(false);
                if splittable {
                    self.split_tail(&id, new_path, new_offset, end - at);
                }
                // start < at < end here, so the truncated head keeps a
                // non-empty span.
                self.set_offset(&id, props::END_OFFSET, at);
            }
        }

        for anchor in self.index.anchors_on(path) {
            let Some(off) = self.anchor_offset(&anchor) else {
                continue;
            };
            if off >= at {
                self.set_path(&anchor.annotation_id, anchor.path_prop(), new_path.clone());
                self.set_offset(
                    &anchor.annotation_id,
                    anchor.offset_prop(),
                    off - at + new_offset,
                );
            }
        }
    }

    /// `node_id` is about to be deleted. Property annotations overlaying it
    /// are deleted with it; container-annotation anchors bound to it are
    /// transferred to the adjacent sibling (start → next addressable path
    /// at offset 0, end → previous addressable path at its length), or the
    /// annotation is deleted when no transfer target exists.
    pub fn node_deleted(&mut self, node_id: &str) {
        let Ok(node_type) = self.doc.node_type_of(node_id) else {
            return;
        };
        let text_properties = node_type.text_properties.clone();

        for prop in &text_properties {
            let path = Path::new(node_id, prop.as_str());
            for id in self.index.annotations_on(&path) {
                self.delete_annotation(&id);
            }
            for anchor in self.index.anchors_on(&path) {
                self.transfer_anchor(&anchor, node_id, &text_properties);
            }
        }
    }

    fn transfer_anchor(&mut self, anchor: &AnchorRef, dying_node_id: &str, props_order: &[String]) {
        if !self.doc.contains(&anchor.annotation_id) {
            return;
        }
        let Some(container_id) = self
            .doc
            .get_node(&anchor.annotation_id)
            .and_then(|n| n.text(props::CONTAINER_ID))
            .map(str::to_string)
        else {
            self.delete_annotation(&anchor.annotation_id);
            return;
        };

        let target: Option<(Path, usize)> = (|| {
            let index = ContainerIndex::new(self.doc, &container_id).ok()?;
            match anchor.kind {
                AnchorKind::Start => {
                    let last_prop = props_order.last()?;
                    let addr =
                        index.address_of(&Path::new(dying_node_id, last_prop.as_str()))?;
                    let next = index.next_address(&addr)?;
                    let path = index.path_at(&next)?;
                    Some((path, 0))
                }
                AnchorKind::End => {
                    let first_prop = props_order.first()?;
                    let addr =
                        index.address_of(&Path::new(dying_node_id, first_prop.as_str()))?;
                    let prev = index.previous_address(&addr)?;
                    let path = index.path_at(&prev)?;
                    let len = self.doc.text_len(&path).ok()?;
                    Some((path, len))
                }
            }
        })();

        match target {
            Some((path, offset)) => {
                tracing::debug!(
                    annotation = %anchor.annotation_id,
                    ?path,
                    offset,
                    "transferring anchor off deleted node"
                );
                self.set_path(&anchor.annotation_id, anchor.path_prop(), path);
                self.set_offset(&anchor.annotation_id, anchor.offset_prop(), offset);
                if self.container_span_collapsed(&anchor.annotation_id)
                    && self.is_collapsible(&anchor.annotation_id)
                {
                    self.delete_annotation(&anchor.annotation_id);
                }
            }
            None => {
                tracing::debug!(
                    annotation = %anchor.annotation_id,
                    "no transfer target for anchor, deleting annotation"
                );
                self.delete_annotation(&anchor.annotation_id);
            }
        }
    }

    /// Clone the straddled annotation's tail onto `new_path`.
    fn split_tail(&mut self, id: &str, new_path: &Path, new_offset: usize, tail_len: usize) {
        let Some(original) = self.doc.get_node(id).cloned() else {
            return;
        };
        let mut node = original;
        node.id = self.doc.next_id();
        node.properties
            .insert(props::PATH.to_string(), Value::Path(new_path.clone()));
        node.properties
            .insert(props::START_OFFSET.to_string(), Value::from(new_offset));
        node.properties
            .insert(props::END_OFFSET.to_string(), Value::from(new_offset + tail_len));
        self.create_annotation(node);
    }

    // --- recorded primitives -------------------------------------------

    fn set_offset(&mut self, node_id: &str, prop: &str, value: usize) {
        self.set_value(node_id, prop, Value::from(value));
    }

    fn set_path(&mut self, node_id: &str, prop: &str, path: Path) {
        self.set_value(node_id, prop, Value::Path(path));
    }

    fn set_value(&mut self, node_id: &str, prop: &str, value: Value) {
        let path = Path::new(node_id, prop);
        // Defensive: missing nodes or properties are skipped, never raised.
        if let Ok(old) = self.doc.set(&path, value.clone()) {
            let op = DocumentOp::Set {
                path,
                old,
                new: value,
            };
            self.index.on_op(self.doc, &op);
            self.ops.push(op);
        }
    }

    fn create_annotation(&mut self, node: Node) {
        if self.doc.insert(node.clone()).is_ok() {
            let op = DocumentOp::Create { node };
            self.index.on_op(self.doc, &op);
            self.ops.push(op);
        }
    }

    fn delete_annotation(&mut self, id: &str) -> Option<Node> {
        let node = self.doc.delete(id).ok()?;
        let op = DocumentOp::Delete { node: node.clone() };
        self.index.on_op(self.doc, &op);
        self.ops.push(op);
        Some(node)
    }

    // --- lookups -------------------------------------------------------

    fn span_of(&self, id: &str) -> Option<(usize, usize)> {
        let node = self.doc.get_node(id)?;
        Some((node.offset(props::START_OFFSET)?, node.offset(props::END_OFFSET)?))
    }

    fn anchor_offset(&self, anchor: &AnchorRef) -> Option<usize> {
        self.doc
            .get_node(&anchor.annotation_id)?
            .offset(anchor.offset_prop())
    }

    fn is_collapsible(&self, id: &str) -> bool {
        let Some(node) = self.doc.get_node(id) else {
            return true;
        };
        if let Some(per_node) = node.flag(props::COLLAPSIBLE) {
            return per_node;
        }
        self.doc
            .schema()
            .annotation_behavior(&node.node_type)
            .map(|b| b.collapsible)
            .unwrap_or(true)
    }

    /// A container annotation is collapsed when its resolved start and end
    /// coordinates are equal, or no longer orderable within its container.
    fn container_span_collapsed(&self, id: &str) -> bool {
        let Some(node) = self.doc.get_node(id) else {
            return false;
        };
        let (Some(start_path), Some(end_path)) =
            (node.path(props::START_PATH), node.path(props::END_PATH))
        else {
            return false;
        };
        let (Some(start_off), Some(end_off)) = (
            node.offset(props::START_OFFSET),
            node.offset(props::END_OFFSET),
        ) else {
            return false;
        };
        let Some(container_id) = node.text(props::CONTAINER_ID) else {
            return false;
        };
        let Ok(index) = ContainerIndex::new(self.doc, container_id) else {
            return false;
        };
        match index.compare_coordinates((start_path, start_off), (end_path, end_off)) {
            Some(Ordering::Less) => false,
            // Equal, inverted, or no longer addressable.
            _ => true,
        }
    }
}
