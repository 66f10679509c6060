//! # Annotation index
//!
//! Side index from text paths to the annotation ids overlaying them and the
//! container-annotation anchors bound to them. Rebuildable from scratch by
//! scanning the node table, and maintained incrementally from applied ops
//! so stages and replicas can keep it current during replay.

use crate::props;
use quire_model::{Document, DocumentOp, Node, Path, Value};
use std::collections::{BTreeSet, HashMap};

/// Which endpoint of a container annotation an anchor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnchorKind {
    Start,
    End,
}

/// Reference to one endpoint of a container annotation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnchorRef {
    pub annotation_id: String,
    pub kind: AnchorKind,
}

impl AnchorRef {
    /// Property holding this anchor's path.
    pub fn path_prop(&self) -> &'static str {
        match self.kind {
            AnchorKind::Start => props::START_PATH,
            AnchorKind::End => props::END_PATH,
        }
    }

    /// Property holding this anchor's offset.
    pub fn offset_prop(&self) -> &'static str {
        match self.kind {
            AnchorKind::Start => props::START_OFFSET,
            AnchorKind::End => props::END_OFFSET,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    /// Property annotations, by the path they overlay.
    by_path: HashMap<Path, BTreeSet<String>>,

    /// Container-annotation anchors, by the path they are bound to.
    anchors: HashMap<Path, BTreeSet<AnchorRef>>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index for a document by scanning its annotation nodes.
    pub fn for_document(doc: &Document) -> Self {
        let mut index = Self::new();
        index.rebuild(doc);
        index
    }

    pub fn rebuild(&mut self, doc: &Document) {
        self.by_path.clear();
        self.anchors.clear();
        let nodes: Vec<&Node> = doc.annotation_nodes().collect();
        for node in nodes {
            self.register(doc, node);
        }
    }

    pub fn register(&mut self, doc: &Document, node: &Node) {
        let Some(behavior) = doc.schema().annotation_behavior(&node.node_type) else {
            return;
        };
        if behavior.container_scoped {
            if let Some(path) = node.path(props::START_PATH) {
                self.anchors.entry(path.clone()).or_default().insert(AnchorRef {
                    annotation_id: node.id.clone(),
                    kind: AnchorKind::Start,
                });
            }
            if let Some(path) = node.path(props::END_PATH) {
                self.anchors.entry(path.clone()).or_default().insert(AnchorRef {
                    annotation_id: node.id.clone(),
                    kind: AnchorKind::End,
                });
            }
        } else if let Some(path) = node.path(props::PATH) {
            self.by_path
                .entry(path.clone())
                .or_default()
                .insert(node.id.clone());
        }
    }

    pub fn unregister(&mut self, node: &Node) {
        if let Some(path) = node.path(props::PATH) {
            if let Some(set) = self.by_path.get_mut(path) {
                set.remove(&node.id);
                if set.is_empty() {
                    self.by_path.remove(path);
                }
            }
        }
        for kind in [AnchorKind::Start, AnchorKind::End] {
            let anchor = AnchorRef {
                annotation_id: node.id.clone(),
                kind,
            };
            if let Some(path) = node.path(anchor.path_prop()) {
                if let Some(set) = self.anchors.get_mut(path) {
                    set.remove(&anchor);
                    if set.is_empty() {
                        self.anchors.remove(path);
                    }
                }
            }
        }
    }

    /// Incremental maintenance; call after `op` has been applied to `doc`.
    pub fn on_op(&mut self, doc: &Document, op: &DocumentOp) {
        match op {
            DocumentOp::Create { node } => self.register(doc, node),
            DocumentOp::Delete { node } => self.unregister(node),
            DocumentOp::Set { path, old, new } => {
                self.on_set(doc, path, old, new);
            }
            DocumentOp::UpdateText { .. } => {}
        }
    }

    fn on_set(&mut self, doc: &Document, prop_path: &Path, old: &Value, new: &Value) {
        let Some(node) = doc.get_node(&prop_path.node_id) else {
            return;
        };
        let Some(behavior) = doc.schema().annotation_behavior(&node.node_type) else {
            return;
        };

        match prop_path.property.as_str() {
            props::PATH if !behavior.container_scoped => {
                if let Some(old_path) = old.as_path() {
                    if let Some(set) = self.by_path.get_mut(old_path) {
                        set.remove(&node.id);
                        if set.is_empty() {
                            self.by_path.remove(old_path);
                        }
                    }
                }
                if let Some(new_path) = new.as_path() {
                    self.by_path
                        .entry(new_path.clone())
                        .or_default()
                        .insert(node.id.clone());
                }
            }
            props::START_PATH | props::END_PATH if behavior.container_scoped => {
                let kind = if prop_path.property == props::START_PATH {
                    AnchorKind::Start
                } else {
                    AnchorKind::End
                };
                let anchor = AnchorRef {
                    annotation_id: node.id.clone(),
                    kind,
                };
                if let Some(old_path) = old.as_path() {
                    if let Some(set) = self.anchors.get_mut(old_path) {
                        set.remove(&anchor);
                        if set.is_empty() {
                            self.anchors.remove(old_path);
                        }
                    }
                }
                if let Some(new_path) = new.as_path() {
                    self.anchors.entry(new_path.clone()).or_default().insert(anchor);
                }
            }
            _ => {}
        }
    }

    /// Ids of property annotations overlaying `path`, in id order.
    pub fn annotations_on(&self, path: &Path) -> Vec<String> {
        self.by_path
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Anchors bound to `path`, in (id, kind) order.
    pub fn anchors_on(&self, path: &Path) -> Vec<AnchorRef> {
        self.anchors
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{AnnotationBehavior, NodeSpec, Schema};

    fn doc_with_annotation() -> (Document, String) {
        let schema = Schema::builder("article")
            .text("paragraph", &["content"])
            .annotation("emphasis", AnnotationBehavior::default())
            .annotation(
                "comment",
                AnnotationBehavior {
                    container_scoped: true,
                    ..Default::default()
                },
            )
            .container("body", "nodes")
            .build();
        let mut doc = Document::new(schema, "/index.qd");
        doc.create(NodeSpec::new("paragraph").with_id("p1").prop("content", "hello world"))
            .unwrap();
        let em = doc
            .create(
                NodeSpec::new("emphasis")
                    .prop(props::PATH, Path::new("p1", "content"))
                    .prop(props::START_OFFSET, 0usize)
                    .prop(props::END_OFFSET, 5usize),
            )
            .unwrap();
        (doc, em)
    }

    #[test]
    fn rebuild_indexes_property_annotations() {
        let (doc, em) = doc_with_annotation();
        let index = AnnotationIndex::for_document(&doc);
        assert_eq!(index.annotations_on(&Path::new("p1", "content")), vec![em]);
        assert!(index.annotations_on(&Path::new("p2", "content")).is_empty());
    }

    #[test]
    fn anchors_index_both_endpoints() {
        let (mut doc, _) = doc_with_annotation();
        doc.create(NodeSpec::new("paragraph").with_id("p2").prop("content", "tail"))
            .unwrap();
        let comment = doc
            .create(
                NodeSpec::new("comment")
                    .prop(props::START_PATH, Path::new("p1", "content"))
                    .prop(props::START_OFFSET, 2usize)
                    .prop(props::END_PATH, Path::new("p2", "content"))
                    .prop(props::END_OFFSET, 3usize)
                    .prop(props::CONTAINER_ID, "body1"),
            )
            .unwrap();
        let index = AnnotationIndex::for_document(&doc);

        let starts = index.anchors_on(&Path::new("p1", "content"));
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].annotation_id, comment);
        assert_eq!(starts[0].kind, AnchorKind::Start);
        assert_eq!(index.anchors_on(&Path::new("p2", "content"))[0].kind, AnchorKind::End);
    }

    #[test]
    fn set_op_moves_index_entries() {
        let (mut doc, em) = doc_with_annotation();
        doc.create(NodeSpec::new("paragraph").with_id("p2").prop("content", "tail"))
            .unwrap();
        let mut index = AnnotationIndex::for_document(&doc);

        let prop_path = Path::new(em.as_str(), props::PATH);
        let old = doc
            .set(&prop_path, Value::Path(Path::new("p2", "content")))
            .unwrap();
        let op = DocumentOp::Set {
            path: prop_path,
            old,
            new: Value::Path(Path::new("p2", "content")),
        };
        index.on_op(&doc, &op);

        assert!(index.annotations_on(&Path::new("p1", "content")).is_empty());
        assert_eq!(index.annotations_on(&Path::new("p2", "content")), vec![em]);
    }
}
