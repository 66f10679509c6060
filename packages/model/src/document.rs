//! # Document
//!
//! An id-indexed node arena plus the primitive mutation surface
//! (`get`/`set`/`create`/`delete`/`update_text`). The primitives validate
//! structure but record nothing; replayable deltas are built one level up
//! from [`crate::DocumentOp`]s, which call back into this surface.

use crate::{ModelError, Node, NodeSpec, NodeType, Path, Schema, TextDiff, Value};
use quire_common::IdGenerator;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Document {
    schema: Arc<Schema>,
    nodes: HashMap<String, Node>,
    ids: IdGenerator,
    version: u64,
}

impl Document {
    pub fn new(schema: Schema, origin: &str) -> Self {
        Self {
            schema: Arc::new(schema),
            nodes: HashMap::new(),
            ids: IdGenerator::new(origin),
            version: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Increments on every primitive mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Erroring accessor for call sites that must fail fast.
    pub fn node(&self, id: &str) -> Result<&Node, ModelError> {
        self.nodes
            .get(id)
            .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))
    }

    pub fn node_type_of(&self, id: &str) -> Result<&NodeType, ModelError> {
        let node = self.node(id)?;
        self.schema
            .node_type(&node.node_type)
            .ok_or_else(|| ModelError::UnknownType(node.node_type.clone()))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn annotation_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|n| self.schema.is_annotation(&n.node_type))
    }

    /// Hand out the next sequential node id.
    pub fn next_id(&mut self) -> String {
        self.ids.next_id()
    }

    /// Materialize a spec into a node: assigns an id if none was given,
    /// fills schema-declared properties with defaults, and validates that
    /// annotation paths resolve.
    pub fn build_node(&mut self, spec: NodeSpec) -> Result<Node, ModelError> {
        let node_type = self
            .schema
            .node_type(&spec.node_type)
            .ok_or_else(|| ModelError::UnknownType(spec.node_type.clone()))?
            .clone();

        let id = match spec.id {
            Some(id) => id,
            None => self.next_id(),
        };
        if self.nodes.contains_key(&id) {
            return Err(ModelError::DuplicateNode(id));
        }

        let mut properties = spec.properties;
        for text_prop in &node_type.text_properties {
            properties
                .entry(text_prop.clone())
                .or_insert_with(|| Value::Text(String::new()));
        }
        if let Some(container_prop) = &node_type.container_property {
            properties
                .entry(container_prop.clone())
                .or_insert_with(|| Value::Ids(Vec::new()));
        }

        let node = Node {
            id,
            node_type: spec.node_type,
            properties,
        };
        if node_type.is_annotation() {
            self.validate_annotation_paths(&node)?;
        }
        Ok(node)
    }

    /// Create a node from a spec and insert it.
    pub fn create(&mut self, spec: NodeSpec) -> Result<String, ModelError> {
        let node = self.build_node(spec)?;
        let id = node.id.clone();
        self.insert(node)?;
        Ok(id)
    }

    /// Insert a fully-formed node (op replay path).
    pub fn insert(&mut self, node: Node) -> Result<(), ModelError> {
        if self.schema.node_type(&node.node_type).is_none() {
            return Err(ModelError::UnknownType(node.node_type.clone()));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(ModelError::DuplicateNode(node.id));
        }
        // Replayed ops carry ids minted on another copy of this document;
        // keep the generator ahead of them.
        self.ids.observe(&node.id);
        self.nodes.insert(node.id.clone(), node);
        self.version += 1;
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<Node, ModelError> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))?;
        self.version += 1;
        Ok(node)
    }

    pub fn get(&self, path: &Path) -> Result<&Value, ModelError> {
        self.node(&path.node_id)?
            .get(&path.property)
            .ok_or_else(|| ModelError::PropertyNotFound(path.clone()))
    }

    pub fn get_text(&self, path: &Path) -> Result<&str, ModelError> {
        self.get(path)?
            .as_text()
            .ok_or_else(|| ModelError::NotText(path.clone()))
    }

    /// Length of a text property in characters.
    pub fn text_len(&self, path: &Path) -> Result<usize, ModelError> {
        Ok(self.get_text(path)?.chars().count())
    }

    /// Replace a property value, returning the previous one.
    pub fn set(&mut self, path: &Path, value: Value) -> Result<Value, ModelError> {
        let node = self
            .nodes
            .get_mut(&path.node_id)
            .ok_or_else(|| ModelError::NodeNotFound(path.node_id.clone()))?;
        let slot = node
            .properties
            .get_mut(&path.property)
            .ok_or_else(|| ModelError::PropertyNotFound(path.clone()))?;
        let old = std::mem::replace(slot, value);
        self.version += 1;
        Ok(old)
    }

    /// Apply a length-changing text diff at character offsets.
    pub fn update_text(&mut self, path: &Path, diff: &TextDiff) -> Result<(), ModelError> {
        let text = self.get_text(path)?;
        let updated = diff.apply_to(text, path)?;
        let node = self
            .nodes
            .get_mut(&path.node_id)
            .ok_or_else(|| ModelError::NodeNotFound(path.node_id.clone()))?;
        node.properties
            .insert(path.property.clone(), Value::Text(updated));
        self.version += 1;
        Ok(())
    }

    /// The ordered child ids of a container node.
    pub fn container_ids(&self, container_id: &str) -> Result<&[String], ModelError> {
        let node_type = self.node_type_of(container_id)?;
        let prop = node_type
            .container_property
            .clone()
            .ok_or_else(|| ModelError::NotAContainer(container_id.to_string()))?;
        self.node(container_id)?
            .ids(&prop)
            .ok_or_else(|| ModelError::NotAContainer(container_id.to_string()))
    }

    /// Path of a container node's child-id property.
    pub fn container_path(&self, container_id: &str) -> Result<Path, ModelError> {
        let node_type = self.node_type_of(container_id)?;
        let prop = node_type
            .container_property
            .as_deref()
            .ok_or_else(|| ModelError::NotAContainer(container_id.to_string()))?;
        Ok(Path::new(container_id, prop))
    }

    /// Every `Path`-valued property of an annotation must resolve to text
    /// at creation time.
    fn validate_annotation_paths(&self, node: &Node) -> Result<(), ModelError> {
        for value in node.properties.values() {
            if let Value::Path(path) = value {
                self.get_text(path)
                    .map_err(|_| ModelError::InvalidAnnotationPath(path.clone()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnnotationBehavior, Schema};

    fn schema() -> Schema {
        Schema::builder("article")
            .text("paragraph", &["content"])
            .container("body", "nodes")
            .annotation("emphasis", AnnotationBehavior::default())
            .build()
    }

    #[test]
    fn create_defaults_declared_properties() {
        let mut doc = Document::new(schema(), "/test.qd");
        let id = doc.create(NodeSpec::new("paragraph")).unwrap();
        assert_eq!(doc.get_text(&Path::new(id.as_str(), "content")).unwrap(), "");
    }

    #[test]
    fn create_rejects_unknown_types() {
        let mut doc = Document::new(schema(), "/test.qd");
        let err = doc.create(NodeSpec::new("sidebar")).unwrap_err();
        assert_eq!(err, ModelError::UnknownType("sidebar".to_string()));
    }

    #[test]
    fn annotation_paths_must_resolve() {
        let mut doc = Document::new(schema(), "/test.qd");
        let spec = NodeSpec::new("emphasis")
            .prop("path", Path::new("missing", "content"))
            .prop("start_offset", 0usize)
            .prop("end_offset", 2usize);
        assert!(matches!(
            doc.create(spec),
            Err(ModelError::InvalidAnnotationPath(_))
        ));
    }

    #[test]
    fn set_returns_previous_value() -> anyhow::Result<()> {
        let mut doc = Document::new(schema(), "/test.qd");
        let id = doc.create(NodeSpec::new("paragraph").prop("content", "old"))?;
        let path = Path::new(id.as_str(), "content");
        let old = doc.set(&path, Value::from("new"))?;
        assert_eq!(old, Value::from("old"));
        assert_eq!(doc.get_text(&path)?, "new");
        Ok(())
    }

    #[test]
    fn update_text_uses_character_offsets() {
        let mut doc = Document::new(schema(), "/test.qd");
        let id = doc
            .create(NodeSpec::new("paragraph").prop("content", "héllo"))
            .unwrap();
        let path = Path::new(id.as_str(), "content");
        doc.update_text(
            &path,
            &TextDiff::Insert {
                offset: 2,
                text: "y".to_string(),
            },
        )
        .unwrap();
        assert_eq!(doc.get_text(&path).unwrap(), "héyllo");
    }
}
