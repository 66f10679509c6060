//! # Node type registry
//!
//! The schema is a closed set of node types with capability probes
//! (`is_text`, `is_container`, `is_annotation`) instead of an open class
//! hierarchy. Annotation behavior that used to be inferred from the type
//! name (right-edge extension, split behavior) is an explicit per-type
//! flag here.

use std::collections::HashMap;

/// Behavior flags for an annotation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationBehavior {
    /// Spans from one text property to another within a container, tracked
    /// through start/end anchors, instead of overlaying a single property.
    pub container_scoped: bool,

    /// Splitting the annotated node splits the annotation into two; a
    /// non-splittable annotation is truncated at the split point instead.
    pub splittable: bool,

    /// Typing exactly at the end offset pulls the annotation wider. False
    /// for "external" types such as links, where text typed at the right
    /// edge should not become part of the mark.
    pub extends_right_edge: bool,

    /// Deleted automatically when its span collapses to zero length.
    pub collapsible: bool,
}

impl Default for AnnotationBehavior {
    fn default() -> Self {
        Self {
            container_scoped: false,
            splittable: true,
            extends_right_edge: true,
            collapsible: true,
        }
    }
}

/// One entry in the schema.
#[derive(Debug, Clone)]
pub struct NodeType {
    pub name: String,

    /// Addressable text properties in sibling order. The property index is
    /// the trailing component of the node's [`crate::Address`].
    pub text_properties: Vec<String>,

    /// Property holding the ordered child id list, if this type is a
    /// container.
    pub container_property: Option<String>,

    /// Present iff this type is an annotation.
    pub annotation: Option<AnnotationBehavior>,
}

impl NodeType {
    pub fn is_text(&self) -> bool {
        !self.text_properties.is_empty()
    }

    pub fn is_container(&self) -> bool {
        self.container_property.is_some()
    }

    pub fn is_annotation(&self) -> bool {
        self.annotation.is_some()
    }

    pub fn property_index(&self, property: &str) -> Option<usize> {
        self.text_properties.iter().position(|p| p == property)
    }
}

/// Closed registry of node types for one document class.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    types: HashMap<String, NodeType>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            types: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.types.get(name)
    }

    pub fn annotation_behavior(&self, name: &str) -> Option<AnnotationBehavior> {
        self.types.get(name).and_then(|t| t.annotation)
    }

    pub fn is_annotation(&self, name: &str) -> bool {
        self.annotation_behavior(name).is_some()
    }
}

pub struct SchemaBuilder {
    name: String,
    types: HashMap<String, NodeType>,
}

impl SchemaBuilder {
    /// A node with one or more addressable text properties, e.g. a
    /// paragraph (`content`) or a figure (`title`, `caption`).
    pub fn text(mut self, name: &str, properties: &[&str]) -> Self {
        self.types.insert(
            name.to_string(),
            NodeType {
                name: name.to_string(),
                text_properties: properties.iter().map(|p| p.to_string()).collect(),
                container_property: None,
                annotation: None,
            },
        );
        self
    }

    /// A node whose `property` holds an ordered child id list. Containers
    /// may nest.
    pub fn container(mut self, name: &str, property: &str) -> Self {
        self.types.insert(
            name.to_string(),
            NodeType {
                name: name.to_string(),
                text_properties: Vec::new(),
                container_property: Some(property.to_string()),
                annotation: None,
            },
        );
        self
    }

    /// An annotation type with explicit behavior flags.
    pub fn annotation(mut self, name: &str, behavior: AnnotationBehavior) -> Self {
        self.types.insert(
            name.to_string(),
            NodeType {
                name: name.to_string(),
                text_properties: Vec::new(),
                container_property: None,
                annotation: Some(behavior),
            },
        );
        self
    }

    /// A node with no addressable properties (images, embeds). Contributes
    /// no Address and is skipped by traversal.
    pub fn object(mut self, name: &str) -> Self {
        self.types.insert(
            name.to_string(),
            NodeType {
                name: name.to_string(),
                text_properties: Vec::new(),
                container_property: None,
                annotation: None,
            },
        );
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            name: self.name,
            types: self.types,
        }
    }
}
