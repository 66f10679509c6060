use crate::{Path, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document node: an id, a type name resolved through the schema, and a
/// property bag.
///
/// Nodes are owned exclusively by the document's node table and reference
/// each other only by id, so there are no ownership cycles to manage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: String,
    pub properties: HashMap<String, Value>,
}

impl Node {
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    pub fn text(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(Value::as_text)
    }

    pub fn ids(&self, property: &str) -> Option<&[String]> {
        self.get(property).and_then(Value::as_ids)
    }

    pub fn offset(&self, property: &str) -> Option<usize> {
        self.get(property).and_then(Value::as_offset)
    }

    pub fn path(&self, property: &str) -> Option<&Path> {
        self.get(property).and_then(Value::as_path)
    }

    pub fn flag(&self, property: &str) -> Option<bool> {
        self.get(property).and_then(Value::as_bool)
    }
}

/// Blueprint for creating a node inside a transaction.
///
/// The id is usually left out and assigned by the document; properties the
/// schema declares but the spec omits are defaulted (empty text, empty id
/// list).
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub id: Option<String>,
    pub node_type: String,
    pub properties: HashMap<String, Value>,
}

impl NodeSpec {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            id: None,
            node_type: node_type.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}
