use serde::{Deserialize, Serialize};
use std::fmt;

/// Pointer to an addressable property: `[nodeId, propertyName]`.
///
/// Paths are the only way annotations, selections and ops refer to text;
/// they are resolved through the document's node table on every use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    pub node_id: String,
    pub property: String,
}

impl Path {
    pub fn new(node_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.property)
    }
}
