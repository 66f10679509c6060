//! Error types for the document model

use crate::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node already exists: {0}")]
    DuplicateNode(String),

    #[error("unknown node type: {0}")]
    UnknownType(String),

    #[error("property not found: {0}")]
    PropertyNotFound(Path),

    #[error("not a text property: {0}")]
    NotText(Path),

    #[error("node is not a container: {0}")]
    NotAContainer(String),

    #[error("offset {offset} out of bounds for {path} (length {len})")]
    OffsetOutOfBounds {
        path: Path,
        offset: usize,
        len: usize,
    },

    #[error("annotation path does not resolve: {0}")]
    InvalidAnnotationPath(Path),
}
