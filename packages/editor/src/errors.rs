//! Error types for the editing engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Model(#[from] quire_model::ModelError),

    #[error("a non-collapsed selection is required for this operation")]
    SelectionRequired,

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("not an annotation node: {0}")]
    NotAnAnnotation(String),

    #[error("annotation type mismatch: {0}")]
    AnnotationMismatch(String),

    #[error("change not found in log: {0}")]
    UnknownChange(String),
}
