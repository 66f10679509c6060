//! Error types for the collaboration boundary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollabError {
    #[error(transparent)]
    Editor(#[from] quire_editor::EditorError),

    #[error(transparent)]
    Model(#[from] quire_model::ModelError),

    #[error("no changes stored for document {0}")]
    UnknownDocument(String),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}
