//! # Quire editing engine
//!
//! Transactional editing over a shared document: selections drive
//! transforms, transforms record primitive ops through a transaction, and
//! a committed transaction becomes a [`Change`] on the shared log. Every
//! session stages its edits on a private copy and converges by replaying
//! the log, which is also how undo and redo work (an undo is the inverse
//! change, committed like any other).
//!
//! ```text
//!  Session ── transaction ──> Transaction ── ops ──> stage Document
//!     │                            │
//!     │                       AnnotationUpdater (offset maintenance)
//!     │
//!     └── commit ──> DocumentHandle { document, index, change log }
//!                         │
//!                         └── observers, other sessions (replay)
//! ```

mod annotation_ops;
mod change;
mod errors;
mod queries;
mod selection;
mod session;
mod transaction;
mod transforms;

pub use annotation_ops::{
    create_annotation, create_property_annotations, expand_annotation, fuse_annotations,
    truncate_annotation,
};
pub use change::{Change, ChangeState};
pub use errors::EditorError;
pub use queries::{annotations_for_selection, text_for_selection};
pub use selection::{
    ContainerSelection, NodeSelection, NodeSelectionMode, PropertySelection, Selection,
};
pub use session::{DocumentHandle, DocumentObserver, Session};
pub use transaction::Transaction;
pub use transforms::{break_node, delete_selection, insert_text};
