//! # Quire Annotations
//!
//! Keeps annotations consistent while the text underneath them changes.
//!
//! Two pieces:
//!
//! - [`AnnotationIndex`]: a rebuildable side index from text paths to the
//!   annotations overlaying them and the container-annotation anchors bound
//!   to them.
//! - [`AnnotationUpdater`]: the offset-maintenance engine. Its entry points
//!   (`inserted_text`, `deleted_text`, `transfer_annotations`,
//!   `node_deleted`) run synchronously after every text mutation inside a
//!   transaction, and every adjustment they make is recorded as a
//!   [`quire_model::DocumentOp`] so it becomes part of the enclosing
//!   Change.
//!
//! All entry points are defensive: a path with no index entries is a silent
//! no-op, never an error, because they must be callable for any text
//! mutation regardless of whether annotations exist.

mod engine;
mod index;
pub mod props;

pub use engine::AnnotationUpdater;
pub use index::{AnchorKind, AnchorRef, AnnotationIndex};
