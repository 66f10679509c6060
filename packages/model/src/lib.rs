//! # Quire Model
//!
//! The document data model for the Quire engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Schema: closed registry of node types       │
//! │  - addressable text properties, in order    │
//! │  - container property (ordered child ids)   │
//! │  - annotation behavior flags                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Document: id-indexed node arena             │
//! │  - nodes reference each other by id only    │
//! │  - primitive surface: get/set/create/delete │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ContainerIndex: Address math over nesting   │
//! │ DocumentOp: replayable, invertible deltas   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Arena, not graph**: nodes never hold references to each other, only
//!    id strings resolved through the document's node table.
//! 2. **Ops are the only delta**: every mutation is expressible as a
//!    [`DocumentOp`] that carries enough state to invert itself.
//! 3. **Addresses order everything**: positions inside nested containers are
//!    compared through [`Address`] tuples, never through node ids.

mod address;
mod container;
mod document;
mod error;
mod node;
mod ops;
mod path;
mod schema;
mod value;

pub use address::Address;
pub use container::ContainerIndex;
pub use document::Document;
pub use error::ModelError;
pub use node::{Node, NodeSpec};
pub use ops::{DocumentOp, TextDiff};
pub use path::Path;
pub use schema::{AnnotationBehavior, NodeType, Schema, SchemaBuilder};
pub use value::Value;
