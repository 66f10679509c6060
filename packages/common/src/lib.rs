//! # Quire Common
//!
//! Shared utilities for the Quire document engine.
//!
//! Currently this is the id scheme: every document gets a stable
//! crc32-derived seed, and every node id is `<seed>-<counter>` so that ids
//! are unique per document and cheap to generate inside transactions.

mod id;

pub use id::{document_id, IdGenerator};
