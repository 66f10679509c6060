//! Well-known annotation property names.
//!
//! A property annotation carries `path`, `start_offset`, `end_offset`; a
//! container annotation carries `start_path`, `start_offset`, `end_path`,
//! `end_offset`, `container_id`. `collapsible` is an optional per-node
//! override of the type-level flag.

pub const PATH: &str = "path";
pub const START_PATH: &str = "start_path";
pub const END_PATH: &str = "end_path";
pub const START_OFFSET: &str = "start_offset";
pub const END_OFFSET: &str = "end_offset";
pub const CONTAINER_ID: &str = "container_id";
pub const COLLAPSIBLE: &str = "collapsible";
