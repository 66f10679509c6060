//! # Primitive document ops
//!
//! Every mutation the engine performs is one of four ops. Each op carries
//! the state needed to invert itself (deleted nodes travel whole, `Set`
//! keeps the old value), so a committed sequence can be replayed forward or
//! backward against whatever the current document state is.

use crate::{Document, ModelError, Node, Path, Value};
use serde::{Deserialize, Serialize};

/// A length-changing edit to a text property, at character offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "diff", rename_all = "snake_case")]
pub enum TextDiff {
    Insert { offset: usize, text: String },
    Delete { offset: usize, text: String },
}

impl TextDiff {
    /// Number of characters inserted or removed.
    pub fn len(&self) -> usize {
        match self {
            TextDiff::Insert { text, .. } | TextDiff::Delete { text, .. } => {
                text.chars().count()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self) -> usize {
        match self {
            TextDiff::Insert { offset, .. } | TextDiff::Delete { offset, .. } => *offset,
        }
    }

    pub fn inverted(&self) -> TextDiff {
        match self {
            TextDiff::Insert { offset, text } => TextDiff::Delete {
                offset: *offset,
                text: text.clone(),
            },
            TextDiff::Delete { offset, text } => TextDiff::Insert {
                offset: *offset,
                text: text.clone(),
            },
        }
    }

    /// Apply to a string slice, reporting out-of-bounds offsets against
    /// `path` for the error message.
    pub(crate) fn apply_to(&self, text: &str, path: &Path) -> Result<String, ModelError> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        match self {
            TextDiff::Insert { offset, text: ins } => {
                if *offset > len {
                    return Err(ModelError::OffsetOutOfBounds {
                        path: path.clone(),
                        offset: *offset,
                        len,
                    });
                }
                let mut out: String = chars[..*offset].iter().collect();
                out.push_str(ins);
                out.extend(chars[*offset..].iter());
                Ok(out)
            }
            TextDiff::Delete { offset, text: del } => {
                let del_len = del.chars().count();
                if offset + del_len > len {
                    return Err(ModelError::OffsetOutOfBounds {
                        path: path.clone(),
                        offset: offset + del_len,
                        len,
                    });
                }
                let mut out: String = chars[..*offset].iter().collect();
                out.extend(chars[offset + del_len..].iter());
                Ok(out)
            }
        }
    }
}

/// One primitive, invertible mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentOp {
    /// Insert a fully-formed node into the arena.
    Create { node: Node },

    /// Remove a node; the full node travels with the op for inversion.
    Delete { node: Node },

    /// Replace a property value.
    Set { path: Path, old: Value, new: Value },

    /// Insert or delete a run of text.
    UpdateText { path: Path, diff: TextDiff },
}

impl DocumentOp {
    pub fn apply(&self, doc: &mut Document) -> Result<(), ModelError> {
        match self {
            DocumentOp::Create { node } => doc.insert(node.clone()),
            DocumentOp::Delete { node } => doc.delete(&node.id).map(|_| ()),
            DocumentOp::Set { path, new, .. } => doc.set(path, new.clone()).map(|_| ()),
            DocumentOp::UpdateText { path, diff } => doc.update_text(path, diff),
        }
    }

    pub fn inverted(&self) -> DocumentOp {
        match self {
            DocumentOp::Create { node } => DocumentOp::Delete { node: node.clone() },
            DocumentOp::Delete { node } => DocumentOp::Create { node: node.clone() },
            DocumentOp::Set { path, old, new } => DocumentOp::Set {
                path: path.clone(),
                old: new.clone(),
                new: old.clone(),
            },
            DocumentOp::UpdateText { path, diff } => DocumentOp::UpdateText {
                path: path.clone(),
                diff: diff.inverted(),
            },
        }
    }
}
