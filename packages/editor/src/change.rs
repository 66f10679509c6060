//! # Change records
//!
//! A Change is the durable record of one committed transaction: the op
//! sequence plus the auxiliary session state (notably the selection)
//! captured before and after the edit. Ops are replayable in recorded
//! order; inversion reverses the sequence and inverts each op, so a Change
//! can be undone against whatever the current document state is.

use crate::Selection;
use quire_model::DocumentOp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Auxiliary session state around an edit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeState {
    pub selection: Selection,

    /// Caller-supplied fields (e.g. a label for the history UI).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub info: HashMap<String, serde_json::Value>,
}

impl ChangeState {
    pub fn with_selection(selection: Selection) -> Self {
        Self {
            selection,
            info: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub id: String,
    pub ops: Vec<DocumentOp>,
    pub before: ChangeState,
    pub after: ChangeState,
}

impl Change {
    /// The inverse record: ops inverted and reversed, before/after swapped.
    pub fn inverted(&self, id: impl Into<String>) -> Change {
        Change {
            id: id.into(),
            ops: self.ops.iter().rev().map(DocumentOp::inverted).collect(),
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }

    /// A forward replay of this change under a fresh id (redo).
    pub fn replayed(&self, id: impl Into<String>) -> Change {
        Change {
            id: id.into(),
            ops: self.ops.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{Path, TextDiff};

    #[test]
    fn inversion_reverses_and_inverts_ops() {
        let change = Change {
            id: "c1".to_string(),
            ops: vec![
                DocumentOp::UpdateText {
                    path: Path::new("p1", "content"),
                    diff: TextDiff::Insert {
                        offset: 0,
                        text: "a".to_string(),
                    },
                },
                DocumentOp::UpdateText {
                    path: Path::new("p1", "content"),
                    diff: TextDiff::Insert {
                        offset: 1,
                        text: "b".to_string(),
                    },
                },
            ],
            before: ChangeState::default(),
            after: ChangeState::default(),
        };

        let inv = change.inverted("c2");
        assert_eq!(inv.ops.len(), 2);
        assert_eq!(
            inv.ops[0],
            DocumentOp::UpdateText {
                path: Path::new("p1", "content"),
                diff: TextDiff::Delete {
                    offset: 1,
                    text: "b".to_string(),
                },
            }
        );
    }

    #[test]
    fn changes_serialize_round_trip() {
        let change = Change {
            id: "c1".to_string(),
            ops: vec![DocumentOp::UpdateText {
                path: Path::new("p1", "content"),
                diff: TextDiff::Insert {
                    offset: 4,
                    text: "test".to_string(),
                },
            }],
            before: ChangeState::default(),
            after: ChangeState::default(),
        };
        let json = serde_json::to_string(&change).unwrap();
        let back: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(change, back);
    }
}
