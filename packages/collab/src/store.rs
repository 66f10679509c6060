//! # Change and snapshot stores
//!
//! Storage traits for the collaboration boundary plus in-memory reference
//! implementations. A host backs these with whatever persistence it has;
//! the engine only needs append/read of Change records and optional
//! snapshots to cut replay short.

use crate::CollabError;
use quire_editor::Change;
use quire_model::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Append-only log of committed changes, per document.
pub trait ChangeStore {
    /// Append a change. Appending a change id the store already holds is a
    /// no-op, so redelivery is harmless.
    fn append(&mut self, doc_id: &str, change: Change) -> Result<(), CollabError>;

    /// All stored changes for a document, in append order.
    fn changes(&self, doc_id: &str) -> Result<Vec<Change>, CollabError>;

    /// Stored changes from `from` (an index into the append order) on.
    fn changes_since(&self, doc_id: &str, from: usize) -> Result<Vec<Change>, CollabError> {
        let mut changes = self.changes(doc_id)?;
        if from >= changes.len() {
            return Ok(Vec::new());
        }
        Ok(changes.split_off(from))
    }

    fn len(&self, doc_id: &str) -> Result<usize, CollabError> {
        Ok(self.changes(doc_id)?.len())
    }
}

/// Point-in-time copy of a document's node table, with the number of log
/// changes it already folds in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub nodes: Vec<Node>,
    pub change_count: usize,
}

/// Snapshot storage, one slot per document.
pub trait SnapshotStore {
    fn save(&mut self, doc_id: &str, snapshot: DocumentSnapshot) -> Result<(), CollabError>;
    fn load(&self, doc_id: &str) -> Result<Option<DocumentSnapshot>, CollabError>;
}

#[derive(Default)]
pub struct MemoryChangeStore {
    logs: HashMap<String, Vec<Change>>,
}

impl MemoryChangeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeStore for MemoryChangeStore {
    fn append(&mut self, doc_id: &str, change: Change) -> Result<(), CollabError> {
        let log = self.logs.entry(doc_id.to_string()).or_default();
        if log.iter().any(|c| c.id == change.id) {
            tracing::debug!(doc = doc_id, change = %change.id, "skipping redelivered change");
            return Ok(());
        }
        log.push(change);
        Ok(())
    }

    fn changes(&self, doc_id: &str) -> Result<Vec<Change>, CollabError> {
        self.logs
            .get(doc_id)
            .cloned()
            .ok_or_else(|| CollabError::UnknownDocument(doc_id.to_string()))
    }
}

/// Snapshots serialized through JSON, standing in for a blob store.
#[derive(Default)]
pub struct MemorySnapshotStore {
    blobs: HashMap<String, String>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&mut self, doc_id: &str, snapshot: DocumentSnapshot) -> Result<(), CollabError> {
        let blob = serde_json::to_string(&snapshot)?;
        self.blobs.insert(doc_id.to_string(), blob);
        Ok(())
    }

    fn load(&self, doc_id: &str) -> Result<Option<DocumentSnapshot>, CollabError> {
        match self.blobs.get(doc_id) {
            Some(blob) => Ok(Some(serde_json::from_str(blob)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_editor::ChangeState;

    fn change(id: &str) -> Change {
        Change {
            id: id.to_string(),
            ops: Vec::new(),
            before: ChangeState::default(),
            after: ChangeState::default(),
        }
    }

    #[test]
    fn append_is_idempotent_per_change_id() {
        let mut store = MemoryChangeStore::new();
        store.append("d1", change("c1")).unwrap();
        store.append("d1", change("c1")).unwrap();
        store.append("d1", change("c2")).unwrap();
        assert_eq!(store.len("d1").unwrap(), 2);
    }

    #[test]
    fn changes_since_skips_the_prefix() {
        let mut store = MemoryChangeStore::new();
        for id in ["c1", "c2", "c3"] {
            store.append("d1", change(id)).unwrap();
        }
        let tail = store.changes_since("d1", 2).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].id, "c3");
        assert!(store.changes_since("d1", 9).unwrap().is_empty());
    }

    #[test]
    fn unknown_documents_error() {
        let store = MemoryChangeStore::new();
        assert!(matches!(
            store.changes("nope"),
            Err(CollabError::UnknownDocument(_))
        ));
    }

    #[test]
    fn snapshots_round_trip_through_the_blob_store() {
        let mut store = MemorySnapshotStore::new();
        assert!(store.load("d1").unwrap().is_none());
        let snapshot = DocumentSnapshot {
            nodes: Vec::new(),
            change_count: 4,
        };
        store.save("d1", snapshot.clone()).unwrap();
        assert_eq!(store.load("d1").unwrap(), Some(snapshot));
    }
}
