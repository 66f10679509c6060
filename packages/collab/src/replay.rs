//! # Document reconstruction
//!
//! Rebuild a live [`DocumentHandle`] from storage: start from the latest
//! snapshot (or an empty document), then replay the stored changes the
//! snapshot does not cover. The replayed handle is byte-equivalent to the
//! one the changes were originally committed on, because changes carry
//! everything their ops need.

use crate::{ChangeStore, CollabError, DocumentSnapshot, SnapshotStore};
use quire_editor::DocumentHandle;
use quire_model::{Document, Schema};

/// Rebuild a document handle from a snapshot store and a change store.
///
/// The schema and origin are host knowledge, not stored: a snapshot is
/// only the node table plus how many changes it folds in.
pub fn reconstruct(
    schema: Schema,
    origin: &str,
    doc_id: &str,
    snapshots: &dyn SnapshotStore,
    changes: &dyn ChangeStore,
) -> Result<DocumentHandle, CollabError> {
    let snapshot = snapshots.load(doc_id)?;
    let covered = snapshot.as_ref().map(|s| s.change_count).unwrap_or(0);

    let mut document = Document::new(schema, origin);
    if let Some(snapshot) = snapshot {
        for node in snapshot.nodes {
            document.insert(node)?;
        }
    }

    let handle = DocumentHandle::new(document);
    let tail = changes.changes_since(doc_id, covered)?;
    tracing::debug!(
        doc = doc_id,
        from_snapshot = covered,
        replaying = tail.len(),
        "reconstructing document"
    );
    for change in tail {
        handle.apply_change(change)?;
    }
    Ok(handle)
}

/// Snapshot the current state of a handle, folding in its whole log.
pub fn snapshot_of(handle: &DocumentHandle) -> DocumentSnapshot {
    let mut nodes = handle.with_document(|doc| doc.nodes().cloned().collect::<Vec<_>>());
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    DocumentSnapshot {
        nodes,
        change_count: handle.log_len(),
    }
}
