//! # Sessions over a shared document
//!
//! One [`DocumentHandle`] owns the authoritative document, its annotation
//! index, and the append-only change log. Each [`Session`] keeps a stage
//! (a private copy of the document) for in-flight transactions and syncs
//! it by replaying log entries it has not seen. Undo and redo are log
//! entries like any other edit: an undo commits the inverse of a prior
//! change, so every stage converges by pure replay and never needs a
//! snapshot.

use crate::{Change, ChangeState, EditorError, Selection, Transaction};
use quire_annotations::AnnotationIndex;
use quire_model::Document;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handles number themselves process-wide. Session ids carry the handle
/// instance, so change ids minted on independent handles over copies of
/// one document never collide and `apply_change` dedup stays sound.
static HANDLE_INSTANCES: AtomicU64 = AtomicU64::new(0);

/// Callback surface for committed changes.
pub trait DocumentObserver {
    fn document_changed(&mut self, change: &Change, doc: &Document);
}

struct Shared {
    document: Document,
    index: AnnotationIndex,
    log: Vec<Change>,
}

/// Shared handle to one document; cloning shares state.
#[derive(Clone)]
pub struct DocumentHandle {
    shared: Rc<RefCell<Shared>>,
    observers: Rc<RefCell<Vec<(u64, Box<dyn DocumentObserver>)>>>,
    next_observer: Rc<Cell<u64>>,
    next_session: Rc<Cell<u64>>,
    instance: u64,
}

impl DocumentHandle {
    pub fn new(document: Document) -> Self {
        let index = AnnotationIndex::for_document(&document);
        Self {
            shared: Rc::new(RefCell::new(Shared {
                document,
                index,
                log: Vec::new(),
            })),
            observers: Rc::new(RefCell::new(Vec::new())),
            next_observer: Rc::new(Cell::new(0)),
            next_session: Rc::new(Cell::new(0)),
            instance: HANDLE_INSTANCES.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }

    /// Open a new editing session with its own stage and history.
    pub fn create_session(&self) -> Session {
        let n = self.next_session.get() + 1;
        self.next_session.set(n);
        let shared = self.shared.borrow();
        Session {
            id: format!("session-{}-{}", self.instance, n),
            handle: self.clone(),
            stage: shared.document.clone(),
            stage_index: shared.index.clone(),
            synced: shared.log.len(),
            selection: Selection::null(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            change_seq: 0,
        }
    }

    pub fn subscribe(&self, observer: Box<dyn DocumentObserver>) -> u64 {
        let token = self.next_observer.get() + 1;
        self.next_observer.set(token);
        self.observers.borrow_mut().push((token, observer));
        token
    }

    pub fn unsubscribe(&self, token: u64) {
        self.observers.borrow_mut().retain(|(t, _)| *t != token);
    }

    /// Read access to the authoritative document.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.shared.borrow().document)
    }

    pub fn version(&self) -> u64 {
        self.shared.borrow().document.version()
    }

    pub fn log_len(&self) -> usize {
        self.shared.borrow().log.len()
    }

    pub fn change(&self, id: &str) -> Option<Change> {
        self.shared.borrow().log.iter().find(|c| c.id == id).cloned()
    }

    /// Commit a change produced elsewhere (a collaboration peer). Known
    /// change ids are skipped, so redelivery is harmless.
    pub fn apply_change(&self, change: Change) -> Result<(), EditorError> {
        if self.shared.borrow().log.iter().any(|c| c.id == change.id) {
            return Ok(());
        }
        self.commit(change)
    }

    /// Apply a change's ops to the authoritative document and append it to
    /// the log. A failing op rolls back the applied prefix, leaving the
    /// document untouched.
    pub(crate) fn commit(&self, change: Change) -> Result<(), EditorError> {
        {
            let mut shared = self.shared.borrow_mut();
            let state = &mut *shared;
            let mut applied = 0usize;
            for op in &change.ops {
                match op.apply(&mut state.document) {
                    Ok(()) => {
                        state.index.on_op(&state.document, op);
                        applied += 1;
                    }
                    Err(err) => {
                        for done in change.ops[..applied].iter().rev() {
                            let inv = done.inverted();
                            match inv.apply(&mut state.document) {
                                Ok(()) => state.index.on_op(&state.document, &inv),
                                Err(rollback_err) => tracing::warn!(
                                    change = %change.id,
                                    error = %rollback_err,
                                    "rollback op failed"
                                ),
                            }
                        }
                        return Err(err.into());
                    }
                }
            }
            tracing::debug!(change = %change.id, ops = change.ops.len(), "committed change");
            state.log.push(change.clone());
        }

        // Notify with the borrow released, so an observer may read back
        // through the handle.
        let mut observers = self.observers.borrow_mut();
        let shared = self.shared.borrow();
        for (_, observer) in observers.iter_mut() {
            observer.document_changed(&change, &shared.document);
        }
        Ok(())
    }
}

/// One editing session: a stage document, a selection, and a private
/// undo/redo history over the shared log.
pub struct Session {
    id: String,
    handle: DocumentHandle,
    stage: Document,
    stage_index: AnnotationIndex,
    synced: usize,
    selection: Selection,
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
    change_seq: u64,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn handle(&self) -> &DocumentHandle {
        &self.handle
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Read access to this session's stage, synced to the log first.
    pub fn with_stage<R>(&mut self, f: impl FnOnce(&Document) -> R) -> R {
        self.sync_stage();
        f(&self.stage)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Run `f` against a transaction on the stage and commit the recorded
    /// ops as one atomic change. Returns `None` when the transaction
    /// recorded no ops. On error the stage is rebuilt from the
    /// authoritative document and nothing is committed.
    pub fn transaction<F>(&mut self, f: F) -> Result<Option<Change>, EditorError>
    where
        F: FnOnce(&mut Transaction) -> Result<(), EditorError>,
    {
        self.sync_stage();
        let before = ChangeState::with_selection(self.selection.clone());

        let mut tx = Transaction::new(
            &mut self.stage,
            &mut self.stage_index,
            self.selection.clone(),
        );
        let outcome = f(&mut tx);
        let (ops, selection, info) = tx.into_parts();

        match outcome {
            Ok(()) => {
                if ops.is_empty() {
                    self.selection = selection;
                    return Ok(None);
                }
                let change = Change {
                    id: self.next_change_id(),
                    ops,
                    before,
                    after: ChangeState {
                        selection: selection.clone(),
                        info,
                    },
                };
                match self.handle.commit(change.clone()) {
                    Ok(()) => {
                        self.synced = self.handle.log_len();
                        self.selection = selection;
                        self.undo_stack.push(change.id.clone());
                        self.redo_stack.clear();
                        Ok(Some(change))
                    }
                    Err(err) => {
                        self.rebuild_stage();
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.rebuild_stage();
                Err(err)
            }
        }
    }

    /// Commit the inverse of this session's most recent change. Returns
    /// `false` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.sync_stage();
        let Some(change_id) = self.undo_stack.pop() else {
            return Ok(false);
        };
        let Some(original) = self.handle.change(&change_id) else {
            return Err(EditorError::UnknownChange(change_id));
        };

        let inverse = original.inverted(self.next_change_id());
        let restored = inverse.after.selection.clone();
        tracing::debug!(session = %self.id, undoing = %change_id, as_change = %inverse.id, "undo");
        match self.handle.commit(inverse) {
            Ok(()) => {
                self.sync_stage();
                self.selection = restored;
                self.redo_stack.push(change_id);
                Ok(true)
            }
            Err(err) => {
                self.undo_stack.push(change_id);
                self.rebuild_stage();
                Err(err)
            }
        }
    }

    /// Replay this session's most recently undone change. Returns `false`
    /// when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.sync_stage();
        let Some(change_id) = self.redo_stack.pop() else {
            return Ok(false);
        };
        let Some(original) = self.handle.change(&change_id) else {
            return Err(EditorError::UnknownChange(change_id));
        };

        let replay = original.replayed(self.next_change_id());
        let restored = replay.after.selection.clone();
        tracing::debug!(session = %self.id, redoing = %change_id, as_change = %replay.id, "redo");
        match self.handle.commit(replay) {
            Ok(()) => {
                self.sync_stage();
                self.selection = restored;
                self.undo_stack.push(change_id);
                Ok(true)
            }
            Err(err) => {
                self.redo_stack.push(change_id);
                self.rebuild_stage();
                Err(err)
            }
        }
    }

    fn next_change_id(&mut self) -> String {
        self.change_seq += 1;
        format!("{}-{}", self.id, self.change_seq)
    }

    /// Replay committed changes this stage has not seen.
    fn sync_stage(&mut self) {
        let (clean, len) = {
            let shared = self.handle.shared.borrow();
            let mut clean = true;
            'replay: for change in &shared.log[self.synced..] {
                for op in &change.ops {
                    if op.apply(&mut self.stage).is_err() {
                        clean = false;
                        break 'replay;
                    }
                    self.stage_index.on_op(&self.stage, op);
                }
            }
            (clean, shared.log.len())
        };
        if clean {
            self.synced = len;
        } else {
            tracing::warn!(session = %self.id, "stage replay failed, rebuilding from document");
            self.rebuild_stage();
        }
    }

    /// Discard the stage and start over from the authoritative document.
    fn rebuild_stage(&mut self) {
        let shared = self.handle.shared.borrow();
        self.stage = shared.document.clone();
        self.stage_index = AnnotationIndex::for_document(&self.stage);
        self.synced = shared.log.len();
    }
}
