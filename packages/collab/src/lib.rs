//! # Quire Collab
//!
//! The collaboration boundary: Change records committed by the editor are
//! the unit of exchange. This crate defines the storage traits a host
//! plugs persistence into ([`ChangeStore`], [`SnapshotStore`]), in-memory
//! reference implementations, and [`reconstruct`] for rebuilding a live
//! document by replaying stored changes over an optional snapshot.
//!
//! Transport is out of scope; hosts move serialized Changes however they
//! like and feed them to `DocumentHandle::apply_change`, which skips
//! already-known change ids so redelivery is safe.

mod error;
mod replay;
mod store;

pub use error::CollabError;
pub use replay::{reconstruct, snapshot_of};
pub use store::{
    ChangeStore, DocumentSnapshot, MemoryChangeStore, MemorySnapshotStore, SnapshotStore,
};
