//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable key-value slot contract (`KeyValueStore`).
//! - Define the note snapshot persistence port (`NoteSnapshotRepository`)
//!   and implement it on top of any key-value slot.
//!
//! # Invariants
//! - Snapshots are written whole; there is no partial update path.
//! - Unreadable snapshots load as an empty collection, never as an error.
//! - Write failures are always reported to the caller.

pub mod kv_repo;
pub mod snapshot_repo;
