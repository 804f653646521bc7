//! Core domain logic for QuickNote.
//! This crate is the single source of truth for note and selection invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::note::{Note, NoteId, NoteValidationError, UNTITLED_LABEL};
pub use repo::kv_repo::{
    KeyValueStore, MemoryKeyValueStore, RepoError, RepoResult, SqliteKeyValueStore,
    DEFAULT_QUOTA_BYTES,
};
pub use repo::snapshot_repo::{
    decode_snapshot, encode_snapshot, KvSnapshotRepository, NoteSnapshotRepository,
    SnapshotReadError, NOTES_STORAGE_KEY,
};
pub use service::clock::{Clock, ManualClock, SystemClock};
pub use service::id_gen::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use service::note_store::{NoteStore, NoteStoreError};
pub use view::editor::EditorView;
pub use view::sidebar::{SidebarItem, SidebarView};
pub use view::{dispatch, Intent};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
