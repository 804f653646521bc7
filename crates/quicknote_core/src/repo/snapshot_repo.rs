//! Note snapshot persistence port.
//!
//! # Responsibility
//! - Load and save the full note collection as one JSON blob.
//! - Recover from missing or unreadable blobs by loading an empty collection.
//!
//! # Invariants
//! - `save` overwrites the whole snapshot under one key.
//! - A decoded snapshot has unique, valid note ids in stored order.
//! - `load` never fails; every recovery is logged.

use crate::model::note::{Note, NoteId};
use crate::repo::kv_repo::{KeyValueStore, RepoError, RepoResult};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Well-known key holding the note snapshot.
pub const NOTES_STORAGE_KEY: &str = "notes";

/// Reasons a stored snapshot could not be read.
///
/// Never surfaced by `NoteSnapshotRepository::load`; exposed for diagnostics
/// through `KvSnapshotRepository::try_load`.
#[derive(Debug)]
pub enum SnapshotReadError {
    Storage(RepoError),
    Decode(serde_json::Error),
    DuplicateId(NoteId),
}

impl Display for SnapshotReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "failed to read snapshot: {err}"),
            Self::Decode(err) => write!(f, "corrupt snapshot: {err}"),
            Self::DuplicateId(id) => write!(f, "corrupt snapshot: duplicate note id `{id}`"),
        }
    }
}

impl Error for SnapshotReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

/// Persistence port used by the note store.
pub trait NoteSnapshotRepository {
    /// Loads the stored collection; missing or corrupt data yields `[]`.
    fn load(&self) -> Vec<Note>;
    /// Overwrites the stored collection with `notes`.
    fn save(&mut self, notes: &[Note]) -> RepoResult<()>;
}

/// Snapshot repository over any key-value slot.
pub struct KvSnapshotRepository<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KvSnapshotRepository<S> {
    /// Uses the default `NOTES_STORAGE_KEY` slot.
    pub fn new(store: S) -> Self {
        Self::with_key(store, NOTES_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Loads the snapshot, reporting why it could not be read.
    ///
    /// A key that was never written is an empty collection, not an error.
    pub fn try_load(&self) -> Result<Vec<Note>, SnapshotReadError> {
        match self
            .store
            .get(self.key.as_str())
            .map_err(SnapshotReadError::Storage)?
        {
            Some(raw) => decode_snapshot(raw.as_str()),
            None => Ok(Vec::new()),
        }
    }
}

impl<S: KeyValueStore> NoteSnapshotRepository for KvSnapshotRepository<S> {
    fn load(&self) -> Vec<Note> {
        match self.try_load() {
            Ok(notes) => {
                info!(
                    "event=snapshot_load module=repo status=ok key={} count={}",
                    self.key,
                    notes.len()
                );
                notes
            }
            Err(SnapshotReadError::Storage(err)) => {
                error!(
                    "event=snapshot_load module=repo status=recovered key={} error_code=storage_read_failed error={}",
                    self.key, err
                );
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=snapshot_load module=repo status=recovered key={} error_code=snapshot_corrupt error={}",
                    self.key, err
                );
                Vec::new()
            }
        }
    }

    fn save(&mut self, notes: &[Note]) -> RepoResult<()> {
        let encoded = encode_snapshot(notes)?;
        match self.store.set(self.key.as_str(), encoded.as_str()) {
            Ok(()) => {
                debug!(
                    "event=snapshot_save module=repo status=ok key={} count={} bytes={}",
                    self.key,
                    notes.len(),
                    encoded.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=repo status=error key={} count={} bytes={} error={}",
                    self.key,
                    notes.len(),
                    encoded.len(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Serializes notes into the snapshot wire format.
pub fn encode_snapshot(notes: &[Note]) -> RepoResult<String> {
    serde_json::to_string(notes).map_err(RepoError::Encode)
}

/// Parses a snapshot blob, rejecting invalid records and duplicate ids.
pub fn decode_snapshot(raw: &str) -> Result<Vec<Note>, SnapshotReadError> {
    let notes: Vec<Note> = serde_json::from_str(raw).map_err(SnapshotReadError::Decode)?;
    let mut seen = HashSet::with_capacity(notes.len());
    for note in &notes {
        if !seen.insert(&note.id) {
            return Err(SnapshotReadError::DuplicateId(note.id.clone()));
        }
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::{decode_snapshot, SnapshotReadError};

    #[test]
    fn decode_accepts_browser_written_snapshot() {
        let raw = r##"[{"id":"1700000000000","title":"","content":"# hi","createdAt":"2023-11-14T22:13:20.000Z","updatedAt":"2023-11-14T22:13:21.500Z"}]"##;
        let notes = decode_snapshot(raw).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id.as_str(), "1700000000000");
        assert_eq!(notes[0].content, "# hi");
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let record = r#"{"id":"a","title":"","content":"","createdAt":"2023-11-14T22:13:20.000Z","updatedAt":"2023-11-14T22:13:20.000Z"}"#;
        let raw = format!("[{record},{record}]");
        let err = decode_snapshot(raw.as_str()).unwrap_err();
        assert!(matches!(err, SnapshotReadError::DuplicateId(id) if id.as_str() == "a"));
    }

    #[test]
    fn decode_rejects_non_array_and_invalid_records() {
        assert!(matches!(
            decode_snapshot(r#"{"notes":[]}"#),
            Err(SnapshotReadError::Decode(_))
        ));

        let reversed = r#"[{"id":"a","title":"","content":"","createdAt":"2023-11-14T22:13:20.000Z","updatedAt":"2023-11-14T22:13:19.000Z"}]"#;
        let err = decode_snapshot(reversed).unwrap_err();
        assert!(err.to_string().contains("must be >= createdAt"), "{err}");
    }
}
