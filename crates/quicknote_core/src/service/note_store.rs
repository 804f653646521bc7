//! Note store: the authoritative note collection and selection state.
//!
//! # Responsibility
//! - Load the collection once on open and own it for the session.
//! - Apply create/select/update/delete and mirror every mutation to the
//!   snapshot repository.
//!
//! # Invariants
//! - Note ids are unique within `notes`.
//! - `notes` is in creation order, newest first; edits never reorder.
//! - `selected_id`, when set, names a note present in `notes`.
//! - Every mutation is followed by one full snapshot save.
//! - A failed save keeps the in-memory change and is returned to the caller.

use crate::model::note::{Note, NoteId};
use crate::repo::kv_repo::RepoError;
use crate::repo::snapshot_repo::NoteSnapshotRepository;
use crate::service::clock::{Clock, SystemClock};
use crate::service::id_gen::{IdGenerator, UuidIdGenerator};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MAX_ID_ATTEMPTS: usize = 16;

/// Store-level error for mutating operations.
#[derive(Debug)]
pub enum NoteStoreError {
    /// The mutation was applied in memory but could not be persisted.
    Persist {
        operation: &'static str,
        source: RepoError,
    },
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persist { operation, source } => write!(
                f,
                "{operation} was applied but could not be saved; changes may not survive a restart: {source}"
            ),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persist { source, .. } => Some(source),
        }
    }
}

/// Note collection with selection, backed by a snapshot repository.
pub struct NoteStore<R: NoteSnapshotRepository> {
    repo: R,
    notes: Vec<Note>,
    selected_id: Option<NoteId>,
    clock: Box<dyn Clock + Send>,
    ids: Box<dyn IdGenerator + Send>,
}

impl<R: NoteSnapshotRepository> NoteStore<R> {
    /// Loads the persisted collection and selects its first note.
    ///
    /// Unreadable snapshots open as an empty store.
    pub fn open(repo: R) -> Self {
        let notes = repo.load();
        let selected_id = notes.first().map(|note| note.id.clone());
        info!(
            "event=store_open module=service status=ok count={} selected={}",
            notes.len(),
            selected_id.is_some()
        );

        Self {
            repo,
            notes,
            selected_id,
            clock: Box::new(SystemClock),
            ids: Box::new(UuidIdGenerator),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + Send + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// All notes, newest-created first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn selected_id(&self) -> Option<&NoteId> {
        self.selected_id.as_ref()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected_id.as_ref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Prepends a blank note, selects it and saves.
    ///
    /// # Errors
    /// - `NoteStoreError::Persist` when the save fails; the note still exists
    ///   in memory and is selected.
    pub fn create_note(&mut self) -> Result<NoteId, NoteStoreError> {
        let id = self.fresh_id();
        let note = Note::new(id.clone(), self.clock.now());
        self.notes.insert(0, note);
        self.selected_id = Some(id.clone());
        info!(
            "event=note_create module=service status=ok note_id={} count={}",
            id,
            self.notes.len()
        );

        self.persist("create_note")?;
        Ok(id)
    }

    /// Selects `id` when present. Returns `None` and leaves selection
    /// unchanged otherwise.
    pub fn select_note(&mut self, id: &NoteId) -> Option<&Note> {
        let Some(index) = self.position(id) else {
            debug!(
                "event=note_select module=service status=not_found note_id={}",
                id
            );
            return None;
        };

        self.selected_id = Some(id.clone());
        Some(&self.notes[index])
    }

    /// Removes `id` and saves. Returns the removed note, or `None` without
    /// saving when `id` is unknown.
    ///
    /// Deleting the selected note selects the new first note, if any.
    pub fn delete_note(&mut self, id: &NoteId) -> Result<Option<Note>, NoteStoreError> {
        let Some(index) = self.position(id) else {
            debug!(
                "event=note_delete module=service status=not_found note_id={}",
                id
            );
            return Ok(None);
        };

        let removed = self.notes.remove(index);
        if self.selected_id.as_ref() == Some(id) {
            self.selected_id = self.notes.first().map(|note| note.id.clone());
        }
        info!(
            "event=note_delete module=service status=ok note_id={} count={}",
            id,
            self.notes.len()
        );

        self.persist("delete_note")?;
        Ok(Some(removed))
    }

    /// Replaces the title of `id`, refreshes `updated_at` and saves.
    pub fn update_title(
        &mut self,
        id: &NoteId,
        title: impl Into<String>,
    ) -> Result<Option<&Note>, NoteStoreError> {
        let title = title.into();
        self.edit(id, "update_title", move |note| note.title = title)
    }

    /// Replaces the content of `id`, refreshes `updated_at` and saves.
    pub fn update_content(
        &mut self,
        id: &NoteId,
        content: impl Into<String>,
    ) -> Result<Option<&Note>, NoteStoreError> {
        let content = content.into();
        self.edit(id, "update_content", move |note| note.content = content)
    }

    fn edit(
        &mut self,
        id: &NoteId,
        operation: &'static str,
        apply: impl FnOnce(&mut Note),
    ) -> Result<Option<&Note>, NoteStoreError> {
        let Some(index) = self.position(id) else {
            debug!(
                "event=note_update module=service status=not_found op={} note_id={}",
                operation, id
            );
            return Ok(None);
        };

        let now = self.clock.now();
        let note = &mut self.notes[index];
        apply(note);
        note.touch(now);
        debug!(
            "event=note_update module=service status=ok op={} note_id={}",
            operation, id
        );

        self.persist(operation)?;
        Ok(Some(&self.notes[index]))
    }

    fn persist(&mut self, operation: &'static str) -> Result<(), NoteStoreError> {
        self.repo.save(&self.notes).map_err(|source| {
            error!(
                "event=store_persist module=service status=error op={} count={} error={}",
                operation,
                self.notes.len(),
                source
            );
            NoteStoreError::Persist { operation, source }
        })
    }

    fn position(&self, id: &NoteId) -> Option<usize> {
        self.notes.iter().position(|note| &note.id == id)
    }

    fn fresh_id(&mut self) -> NoteId {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id();
            if self.position(&candidate).is_none() {
                return candidate;
            }
            warn!(
                "event=note_id_collision module=service status=retry note_id={}",
                candidate
            );
        }

        loop {
            let candidate = NoteId::from(Uuid::new_v4());
            if self.position(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
