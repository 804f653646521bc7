//! View projections and user intents.
//!
//! # Responsibility
//! - Project note store state into sidebar/editor view models.
//! - Translate user intents into note store operations.
//!
//! # Invariants
//! - Views are pure functions of store state; they never mutate it.
//! - `dispatch` is the only path from an intent to the store.

pub mod editor;
pub mod sidebar;

use crate::model::note::NoteId;
use crate::repo::snapshot_repo::NoteSnapshotRepository;
use crate::service::note_store::{NoteStore, NoteStoreError};

/// User intent raised by the sidebar or editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    NewNote,
    SelectNote(NoteId),
    DeleteNote(NoteId),
    /// Applies to the selected note.
    TitleChanged(String),
    /// Applies to the selected note.
    ContentChanged(String),
}

/// Applies `intent` to `store`.
///
/// Unknown ids and edits without a selection are no-ops.
pub fn dispatch<R: NoteSnapshotRepository>(
    store: &mut NoteStore<R>,
    intent: Intent,
) -> Result<(), NoteStoreError> {
    match intent {
        Intent::NewNote => {
            store.create_note()?;
        }
        Intent::SelectNote(id) => {
            store.select_note(&id);
        }
        Intent::DeleteNote(id) => {
            store.delete_note(&id)?;
        }
        Intent::TitleChanged(title) => {
            if let Some(id) = store.selected_id().cloned() {
                store.update_title(&id, title)?;
            }
        }
        Intent::ContentChanged(content) => {
            if let Some(id) = store.selected_id().cloned() {
                store.update_content(&id, content)?;
            }
        }
    }
    Ok(())
}
