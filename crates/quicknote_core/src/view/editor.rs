//! Editor view model: title/content fields of the selected note.

use crate::model::note::NoteId;
use crate::repo::snapshot_repo::NoteSnapshotRepository;
use crate::service::note_store::NoteStore;

pub const TITLE_PLACEHOLDER: &str = "Note title";
pub const CONTENT_PLACEHOLDER: &str = "Write your note in Markdown...";
pub const EMPTY_STATE_MESSAGE: &str = "No notes yet. Create one!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorView {
    Editing {
        note_id: NoteId,
        title: String,
        content: String,
        title_placeholder: &'static str,
        content_placeholder: &'static str,
    },
    /// Nothing selected.
    Empty { message: &'static str },
}

impl EditorView {
    pub fn from_store<R: NoteSnapshotRepository>(store: &NoteStore<R>) -> Self {
        match store.selected_note() {
            Some(note) => Self::Editing {
                note_id: note.id.clone(),
                title: note.title.clone(),
                content: note.content.clone(),
                title_placeholder: TITLE_PLACEHOLDER,
                content_placeholder: CONTENT_PLACEHOLDER,
            },
            None => Self::Empty {
                message: EMPTY_STATE_MESSAGE,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}
