//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the sidebar/editor intents and view state to Dart via FRB.
//! - Own the single process-wide note store for the UI session.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All store access is serialized through one mutex.
//! - The store is opened lazily; a failed open is retried on the next call,
//!   a successful one is kept for the process lifetime.

use log::error;
use quicknote_core::{
    core_version as core_version_inner, dispatch, init_logging as init_logging_inner,
    ping as ping_inner, EditorView, Intent, KvSnapshotRepository, NoteId, NoteStore,
    SidebarView, SqliteKeyValueStore,
};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

const NOTES_DB_FILE_NAME: &str = "quicknote.sqlite3";
const NOTES_DB_PATH_ENV: &str = "QUICKNOTE_DB_PATH";

type SessionStore = NoteStore<KvSnapshotRepository<SqliteKeyValueStore>>;

static NOTES_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION_STORE: Mutex<Option<SessionStore>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One sidebar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub note_id: String,
    /// Display title (`Untitled` when empty).
    pub title: String,
    pub updated_label: String,
    pub active: bool,
}

/// Full sidebar + editor state for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesViewResponse {
    pub ok: bool,
    pub items: Vec<NoteListItem>,
    pub selected_id: Option<String>,
    pub editor_title: Option<String>,
    pub editor_content: Option<String>,
    pub title_placeholder: Option<String>,
    pub content_placeholder: Option<String>,
    /// Empty-state text when nothing is selected, or the error message.
    pub message: String,
}

/// Result envelope for intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// `false` when the change may not survive a restart.
    pub ok: bool,
    /// Selected note after the intent.
    pub selected_id: Option<String>,
    pub message: String,
}

/// Returns the current sidebar and editor state.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_view() -> NotesViewResponse {
    match with_store(|store| {
        let sidebar = SidebarView::from_store(store);
        let editor = EditorView::from_store(store);
        (sidebar, editor, store.selected_id().map(NoteId::to_string))
    }) {
        Ok((sidebar, editor, selected_id)) => {
            let items = sidebar
                .items
                .into_iter()
                .map(|item| NoteListItem {
                    note_id: item.id.to_string(),
                    title: item.title,
                    updated_label: item.updated_label,
                    active: item.active,
                })
                .collect();
            let mut response = NotesViewResponse {
                ok: true,
                items,
                selected_id,
                editor_title: None,
                editor_content: None,
                title_placeholder: None,
                content_placeholder: None,
                message: String::new(),
            };
            match editor {
                EditorView::Editing {
                    title,
                    content,
                    title_placeholder,
                    content_placeholder,
                    ..
                } => {
                    response.editor_title = Some(title);
                    response.editor_content = Some(content);
                    response.title_placeholder = Some(title_placeholder.to_string());
                    response.content_placeholder = Some(content_placeholder.to_string());
                }
                EditorView::Empty { message } => response.message = message.to_string(),
            }
            response
        }
        Err(message) => NotesViewResponse {
            ok: false,
            items: Vec::new(),
            selected_id: None,
            editor_title: None,
            editor_content: None,
            title_placeholder: None,
            content_placeholder: None,
            message,
        },
    }
}

/// "+ New Note" button.
#[flutter_rust_bridge::frb(sync)]
pub fn note_new() -> NoteActionResponse {
    run_intent("note_new", Intent::NewNote)
}

/// Sidebar row click.
#[flutter_rust_bridge::frb(sync)]
pub fn note_select(note_id: String) -> NoteActionResponse {
    match NoteId::new(note_id) {
        Ok(id) => run_intent("note_select", Intent::SelectNote(id)),
        Err(err) => NoteActionResponse::failure(format!("note_select failed: {err}"), None),
    }
}

/// Sidebar delete affordance.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(note_id: String) -> NoteActionResponse {
    match NoteId::new(note_id) {
        Ok(id) => run_intent("note_delete", Intent::DeleteNote(id)),
        Err(err) => NoteActionResponse::failure(format!("note_delete failed: {err}"), None),
    }
}

/// Editor title field change; applies to the selected note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_title_changed(title: String) -> NoteActionResponse {
    run_intent("note_title_changed", Intent::TitleChanged(title))
}

/// Editor content field change; applies to the selected note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_content_changed(content: String) -> NoteActionResponse {
    run_intent("note_content_changed", Intent::ContentChanged(content))
}

impl NoteActionResponse {
    fn failure(message: impl Into<String>, selected_id: Option<String>) -> Self {
        Self {
            ok: false,
            selected_id,
            message: message.into(),
        }
    }
}

fn run_intent(name: &'static str, intent: Intent) -> NoteActionResponse {
    let outcome = with_store(|store| {
        let result = dispatch(store, intent);
        (result, store.selected_id().map(NoteId::to_string))
    });

    match outcome {
        Ok((Ok(()), selected_id)) => NoteActionResponse {
            ok: true,
            selected_id,
            message: String::new(),
        },
        Ok((Err(err), selected_id)) => {
            NoteActionResponse::failure(format!("{name} failed: {err}"), selected_id)
        }
        Err(message) => NoteActionResponse::failure(format!("{name} failed: {message}"), None),
    }
}

fn resolve_notes_db_path() -> PathBuf {
    NOTES_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(NOTES_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(NOTES_DB_FILE_NAME)
        })
        .clone()
}

fn with_store<T>(f: impl FnOnce(&mut SessionStore) -> T) -> Result<T, String> {
    let mut slot = SESSION_STORE
        .lock()
        .map_err(|_| "note store lock poisoned".to_string())?;
    let store = ensure_open(&mut slot, &resolve_notes_db_path())?;
    Ok(f(store))
}

/// Returns the cached store, opening it first when absent. Failed opens are
/// not cached.
fn ensure_open<'a>(
    slot: &'a mut Option<SessionStore>,
    path: &Path,
) -> Result<&'a mut SessionStore, String> {
    if slot.is_none() {
        let kv = SqliteKeyValueStore::open(path).map_err(|err| {
            error!(
                "event=session_open module=ffi status=error path={} error={}",
                path.display(),
                err
            );
            format!("notes DB open failed: {err}")
        })?;
        *slot = Some(NoteStore::open(KvSnapshotRepository::new(kv)));
    }

    slot.as_mut().ok_or_else(|| "note store unavailable".to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, ensure_open, init_logging, note_content_changed, note_delete, note_new,
        note_select, note_title_changed, notes_view, ping, NOTES_DB_PATH,
    };
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_invalid_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn select_and_delete_reject_blank_ids() {
        assert!(!note_select("  ".to_string()).ok);
        assert!(!note_delete(String::new()).ok);
    }

    #[test]
    fn failed_open_is_retried_on_next_call() {
        let dir = unique_path("ffi-retry");
        let db_path = dir.join("notes.sqlite3");
        let mut slot = None;

        let err = ensure_open(&mut slot, &db_path).err().expect("missing dir must fail");
        assert!(err.contains("notes DB open failed"), "{err}");
        assert!(slot.is_none());

        std::fs::create_dir_all(&dir).expect("create db dir");
        let store = ensure_open(&mut slot, &db_path).expect("second open should succeed");
        assert!(store.is_empty());
        assert!(slot.is_some());
    }

    fn unique_path(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        std::env::temp_dir().join(format!("quicknote-{prefix}-{}-{nanos}", std::process::id()))
    }

    fn use_isolated_db() {
        let _ = NOTES_DB_PATH.set(unique_path("ffi-session").with_extension("sqlite3"));
    }

    // Only this test touches the session store.
    #[test]
    fn note_flow_create_edit_select_delete() {
        use_isolated_db();
        let empty = notes_view();
        assert!(empty.ok, "{}", empty.message);
        assert!(empty.items.is_empty());
        assert_eq!(empty.message, "No notes yet. Create one!");

        let created = note_new();
        assert!(created.ok, "{}", created.message);
        let created_id = created.selected_id.expect("new note should be selected");

        let titled = note_title_changed("Groceries".to_string());
        assert!(titled.ok, "{}", titled.message);
        let written = note_content_changed("- milk".to_string());
        assert!(written.ok, "{}", written.message);

        let view = notes_view();
        assert!(view.ok, "{}", view.message);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].note_id, created_id);
        assert_eq!(view.items[0].title, "Groceries");
        assert!(view.items[0].active);
        assert_eq!(view.editor_content.as_deref(), Some("- milk"));
        assert_eq!(view.title_placeholder.as_deref(), Some("Note title"));
        assert_eq!(
            view.content_placeholder.as_deref(),
            Some("Write your note in Markdown...")
        );

        let second = note_new();
        let second_id = second.selected_id.expect("second note should be selected");
        let view = notes_view();
        assert_eq!(view.items[0].note_id, second_id);
        assert_eq!(view.items[0].title, "Untitled");

        let reselected = note_select(created_id.clone());
        assert_eq!(reselected.selected_id.as_deref(), Some(created_id.as_str()));

        let deleted_other = note_delete(second_id.clone());
        assert!(deleted_other.ok, "{}", deleted_other.message);
        assert_eq!(
            deleted_other.selected_id.as_deref(),
            Some(created_id.as_str())
        );

        let deleted_selected = note_delete(created_id.clone());
        assert!(deleted_selected.ok, "{}", deleted_selected.message);
        assert_eq!(deleted_selected.selected_id, None);

        let missing = note_select(created_id);
        assert!(missing.ok);
        assert_eq!(missing.selected_id, None);
        assert!(notes_view().items.is_empty());
    }
}
