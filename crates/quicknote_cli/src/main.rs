//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `quicknote_core` linkage.
//! - Print the sidebar and editor of a notes database as plain text.
//!
//! Usage: `quicknote [DB_PATH]`; falls back to `QUICKNOTE_DB_PATH`, then to
//! the temp-dir database used by the app shell.

use quicknote_core::view::sidebar::DELETE_LABEL;
use quicknote_core::{
    EditorView, KvSnapshotRepository, NoteStore, SidebarView, SqliteKeyValueStore,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("quicknote_core ping={}", quicknote_core::ping());
    println!("quicknote_core version={}", quicknote_core::core_version());

    let path = db_path();
    let kv = match SqliteKeyValueStore::open(&path) {
        Ok(kv) => kv,
        Err(err) => {
            eprintln!("failed to open `{}`: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let store = NoteStore::open(KvSnapshotRepository::new(kv));

    let sidebar = SidebarView::from_store(&store);
    println!();
    println!("{} ({})", sidebar.heading, path.display());
    println!("{}", sidebar.new_note_label);
    for item in &sidebar.items {
        let marker = if item.active { '>' } else { ' ' };
        println!(
            "{marker} {}  [{}]  {}",
            item.title, item.updated_label, DELETE_LABEL
        );
    }

    println!();
    match EditorView::from_store(&store) {
        EditorView::Editing { title, content, .. } => {
            println!("# {title}");
            println!("{content}");
        }
        EditorView::Empty { message } => println!("{message}"),
    }
    ExitCode::SUCCESS
}

fn db_path() -> PathBuf {
    resolve_db_path(std::env::args().nth(1), std::env::var("QUICKNOTE_DB_PATH").ok())
}

/// Picks the first non-blank of argument, environment, then the default.
fn resolve_db_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    [arg, env]
        .into_iter()
        .flatten()
        .map(|raw| raw.trim().to_string())
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("quicknote.sqlite3"))
}

#[cfg(test)]
mod tests {
    use super::resolve_db_path;
    use std::path::PathBuf;

    #[test]
    fn blank_env_falls_back_to_default_path() {
        let resolved = resolve_db_path(None, Some("   ".to_string()));
        assert_eq!(resolved, std::env::temp_dir().join("quicknote.sqlite3"));
    }

    #[test]
    fn argument_wins_over_env_and_is_trimmed() {
        let resolved = resolve_db_path(
            Some(" /data/notes.db ".to_string()),
            Some("/env/notes.db".to_string()),
        );
        assert_eq!(resolved, PathBuf::from("/data/notes.db"));

        let from_env = resolve_db_path(Some(String::new()), Some("/env/notes.db".to_string()));
        assert_eq!(from_env, PathBuf::from("/env/notes.db"));
    }
}
