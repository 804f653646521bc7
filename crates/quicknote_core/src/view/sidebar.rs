//! Sidebar view model: the note list with selection and delete affordances.

use crate::model::note::NoteId;
use crate::repo::snapshot_repo::NoteSnapshotRepository;
use crate::service::note_store::NoteStore;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

pub const SIDEBAR_HEADING: &str = "Notes";
pub const NEW_NOTE_LABEL: &str = "+ New Note";
pub const DELETE_LABEL: &str = "\u{00d7}";

/// One row of the note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub id: NoteId,
    /// Note title, or `"Untitled"` when empty.
    pub title: String,
    /// Human-readable `updated_at` in the viewer's time zone.
    pub updated_label: String,
    /// Whether this row is the selected note.
    pub active: bool,
}

/// Note list in store order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarView {
    pub heading: &'static str,
    pub new_note_label: &'static str,
    pub items: Vec<SidebarItem>,
}

impl SidebarView {
    /// Builds the sidebar using the local time zone for timestamps.
    pub fn from_store<R: NoteSnapshotRepository>(store: &NoteStore<R>) -> Self {
        Self::from_store_in(store, &Local)
    }

    /// Builds the sidebar rendering timestamps in `tz`.
    pub fn from_store_in<R, Tz>(store: &NoteStore<R>, tz: &Tz) -> Self
    where
        R: NoteSnapshotRepository,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let selected = store.selected_id();
        let items = store
            .notes()
            .iter()
            .map(|note| SidebarItem {
                id: note.id.clone(),
                title: note.display_title().to_string(),
                updated_label: format_timestamp_label(&note.updated_at, tz),
                active: selected == Some(&note.id),
            })
            .collect();

        Self {
            heading: SIDEBAR_HEADING,
            new_note_label: NEW_NOTE_LABEL,
            items,
        }
    }

    pub fn active_item(&self) -> Option<&SidebarItem> {
        self.items.iter().find(|item| item.active)
    }
}

/// Formats a timestamp as `M/D/YYYY, h:mm:ss AM` in `tz`.
pub fn format_timestamp_label<Tz>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::format_timestamp_label;
    use chrono::{FixedOffset, TimeZone, Utc};

    #[test]
    fn timestamp_label_uses_twelve_hour_clock() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 21, 5, 9).unwrap();
        assert_eq!(format_timestamp_label(&at, &Utc), "10/18/2026, 9:05:09 PM");
    }

    #[test]
    fn timestamp_label_applies_time_zone() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();
        let offset = FixedOffset::west_opt(2 * 3600).unwrap();
        assert_eq!(
            format_timestamp_label(&at, &offset),
            "12/31/2025, 11:00:00 PM"
        );
    }
}
