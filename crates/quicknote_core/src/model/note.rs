//! Note domain model.
//!
//! # Responsibility
//! - Define the single record type held by the note store.
//! - Enforce record-level invariants on construction and deserialization.
//!
//! # Invariants
//! - `id` is non-empty and never reassigned after creation.
//! - `created_at` is immutable; `updated_at` never precedes it.
//! - Wire shape is `{id, title, content, createdAt, updatedAt}`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Title shown for notes whose title is empty.
pub const UNTITLED_LABEL: &str = "Untitled";

/// Opaque note identifier.
///
/// Ids written by older clients are decimal millisecond strings, new ids are
/// UUIDs. Both are accepted; only emptiness is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wraps a raw id value.
    ///
    /// # Errors
    /// - Returns `NoteValidationError::EmptyId` when `value` is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, NoteValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        Ok(Self(value))
    }

    /// Wraps an id produced by an in-crate generator, which never yields blanks.
    pub(crate) fn generated(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for NoteId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Record-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyId,
    UpdatedBeforeCreated {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id must not be empty"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updatedAt ({}) must be >= createdAt ({})",
                updated_at.to_rfc3339(),
                created_at.to_rfc3339()
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// One user note.
///
/// `content` is markdown source; nothing in core renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "NoteWire")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(serialize_with = "serialize_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_millis")]
    pub updated_at: DateTime<Utc>,
}

/// Writes timestamps as `YYYY-MM-DDTHH:MM:SS.mmmZ`, always with three
/// fraction digits so stored strings sort chronologically.
fn serialize_millis<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Unvalidated deserialization shape for `Note`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteWire {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NoteWire> for Note {
    type Error = NoteValidationError;

    fn try_from(wire: NoteWire) -> Result<Self, Self::Error> {
        let note = Self {
            id: NoteId::new(wire.id)?,
            title: wire.title,
            content: wire.content,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        };
        note.validate()?;
        Ok(note)
    }
}

impl Note {
    /// Creates an empty note stamped with `now` for both timestamps.
    pub fn new(id: NoteId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: String::new(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Title as shown in lists: `"Untitled"` when empty.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED_LABEL
        } else {
            self.title.as_str()
        }
    }

    /// Advances `updated_at` to `now`, never moving it backwards.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
