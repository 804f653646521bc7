//! Note id generation strategies.
//!
//! Generators only need to be unique in practice; the note store still
//! rejects candidates that collide with ids already in the collection.

use crate::model::note::NoteId;
use uuid::Uuid;

/// Produces candidate ids for new notes.
pub trait IdGenerator {
    fn next_id(&mut self) -> NoteId;
}

/// Random UUID v4 ids. Default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> NoteId {
        NoteId::from(Uuid::new_v4())
    }
}

/// Monotonic counter ids such as `note-1`, `note-2`.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: first,
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("note-")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> NoteId {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        NoteId::generated(format!("{}{value}", self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};

    #[test]
    fn sequential_ids_are_monotonic() {
        let mut ids = SequentialIdGenerator::default();
        assert_eq!(ids.next_id().as_str(), "note-1");
        assert_eq!(ids.next_id().as_str(), "note-2");
    }

    #[test]
    fn uuid_ids_differ() {
        let mut ids = UuidIdGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
