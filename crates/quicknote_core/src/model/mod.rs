//! Domain model for notes.
//!
//! # Responsibility
//! - Define the canonical note record shared by store, persistence and views.
//!
//! # Invariants
//! - Every note is identified by a stable, non-empty `NoteId`.
//! - `updated_at >= created_at` for every note that passes validation.

pub mod note;
