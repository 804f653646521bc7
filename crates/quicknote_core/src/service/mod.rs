//! Core use-case services.
//!
//! # Responsibility
//! - Own the authoritative in-memory note collection and selection.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod clock;
pub mod id_gen;
pub mod note_store;
