//! Note domain: models and repository.

pub mod model;
pub mod repository;

pub use model::{Category, NewNote, Note, NoteChanges};
pub use repository::NoteRepository;

/// Remote table the note rows live in.
pub const TABLE: &str = "notes";
