//! Profile domain: models and repository.

pub mod model;
pub mod repository;

pub use model::{Profile, ProfileChanges};
pub use repository::ProfileRepository;

/// Remote table the profile rows live in.
pub const TABLE: &str = "profiles";
