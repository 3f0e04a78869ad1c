//! Post domain: models and repository.

pub mod model;
pub mod repository;

pub use model::{NewPost, Post};
pub use repository::PostRepository;

/// Remote table the post rows live in.
pub const TABLE: &str = "posts";
