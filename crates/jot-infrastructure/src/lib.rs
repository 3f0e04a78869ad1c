//! Implementations of the `jot-core` backend traits: the HTTP client
//! for the hosted identity + storage service, and an in-memory fake for
//! tests.

pub mod http;
pub mod memory;

pub use crate::http::HttpBackend;
pub use crate::memory::MemoryBackend;
