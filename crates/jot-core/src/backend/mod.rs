//! Capability traits for the hosted identity + storage service.
//!
//! The remote service is an opaque network boundary. Everything above it
//! talks through two traits: [`AuthService`] for session issuance and
//! [`TableService`] for row-level CRUD. One implementation speaks the
//! real wire protocol, one is an in-memory fake for tests; both live in
//! `jot-infrastructure`.

pub mod auth;
pub mod table;

pub use auth::{AuthService, OAuthProvider};
pub use table::{OrderBy, RowFilter, SelectQuery, TableService};

use crate::error::Result;
use std::sync::Arc;

/// An explicitly constructed handle to the remote service, passed down
/// to repositories and stores instead of held as process-global state.
#[derive(Clone)]
pub struct Backend {
    /// Session issuance and change notifications.
    pub auth: Arc<dyn AuthService>,
    /// Row-level CRUD.
    pub tables: Arc<dyn TableService>,
}

impl Backend {
    pub fn new(auth: Arc<dyn AuthService>, tables: Arc<dyn TableService>) -> Self {
        Self { auth, tables }
    }
}

/// Cheap connectivity check: a single-row select against the profiles
/// table. Succeeds iff the configured endpoint answered.
pub async fn probe(tables: &dyn TableService) -> Result<()> {
    tables
        .select(crate::profile::TABLE, SelectQuery::new().limit(1))
        .await
        .map(|_| ())
}
