//! Storage boundary trait.
//!
//! Rows cross this boundary as JSON objects; the domain repositories in
//! this crate own the typed view. Filters are equality-only and ordering
//! is single-column, which is the whole query surface the application
//! uses.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Conjunction of column = value constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub eq: Vec<(String, String)>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `column = value` constraint.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.eq.is_empty()
    }
}

/// Single-column ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Parameters for a select call.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub filter: RowFilter,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `column = value` constraint.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = self.filter.eq(column, value);
        self
    }

    /// Orders results by `column`, newest/largest first.
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// An abstract client for the remote row store.
///
/// Every method performs exactly one remote call and never mutates local
/// state. Row-level ownership enforcement happens on the service side;
/// mutating calls still carry the owner constraint explicitly so the
/// service has both identifiers to match on.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Fetches rows from `table`, subject to the session-scoped
    /// ownership filter the service enforces on top of `query`.
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>>;

    /// Inserts one row and returns it as stored (server-assigned
    /// identifier and timestamps included).
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Applies `patch` to every row matching `filter`, returning the
    /// updated rows. Zero matching rows yields `Ok(vec![])`, not an
    /// error; the caller decides what an empty match means.
    async fn update(&self, table: &str, filter: RowFilter, patch: Value) -> Result<Vec<Value>>;

    /// Deletes every row matching `filter`. Zero matching rows is not an
    /// error.
    async fn delete(&self, table: &str, filter: RowFilter) -> Result<()>;
}
