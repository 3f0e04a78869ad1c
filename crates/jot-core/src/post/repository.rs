//! Post repository: maps post operations onto the storage boundary.

use super::model::{NewPost, Post};
use super::TABLE;
use crate::backend::{RowFilter, SelectQuery, TableService};
use crate::error::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Thin request layer over the posts table. Same contract as the note
/// repository: one remote call per method, no local state.
pub struct PostRepository {
    tables: Arc<dyn TableService>,
}

impl PostRepository {
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self { tables }
    }

    /// Fetches the current user's posts, most recently created first.
    pub async fn list(&self) -> Result<Vec<Post>> {
        let rows = self
            .tables
            .select(TABLE, SelectQuery::new().order_desc("created_at"))
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    /// Inserts a new post and returns it as stored.
    pub async fn create(&self, draft: NewPost) -> Result<Post> {
        let row = self
            .tables
            .insert(TABLE, serde_json::to_value(&draft)?)
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    /// Deletes the post matching both `id` and `owner_id`.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let filter = RowFilter::new()
            .eq("id", id.to_string())
            .eq("user_id", owner_id.to_string());
        self.tables.delete(TABLE, filter).await
    }
}
