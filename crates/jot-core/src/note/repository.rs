//! Note repository: maps note operations onto the storage boundary.

use super::model::{NewNote, Note, NoteChanges};
use super::TABLE;
use crate::backend::{RowFilter, SelectQuery, TableService};
use crate::error::{JotError, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Thin request layer over the notes table.
///
/// Each method performs exactly one remote call and normalizes the
/// outcome; none of them mutate local state. Callers re-fetch the full
/// list after a successful mutation.
pub struct NoteRepository {
    tables: Arc<dyn TableService>,
}

impl NoteRepository {
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self { tables }
    }

    /// Fetches the current user's notes, most recently updated first.
    /// The per-user scoping is the storage layer's ownership filter.
    pub async fn list(&self) -> Result<Vec<Note>> {
        let rows = self
            .tables
            .select(TABLE, SelectQuery::new().order_desc("updated_at"))
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    /// Inserts a new note and returns it as stored, with server-assigned
    /// identifier and timestamps.
    ///
    /// Title validation is the caller's job; the repository forwards the
    /// draft as-is.
    pub async fn create(&self, draft: NewNote) -> Result<Note> {
        let row = self
            .tables
            .insert(TABLE, serde_json::to_value(&draft)?)
            .await?;
        Ok(serde_json::from_value(row)?)
    }

    /// Applies `changes` to the note matching both `id` and `owner_id`.
    ///
    /// # Errors
    ///
    /// [`JotError::NotFound`] when no row matched. Whether the
    /// identifier does not exist or the owner does not match is not
    /// observable here, so both surface as the same kind.
    pub async fn update(&self, id: Uuid, owner_id: Uuid, changes: NoteChanges) -> Result<Note> {
        let filter = RowFilter::new()
            .eq("id", id.to_string())
            .eq("user_id", owner_id.to_string());

        let rows = self
            .tables
            .update(TABLE, filter, serde_json::to_value(&changes)?)
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(JotError::not_found("note", id.to_string())),
        }
    }

    /// Deletes the note matching both `id` and `owner_id`. A non-match
    /// deletes nothing and is not an error.
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let filter = RowFilter::new()
            .eq("id", id.to_string())
            .eq("user_id", owner_id.to_string());
        self.tables.delete(TABLE, filter).await
    }
}
