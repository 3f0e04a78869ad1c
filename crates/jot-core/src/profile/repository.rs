//! Profile repository: single-row lookup and partial update.

use super::model::{Profile, ProfileChanges};
use super::TABLE;
use crate::backend::{RowFilter, SelectQuery, TableService};
use crate::error::{JotError, Result};
use std::sync::Arc;
use uuid::Uuid;

/// Thin request layer over the profiles table. A profile's row id is the
/// user's id, so lookups and updates filter on `id` alone.
pub struct ProfileRepository {
    tables: Arc<dyn TableService>,
}

impl ProfileRepository {
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self { tables }
    }

    /// Fetches the profile row for `user_id`.
    pub async fn fetch(&self, user_id: Uuid) -> Result<Profile> {
        let rows = self
            .tables
            .select(
                TABLE,
                SelectQuery::new().eq("id", user_id.to_string()).limit(1),
            )
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(JotError::not_found("profile", user_id.to_string())),
        }
    }

    /// Applies `changes` to the profile row for `user_id`.
    pub async fn update(&self, user_id: Uuid, changes: ProfileChanges) -> Result<Profile> {
        let filter = RowFilter::new().eq("id", user_id.to_string());
        let rows = self
            .tables
            .update(TABLE, filter, serde_json::to_value(&changes)?)
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => Err(JotError::not_found("profile", user_id.to_string())),
        }
    }
}
