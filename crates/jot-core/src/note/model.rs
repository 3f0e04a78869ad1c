//! Note domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of category tags a note can carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Work,
    Personal,
    Ideas,
    Todo,
}

impl Default for Category {
    fn default() -> Self {
        Self::General
    }
}

/// A note as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Server-assigned identifier.
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    /// Owner reference; mutations must match it.
    pub user_id: Uuid,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Server-maintained last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A note draft, before the server assigns identity fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub user_id: Uuid,
}

/// Partial update: only the provided fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl NoteChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.category.is_none()
    }
}
