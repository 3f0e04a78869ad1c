//! In-memory backend for tests.
//!
//! Implements both backend traits against hash maps, emulating the
//! hosted service's observable behavior: server-assigned identifiers
//! and timestamps, row-level ownership scoping on reads, and
//! change notifications for every auth transition.

use async_trait::async_trait;
use chrono::Utc;
use jot_core::backend::{
    AuthService, Backend, OAuthProvider, RowFilter, SelectQuery, TableService,
};
use jot_core::error::{JotError, Result};
use jot_core::session::{AuthUser, SessionChange};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: AuthUser,
}

/// In-memory stand-in for the hosted service.
#[derive(Debug)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    accounts: Mutex<HashMap<String, Account>>,
    /// Outstanding OAuth authorization codes.
    codes: Mutex<HashMap<String, AuthUser>>,
    session: Mutex<Option<AuthUser>>,
    changes: broadcast::Sender<SessionChange>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            accounts: Mutex::new(HashMap::new()),
            codes: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            changes: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wraps this fake into a [`Backend`] handle.
    pub fn backend(self: &Arc<Self>) -> Backend {
        Backend::new(self.clone(), self.clone())
    }

    /// Registers an account without going through the sign-up endpoint.
    pub fn register_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    /// Puts a session in place directly, as if the user had signed in
    /// before the process started.
    pub fn force_sign_in(&self, user: &AuthUser) {
        *self.session.lock().unwrap() = Some(user.clone());
        let _ = self.changes.send(SessionChange::SignedIn { user: user.clone() });
    }

    /// Issues an OAuth authorization code redeemable by
    /// [`AuthService::exchange_code`].
    pub fn issue_code(&self, user: &AuthUser) -> String {
        let code = Uuid::new_v4().to_string();
        self.codes.lock().unwrap().insert(code.clone(), user.clone());
        code
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.lock().unwrap().clone()
    }

    fn set_session(&self, user: AuthUser) -> AuthUser {
        *self.session.lock().unwrap() = Some(user.clone());
        let _ = self.changes.send(SessionChange::SignedIn { user: user.clone() });
        user
    }
}

fn matches_filter(row: &Value, filter: &RowFilter) -> bool {
    filter.eq.iter().all(|(column, value)| {
        row.get(column).is_some_and(|cell| match cell {
            Value::String(s) => s == value,
            other => other.to_string() == *value,
        })
    })
}

/// Ordering for the values an `order=` column can hold here: timestamps
/// as RFC 3339 strings compare lexicographically, numbers numerically.
fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn current_session(&self) -> Result<Option<AuthUser>> {
        Ok(self.current_user())
    }

    async fn sign_in_oauth(&self, provider: OAuthProvider, redirect_url: &str) -> Result<String> {
        Ok(format!(
            "https://auth.invalid/authorize?provider={provider}&redirect_to={redirect_url}"
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<AuthUser> {
        match self.codes.lock().unwrap().remove(code) {
            Some(user) => Ok(self.set_session(user)),
            None => Err(JotError::provider("invalid authorization code")),
        }
    }

    async fn sign_in_password(&self, email: &str, password: &str) -> Result<AuthUser> {
        let account = self.accounts.lock().unwrap().get(email).cloned();
        match account {
            Some(account) if account.password == password => Ok(self.set_session(account.user)),
            _ => Err(JotError::invalid_credentials()),
        }
    }

    async fn sign_up_password(
        &self,
        email: &str,
        password: &str,
        _redirect_url: &str,
    ) -> Result<AuthUser> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(JotError::provider("email already registered"));
        }
        let user = self.register_user(email, password);
        Ok(self.set_session(user))
    }

    async fn sign_out(&self) -> Result<()> {
        if self.session.lock().unwrap().take().is_some() {
            let _ = self.changes.send(SessionChange::SignedOut);
        }
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Option<AuthUser>> {
        match self.current_user() {
            Some(user) => {
                let _ = self
                    .changes
                    .send(SessionChange::TokenRefreshed { user: user.clone() });
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}

#[async_trait]
impl TableService for MemoryBackend {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>> {
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).cloned().unwrap_or_default();
        drop(tables);

        let owner = self.current_user().map(|user| user.id.to_string());
        let mut rows: Vec<Value> = rows
            .into_iter()
            // Row-level ownership scoping, as the hosted service applies
            // it: rows carrying an owner column are only visible to that
            // owner.
            .filter(|row| match row.get("user_id") {
                Some(Value::String(user_id)) => owner.as_deref() == Some(user_id.as_str()),
                _ => true,
            })
            .filter(|row| matches_filter(row, &query.filter))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let cmp = compare_cells(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.descending { cmp.reverse() } else { cmp }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let Value::Object(mut fields) = row else {
            return Err(JotError::data_access("insert payload must be an object"));
        };

        // Server-assigned identity fields, as column defaults would.
        let now = Value::String(Utc::now().to_rfc3339());
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields.entry("created_at").or_insert_with(|| now.clone());
        fields.entry("updated_at").or_insert_with(|| now.clone());

        let stored = Value::Object(fields);
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, table: &str, filter: RowFilter, patch: Value) -> Result<Vec<Value>> {
        let Value::Object(patch) = patch else {
            return Err(JotError::data_access("update payload must be an object"));
        };

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let now = Value::String(Utc::now().to_rfc3339());

        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if !matches_filter(row, &filter) {
                continue;
            }
            let Some(fields) = row.as_object_mut() else {
                continue;
            };
            for (key, value) in &patch {
                fields.insert(key.clone(), value.clone());
            }
            // Update trigger on tables that track it.
            if let Some(updated_at) = fields.get_mut("updated_at") {
                *updated_at = now.clone();
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: RowFilter) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !matches_filter(row, &filter));
        }
        Ok(())
    }
}
