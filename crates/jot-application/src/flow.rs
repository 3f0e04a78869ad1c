//! The session-bootstrap and notes-sync flow.
//!
//! One long-lived controller per user-facing session. It moves through
//! `Unknown → {Unauthenticated, Authenticated(Loading) →
//! Authenticated(Ready)}` and never terminates: mutations loop back
//! through `Loading` via a full reload, sign-out returns to
//! `Unauthenticated`, sign-in re-enters `Loading`.

use jot_core::backend::{AuthService, Backend};
use jot_core::error::Result;
use jot_core::list::{CategoryFilter, FilterCriteria, NoteListView};
use jot_core::note::{Category, NewNote, Note, NoteChanges, NoteRepository};
use jot_core::session::{AuthUser, SessionState, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Whether the working set reflects the remote store yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// A fetch or reload is outstanding.
    Loading,
    /// The working set matches the last full fetch.
    Ready,
}

/// The flow's position in the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    /// Session not resolved yet; consumers show a loading indicator,
    /// never an empty-state message.
    #[default]
    Unknown,
    Unauthenticated,
    Authenticated(LoadState),
}

impl FlowState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Authenticated(LoadState::Ready))
    }
}

/// Bootstrap-and-sync controller for the notes list.
///
/// Owns the session store, the note repository, and the list view.
/// Remote mutations are always followed by a wholesale reload of the
/// working set; filter changes never touch the network.
pub struct NotesFlow {
    auth: Arc<dyn AuthService>,
    session: SessionStore,
    notes: NoteRepository,
    view: NoteListView,
    state: FlowState,
    user: Option<AuthUser>,
}

impl NotesFlow {
    pub fn new(backend: &Backend) -> Self {
        Self {
            auth: backend.auth.clone(),
            session: SessionStore::new(backend.auth.clone()),
            notes: NoteRepository::new(backend.tables.clone()),
            view: NoteListView::new(),
            state: FlowState::Unknown,
            user: None,
        }
    }

    /// Overrides the session store's bootstrap timeout.
    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.session = self.session.with_bootstrap_timeout(timeout);
        self
    }

    /// Resolves the session and, when one is present, loads the working
    /// set. Ends in `Unauthenticated` or `Authenticated(Ready)`.
    pub async fn bootstrap(&mut self) -> Result<()> {
        let resolved = self.session.bootstrap().await;
        self.apply_session(resolved).await
    }

    /// Applies a session-change notification observed on
    /// [`SessionStore::subscribe`] (covers sign-in from elsewhere, token
    /// refresh, sign-out).
    pub async fn apply_session(&mut self, state: SessionState) -> Result<()> {
        match state {
            SessionState::Present(user) => {
                self.user = Some(user);
                self.reload().await
            }
            SessionState::Absent => {
                self.user = None;
                self.view.clear();
                self.state = FlowState::Unauthenticated;
                Ok(())
            }
            SessionState::Unknown => {
                self.state = FlowState::Unknown;
                Ok(())
            }
        }
    }

    /// Replaces the working set with a fresh full fetch.
    async fn reload(&mut self) -> Result<()> {
        self.state = FlowState::Authenticated(LoadState::Loading);
        let result = self.notes.list().await;
        self.state = FlowState::Authenticated(LoadState::Ready);
        match result {
            Ok(notes) => {
                self.view.replace_working_set(notes);
                Ok(())
            }
            Err(err) => {
                // Keep whatever the last successful fetch showed.
                tracing::error!(%err, "failed to load notes");
                Err(err)
            }
        }
    }

    pub async fn sign_in_password(&mut self, email: &str, password: &str) -> Result<()> {
        let user = self.auth.sign_in_password(email, password).await?;
        self.apply_session(SessionState::Present(user)).await
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        self.session.sign_out().await?;
        self.apply_session(SessionState::Absent).await
    }

    /// Creates a note owned by the signed-in user, then reloads.
    ///
    /// Without a user or with a blank title this is a local no-op, as
    /// the submit guard in the original flow: nothing is sent.
    pub async fn create_note(
        &mut self,
        title: &str,
        content: &str,
        category: Category,
    ) -> Result<()> {
        let Some(user) = self.user.clone() else {
            tracing::debug!("create ignored: not signed in");
            return Ok(());
        };
        if title.trim().is_empty() {
            tracing::debug!("create ignored: empty title");
            return Ok(());
        }

        self.notes
            .create(NewNote {
                title: title.to_string(),
                content: content.to_string(),
                category,
                user_id: user.id,
            })
            .await?;
        self.reload().await
    }

    /// Updates a note owned by the signed-in user, then reloads.
    pub async fn update_note(&mut self, id: Uuid, changes: NoteChanges) -> Result<()> {
        let Some(user) = self.user.clone() else {
            tracing::debug!("update ignored: not signed in");
            return Ok(());
        };

        self.notes.update(id, user.id, changes).await?;
        self.reload().await
    }

    /// Deletes a note owned by the signed-in user, then reloads.
    pub async fn delete_note(&mut self, id: Uuid) -> Result<()> {
        let Some(user) = self.user.clone() else {
            tracing::debug!("delete ignored: not signed in");
            return Ok(());
        };

        self.notes.delete(id, user.id).await?;
        self.reload().await
    }

    /// Updates the search term. Local re-derivation only; no network.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.view.set_search(term);
    }

    /// Updates the category selection. Local re-derivation only.
    pub fn set_category(&mut self, category: CategoryFilter) {
        self.view.set_category(category);
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        self.view.criteria()
    }

    /// The full working set from the last fetch.
    pub fn working_set(&self) -> &[Note] {
        self.view.working_set()
    }

    /// The filtered view.
    pub fn visible(&self) -> &[Note] {
        self.view.visible()
    }

    /// The underlying session store, for subscribing to session changes.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }
}
