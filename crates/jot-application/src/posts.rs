//! The posts-sync flow: the same load/mutate/reload cycle as the notes
//! flow, without local filtering.

use crate::flow::{FlowState, LoadState};
use jot_core::backend::Backend;
use jot_core::error::Result;
use jot_core::post::{NewPost, Post, PostRepository};
use jot_core::session::{AuthUser, SessionState, SessionStore};
use uuid::Uuid;

/// Bootstrap-and-sync controller for the posts list.
pub struct PostsFlow {
    session: SessionStore,
    posts: PostRepository,
    working_set: Vec<Post>,
    state: FlowState,
    user: Option<AuthUser>,
}

impl PostsFlow {
    pub fn new(backend: &Backend) -> Self {
        Self {
            session: SessionStore::new(backend.auth.clone()),
            posts: PostRepository::new(backend.tables.clone()),
            working_set: Vec::new(),
            state: FlowState::Unknown,
            user: None,
        }
    }

    /// Resolves the session and, when one is present, loads the posts.
    pub async fn bootstrap(&mut self) -> Result<()> {
        let resolved = self.session.bootstrap().await;
        self.apply_session(resolved).await
    }

    /// Applies a session-change notification.
    pub async fn apply_session(&mut self, state: SessionState) -> Result<()> {
        match state {
            SessionState::Present(user) => {
                self.user = Some(user);
                self.reload().await
            }
            SessionState::Absent => {
                self.user = None;
                self.working_set.clear();
                self.state = FlowState::Unauthenticated;
                Ok(())
            }
            SessionState::Unknown => {
                self.state = FlowState::Unknown;
                Ok(())
            }
        }
    }

    async fn reload(&mut self) -> Result<()> {
        self.state = FlowState::Authenticated(LoadState::Loading);
        let result = self.posts.list().await;
        self.state = FlowState::Authenticated(LoadState::Ready);
        match result {
            Ok(posts) => {
                self.working_set = posts;
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, "failed to load posts");
                Err(err)
            }
        }
    }

    /// Creates a post, then reloads. Posts require both a title and
    /// content; a blank in either is a local no-op.
    pub async fn create_post(&mut self, title: &str, content: &str) -> Result<()> {
        let Some(user) = self.user.clone() else {
            tracing::debug!("create ignored: not signed in");
            return Ok(());
        };
        if title.trim().is_empty() || content.trim().is_empty() {
            tracing::debug!("create ignored: blank title or content");
            return Ok(());
        }

        self.posts
            .create(NewPost {
                title: title.to_string(),
                content: content.to_string(),
                user_id: user.id,
            })
            .await?;
        self.reload().await
    }

    /// Deletes a post owned by the signed-in user, then reloads.
    pub async fn delete_post(&mut self, id: Uuid) -> Result<()> {
        let Some(user) = self.user.clone() else {
            tracing::debug!("delete ignored: not signed in");
            return Ok(());
        };

        self.posts.delete(id, user.id).await?;
        self.reload().await
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// The posts from the last fetch, most recently created first.
    pub fn posts(&self) -> &[Post] {
        &self.working_set
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }
}
