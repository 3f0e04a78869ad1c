//! End-to-end tests for the bootstrap-and-sync flows against the
//! in-memory backend.

use async_trait::async_trait;
use jot_application::callback::{handle_oauth_callback, CallbackRedirect, ERROR_EXCHANGE_FAILED};
use jot_application::{FlowState, LoadState, NotesFlow, PostsFlow, SessionRefresh};
use jot_core::backend::{AuthService, Backend, OAuthProvider};
use jot_core::error::{JotError, Result};
use jot_core::list::CategoryFilter;
use jot_core::note::{Category, NoteChanges};
use jot_core::session::{AuthUser, SessionChange};
use jot_infrastructure::MemoryBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn signed_in_backend() -> (Arc<MemoryBackend>, Backend, AuthUser) {
    let memory = MemoryBackend::new();
    let user = memory.register_user("a@example.com", "hunter2");
    memory.force_sign_in(&user);
    let backend = memory.backend();
    (memory, backend, user)
}

fn visible_titles(flow: &NotesFlow) -> Vec<String> {
    flow.visible().iter().map(|n| n.title.clone()).collect()
}

#[tokio::test]
async fn test_bootstrap_without_session_ends_unauthenticated() {
    let memory = MemoryBackend::new();
    let mut flow = NotesFlow::new(&memory.backend());
    assert_eq!(flow.state(), FlowState::Unknown);

    flow.bootstrap().await.unwrap();
    assert_eq!(flow.state(), FlowState::Unauthenticated);
    assert!(flow.user().is_none());
}

#[tokio::test]
async fn test_bootstrap_with_session_loads_working_set() {
    let (_memory, backend, _user) = signed_in_backend();
    let mut flow = NotesFlow::new(&backend);

    flow.create_note("ignored before bootstrap", "", Category::General)
        .await
        .unwrap();
    assert!(flow.working_set().is_empty());

    flow.bootstrap().await.unwrap();
    assert_eq!(flow.state(), FlowState::Authenticated(LoadState::Ready));

    flow.create_note("Groceries", "milk, eggs", Category::General)
        .await
        .unwrap();
    assert_eq!(visible_titles(&flow), ["Groceries"]);
}

#[tokio::test]
async fn test_search_and_category_filtering_scenario() {
    let (_memory, backend, _user) = signed_in_backend();
    let mut flow = NotesFlow::new(&backend);
    flow.bootstrap().await.unwrap();

    flow.create_note("Groceries", "milk, eggs", Category::General)
        .await
        .unwrap();
    flow.create_note("Standup notes", "status updates", Category::Work)
        .await
        .unwrap();
    flow.create_note("Idea: backup tool", "sync to external drive", Category::Ideas)
        .await
        .unwrap();
    assert_eq!(flow.working_set().len(), 3);

    flow.set_search("notes");
    assert_eq!(visible_titles(&flow), ["Standup notes"]);

    flow.set_search("");
    flow.set_category(CategoryFilter::Only(Category::Ideas));
    assert_eq!(visible_titles(&flow), ["Idea: backup tool"]);

    // Filtering is local: the state machine never left Ready.
    assert_eq!(flow.state(), FlowState::Authenticated(LoadState::Ready));
    assert_eq!(flow.working_set().len(), 3);
}

#[tokio::test]
async fn test_create_with_blank_title_is_a_local_noop() {
    let (_memory, backend, _user) = signed_in_backend();
    let mut flow = NotesFlow::new(&backend);
    flow.bootstrap().await.unwrap();

    flow.create_note("   ", "content", Category::General)
        .await
        .unwrap();
    assert!(flow.working_set().is_empty());
}

#[tokio::test]
async fn test_update_reorders_and_delete_removes() {
    let (_memory, backend, _user) = signed_in_backend();
    let mut flow = NotesFlow::new(&backend);
    flow.bootstrap().await.unwrap();

    flow.create_note("first", "", Category::General).await.unwrap();
    flow.create_note("second", "", Category::General).await.unwrap();
    assert_eq!(visible_titles(&flow), ["second", "first"]);

    let first_id = flow
        .working_set()
        .iter()
        .find(|n| n.title == "first")
        .unwrap()
        .id;
    flow.update_note(first_id, NoteChanges::new().title("first, edited"))
        .await
        .unwrap();
    assert_eq!(visible_titles(&flow), ["first, edited", "second"]);

    flow.delete_note(first_id).await.unwrap();
    assert_eq!(visible_titles(&flow), ["second"]);
}

#[tokio::test]
async fn test_sign_in_and_sign_out_transitions() {
    let memory = MemoryBackend::new();
    memory.register_user("a@example.com", "hunter2");
    let mut flow = NotesFlow::new(&memory.backend());
    flow.bootstrap().await.unwrap();
    assert_eq!(flow.state(), FlowState::Unauthenticated);

    let err = flow
        .sign_in_password("a@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(err.is_auth());
    assert_eq!(flow.state(), FlowState::Unauthenticated);

    flow.sign_in_password("a@example.com", "hunter2")
        .await
        .unwrap();
    assert_eq!(flow.state(), FlowState::Authenticated(LoadState::Ready));

    flow.create_note("mine", "", Category::General).await.unwrap();
    assert_eq!(flow.working_set().len(), 1);

    flow.sign_out().await.unwrap();
    assert_eq!(flow.state(), FlowState::Unauthenticated);
    assert!(flow.user().is_none());
    assert!(flow.visible().is_empty());
}

/// Identity client whose session lookup never answers, like an endpoint
/// that is configured but unreachable.
struct UnreachableAuth {
    changes: broadcast::Sender<SessionChange>,
}

impl UnreachableAuth {
    fn new() -> Self {
        Self {
            changes: broadcast::channel(4).0,
        }
    }
}

#[async_trait]
impl AuthService for UnreachableAuth {
    async fn current_session(&self) -> Result<Option<AuthUser>> {
        std::future::pending::<()>().await;
        unreachable!()
    }

    async fn sign_in_oauth(&self, _: OAuthProvider, _: &str) -> Result<String> {
        Err(JotError::data_access("unreachable"))
    }

    async fn exchange_code(&self, _: &str) -> Result<AuthUser> {
        Err(JotError::data_access("unreachable"))
    }

    async fn sign_in_password(&self, _: &str, _: &str) -> Result<AuthUser> {
        Err(JotError::data_access("unreachable"))
    }

    async fn sign_up_password(&self, _: &str, _: &str, _: &str) -> Result<AuthUser> {
        Err(JotError::data_access("unreachable"))
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Option<AuthUser>> {
        Err(JotError::data_access("unreachable"))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }
}

#[tokio::test]
async fn test_bootstrap_times_out_to_unauthenticated() {
    let memory = MemoryBackend::new();
    let backend = Backend::new(Arc::new(UnreachableAuth::new()), memory);
    let mut flow =
        NotesFlow::new(&backend).with_bootstrap_timeout(Duration::from_millis(20));

    flow.bootstrap().await.unwrap();
    assert_eq!(flow.state(), FlowState::Unauthenticated);
}

#[tokio::test]
async fn test_oauth_callback_success_redirects_to_root() {
    let memory = MemoryBackend::new();
    let user = memory.register_user("a@example.com", "pw");
    let code = memory.issue_code(&user);

    let redirect = handle_oauth_callback(
        memory.as_ref(),
        &format!("https://app.example.com/auth/callback?code={code}"),
    )
    .await;
    assert_eq!(redirect, CallbackRedirect::Root);
    assert_eq!(
        memory.current_session().await.unwrap().unwrap().id,
        user.id
    );
}

#[tokio::test]
async fn test_oauth_callback_rejected_code() {
    let memory = MemoryBackend::new();
    let redirect = handle_oauth_callback(
        memory.as_ref(),
        "https://app.example.com/auth/callback?code=forged",
    )
    .await;
    assert_eq!(
        redirect,
        CallbackRedirect::Error(ERROR_EXCHANGE_FAILED.to_string())
    );
    assert_eq!(redirect.location(), "/?error=exchange_failed");
}

#[tokio::test]
async fn test_oauth_callback_passes_provider_error_through() {
    let memory = MemoryBackend::new();
    let redirect = handle_oauth_callback(
        memory.as_ref(),
        "https://app.example.com/auth/callback?error=access_denied&error_description=denied",
    )
    .await;
    assert_eq!(redirect, CallbackRedirect::Error("access_denied".into()));
}

#[tokio::test]
async fn test_oauth_callback_without_parameters_returns_root() {
    let memory = MemoryBackend::new();
    let redirect =
        handle_oauth_callback(memory.as_ref(), "https://app.example.com/auth/callback").await;
    assert_eq!(redirect, CallbackRedirect::Root);
}

#[tokio::test]
async fn test_disabled_middleware_passes_request_through() {
    let middleware = SessionRefresh::disabled();
    assert!(!middleware.is_enabled());
    assert_eq!(middleware.handle("request body").await, "request body");
}

#[tokio::test]
async fn test_enabled_middleware_refreshes_session() {
    let memory = MemoryBackend::new();
    let user = memory.register_user("a@example.com", "pw");
    let middleware = SessionRefresh::new(memory.clone());

    let mut changes = memory.subscribe();
    memory.force_sign_in(&user);
    assert!(matches!(
        changes.recv().await.unwrap(),
        SessionChange::SignedIn { .. }
    ));

    assert_eq!(middleware.handle(42).await, 42);
    assert!(matches!(
        changes.recv().await.unwrap(),
        SessionChange::TokenRefreshed { .. }
    ));
}

#[tokio::test]
async fn test_posts_flow_create_and_delete() {
    let (_memory, backend, user) = signed_in_backend();
    let mut flow = PostsFlow::new(&backend);
    flow.bootstrap().await.unwrap();
    assert_eq!(flow.state(), FlowState::Authenticated(LoadState::Ready));
    assert_eq!(flow.user().map(|u| u.id), Some(user.id));

    // Posts require both fields.
    flow.create_post("title only", "").await.unwrap();
    assert!(flow.posts().is_empty());

    flow.create_post("Hello", "first post").await.unwrap();
    flow.create_post("Again", "second post").await.unwrap();
    let titles: Vec<&str> = flow.posts().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Again", "Hello"]);

    let id = flow.posts()[0].id;
    flow.delete_post(id).await.unwrap();
    let titles: Vec<&str> = flow.posts().iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Hello"]);
}
