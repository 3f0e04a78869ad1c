//! Session store: owns the client's view of the current session.
//!
//! The store is the only writer of [`SessionState`]; everything else
//! reads it through a `watch` subscription. State moves in exactly two
//! ways: the one-time bootstrap lookup, and change notifications from
//! the identity client.

use crate::backend::AuthService;
use crate::error::Result;
use crate::session::{SessionChange, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long the bootstrap lookup may stay pending before the store
/// degrades to unauthenticated.
pub const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Holds the current [`SessionState`] and keeps it in sync with the
/// identity client's change notifications.
///
/// Dropping the store aborts its listener task, so a torn-down consumer
/// is never notified.
pub struct SessionStore {
    auth: Arc<dyn AuthService>,
    state: Arc<watch::Sender<SessionState>>,
    bootstrap_timeout: Duration,
    listener: JoinHandle<()>,
}

impl SessionStore {
    /// Creates the store in the `Unknown` state and registers for change
    /// notifications.
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let state = Arc::new(watch::Sender::new(SessionState::Unknown));
        let listener = Self::spawn_listener(auth.clone(), state.clone());

        Self {
            auth,
            state,
            bootstrap_timeout: DEFAULT_BOOTSTRAP_TIMEOUT,
            listener,
        }
    }

    /// Overrides the bootstrap timeout.
    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }

    fn spawn_listener(
        auth: Arc<dyn AuthService>,
        state: Arc<watch::Sender<SessionState>>,
    ) -> JoinHandle<()> {
        let mut changes = auth.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        tracing::debug!(?change, "session change notification");
                        state.send_replace(change.resolved_state());
                    }
                    // A lagged receiver only skipped intermediate values;
                    // the next notification carries the full state anyway.
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Issues the one-time "get current session" request and resolves
    /// the state to present or absent.
    ///
    /// An unreachable or misconfigured service degrades to `Absent`
    /// after the bootstrap timeout instead of hanging in `Unknown`.
    pub async fn bootstrap(&self) -> SessionState {
        let resolved =
            match tokio::time::timeout(self.bootstrap_timeout, self.auth.current_session()).await {
                Ok(Ok(Some(user))) => SessionState::Present(user),
                Ok(Ok(None)) => SessionState::Absent,
                Ok(Err(err)) => {
                    tracing::warn!(%err, "session lookup failed, treating as signed out");
                    SessionState::Absent
                }
                Err(_) => {
                    tracing::warn!(
                        timeout = ?self.bootstrap_timeout,
                        "session lookup timed out, treating as signed out"
                    );
                    SessionState::Absent
                }
            };

        self.state.send_replace(resolved.clone());
        resolved
    }

    /// The current session state.
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribes to session state changes. Dropping the receiver
    /// releases the subscription.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Ends the current session. The resulting change notification moves
    /// the state to `Absent`.
    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
