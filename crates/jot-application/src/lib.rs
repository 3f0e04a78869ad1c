//! Use-case layer for the jot application: the session-bootstrap and
//! record-sync flows, OAuth callback handling, and the session-refresh
//! middleware.

pub mod callback;
pub mod flow;
pub mod middleware;
pub mod posts;

pub use callback::{handle_oauth_callback, CallbackRedirect};
pub use flow::{FlowState, LoadState, NotesFlow};
pub use middleware::SessionRefresh;
pub use posts::PostsFlow;
