use crate::types::{SessionId, SessionKey, Turn};

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Ordered conversation history keyed by session.
///
/// Appends and reads on one session are mutually exclusive; operations on
/// different sessions never contend on a shared session lock.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a new, empty session with a freshly generated id.
    async fn create(&self, app_name: &str, user_id: &str) -> SessionStoreResult<SessionKey>;

    async fn append(&self, session_id: &str, turn: Turn) -> SessionStoreResult<()>;

    /// Full history so far, in append order.
    async fn history(&self, session_id: &str) -> SessionStoreResult<Vec<Turn>>;

    async fn get(&self, session_id: &str) -> SessionStoreResult<Option<SessionKey>>;

    /// Sessions of one user within one application, oldest first.
    async fn list(&self, app_name: &str, user_id: &str) -> SessionStoreResult<Vec<SessionKey>>;
}
