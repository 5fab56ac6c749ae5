use crate::AgentError;
use crate::agent::{Agent, RunContext};
use crate::cancel::RunCancellation;
use crate::config::RunConfig;
use crate::events::{RunEvent, RunEventStream};
use concierge_sessions::{SessionKey, SessionStore, SessionStoreError, Turn};
use futures::{Stream, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

type SessionLocks = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Binds a root agent to a session store and drives runs against it.
///
/// Runs on one session are serialized for their whole duration; runs on
/// different sessions proceed independently.
#[derive(Clone)]
pub struct Runner {
    app_name: String,
    root: Arc<Agent>,
    store: Arc<dyn SessionStore>,
    config: RunConfig,
    locks: SessionLocks,
}

impl Runner {
    pub fn new(app_name: impl Into<String>, root: Arc<Agent>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            app_name: app_name.into(),
            root,
            store,
            config: RunConfig::default(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn root(&self) -> &Arc<Agent> {
        &self.root
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn create_session(&self, user_id: &str) -> Result<SessionKey, AgentError> {
        Ok(self.store.create(&self.app_name, user_id).await?)
    }

    pub fn run(&self, user_id: &str, session_id: &str, text: &str) -> RunEventStream {
        self.run_with_cancellation(user_id, session_id, text, RunCancellation::new())
    }

    /// Appends `text` as a user turn, then streams the root agent's events,
    /// recording each one in the session before it is yielded.
    pub fn run_with_cancellation(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
        cancellation: RunCancellation,
    ) -> RunEventStream {
        Box::pin(run_stream(
            self.clone(),
            user_id.to_string(),
            session_id.to_string(),
            text.to_string(),
            cancellation,
        ))
    }

    /// Drains a run into a vector, stopping at the first error.
    pub async fn run_to_completion(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<Vec<RunEvent>, AgentError> {
        self.run(user_id, session_id, text).try_collect().await
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn owned_session(&self, user_id: &str, session_id: &str) -> Result<SessionKey, AgentError> {
        match self.store.get(session_id).await? {
            Some(key) if key.app_name == self.app_name && key.user_id == user_id => Ok(key),
            _ => Err(SessionStoreError::UnknownSession(session_id.to_string()).into()),
        }
    }
}

fn run_stream(
    runner: Runner,
    user_id: String,
    session_id: String,
    text: String,
    cancellation: RunCancellation,
) -> impl Stream<Item = Result<RunEvent, AgentError>> + Send {
    async_stream::try_stream! {
        if runner.config.max_steps == 0 {
            Err::<(), _>(AgentError::InvalidConfiguration(
                "max_steps must be at least 1".to_string(),
            ))?;
        }

        let lock = runner.session_lock(&session_id);
        let _guard = lock.lock_owned().await;

        let session = runner.owned_session(&user_id, &session_id).await?;
        let history = runner.store.history(&session_id).await?;
        let user_turn = Turn::user(text);
        runner.store.append(&session_id, user_turn.clone()).await?;
        tracing::debug!(session = %session_id, turns = history.len(), "run started");

        let context = RunContext {
            session,
            config: runner.config.clone(),
            cancellation: cancellation.clone(),
        };
        let mut events = runner.root.respond(history, user_turn, context).peekable();
        while let Some(event) = events.next().await {
            let event = event?;
            runner.store.append(&session_id, event.to_turn()).await?;
            yield event;
            // Agents check cancellation before any further work, so peeking
            // only runs ahead to the point where they would stop.
            if Pin::new(&mut events).peek().await.is_some() {
                cancellation.check()?;
            }
        }
        tracing::debug!(session = %session_id, "run finished");
    }
}
