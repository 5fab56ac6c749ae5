use crate::memory::{MemoryState, MemorySessionStore};
use crate::store::{SessionStore, SessionStoreError, SessionStoreResult};
use crate::types::{SessionKey, Turn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const STATE_FILE_NAME: &str = "sessions-state.json";

/// Memory store whose full state is written to a JSON file after every
/// mutation.
#[derive(Clone, Debug)]
pub struct FsSessionStore {
    state_file: PathBuf,
    inner: MemorySessionStore,
    write_lock: Arc<Mutex<()>>,
}

impl FsSessionStore {
    pub fn new<P: AsRef<Path>>(root: P) -> SessionStoreResult<Self> {
        fs::create_dir_all(root.as_ref()).map_err(|err| {
            SessionStoreError::Backend(format!("create fs store root failed: {err}"))
        })?;
        let state_file = root.as_ref().join(STATE_FILE_NAME);
        let state = if state_file.exists() {
            let raw = fs::read(&state_file).map_err(|err| {
                SessionStoreError::Backend(format!("read state file failed: {err}"))
            })?;
            serde_json::from_slice::<MemoryState>(&raw)
                .map_err(|err| SessionStoreError::Serialization(err.to_string()))?
        } else {
            MemoryState::default()
        };

        Ok(Self {
            state_file,
            inner: MemorySessionStore::from_state(state),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    fn lock_writes(&self) -> SessionStoreResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| SessionStoreError::Backend("fs store write lock poisoned".to_string()))
    }

    /// Writes the current state. Callers hold the write lock.
    fn write_state(&self) -> SessionStoreResult<()> {
        let snapshot = self.inner.snapshot()?;
        let raw = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| SessionStoreError::Serialization(err.to_string()))?;
        let tmp = self.state_file.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .map_err(|err| SessionStoreError::Backend(format!("write state file failed: {err}")))?;
        fs::rename(&tmp, &self.state_file).map_err(|err| {
            SessionStoreError::Backend(format!("rename state file failed: {err}"))
        })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for FsSessionStore {
    async fn create(&self, app_name: &str, user_id: &str) -> SessionStoreResult<SessionKey> {
        let _guard = self.lock_writes()?;
        let key = self.inner.insert_session(app_name, user_id)?;
        if let Err(error) = self.write_state() {
            self.inner.remove_session(&key.session_id)?;
            return Err(error);
        }
        Ok(key)
    }

    // A turn that could not be written is taken back out, so memory never
    // runs ahead of the state file.
    async fn append(&self, session_id: &str, turn: Turn) -> SessionStoreResult<()> {
        let _guard = self.lock_writes()?;
        let position = self.inner.push_turn(session_id, turn)?;
        if let Err(error) = self.write_state() {
            tracing::warn!(session_id, %error, "state write failed, dropping appended turn");
            self.inner.remove_turn(session_id, position)?;
            return Err(error);
        }
        Ok(())
    }

    async fn history(&self, session_id: &str) -> SessionStoreResult<Vec<Turn>> {
        self.inner.history(session_id).await
    }

    async fn get(&self, session_id: &str) -> SessionStoreResult<Option<SessionKey>> {
        self.inner.get(session_id).await
    }

    async fn list(&self, app_name: &str, user_id: &str) -> SessionStoreResult<Vec<SessionKey>> {
        self.inner.list(app_name, user_id).await
    }
}
