use crate::store::{SessionStore, SessionStoreError, SessionStoreResult};
use crate::types::{SessionId, SessionKey, Turn};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct MemoryState {
    pub next_sequence_no: u64,
    pub sessions: BTreeMap<SessionId, SessionRecord>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct SessionRecord {
    pub key: SessionKey,
    pub sequence_no: u64,
    pub turns: Vec<Turn>,
}

#[derive(Debug)]
struct SessionSlot {
    key: SessionKey,
    sequence_no: u64,
    turns: Mutex<Vec<Turn>>,
}

#[derive(Debug, Default)]
struct MemoryIndex {
    next_sequence_no: u64,
    sessions: HashMap<SessionId, Arc<SessionSlot>>,
}

/// In-process session store. The index lock is only held to find or insert a
/// session; turns are guarded by a lock owned by each session.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<MemoryIndex>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: MemoryState) -> Self {
        let sessions = state
            .sessions
            .into_iter()
            .map(|(session_id, record)| {
                (
                    session_id,
                    Arc::new(SessionSlot {
                        key: record.key,
                        sequence_no: record.sequence_no,
                        turns: Mutex::new(record.turns),
                    }),
                )
            })
            .collect();
        Self {
            inner: Arc::new(RwLock::new(MemoryIndex {
                next_sequence_no: state.next_sequence_no,
                sessions,
            })),
        }
    }

    pub(crate) fn snapshot(&self) -> SessionStoreResult<MemoryState> {
        let index = self.read_index()?;
        let mut sessions = BTreeMap::new();
        for (session_id, slot) in &index.sessions {
            let turns = slot
                .turns
                .lock()
                .map_err(|_| poisoned())?
                .clone();
            sessions.insert(
                session_id.clone(),
                SessionRecord {
                    key: slot.key.clone(),
                    sequence_no: slot.sequence_no,
                    turns,
                },
            );
        }
        Ok(MemoryState {
            next_sequence_no: index.next_sequence_no,
            sessions,
        })
    }

    pub(crate) fn insert_session(&self, app_name: &str, user_id: &str) -> SessionStoreResult<SessionKey> {
        let mut index = self.inner.write().map_err(|_| poisoned())?;
        let key = SessionKey {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            session_id: Uuid::new_v4().to_string(),
        };
        let sequence_no = index.next_sequence_no;
        index.next_sequence_no += 1;
        index.sessions.insert(
            key.session_id.clone(),
            Arc::new(SessionSlot {
                key: key.clone(),
                sequence_no,
                turns: Mutex::new(Vec::new()),
            }),
        );
        tracing::debug!(session_id = %key.session_id, app_name, user_id, "session created");
        Ok(key)
    }

    pub(crate) fn remove_session(&self, session_id: &str) -> SessionStoreResult<()> {
        let mut index = self.inner.write().map_err(|_| poisoned())?;
        index.sessions.remove(session_id);
        Ok(())
    }

    /// Appends `turn` and returns its position in the session.
    pub(crate) fn push_turn(&self, session_id: &str, turn: Turn) -> SessionStoreResult<usize> {
        let slot = self.slot(session_id)?;
        let mut turns = slot.turns.lock().map_err(|_| poisoned())?;
        turns.push(turn);
        tracing::trace!(session_id, turns = turns.len(), "turn appended");
        Ok(turns.len() - 1)
    }

    pub(crate) fn remove_turn(&self, session_id: &str, position: usize) -> SessionStoreResult<()> {
        let slot = self.slot(session_id)?;
        let mut turns = slot.turns.lock().map_err(|_| poisoned())?;
        if position < turns.len() {
            turns.remove(position);
        }
        Ok(())
    }

    fn read_index(&self) -> SessionStoreResult<std::sync::RwLockReadGuard<'_, MemoryIndex>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn slot(&self, session_id: &str) -> SessionStoreResult<Arc<SessionSlot>> {
        self.read_index()?
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionStoreError::UnknownSession(session_id.to_string()))
    }
}

fn poisoned() -> SessionStoreError {
    SessionStoreError::Backend("memory session store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, app_name: &str, user_id: &str) -> SessionStoreResult<SessionKey> {
        self.insert_session(app_name, user_id)
    }

    async fn append(&self, session_id: &str, turn: Turn) -> SessionStoreResult<()> {
        self.push_turn(session_id, turn).map(|_| ())
    }

    async fn history(&self, session_id: &str) -> SessionStoreResult<Vec<Turn>> {
        let slot = self.slot(session_id)?;
        let turns = slot.turns.lock().map_err(|_| poisoned())?;
        Ok(turns.clone())
    }

    async fn get(&self, session_id: &str) -> SessionStoreResult<Option<SessionKey>> {
        Ok(self
            .read_index()?
            .sessions
            .get(session_id)
            .map(|slot| slot.key.clone()))
    }

    async fn list(&self, app_name: &str, user_id: &str) -> SessionStoreResult<Vec<SessionKey>> {
        let index = self.read_index()?;
        let mut matching: Vec<&Arc<SessionSlot>> = index
            .sessions
            .values()
            .filter(|slot| slot.key.app_name == app_name && slot.key.user_id == user_id)
            .collect();
        matching.sort_by_key(|slot| slot.sequence_no);
        Ok(matching.into_iter().map(|slot| slot.key.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn append_to_unknown_session_fails_without_creating_it() {
        let store = MemorySessionStore::new();
        let error = store
            .append("missing", Turn::user("hi"))
            .await
            .expect_err("unknown session should fail");
        assert!(matches!(error, SessionStoreError::UnknownSession(id) if id == "missing"));
        assert!(store.get("missing").await.expect("get").is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_generates_distinct_ids_and_list_keeps_creation_order() {
        let store = MemorySessionStore::new();
        let first = store.create("booking_planner", "user1234").await.expect("create");
        let second = store.create("booking_planner", "user1234").await.expect("create");
        let _other = store.create("booking_planner", "someone-else").await.expect("create");

        assert_ne!(first.session_id, second.session_id);
        let listed = store.list("booking_planner", "user1234").await.expect("list");
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn snapshot_restores_into_equivalent_store() {
        let store = MemorySessionStore::new();
        let key = store.create("app", "u").await.expect("create");
        store
            .append(&key.session_id, Turn::user("one"))
            .await
            .expect("append");

        let restored = MemorySessionStore::from_state(store.snapshot().expect("snapshot"));
        let history = restored.history(&key.session_id).await.expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text(), "one");
        let next = restored.create("app", "u").await.expect("create");
        assert_eq!(
            restored.list("app", "u").await.expect("list"),
            vec![key, next]
        );
    }
}
