use concierge_sessions::{
    FsSessionStore, MemorySessionStore, SessionStore, SessionStoreError, Turn, TurnRole,
};
use std::sync::Arc;

fn stores(tmp: &tempfile::TempDir) -> Vec<(&'static str, Arc<dyn SessionStore>)> {
    vec![
        ("memory", Arc::new(MemorySessionStore::new())),
        (
            "fs",
            Arc::new(FsSessionStore::new(tmp.path()).expect("fs store should initialize")),
        ),
    ]
}

#[tokio::test(flavor = "current_thread")]
async fn history_returns_exactly_the_appended_turns_in_call_order() {
    let tmp = tempfile::tempdir().expect("tempdir");
    for (label, store) in stores(&tmp) {
        let key = store.create("app", "user").await.expect("create");
        for index in 0..7 {
            let turn = if index % 2 == 0 {
                Turn::user(format!("user-{index}"))
            } else {
                Turn::agent_text("Coordinator", format!("agent-{index}"))
            };
            store.append(&key.session_id, turn).await.expect("append");
        }

        let history = store.history(&key.session_id).await.expect("history");
        assert_eq!(history.len(), 7, "{label}");
        for (index, turn) in history.iter().enumerate() {
            let expected_role = if index % 2 == 0 {
                TurnRole::User
            } else {
                TurnRole::Agent
            };
            assert_eq!(turn.role, expected_role, "{label}");
            assert!(turn.text().ends_with(&format!("-{index}")), "{label}");
        }
    }
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_session_is_reported_by_every_backend() {
    let tmp = tempfile::tempdir().expect("tempdir");
    for (label, store) in stores(&tmp) {
        let append = store.append("nope", Turn::user("x")).await;
        assert!(
            matches!(append, Err(SessionStoreError::UnknownSession(_))),
            "{label}"
        );
        let history = store.history("nope").await;
        assert!(
            matches!(history, Err(SessionStoreError::UnknownSession(_))),
            "{label}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_on_one_session_lose_no_updates() {
    let tmp = tempfile::tempdir().expect("tempdir");
    for (label, store) in stores(&tmp) {
        let key = store.create("app", "user").await.expect("create");
        let writers = 8;
        let per_writer = 25;

        let tasks = (0..writers).map(|writer| {
            let store = store.clone();
            let session_id = key.session_id.clone();
            tokio::spawn(async move {
                for index in 0..per_writer {
                    store
                        .append(&session_id, Turn::user(format!("{writer}:{index}")))
                        .await
                        .expect("append");
                }
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.expect("writer task should not panic");
        }

        let history = store.history(&key.session_id).await.expect("history");
        assert_eq!(history.len(), writers * per_writer, "{label}");

        for writer in 0..writers {
            let own: Vec<String> = history
                .iter()
                .map(Turn::text)
                .filter(|text| text.starts_with(&format!("{writer}:")))
                .collect();
            let expected: Vec<String> = (0..per_writer).map(|i| format!("{writer}:{i}")).collect();
            assert_eq!(own, expected, "{label}: per-writer order must hold");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_are_independent() {
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let a = store.create("app", "alice").await.expect("create");
    let b = store.create("app", "bob").await.expect("create");

    store.append(&a.session_id, Turn::user("a1")).await.expect("append");
    store.append(&b.session_id, Turn::user("b1")).await.expect("append");
    store.append(&a.session_id, Turn::user("a2")).await.expect("append");

    assert_eq!(store.history(&a.session_id).await.expect("history").len(), 2);
    assert_eq!(store.history(&b.session_id).await.expect("history").len(), 1);
    assert_eq!(store.list("app", "bob").await.expect("list"), vec![b]);
}
