//! Service-level tests: append / verify / tamper detection / pagination.
//!
//! Each test gets its own RocksDB in a scratch directory.

use log_server::ledger::LogQuery;
use log_server::{AppError, Config, ServerState};

// TempDir first so the database handle drops before its directory goes away
async fn test_state() -> (tempfile::TempDir, ServerState) {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(tmp.path().to_string_lossy().to_string(), 0);
    let state = ServerState::initialize(&config).await;
    (tmp, state)
}

#[tokio::test]
async fn test_append_then_verify_is_valid() {
    let (_tmp, state) = test_state().await;

    let entry = state
        .logs
        .append("alice", "SELECT * FROM users", "SUCCESS")
        .await
        .unwrap();

    assert_eq!(entry.user_id, "alice");
    assert_eq!(entry.hash.len(), 64);
    assert!(entry.timestamp.ends_with('Z'));

    let verification = state.verifier.verify(entry.id).await.unwrap();
    assert!(verification.valid);
    assert!(verification.verification_token.is_some());
    assert!(verification.error.is_none());
}

#[tokio::test]
async fn test_out_of_band_tamper_is_detected() {
    let (_tmp, state) = test_state().await;

    let entry = state
        .logs
        .append("alice", "SELECT 1", "SUCCESS")
        .await
        .unwrap();
    assert!(state.verifier.verify(entry.id).await.unwrap().valid);

    // 绕过公开契约直接改库，模拟带外篡改
    state
        .db
        .query("UPDATE log_entry SET status = 'ERROR' WHERE entry_id = $id")
        .bind(("id", entry.id))
        .await
        .unwrap()
        .check()
        .unwrap();

    // get 仍然成功 — 篡改检测是 verify 的事
    let stored = state.storage.get(entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "ERROR");

    let verification = state.verifier.verify(entry.id).await.unwrap();
    assert!(!verification.valid);
    assert!(verification.verification_token.is_none());
    assert!(verification.error.is_some());
}

#[tokio::test]
async fn test_verify_unknown_id_is_not_found() {
    let (_tmp, state) = test_state().await;

    let result = state.verifier.verify(123_456_789).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_empty_fields_are_rejected() {
    let (_tmp, state) = test_state().await;

    for (user_id, query, status) in [
        ("", "SELECT 1", "SUCCESS"),
        ("alice", "", "SUCCESS"),
        ("alice", "SELECT 1", ""),
        ("   ", "SELECT 1", "SUCCESS"),
    ] {
        let result = state.logs.append(user_id, query, status).await;
        assert!(
            matches!(result, Err(AppError::Validation(_))),
            "expected validation error for ({user_id:?}, {query:?}, {status:?})"
        );
    }

    // nothing got persisted
    assert_eq!(state.storage.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_filters_and_orders_newest_first() {
    let (_tmp, state) = test_state().await;

    // 20 entries for "a" interleaved with 5 for "b"
    for i in 0..20 {
        state
            .logs
            .append("a", &format!("SELECT {i}"), "SUCCESS")
            .await
            .unwrap();
        if i % 4 == 0 {
            state
                .logs
                .append("b", &format!("INSERT {i}"), "SUCCESS")
                .await
                .unwrap();
        }
    }

    let q = LogQuery {
        user_id: Some("a".into()),
        limit: 5,
        ..Default::default()
    };
    let page = state.storage.list(&q).await.unwrap();
    assert_eq!(page.len(), 5);
    assert!(page.iter().all(|e| e.user_id == "a"));
    assert!(
        page.windows(2).all(|w| w[0].id > w[1].id),
        "entries must be in strictly decreasing id order"
    );

    // offset past the end yields an empty page, not an error
    let q = LogQuery {
        user_id: Some("a".into()),
        limit: 5,
        offset: 100,
        ..Default::default()
    };
    assert!(state.storage.list(&q).await.unwrap().is_empty());

    // unfiltered default limit covers everything written here
    let all = state.storage.list(&LogQuery::default()).await.unwrap();
    assert_eq!(all.len(), 25);
    assert_eq!(state.storage.count(Some("b")).await.unwrap(), 5);
}

#[tokio::test]
async fn test_seek_pagination_never_skips_or_repeats() {
    let (_tmp, state) = test_state().await;

    for i in 0..30 {
        state
            .logs
            .append("a", &format!("SELECT {i}"), "SUCCESS")
            .await
            .unwrap();
    }

    let first = state
        .storage
        .list(&LogQuery {
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first.len(), 10);

    // 并发写入会让 offset 窗口漂移；before 锚点不受影响
    state.logs.append("a", "SELECT new", "SUCCESS").await.unwrap();

    let second = state
        .storage
        .list(&LogQuery {
            limit: 10,
            before: Some(first.last().unwrap().id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second.len(), 10);

    let first_ids: Vec<i64> = first.iter().map(|e| e.id).collect();
    for e in &second {
        assert!(!first_ids.contains(&e.id), "page overlap at id {}", e.id);
        assert!(e.id < *first_ids.last().unwrap());
    }
}

#[tokio::test]
async fn test_concurrent_appends_produce_distinct_ids() {
    let (_tmp, state) = test_state().await;

    let mut handles = Vec::new();
    for t in 0..8 {
        let logs = state.logs.clone();
        handles.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for i in 0..5 {
                let entry = logs
                    .append(&format!("user_{t}"), &format!("SELECT {i}"), "SUCCESS")
                    .await
                    .unwrap();
                ids.push(entry.id);
            }
            ids
        }));
    }

    let mut seen = std::collections::HashSet::new();
    for h in handles {
        for id in h.await.unwrap() {
            assert!(seen.insert(id), "duplicate id {}", id);
        }
    }
    assert_eq!(seen.len(), 40);
    assert_eq!(state.storage.count(None).await.unwrap(), 40);
}

#[tokio::test]
async fn test_snapshot_window_semantics() {
    let (_tmp, state) = test_state().await;

    for i in 0..50 {
        state
            .logs
            .append("a", &format!("SELECT {i}"), "SUCCESS")
            .await
            .unwrap();
    }

    // a snapshot with limit=10 against 50 matching entries is exactly 10 logs
    let q = LogQuery {
        user_id: Some("a".into()),
        limit: 10,
        ..Default::default()
    };
    assert_eq!(state.storage.list(&q).await.unwrap().len(), 10);
}
