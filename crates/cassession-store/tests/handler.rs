//! Session handler behavior against the in-memory cluster.

use std::sync::Arc;
use std::time::Duration;

use cassession_store::{
    CassandraSessionHandler, ClusterConnector, Error, MemoryCluster, MemorySession,
    SessionHandler, SessionOptions, StatementKind, Value,
};

type Handler = CassandraSessionHandler<MemorySession>;

fn options(lifetime: u32) -> SessionOptions {
    SessionOptions::new()
        .with_keyspace("test_sessions")
        .with_column_family("sessions")
        .with_session_lifetime(lifetime)
}

fn cluster() -> MemoryCluster {
    MemoryCluster::new().with_session_table("test_sessions", "sessions")
}

async fn handler(cluster: &MemoryCluster) -> Handler {
    CassandraSessionHandler::connect(cluster, options(60))
        .await
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_construction_prepares_three_statements() {
    let cluster = cluster();
    let _handler = handler(&cluster).await;

    assert_eq!(cluster.connect_calls(), 1);
    assert_eq!(
        cluster.prepared_statements(),
        vec![
            "SELECT data FROM test_sessions.sessions WHERE id = ?",
            "UPDATE test_sessions.sessions USING TTL 60 SET data = ?, time = ? WHERE id = ?",
            "DELETE FROM test_sessions.sessions WHERE id = ?",
        ]
    );
}

#[tokio::test]
async fn test_missing_options_fail_before_connecting() {
    let cluster = cluster();

    let incomplete = [
        SessionOptions::new()
            .with_column_family("sessions")
            .with_session_lifetime(60),
        SessionOptions::new()
            .with_keyspace("test_sessions")
            .with_session_lifetime(60),
        SessionOptions::new()
            .with_keyspace("test_sessions")
            .with_column_family("sessions"),
    ];

    for opts in incomplete {
        let err = CassandraSessionHandler::connect(&cluster, opts)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingOption(_)), "got {err:?}");
        assert!(err.is_configuration());
    }

    assert_eq!(cluster.connect_calls(), 0);
}

#[tokio::test]
async fn test_unknown_keyspace_is_connect_error() {
    let cluster = MemoryCluster::new();
    let err = CassandraSessionHandler::connect(&cluster, options(60))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connect { ref keyspace, .. } if keyspace == "test_sessions"));
}

#[tokio::test]
async fn test_missing_table_fails_preparation() {
    let cluster = MemoryCluster::new().with_keyspace("test_sessions");
    let err = CassandraSessionHandler::connect(&cluster, options(60))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Prepare {
            statement: StatementKind::Read,
            ..
        }
    ));
    assert!(cluster.prepared_statements().is_empty());
}

#[tokio::test]
async fn test_missing_time_column_fails_preparation() {
    let cluster =
        MemoryCluster::new().with_table("test_sessions", "sessions", "id", &["data"]);
    let err = CassandraSessionHandler::connect(&cluster, options(60))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Prepare {
            statement: StatementKind::Write,
            ..
        }
    ));
}

#[tokio::test]
async fn test_custom_field_names() {
    let cluster = MemoryCluster::new().with_table(
        "app",
        "web_sessions",
        "sid",
        &["payload", "written_at"],
    );
    let opts = SessionOptions::new()
        .with_keyspace("app")
        .with_column_family("web_sessions")
        .with_session_lifetime(120)
        .with_id_field("sid")
        .with_data_field("payload")
        .with_time_field("written_at");

    let handler = CassandraSessionHandler::connect(&cluster, opts).await.unwrap();
    assert_eq!(
        handler.statement_text(StatementKind::Read),
        "SELECT payload FROM app.web_sessions WHERE sid = ?"
    );

    handler.write("abc", b"custom").await.unwrap();
    assert_eq!(handler.read("abc").await.unwrap(), b"custom");
}

#[tokio::test]
async fn test_mixed_case_field_names_round_trip() {
    let cluster = MemoryCluster::new().with_table("app", "sessions", "sid", &["payload", "time"]);
    let opts = SessionOptions::new()
        .with_keyspace("App")
        .with_column_family("Sessions")
        .with_session_lifetime(60)
        .with_id_field("SID")
        .with_data_field("Payload");

    let handler = CassandraSessionHandler::connect(&cluster, opts).await.unwrap();
    assert_eq!(
        handler.statement_text(StatementKind::Read),
        "SELECT payload FROM app.sessions WHERE sid = ?"
    );

    handler.write("sess-123", b"payload-A").await.unwrap();
    assert_eq!(handler.read("sess-123").await.unwrap(), b"payload-A");
}

#[tokio::test]
async fn test_connect_async_resolves_session() {
    let cluster = Arc::new(cluster());
    let pending = Arc::clone(&cluster).connect_async("test_sessions".to_string());

    let resolved = options(60).resolve().unwrap();
    let handler = CassandraSessionHandler::from_pending(pending, resolved)
        .await
        .unwrap();

    assert!(handler.write("async", b"ok").await.unwrap());
    assert_eq!(cluster.connect_calls(), 1);
}

#[tokio::test]
async fn test_cancelled_connect_async_is_join_error() {
    let cluster = Arc::new(cluster());
    let pending = Arc::clone(&cluster).connect_async("test_sessions".to_string());
    pending.abort();

    let resolved = options(60).resolve().unwrap();
    let err = Handler::from_pending(pending, resolved).await.unwrap_err();
    assert!(matches!(err, Error::Join(ref join) if join.is_cancelled()), "got {err:?}");
    assert_eq!(cluster.connect_calls(), 0);
}

#[tokio::test]
async fn test_connect_async_unknown_keyspace() {
    let cluster = Arc::new(MemoryCluster::new());
    let pending = Arc::clone(&cluster).connect_async("missing".to_string());

    let resolved = options(60).resolve().unwrap();
    let err = Handler::from_pending(pending, resolved).await.unwrap_err();
    assert!(matches!(err, Error::Connect { .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_read_destroy_scenario() {
    let cluster = cluster();
    let handler = handler(&cluster).await;

    assert!(handler.write("sess-123", b"payload-A").await.unwrap());
    assert_eq!(handler.read("sess-123").await.unwrap(), b"payload-A");

    assert!(handler.destroy("sess-123").await.unwrap());
    assert_eq!(handler.read("sess-123").await.unwrap(), b"");
}

#[tokio::test]
async fn test_read_unknown_session_is_empty() {
    let cluster = cluster();
    let handler = handler(&cluster).await;

    assert!(handler.read("never-written").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sessions_do_not_cross_contaminate() {
    let cluster = cluster();
    let handler = handler(&cluster).await;

    handler.write("a", b"X").await.unwrap();
    handler.write("b", b"Y").await.unwrap();

    assert_eq!(handler.read("a").await.unwrap(), b"X");
    assert_eq!(handler.read("b").await.unwrap(), b"Y");
}

#[tokio::test]
async fn test_overwrite_replaces_payload() {
    let cluster = cluster();
    let handler = handler(&cluster).await;

    handler.write("sess", b"first").await.unwrap();
    handler.write("sess", b"second").await.unwrap();

    assert_eq!(handler.read("sess").await.unwrap(), b"second");
    assert_eq!(cluster.live_rows("test_sessions", "sessions"), 1);
}

#[tokio::test]
async fn test_binary_payload_round_trips() {
    let cluster = cluster();
    let handler = handler(&cluster).await;
    let payload: Vec<u8> = (0..=255).collect();

    handler.write("bin", &payload).await.unwrap();
    assert_eq!(handler.read("bin").await.unwrap(), payload);
}

#[tokio::test]
async fn test_destroy_unknown_session_succeeds() {
    let cluster = cluster();
    let handler = handler(&cluster).await;

    assert!(handler.destroy("ghost").await.unwrap());
}

#[tokio::test]
async fn test_non_blob_data_reads_as_empty() {
    let cluster = cluster();
    let handler = handler(&cluster).await;

    cluster.put(
        "test_sessions",
        "sessions",
        b"odd",
        "data",
        Value::Text("not a blob".into()),
    );

    assert!(handler.read("odd").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lifecycle_hooks_and_gc_are_noops() {
    let cluster = cluster();
    let handler = handler(&cluster).await;

    handler.write("live", b"still-here").await.unwrap();

    assert!(handler.open("/tmp", "PHPSESSID"));
    assert!(handler.gc(0));
    assert!(handler.gc(u64::MAX));
    assert!(handler.close());

    assert_eq!(handler.read("live").await.unwrap(), b"still-here");
}

#[tokio::test]
async fn test_execution_failure_propagates() {
    let cluster = cluster();
    let handler = handler(&cluster).await;
    cluster.fail_executions("Operation timed out");

    let err = handler.write("x", b"y").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Execute {
            statement: StatementKind::Write,
            ..
        }
    ));
    assert!(err.to_string().contains("timed out"));

    assert!(matches!(
        handler.read("x").await,
        Err(Error::Execute {
            statement: StatementKind::Read,
            ..
        })
    ));
    assert!(matches!(
        handler.destroy("x").await,
        Err(Error::Execute {
            statement: StatementKind::Destroy,
            ..
        })
    ));

    cluster.clear_failures();
    assert!(handler.read("x").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_handlers_share_cluster_data() {
    let cluster = cluster();
    let writer = handler(&cluster).await;
    let reader = handler(&cluster).await;

    writer.write("shared", b"value").await.unwrap();
    assert_eq!(reader.read("shared").await.unwrap(), b"value");
    assert_eq!(cluster.connect_calls(), 2);
}

#[tokio::test]
async fn test_concurrent_writes_from_shared_handler() {
    let cluster = cluster();
    let handler = Arc::new(handler(&cluster).await);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let handler = Arc::clone(&handler);
        tasks.push(tokio::spawn(async move {
            let id = format!("sess-{i}");
            handler.write(&id, id.as_bytes()).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for i in 0..16 {
        let id = format!("sess-{i}");
        assert_eq!(handler.read(&id).await.unwrap(), id.as_bytes());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expiry
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_rows_expire_after_session_lifetime() {
    let cluster = cluster();
    let handler = CassandraSessionHandler::connect(&cluster, options(2))
        .await
        .unwrap();

    handler.write("short", b"lived").await.unwrap();

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(handler.read("short").await.unwrap(), b"lived");

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(handler.read("short").await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rewrite_extends_lifetime() {
    let cluster = cluster();
    let handler = CassandraSessionHandler::connect(&cluster, options(2))
        .await
        .unwrap();

    handler.write("sess", b"v1").await.unwrap();
    tokio::time::advance(Duration::from_millis(1500)).await;
    handler.write("sess", b"v2").await.unwrap();
    tokio::time::advance(Duration::from_millis(1500)).await;

    assert_eq!(handler.read("sess").await.unwrap(), b"v2");
}
