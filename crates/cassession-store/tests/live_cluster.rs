//! Round trip against a real Cassandra/ScyllaDB cluster.
//!
//! Ignored by default. Run with:
//!
//! ```text
//! CASSESSION_TEST_CONTACT_POINTS=127.0.0.1 cargo test -p cassession-store --test live_cluster -- --ignored
//! ```
//!
//! Expects this schema to exist:
//!
//! ```text
//! CREATE KEYSPACE test_sessions WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 1};
//! CREATE TABLE test_sessions.sessions (id blob PRIMARY KEY, data blob, time timestamp);
//! ```

use cassession_store::{
    CassandraSessionHandler, ClusterConfig, ScyllaCluster, SessionHandler, SessionOptions,
};

#[tokio::test]
#[ignore = "requires a running cluster"]
async fn test_live_round_trip() {
    let Ok(points) = std::env::var("CASSESSION_TEST_CONTACT_POINTS") else {
        eprintln!("CASSESSION_TEST_CONTACT_POINTS not set, skipping");
        return;
    };

    let cluster =
        ScyllaCluster::build(ClusterConfig::new().with_contact_points_str(&points)).unwrap();
    let options = SessionOptions::new()
        .with_keyspace("test_sessions")
        .with_column_family("sessions")
        .with_session_lifetime(60);
    let handler = CassandraSessionHandler::connect(&cluster, options)
        .await
        .unwrap();

    assert!(handler.write("sess-123", b"payload-A").await.unwrap());
    assert_eq!(handler.read("sess-123").await.unwrap(), b"payload-A");
    assert!(handler.destroy("sess-123").await.unwrap());
    assert!(handler.read("sess-123").await.unwrap().is_empty());
}
