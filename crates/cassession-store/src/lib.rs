//! Web session persistence on Cassandra/ScyllaDB.
//!
//! This crate provides a session handler that stores opaque session payloads
//! in a CQL table with:
//! - A cluster connector seam ([`ClusterConnector`]) with a `scylla`-backed
//!   implementation and an in-memory one for tests
//! - Three statements prepared once at construction (read, write, destroy)
//! - Expiry through a per-write `USING TTL`, so `gc` is a no-op
//!
//! # Example
//!
//! ```rust,ignore
//! use cassession_store::{
//!     CassandraSessionHandler, ClusterConfig, ScyllaCluster, SessionHandler, SessionOptions,
//! };
//!
//! let cluster = ScyllaCluster::build(ClusterConfig::new().with_contact_points_str("10.0.0.1,10.0.0.2"))?;
//! let options = SessionOptions::new()
//!     .with_keyspace("symfony2_sessions")
//!     .with_column_family("sessions")
//!     .with_session_lifetime(86400);
//!
//! let handler = CassandraSessionHandler::connect(&cluster, options).await?;
//! handler.write("sess-123", b"payload").await?;
//! assert_eq!(handler.read("sess-123").await?, b"payload");
//! ```

mod cluster;
mod driver;
mod error;
mod handler;
mod memory;
mod options;
mod statement;
mod value;

pub use cluster::{ClusterConfig, ClusterConnector, ContactPoints, CqlSession, Credentials};
pub use driver::{ScyllaCluster, ScyllaSession};
pub use error::{BoxError, Error, Result};
pub use handler::{CassandraSessionHandler, SessionHandler};
pub use memory::{MemoryCluster, MemorySession, MemoryStatement};
pub use options::{
    DEFAULT_DATA_FIELD, DEFAULT_ID_FIELD, DEFAULT_TIME_FIELD, ResolvedOptions, SessionOptions,
};
pub use statement::{PreparedStatements, StatementKind};
pub use value::{Row, Value};
