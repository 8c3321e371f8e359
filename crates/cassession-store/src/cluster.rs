//! Cluster configuration and the connector/session seams.
//!
//! The handler never talks to a driver directly. It asks a
//! [`ClusterConnector`] for a keyspace-bound [`CqlSession`] once, prepares its
//! statements on it and then executes against it for its whole lifetime.
//! [`ScyllaCluster`](crate::ScyllaCluster) is the production connector;
//! [`MemoryCluster`](crate::MemoryCluster) stands in for tests.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::{BoxError, Result};
use crate::value::{Row, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Seams
// ─────────────────────────────────────────────────────────────────────────────

/// A live, keyspace-bound connection able to prepare and execute CQL.
///
/// Implementations are expected to be safe for concurrent use; the handler
/// holds no locks around them.
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// Driver-side handle for a prepared statement.
    type Prepared: Send + Sync;

    /// Prepare a statement.
    async fn prepare(&self, cql: &str) -> std::result::Result<Self::Prepared, BoxError>;

    /// Execute a prepared statement with positional values.
    ///
    /// Statements that produce no rows return an empty vec.
    async fn execute(
        &self,
        statement: &Self::Prepared,
        values: Vec<Value>,
    ) -> std::result::Result<Vec<Row>, BoxError>;
}

/// Produces keyspace-bound sessions from a cluster.
///
/// Implement this to plug in custom discovery or a pre-built driver session.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    type Session: CqlSession + 'static;

    /// Connect to `keyspace`, resolving once the session is usable.
    async fn connect(&self, keyspace: &str) -> Result<Self::Session>;

    /// Start connecting in the background.
    ///
    /// The connection attempt begins immediately on the current tokio runtime;
    /// the caller awaits the returned handle to collect the session.
    fn connect_async(self: Arc<Self>, keyspace: String) -> JoinHandle<Result<Self::Session>>
    where
        Self: 'static,
    {
        tokio::spawn(async move { self.connect(&keyspace).await })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cluster configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, deduplicated list of cluster contact points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPoints(Vec<String>);

impl ContactPoints {
    /// Parse a comma-separated host list, e.g. `"10.0.0.1, 10.0.0.2"`.
    pub fn parse(list: &str) -> Self {
        Self::from_iter(list.split(','))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn push(&mut self, host: &str) {
        let host = host.trim();
        if !host.is_empty() && !self.0.iter().any(|h| h == host) {
            self.0.push(host.to_string());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for ContactPoints {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut points = ContactPoints::default();
        for host in iter {
            points.push(host.as_ref());
        }
        points
    }
}

impl fmt::Display for ContactPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// Username/password pair for cluster authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cluster-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Hosts used to discover the rest of the cluster.
    pub contact_points: ContactPoints,

    /// Optional authentication.
    pub credentials: Option<Credentials>,

    /// Keep connections alive between requests.
    pub persistent: bool,

    /// Emit connector debug logs.
    pub debug: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            contact_points: ContactPoints::default(),
            credentials: None,
            persistent: true,
            debug: false,
        }
    }
}

impl ClusterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set contact points from a sequence of hosts.
    pub fn with_contact_points<S: AsRef<str>>(mut self, hosts: impl IntoIterator<Item = S>) -> Self {
        self.contact_points = hosts.into_iter().collect();
        self
    }

    /// Set contact points from a comma-separated string.
    pub fn with_contact_points_str(mut self, hosts: &str) -> Self {
        self.contact_points = ContactPoints::parse(hosts);
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_dedups() {
        let points = ContactPoints::parse(" 10.0.0.1 ,10.0.0.2,, 10.0.0.1 ,node-3 ");
        assert_eq!(points.as_slice(), ["10.0.0.1", "10.0.0.2", "node-3"]);
        assert_eq!(points.to_string(), "10.0.0.1,10.0.0.2,node-3");
    }

    #[test]
    fn test_sequence_preserves_order() {
        let config = ClusterConfig::new().with_contact_points(["b", " a", "b ", "c"]);
        assert_eq!(config.contact_points.as_slice(), ["b", "a", "c"]);
    }

    #[test]
    fn test_blank_list_is_empty() {
        assert!(ContactPoints::parse(" , ,").is_empty());
        assert!(ContactPoints::parse("").is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::default();
        assert!(config.persistent);
        assert!(!config.debug);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let config = ClusterConfig::new().with_credentials("cassandra", "hunter2");
        let printed = format!("{:?}", config);
        assert!(printed.contains("cassandra"));
        assert!(!printed.contains("hunter2"));
    }
}
