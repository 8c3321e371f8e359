//! Production connector backed by the `scylla` CQL driver.
//!
//! Works against both ScyllaDB and Apache Cassandra. Pooling, node discovery,
//! load balancing and retries are left to the driver.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::{CqlTimestamp, CqlValue, Row as DriverRow};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cluster::{ClusterConfig, ClusterConnector, ContactPoints, Credentials, CqlSession};
use crate::error::{BoxError, Error, Result};
use crate::value::{Row, Value};

/// Keepalive interval used for persistent connections.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// An immutable, built cluster handle.
#[derive(Debug, Clone)]
pub struct ScyllaCluster {
    contact_points: ContactPoints,
    credentials: Option<Credentials>,
    persistent: bool,
    debug: bool,
}

impl ScyllaCluster {
    /// Build a cluster handle. Fails if no contact points are configured.
    pub fn build(config: ClusterConfig) -> Result<Self> {
        if config.contact_points.is_empty() {
            return Err(Error::NoContactPoints);
        }

        Ok(Self {
            contact_points: config.contact_points,
            credentials: config.credentials,
            persistent: config.persistent,
            debug: config.debug,
        })
    }

    pub fn contact_points(&self) -> &ContactPoints {
        &self.contact_points
    }

    fn session_builder(&self, keyspace: &str) -> SessionBuilder {
        let mut builder = SessionBuilder::new()
            .known_nodes(self.contact_points.as_slice())
            .use_keyspace(keyspace, false);

        if self.persistent {
            builder = builder.keepalive_interval(KEEPALIVE_INTERVAL);
        }

        if let Some(ref creds) = self.credentials {
            builder = builder.user(creds.username.clone(), creds.password.clone());
        }

        builder
    }

    async fn open(&self, keyspace: &str) -> Result<ScyllaSession> {
        let session = self
            .session_builder(keyspace)
            .build()
            .await
            .map_err(|e| Error::Connect {
                keyspace: keyspace.to_string(),
                source: Box::new(e),
            })?;

        Ok(ScyllaSession { inner: session })
    }
}

#[async_trait]
impl ClusterConnector for ScyllaCluster {
    type Session = ScyllaSession;

    async fn connect(&self, keyspace: &str) -> Result<ScyllaSession> {
        if self.debug {
            debug!(keyspace = %keyspace, "Connecting this cluster instance synchronously to keyspace");
        }
        self.open(keyspace).await
    }

    fn connect_async(self: Arc<Self>, keyspace: String) -> JoinHandle<Result<ScyllaSession>> {
        if self.debug {
            debug!(keyspace = %keyspace, "Connecting this cluster instance asynchronously to keyspace");
        }
        tokio::spawn(async move { self.open(&keyspace).await })
    }
}

/// A keyspace-bound driver session.
pub struct ScyllaSession {
    inner: Session,
}

impl std::fmt::Debug for ScyllaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScyllaSession")
            .field("keyspace", &self.inner.get_keyspace())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CqlSession for ScyllaSession {
    type Prepared = PreparedStatement;

    async fn prepare(&self, cql: &str) -> std::result::Result<PreparedStatement, BoxError> {
        Ok(self.inner.prepare(cql).await?)
    }

    async fn execute(
        &self,
        statement: &PreparedStatement,
        values: Vec<Value>,
    ) -> std::result::Result<Vec<Row>, BoxError> {
        let values: Vec<CqlValue> = values.into_iter().map(to_driver_value).collect();
        let result = self.inner.execute_unpaged(statement, values).await?;

        if !result.is_rows() {
            return Ok(Vec::new());
        }

        let rows_result = result.into_rows_result()?;
        let names: Vec<String> = rows_result
            .column_specs()
            .iter()
            .map(|spec| spec.name().to_string())
            .collect();

        let mut rows = Vec::new();
        for driver_row in rows_result.rows::<DriverRow>()? {
            let driver_row = driver_row?;
            let row = names
                .iter()
                .zip(driver_row.columns)
                .fold(Row::new(), |row, (name, value)| {
                    row.with_column(name.clone(), value.and_then(from_driver_value))
                });
            rows.push(row);
        }

        Ok(rows)
    }
}

fn to_driver_value(value: Value) -> CqlValue {
    match value {
        Value::Blob(bytes) => CqlValue::Blob(bytes),
        Value::Timestamp(ts) => CqlValue::Timestamp(CqlTimestamp(ts.timestamp_millis())),
        Value::Text(text) => CqlValue::Text(text),
    }
}

/// Map a driver value onto the subset the handler understands.
fn from_driver_value(value: CqlValue) -> Option<Value> {
    match value {
        CqlValue::Blob(bytes) => Some(Value::Blob(bytes)),
        CqlValue::Text(text) | CqlValue::Ascii(text) => Some(Value::Text(text)),
        CqlValue::Timestamp(CqlTimestamp(millis)) => {
            DateTime::from_timestamp_millis(millis).map(Value::Timestamp)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_build_requires_contact_points() {
        let err = ScyllaCluster::build(ClusterConfig::new().with_contact_points_str(" , ")).unwrap_err();
        assert!(matches!(err, Error::NoContactPoints));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_keeps_normalized_points() {
        let cluster =
            ScyllaCluster::build(ClusterConfig::new().with_contact_points_str("127.0.0.1, 127.0.0.2"))
                .unwrap();
        assert_eq!(cluster.contact_points().as_slice(), ["127.0.0.1", "127.0.0.2"]);
    }

    #[test]
    fn test_value_conversion() {
        let now = DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap();

        assert_eq!(
            to_driver_value(Value::Blob(vec![7, 8])),
            CqlValue::Blob(vec![7, 8])
        );
        assert_eq!(
            from_driver_value(to_driver_value(Value::Timestamp(now))),
            Some(Value::Timestamp(now))
        );
        assert_eq!(from_driver_value(CqlValue::Int(3)), None);
    }
}
