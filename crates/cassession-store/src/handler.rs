//! Session handler backed by a CQL keyspace.

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cluster::{ClusterConnector, CqlSession};
use crate::error::{Error, Result};
use crate::options::{ResolvedOptions, SessionOptions};
use crate::statement::{PreparedStatements, StatementKind};
use crate::value::Value;

/// The session-handler contract a web session layer drives.
///
/// `read` returns an empty payload for unknown sessions; that is the
/// not-found signal, never an error.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Called when a session is opened.
    fn open(&self, _save_path: &str, _session_name: &str) -> bool {
        true
    }

    /// Called when a session is closed.
    fn close(&self) -> bool {
        true
    }

    /// Load the payload for `session_id`, or an empty payload if there is none.
    async fn read(&self, session_id: &str) -> Result<Vec<u8>>;

    /// Store `data` for `session_id`.
    async fn write(&self, session_id: &str, data: &[u8]) -> Result<bool>;

    /// Remove `session_id`.
    async fn destroy(&self, session_id: &str) -> Result<bool>;

    /// Remove sessions idle longer than `max_lifetime` seconds.
    fn gc(&self, _max_lifetime: u64) -> bool {
        true
    }
}

/// Session handler storing sessions in a Cassandra/ScyllaDB table.
///
/// Expiry is handled by the store: every write carries `USING TTL
/// <session_lifetime>`, so `gc` has nothing to do.
///
/// Construction connects and prepares all statements; a handler that exists
/// is always ready to serve. It holds no locks and can be shared behind an
/// `Arc` as long as the session type is safe for concurrent use.
pub struct CassandraSessionHandler<S: CqlSession> {
    session: S,
    statements: PreparedStatements<S::Prepared>,
    options: ResolvedOptions,
}

impl<S: CqlSession> CassandraSessionHandler<S> {
    /// Validate `options`, connect through `connector` and prepare statements.
    ///
    /// Option validation happens before the connector is touched.
    pub async fn connect<C>(connector: &C, options: SessionOptions) -> Result<Self>
    where
        C: ClusterConnector<Session = S> + ?Sized,
    {
        let options = options.resolve()?;
        let session = connector.connect(options.keyspace()).await?;
        Self::with_session(session, options).await
    }

    /// Finish a connection started with [`ClusterConnector::connect_async`].
    ///
    /// A cancelled or panicked connection task surfaces as [`Error::Join`].
    pub async fn from_pending(
        pending: JoinHandle<Result<S>>,
        options: ResolvedOptions,
    ) -> Result<Self> {
        let session = pending.await??;
        Self::with_session(session, options).await
    }

    /// Prepare statements on an already connected session.
    pub async fn with_session(session: S, options: ResolvedOptions) -> Result<Self> {
        let statements = PreparedStatements {
            read: prepare(&session, &options, StatementKind::Read).await?,
            write: prepare(&session, &options, StatementKind::Write).await?,
            destroy: prepare(&session, &options, StatementKind::Destroy).await?,
        };

        debug!(
            table = %options.qualified_table(),
            ttl = options.session_lifetime(),
            "Session handler ready"
        );

        Ok(Self {
            session,
            statements,
            options,
        })
    }

    /// The resolved options this handler was built with.
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// CQL text of a prepared statement.
    pub fn statement_text(&self, kind: StatementKind) -> String {
        kind.cql(&self.options)
    }

    /// The underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    async fn execute(&self, kind: StatementKind, values: Vec<Value>) -> Result<Vec<crate::Row>> {
        self.session
            .execute(self.statements.get(kind), values)
            .await
            .map_err(|source| Error::Execute {
                statement: kind,
                source,
            })
    }
}

async fn prepare<S: CqlSession>(
    session: &S,
    options: &ResolvedOptions,
    kind: StatementKind,
) -> Result<S::Prepared> {
    let cql = kind.cql(options);
    trace!(statement = %kind, cql = %cql, "Preparing statement");
    session
        .prepare(&cql)
        .await
        .map_err(|source| Error::Prepare {
            statement: kind,
            source,
        })
}

#[async_trait]
impl<S: CqlSession> SessionHandler for CassandraSessionHandler<S> {
    async fn read(&self, session_id: &str) -> Result<Vec<u8>> {
        debug!(session_id = %session_id, "Reading session");

        let rows = self
            .execute(
                StatementKind::Read,
                vec![Value::Blob(session_id.as_bytes().to_vec())],
            )
            .await?;

        let data = rows
            .first()
            .and_then(|row| row.get(self.options.data_field()))
            .and_then(Value::as_blob)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        trace!(session_id = %session_id, bytes = data.len(), found = !rows.is_empty(), "Session read");
        Ok(data)
    }

    async fn write(&self, session_id: &str, data: &[u8]) -> Result<bool> {
        debug!(session_id = %session_id, bytes = data.len(), "Writing session");

        self.execute(
            StatementKind::Write,
            vec![
                Value::Blob(data.to_vec()),
                Value::Timestamp(Utc::now()),
                Value::Blob(session_id.as_bytes().to_vec()),
            ],
        )
        .await?;

        Ok(true)
    }

    async fn destroy(&self, session_id: &str) -> Result<bool> {
        debug!(session_id = %session_id, "Destroying session");

        self.execute(
            StatementKind::Destroy,
            vec![Value::Blob(session_id.as_bytes().to_vec())],
        )
        .await?;

        Ok(true)
    }
}

impl<S: CqlSession> std::fmt::Debug for CassandraSessionHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CassandraSessionHandler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
