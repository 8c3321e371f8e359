//! In-memory cluster for tests and local development.
//!
//! Understands exactly the statement shapes the handler prepares:
//! single-key `SELECT`, `UPDATE ... USING TTL ... SET` and `DELETE`. Tables
//! must be declared up front, so preparing against a missing table or column
//! fails the way a real cluster would. Identifiers are unquoted, so they fold
//! to lowercase like on a server. Cell TTLs use tokio's clock, so paused time
//! in tests (`tokio::time::advance`) expires rows without sleeping. Rows whose
//! cells have all expired are dropped the next time their key is touched.
//!
//! Every clone shares the same data, and connection attempts are counted.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::cluster::{ClusterConnector, CqlSession};
use crate::error::{BoxError, Error, Result};
use crate::value::{Row, Value};

/// A stored cell with its optional expiry deadline.
#[derive(Debug, Clone)]
struct Cell {
    value: Value,
    expires_at: Option<Instant>,
}

impl Cell {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

#[derive(Debug, Default)]
struct Table {
    key_column: String,
    columns: HashSet<String>,
    rows: HashMap<Vec<u8>, HashMap<String, Cell>>,
}

impl Table {
    fn live_row(&self, key: &[u8], now: Instant) -> Option<&HashMap<String, Cell>> {
        self.rows
            .get(key)
            .filter(|cells| cells.values().any(|cell| cell.is_live(now)))
    }

    /// Drop the row at `key` if none of its cells are live.
    fn purge(&mut self, key: &[u8], now: Instant) {
        if self.rows.contains_key(key) && self.live_row(key, now).is_none() {
            self.rows.remove(key);
        }
    }
}

fn table_key(keyspace: &str, table: &str) -> String {
    format!("{keyspace}.{table}").to_ascii_lowercase()
}

#[derive(Debug, Default)]
struct ClusterState {
    keyspaces: HashSet<String>,
    tables: HashMap<String, Table>,
    connect_calls: usize,
    prepared: Vec<String>,
    execute_failure: Option<String>,
}

/// In-memory stand-in for a cluster.
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MemoryCluster {
    /// Create a cluster with no keyspaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table (and its keyspace) with a blob key column.
    pub fn with_table(
        self,
        keyspace: &str,
        table: &str,
        key_column: &str,
        columns: &[&str],
    ) -> Self {
        {
            let mut state = self.state.lock();
            state.keyspaces.insert(keyspace.to_ascii_lowercase());
            state.tables.insert(
                table_key(keyspace, table),
                Table {
                    key_column: key_column.to_ascii_lowercase(),
                    columns: columns.iter().map(|c| c.to_ascii_lowercase()).collect(),
                    rows: HashMap::new(),
                },
            );
        }
        self
    }

    /// Declare a table with the default `id`/`data`/`time` layout.
    pub fn with_session_table(self, keyspace: &str, table: &str) -> Self {
        self.with_table(keyspace, table, "id", &["data", "time"])
    }

    /// Declare an empty keyspace.
    pub fn with_keyspace(self, keyspace: &str) -> Self {
        self.state.lock().keyspaces.insert(keyspace.to_ascii_lowercase());
        self
    }

    /// Number of connection attempts made against this cluster.
    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }

    /// CQL text of every statement prepared so far, in order.
    pub fn prepared_statements(&self) -> Vec<String> {
        self.state.lock().prepared.clone()
    }

    /// Make every subsequent execution fail with `message`.
    pub fn fail_executions(&self, message: impl Into<String>) {
        self.state.lock().execute_failure = Some(message.into());
    }

    /// Stop failing executions.
    pub fn clear_failures(&self) {
        self.state.lock().execute_failure = None;
    }

    /// Write a cell directly, without TTL.
    pub fn put(&self, keyspace: &str, table: &str, key: &[u8], column: &str, value: Value) {
        let mut state = self.state.lock();
        if let Some(table) = state.tables.get_mut(&table_key(keyspace, table)) {
            table.rows.entry(key.to_vec()).or_default().insert(
                column.to_ascii_lowercase(),
                Cell {
                    value,
                    expires_at: None,
                },
            );
        }
    }

    /// Number of rows with at least one live cell.
    pub fn live_rows(&self, keyspace: &str, table: &str) -> usize {
        let now = Instant::now();
        let state = self.state.lock();
        state
            .tables
            .get(&table_key(keyspace, table))
            .map(|t| {
                t.rows
                    .keys()
                    .filter(|key| t.live_row(key, now).is_some())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Number of stored rows, including ones whose cells have all expired.
    pub fn stored_rows(&self, keyspace: &str, table: &str) -> usize {
        self.state
            .lock()
            .tables
            .get(&table_key(keyspace, table))
            .map_or(0, |t| t.rows.len())
    }
}

#[async_trait]
impl ClusterConnector for MemoryCluster {
    type Session = MemorySession;

    async fn connect(&self, keyspace: &str) -> Result<MemorySession> {
        let mut state = self.state.lock();
        state.connect_calls += 1;

        let keyspace = keyspace.to_ascii_lowercase();
        if !state.keyspaces.contains(&keyspace) {
            return Err(Error::Connect {
                source: format!("Keyspace '{keyspace}' does not exist").into(),
                keyspace,
            });
        }

        Ok(MemorySession {
            state: Arc::clone(&self.state),
            keyspace,
        })
    }
}

/// Parsed form of one of the supported statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryStatement {
    Select {
        table: String,
        columns: Vec<String>,
    },
    Update {
        table: String,
        ttl: Option<u32>,
        columns: Vec<String>,
    },
    Delete {
        table: String,
    },
}

impl MemoryStatement {
    fn table(&self) -> &str {
        match self {
            MemoryStatement::Select { table, .. }
            | MemoryStatement::Update { table, .. }
            | MemoryStatement::Delete { table } => table,
        }
    }

    /// Number of `?` markers the statement binds.
    fn markers(&self) -> usize {
        match self {
            MemoryStatement::Update { columns, .. } => columns.len() + 1,
            _ => 1,
        }
    }
}

/// Session on a [`MemoryCluster`].
#[derive(Debug)]
pub struct MemorySession {
    state: Arc<Mutex<ClusterState>>,
    keyspace: String,
}

#[async_trait]
impl CqlSession for MemorySession {
    type Prepared = MemoryStatement;

    async fn prepare(&self, cql: &str) -> std::result::Result<MemoryStatement, BoxError> {
        let (statement, key_column) = parse(cql, &self.keyspace)?;

        let mut state = self.state.lock();
        let table = state
            .tables
            .get(statement.table())
            .ok_or_else(|| format!("unconfigured table {}", statement.table()))?;

        if table.key_column != key_column {
            return Err(format!("Undefined primary key column {key_column}").into());
        }
        let columns = match &statement {
            MemoryStatement::Select { columns, .. } | MemoryStatement::Update { columns, .. } => {
                columns.as_slice()
            }
            MemoryStatement::Delete { .. } => &[],
        };
        if let Some(unknown) = columns.iter().find(|c| !table.columns.contains(*c)) {
            return Err(format!("Undefined column name {unknown}").into());
        }

        state.prepared.push(cql.to_string());
        Ok(statement)
    }

    async fn execute(
        &self,
        statement: &MemoryStatement,
        values: Vec<Value>,
    ) -> std::result::Result<Vec<Row>, BoxError> {
        let now = Instant::now();
        let mut state = self.state.lock();

        if let Some(ref message) = state.execute_failure {
            return Err(message.clone().into());
        }
        if values.len() != statement.markers() {
            return Err(format!(
                "expected {} bound values, got {}",
                statement.markers(),
                values.len()
            )
            .into());
        }

        let mut values = values;
        let key = match values.pop() {
            Some(Value::Blob(key)) => key,
            other => return Err(format!("primary key must be a blob, got {other:?}").into()),
        };

        let table = state
            .tables
            .get_mut(statement.table())
            .ok_or_else(|| format!("unconfigured table {}", statement.table()))?;
        table.purge(&key, now);

        match statement {
            MemoryStatement::Select { columns, .. } => {
                let Some(cells) = table.live_row(&key, now) else {
                    return Ok(Vec::new());
                };
                let row = columns.iter().fold(Row::new(), |row, column| {
                    let value = cells
                        .get(column)
                        .filter(|cell| cell.is_live(now))
                        .map(|cell| cell.value.clone());
                    row.with_column(column.clone(), value)
                });
                Ok(vec![row])
            }
            MemoryStatement::Update { ttl, columns, .. } => {
                let expires_at = ttl.map(|secs| now + Duration::from_secs(u64::from(secs)));
                let cells = table.rows.entry(key).or_default();
                for (column, value) in columns.iter().zip(values) {
                    cells.insert(column.clone(), Cell { value, expires_at });
                }
                trace!(table = %statement.table(), ttl = ?ttl, "Memory row updated");
                Ok(Vec::new())
            }
            MemoryStatement::Delete { .. } => {
                table.rows.remove(&key);
                Ok(Vec::new())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

struct Tokens {
    tokens: Vec<String>,
    pos: usize,
}

impl Tokens {
    fn new(cql: &str) -> Self {
        let spaced = cql
            .to_ascii_lowercase()
            .replace(',', " , ")
            .replace('=', " = ");
        Self {
            tokens: spaced.split_whitespace().map(str::to_string).collect(),
            pos: 0,
        }
    }

    fn advance(&mut self) -> std::result::Result<String, String> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| "unexpected end of statement".to_string())?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_is(&self, keyword: &str) -> bool {
        self.tokens
            .get(self.pos)
            .is_some_and(|t| t.eq_ignore_ascii_case(keyword))
    }

    fn expect(&mut self, keyword: &str) -> std::result::Result<(), String> {
        let token = self.advance()?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(format!("expected {keyword}, found {token}"))
        }
    }

    fn finish(&self) -> std::result::Result<(), String> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(extra) => Err(format!("unexpected trailing input at {extra}")),
        }
    }
}

/// Parse a statement, returning it with the column used in its `WHERE` clause.
fn parse(cql: &str, keyspace: &str) -> std::result::Result<(MemoryStatement, String), String> {
    let mut tokens = Tokens::new(cql);
    let qualify = |table: String| {
        if table.contains('.') {
            table
        } else {
            format!("{keyspace}.{table}")
        }
    };

    let verb = tokens.advance()?.to_ascii_uppercase();
    let statement = match verb.as_str() {
        "SELECT" => {
            let mut columns = Vec::new();
            while !tokens.peek_is("FROM") {
                let column = tokens.advance()?;
                if column != "," {
                    columns.push(column);
                }
            }
            tokens.expect("FROM")?;
            MemoryStatement::Select {
                table: qualify(tokens.advance()?),
                columns,
            }
        }
        "UPDATE" => {
            let table = qualify(tokens.advance()?);
            let mut ttl = None;
            if tokens.peek_is("USING") {
                tokens.expect("USING")?;
                tokens.expect("TTL")?;
                let raw = tokens.advance()?;
                ttl = Some(raw.parse().map_err(|_| format!("invalid TTL {raw}"))?);
            }
            tokens.expect("SET")?;
            let mut columns = Vec::new();
            loop {
                columns.push(tokens.advance()?);
                tokens.expect("=")?;
                tokens.expect("?")?;
                if tokens.peek_is(",") {
                    tokens.expect(",")?;
                } else {
                    break;
                }
            }
            MemoryStatement::Update {
                table,
                ttl,
                columns,
            }
        }
        "DELETE" => {
            tokens.expect("FROM")?;
            MemoryStatement::Delete {
                table: qualify(tokens.advance()?),
            }
        }
        other => return Err(format!("unsupported statement {other}")),
    };

    tokens.expect("WHERE")?;
    let key_column = tokens.advance()?;
    tokens.expect("=")?;
    tokens.expect("?")?;
    tokens.finish()?;

    Ok((statement, key_column))
}
