//! The three prepared statements the handler runs.

use std::fmt;

use crate::options::ResolvedOptions;

/// Purpose of a prepared statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Read,
    Write,
    Destroy,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::Read,
        StatementKind::Write,
        StatementKind::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Read => "read",
            StatementKind::Write => "write",
            StatementKind::Destroy => "destroy",
        }
    }

    /// CQL text for this statement.
    ///
    /// Only configuration identifiers are interpolated; session ids, payloads
    /// and timestamps are always bound as `?` markers.
    pub fn cql(&self, options: &ResolvedOptions) -> String {
        let table = options.qualified_table();
        match self {
            StatementKind::Read => format!(
                "SELECT {} FROM {} WHERE {} = ?",
                options.data_field(),
                table,
                options.id_field()
            ),
            StatementKind::Write => format!(
                "UPDATE {} USING TTL {} SET {} = ?, {} = ? WHERE {} = ?",
                table,
                options.session_lifetime(),
                options.data_field(),
                options.time_field(),
                options.id_field()
            ),
            StatementKind::Destroy => format!(
                "DELETE FROM {} WHERE {} = ?",
                table,
                options.id_field()
            ),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Prepared statements keyed by purpose, built once per handler.
#[derive(Debug, Clone)]
pub struct PreparedStatements<P> {
    pub read: P,
    pub write: P,
    pub destroy: P,
}

impl<P> PreparedStatements<P> {
    pub fn get(&self, kind: StatementKind) -> &P {
        match kind {
            StatementKind::Read => &self.read,
            StatementKind::Write => &self.write,
            StatementKind::Destroy => &self.destroy,
        }
    }
}
