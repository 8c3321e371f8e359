//! Options for the session handler.

use crate::error::{Error, Result};

/// Default column holding the session id.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default column holding the session payload.
pub const DEFAULT_DATA_FIELD: &str = "data";

/// Default column holding the last-write timestamp.
pub const DEFAULT_TIME_FIELD: &str = "time";

/// Caller-supplied handler options.
///
/// `keyspace`, `column_family` and `session_lifetime` are required; the field
/// names fall back to `id`, `data` and `time`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Keyspace holding the session table.
    pub keyspace: Option<String>,

    /// Table (column family) holding the sessions.
    pub column_family: Option<String>,

    /// Per-write TTL in seconds.
    pub session_lifetime: Option<u32>,

    /// Column holding the session id.
    pub id_field: Option<String>,

    /// Column holding the session payload.
    pub data_field: Option<String>,

    /// Column holding the last-write timestamp.
    pub time_field: Option<String>,
}

impl SessionOptions {
    /// Create an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keyspace.
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Set the column family.
    pub fn with_column_family(mut self, column_family: impl Into<String>) -> Self {
        self.column_family = Some(column_family.into());
        self
    }

    /// Set the session lifetime in seconds.
    pub fn with_session_lifetime(mut self, seconds: u32) -> Self {
        self.session_lifetime = Some(seconds);
        self
    }

    /// Override the id column name.
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    /// Override the data column name.
    pub fn with_data_field(mut self, field: impl Into<String>) -> Self {
        self.data_field = Some(field.into());
        self
    }

    /// Override the timestamp column name.
    pub fn with_time_field(mut self, field: impl Into<String>) -> Self {
        self.time_field = Some(field.into());
        self
    }

    /// Validate the options and merge field names over their defaults.
    ///
    /// Performs no I/O, so a failure here means nothing touched the network.
    pub fn resolve(&self) -> Result<ResolvedOptions> {
        let keyspace = self
            .keyspace
            .clone()
            .ok_or(Error::MissingOption("keyspace"))?;
        let column_family = self
            .column_family
            .clone()
            .ok_or(Error::MissingOption("column_family"))?;
        let session_lifetime = self
            .session_lifetime
            .ok_or(Error::MissingOption("session_lifetime"))?;

        if session_lifetime == 0 {
            return Err(Error::InvalidOption {
                option: "session_lifetime",
                reason: "must be greater than zero".to_string(),
            });
        }

        let resolved = ResolvedOptions {
            keyspace,
            column_family,
            session_lifetime,
            id_field: self
                .id_field
                .clone()
                .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
            data_field: self
                .data_field
                .clone()
                .unwrap_or_else(|| DEFAULT_DATA_FIELD.to_string()),
            time_field: self
                .time_field
                .clone()
                .unwrap_or_else(|| DEFAULT_TIME_FIELD.to_string()),
        };

        for (option, value) in [
            ("keyspace", &resolved.keyspace),
            ("column_family", &resolved.column_family),
            ("id_field", &resolved.id_field),
            ("data_field", &resolved.data_field),
            ("time_field", &resolved.time_field),
        ] {
            if !is_cql_identifier(value) {
                return Err(Error::InvalidIdentifier {
                    option,
                    value: value.clone(),
                });
            }
        }

        Ok(resolved.fold_case())
    }
}

/// Validated handler options. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    keyspace: String,
    column_family: String,
    session_lifetime: u32,
    id_field: String,
    data_field: String,
    time_field: String,
}

impl ResolvedOptions {
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn column_family(&self) -> &str {
        &self.column_family
    }

    /// Session lifetime in seconds; used verbatim as the write TTL.
    pub fn session_lifetime(&self) -> u32 {
        self.session_lifetime
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn data_field(&self) -> &str {
        &self.data_field
    }

    pub fn time_field(&self) -> &str {
        &self.time_field
    }

    /// Unquoted CQL identifiers are case-insensitive and servers report them
    /// lowercased, so row lookups must use the folded form.
    fn fold_case(mut self) -> Self {
        for name in [
            &mut self.keyspace,
            &mut self.column_family,
            &mut self.id_field,
            &mut self.data_field,
            &mut self.time_field,
        ] {
            name.make_ascii_lowercase();
        }
        self
    }

    /// Fully qualified `keyspace.table` name.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.keyspace, self.column_family)
    }
}

/// Whether `s` is an unquoted CQL identifier.
fn is_cql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
