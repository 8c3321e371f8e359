//! Error types for session store operations.

use crate::statement::StatementKind;

/// Boxed error from the underlying cluster driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required option was not supplied.
    #[error(
        "missing required option '{0}': keyspace, column_family and session_lifetime must all be provided"
    )]
    MissingOption(&'static str),

    /// An option was supplied with an unusable value.
    #[error("invalid option '{option}': {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    /// A keyspace, table or column name is not a plain CQL identifier.
    #[error("invalid CQL identifier for '{option}': {value:?}")]
    InvalidIdentifier { option: &'static str, value: String },

    /// No contact points remained after parsing the cluster configuration.
    #[error("no contact points configured for the cluster")]
    NoContactPoints,

    /// The cluster could not negotiate a session bound to the keyspace.
    #[error("failed to connect to keyspace '{keyspace}': {source}")]
    Connect {
        keyspace: String,
        #[source]
        source: BoxError,
    },

    /// A statement could not be prepared (e.g. missing table or column).
    #[error("failed to prepare {statement} statement: {source}")]
    Prepare {
        statement: StatementKind,
        #[source]
        source: BoxError,
    },

    /// A prepared statement failed at execution time.
    #[error("failed to execute {statement} statement: {source}")]
    Execute {
        statement: StatementKind,
        #[source]
        source: BoxError,
    },

    /// A background connection task was cancelled or panicked.
    #[error("connection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Whether this error was raised before any network activity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingOption(_)
                | Error::InvalidOption { .. }
                | Error::InvalidIdentifier { .. }
                | Error::NoContactPoints
        )
    }
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
