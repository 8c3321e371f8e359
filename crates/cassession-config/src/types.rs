//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [session_handler]
//! keyspace = "symfony2_sessions"
//! column_family = "sessions"
//! session_lifetime = 86400
//!
//! [cassandra_cluster]
//! contact_points = "10.0.0.1, 10.0.0.2"   # or ["10.0.0.1", "10.0.0.2"]
//!
//! [cassandra_cluster.credentials]
//! username = "cassandra"
//! ```

use serde::{Deserialize, Serialize};

use cassession_store::{ClusterConfig, ContactPoints, ResolvedOptions, SessionOptions};

use crate::{ConfigError, Result};

/// Environment variable consulted when no password is configured.
pub const PASSWORD_ENV: &str = "CASSESSION_CLUSTER_PASSWORD";

/// Default keyspace.
pub const DEFAULT_KEYSPACE: &str = "symfony2_sessions";

/// Default table.
pub const DEFAULT_COLUMN_FAMILY: &str = "sessions";

/// Default session lifetime: one day.
pub const DEFAULT_SESSION_LIFETIME: u32 = 86_400;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Both sections are optional so partial files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CassessionConfig {
    /// Session handler settings (`[session_handler]`).
    pub session_handler: Option<SessionHandlerSection>,

    /// Cluster settings (`[cassandra_cluster]`).
    pub cassandra_cluster: Option<ClusterSection>,
}

impl CassessionConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: CassessionConfig) {
        if other.session_handler.is_some() {
            self.session_handler = other.session_handler;
        }

        if other.cassandra_cluster.is_some() {
            self.cassandra_cluster = other.cassandra_cluster;
        }
    }

    /// Handler section, or the defaults when absent.
    pub fn session_handler(&self) -> SessionHandlerSection {
        self.session_handler.clone().unwrap_or_default()
    }

    /// Cluster section, or the defaults when absent.
    pub fn cassandra_cluster(&self) -> ClusterSection {
        self.cassandra_cluster.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Handler
// ─────────────────────────────────────────────────────────────────────────────

/// Session handler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionHandlerSection {
    pub keyspace: String,
    pub column_family: String,
    /// Lifetime in seconds, applied as the write TTL.
    pub session_lifetime: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,
}

impl Default for SessionHandlerSection {
    fn default() -> Self {
        Self {
            keyspace: DEFAULT_KEYSPACE.to_string(),
            column_family: DEFAULT_COLUMN_FAMILY.to_string(),
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            id_field: None,
            data_field: None,
            time_field: None,
        }
    }
}

impl SessionHandlerSection {
    /// Convert into handler options.
    pub fn to_options(&self) -> SessionOptions {
        SessionOptions {
            keyspace: Some(self.keyspace.clone()),
            column_family: Some(self.column_family.clone()),
            session_lifetime: Some(self.session_lifetime),
            id_field: self.id_field.clone(),
            data_field: self.data_field.clone(),
            time_field: self.time_field.clone(),
        }
    }

    /// Convert and validate.
    pub fn resolve(&self) -> Result<ResolvedOptions> {
        Ok(self.to_options().resolve()?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cluster
// ─────────────────────────────────────────────────────────────────────────────

/// Contact points as written in the config: a comma-separated string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContactPointsValue {
    List(Vec<String>),
    Joined(String),
}

impl Default for ContactPointsValue {
    fn default() -> Self {
        ContactPointsValue::List(Vec::new())
    }
}

impl ContactPointsValue {
    pub fn to_contact_points(&self) -> ContactPoints {
        match self {
            ContactPointsValue::List(hosts) => hosts.iter().collect(),
            ContactPointsValue::Joined(hosts) => ContactPoints::parse(hosts),
        }
    }
}

/// Cluster credentials.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsSection {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialsSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsSection")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Cluster configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    pub contact_points: ContactPointsValue,
    /// Keep connections alive between requests.
    pub persistent: bool,
    /// Log connection attempts at debug level.
    pub debug: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsSection>,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            contact_points: ContactPointsValue::default(),
            persistent: true,
            debug: false,
            credentials: None,
        }
    }
}

impl ClusterSection {
    /// Whether a password is stored in the file itself.
    pub fn has_plaintext_password(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(|c| c.password.is_some())
    }

    /// Convert into a cluster configuration.
    ///
    /// The password falls back to `CASSESSION_CLUSTER_PASSWORD` when the file
    /// names a username without one.
    pub fn to_cluster_config(&self) -> Result<ClusterConfig> {
        self.to_cluster_config_with(std::env::var(PASSWORD_ENV).ok())
    }

    /// Convert, using `env_password` as the password fallback.
    pub fn to_cluster_config_with(&self, env_password: Option<String>) -> Result<ClusterConfig> {
        let mut config = ClusterConfig::new()
            .with_persistent(self.persistent)
            .with_debug(self.debug);
        config.contact_points = self.contact_points.to_contact_points();

        if let Some(ref creds) = self.credentials {
            let password = creds
                .password
                .clone()
                .or(env_password)
                .ok_or_else(|| ConfigError::MissingField {
                    field: "password".to_string(),
                    context: format!("[cassandra_cluster.credentials] (or set {PASSWORD_ENV})"),
                })?;
            config = config.with_credentials(creds.username.clone(), password);
        }

        Ok(config)
    }
}
