//! Configuration for the cassession session store.
//!
//! Provides TOML-based configuration with:
//! - `[session_handler]`: keyspace, table, lifetime and column names
//! - `[cassandra_cluster]`: contact points, credentials, connection policy
//! - A `--config` file, or the user file with `./cassession.toml` over it
//! - Load-time checks reported as warnings (unusable handler options,
//!   plaintext passwords)
//! - Password resolution (config file → `CASSESSION_CLUSTER_PASSWORD`)

pub mod error;
pub mod loader;
pub mod types;

pub use error::{ConfigError, Result};
pub use loader::{
    ConfigLoader, ConfigSource, LoadWarning, LoadedConfig, Origin, load_config_file, save_config,
    user_config_dir, user_config_path,
};
pub use types::*;
