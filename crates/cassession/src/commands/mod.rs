//! CLI command handlers.

pub mod check;
pub mod config;
pub mod destroy;
pub mod gc;
pub mod read;
pub mod write;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use cassession_config::LoadedConfig;
use cassession_store::{
    CassandraSessionHandler, ClusterConfig, ClusterConnector, ContactPoints, ScyllaCluster,
    ScyllaSession, SessionOptions,
};
use tracing::debug;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration and where it came from.
    pub loaded: LoadedConfig,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Contact points from the command line.
    pub contact_points: Option<String>,
    /// Keyspace from the command line.
    pub keyspace: Option<String>,
}

impl Context {
    /// Handler options with command-line overrides applied.
    pub fn session_options(&self) -> SessionOptions {
        let mut options = self.loaded.config.session_handler().to_options();
        if let Some(ref keyspace) = self.keyspace {
            options.keyspace = Some(keyspace.clone());
        }
        options
    }

    /// Cluster configuration with command-line overrides applied.
    pub fn cluster_config(&self) -> Result<ClusterConfig> {
        let mut config = self
            .loaded
            .config
            .cassandra_cluster()
            .to_cluster_config()?;
        if let Some(ref points) = self.contact_points {
            config.contact_points = ContactPoints::parse(points);
        }
        if self.verbose {
            config.debug = true;
        }
        Ok(config)
    }

    /// Connect to the cluster and prepare the session handler.
    pub async fn connect(&self) -> Result<CassandraSessionHandler<ScyllaSession>> {
        // Validate before building the cluster so option errors win.
        let options = self.session_options().resolve()?;

        let cluster = ScyllaCluster::build(self.cluster_config()?)
            .context("no contact points: set [cassandra_cluster].contact_points or --contact-points")?;
        debug!(contact_points = %cluster.contact_points(), "Cluster built");

        let pending = Arc::new(cluster).connect_async(options.keyspace().to_string());
        let handler = CassandraSessionHandler::from_pending(pending, options).await?;
        Ok(handler)
    }
}
