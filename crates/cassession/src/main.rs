//! cassession - web sessions stored in Cassandra/ScyllaDB
//!
//! Main entry point for the cassession CLI.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

mod commands;

use commands::{check, config, destroy, gc, read, write};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// cassession - inspect and manage web sessions stored in Cassandra/ScyllaDB
#[derive(Parser)]
#[command(name = "cassession")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (also enables cluster debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the discovered ones
    #[arg(short, long, global = true, env = "CASSESSION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated contact points, overriding the config file
    #[arg(long, global = true, env = "CASSESSION_CONTACT_POINTS")]
    pub contact_points: Option<String>,

    /// Keyspace, overriding the config file
    #[arg(long, global = true)]
    pub keyspace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a session's payload to stdout
    Read(read::ReadArgs),

    /// Store a session payload
    Write(write::WriteArgs),

    /// Delete a session
    Destroy(destroy::DestroyArgs),

    /// Run garbage collection (expiry is handled by the store's TTL)
    Gc(gc::GcArgs),

    /// Connect, prepare statements and show them
    Check(check::CheckArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (stderr, so payloads on stdout stay clean) + rotating JSON file
    let filter = if cli.verbose {
        "cassession=debug,cassession_store=trace,cassession_config=debug,info"
    } else {
        "cassession=info,cassession_store=info,warn"
    };

    let log_dir = cassession_config::user_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "cassession.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "cassession=trace,cassession_store=trace,cassession_config=trace,info",
                )),
        )
        .init();

    let loaded = cassession_config::ConfigLoader::new()
        .with_file(cli.config.clone())
        .load()
        .context("loading configuration")?;
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    let ctx = commands::Context {
        loaded,
        verbose: cli.verbose,
        contact_points: cli.contact_points,
        keyspace: cli.keyspace,
    };

    match cli.command {
        Commands::Read(args) => read::run(args, &ctx).await,
        Commands::Write(args) => write::run(args, &ctx).await,
        Commands::Destroy(args) => destroy::run(args, &ctx).await,
        Commands::Gc(args) => gc::run(args, &ctx).await,
        Commands::Check(args) => check::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
