//! Config command - configuration management.

use anyhow::Result;
use cassession_config::{CassessionConfig, ClusterSection, SessionHandlerSection};
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./cassession.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let cluster = ctx.cluster_config()?;

    println!("# cassession configuration\n");

    let sources = ctx.loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    println!("Session handler:");
    match ctx.session_options().resolve() {
        Ok(options) => {
            println!("  table:    {}", options.qualified_table());
            println!("  lifetime: {}s", options.session_lifetime());
            println!(
                "  columns:  id={} data={} time={}",
                options.id_field(),
                options.data_field(),
                options.time_field()
            );
        }
        Err(e) => println!("  ✗ {e}"),
    }
    println!();

    println!("Cluster:");
    if cluster.contact_points.is_empty() {
        println!("  contact points: (none)");
    } else {
        println!("  contact points: {}", cluster.contact_points);
    }
    println!("  persistent:     {}", cluster.persistent);
    if let Some(ref creds) = cluster.credentials {
        println!("  username:       {}", creds.username);
    }
    println!();

    if !ctx.loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &ctx.loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", ctx.loaded.config.to_toml()?);
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {:<8} {}", status, source.origin, source.path.display());
    }

    println!();
    let loaded_count = ctx.loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'cassession config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        std::path::PathBuf::from("cassession.toml")
    } else {
        cassession_config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine user config directory"))?
    };

    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    let config = CassessionConfig {
        session_handler: Some(SessionHandlerSection::default()),
        cassandra_cluster: Some(ClusterSection {
            contact_points: cassession_config::ContactPointsValue::Joined("127.0.0.1".to_string()),
            ..Default::default()
        }),
    };
    cassession_config::save_config(&config, &path)?;

    println!("✓ Created {}", path.display());
    Ok(())
}
