//! Write command - store a session payload.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use cassession_store::SessionHandler;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the write command.
#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Session id
    pub id: String,

    /// Payload; read from stdin when neither this nor --file is given
    #[arg(conflicts_with = "file")]
    pub data: Option<String>,

    /// Read the payload from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Run the write command.
pub async fn run(args: WriteArgs, ctx: &Context) -> Result<()> {
    let payload = match (args.data, args.file) {
        (Some(data), _) => data.into_bytes(),
        (None, Some(path)) => {
            std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?
        }
        (None, None) => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading payload from stdin")?;
            buf
        }
    };

    let handler = ctx.connect().await?;
    handler.write(&args.id, &payload).await?;

    let green = Style::new().green();
    let dim = Style::new().dim();
    eprintln!(
        "{} Session {} written {}",
        green.apply_to("✓"),
        args.id,
        dim.apply_to(format!(
            "({} bytes, expires in {}s)",
            payload.len(),
            handler.options().session_lifetime()
        ))
    );
    Ok(())
}
