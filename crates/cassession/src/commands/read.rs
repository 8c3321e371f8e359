//! Read command - print a session payload.

use std::io::Write;

use anyhow::Result;
use cassession_store::SessionHandler;
use clap::Args;
use console::style;

use super::Context;

/// Arguments for the read command.
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Session id
    pub id: String,
}

/// Run the read command.
pub async fn run(args: ReadArgs, ctx: &Context) -> Result<()> {
    let handler = ctx.connect().await?;
    let data = handler.read(&args.id).await?;

    if data.is_empty() {
        if ctx.verbose {
            eprintln!("{} no data for session {}", style("·").dim(), args.id);
        }
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}
