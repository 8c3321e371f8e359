//! Destroy command - delete a session.

use anyhow::Result;
use cassession_store::SessionHandler;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the destroy command.
#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Session id
    pub id: String,
}

/// Run the destroy command.
pub async fn run(args: DestroyArgs, ctx: &Context) -> Result<()> {
    let handler = ctx.connect().await?;
    handler.destroy(&args.id).await?;

    let green = Style::new().green();
    eprintln!("{} Session {} destroyed", green.apply_to("✓"), args.id);
    Ok(())
}
