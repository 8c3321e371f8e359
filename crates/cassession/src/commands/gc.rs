//! Gc command - run the handler's garbage collection hook.

use anyhow::Result;
use cassession_store::SessionHandler;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the gc command.
#[derive(Args, Debug)]
pub struct GcArgs {
    /// Maximum session lifetime in seconds
    #[arg(long, default_value = "0")]
    pub max_lifetime: u64,
}

/// Run the gc command.
pub async fn run(args: GcArgs, ctx: &Context) -> Result<()> {
    let handler = ctx.connect().await?;
    let ok = handler.gc(args.max_lifetime);

    eprintln!("{}", status_line(ok, handler.options().session_lifetime()));
    if ok {
        Ok(())
    } else {
        anyhow::bail!("gc hook reported failure")
    }
}

fn status_line(ok: bool, ttl: u32) -> String {
    let (glyph, word) = if ok {
        (Style::new().green().apply_to("✓"), "ok")
    } else {
        (Style::new().red().apply_to("✗"), "failed")
    };
    let note = Style::new()
        .dim()
        .apply_to(format!("(rows expire via TTL {ttl}s)"));
    format!("{glyph} gc {word} {note}")
}
