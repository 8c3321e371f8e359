//! Check command - verify connectivity and statement preparation.

use anyhow::Result;
use cassession_store::StatementKind;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {}

/// Run the check command.
pub async fn run(_args: CheckArgs, ctx: &Context) -> Result<()> {
    let handler = ctx.connect().await?;
    let options = handler.options();

    let green = Style::new().green();
    let dim = Style::new().dim();
    println!(
        "{} Connected to {} (TTL {}s)",
        green.apply_to("✓"),
        options.qualified_table(),
        options.session_lifetime()
    );
    for kind in StatementKind::ALL {
        println!(
            "  {:<8} {}",
            kind,
            dim.apply_to(handler.statement_text(kind))
        );
    }
    Ok(())
}
