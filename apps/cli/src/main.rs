//! Whatson CLI — city event aggregation tool.
//!
//! Scrapes event listings from multiple sources, reconciles them into a
//! local catalog, and serves listing, moderation, and ticket-interest
//! commands over it.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
