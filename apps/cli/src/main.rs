//! docweave CLI — scrape documentation sites into single Markdown files.
//!
//! Resolves a site's sitemap, indexes every page, and streams titles,
//! a table of contents, and extracted content to one output file.

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
