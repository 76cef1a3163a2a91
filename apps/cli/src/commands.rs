//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docweave_core::pipeline::{ProgressReporter, RunSummary};
use docweave_shared::{
    AppConfig, FetchKind, SiteConfig, config_file_path, init_config, load_config,
    load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docweave — scrape documentation sites into single Markdown files.
#[derive(Parser)]
#[command(
    name = "docweave",
    version,
    about = "Scrape a documentation site's sitemap into one navigable Markdown file.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape one configured site to its output file.
    Scrape {
        /// Site profile name from the config file (e.g. `fastapi`).
        site: String,

        /// Config file path (defaults to ~/.docweave/docweave.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the profile's sitemap URL.
        #[arg(long)]
        sitemap: Option<String>,

        /// Override the profile's output path.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Override max concurrent in-flight requests.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Override the per-request delay in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// List the site profiles in the config file.
    Sites {
        /// Config file path (defaults to ~/.docweave/docweave.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a starter config file with an example site profile.
    Init,
    /// Show the resolved configuration.
    Show,
    /// Print the config file path.
    Path,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docweave=info",
        1 => "docweave=debug",
        _ => "docweave=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scrape {
            site,
            config,
            sitemap,
            out,
            concurrency,
            delay_ms,
        } => cmd_scrape(&site, config, sitemap, out, concurrency, delay_ms).await,
        Command::Sites { config } => cmd_sites(config),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Path => cmd_config_path(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn load(config_path: Option<&PathBuf>) -> Result<AppConfig> {
    Ok(match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

async fn cmd_scrape(
    site: &str,
    config_path: Option<PathBuf>,
    sitemap: Option<String>,
    out: Option<PathBuf>,
    concurrency: Option<usize>,
    delay_ms: Option<u64>,
) -> Result<()> {
    let config = load(config_path.as_ref())?;

    let profile = config.site(site).ok_or_else(|| {
        let known: Vec<&str> = config.sites.iter().map(|s| s.name.as_str()).collect();
        eyre!(
            "unknown site '{site}' (configured sites: {})",
            if known.is_empty() {
                "none — run `docweave config init`".to_string()
            } else {
                known.join(", ")
            }
        )
    })?;

    let mut site_config = SiteConfig::from_profile(&config.defaults, profile);
    if let Some(sitemap) = sitemap {
        site_config.sitemap_url = sitemap;
    }
    if let Some(out) = out {
        site_config.output_path = out;
    }
    if let Some(concurrency) = concurrency {
        site_config.max_concurrent = concurrency;
    }
    if let Some(delay_ms) = delay_ms {
        site_config.request_delay_ms = delay_ms;
    }
    site_config.validate()?;

    info!(
        site,
        sitemap = %site_config.sitemap_url,
        out = %site_config.output_path.display(),
        "starting scrape"
    );

    let reporter = CliProgress::new();
    let summary = docweave_core::pipeline::run(&site_config, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Scrape complete!");
    println!("  Sections: {}", summary.sections);
    println!(
        "  Pages:    {} written / {} indexed / {} failed",
        summary.pages_written, summary.pages_indexed, summary.pages_failed
    );
    println!("  Output:   {}", site_config.output_path.display());
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_sites(config_path: Option<PathBuf>) -> Result<()> {
    let config = load(config_path.as_ref())?;

    if config.sites.is_empty() {
        println!("No sites configured. Run `docweave config init` to create a starter config.");
        return Ok(());
    }

    for site in &config.sites {
        println!("  {:<16} {} -> {}", site.name, site.sitemap_url, site.output_path);
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config written to {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_path() -> Result<()> {
    println!("{}", config_file_path()?.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_done(&self, kind: FetchKind, url: &str, current: usize, total: usize) {
        let pass = match kind {
            FetchKind::Title => "Indexing",
            FetchKind::Content => "Extracting",
        };
        self.spinner
            .set_message(format!("{pass} [{current}/{total}] {url}"));
    }

    fn done(&self, summary: &RunSummary) {
        self.spinner.set_message(format!(
            "Done: {} pages written across {} sections",
            summary.pages_written, summary.sections
        ));
    }
}
