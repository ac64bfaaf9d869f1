//! Tululu-Harvest main entry point
//!
//! This is the command-line interface for the Tululu-Harvest catalog harvester.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tululu_harvest::config::{load_config_with_hash, validate, Config};
use tululu_harvest::crawler::run_harvest;
use tululu_harvest::output::print_summary;
use tracing_subscriber::EnvFilter;

/// Tululu-Harvest: downloads books of a tululu.org catalog category
///
/// Walks the category pages in order, saves each book's text and cover image,
/// and writes the collected metadata to a JSON file.
#[derive(Parser, Debug)]
#[command(name = "tululu-harvest")]
#[command(version)]
#[command(about = "Downloads books from a tululu.org catalog category", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First catalog page to walk
    #[arg(long)]
    start_page: Option<u32>,

    /// Last catalog page to walk (inclusive)
    #[arg(long)]
    end_page: Option<u32>,

    /// Folder to save books, images and the result file into
    #[arg(long, value_name = "DIR")]
    dest_folder: Option<PathBuf>,

    /// Do not download cover images
    #[arg(long)]
    skip_img: bool,

    /// Do not download book texts
    #[arg(long)]
    skip_txt: bool,

    /// Maximum attempts per request on connection problems
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Show the effective configuration without downloading anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Merges command-line overrides into the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(start) = self.start_page {
            config.pages.start = start;
        }
        if let Some(end) = self.end_page {
            config.pages.end = Some(end);
        }
        if let Some(dest) = &self.dest_folder {
            config.output.dest_folder = dest.clone();
        }
        if self.skip_img {
            config.download.skip_images = true;
        }
        if self.skip_txt {
            config.download.skip_text = true;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(timeout) = self.timeout_secs {
            config.http.timeout_secs = timeout;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let report = run_harvest(config).await.context("Harvest failed")?;

    if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tululu_harvest=info,warn"),
            1 => EnvFilter::new("tululu_harvest=debug,info"),
            2 => EnvFilter::new("tululu_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be harvested
fn handle_dry_run(config: &Config) {
    println!("=== Tululu-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Category: {}", config.site.category);
    println!("  Text endpoint: {}", config.site.text_endpoint);

    println!("\nPages:");
    println!("  Start: {}", config.pages.start);
    match config.pages.end {
        Some(end) => println!("  End: {}", end),
        None => println!("  End: until the catalog runs out"),
    }

    println!("\nOutput:");
    println!("  Books: {}", config.output.books_path().display());
    println!("  Images: {}", config.output.images_path().display());
    println!("  Results: {}", config.output.results_path().display());

    println!("\nDownloads:");
    println!("  Texts: {}", if config.download.skip_text { "skipped" } else { "yes" });
    println!("  Images: {}", if config.download.skip_images { "skipped" } else { "yes" });
    println!("  On image failure: {:?}", config.download.image_failure);

    println!("\nNetwork:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Retry delays: {}ms, then {}ms",
        config.retry.first_delay_ms, config.retry.later_delay_ms
    );
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  User agent: {}", config.http.user_agent);

    println!("\n✓ Configuration is valid");
}
