//! bookmeter-harvest main entry point
//!
//! This is the command-line interface for harvesting reading logs.

use anyhow::Context;
use bookmeter_harvest::config::{load_config_with_hash, validate, Config};
use bookmeter_harvest::crawler::{run_crawl, CrawlRequest};
use bookmeter_harvest::output::print_report;
use bookmeter_harvest::url::{with_page, SiteUrls};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// bookmeter-harvest: reading-log harvester
///
/// Discovers users through community member listings and writes each
/// user's reading history to three tab-separated tables. Users already
/// present under the output directory are skipped unless --force is given.
#[derive(Parser, Debug)]
#[command(name = "scrape")]
#[command(version)]
#[command(about = "Harvest reading logs of community members", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of community listing pages to read
    #[arg(short = 'n', long, default_value_t = 1)]
    num_communities: u32,

    /// First community listing page
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    start: u32,

    /// Re-harvest users whose output directory already exists
    #[arg(long)]
    force: bool,

    /// Worker pool size for member listing walks
    #[arg(long)]
    workers: Option<u32>,

    /// Number of users extracted at once
    #[arg(long)]
    log_workers: Option<u32>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Delay between page requests of one walk, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without any request
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Command-line flags win over the config file
    fn apply_overrides(&self, config: &mut Config) {
        if self.force {
            config.crawler.force = true;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(log_workers) = self.log_workers {
            config.crawler.log_workers = log_workers;
        }
        if let Some(output) = &self.output {
            config.output.root_dir = output.to_string_lossy().into_owned();
        }
        if let Some(delay_ms) = self.delay_ms {
            config.crawler.page_delay_ms = delay_ms;
        }
    }

    fn request(&self) -> CrawlRequest {
        CrawlRequest {
            start_page: self.start,
            num_communities: self.num_communities,
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
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given; using defaults");
            Config::default()
        }
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        return handle_dry_run(&config, cli.request());
    }

    let report = run_crawl(config, cli.request())
        .await
        .context("harvest failed")?;
    print_report(&report);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookmeter_harvest=info,warn"),
            1 => EnvFilter::new("bookmeter_harvest=debug,info"),
            2 => EnvFilter::new("bookmeter_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration and plan
fn handle_dry_run(config: &Config, request: CrawlRequest) -> anyhow::Result<()> {
    let site = SiteUrls::from_config(&config.site).context("invalid site URL")?;

    println!("=== bookmeter-harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Log workers: {}", config.crawler.log_workers);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Force: {}", config.crawler.force);
    println!("  Row mismatch: {:?}", config.crawler.row_mismatch);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Root: {}", config.output.root_dir);

    println!(
        "\nCommunity listing pages ({}):",
        request.num_communities
    );
    let end = request.start_page.saturating_add(request.num_communities);
    for page in request.start_page..end {
        println!("  - {}", with_page(site.community_listing(), page));
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}
