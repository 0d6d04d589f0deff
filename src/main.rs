//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumi_harvest::config::{
    compute_config_hash, parse_config, validate_config, Config, CrawlMode, LoginMode,
};
use sumi_harvest::output::{load_statistics, log_run_summary, print_statistics};
use sumi_harvest::platform::{create_platform, supported_platforms};
use sumi_harvest::storage::{open_sink, RunStatus, Sink};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: a signed-API social media crawler
///
/// Sumi-Harvest logs into a platform through a real browser, then crawls
/// search results, content details, creator timelines or question answers
/// (with their comment trees) into a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A signed-API social media crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Platform key, overrides the config file
    #[arg(long)]
    platform: Option<String>,

    /// Login type: qrcode, phone or cookie
    #[arg(long = "lt", value_name = "LOGIN_TYPE")]
    login_type: Option<String>,

    /// Crawl type: search, detail, creator or question
    #[arg(long = "type", value_name = "CRAWL_TYPE")]
    crawl_type: Option<String>,

    /// First search result page
    #[arg(long)]
    start: Option<u32>,

    /// Search keyword; repeat for several
    #[arg(long)]
    keywords: Vec<String>,

    /// Whether comments are crawled
    #[arg(long, value_name = "BOOL")]
    get_comment: Option<bool>,

    /// Whether child comments are crawled
    #[arg(long, value_name = "BOOL")]
    get_sub_comment: Option<bool>,

    /// Raw cookie string for cookie login
    #[arg(long)]
    cookies: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let content = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("failed to read {}", cli.config.display()))?;
    let mut config = parse_config(&content)
        .with_context(|| format!("failed to parse {}", cli.config.display()))?;
    let config_hash = compute_config_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;
    validate_config(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
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

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(platform) = &cli.platform {
        config.platform = platform.clone();
    }
    if let Some(lt) = &cli.login_type {
        config.login.mode = LoginMode::parse(lt)
            .with_context(|| format!("unknown login type '{}'", lt))?;
    }
    if let Some(kind) = &cli.crawl_type {
        config.crawler.mode =
            CrawlMode::parse(kind).with_context(|| format!("unknown crawl type '{}'", kind))?;
    }
    if let Some(start) = cli.start {
        config.crawler.start_page = start;
    }
    if !cli.keywords.is_empty() {
        config.crawler.keywords = cli.keywords.clone();
    }
    if let Some(enabled) = cli.get_comment {
        config.crawler.enable_comments = enabled;
    }
    if let Some(enabled) = cli.get_sub_comment {
        config.crawler.enable_sub_comments = enabled;
    }
    if let Some(cookies) = &cli.cookies {
        config.login.cookies = cookies.clone();
    }
    Ok(())
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Platform: {}", config.platform);
    println!("Login: {}", config.login.mode);
    println!();

    println!("Crawler Configuration:");
    println!("  Mode: {}", config.crawler.mode);
    println!("  Max items: {}", config.crawler.max_items);
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!(
        "  Comments: {} (sub-comments: {})",
        config.crawler.enable_comments, config.crawler.enable_sub_comments
    );
    println!("  Crawl interval: {}ms", config.crawler.crawl_interval_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nTargets:");
    match config.crawler.mode {
        CrawlMode::Search => {
            println!("  Start page: {}", config.crawler.start_page);
            for keyword in &config.crawler.keywords {
                println!("  - {}", keyword);
            }
        }
        CrawlMode::Detail => {
            for url in &config.zhihu.specified_urls {
                println!("  - {}", url);
            }
        }
        CrawlMode::Creator => {
            println!("  Content: {}", config.zhihu.creator_content.join(", "));
            for url in &config.zhihu.creator_urls {
                println!("  - {}", url);
            }
        }
        CrawlMode::Question => println!("  - {}", config.zhihu.question_url),
    }

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    if config.browser.save_login_state {
        println!("  Profile: {}", config.browser.user_data_dir);
    }

    if config.proxy.enabled {
        println!(
            "\nProxy pool: {} of {} endpoints",
            config.proxy.pool_size.min(config.proxy.endpoints.len() as u32),
            config.proxy.endpoints.len()
        );
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Supported platforms: {}", supported_platforms().join(", "));
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let sink = open_sink(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let sink = Arc::new(open_sink(Path::new(&config.output.database_path))?);
    let run_id = sink.begin_run(config_hash, &config.platform, config.crawler.mode.as_str())?;
    tracing::info!(
        run = run_id,
        platform = %config.platform,
        mode = %config.crawler.mode,
        "Starting run"
    );

    let records: Arc<dyn Sink> = sink.clone();
    let mut platform = create_platform(config, records)?;

    let outcome = tokio::select! {
        result = platform.start() => Some(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, shutting down");
            None
        }
    };

    if let Err(e) = platform.close().await {
        tracing::warn!(error = %e, "Failed to close browser");
    }

    match outcome {
        Some(Ok(stats)) => {
            sink.finish_run(run_id, RunStatus::Completed)?;
            log_run_summary(&stats);
            Ok(())
        }
        Some(Err(e)) => {
            sink.finish_run(run_id, RunStatus::Failed)?;
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
        None => {
            sink.finish_run(run_id, RunStatus::Interrupted)?;
            Ok(())
        }
    }
}
