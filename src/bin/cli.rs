//! firm-scrape command line
//!
//! Runs one crawl job per domain, sequentially, on a single browser, and
//! writes the reports as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use firm_scrape::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use firm_scrape::{CrawlJob, FirmCategory, HttpSitemap, JobReport, NameOracle, Orchestrator, ProfileLimit};
use firm_scrape::{Page, ScrapeConfig, SecondaryTab};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "firm-scrape")]
#[command(version)]
#[command(about = "Extract personnel profiles from firm team pages", long_about = None)]
struct Cli {
    /// Domains or homepage URLs to crawl
    #[arg(required = true, value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Firm category, selects keyword vocabularies
    #[arg(long, short = 'c', value_enum)]
    category: FirmCategory,

    /// Maximum profiles per domain (default: unbounded)
    #[arg(long, short = 'l')]
    limit: Option<usize>,

    /// Newline-delimited list of first and last names
    #[arg(long, value_name = "FILE")]
    names: PathBuf,

    /// JSON file overriding waits and heuristics
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// WebSocket endpoint of a running browser instead of launching one
    #[arg(long, value_name = "URL")]
    connect: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,
}

fn open_session(cli: &Cli) -> Result<BrowserSession> {
    if let Some(ws_url) = &cli.connect {
        return BrowserSession::connect(ConnectionOptions::new(ws_url.as_str()))
            .with_context(|| format!("Failed to connect to {}", ws_url));
    }

    let mut options = LaunchOptions::new().headless(!cli.headed);
    if let Some(path) = &cli.chrome {
        options = options.chrome_path(path);
    }
    BrowserSession::launch(options).context("Failed to launch browser")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScrapeConfig::from_path(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => ScrapeConfig::default(),
    };
    let limit = match cli.limit {
        Some(n) => ProfileLimit::bounded(n)?,
        None => ProfileLimit::unbounded(),
    };
    let oracle = NameOracle::from_path(&cli.names)
        .with_context(|| format!("Failed to load names from {}", cli.names.display()))?;
    if oracle.is_empty() {
        anyhow::bail!("{} contains no names", cli.names.display());
    }

    let sitemap = HttpSitemap::new(config.max_sitemap_documents)?;
    let orchestrator = Orchestrator::new(config, Box::new(sitemap));
    let mut session = open_session(&cli)?;

    let mut reports: Vec<JobReport> = Vec::with_capacity(cli.domains.len());
    for domain in &cli.domains {
        let job = CrawlJob::new(domain.as_str(), cli.category, limit);
        let report = {
            let mut tab = SecondaryTab::open(&mut session)?;
            let page: &mut dyn Page = &mut *tab;
            orchestrator.run(page, &oracle, job)
        };
        log::info!(
            "{}: {:?} with {} profiles (fail reason: {})",
            domain,
            report.job.status(),
            report.profiles.len(),
            report.job.fail_reason()
        );
        reports.push(report);
    }

    let json = serde_json::to_string_pretty(&reports)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {} reports to {}", reports.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
