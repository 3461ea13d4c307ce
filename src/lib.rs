//! # firm-scrape
//!
//! Finds the team page of a firm's website and extracts one profile per
//! person listed there, without any site-specific configuration.
//!
//! ## How a job runs
//!
//! 1. The homepage's anchors are matched against team page keywords.
//! 2. On the team page, dropdown filters whose options name a practice or a
//!    title are explored one combination at a time (law firms without
//!    filters get a keyword search instead).
//! 3. For every result set, a selector matching one card per person is
//!    inferred from elements whose text is a known name, and the cards are
//!    harvested page by page.
//! 4. If any of that fails, pages listed in the site's sitemaps are read as
//!    one profile each.
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use firm_scrape::{BrowserSession, CrawlJob, FirmCategory, HttpSitemap, LaunchOptions};
//! use firm_scrape::{NameOracle, Orchestrator, ProfileLimit, ScrapeConfig};
//!
//! # fn main() -> firm_scrape::Result<()> {
//! let oracle = NameOracle::from_path("names.txt")?;
//! let config = ScrapeConfig::default();
//! let sitemap = HttpSitemap::new(config.max_sitemap_documents)?;
//! let orchestrator = Orchestrator::new(config, Box::new(sitemap));
//!
//! let mut session = BrowserSession::launch(LaunchOptions::default())?;
//! let job = CrawlJob::new("example-law.com", FirmCategory::Law, ProfileLimit::bounded(50)?);
//! let report = orchestrator.run(&mut session, &oracle, job);
//!
//! for profile in &report.profiles {
//!     println!("{:?} <{}>", profile.name, profile.joined_emails());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing without a browser
//!
//! Every step drives the [`Page`] trait. [`StaticSite`] implements it over
//! in-memory HTML documents, so whole jobs can run in unit tests.
//!
//! ## Module Overview
//!
//! - [`browser`]: Chrome session management and configuration
//! - [`dom`]: Page snapshots, element locators and the `Page` capability
//! - [`strategy`]: Team page location, filter exploration, selector inference, extraction
//! - [`names`]: Name oracle and text scoring
//! - [`keywords`]: Vocabularies per firm category
//! - [`job`], [`profile`]: Crawl jobs and the records they produce
//! - [`config`]: Tuning knobs and waits
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod job;
pub mod keywords;
pub mod names;
pub mod profile;
pub mod strategy;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use config::ScrapeConfig;
pub use dom::{DomTree, ElementLocator, ElementNode, Page, SecondaryTab, StaticSite};
pub use error::{Result, ScrapeError};
pub use job::{CrawlJob, FirmCategory, JobStatus, ProfileLimit, StrategyKind};
pub use names::NameOracle;
pub use profile::ProfileRecord;
pub use strategy::{HttpSitemap, JobReport, Orchestrator, SitemapDiscovery, Strategy, StrategyContext};
