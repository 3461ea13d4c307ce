//! Extraction strategies
//!
//! A [`Strategy`] turns a job into profile records by driving a [`Page`].
//! The team page strategy chains the locator, the filter explorer and the
//! extraction loop; the sitemap strategy is the fallback. The
//! [`Orchestrator`] runs them in order and keeps the job's state machine.

pub mod explorer;
pub mod extract;
pub mod orchestrator;
pub mod selector;
pub mod sitemap;
pub mod team_page;
pub mod utils;

pub use explorer::{FilterChoice, FilterConfiguration, FilterControl};
pub use extract::PaginationCursor;
pub use orchestrator::{JobReport, Orchestrator};
pub use selector::ProfileSelector;
pub use sitemap::{HttpSitemap, SitemapDiscovery, SitemapStrategy};
pub use team_page::TeamPageStrategy;

use crate::config::ScrapeConfig;
use crate::dom::Page;
use crate::error::Result;
use crate::job::{CrawlJob, StrategyKind};
use crate::names::NameOracle;
use crate::profile::ProfileRecord;

/// Everything a strategy needs while it runs one job
pub struct StrategyContext<'a> {
    /// Browsing context owned by the job
    pub page: &'a mut dyn Page,

    pub oracle: &'a NameOracle,

    pub config: &'a ScrapeConfig,

    /// Job being processed; strategies update its counter and team URL
    pub job: &'a mut CrawlJob,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        page: &'a mut dyn Page,
        oracle: &'a NameOracle,
        config: &'a ScrapeConfig,
        job: &'a mut CrawlJob,
    ) -> Self {
        Self { page, oracle, config, job }
    }
}

/// One way of turning a job into profiles
pub trait Strategy {
    fn kind(&self) -> StrategyKind;

    fn run(&self, context: &mut StrategyContext<'_>) -> Result<Vec<ProfileRecord>>;
}
