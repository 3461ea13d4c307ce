use crate::config::ScrapeConfig;
use crate::dom::Page;
use crate::job::CrawlJob;
use crate::names::NameOracle;
use crate::profile::ProfileRecord;
use crate::strategy::sitemap::{SitemapDiscovery, SitemapStrategy};
use crate::strategy::team_page::TeamPageStrategy;
use crate::strategy::{Strategy, StrategyContext};
use serde::Serialize;

/// A finished job and the profiles it produced
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: CrawlJob,
    pub profiles: Vec<ProfileRecord>,
}

/// Runs strategies in order until one succeeds.
///
/// A failed strategy's error becomes the job's fail reason unless an
/// earlier strategy already failed; its accepted profiles are discarded.
/// The job ends `Completed` with the first successful strategy's profiles,
/// or `Failed` when every strategy failed.
pub struct Orchestrator {
    strategies: Vec<Box<dyn Strategy>>,
    config: ScrapeConfig,
}

impl Orchestrator {
    /// Team page strategy first, then the sitemap fallback
    pub fn new(config: ScrapeConfig, sitemap: Box<dyn SitemapDiscovery>) -> Self {
        let strategies: Vec<Box<dyn Strategy>> =
            vec![Box::new(TeamPageStrategy), Box::new(SitemapStrategy::new(sitemap))];
        Self::with_strategies(config, strategies)
    }

    pub fn with_strategies(config: ScrapeConfig, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies, config }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn run(&self, page: &mut dyn Page, oracle: &NameOracle, mut job: CrawlJob) -> JobReport {
        log::info!("Starting job for {} ({}, limit {})", job.domain, job.category, job.limit);

        for strategy in &self.strategies {
            job.start(strategy.kind());
            let outcome = {
                let mut context = StrategyContext::new(&mut *page, oracle, &self.config, &mut job);
                strategy.run(&mut context)
            };

            match outcome {
                Ok(profiles) => {
                    log::info!(
                        "{} strategy found {} profiles for {}",
                        strategy.kind(),
                        profiles.len(),
                        job.domain
                    );
                    job.complete();
                    return JobReport { job, profiles };
                }
                Err(e) => {
                    if e.is_strategy_failure() {
                        log::warn!("{} strategy failed for {}: {}", strategy.kind(), job.domain, e);
                    } else {
                        log::error!("{} strategy failed for {}: {}", strategy.kind(), job.domain, e);
                    }
                    job.record_failure(e.to_string());
                    job.discard_accepted();
                }
            }
        }

        let reason = job.fail_reason().to_string();
        job.fail(reason);
        log::info!("Job for {} failed: {}", job.domain, job.fail_reason());
        JobReport {
            job,
            profiles: Vec::new(),
        }
    }
}
