use crate::error::{Result, ScrapeError};
use crate::strategy::utils::homepage_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Fail reason of a job that has not failed
pub const NO_FAILURE: &str = "N/A";

/// Firm category; selects which keyword vocabularies apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "UPPERCASE")]
pub enum FirmCategory {
    Law,
    Investment,
}

impl fmt::Display for FirmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirmCategory::Law => f.write_str("LAW"),
            FirmCategory::Investment => f.write_str("INVESTMENT"),
        }
    }
}

impl FromStr for FirmCategory {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LAW" => Ok(FirmCategory::Law),
            "INVESTMENT" => Ok(FirmCategory::Investment),
            other => Err(ScrapeError::Config(format!("Unknown firm category '{}'", other))),
        }
    }
}

/// Maximum number of accepted profiles for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileLimit(Option<usize>);

impl ProfileLimit {
    pub fn unbounded() -> Self {
        Self(None)
    }

    pub fn bounded(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(ScrapeError::Config("Profile limit must be positive".to_string()));
        }
        Ok(Self(Some(limit)))
    }

    /// Whether one more profile may be accepted once `count` are accepted
    pub fn allows(&self, count: usize) -> bool {
        self.0.is_none_or(|limit| count < limit)
    }

    pub fn get(&self) -> Option<usize> {
        self.0
    }
}

impl fmt::Display for ProfileLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(limit) => write!(f, "{}", limit),
            None => f.write_str("unbounded"),
        }
    }
}

/// Extraction path a running job is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    TeamPage,
    Sitemap,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::TeamPage => f.write_str("team page"),
            StrategyKind::Sitemap => f.write_str("sitemap"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running(StrategyKind),
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One domain to crawl, with its progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    pub domain: String,
    pub category: FirmCategory,
    pub limit: ProfileLimit,
    count: usize,
    status: JobStatus,
    fail_reason: String,
    pub team_url: Option<Url>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlJob {
    pub fn new(domain: impl Into<String>, category: FirmCategory, limit: ProfileLimit) -> Self {
        Self {
            domain: domain.into(),
            category,
            limit,
            count: 0,
            status: JobStatus::Pending,
            fail_reason: NO_FAILURE.to_string(),
            team_url: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Homepage URL for the job's domain
    pub fn homepage(&self) -> Result<Url> {
        homepage_url(&self.domain)
    }

    /// Profiles accepted so far
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn fail_reason(&self) -> &str {
        &self.fail_reason
    }

    /// Count one more valid profile. Returns `false`, leaving the counter
    /// untouched, when the limit is already reached.
    pub fn try_accept(&mut self) -> bool {
        if self.limit.allows(self.count) {
            self.count += 1;
            true
        } else {
            false
        }
    }

    pub fn limit_reached(&self) -> bool {
        !self.limit.allows(self.count)
    }

    /// Forget profiles accepted by a strategy whose results were dropped
    pub(crate) fn discard_accepted(&mut self) {
        self.rewind_to(0);
    }

    /// Drop acceptances made after the counter stood at `count`
    pub(crate) fn rewind_to(&mut self, count: usize) {
        self.count = self.count.min(count);
    }

    /// Keep `reason` as the fail reason unless an earlier one was recorded
    pub(crate) fn record_failure(&mut self, reason: impl Into<String>) {
        if self.fail_reason == NO_FAILURE && !self.status.is_terminal() {
            self.fail_reason = reason.into();
        }
    }

    /// Enter `strategy`; ignored once the job is terminal
    pub fn start(&mut self, strategy: StrategyKind) {
        if self.status.is_terminal() {
            log::warn!("Job {} is already {:?}; not starting {}", self.domain, self.status, strategy);
            return;
        }
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.status = JobStatus::Running(strategy);
    }

    pub fn complete(&mut self) {
        self.finish(JobStatus::Completed);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.fail_reason = reason.into();
        self.finish(JobStatus::Failed);
    }

    fn finish(&mut self, status: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}
