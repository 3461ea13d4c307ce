//! Sitemap fallback.
//!
//! When the team page route fails, candidate pages come from the site's
//! sitemaps instead. Every page whose path looks like a team or bio page is
//! visited and read as exactly one profile.

use crate::error::{Result, ScrapeError};
use crate::job::StrategyKind;
use crate::keywords::path_matches;
use crate::names::match_name;
use crate::profile::ProfileRecord;
use crate::strategy::{Strategy, StrategyContext};
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static PAGE_LOC: LazyLock<Selector> = LazyLock::new(|| Selector::parse("url > loc").expect("valid selector"));
static SITEMAP_LOC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("sitemap > loc").expect("valid selector"));

/// Source of candidate page URLs for a site
pub trait SitemapDiscovery {
    /// Page URLs of the site rooted at `homepage`, produced lazily.
    ///
    /// Each call starts a fresh walk.
    fn discover<'a>(&'a self, homepage: &Url) -> Result<Box<dyn Iterator<Item = Url> + 'a>>;
}

/// Fixed list of page URLs, handy when the URLs are already known
impl SitemapDiscovery for Vec<Url> {
    fn discover<'a>(&'a self, _homepage: &Url) -> Result<Box<dyn Iterator<Item = Url> + 'a>> {
        Ok(Box::new(self.iter().cloned()))
    }
}

/// Locations listed in one sitemap document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// `<url><loc>` entries
    pub pages: Vec<Url>,
    /// `<sitemap><loc>` entries of a sitemap index
    pub sitemaps: Vec<Url>,
}

/// Parse a sitemap or sitemap index. Unparseable locations are skipped.
pub fn parse_sitemap(xml: &str) -> SitemapDocument {
    let document = Html::parse_document(xml);
    let locations = |selector: &Selector| -> Vec<Url> {
        document
            .select(selector)
            .filter_map(|loc| {
                let text = loc.text().collect::<String>();
                Url::parse(text.trim()).ok()
            })
            .collect()
    };
    SitemapDocument {
        pages: locations(&PAGE_LOC),
        sitemaps: locations(&SITEMAP_LOC),
    }
}

/// `Sitemap:` entries of a robots.txt
pub fn robots_sitemaps(robots: &str) -> Vec<Url> {
    robots
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            Url::parse(value.trim()).ok()
        })
        .collect()
}

/// Sitemap discovery over HTTP.
///
/// Starts from the `Sitemap:` lines of `robots.txt` plus `/sitemap.xml`,
/// then follows nested indexes until `max_documents` have been fetched.
#[derive(Debug, Clone)]
pub struct HttpSitemap {
    client: reqwest::blocking::Client,
    max_documents: usize,
}

impl HttpSitemap {
    pub fn new(max_documents: usize) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("firm-scrape/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScrapeError::Sitemap(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, max_documents))
    }

    pub fn with_client(client: reqwest::blocking::Client, max_documents: usize) -> Self {
        Self { client, max_documents }
    }

    fn fetch(&self, url: &Url) -> Result<String> {
        log::debug!("Fetching {}", url);
        self.client
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| ScrapeError::Sitemap(format!("{}: {}", url, e)))
    }

    fn roots(&self, homepage: &Url) -> Result<Vec<Url>> {
        let robots_url = homepage
            .join("/robots.txt")
            .map_err(|e| ScrapeError::invalid_url(homepage.as_str(), e))?;
        let mut roots = match self.fetch(&robots_url) {
            Ok(robots) => robots_sitemaps(&robots),
            Err(e) => {
                log::debug!("No robots.txt: {}", e);
                Vec::new()
            }
        };
        let default = homepage
            .join("/sitemap.xml")
            .map_err(|e| ScrapeError::invalid_url(homepage.as_str(), e))?;
        if !roots.contains(&default) {
            roots.push(default);
        }
        Ok(roots)
    }
}

impl SitemapDiscovery for HttpSitemap {
    fn discover<'a>(&'a self, homepage: &Url) -> Result<Box<dyn Iterator<Item = Url> + 'a>> {
        let roots = self.roots(homepage)?;
        log::info!("Walking sitemaps from {:?}", roots.iter().map(Url::as_str).collect::<Vec<_>>());
        Ok(Box::new(SitemapWalk {
            source: self,
            seen: roots.iter().cloned().collect(),
            documents: roots.into(),
            pages: VecDeque::new(),
            fetched: 0,
        }))
    }
}

/// Lazy walk over sitemap documents, yielding page URLs in document order
struct SitemapWalk<'a> {
    source: &'a HttpSitemap,
    documents: VecDeque<Url>,
    pages: VecDeque<Url>,
    seen: HashSet<Url>,
    fetched: usize,
}

impl Iterator for SitemapWalk<'_> {
    type Item = Url;

    fn next(&mut self) -> Option<Url> {
        loop {
            if let Some(page) = self.pages.pop_front() {
                return Some(page);
            }
            if self.fetched >= self.source.max_documents {
                return None;
            }
            let document = self.documents.pop_front()?;
            self.fetched += 1;

            match self.source.fetch(&document) {
                Ok(xml) => {
                    let parsed = parse_sitemap(&xml);
                    log::debug!(
                        "{} lists {} pages and {} sitemaps",
                        document,
                        parsed.pages.len(),
                        parsed.sitemaps.len()
                    );
                    // Nested sitemaps are read before the siblings of their index
                    for nested in parsed.sitemaps.into_iter().rev() {
                        if self.seen.insert(nested.clone()) {
                            self.documents.push_front(nested);
                        }
                    }
                    self.pages.extend(parsed.pages);
                }
                Err(e) => log::warn!("Skipping sitemap: {}", e),
            }
        }
    }
}

/// Visit every sitemap page whose path looks like a team page and read one
/// profile from each.
pub struct SitemapStrategy {
    discovery: Box<dyn SitemapDiscovery>,
}

impl SitemapStrategy {
    pub fn new(discovery: Box<dyn SitemapDiscovery>) -> Self {
        Self { discovery }
    }

    fn read_profile(context: &mut StrategyContext<'_>, url: &Url) -> Result<ProfileRecord> {
        context.page.navigate(url)?;
        context.page.settle(context.config.page_load_wait);
        let tree = context.page.snapshot()?;

        let mut record = ProfileRecord::new(url.clone(), context.job.category);
        record.add_links_from(&tree, tree.root());
        record.name = tree
            .find_all_by_tag("h1")
            .into_iter()
            .chain(tree.find_all_by_tag("h2"))
            .find_map(|heading| match_name(&tree.text(heading), context.oracle));

        let text = tree.text(tree.root());
        if text.lines().any(|line| context.job.category.is_key_line(line)) {
            record.is_key = true;
        }
        Ok(record)
    }
}

impl Strategy for SitemapStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sitemap
    }

    fn run(&self, context: &mut StrategyContext<'_>) -> Result<Vec<ProfileRecord>> {
        let homepage = context.job.homepage()?;
        let keywords = context.job.category.team_page_keywords();
        let mut profiles = Vec::new();

        for url in self.discovery.discover(&homepage)? {
            if !path_matches(url.path(), &keywords) {
                continue;
            }
            if context.job.limit_reached() {
                log::info!("Reached the limit of {} profiles", context.job.limit);
                break;
            }
            match Self::read_profile(context, &url) {
                Ok(record) => {
                    if context.job.try_accept() {
                        log::debug!("Read {:?} from {}", record.name, url);
                        profiles.push(record);
                    }
                }
                Err(e) => log::warn!("Skipping {}: {}", url, e),
            }
        }

        if profiles.is_empty() {
            return Err(ScrapeError::NoProfilePages);
        }
        log::info!("Sitemap yielded {} profiles", profiles.len());
        Ok(profiles)
    }
}
