use crate::dom::DomTree;
use crate::error::{Result, ScrapeError};
use crate::job::{FirmCategory, StrategyKind};
use crate::keywords::path_matches;
use crate::profile::ProfileRecord;
use crate::strategy::explorer::explore_team_page;
use crate::strategy::utils::resolve_web_link;
use crate::strategy::{Strategy, StrategyContext};
use url::Url;

/// Path of an href as written, before it is resolved against the page
fn href_path(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

/// First anchor, in document order, whose href path contains a team page
/// keyword for `category`.
///
/// Only the href's own path is matched, so relative links do not pick up
/// keywords from the directory of the page they sit on.
pub fn find_team_page(tree: &DomTree, base: &Url, category: FirmCategory) -> Result<Url> {
    let keywords = category.team_page_keywords();
    let anchors = tree.find_all_by_tag("a");
    if anchors.is_empty() {
        log::error!("{} had no anchors", base);
    }

    anchors
        .into_iter()
        .filter_map(|anchor| tree.attribute(anchor, "href"))
        .filter(|href| path_matches(&href_path(href), &keywords))
        .find_map(|href| resolve_web_link(base, href))
        .ok_or(ScrapeError::TeamPageNotFound)
}

/// Load the job's homepage and find its team page
pub fn locate_team_page(context: &mut StrategyContext<'_>) -> Result<Url> {
    let homepage = context.job.homepage()?;
    context.page.navigate(&homepage)?;
    context.page.settle(context.config.page_load_wait);

    // Redirects (http to https, www) change the base links resolve against
    let base = context.page.current_url()?;
    let tree = context.page.snapshot()?;
    let team_url = find_team_page(&tree, &base, context.job.category)?;
    log::info!("Found team page for {}: {}", context.job.domain, team_url);
    Ok(team_url)
}

/// Homepage, then team page, then filter exploration and extraction
#[derive(Debug, Default)]
pub struct TeamPageStrategy;

impl Strategy for TeamPageStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TeamPage
    }

    fn run(&self, context: &mut StrategyContext<'_>) -> Result<Vec<ProfileRecord>> {
        let team_url = locate_team_page(context)?;
        context.job.team_url = Some(team_url.clone());
        explore_team_page(context, &team_url)
    }
}
