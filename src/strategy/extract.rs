//! Card extraction and pagination.
//!
//! A pass walks every unprocessed card matched by the inferred selector,
//! turns each into a [`ProfileRecord`] and tags it as processed on the live
//! page. Passes repeat across result pages until pagination runs out or the
//! job limit is reached.

use crate::dom::{DomTree, NodeId, Page, SecondaryTab};
use crate::error::Result;
use crate::profile::ProfileRecord;
use crate::strategy::selector::{infer_profile_selector, ProfileSelector};
use crate::strategy::StrategyContext;
use std::time::Duration;
use url::Url;

/// Position in a paginated result set, owned by one extraction run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    page_index: usize,
    exhausted: bool,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self {
            page_index: 1,
            exhausted: false,
        }
    }

    /// 1-based index of the result page being read
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn mark_exhausted(&mut self) {
        self.exhausted = true;
    }

    /// First anchor reading "more" or the next page number
    pub fn next_link(&self, tree: &DomTree) -> Option<NodeId> {
        let next_number = (self.page_index + 1).to_string();
        tree.find_all_by_tag("a").into_iter().find(|&anchor| {
            let text = tree.text(anchor);
            let text = text.trim();
            text.eq_ignore_ascii_case("more") || text == next_number
        })
    }

    /// Follow the next-page link if there is one.
    ///
    /// Returns `false` and marks the cursor exhausted when there is no such
    /// link or clicking it fails.
    pub fn advance(&mut self, page: &mut dyn Page, settle: Duration) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let tree = page.snapshot()?;
        let Some(link) = self.next_link(&tree) else {
            log::info!("No link past page {}, pagination exhausted", self.page_index);
            self.exhausted = true;
            return Ok(false);
        };

        let locator = tree.locator(link);
        if let Err(e) = page.click(&locator) {
            log::warn!("Failed to follow pagination link {}: {}", locator, e);
            self.exhausted = true;
            return Ok(false);
        }
        page.settle(settle);
        self.page_index += 1;
        log::info!("Moved to result page {}", self.page_index);
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassOutcome {
    Continue,
    LimitReached,
}

/// A card is rejected when it holds too many anchors (a navigation block
/// rather than a person) or wraps a single empty child.
pub fn is_invalid_card(tree: &DomTree, card: NodeId, max_anchors: usize) -> bool {
    if tree.subtree_by_tag(card, "a").len() > max_anchors {
        return true;
    }
    matches!(tree.children(card), [only] if tree.text(*only).is_empty())
}

/// Merge the contacts found on a card's full profile page.
///
/// The page is opened in its own tab, which is closed again on every path.
fn merge_full_profile(page: &mut dyn Page, url: &Url, record: &mut ProfileRecord, wait: Duration) -> Result<()> {
    let mut tab = SecondaryTab::open(page)?;
    tab.navigate(url)?;
    tab.settle(wait);
    let tree = tab.snapshot()?;
    record.add_links_from(&tree, tree.root());
    Ok(())
}

fn run_pass(
    context: &mut StrategyContext<'_>,
    tree: &DomTree,
    selector: &ProfileSelector,
    profiles: &mut Vec<ProfileRecord>,
) -> Result<PassOutcome> {
    if context.job.limit_reached() {
        return Ok(PassOutcome::LimitReached);
    }

    let page_url = context.page.current_url()?;
    let cards = selector.select(tree);
    log::info!("Processing {} cards matching {}", cards.len(), selector);

    for card in cards {
        let locator = tree.locator(card);
        let mut record = ProfileRecord::new(page_url.clone(), context.job.category);
        record.add_links_from(tree, card);
        record.is_invalid = is_invalid_card(tree, card, context.config.max_card_anchors);

        if record.is_invalid {
            log::debug!("Skipping invalid card {}", locator);
            context.page.mark_processed(&locator)?;
            continue;
        }
        if !context.job.try_accept() {
            return Ok(PassOutcome::LimitReached);
        }

        let text = tree.text(card);
        record.apply_text_lines(
            text.lines(),
            context.oracle,
            context.config.max_name_line_tokens,
            context.config.name_score_ratio,
        );

        if !record.contains_email() && context.config.follow_profile_links {
            if let Some(url) = record.full_profile_url() {
                log::debug!("No email on card, visiting {}", url);
                if let Err(e) = merge_full_profile(context.page, &url, &mut record, context.config.page_load_wait) {
                    log::warn!("Failed to read full profile at {}: {}", url, e);
                }
            }
        }

        context.page.mark_processed(&locator)?;
        log::debug!("Accepted {:?} ({} of {})", record.name, context.job.count(), context.job.limit);
        profiles.push(record);

        if context.job.limit_reached() {
            log::info!("Reached the limit of {} profiles", context.job.limit);
            return Ok(PassOutcome::LimitReached);
        }
    }
    Ok(PassOutcome::Continue)
}

/// Harvest the currently loaded result set, following pagination.
///
/// The card selector is inferred from the first page; failing that is an
/// error. On later pages where the selector no longer matches anything,
/// inference runs once more and pagination ends if that does not help.
///
/// On error the records of this harvest are dropped and the job counter is
/// rewound to where it stood before.
pub fn harvest(context: &mut StrategyContext<'_>) -> Result<Vec<ProfileRecord>> {
    let accepted_before = context.job.count();
    let mut profiles = Vec::new();
    match harvest_pages(context, &mut profiles) {
        Ok(()) => Ok(profiles),
        Err(e) => {
            let accepted = context.job.count() - accepted_before;
            if accepted > 0 {
                log::warn!("Harvest failed, dropping {} accepted profiles: {}", accepted, e);
                context.job.rewind_to(accepted_before);
            }
            Err(e)
        }
    }
}

fn harvest_pages(context: &mut StrategyContext<'_>, profiles: &mut Vec<ProfileRecord>) -> Result<()> {
    let mut cursor = PaginationCursor::new();

    let mut tree = context.page.snapshot()?;
    let mut selector = infer_profile_selector(&tree, context.oracle, context.config.name_element_cap)?;

    loop {
        if selector.select(&tree).is_empty() {
            log::info!("{} matched nothing on page {}, inferring again", selector, cursor.page_index());
            match infer_profile_selector(&tree, context.oracle, context.config.name_element_cap) {
                Ok(inferred) if !inferred.select(&tree).is_empty() => selector = inferred,
                Ok(_) => {
                    log::info!("No unprocessed cards left");
                    cursor.mark_exhausted();
                    break;
                }
                Err(e) => {
                    log::info!("Stopping pagination: {}", e);
                    cursor.mark_exhausted();
                    break;
                }
            }
        }

        if run_pass(context, &tree, &selector, profiles)? == PassOutcome::LimitReached {
            break;
        }
        if cursor.page_index() >= context.config.max_pages {
            log::warn!("Stopping after {} result pages", cursor.page_index());
            cursor.mark_exhausted();
            break;
        }
        if !cursor.advance(context.page, context.config.pagination_settle)? {
            break;
        }
        tree = context.page.snapshot()?;
    }

    log::info!("Harvested {} profiles over {} pages", profiles.len(), cursor.page_index());
    Ok(())
}
