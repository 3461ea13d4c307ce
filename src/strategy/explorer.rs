//! Filter space exploration.
//!
//! Team pages often show only part of their people until a filter or a
//! search is applied. The explorer enumerates the dropdown filters whose
//! options name a practice or a title, runs one extraction per combination,
//! and falls back to keyword search or to a single unfiltered pass.

use crate::dom::{DomTree, ElementLocator, NodeId};
use crate::error::{Result, ScrapeError};
use crate::job::FirmCategory;
use crate::profile::ProfileRecord;
use crate::strategy::extract::harvest;
use crate::strategy::StrategyContext;
use std::fmt;
use url::Url;

/// A dropdown and the options worth choosing in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterControl {
    pub locator: ElementLocator,
    pub options: Vec<String>,
}

/// One option chosen in one control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChoice {
    pub control: ElementLocator,
    pub option: String,
}

/// Choices applied in order before a search; empty means no filtering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfiguration(pub Vec<FilterChoice>);

impl FilterConfiguration {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn choices(&self) -> &[FilterChoice] {
        &self.0
    }
}

impl fmt::Display for FilterConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no filters");
        }
        let options: Vec<&str> = self.0.iter().map(|c| c.option.as_str()).collect();
        write!(f, "[{}]", options.join(", "))
    }
}

/// Dropdowns with at least one option from the category's vocabularies
pub fn find_filter_controls(tree: &DomTree, category: FirmCategory) -> Vec<FilterControl> {
    tree.find_all_by_tag("select")
        .into_iter()
        .filter_map(|select| {
            let options: Vec<String> = tree
                .descendants_by_tag(select, "option")
                .into_iter()
                .map(|option| tree.text(option))
                .filter(|text| category.is_filter_keyword(text))
                .collect();
            if options.is_empty() {
                return None;
            }
            log::debug!("Filter {} offers {:?}", tree.locator(select), options);
            Some(FilterControl {
                locator: tree.locator(select),
                options,
            })
        })
        .collect()
}

/// Cross product of the controls' options, in control order.
///
/// With no controls the result is the single empty configuration.
pub fn configurations(controls: &[FilterControl]) -> Vec<FilterConfiguration> {
    controls.iter().fold(vec![FilterConfiguration::default()], |acc, control| {
        acc.iter()
            .flat_map(|prefix| {
                control.options.iter().map(move |option| {
                    let mut choices = prefix.0.clone();
                    choices.push(FilterChoice {
                        control: control.locator.clone(),
                        option: option.clone(),
                    });
                    FilterConfiguration(choices)
                })
            })
            .collect()
    })
}

/// First button whose markup mentions "search"
pub fn find_search_button(tree: &DomTree) -> Option<NodeId> {
    tree.find_all_by_tag("button")
        .into_iter()
        .find(|&button| tree.markup(button).contains("search"))
}

/// First visible, enabled text input whose markup mentions "search"
pub fn find_search_box(tree: &DomTree) -> Option<NodeId> {
    tree.find_all_by_tag("input").into_iter().find(|&input| {
        let kind = tree.attribute(input, "type").unwrap_or("text").to_ascii_lowercase();
        !matches!(kind.as_str(), "hidden" | "submit" | "button" | "checkbox" | "radio")
            && tree.is_displayed(input)
            && tree.is_enabled(input)
            && tree.markup(input).contains("search")
    })
}

fn reload(context: &mut StrategyContext<'_>, team_url: &Url) -> Result<()> {
    context.page.navigate(team_url)?;
    context.page.settle(context.config.page_load_wait);
    Ok(())
}

fn apply_configuration(
    context: &mut StrategyContext<'_>,
    team_url: &Url,
    configuration: &FilterConfiguration,
    fresh: bool,
) -> Result<Vec<ProfileRecord>> {
    if !fresh {
        reload(context, team_url)?;
    }
    for choice in configuration.choices() {
        context.page.select_option(&choice.control, &choice.option)?;
        context.page.settle(context.config.select_settle);
    }

    let tree = context.page.snapshot()?;
    match find_search_button(&tree) {
        Some(button) => {
            if let Err(e) = context.page.click(&tree.locator(button)) {
                log::debug!("Search button click failed: {}", e);
            }
            context.page.settle(context.config.search_settle);
        }
        None => log::debug!("No search button on {}", team_url),
    }
    harvest(context)
}

fn submit_search_term(context: &mut StrategyContext<'_>, team_url: &Url, term: &str, fresh: bool) -> Result<Vec<ProfileRecord>> {
    if !fresh {
        reload(context, team_url)?;
    }
    let tree = context.page.snapshot()?;
    let search_box = find_search_box(&tree)
        .ok_or_else(|| ScrapeError::ElementNotFound(format!("Search box on {}", team_url)))?;
    context.page.submit_text(&tree.locator(search_box), term)?;
    context.page.settle(context.config.search_settle);
    harvest(context)
}

/// Tally of attempts; the explorer fails when nothing ever worked
#[derive(Debug, Default)]
struct Attempts {
    tried: usize,
    failed: usize,
}

impl Attempts {
    fn record(&mut self, label: &str, outcome: Result<Vec<ProfileRecord>>, profiles: &mut Vec<ProfileRecord>) {
        self.tried += 1;
        match outcome {
            Ok(found) if !found.is_empty() => {
                log::info!("{} yielded {} profiles", label, found.len());
                profiles.extend(found);
            }
            Ok(_) => {
                log::info!("{} yielded no profiles", label);
                self.failed += 1;
            }
            Err(e) => {
                log::info!("{} failed: {}", label, e);
                self.failed += 1;
            }
        }
    }

    fn all_failed(&self) -> bool {
        self.tried > 0 && self.tried == self.failed
    }
}

/// Run every filter configuration, or the search-box fallback, against the
/// team page and collect what each extraction finds.
pub fn explore_team_page(context: &mut StrategyContext<'_>, team_url: &Url) -> Result<Vec<ProfileRecord>> {
    reload(context, team_url)?;
    let tree = context.page.snapshot()?;
    let category = context.job.category;

    let controls = find_filter_controls(&tree, category);
    let configurations = configurations(&controls);
    log::info!(
        "Found {} filter controls, {} configurations on {}",
        controls.len(),
        configurations.len(),
        team_url
    );

    let mut profiles = Vec::new();
    let mut attempts = Attempts::default();

    if controls.is_empty() {
        let terms = category.search_terms();
        if category != FirmCategory::Law || terms.is_empty() {
            return harvest(context);
        }
        if find_search_box(&tree).is_none() {
            log::info!("No filters and no search box, running one unfiltered pass");
            return harvest(context);
        }

        for (i, term) in terms.iter().enumerate() {
            let outcome = submit_search_term(context, team_url, term, i == 0);
            attempts.record(&format!("Search '{}'", term), outcome, &mut profiles);
            if context.job.limit_reached() {
                log::info!("Limit reached after searching '{}'", term);
                break;
            }
        }
    } else {
        for (i, configuration) in configurations.iter().enumerate() {
            let outcome = apply_configuration(context, team_url, configuration, i == 0);
            attempts.record(&format!("Configuration {}", configuration), outcome, &mut profiles);
            if context.job.limit_reached() {
                log::info!("Limit reached after configuration {}", configuration);
                break;
            }
        }
    }

    if attempts.all_failed() {
        return Err(ScrapeError::NoEffectiveFilter);
    }
    Ok(profiles)
}
