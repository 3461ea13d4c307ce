use crate::dom::locator::ElementLocator;
use crate::dom::page::{Page, TabId};
use crate::dom::tree::{DomTree, NodeId, PROCESSED_ATTR};
use crate::error::{Result, ScrapeError};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const EMPTY_DOCUMENT: &str = "<html><head></head><body></body></html>";

#[derive(Debug, Clone, Default)]
struct TabState {
    url: Option<Url>,
    tree: Option<DomTree>,
    selections: Vec<(String, String)>,
}

/// In-memory [`Page`] over a fixed set of HTML documents.
///
/// Behaves like a small server-rendered site:
/// - following an anchor loads the document registered for its URL;
/// - choosing `<select>` options and then clicking a button whose markup
///   mentions "search" loads `<current url>?<name>=<option>&...`;
/// - submitting text into an input loads `<current url>?<name>=<text>`.
///
/// Query URLs with no registered document load an empty page, which reads as
/// "no results". Navigating to any other unknown URL fails.
#[derive(Debug, Clone)]
pub struct StaticSite {
    documents: HashMap<String, String>,
    tabs: IndexMap<TabId, TabState>,
    current: TabId,
    next_tab: usize,
    history: Vec<Url>,
}

impl Default for StaticSite {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticSite {
    pub fn new() -> Self {
        let current = TabId("tab-0".to_string());
        let mut tabs = IndexMap::new();
        tabs.insert(current.clone(), TabState::default());
        Self {
            documents: HashMap::new(),
            tabs,
            current,
            next_tab: 1,
            history: Vec::new(),
        }
    }

    /// Builder method: register a document
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.add_page(url, html);
        self
    }

    /// Register a document under `url`
    pub fn add_page(&mut self, url: &str, html: impl Into<String>) {
        let key = Url::parse(url).map(|u| page_key(&u)).unwrap_or_else(|_| url.to_string());
        self.documents.insert(key, html.into());
    }

    /// Every URL loaded so far, in order
    pub fn history(&self) -> &[Url] {
        &self.history
    }

    /// Number of open tabs
    pub fn open_tabs(&self) -> usize {
        self.tabs.len()
    }

    fn state(&self) -> Result<&TabState> {
        self.tabs
            .get(&self.current)
            .ok_or_else(|| ScrapeError::TabOperationFailed(format!("Tab {} is closed", self.current)))
    }

    fn state_mut(&mut self) -> Result<&mut TabState> {
        let current = self.current.clone();
        self.tabs
            .get_mut(&current)
            .ok_or_else(|| ScrapeError::TabOperationFailed(format!("Tab {} is closed", current)))
    }

    fn tree(&self) -> Result<&DomTree> {
        self.state()?
            .tree
            .as_ref()
            .ok_or_else(|| ScrapeError::ElementNotFound("Tab has no document".to_string()))
    }

    fn resolve(&self, target: &ElementLocator) -> Result<(NodeId, &DomTree)> {
        let tree = self.tree()?;
        let id = tree
            .resolve_css_path(target.best_selector())
            .ok_or_else(|| ScrapeError::ElementNotFound(format!("Element '{}' not found", target.best_selector())))?;
        Ok((id, tree))
    }

    fn load(&mut self, url: Url, html: &str) -> Result<()> {
        self.history.push(url.clone());
        let state = self.state_mut()?;
        state.tree = Some(DomTree::from_html(html));
        state.url = Some(url);
        state.selections.clear();
        Ok(())
    }

    fn load_query(&mut self, pairs: Vec<(String, String)>) -> Result<()> {
        let mut url = self.current_url()?;
        url.set_fragment(None);
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        let html = self
            .documents
            .get(&page_key(&url))
            .cloned()
            .unwrap_or_else(|| EMPTY_DOCUMENT.to_string());
        self.load(url, &html)
    }
}

/// Documents are keyed without fragment and without a trailing slash
fn page_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.as_str().trim_end_matches('/').to_string()
}

impl Page for StaticSite {
    fn navigate(&mut self, url: &Url) -> Result<()> {
        let html = self
            .documents
            .get(&page_key(url))
            .cloned()
            .ok_or_else(|| ScrapeError::NavigationFailed(format!("Failed to navigate to {}: 404", url)))?;
        self.load(url.clone(), &html)
    }

    fn current_url(&self) -> Result<Url> {
        self.state()?
            .url
            .clone()
            .ok_or_else(|| ScrapeError::NavigationFailed("Tab has no document".to_string()))
    }

    fn snapshot(&self) -> Result<DomTree> {
        match &self.state()?.tree {
            Some(tree) => Ok(tree.clone()),
            None => Ok(DomTree::from_html(EMPTY_DOCUMENT)),
        }
    }

    fn click(&mut self, target: &ElementLocator) -> Result<()> {
        let (id, tree) = self.resolve(target)?;

        let anchor = std::iter::successors(Some(id), |&n| tree.parent(n))
            .find(|&n| tree.tag_name(n) == "a")
            .and_then(|n| tree.attribute(n, "href"))
            .map(str::to_string);

        if let Some(href) = anchor {
            let current = self.current_url()?;
            let next = current
                .join(&href)
                .map_err(|e| ScrapeError::invalid_url(&href, e))?;
            // Same-document links do not reload
            if page_key(&next) == page_key(&current) {
                return Ok(());
            }
            return self.navigate(&next);
        }

        if tree.tag_name(id) == "button" && tree.markup(id).contains("search") {
            let pairs = self.state()?.selections.clone();
            return self.load_query(pairs);
        }
        Ok(())
    }

    fn select_option(&mut self, target: &ElementLocator, option_text: &str) -> Result<()> {
        let (id, tree) = self.resolve(target)?;
        let options = tree.descendants_by_tag(id, "option");
        let chosen = options
            .iter()
            .copied()
            .find(|&o| tree.text(o) == option_text.trim())
            .ok_or_else(|| ScrapeError::ElementNotFound(format!("No option '{}' in {}", option_text, target)))?;
        let name = tree.attribute(id, "name").unwrap_or("filter").to_string();

        let state = self.state_mut()?;
        if let Some(tree) = state.tree.as_mut() {
            for option in options {
                tree.remove_attribute(option, "selected");
            }
            tree.set_attribute(chosen, "selected", "selected");
        }
        state.selections.retain(|(n, _)| n != &name);
        state.selections.push((name, option_text.trim().to_string()));
        Ok(())
    }

    fn submit_text(&mut self, target: &ElementLocator, text: &str) -> Result<()> {
        let (id, tree) = self.resolve(target)?;
        let name = tree.attribute(id, "name").unwrap_or("q").to_string();
        self.load_query(vec![(name, text.to_string())])
    }

    fn mark_processed(&mut self, target: &ElementLocator) -> Result<()> {
        let (id, _) = self.resolve(target)?;
        if let Some(tree) = self.state_mut()?.tree.as_mut() {
            tree.set_attribute(id, PROCESSED_ATTR, "true");
        }
        Ok(())
    }

    fn current_tab(&self) -> Result<TabId> {
        self.state()?;
        Ok(self.current.clone())
    }

    fn open_tab(&mut self) -> Result<TabId> {
        let tab = TabId(format!("tab-{}", self.next_tab));
        self.next_tab += 1;
        self.tabs.insert(tab.clone(), TabState::default());
        self.current = tab.clone();
        Ok(tab)
    }

    fn switch_to(&mut self, tab: &TabId) -> Result<()> {
        if !self.tabs.contains_key(tab) {
            return Err(ScrapeError::TabOperationFailed(format!("No tab {}", tab)));
        }
        self.current = tab.clone();
        Ok(())
    }

    fn close_tab(&mut self, tab: &TabId) -> Result<()> {
        self.tabs
            .shift_remove(tab)
            .map(|_| ())
            .ok_or_else(|| ScrapeError::TabOperationFailed(format!("No tab {}", tab)))
    }

    fn settle(&self, _wait: Duration) {}
}
