use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::dom::{extract_dom, DomTree, ElementLocator, Page, TabId, PROCESSED_ATTR};
use crate::error::{Result, ScrapeError};
use headless_chrome::{Browser, Element, Tab};
use indexmap::IndexMap;
use std::{ffi::OsStr, sync::Arc, time::Duration};
use url::Url;

const CLICK_JS: &str = "function() { this.click(); }";

const CLEAR_AND_FOCUS_JS: &str = "function() { this.value = ''; this.focus(); }";

/// Picks the option whose visible text matches and fires the events a
/// framework listens for. Returns whether such an option exists.
const SELECT_OPTION_JS: &str = r#"
    function(text) {
        const option = Array.from(this.options).find(o => o.text.trim() === text);
        if (!option) {
            return false;
        }
        this.value = option.value;
        option.selected = true;
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
        return true;
    }
"#;

/// Map a DevTools error, keeping expired waits distinguishable
fn classify(error: anyhow::Error, otherwise: impl FnOnce(String) -> ScrapeError) -> ScrapeError {
    if error.downcast_ref::<headless_chrome::util::Timeout>().is_some() {
        ScrapeError::Timeout(error.to_string())
    } else {
        otherwise(error.to_string())
    }
}

/// Browser session that manages a Chrome/Chromium instance.
///
/// Tabs opened through [`Page::open_tab`] are tracked by target id; exactly
/// one of them is current at a time and receives every page operation.
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    tabs: IndexMap<TabId, Arc<Tab>>,

    current: TabId,

    operation_timeout: Duration,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // Keep the browser alive across long fixed waits
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path;
        launch_opts.user_data_dir = options.user_data_dir;
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;
        log::info!("Launched browser (headless: {})", options.headless);
        Self::with_first_tab(browser, options.operation_timeout)
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser =
            Browser::connect(options.ws_url.clone()).map_err(|e| ScrapeError::ConnectionFailed(e.to_string()))?;
        log::info!("Connected to browser at {}", options.ws_url);
        Self::with_first_tab(browser, Duration::from_millis(options.timeout))
    }

    fn with_first_tab(browser: Browser, operation_timeout: Duration) -> Result<Self> {
        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(operation_timeout);

        let current = TabId(tab.get_target_id().to_string());
        let mut tabs = IndexMap::new();
        tabs.insert(current.clone(), tab);
        Ok(Self {
            browser,
            tabs,
            current,
            operation_timeout,
        })
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// The current tab
    pub fn tab(&self) -> Result<&Arc<Tab>> {
        self.tabs
            .get(&self.current)
            .ok_or_else(|| ScrapeError::TabOperationFailed(format!("Tab {} is closed", self.current)))
    }

    /// Find a live element by CSS selector in the given tab
    pub fn find_element<'a>(&self, tab: &'a Arc<Tab>, target: &ElementLocator) -> Result<Element<'a>> {
        let selector = target.best_selector();
        tab.find_element(selector).map_err(|e| {
            classify(e, |reason| {
                ScrapeError::ElementNotFound(format!("Element '{}' not found: {}", selector, reason))
            })
        })
    }

    fn call_on(&self, target: &ElementLocator, function: &str, args: Vec<serde_json::Value>) -> Result<Option<serde_json::Value>> {
        let tab = self.tab()?;
        let element = self.find_element(tab, target)?;
        let result = element
            .call_js_fn(function, args, false)
            .map_err(|e| classify(e, |reason| ScrapeError::EvaluationFailed(format!("{} on {}: {}", function.trim(), target, reason))))?;
        Ok(result.value)
    }
}

impl Page for BrowserSession {
    fn navigate(&mut self, url: &Url) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url.as_str())
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| classify(e, |reason| ScrapeError::NavigationFailed(format!("Failed to navigate to {}: {}", url, reason))))?;
        log::debug!("Navigated to {}", url);
        Ok(())
    }

    fn current_url(&self) -> Result<Url> {
        let raw = self.tab()?.get_url();
        Url::parse(&raw).map_err(|e| ScrapeError::invalid_url(raw, e))
    }

    fn snapshot(&self) -> Result<DomTree> {
        extract_dom(self.tab()?)
    }

    fn click(&mut self, target: &ElementLocator) -> Result<()> {
        self.call_on(target, CLICK_JS, vec![])?;
        Ok(())
    }

    fn select_option(&mut self, target: &ElementLocator, option_text: &str) -> Result<()> {
        let chosen = self.call_on(target, SELECT_OPTION_JS, vec![serde_json::json!(option_text.trim())])?;
        if chosen.and_then(|v| v.as_bool()) != Some(true) {
            return Err(ScrapeError::ElementNotFound(format!("No option '{}' in {}", option_text, target)));
        }
        Ok(())
    }

    fn submit_text(&mut self, target: &ElementLocator, text: &str) -> Result<()> {
        self.call_on(target, CLEAR_AND_FOCUS_JS, vec![])?;

        let tab = self.tab()?;
        let element = self.find_element(tab, target)?;
        element
            .type_into(text)
            .map_err(|e| classify(e, |reason| ScrapeError::EvaluationFailed(format!("Failed to type into {}: {}", target, reason))))?;
        tab.press_key("Enter")
            .map_err(|e| classify(e, |reason| ScrapeError::EvaluationFailed(format!("Failed to submit {}: {}", target, reason))))?;
        Ok(())
    }

    fn mark_processed(&mut self, target: &ElementLocator) -> Result<()> {
        let function = format!("function() {{ this.setAttribute('{}', 'true'); }}", PROCESSED_ATTR);
        self.call_on(target, &function, vec![])?;
        Ok(())
    }

    fn current_tab(&self) -> Result<TabId> {
        self.tab()?;
        Ok(self.current.clone())
    }

    fn open_tab(&mut self) -> Result<TabId> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(self.operation_timeout);

        let id = TabId(tab.get_target_id().to_string());
        self.tabs.insert(id.clone(), tab);
        self.current = id.clone();
        Ok(id)
    }

    fn switch_to(&mut self, tab: &TabId) -> Result<()> {
        let target = self
            .tabs
            .get(tab)
            .ok_or_else(|| ScrapeError::TabOperationFailed(format!("No tab {}", tab)))?;
        if let Err(e) = target.activate() {
            log::debug!("Failed to bring tab {} to front: {}", tab, e);
        }
        self.current = tab.clone();
        Ok(())
    }

    fn close_tab(&mut self, tab: &TabId) -> Result<()> {
        let target = self
            .tabs
            .shift_remove(tab)
            .ok_or_else(|| ScrapeError::TabOperationFailed(format!("No tab {}", tab)))?;
        target
            .close(true)
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to close tab {}: {}", tab, e)))?;
        Ok(())
    }

    fn settle(&self, wait: Duration) {
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SecondaryTab;

    fn launch() -> BrowserSession {
        BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser")
    }

    fn data_url(html: &str) -> Url {
        Url::parse(&format!("data:text/html,{}", html)).unwrap()
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_snapshot_and_mark_processed() {
        let mut session = launch();
        session
            .navigate(&data_url("<div class='card'><h3>Jane Doe</h3></div><div class='card'><h3>John Smith</h3></div>"))
            .unwrap();

        let tree = session.snapshot().unwrap();
        let cards: Vec<_> = tree.find_all_by_tag("div");
        assert_eq!(cards.len(), 2);

        session.mark_processed(&tree.locator(cards[0])).unwrap();
        let tree = session.snapshot().unwrap();
        assert!(tree.is_processed(cards[0]));
        assert!(!tree.is_processed(cards[1]));
    }

    #[test]
    #[ignore]
    fn test_select_option() {
        let mut session = launch();
        session
            .navigate(&data_url("<select><option>All</option><option>Tax</option></select>"))
            .unwrap();
        let tree = session.snapshot().unwrap();
        let select = tree.find_all_by_tag("select")[0];

        session.select_option(&tree.locator(select), "Tax").unwrap();
        assert!(session.select_option(&tree.locator(select), "Nope").is_err());
    }

    #[test]
    #[ignore]
    fn test_secondary_tab_is_closed() {
        let mut session = launch();
        session.navigate(&data_url("<p>origin</p>")).unwrap();
        let origin = session.current_tab().unwrap();
        {
            let mut tab = SecondaryTab::open(&mut session).unwrap();
            tab.navigate(&data_url("<p>profile</p>")).unwrap();
            assert_eq!(tab.snapshot().unwrap().text(0), "profile");
        }
        assert_eq!(session.current_tab().unwrap(), origin);
        assert_eq!(session.snapshot().unwrap().text(0), "origin");
    }
}
