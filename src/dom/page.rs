use crate::dom::locator::ElementLocator;
use crate::dom::tree::DomTree;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use url::Url;

/// Identifier of a browsing context (tab)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub String);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access to a live rendered page.
///
/// Reads go through an immutable [`DomTree`] snapshot. A snapshot, and every
/// [`ElementLocator`] derived from it, is only meaningful until the next
/// navigation, click, submission or tab switch; callers re-snapshot after
/// those. Settling after an action is the caller's job via [`Page::settle`].
pub trait Page {
    /// Load `url` in the current tab and wait for the load event
    fn navigate(&mut self, url: &Url) -> Result<()>;

    /// URL of the document in the current tab
    fn current_url(&self) -> Result<Url>;

    /// Capture the current document
    fn snapshot(&self) -> Result<DomTree>;

    /// Click an element
    fn click(&mut self, target: &ElementLocator) -> Result<()>;

    /// Choose the option of a `<select>` whose visible text equals `option_text`
    fn select_option(&mut self, target: &ElementLocator, option_text: &str) -> Result<()>;

    /// Replace the value of a text input with `text` and press Enter
    fn submit_text(&mut self, target: &ElementLocator, text: &str) -> Result<()>;

    /// Tag an element so later snapshots report it as processed
    fn mark_processed(&mut self, target: &ElementLocator) -> Result<()>;

    fn current_tab(&self) -> Result<TabId>;

    /// Open a blank tab and make it current
    fn open_tab(&mut self) -> Result<TabId>;

    fn switch_to(&mut self, tab: &TabId) -> Result<()>;

    fn close_tab(&mut self, tab: &TabId) -> Result<()>;

    /// Fixed wait for the page to settle after an action
    fn settle(&self, wait: Duration);
}

/// A tab opened on top of the current one.
///
/// Dereferences to the page with the new tab current. Dropping the guard
/// closes the tab and switches back to the tab that was current when it was
/// opened, whether the work inside succeeded or not.
pub struct SecondaryTab<'a, P: Page + ?Sized> {
    page: &'a mut P,
    origin: TabId,
    tab: TabId,
}

impl<'a, P: Page + ?Sized> SecondaryTab<'a, P> {
    pub fn open(page: &'a mut P) -> Result<Self> {
        let origin = page.current_tab()?;
        let tab = page.open_tab()?;
        log::debug!("Opened secondary tab {} over {}", tab, origin);
        Ok(Self { page, origin, tab })
    }

    pub fn id(&self) -> &TabId {
        &self.tab
    }
}

impl<P: Page + ?Sized> Deref for SecondaryTab<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.page
    }
}

impl<P: Page + ?Sized> DerefMut for SecondaryTab<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.page
    }
}

impl<P: Page + ?Sized> Drop for SecondaryTab<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.page.close_tab(&self.tab) {
            log::warn!("Failed to close tab {}: {}", self.tab, e);
        }
        if let Err(e) = self.page.switch_to(&self.origin) {
            log::warn!("Failed to switch back to tab {}: {}", self.origin, e);
        }
    }
}
