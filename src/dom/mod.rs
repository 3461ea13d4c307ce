//! DOM access and snapshots
//!
//! This module provides functionality for reading and driving rendered pages:
//! - ElementNode: Serializable node tree captured from a page or parsed from HTML
//! - DomTree: Immutable snapshot with parent links, rendered text and queries
//! - ElementLocator: Structural path used to re-acquire a snapshot element live
//! - Page: The capability every extraction step drives
//! - StaticSite: In-memory `Page` over a fixed set of HTML documents

pub mod element;
pub mod locator;
pub mod page;
pub mod static_site;
pub mod tree;

pub use element::ElementNode;
pub use locator::ElementLocator;
pub use page::{Page, SecondaryTab, TabId};
pub use static_site::StaticSite;
pub use tree::{DomTree, NodeId, PROCESSED_ATTR};

use crate::error::Result;
use headless_chrome::Tab;
use std::sync::Arc;

/// Extract the DOM tree from a browser tab
pub fn extract_dom(tab: &Arc<Tab>) -> Result<DomTree> {
    DomTree::from_tab(tab)
}
