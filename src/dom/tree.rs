use crate::dom::element::ElementNode;
use crate::dom::locator::ElementLocator;
use crate::error::{Result, ScrapeError};
use headless_chrome::Tab;
use std::collections::HashMap;
use std::sync::Arc;

/// Index of an element inside a [`DomTree`]. Ids follow document order.
pub type NodeId = usize;

/// Attribute set on cards that were already harvested
pub const PROCESSED_ATTR: &str = "data-firm-scrape-seen";

/// Tags whose rendered text starts and ends on its own line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "section", "table", "tr", "ul", "option", "select", "body", "html",
];

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Element(NodeId),
}

/// One element of a snapshot
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag_name: String,
    pub attributes: HashMap<String, String>,
    pub is_visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    segments: Vec<Segment>,
    subtree_end: NodeId,
}

/// Immutable snapshot of a rendered page.
///
/// Elements live in an arena in document order, so a subtree is always a
/// contiguous id range. Text nodes are kept as segments of their parent so
/// rendered text preserves interleaving with child elements.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
}

impl DomTree {
    /// Flatten a node tree into a snapshot
    pub fn new(root: ElementNode) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.push(root, None);
        tree
    }

    /// Parse an HTML document into a snapshot
    pub fn from_html(html: &str) -> Self {
        Self::new(ElementNode::from_html(html))
    }

    /// Build a snapshot from a live browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        let js_code = include_str!("extract_dom.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| ScrapeError::DomParseFailed(format!("Failed to execute DOM extraction script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| ScrapeError::DomParseFailed("No value returned from DOM extraction".to_string()))?;

        // The script returns a JSON string rather than an object
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| ScrapeError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        let root: ElementNode = serde_json::from_str(&json_str)
            .map_err(|e| ScrapeError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))?;

        Ok(Self::new(root))
    }

    fn push(&mut self, node: ElementNode, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode {
            tag_name: node.tag_name,
            attributes: node.attributes,
            is_visible: node.is_visible,
            parent,
            children: Vec::new(),
            segments: Vec::new(),
            subtree_end: id + 1,
        });

        for child in node.children {
            if child.is_text() {
                if let Some(text) = child.text_content {
                    self.nodes[id].segments.push(Segment::Text(text));
                }
            } else {
                let child_id = self.push(child, Some(id));
                self.nodes[id].children.push(child_id);
                self.nodes[id].segments.push(Segment::Element(child_id));
            }
        }

        self.nodes[id].subtree_end = self.nodes.len();
        id
    }

    /// Root element id (the `<html>` element)
    pub fn root(&self) -> NodeId {
        0
    }

    /// Number of elements in the snapshot
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id]
    }

    pub fn tag_name(&self, id: NodeId) -> &str {
        &self.nodes[id].tag_name
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id].attributes.get(name).map(String::as_str)
    }

    /// Class tokens in attribute order
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// All elements strictly below `id`, in document order
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        (id + 1)..self.nodes[id].subtree_end
    }

    /// Whether `ancestor` contains `id` (or is `id`)
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor <= id && id < self.nodes[ancestor].subtree_end
    }

    /// Every element with the given tag, in document order
    pub fn find_all_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.subtree_by_tag(self.root(), tag)
    }

    /// Descendants of `id` with the given tag
    pub fn descendants_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|&d| self.nodes[d].tag_name.eq_ignore_ascii_case(tag))
            .collect()
    }

    /// Elements with the given tag in the subtree of `id`, `id` included
    pub fn subtree_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        if self.is_empty() {
            return Vec::new();
        }
        (id..self.nodes[id].subtree_end)
            .filter(|&d| self.nodes[d].tag_name.eq_ignore_ascii_case(tag))
            .collect()
    }

    /// Text directly inside the element, whitespace-collapsed
    pub fn own_text(&self, id: NodeId) -> String {
        let raw: Vec<&str> = self.nodes[id]
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(t) => Some(t.as_str()),
                Segment::Element(_) => None,
            })
            .collect();
        collapse_whitespace(&raw.join(" "))
    }

    /// Rendered text of the element: one line per block, invisible elements skipped
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_text(id, &mut out);
        out.lines()
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        if !node.is_visible {
            return;
        }
        if node.tag_name == "br" {
            out.push('\n');
            return;
        }

        let block = BLOCK_TAGS.contains(&node.tag_name.as_str());
        if block {
            out.push('\n');
        }
        for segment in &node.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Element(child) => {
                    out.push(' ');
                    self.render_text(*child, out);
                    out.push(' ');
                }
            }
        }
        if block {
            out.push('\n');
        }
    }

    pub fn is_displayed(&self, id: NodeId) -> bool {
        self.nodes[id].is_visible
    }

    pub fn is_enabled(&self, id: NodeId) -> bool {
        !self.nodes[id].attributes.contains_key("disabled")
    }

    /// Whether the element was tagged as harvested by an earlier pass
    pub fn is_processed(&self, id: NodeId) -> bool {
        self.nodes[id].attributes.contains_key(PROCESSED_ATTR)
    }

    /// Approximate outer HTML, lowercased, for keyword sniffing
    pub fn markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_markup(id, &mut out);
        out.to_lowercase()
    }

    fn render_markup(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        out.push('<');
        out.push_str(&node.tag_name);
        let mut attributes: Vec<_> = node.attributes.iter().collect();
        attributes.sort();
        for (key, value) in attributes {
            out.push_str(&format!(" {}=\"{}\"", key, value));
        }
        out.push('>');
        for segment in &node.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Element(child) => self.render_markup(*child, out),
            }
        }
        out.push_str(&format!("</{}>", node.tag_name));
    }

    /// Structural CSS path from the root, e.g. `html > body:nth-child(2) > div:nth-child(1)`
    pub fn css_path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            let position = self.nodes[parent]
                .children
                .iter()
                .position(|&c| c == current)
                .map_or(1, |p| p + 1);
            parts.push(format!("{}:nth-child({})", self.nodes[current].tag_name, position));
            current = parent;
        }
        parts.push(self.nodes[current].tag_name.clone());
        parts.reverse();
        parts.join(" > ")
    }

    /// Locator that re-acquires this element on the live page
    pub fn locator(&self, id: NodeId) -> ElementLocator {
        let mut locator = ElementLocator::new(self.css_path(id), self.tag_name(id));
        if let Some(element_id) = self.attribute(id, "id") {
            locator = locator.with_id(element_id);
        }
        let text = self.text(id);
        if !text.is_empty() {
            locator = locator.with_text(truncate(&text, 50));
        }
        locator
    }

    /// Resolve a path produced by [`DomTree::css_path`] back to an element
    pub fn resolve_css_path(&self, path: &str) -> Option<NodeId> {
        if self.is_empty() {
            return None;
        }
        let mut segments = path.split('>').map(str::trim);
        let root_tag = segments.next()?;
        if !self.nodes[0].tag_name.eq_ignore_ascii_case(root_tag) {
            return None;
        }

        let mut current = self.root();
        for segment in segments {
            let (tag, position) = segment.split_once(":nth-child(")?;
            let position: usize = position.trim_end_matches(')').parse().ok()?;
            let child = *self.nodes[current].children.get(position.checked_sub(1)?)?;
            if !self.nodes[child].tag_name.eq_ignore_ascii_case(tag) {
                return None;
            }
            current = child;
        }
        Some(current)
    }

    pub(crate) fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) {
        self.nodes[id].attributes.insert(key.to_string(), value.to_string());
    }

    pub(crate) fn remove_attribute(&mut self, id: NodeId, key: &str) {
        self.nodes[id].attributes.remove(key);
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <header><a href="/">Home</a></header>
        <div class="grid">
            <div class="card member"><h3>Jane Doe</h3><p>Partner<br>Tax</p><a href="/jane">Bio</a></div>
            <div class="card member" style="display:none"><h3>Hidden Person</h3></div>
        </div>
    </body></html>"#;

    #[test]
    fn test_document_order_and_descendants() {
        let tree = DomTree::from_html(PAGE);
        assert_eq!(tree.tag_name(tree.root()), "html");

        let anchors = tree.find_all_by_tag("a");
        assert_eq!(anchors.len(), 2);
        assert!(anchors[0] < anchors[1]);

        let grid = tree.find_all_by_tag("div")[0];
        assert_eq!(tree.descendants_by_tag(grid, "a").len(), 1);
        assert!(tree.descendants_by_tag(anchors[1], "a").is_empty());
        assert_eq!(tree.subtree_by_tag(anchors[1], "a"), vec![anchors[1]]);
        assert!(tree.contains(grid, anchors[1]));
        assert!(!tree.contains(grid, anchors[0]));
    }

    #[test]
    fn test_text_rendering() {
        let tree = DomTree::from_html(PAGE);
        let card = tree.find_all_by_tag("div")[1];
        assert_eq!(tree.text(card), "Jane Doe\nPartner\nTax\nBio");

        let hidden = tree.find_all_by_tag("div")[2];
        assert_eq!(tree.text(hidden), "");
        assert!(!tree.is_displayed(hidden));
    }

    #[test]
    fn test_own_text_ignores_children() {
        let tree = DomTree::from_html("<html><body><p>Hello <b>big</b>  world</p></body></html>");
        let p = tree.find_all_by_tag("p")[0];
        assert_eq!(tree.own_text(p), "Hello world");
        assert_eq!(tree.text(p), "Hello big world");
    }

    #[test]
    fn test_css_path_round_trip() {
        let tree = DomTree::from_html(PAGE);
        for id in 0..tree.len() {
            let path = tree.css_path(id);
            assert_eq!(tree.resolve_css_path(&path), Some(id), "path {}", path);
        }
        assert_eq!(tree.css_path(tree.find_all_by_tag("h3")[0]), "html > body:nth-child(2) > div:nth-child(2) > div:nth-child(1) > h3:nth-child(1)");
        assert_eq!(tree.resolve_css_path("html > body:nth-child(9)"), None);
    }

    #[test]
    fn test_classes_and_markup() {
        let tree = DomTree::from_html(PAGE);
        let card = tree.find_all_by_tag("div")[1];
        assert_eq!(tree.classes(card), vec!["card", "member"]);
        assert!(tree.markup(card).starts_with("<div class=\"card member\">"));
        assert!(tree.markup(card).contains("jane doe"));
    }

    #[test]
    fn test_processed_marker() {
        let mut tree = DomTree::from_html(PAGE);
        let card = tree.find_all_by_tag("div")[1];
        assert!(!tree.is_processed(card));
        tree.set_attribute(card, PROCESSED_ATTR, "true");
        assert!(tree.is_processed(card));
    }
}
