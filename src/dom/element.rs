use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag name used for text nodes inside [`ElementNode::children`]
pub const TEXT_TAG: &str = "#text";

/// Represents a DOM node captured from a page, either an element or a text node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name in lowercase (e.g., "div", "a"), or `#text`
    pub tag_name: String,

    /// Element attributes (e.g., id, class, href, etc.)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text of a `#text` node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child nodes in document order, text nodes included
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Whether the element is rendered
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            is_visible: true,
        }
    }

    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            tag_name: TEXT_TAG.to_string(),
            attributes: HashMap::new(),
            text_content: Some(content.into()),
            children: Vec::new(),
            is_visible: true,
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: append a text node child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(ElementNode::text(text));
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a child node
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        if let Some(classes) = self.attributes.get("class") {
            classes.split_whitespace().any(|c| c == class_name)
        } else {
            false
        }
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Whether this is a text node
    pub fn is_text(&self) -> bool {
        self.tag_name == TEXT_TAG
    }

    /// Blank out elements that never render text (scripts, styles, `<head>`).
    ///
    /// The elements themselves stay in place so sibling positions match the
    /// live page.
    pub fn strip_non_content(&mut self) {
        if matches!(
            self.tag_name.as_str(),
            "script" | "style" | "noscript" | "template" | "head"
        ) {
            self.children.clear();
            self.is_visible = false;
            return;
        }

        for child in &mut self.children {
            child.strip_non_content();
        }
    }

    /// Parse an HTML document into a node tree rooted at `<html>`.
    ///
    /// Visibility is approximated from markup: `hidden`, inline `display:none`
    /// or `visibility:hidden`, and `<input type="hidden">` hide an element and
    /// everything below it.
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut node = Self::convert(root, true);
        node.strip_non_content();
        node
    }

    fn convert(element: ElementRef<'_>, parent_visible: bool) -> Self {
        let mut converted = ElementNode::new(element.value().name());
        for (key, value) in element.value().attrs() {
            converted.add_attribute(key, value);
        }
        converted.is_visible = parent_visible && !converted.hidden_by_markup();

        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                let visible = converted.is_visible;
                converted.children.push(Self::convert(child_element, visible));
            } else if let Node::Text(text) = child.value() {
                converted.children.push(ElementNode::text(text.to_string()));
            }
        }
        converted
    }

    fn hidden_by_markup(&self) -> bool {
        if self.attributes.contains_key("hidden") {
            return true;
        }
        if self.is_tag("input")
            && self
                .get_attribute("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        {
            return true;
        }
        self.get_attribute("style").is_some_and(|style| {
            let style: String = style
                .to_ascii_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
    }
}
