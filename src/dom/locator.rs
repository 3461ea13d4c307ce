use serde::{Deserialize, Serialize};

/// Information needed to re-acquire a snapshot element on the live page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ElementLocator {
    /// Structural CSS path for the element
    pub css_selector: String,

    /// Element's tag name
    pub tag_name: String,

    /// Element's ID attribute (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Element's text content (truncated for display)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementLocator {
    /// Create a new ElementLocator from a CSS selector
    pub fn new(css_selector: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            css_selector: css_selector.into(),
            tag_name: tag_name.into(),
            id: None,
            text: None,
        }
    }

    /// Builder method: set ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Selector to query the live page with.
    ///
    /// The structural path is preferred over `#id` because ids are not
    /// guaranteed unique on scraped sites.
    pub fn best_selector(&self) -> &str {
        &self.css_selector
    }
}

impl std::fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text {
            Some(text) => write!(f, "<{}> '{}'", self.tag_name, text),
            None => write!(f, "<{}> {}", self.tag_name, self.css_selector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_locator() {
        let locator = ElementLocator::new("html > body:nth-child(2)", "body")
            .with_id("main")
            .with_text("Our people");

        assert_eq!(locator.best_selector(), "html > body:nth-child(2)");
        assert_eq!(locator.id.as_deref(), Some("main"));
        assert_eq!(locator.to_string(), "<body> 'Our people'");
    }

    #[test]
    fn test_locator_serialization() {
        let locator = ElementLocator::new("html > body:nth-child(2) > a:nth-child(1)", "a");
        let json = serde_json::to_string(&locator).unwrap();
        assert!(!json.contains("\"id\""));

        let deserialized: ElementLocator = serde_json::from_str(&json).unwrap();
        assert_eq!(locator, deserialized);
    }
}
