use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tuning for the extraction heuristics and the fixed settle waits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Wait after loading a page
    #[serde(with = "millis")]
    pub page_load_wait: Duration,

    /// Wait after choosing a filter option
    #[serde(with = "millis")]
    pub select_settle: Duration,

    /// Wait after triggering a search
    #[serde(with = "millis")]
    pub search_settle: Duration,

    /// Wait after following a pagination link
    #[serde(with = "millis")]
    pub pagination_settle: Duration,

    /// Stop collecting name elements after this many
    pub name_element_cap: usize,

    /// Cards with more anchors than this are rejected
    pub max_card_anchors: usize,

    /// Lines with more tokens than this never score as names
    pub max_name_line_tokens: usize,

    /// Share of name tokens a line must exceed to count as a name
    pub name_score_ratio: f64,

    /// Visit a card's first link when the card shows no email
    pub follow_profile_links: bool,

    /// Sitemap documents fetched per job at most
    pub max_sitemap_documents: usize,

    /// Result pages read per harvest at most
    pub max_pages: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            page_load_wait: Duration::from_secs(5),
            select_settle: Duration::from_millis(500),
            search_settle: Duration::from_secs(5),
            pagination_settle: Duration::from_secs(5),
            name_element_cap: 40,
            max_card_anchors: 10,
            max_name_line_tokens: 5,
            name_score_ratio: 0.2,
            follow_profile_links: true,
            max_sitemap_documents: 16,
            max_pages: 50,
        }
    }
}

impl ScrapeConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.name_score_ratio) {
            return Err(ScrapeError::Config(format!(
                "name_score_ratio must be in [0, 1), got {}",
                self.name_score_ratio
            )));
        }
        if self.name_element_cap < 2 {
            return Err(ScrapeError::Config("name_element_cap must be at least 2".to_string()));
        }
        if self.max_pages == 0 {
            return Err(ScrapeError::Config("max_pages must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Zero waits, for in-memory pages
    pub fn without_waits(mut self) -> Self {
        self.page_load_wait = Duration::ZERO;
        self.select_settle = Duration::ZERO;
        self.search_settle = Duration::ZERO;
        self.pagination_settle = Duration::ZERO;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"page_load_wait": 1500, "max_card_anchors": 12}}"#).unwrap();

        let config = ScrapeConfig::from_path(file.path()).unwrap();
        assert_eq!(config.page_load_wait, Duration::from_millis(1500));
        assert_eq!(config.max_card_anchors, 12);
        assert_eq!(config.select_settle, Duration::from_millis(500));
        assert_eq!(config.name_element_cap, 40);
        assert_eq!(config.max_pages, 50);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name_score_ratio": 1.5}}"#).unwrap();
        assert!(matches!(ScrapeConfig::from_path(file.path()), Err(ScrapeError::Config(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_pages": 0}}"#).unwrap();
        assert!(matches!(ScrapeConfig::from_path(file.path()), Err(ScrapeError::Config(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(ScrapeConfig::from_path(file.path()), Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_without_waits() {
        let config = ScrapeConfig::default().without_waits();
        assert_eq!(config.search_settle, Duration::ZERO);
        assert_eq!(config.max_name_line_tokens, 5);
    }
}
