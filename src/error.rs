use thiserror::Error;

/// Errors raised while locating team pages and extracting profiles
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No homepage anchor pointed at a team page
    #[error("Failed to find a team page. Is the page still up?")]
    TeamPageNotFound,

    /// Every filter configuration or search submission came back empty
    #[error("No filtering configuration was effective")]
    NoEffectiveFilter,

    /// Fewer than two name elements were found on the page
    #[error("Not enough names to gain structure (found {found})")]
    InsufficientNames { found: usize },

    /// No consecutive pair of name elements shares a common ancestor
    #[error("No common card boundary found between name elements")]
    SelectorAmbiguous,

    /// The sitemap fallback produced no profile pages
    #[error("Sitemap yielded no profile pages")]
    NoProfilePages,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Failed to parse DOM: {0}")]
    DomParseFailed(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Sitemap discovery failed: {0}")]
    Sitemap(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Whether this error comes from the extraction heuristics rather than
    /// from the browser or the network.
    pub fn is_strategy_failure(&self) -> bool {
        matches!(
            self,
            ScrapeError::TeamPageNotFound
                | ScrapeError::NoEffectiveFilter
                | ScrapeError::InsufficientNames { .. }
                | ScrapeError::SelectorAmbiguous
                | ScrapeError::NoProfilePages
        )
    }

    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        ScrapeError::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_failures() {
        assert!(ScrapeError::TeamPageNotFound.is_strategy_failure());
        assert!(ScrapeError::InsufficientNames { found: 1 }.is_strategy_failure());
        assert!(!ScrapeError::Timeout("navigate".into()).is_strategy_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = ScrapeError::InsufficientNames { found: 1 };
        assert_eq!(err.to_string(), "Not enough names to gain structure (found 1)");

        let err = ScrapeError::invalid_url("::", "relative URL without a base");
        assert!(err.to_string().contains("'::'"));
    }
}
