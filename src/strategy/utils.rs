use crate::error::{Result, ScrapeError};
use url::Url;

/// Normalize a job's domain into its homepage URL.
///
/// Full URLs pass through; a bare domain gets `http://`, letting the site
/// redirect to https itself.
pub fn homepage_url(domain: &str) -> Result<Url> {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ScrapeError::invalid_url(domain, "empty domain"));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| ScrapeError::invalid_url(domain, e))?;
    if url.host_str().is_none() {
        return Err(ScrapeError::invalid_url(domain, "no host"));
    }
    Ok(url)
}

/// Resolve an `href` against the page it was found on, keeping only web links
pub fn resolve_web_link(base: &Url, href: &str) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homepage_from_bare_domain() {
        assert_eq!(homepage_url("firm.test").unwrap().as_str(), "http://firm.test/");
        assert_eq!(homepage_url("  www.firm.test/ ").unwrap().as_str(), "http://www.firm.test/");
    }

    #[test]
    fn test_homepage_keeps_scheme() {
        assert_eq!(homepage_url("https://firm.test").unwrap().as_str(), "https://firm.test/");
        assert_eq!(homepage_url("http://localhost:3000").unwrap().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_homepage_rejects_garbage() {
        assert!(homepage_url("").is_err());
        assert!(homepage_url("not a domain").is_err());
    }

    #[test]
    fn test_resolve_web_link() {
        let base = Url::parse("https://firm.test/about/").unwrap();
        assert_eq!(resolve_web_link(&base, "/our-team").unwrap().as_str(), "https://firm.test/our-team");
        assert_eq!(resolve_web_link(&base, "team").unwrap().as_str(), "https://firm.test/about/team");
        assert_eq!(
            resolve_web_link(&base, "https://other.test/people").unwrap().as_str(),
            "https://other.test/people"
        );
        assert!(resolve_web_link(&base, "mailto:team@firm.test").is_none());
        assert!(resolve_web_link(&base, "javascript:void(0)").is_none());
    }
}
