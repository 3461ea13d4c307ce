//! Curated vocabularies that steer page discovery, filtering and key-person
//! detection. Every entry is lowercase.

use crate::job::FirmCategory;

/// Path fragments of team pages, any firm
pub const TEAM_PAGE_KEYWORDS: &[&str] = &[
    "team",
    "people",
    "leadership",
    "professionals",
    "bankers",
    "staff",
    "who-we-are",
    "our-firm",
    "bios",
];

/// Additional path fragments of law firm team pages
pub const LAW_FIRM_TEAM_PAGE_KEYWORDS: &[&str] = &[
    "attorneys",
    "lawyers",
    "partners",
    "counsel",
    "advocates",
    "solicitors",
];

pub const LAW_FIRM_KEY_PRACTICES: &[&str] = &[
    "corporate",
    "mergers and acquisitions",
    "mergers & acquisitions",
    "m&a",
    "private equity",
    "capital markets",
    "securities",
    "banking and finance",
    "finance",
    "tax",
    "real estate",
    "restructuring",
    "bankruptcy",
    "antitrust",
    "litigation",
    "intellectual property",
];

pub const LAW_FIRM_KEY_TITLES: &[&str] = &[
    "partner",
    "managing partner",
    "senior partner",
    "founding partner",
    "name partner",
    "equity partner",
    "chair",
    "chairman",
    "of counsel",
];

pub const INVESTMENT_BANK_KEY_TITLES: &[&str] = &[
    "managing director",
    "senior managing director",
    "managing partner",
    "partner",
    "founder",
    "co-founder",
    "founding partner",
    "principal",
    "president",
    "chairman",
    "chief executive officer",
    "ceo",
    "director",
];

impl FirmCategory {
    /// Path fragments that mark a team page for this category
    pub fn team_page_keywords(self) -> Vec<&'static str> {
        let mut keywords = TEAM_PAGE_KEYWORDS.to_vec();
        if self == FirmCategory::Law {
            keywords.extend_from_slice(LAW_FIRM_TEAM_PAGE_KEYWORDS);
        }
        keywords
    }

    /// Vocabularies a filter option must belong to
    pub fn filter_vocabularies(self) -> &'static [&'static [&'static str]] {
        match self {
            FirmCategory::Law => &[LAW_FIRM_KEY_PRACTICES, LAW_FIRM_KEY_TITLES],
            FirmCategory::Investment => &[INVESTMENT_BANK_KEY_TITLES],
        }
    }

    /// Whether a filter option's visible text belongs to this category's vocabularies
    pub fn is_filter_keyword(self, option_text: &str) -> bool {
        let option = option_text.trim().to_lowercase();
        self.filter_vocabularies().iter().any(|vocab| vocab.contains(&option.as_str()))
    }

    /// Whether a full text line names a key title or practice
    pub fn is_key_line(self, line: &str) -> bool {
        self.is_filter_keyword(line)
    }

    /// Keywords submitted one by one into a free-text search box
    pub fn search_terms(self) -> &'static [&'static str] {
        match self {
            FirmCategory::Law => LAW_FIRM_KEY_PRACTICES,
            FirmCategory::Investment => &[],
        }
    }
}

/// Whether a URL path contains any of `keywords`
pub fn path_matches(path: &str, keywords: &[&str]) -> bool {
    let path = path.to_lowercase();
    keywords.iter().any(|k| path.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabularies_are_lowercase() {
        for vocab in [
            TEAM_PAGE_KEYWORDS,
            LAW_FIRM_TEAM_PAGE_KEYWORDS,
            LAW_FIRM_KEY_PRACTICES,
            LAW_FIRM_KEY_TITLES,
            INVESTMENT_BANK_KEY_TITLES,
        ] {
            assert!(vocab.iter().all(|k| *k == k.to_lowercase()));
        }
    }

    #[test]
    fn test_law_extends_team_keywords() {
        let law = FirmCategory::Law.team_page_keywords();
        let investment = FirmCategory::Investment.team_page_keywords();
        assert!(law.contains(&"attorneys"));
        assert!(!investment.contains(&"attorneys"));
        assert!(investment.iter().all(|k| law.contains(k)));
    }

    #[test]
    fn test_filter_keywords_by_category() {
        assert!(FirmCategory::Law.is_filter_keyword(" Private Equity "));
        assert!(FirmCategory::Law.is_filter_keyword("Partner"));
        assert!(!FirmCategory::Law.is_filter_keyword("Managing Director"));
        assert!(FirmCategory::Investment.is_filter_keyword("Managing Director"));
        assert!(!FirmCategory::Investment.is_filter_keyword("Tax"));
        assert!(!FirmCategory::Law.is_filter_keyword("All practices"));
    }

    #[test]
    fn test_path_matches() {
        assert!(path_matches("/our-TEAM/", TEAM_PAGE_KEYWORDS));
        assert!(!path_matches("/contact", TEAM_PAGE_KEYWORDS));
    }
}
