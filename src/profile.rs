use crate::dom::{DomTree, NodeId};
use crate::job::FirmCategory;
use crate::names::{LineScore, NameOracle};
use serde::{Serialize, Serializer};
use url::Url;

/// Where an anchor destination is filed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Email,
    Linkedin,
    Other,
}

impl ContactKind {
    /// Classify an anchor destination. Total: every destination lands in
    /// exactly one list, and LinkedIn wins over everything else.
    pub fn of(href: &str) -> Self {
        let href = href.to_lowercase();
        if href.contains("linkedin") || href.contains("linked.in") {
            ContactKind::Linkedin
        } else if href.contains("mailto:") {
            ContactKind::Email
        } else {
            ContactKind::Other
        }
    }
}

/// One person harvested from a team page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub source_url: Url,
    pub category: FirmCategory,
    pub name: Option<String>,
    pub is_key: bool,
    #[serde(serialize_with = "semicolon_joined")]
    pub emails: Vec<String>,
    #[serde(serialize_with = "semicolon_joined")]
    pub linkedins: Vec<String>,
    #[serde(serialize_with = "semicolon_joined")]
    pub others: Vec<String>,
    pub is_invalid: bool,
}

fn semicolon_joined<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&values.join(";"))
}

impl ProfileRecord {
    pub fn new(source_url: Url, category: FirmCategory) -> Self {
        Self {
            source_url,
            category,
            name: None,
            is_key: false,
            emails: Vec::new(),
            linkedins: Vec::new(),
            others: Vec::new(),
            is_invalid: false,
        }
    }

    /// File a destination under its contact kind; duplicates are kept
    pub fn add_contact(&mut self, href: &str) {
        let href = href.trim().to_string();
        match ContactKind::of(&href) {
            ContactKind::Linkedin => self.linkedins.push(href),
            ContactKind::Email => {
                log::debug!("Got email: {}", href);
                self.emails.push(href)
            }
            ContactKind::Other => self.others.push(href),
        }
    }

    /// Classify every descendant anchor of `root` that carries an `href`
    pub fn add_links_from(&mut self, tree: &DomTree, root: NodeId) {
        for anchor in tree.subtree_by_tag(root, "a") {
            if let Some(href) = tree.attribute(anchor, "href") {
                self.add_contact(href);
            }
        }
    }

    pub fn contains_email(&self) -> bool {
        !self.emails.is_empty()
    }

    /// First "other" link resolved against the page it was found on
    pub fn full_profile_url(&self) -> Option<Url> {
        let href = self.others.first()?;
        let url = self.source_url.join(href).ok()?;
        matches!(url.scheme(), "http" | "https").then_some(url)
    }

    /// Score text lines: the first likely-name line becomes the display name,
    /// and any line equal to a key title or practice flags a key person.
    pub fn apply_text_lines<'a>(
        &mut self,
        lines: impl IntoIterator<Item = &'a str>,
        oracle: &NameOracle,
        max_tokens: usize,
        ratio: f64,
    ) {
        for line in lines {
            if self.name.is_none() && LineScore::of(line, oracle, max_tokens).is_likely_name(ratio) {
                log::debug!("Likely name: {}", line);
                self.name = Some(line.trim().to_string());
            }
            if self.category.is_key_line(line) {
                log::debug!("Likely a key person: {}", line);
                self.is_key = true;
            }
        }
    }

    pub fn joined_emails(&self) -> String {
        self.emails.join(";")
    }

    pub fn joined_linkedins(&self) -> String {
        self.linkedins.join(";")
    }

    pub fn joined_others(&self) -> String {
        self.others.join(";")
    }
}
