//! Name Oracle and the text scoring built on it

use crate::error::Result;
use regex::Regex;
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

/// Two or three alphabetic tokens, e.g. "Jane Doe", "Jane Q Doe", "Mary Ann Smith"
static NAME_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+(?: [A-Za-z]+){1,2}$").expect("valid name regex"));

/// Read-only set of lowercase first and last names.
///
/// Built once at startup and shared by reference with every component that
/// scores text.
#[derive(Debug, Clone, Default)]
pub struct NameOracle {
    names: HashSet<String>,
}

impl NameOracle {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty() && !n.starts_with('#'))
            .collect();
        Self { names }
    }

    /// Load a newline-delimited list; blank lines and `#` comments are skipped
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self::new(lines))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let oracle = Self::from_reader(BufReader::new(file))?;
        log::info!("Loaded {} names from {}", oracle.len(), path.as_ref().display());
        Ok(oracle)
    }

    /// Whether `token` is a known name (compared lowercase)
    pub fn contains(&self, token: &str) -> bool {
        if token.chars().any(|c| c.is_uppercase()) {
            self.names.contains(&token.to_lowercase())
        } else {
            self.names.contains(token)
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Drop the periods and commas that decorate names ("Jane Doe, Jr.")
pub fn strip_name_punctuation(text: &str) -> String {
    text.chars().filter(|c| *c != '.' && *c != ',').collect()
}

/// Whether at least two tokens of `candidate` are known names
pub fn is_name(candidate: &str, oracle: &NameOracle) -> bool {
    candidate
        .split_whitespace()
        .filter(|token| oracle.contains(token))
        .count()
        >= 2
}

/// Normalize `text` and return it if it is shaped like a person's name and
/// confirmed by the oracle.
pub fn match_name(text: &str, oracle: &NameOracle) -> Option<String> {
    let candidate = strip_name_punctuation(text.trim());
    if NAME_SHAPE.is_match(&candidate) && is_name(&candidate, oracle) {
        Some(candidate)
    } else {
        None
    }
}

/// How many tokens of a text line are known names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineScore {
    pub name_tokens: usize,
    pub tokens: usize,
}

impl LineScore {
    /// Score a line; lines longer than `max_tokens` score zero
    pub fn of(line: &str, oracle: &NameOracle, max_tokens: usize) -> Self {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let name_tokens = if tokens.len() <= max_tokens {
            tokens
                .iter()
                .map(|t| t.trim_matches(|c: char| !c.is_alphabetic()))
                .filter(|t| !t.is_empty() && oracle.contains(t))
                .count()
        } else {
            0
        };
        Self {
            name_tokens,
            tokens: tokens.len(),
        }
    }

    /// Strictly more than `ratio` of the tokens are names
    pub fn is_likely_name(&self, ratio: f64) -> bool {
        self.name_tokens as f64 > ratio * self.tokens as f64
    }
}
