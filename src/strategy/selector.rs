//! Profile selector inference.
//!
//! Finds name-bearing elements, climbs from two neighbouring names to the
//! point where their ancestor chains meet, and describes the elements just
//! below that point (one profile card each) as a selector. Everything here is
//! a pure function of a [`DomTree`] snapshot.

use crate::dom::{DomTree, NodeId};
use crate::error::{Result, ScrapeError};
use crate::names::{match_name, NameOracle};
use std::collections::HashSet;
use std::fmt;

/// Selector assumed to match exactly the profile cards of one page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProfileSelector {
    /// Compound class selector, e.g. `.card.member`
    Classes(Vec<String>),
    /// Tag path from the root, e.g. `html > body > ul > li`
    TagPath(Vec<String>),
}

impl fmt::Display for ProfileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileSelector::Classes(classes) => write!(f, ".{}", classes.join(".")),
            ProfileSelector::TagPath(tags) => f.write_str(&tags.join(" > ")),
        }
    }
}

impl ProfileSelector {
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        match self {
            ProfileSelector::Classes(classes) => {
                let own = tree.classes(id);
                classes.iter().all(|c| own.contains(&c.as_str()))
            }
            ProfileSelector::TagPath(tags) => {
                let mut chain: Vec<&str> =
                    std::iter::successors(Some(id), |&n| tree.parent(n)).map(|n| tree.tag_name(n)).collect();
                chain.reverse();
                chain.len() == tags.len() && chain.iter().zip(tags).all(|(a, b)| a.eq_ignore_ascii_case(b))
            }
        }
    }

    /// Unprocessed matching elements, in document order
    pub fn select(&self, tree: &DomTree) -> Vec<NodeId> {
        (0..tree.len())
            .filter(|&id| !tree.is_processed(id) && self.matches(tree, id))
            .collect()
    }
}

/// Elements whose text is a name confirmed by the oracle, in document order.
///
/// Only elements holding text of their own are considered, duplicates by
/// text are dropped, and collection stops at `cap` elements.
pub fn find_name_elements(tree: &DomTree, oracle: &NameOracle, cap: usize) -> Vec<NodeId> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for id in 0..tree.len() {
        if tree.own_text(id).is_empty() {
            continue;
        }
        let text = tree.text(id);
        if match_name(&text, oracle).is_some() && seen.insert(text.clone()) {
            log::debug!("{} found in name dictionary", text);
            names.push(id);
            if names.len() >= cap {
                log::info!("Found {} names, exiting name search", cap);
                break;
            }
        }
    }
    names
}

/// Climb two elements in lock step until their parents coincide.
///
/// Returns the two elements just below the shared ancestor, or `None` when
/// one chain runs out first.
fn converge(tree: &DomTree, mut a: NodeId, mut b: NodeId) -> Option<(NodeId, NodeId)> {
    loop {
        match (tree.parent(a), tree.parent(b)) {
            (Some(pa), Some(pb)) if pa == pb => return Some((a, b)),
            (Some(pa), Some(pb)) => {
                a = pa;
                b = pb;
            }
            _ => return None,
        }
    }
}

/// Class tokens shared by both elements, in the first element's order
fn shared_classes(tree: &DomTree, a: NodeId, b: NodeId) -> Vec<String> {
    let other = tree.classes(b);
    let mut seen = HashSet::new();
    tree.classes(a)
        .into_iter()
        .filter(|c| other.contains(c) && seen.insert(*c))
        .map(str::to_string)
        .collect()
}

/// Anchors in the subtree of `id`, the element itself included
fn anchor_count(tree: &DomTree, id: NodeId) -> usize {
    tree.subtree_by_tag(id, "a").len()
}

/// The single child of `id` when it holds every anchor `id` holds
fn redundant_child(tree: &DomTree, id: NodeId) -> Option<NodeId> {
    match tree.children(id) {
        [child] if anchor_count(tree, *child) == anchor_count(tree, id) => Some(*child),
        _ => None,
    }
}

/// Derive a card selector from name elements in document order.
///
/// Consecutive pairs are tried until one converges on a common ancestor.
/// The cards' shared classes win when there are any; wrappers with a single
/// child that holds all of their anchors are looked through first, so a card
/// inside a layout column is described by its own classes. Without shared
/// classes the first card's tag path from the root is used.
pub fn infer_selector(tree: &DomTree, name_elements: &[NodeId]) -> Result<ProfileSelector> {
    if name_elements.len() < 2 {
        return Err(ScrapeError::InsufficientNames {
            found: name_elements.len(),
        });
    }

    let (card_a, card_b) = name_elements
        .windows(2)
        .find_map(|pair| {
            let converged = converge(tree, pair[0], pair[1]);
            if converged.is_none() {
                log::info!("Name pair did not converge, trying the next pair");
            }
            converged
        })
        .ok_or(ScrapeError::SelectorAmbiguous)?;

    let common = shared_classes(tree, card_a, card_b);
    if !common.is_empty() {
        let (mut a, mut b) = (card_a, card_b);
        while let (Some(child_a), Some(child_b)) = (redundant_child(tree, a), redundant_child(tree, b)) {
            a = child_a;
            b = child_b;
        }
        if a != card_a {
            let inner = shared_classes(tree, a, b);
            if !inner.is_empty() {
                return Ok(ProfileSelector::Classes(inner));
            }
        }
        return Ok(ProfileSelector::Classes(common));
    }

    let mut tags: Vec<String> = std::iter::successors(Some(card_a), |&n| tree.parent(n))
        .map(|n| tree.tag_name(n).to_string())
        .collect();
    tags.reverse();
    Ok(ProfileSelector::TagPath(tags))
}

/// Find name elements and infer the card selector in one go
pub fn infer_profile_selector(tree: &DomTree, oracle: &NameOracle, cap: usize) -> Result<ProfileSelector> {
    let names = find_name_elements(tree, oracle, cap);
    let selector = infer_selector(tree, &names)?;
    log::info!("Derived profile selector {}", selector);
    Ok(selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> NameOracle {
        NameOracle::new(["jane", "doe", "john", "smith", "mary", "ann", "lee"])
    }

    #[test]
    fn test_card_member_grid() {
        let tree = DomTree::from_html(
            r#"<html><body><div class="grid">
                <div class="card member"><h3>Jane Doe</h3><p>Partner</p></div>
                <div class="card member"><h3>John Smith</h3><p>Associate</p></div>
            </div></body></html>"#,
        );
        let selector = infer_profile_selector(&tree, &oracle(), 40).unwrap();
        assert_eq!(selector.to_string(), ".card.member");
        assert_eq!(selector.select(&tree).len(), 2);
    }

    #[test]
    fn test_inference_is_idempotent() {
        let tree = DomTree::from_html(
            r#"<html><body><div class="grid">
                <div class="x card y member z"><h3>Jane Doe</h3></div>
                <div class="z member y card x"><h3>John Smith</h3></div>
            </div></body></html>"#,
        );
        let first = infer_profile_selector(&tree, &oracle(), 40).unwrap();
        for _ in 0..5 {
            assert_eq!(infer_profile_selector(&tree, &oracle(), 40).unwrap().to_string(), first.to_string());
        }
        assert_eq!(first.to_string(), ".x.card.y.member.z");
    }

    #[test]
    fn test_unique_classes_are_not_shared() {
        let tree = DomTree::from_html(
            r#"<html><body><div>
                <div class="person person-1"><span>Jane Doe</span></div>
                <div class="person person-2"><span>John Smith</span></div>
            </div></body></html>"#,
        );
        assert_eq!(infer_profile_selector(&tree, &oracle(), 40).unwrap().to_string(), ".person");
    }

    #[test]
    fn test_wrapper_is_looked_through() {
        let tree = DomTree::from_html(
            r#"<html><body><div class="row">
                <div class="col"><div class="bio"><h4>Jane Doe</h4><a href="/jane">More</a></div></div>
                <div class="col"><div class="bio"><h4>John Smith</h4><a href="/john">More</a></div></div>
                <div class="col"><p>Join us</p></div>
            </div></body></html>"#,
        );
        let selector = infer_profile_selector(&tree, &oracle(), 40).unwrap();
        assert_eq!(selector.to_string(), ".bio");
        assert_eq!(selector.select(&tree).len(), 2);
    }

    #[test]
    fn test_wrapper_kept_when_anchor_sits_outside_child() {
        let tree = DomTree::from_html(
            r#"<html><body><div>
                <a class="tile" href="/jane"><div class="inner"><h4>Jane Doe</h4><p>Tax</p></div></a>
                <a class="tile" href="/john"><div class="inner"><h4>John Smith</h4><p>Tax</p></div></a>
            </div></body></html>"#,
        );
        let selector = infer_profile_selector(&tree, &oracle(), 40).unwrap();
        assert_eq!(selector.to_string(), ".tile");

        // the card keeps its own profile link
        let cards = selector.select(&tree);
        assert_eq!(cards.len(), 2);
        assert_eq!(tree.attribute(cards[0], "href"), Some("/jane"));
    }

    #[test]
    fn test_tag_path_without_classes() {
        let tree = DomTree::from_html(
            r#"<html><body><main><ul>
                <li><b>Jane Doe</b><br>Partner</li>
                <li><b>John Smith</b><br>Counsel</li>
            </ul></main></body></html>"#,
        );
        let selector = infer_profile_selector(&tree, &oracle(), 40).unwrap();
        assert_eq!(selector.to_string(), "html > body > main > ul > li");
        assert_eq!(selector.select(&tree).len(), 2);
    }

    #[test]
    fn test_insufficient_names() {
        let tree = DomTree::from_html("<html><body><p>Jane Doe</p><p>Jane Doe</p><p>Nobody Here</p></body></html>");
        assert!(matches!(
            infer_profile_selector(&tree, &oracle(), 40),
            Err(ScrapeError::InsufficientNames { found: 1 })
        ));
    }

    #[test]
    fn test_pairs_at_different_depths_are_skipped() {
        let tree = DomTree::from_html(
            r#"<html><body>
                <h1>Mary Ann</h1>
                <div class="team">
                    <div class="card"><p>Jane Doe</p></div>
                    <div class="card"><p>John Smith</p></div>
                </div>
            </body></html>"#,
        );
        let names = find_name_elements(&tree, &oracle(), 40);
        assert_eq!(names.len(), 3);
        assert_eq!(infer_selector(&tree, &names).unwrap().to_string(), ".card");
    }

    #[test]
    fn test_no_converging_pair() {
        let tree = DomTree::from_html(
            r#"<html><body><h1>Mary Ann</h1><div><section><p>Jane Doe</p></section></div></body></html>"#,
        );
        let names = find_name_elements(&tree, &oracle(), 40);
        assert_eq!(names.len(), 2);
        assert!(matches!(infer_selector(&tree, &names), Err(ScrapeError::SelectorAmbiguous)));
    }

    #[test]
    fn test_name_cap() {
        let cards: String = ["Jane Doe", "John Smith", "Mary Ann", "Ann Lee"]
            .iter()
            .map(|n| format!("<div class=\"c\"><span>{}</span></div>", n))
            .collect();
        let tree = DomTree::from_html(&format!("<html><body>{}</body></html>", cards));
        assert_eq!(find_name_elements(&tree, &oracle(), 3).len(), 3);
        assert_eq!(find_name_elements(&tree, &oracle(), 40).len(), 4);
    }

    #[test]
    fn test_processed_cards_are_not_selected() {
        let mut tree = DomTree::from_html(
            r#"<html><body><div class="c">a</div><div class="c">b</div></body></html>"#,
        );
        let selector = ProfileSelector::Classes(vec!["c".to_string()]);
        let first = selector.select(&tree)[0];
        tree.set_attribute(first, crate::dom::PROCESSED_ATTR, "true");
        assert_eq!(selector.select(&tree).len(), 1);
    }
}
