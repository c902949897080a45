//! Link-path selectors and the persistent selector path.
//!
//! A crawl plan is an ordered sequence of [`LinkSelector`]s: each one says how
//! to find the next hop's links on a page, optionally how to find "next page"
//! links for paginated listings, and which loader the linked pages require.
//!
//! [`SelectorPath`] is an immutable, persistent view of that sequence. Popping
//! the front is O(1) and shares the underlying storage, so the many sibling
//! jobs spawned from one page can all hold the same remainder without copying
//! or aliasing hazards.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which loader a page requires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    /// Plain HTML, fetched with the static loader.
    #[default]
    Static,
    /// Client-side rendered, fetched with the dynamic (script-executing) loader.
    Dynamic,
}

/// One hop of a crawl plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSelector {
    /// CSS selector locating the links to follow on this page.
    pub selector: String,
    /// CSS selector locating "next page" links, if this hop is a paginated listing.
    pub pagination: Option<String>,
    /// Kind of the pages this selector's links lead to.
    pub target_kind: PageKind,
}

impl LinkSelector {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            pagination: None,
            target_kind: PageKind::Static,
        }
    }

    pub fn paginated(selector: impl Into<String>, pagination: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            pagination: Some(pagination.into()),
            target_kind: PageKind::Static,
        }
    }

    pub fn with_target_kind(mut self, kind: PageKind) -> Self {
        self.target_kind = kind;
        self
    }
}

/// An immutable sequence of link selectors with O(1) persistent pop.
///
/// Internally an `Arc` slice plus a head cursor: popping advances the cursor
/// on a new handle while every existing handle keeps seeing its own view.
#[derive(Debug, Clone)]
pub struct SelectorPath {
    selectors: Arc<[LinkSelector]>,
    head: usize,
}

impl SelectorPath {
    pub fn new(selectors: Vec<LinkSelector>) -> Self {
        Self {
            selectors: selectors.into(),
            head: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Remaining selectors, front first.
    pub fn as_slice(&self) -> &[LinkSelector] {
        &self.selectors[self.head..]
    }

    pub fn len(&self) -> usize {
        self.selectors.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The selector to apply on the current page, if any.
    pub fn front(&self) -> Option<&LinkSelector> {
        self.as_slice().first()
    }

    /// Splits off the front selector, returning it together with the
    /// remainder path. The remainder shares storage with `self`.
    pub fn pop_front(&self) -> Option<(&LinkSelector, SelectorPath)> {
        let front = self.front()?;
        let rest = SelectorPath {
            selectors: Arc::clone(&self.selectors),
            head: self.head + 1,
        };
        Some((front, rest))
    }
}

impl PartialEq for SelectorPath {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for SelectorPath {}

impl From<Vec<LinkSelector>> for SelectorPath {
    fn from(selectors: Vec<LinkSelector>) -> Self {
        Self::new(selectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(names: &[&str]) -> SelectorPath {
        SelectorPath::new(names.iter().map(|n| LinkSelector::new(*n)).collect())
    }

    #[test]
    fn pop_front_yields_selector_and_remainder() {
        let path = path_of(&[".a", ".b", ".c"]);
        let (front, rest) = path.pop_front().unwrap();

        assert_eq!(front.selector, ".a");
        assert_eq!(rest.len(), 2);
        assert_eq!(rest.front().unwrap().selector, ".b");
        // The original handle is untouched.
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn pop_on_empty_returns_none() {
        assert!(SelectorPath::empty().pop_front().is_none());
    }

    #[test]
    fn remainder_shares_storage_with_parent() {
        let path = path_of(&[".a", ".b"]);
        let (_, rest_one) = path.pop_front().unwrap();
        let (_, rest_two) = path.pop_front().unwrap();

        // Two siblings popped from the same parent see the same remainder.
        assert_eq!(rest_one, rest_two);
        assert!(Arc::ptr_eq(&rest_one.selectors, &rest_two.selectors));
    }

    #[test]
    fn equality_compares_remaining_view_only() {
        let popped = path_of(&["x", ".a"]).pop_front().unwrap().1;
        let fresh = path_of(&[".a"]);
        assert_eq!(popped, fresh);
    }
}
