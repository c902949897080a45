//! Visited-link tracking.
//!
//! The [`LinkTracker`] is the crawl's deduplication oracle: an append-only set
//! of visited URLs per crawl scope. Backends may be process-local or shared
//! (a networked set store); the worker always awaits `mark_visited` before
//! fetching, so two workers racing on the same URL fetch it at most once.

use crate::error::CrawlError;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use url::Url;

/// Deduplication oracle scoped by crawl id.
///
/// All operations are idempotent set semantics; `mark_visited` is
/// test-and-set so concurrent calls with the same arguments yield exactly
/// one `true`.
#[async_trait]
pub trait LinkTracker: Send + Sync {
    /// Marks a URL visited for a scope. Returns `true` if it was newly
    /// inserted, `false` if it had already been marked.
    async fn mark_visited(&self, scope: &str, url: &Url) -> Result<bool, CrawlError>;

    /// Whether a URL has been marked visited for a scope.
    async fn is_visited(&self, scope: &str, url: &Url) -> Result<bool, CrawlError>;

    /// Number of URLs marked visited for a scope. Reflects every
    /// `mark_visited` call that has returned.
    async fn visited_count(&self, scope: &str) -> Result<u64, CrawlError>;

    /// Filters out already-visited URLs, preserving input order.
    async fn filter_unvisited(
        &self,
        scope: &str,
        urls: Vec<Url>,
    ) -> Result<Vec<Url>, CrawlError> {
        let mut unvisited = Vec::with_capacity(urls.len());
        for url in urls {
            if !self.is_visited(scope, &url).await? {
                unvisited.push(url);
            }
        }
        Ok(unvisited)
    }
}

/// Process-local tracker backed by a map of concurrent sets.
#[derive(Debug, Default)]
pub struct InMemoryLinkTracker {
    scopes: DashMap<String, DashSet<String>>,
}

impl InMemoryLinkTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkTracker for InMemoryLinkTracker {
    async fn mark_visited(&self, scope: &str, url: &Url) -> Result<bool, CrawlError> {
        let set = self.scopes.entry(scope.to_string()).or_default();
        Ok(set.insert(url.as_str().to_string()))
    }

    async fn is_visited(&self, scope: &str, url: &Url) -> Result<bool, CrawlError> {
        Ok(self
            .scopes
            .get(scope)
            .is_some_and(|set| set.contains(url.as_str())))
    }

    async fn visited_count(&self, scope: &str) -> Result<u64, CrawlError> {
        Ok(self.scopes.get(scope).map_or(0, |set| set.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn marking_is_idempotent_and_counted_once() {
        let tracker = InMemoryLinkTracker::new();
        let u = url("https://x.test/a");

        assert!(tracker.mark_visited("s", &u).await.unwrap());
        assert!(!tracker.mark_visited("s", &u).await.unwrap());
        assert_eq!(tracker.visited_count("s").await.unwrap(), 1);
        assert!(tracker.is_visited("s", &u).await.unwrap());
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let tracker = InMemoryLinkTracker::new();
        let u = url("https://x.test/a");

        tracker.mark_visited("one", &u).await.unwrap();

        assert!(!tracker.is_visited("two", &u).await.unwrap());
        assert_eq!(tracker.visited_count("two").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn filter_unvisited_preserves_order() {
        let tracker = InMemoryLinkTracker::new();
        tracker
            .mark_visited("s", &url("https://x.test/b"))
            .await
            .unwrap();

        let remaining = tracker
            .filter_unvisited(
                "s",
                vec![
                    url("https://x.test/a"),
                    url("https://x.test/b"),
                    url("https://x.test/c"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(remaining, vec![url("https://x.test/a"), url("https://x.test/c")]);
    }

    #[tokio::test]
    async fn concurrent_marks_yield_exactly_one_insert() {
        let tracker = Arc::new(InMemoryLinkTracker::new());
        let u = url("https://x.test/contended");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let tracker = Arc::clone(&tracker);
            let u = u.clone();
            handles.push(tokio::spawn(
                async move { tracker.mark_visited("s", &u).await },
            ));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(tracker.visited_count("s").await.unwrap(), 1);
    }
}
