//! The unit of crawl work.
//!
//! A [`Job`] is an immutable description of one page to visit: the URL, the
//! crawl scope it belongs to, the extraction schema to apply once a target
//! page is reached, and the remaining [`SelectorPath`] describing how to get
//! there. Role and priority are derived from the job's own state and are
//! never cached.

use crate::schema::Schema;
use crate::selector::{PageKind, SelectorPath};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

// Distinguishes independently discovered jobs; requeued clones keep theirs.
static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(0);

fn next_job_id() -> u64 {
    NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed)
}

/// How the worker treats a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    /// Content to extract: the selector path is exhausted.
    Target,
    /// Navigation only: links are followed, nothing is extracted.
    Transit,
    /// A listing with "next page" links: the last selector declares pagination.
    PaginatedListing,
}

impl PageRole {
    /// Weight used in priority derivation, under the smaller-dequeues-first
    /// queue convention. Paginated listings carry the smaller weight so they
    /// outrank transit pages at equal depth; targets are handled separately.
    fn weight(self) -> i64 {
        match self {
            PageRole::Target => 0,
            PageRole::Transit => 2,
            PageRole::PaginatedListing => 1,
        }
    }
}

/// An immutable description of one page to visit.
#[derive(Debug, Clone)]
pub struct Job {
    /// Identity used by the retry ledger. Every discovery gets a fresh one,
    /// even of an already-seen URL; requeued clones keep theirs.
    pub(crate) id: u64,
    /// Extraction schema, passed through unchanged to the content parser.
    pub schema: Schema,
    /// Crawl-scope identifier; deduplication and page limits are per scope.
    pub base_url: Url,
    /// The page to fetch.
    pub url: Url,
    /// Remaining link selectors between this page and target content.
    pub path: SelectorPath,
    /// Hops from the seed; children are always `depth + 1`.
    pub depth: u32,
    /// Which loader fetches this page.
    pub page_kind: PageKind,
}

impl Job {
    /// Creates a seed job at depth zero.
    pub fn seed(
        schema: Schema,
        base_url: Url,
        url: Url,
        path: SelectorPath,
        page_kind: PageKind,
    ) -> Self {
        Self {
            id: next_job_id(),
            schema,
            base_url,
            url,
            path,
            depth: 0,
            page_kind,
        }
    }

    /// Creates a child of this job, one hop deeper.
    pub fn child(&self, url: Url, path: SelectorPath, page_kind: PageKind) -> Self {
        Self {
            id: next_job_id(),
            schema: self.schema.clone(),
            base_url: self.base_url.clone(),
            url,
            path,
            depth: self.depth + 1,
            page_kind,
        }
    }

    /// Classifies this job from its remaining selector path. Pure and
    /// re-derivable at any time.
    pub fn role(&self) -> PageRole {
        match self.path.front() {
            None => PageRole::Target,
            Some(selector) if self.path.len() == 1 && selector.pagination.is_some() => {
                PageRole::PaginatedListing
            }
            Some(_) => PageRole::Transit,
        }
    }

    /// Scheduling priority: smaller values are dequeued first.
    ///
    /// Target pages sort before everything else. Within the other roles,
    /// shallower pages sort before deeper ones so navigation completes
    /// breadth-first before the crawl drills into deep branches.
    pub fn priority(&self) -> i64 {
        let role = self.role();
        match role {
            PageRole::Target => i64::MIN,
            _ => i64::from(self.depth) * role.weight(),
        }
    }

    /// The scope key used by the link tracker and the page limit.
    pub fn scope(&self) -> &str {
        self.base_url.as_str()
    }
}

// Equality is by work description; the retry identity is excluded, so a
// requeued clone compares equal to the job that failed.
impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.base_url == other.base_url
            && self.url == other.url
            && self.path == other.path
            && self.depth == other.depth
            && self.page_kind == other.page_kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::LinkSelector;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn job_with(path: Vec<LinkSelector>, depth: u32) -> Job {
        Job {
            id: next_job_id(),
            schema: Schema::new(),
            base_url: url("https://x.test"),
            url: url("https://x.test/page"),
            path: SelectorPath::new(path),
            depth,
            page_kind: PageKind::Static,
        }
    }

    #[test]
    fn empty_path_is_a_target() {
        let job = job_with(vec![], 3);
        assert_eq!(job.role(), PageRole::Target);
        assert_eq!(job.priority(), i64::MIN);
    }

    #[test]
    fn single_paginated_selector_is_a_listing() {
        let job = job_with(vec![LinkSelector::paginated(".item a", ".next")], 1);
        assert_eq!(job.role(), PageRole::PaginatedListing);
    }

    #[test]
    fn paginated_selector_behind_another_hop_is_transit() {
        let job = job_with(
            vec![
                LinkSelector::new(".category a"),
                LinkSelector::paginated(".item a", ".next"),
            ],
            0,
        );
        assert_eq!(job.role(), PageRole::Transit);
    }

    #[test]
    fn plain_selector_path_is_transit() {
        let job = job_with(vec![LinkSelector::new(".a")], 0);
        assert_eq!(job.role(), PageRole::Transit);
    }

    #[test]
    fn shallower_never_has_lower_priority_within_a_role() {
        for depth in 0..5u32 {
            let shallow = job_with(vec![LinkSelector::new(".a")], depth);
            let deep = job_with(vec![LinkSelector::new(".a")], depth + 1);
            assert!(shallow.priority() <= deep.priority());

            let shallow = job_with(vec![LinkSelector::paginated(".a", ".next")], depth);
            let deep = job_with(vec![LinkSelector::paginated(".a", ".next")], depth + 1);
            assert!(shallow.priority() <= deep.priority());
        }
    }

    #[test]
    fn deeper_pages_never_outrank_shallower_ones() {
        let shallow = job_with(vec![LinkSelector::new(".a")], 1);
        let deep = job_with(vec![LinkSelector::new(".a")], 2);
        assert!(shallow.priority() < deep.priority());

        let shallow = job_with(vec![LinkSelector::paginated(".a", ".next")], 1);
        let deep = job_with(vec![LinkSelector::paginated(".a", ".next")], 2);
        assert!(shallow.priority() < deep.priority());
    }

    #[test]
    fn targets_outrank_everything() {
        let target = job_with(vec![], 100);
        let transit = job_with(vec![LinkSelector::new(".a")], 0);
        assert!(target.priority() < transit.priority());
    }

    #[test]
    fn listing_outranks_transit_at_equal_depth() {
        let listing = job_with(vec![LinkSelector::paginated(".a", ".next")], 2);
        let transit = job_with(vec![LinkSelector::new(".a")], 2);
        assert!(listing.priority() < transit.priority());
    }

    #[test]
    fn child_increments_depth_and_keeps_scope() {
        let parent = job_with(vec![LinkSelector::new(".a")], 1);
        let (_, rest) = parent.path.pop_front().unwrap();
        let child = parent.child(url("https://x.test/item/1"), rest, PageKind::Static);

        assert_eq!(child.depth, 2);
        assert_eq!(child.base_url, parent.base_url);
        assert_eq!(child.schema, parent.schema);
        assert!(child.path.is_empty());
    }
}
