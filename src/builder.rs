//! Fluent construction of a [`Crawler`].
//!
//! # Overview
//!
//! The builder collects seeds, the link-selector path, the record schema and
//! the output sinks, validates the combination and wires up the worker pool.
//! Every collaborator has a sensible default; swap any of them for a custom
//! implementation through the corresponding setter.
//!
//! ```no_run
//! use scuttle::{CrawlerBuilder, Schema};
//!
//! # async fn demo() -> Result<(), scuttle::CrawlError> {
//! let crawler = CrawlerBuilder::new()
//!     .seed("https://books.example/")
//!     .follow_links(".category a")
//!     .follow_links_paginated(".product a", "a[rel=next]")
//!     .schema(Schema::new().field("title", "h1").field("price", ".price"))
//!     .limit(1_000)
//!     .build()?;
//! crawler.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::blacklist::UrlBlacklist;
use crate::crawler::{Crawler, CrawlWorker, RetryPolicy};
use crate::error::CrawlError;
use crate::job::Job;
use crate::loader::{HttpLoader, Loader};
use crate::parser::{ContentParser, CssContentParser, CssLinkParser, LinkParser};
use crate::queue::JobQueue;
use crate::schema::{Record, Schema};
use crate::selector::{LinkSelector, PageKind, SelectorPath};
use crate::sink::{CallbackSink, ConsoleSink, Sink};
use crate::stats::StatCollector;
use crate::tracker::{InMemoryLinkTracker, LinkTracker};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Tunables with defaults that work for a polite single-site crawl.
#[derive(Debug, Clone, Copy)]
pub struct CrawlerConfig {
    /// Number of concurrent worker tasks.
    pub workers: usize,
    /// Stop fetching once this many pages have been visited per scope.
    pub page_limit: u64,
    pub retry: RetryPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(2, 16),
            page_limit: u64::MAX,
            retry: RetryPolicy::default(),
        }
    }
}

/// Builder for [`Crawler`].
#[derive(Default)]
pub struct CrawlerBuilder {
    config: CrawlerConfig,
    seeds: Vec<(String, PageKind)>,
    scope: Option<String>,
    schema: Option<Schema>,
    path: Vec<LinkSelector>,
    blacklist: Vec<String>,
    sinks: Vec<Arc<dyn Sink>>,
    tracker: Option<Arc<dyn LinkTracker>>,
    static_loader: Option<Arc<dyn Loader>>,
    dynamic_loader: Option<Arc<dyn Loader>>,
    link_parser: Option<Arc<dyn LinkParser>>,
    content_parser: Option<Arc<dyn ContentParser>>,
}

impl CrawlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a static start page. Call repeatedly for multiple entry points.
    pub fn seed(self, url: impl Into<String>) -> Self {
        self.seed_with_kind(url, PageKind::Static)
    }

    /// Adds a start page that needs the dynamic loader.
    pub fn seed_with_kind(mut self, url: impl Into<String>, kind: PageKind) -> Self {
        self.seeds.push((url.into(), kind));
        self
    }

    /// Overrides the crawl scope used for dedup and the page limit.
    /// Defaults to the site root of the first seed.
    pub fn scope(mut self, url: impl Into<String>) -> Self {
        self.scope = Some(url.into());
        self
    }

    /// The record schema extracted on every target page.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Appends a traversal level: follow links matched by `selector`.
    pub fn follow_links(mut self, selector: impl Into<String>) -> Self {
        self.path.push(LinkSelector::new(selector));
        self
    }

    /// Like [`CrawlerBuilder::follow_links`], but the linked pages are
    /// loaded with the dynamic loader.
    pub fn follow_links_to(mut self, selector: impl Into<String>, kind: PageKind) -> Self {
        self.path.push(LinkSelector::new(selector).with_target_kind(kind));
        self
    }

    /// Appends a paginated traversal level: follow links matched by
    /// `selector`, and also walk `pagination` links re-applying this level.
    pub fn follow_links_paginated(
        mut self,
        selector: impl Into<String>,
        pagination: impl Into<String>,
    ) -> Self {
        self.path.push(LinkSelector::paginated(selector, pagination));
        self
    }

    /// Like [`CrawlerBuilder::follow_links_paginated`] with a dynamic target.
    pub fn follow_links_paginated_to(
        mut self,
        selector: impl Into<String>,
        pagination: impl Into<String>,
        kind: PageKind,
    ) -> Self {
        self.path
            .push(LinkSelector::paginated(selector, pagination).with_target_kind(kind));
        self
    }

    /// URL prefixes that are never fetched.
    pub fn ignore_urls(mut self, prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.blacklist.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Caps the number of pages fetched per scope.
    pub fn limit(mut self, pages: u64) -> Self {
        self.config.page_limit = pages;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Bounds the retries of a failing job and sets the base backoff, which
    /// doubles on every subsequent attempt.
    pub fn retry(mut self, max_attempts: u32, base_backoff: Duration) -> Self {
        self.config.retry = RetryPolicy {
            max_attempts,
            base_backoff,
        };
        self
    }

    pub fn add_sink(self, sink: impl Sink + 'static) -> Self {
        self.add_sink_shared(Arc::new(sink))
    }

    pub fn add_sink_shared(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Registers an in-process callback invoked for every extracted record.
    pub fn on_record(self, callback: impl FnMut(&Record) + Send + 'static) -> Self {
        self.add_sink(CallbackSink::new(callback))
    }

    pub fn link_tracker(mut self, tracker: Arc<dyn LinkTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn static_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.static_loader = Some(loader);
        self
    }

    pub fn dynamic_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.dynamic_loader = Some(loader);
        self
    }

    pub fn link_parser(mut self, parser: Arc<dyn LinkParser>) -> Self {
        self.link_parser = Some(parser);
        self
    }

    pub fn content_parser(mut self, parser: Arc<dyn ContentParser>) -> Self {
        self.content_parser = Some(parser);
        self
    }

    /// Validates the configuration and assembles the crawler.
    pub fn build(self) -> Result<Crawler, CrawlError> {
        if self.seeds.is_empty() {
            return Err(CrawlError::Configuration(
                "at least one seed url is required".to_string(),
            ));
        }
        if self.config.workers == 0 {
            return Err(CrawlError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.config.retry.max_attempts == 0 {
            return Err(CrawlError::Configuration(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        let schema = match self.schema {
            Some(schema) if !schema.fields.is_empty() => schema,
            _ => {
                return Err(CrawlError::Configuration(
                    "a schema with at least one field is required".to_string(),
                ))
            }
        };

        let mut seed_urls = Vec::with_capacity(self.seeds.len());
        for (raw, kind) in &self.seeds {
            seed_urls.push((url::Url::parse(raw)?, *kind));
        }

        // The scope doubles as the base for resolving relative links.
        let base_url = match &self.scope {
            Some(raw) => url::Url::parse(raw)?,
            None => seed_urls[0].0.join("/")?,
        };

        let path = SelectorPath::new(self.path);
        let seeds: Vec<Job> = seed_urls
            .into_iter()
            .map(|(url, kind)| Job::seed(schema.clone(), base_url.clone(), url, path.clone(), kind))
            .collect();

        let sinks = if self.sinks.is_empty() {
            vec![Arc::new(ConsoleSink) as Arc<dyn Sink>]
        } else {
            self.sinks
        };

        let static_loader = match self.static_loader {
            Some(loader) => loader,
            None => Arc::new(HttpLoader::new()?),
        };
        // Without an injected browser loader, dynamic pages fall back to
        // plain HTTP.
        let dynamic_loader = self.dynamic_loader.unwrap_or_else(|| static_loader.clone());

        debug!(
            seeds = seeds.len(),
            workers = self.config.workers,
            path_len = path.len(),
            "crawler assembled"
        );

        let worker = Arc::new(CrawlWorker {
            queue: Arc::new(JobQueue::new()),
            tracker: self
                .tracker
                .unwrap_or_else(|| Arc::new(InMemoryLinkTracker::new())),
            static_loader,
            dynamic_loader,
            link_parser: self.link_parser.unwrap_or_else(|| Arc::new(CssLinkParser)),
            content_parser: self
                .content_parser
                .unwrap_or_else(|| Arc::new(CssContentParser)),
            sinks: Arc::new(sinks),
            blacklist: UrlBlacklist::new(self.blacklist),
            page_limit: self.config.page_limit,
            retry: self.config.retry,
            attempts: DashMap::new(),
            stats: Arc::new(StatCollector::new()),
        });

        Ok(Crawler {
            worker,
            seeds,
            workers: self.config.workers,
        })
    }
}
