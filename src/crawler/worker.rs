//! The crawl worker: the per-job state machine.
//!
//! Each worker pulls jobs from the shared queue and runs them through a fixed
//! sequence of checks and actions: blacklist, page limit, dedup mark, fetch,
//! classify, then either record extraction (target pages) or child-job
//! discovery (transit and paginated pages). Any failure between fetch and
//! emission requeues the job unchanged, subject to a bounded retry policy
//! with exponential backoff.

use crate::blacklist::UrlBlacklist;
use crate::error::CrawlError;
use crate::job::{Job, PageRole};
use crate::loader::Loader;
use crate::parser::{ContentParser, LinkParser};
use crate::queue::JobQueue;
use crate::selector::PageKind;
use crate::sink::Sink;
use crate::stats::StatCollector;
use crate::tracker::LinkTracker;

use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Bounded-retry policy for failed jobs.
///
/// A job that keeps failing is retried up to `max_attempts` total attempts,
/// waiting `base_backoff * 2^(n-1)` before the n-th requeue.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, failures: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(failures.saturating_sub(1))
    }
}

/// How a successfully handled job ended.
#[derive(Debug)]
enum Outcome {
    /// The job ran through fetch and emission/discovery.
    Done,
    /// The job was discarded by blacklist, page limit or dedup.
    Dropped,
}

/// Shared state and logic of the worker pool. One instance is shared by all
/// workers; each worker runs [`CrawlWorker::run`] to completion.
pub(crate) struct CrawlWorker {
    pub(crate) queue: Arc<JobQueue>,
    pub(crate) tracker: Arc<dyn LinkTracker>,
    pub(crate) static_loader: Arc<dyn Loader>,
    pub(crate) dynamic_loader: Arc<dyn Loader>,
    pub(crate) link_parser: Arc<dyn LinkParser>,
    pub(crate) content_parser: Arc<dyn ContentParser>,
    pub(crate) sinks: Arc<Vec<Arc<dyn Sink>>>,
    pub(crate) blacklist: UrlBlacklist,
    pub(crate) page_limit: u64,
    pub(crate) retry: RetryPolicy,
    /// Failure counts per job identity, kept outside the immutable jobs.
    /// Keyed by job id so a duplicate of a retrying job, discovered via
    /// another parent, still falls to the dedup check.
    pub(crate) attempts: DashMap<u64, u32>,
    pub(crate) stats: Arc<StatCollector>,
}

impl CrawlWorker {
    /// Pulls and handles jobs until the queue is complete and drained.
    pub(crate) async fn run(self: Arc<Self>, worker_id: usize) {
        trace!(worker_id, "worker started");
        while let Some(job) = self.queue.recv().await {
            match self.handle(&job).await {
                Ok(Outcome::Done) => {
                    self.attempts.remove(&job.id);
                    self.stats.increment_jobs_completed();
                }
                Ok(Outcome::Dropped) => {
                    self.attempts.remove(&job.id);
                    self.stats.increment_jobs_dropped();
                }
                Err(e) => {
                    self.handle_failure(job, e).await;
                }
            }
            self.queue.task_done();
        }
        debug!(worker_id, "worker exiting, queue drained");
    }

    /// The per-job state machine. Steps may short-circuit with `Dropped`;
    /// any error from fetch onwards bubbles up to the requeue logic.
    async fn handle(&self, job: &Job) -> Result<Outcome, CrawlError> {
        if self.blacklist.matches(&job.url) {
            debug!(url = %job.url, "url is blacklisted, dropping job");
            return Ok(Outcome::Dropped);
        }

        let visited = self.tracker.visited_count(job.scope()).await?;
        if visited >= self.page_limit {
            info!(
                scope = job.scope(),
                limit = self.page_limit,
                "page crawl limit reached, completing queue"
            );
            self.queue.complete_adding();
            return Ok(Outcome::Dropped);
        }

        // Mark before fetching: a URL discovered twice concurrently is
        // fetched at most once. A retried job already holds the mark and
        // must pass through.
        let newly_marked = self.tracker.mark_visited(job.scope(), &job.url).await?;
        if !newly_marked && !self.is_retry(job) {
            trace!(url = %job.url, "url already visited, dropping job");
            return Ok(Outcome::Dropped);
        }

        let loader = match job.page_kind {
            PageKind::Static => &self.static_loader,
            PageKind::Dynamic => &self.dynamic_loader,
        };
        let document = match loader.load(&job.url).await {
            Ok(doc) => {
                self.stats.increment_pages_fetched();
                doc
            }
            Err(e) => {
                self.stats.increment_fetch_failures();
                return Err(e);
            }
        };

        match job.role() {
            PageRole::Target => {
                self.emit_record(job, &document).await?;
            }
            PageRole::Transit => {
                self.follow_links(job, &document).await?;
            }
            PageRole::PaginatedListing => {
                self.follow_links(job, &document).await?;
                self.follow_pagination(job, &document).await?;
            }
        }

        Ok(Outcome::Done)
    }

    /// Target pages: parse one record and fan it out to every sink
    /// concurrently. Sink failures are counted and logged, never retried.
    async fn emit_record(&self, job: &Job, document: &str) -> Result<(), CrawlError> {
        let record = self.content_parser.parse(document, &job.schema)?;
        self.stats.increment_records_emitted();
        debug!(url = %job.url, "record extracted, emitting to {} sinks", self.sinks.len());

        let emissions = self.sinks.iter().map(|sink| sink.emit(&record));
        for (sink, result) in self.sinks.iter().zip(join_all(emissions).await) {
            if let Err(e) = result {
                error!(sink = sink.name(), url = %job.url, error = %e, "sink emission failed");
                self.stats.increment_sink_errors();
            }
        }
        Ok(())
    }

    /// Transit and listing pages: pop the front selector, discover links,
    /// enqueue one child per unvisited link with the remainder path.
    async fn follow_links(&self, job: &Job, document: &str) -> Result<(), CrawlError> {
        let Some((selector, remainder)) = job.path.pop_front() else {
            return Ok(());
        };

        let raw = self.link_parser.links(document, &selector.selector)?;
        let resolved = resolve_links(&job.base_url, &raw);
        self.stats.add_links_discovered(resolved.len());

        let fresh = self
            .tracker
            .filter_unvisited(job.scope(), resolved)
            .await?;
        trace!(url = %job.url, fresh = fresh.len(), "enqueuing child jobs");
        for url in fresh {
            let child = job.child(url, remainder.clone(), selector.target_kind);
            if self.queue.write(child) {
                self.stats.increment_jobs_enqueued();
            }
        }
        Ok(())
    }

    /// Paginated listings, additionally: discover "next page" links and
    /// enqueue children that retain the full un-popped path, so the same
    /// listing selector is re-applied on the next page.
    async fn follow_pagination(&self, job: &Job, document: &str) -> Result<(), CrawlError> {
        let Some(selector) = job.path.front() else {
            return Ok(());
        };
        let Some(pagination) = selector.pagination.as_deref() else {
            return Ok(());
        };

        let raw = self.link_parser.links(document, pagination)?;
        let resolved = resolve_links(&job.base_url, &raw);
        self.stats.add_links_discovered(resolved.len());

        let fresh = self
            .tracker
            .filter_unvisited(job.scope(), resolved)
            .await?;
        if fresh.is_empty() {
            // Listings legitimately terminate.
            info!(url = %job.url, selector = pagination, "no further pages found");
            return Ok(());
        }

        for url in fresh {
            let child = job.child(url, job.path.clone(), job.page_kind);
            if self.queue.write(child) {
                self.stats.increment_jobs_enqueued();
            }
        }
        Ok(())
    }

    /// Requeues a failed job unchanged, up to the retry bound.
    async fn handle_failure(&self, job: Job, error: CrawlError) {
        let failures = {
            let mut entry = self.attempts.entry(job.id).or_insert(0);
            *entry += 1;
            *entry
        };

        if failures >= self.retry.max_attempts {
            self.attempts.remove(&job.id);
            error!(
                url = %job.url,
                attempts = failures,
                error = %error,
                "job failed permanently, dropping"
            );
            self.stats.increment_jobs_dropped();
            return;
        }

        let delay = self.retry.backoff(failures);
        warn!(
            url = %job.url,
            attempt = failures,
            backoff = ?delay,
            error = %error,
            "job failed, requeueing"
        );
        self.stats.increment_jobs_requeued();
        tokio::time::sleep(delay).await;
        if !self.queue.write(job) {
            debug!("queue already complete, failed job discarded");
        }
    }

    fn is_retry(&self, job: &Job) -> bool {
        self.attempts.contains_key(&job.id)
    }
}

/// Resolves raw link strings against the crawl's base URL, dropping anything
/// unparsable and stripping fragments so dedup sees canonical URLs.
fn resolve_links(base: &Url, raw: &[String]) -> Vec<Url> {
    let mut resolved = Vec::with_capacity(raw.len());
    for link in raw {
        match base.join(link) {
            Ok(mut url) => {
                url.set_fragment(None);
                resolved.push(url);
            }
            Err(e) => warn!(link, error = %e, "skipping unresolvable link"),
        }
    }
    resolved
}
