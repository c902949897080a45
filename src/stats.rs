//! Crawl statistics.
//!
//! The [`StatCollector`] tracks counters across the whole crawl: job flow
//! through the queue, fetch outcomes, discovered links, emitted records and
//! sink failures. All counters are atomic and updated concurrently by the
//! worker pool; a consistent snapshot backs the `Display` and JSON exports.

use crate::error::CrawlError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

// A consistent view of the counters, used by the export methods.
struct StatsSnapshot {
    jobs_enqueued: usize,
    jobs_completed: usize,
    jobs_requeued: usize,
    jobs_dropped: usize,
    pages_fetched: usize,
    fetch_failures: usize,
    links_discovered: usize,
    records_emitted: usize,
    sink_errors: usize,
    elapsed: Duration,
}

impl StatsSnapshot {
    fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_fetched as f64 / secs
        } else {
            0.0
        }
    }
}

/// Atomic counters describing the progress of a crawl.
#[derive(Debug, serde::Serialize)]
pub struct StatCollector {
    #[serde(skip)]
    start_time: Instant,

    pub jobs_enqueued: AtomicUsize,
    pub jobs_completed: AtomicUsize,
    pub jobs_requeued: AtomicUsize,
    /// Jobs discarded by blacklist, dedup, page limit or retry exhaustion.
    pub jobs_dropped: AtomicUsize,

    pub pages_fetched: AtomicUsize,
    pub fetch_failures: AtomicUsize,

    pub links_discovered: AtomicUsize,

    pub records_emitted: AtomicUsize,
    pub sink_errors: AtomicUsize,
}

impl StatCollector {
    pub fn new() -> Self {
        StatCollector {
            start_time: Instant::now(),
            jobs_enqueued: AtomicUsize::new(0),
            jobs_completed: AtomicUsize::new(0),
            jobs_requeued: AtomicUsize::new(0),
            jobs_dropped: AtomicUsize::new(0),
            pages_fetched: AtomicUsize::new(0),
            fetch_failures: AtomicUsize::new(0),
            links_discovered: AtomicUsize::new(0),
            records_emitted: AtomicUsize::new(0),
            sink_errors: AtomicUsize::new(0),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            jobs_enqueued: self.jobs_enqueued.load(Ordering::SeqCst),
            jobs_completed: self.jobs_completed.load(Ordering::SeqCst),
            jobs_requeued: self.jobs_requeued.load(Ordering::SeqCst),
            jobs_dropped: self.jobs_dropped.load(Ordering::SeqCst),
            pages_fetched: self.pages_fetched.load(Ordering::SeqCst),
            fetch_failures: self.fetch_failures.load(Ordering::SeqCst),
            links_discovered: self.links_discovered.load(Ordering::SeqCst),
            records_emitted: self.records_emitted.load(Ordering::SeqCst),
            sink_errors: self.sink_errors.load(Ordering::SeqCst),
            elapsed: self.start_time.elapsed(),
        }
    }

    pub(crate) fn increment_jobs_enqueued(&self) {
        self.jobs_enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_jobs_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_jobs_requeued(&self) {
        self.jobs_requeued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_jobs_dropped(&self) {
        self.jobs_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_pages_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn add_links_discovered(&self, count: usize) {
        self.links_discovered.fetch_add(count, Ordering::SeqCst);
    }

    pub(crate) fn increment_records_emitted(&self) {
        self.records_emitted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_sink_errors(&self) {
        self.sink_errors.fetch_add(1, Ordering::SeqCst);
    }

    /// Serializes the counters to a JSON string.
    pub fn to_json_string(&self) -> Result<String, CrawlError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the counters to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String, CrawlError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for StatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StatCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {:?}", snapshot.elapsed)?;
        writeln!(f, "  speed    : {:.2} pages/s", snapshot.pages_per_second())?;
        writeln!(
            f,
            "  jobs     : enqueued: {}, completed: {}, requeued: {}, dropped: {}",
            snapshot.jobs_enqueued,
            snapshot.jobs_completed,
            snapshot.jobs_requeued,
            snapshot.jobs_dropped
        )?;
        writeln!(
            f,
            "  fetches  : ok: {}, failed: {}",
            snapshot.pages_fetched, snapshot.fetch_failures
        )?;
        writeln!(
            f,
            "  output   : links: {}, records: {}, sink errors: {}",
            snapshot.links_discovered, snapshot.records_emitted, snapshot.sink_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = StatCollector::new();
        stats.increment_jobs_enqueued();
        stats.increment_jobs_enqueued();
        stats.increment_pages_fetched();
        stats.add_links_discovered(4);

        assert_eq!(stats.jobs_enqueued.load(Ordering::SeqCst), 2);
        assert_eq!(stats.pages_fetched.load(Ordering::SeqCst), 1);
        assert_eq!(stats.links_discovered.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn json_export_includes_counters() {
        let stats = StatCollector::new();
        stats.increment_records_emitted();
        let json = stats.to_json_string().unwrap();
        assert!(json.contains("\"records_emitted\":1"));
    }
}
