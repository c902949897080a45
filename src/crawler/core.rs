//! The crawl engine.
//!
//! A [`Crawler`] owns the shared job queue, seeds it, runs a pool of worker
//! tasks to completion and closes the sinks. Build one with
//! [`crate::builder::CrawlerBuilder`].

use super::worker::CrawlWorker;
use crate::error::CrawlError;
use crate::job::Job;
use crate::sink::Sink;
use crate::stats::StatCollector;

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub struct Crawler {
    pub(crate) worker: Arc<CrawlWorker>,
    pub(crate) seeds: Vec<Job>,
    pub(crate) workers: usize,
}

impl Crawler {
    /// Runs the crawl to completion.
    ///
    /// Returns once every job has been handled and the queue is drained. The
    /// engine never aborts on per-job failures; consult [`Crawler::stats`]
    /// for the failure counters.
    pub async fn run(self) -> Result<(), CrawlError> {
        info!(
            seeds = self.seeds.len(),
            workers = self.workers,
            "starting crawl"
        );

        for seed in self.seeds {
            if self.worker.queue.write(seed) {
                self.worker.stats.increment_jobs_enqueued();
            }
        }

        let mut pool = JoinSet::new();
        for worker_id in 0..self.workers {
            pool.spawn(Arc::clone(&self.worker).run(worker_id));
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task panicked");
            }
        }

        let closings = self.worker.sinks.iter().map(|sink| sink.close());
        for (sink, result) in self.worker.sinks.iter().zip(join_all(closings).await) {
            if let Err(e) = result {
                warn!(sink = sink.name(), error = %e, "sink failed to close");
            }
        }

        info!("crawl finished{}", self.worker.stats);
        Ok(())
    }

    /// The live statistics of this crawl. The collector can be cloned out
    /// and polled from another task while [`Crawler::run`] is in flight.
    pub fn stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.worker.stats)
    }

    /// The sinks this crawl emits to.
    pub fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.worker.sinks
    }
}

// The collaborators are trait objects, so Debug is summarized by hand.
impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("seeds", &self.seeds.len())
            .field("workers", &self.workers)
            .field("sinks", &self.worker.sinks.len())
            .finish_non_exhaustive()
    }
}
