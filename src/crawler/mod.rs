//! Crawl orchestration.
//!
//! [`Crawler`] drives the whole pipeline: it seeds the job queue and runs a
//! pool of workers, each executing the per-job state machine in
//! [`worker`], until the queue completes.

mod core;
mod worker;

pub use self::core::Crawler;
pub use self::worker::RetryPolicy;

pub(crate) use self::worker::CrawlWorker;
