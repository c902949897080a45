//! The shared job queue.
//!
//! A multi-producer multi-consumer hand-off between workers discovering child
//! jobs and workers pulling the next job. Jobs are delivered in priority
//! order (smaller [`Job::priority`] first) with FIFO tie-breaking among equal
//! priorities, so traversal is breadth-first and reproducible.
//!
//! The queue tracks jobs that have been delivered but not yet retired via
//! [`JobQueue::task_done`]. When the buffer is empty and nothing is in
//! flight, the queue completes itself and wakes every blocked reader — the
//! crawl ends cleanly even when the last job produces no children.

use crate::job::Job;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::Notify;
use tracing::{debug, info, trace};

struct HeapEntry {
    priority: i64,
    seq: u64,
    job: Job,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    // BinaryHeap is a max-heap; reverse so the smallest (priority, seq)
    // pops first. Sequence numbers are unique, so the order is total.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct QueueInner {
    heap: BinaryHeap<HeapEntry>,
    in_flight: usize,
    next_seq: u64,
}

/// Concurrent priority queue of [`Job`]s with completion semantics.
pub struct JobQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    completed: AtomicBool,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                in_flight: 0,
                next_seq: 0,
            }),
            notify: Notify::new(),
            completed: AtomicBool::new(false),
        }
    }

    /// Enqueues a job. Returns `false` (and drops the job) once the queue
    /// has been marked complete.
    pub fn write(&self, job: Job) -> bool {
        if self.completed.load(AtomicOrdering::SeqCst) {
            debug!(url = %job.url, "queue completed, dropping write");
            return false;
        }

        let priority = job.priority();
        {
            let mut inner = self.inner.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            trace!(url = %job.url, priority, seq, "enqueuing job");
            inner.heap.push(HeapEntry { priority, seq, job });
        }
        self.notify.notify_one();
        true
    }

    /// Pulls the next job, suspending while the queue is empty and not yet
    /// complete. Returns `None` once the queue is complete and drained.
    ///
    /// Every delivered job must be retired with [`JobQueue::task_done`].
    pub async fn recv(&self) -> Option<Job> {
        loop {
            {
                let mut inner = self.inner.lock();
                if let Some(entry) = inner.heap.pop() {
                    inner.in_flight += 1;
                    trace!(url = %entry.job.url, "delivering job");
                    return Some(entry.job);
                }
            }

            if self.completed.load(AtomicOrdering::SeqCst) {
                return None;
            }

            // Register interest before re-checking so a write between the
            // check and the await cannot be missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let inner = self.inner.lock();
                if !inner.heap.is_empty() {
                    continue;
                }
            }
            if self.completed.load(AtomicOrdering::SeqCst) {
                return None;
            }

            notified.await;
        }
    }

    /// Retires a job previously delivered by [`JobQueue::recv`]. When the
    /// last in-flight job retires against an empty buffer, the queue
    /// completes itself.
    pub fn task_done(&self) {
        let drained = {
            let mut inner = self.inner.lock();
            debug_assert!(inner.in_flight > 0, "task_done without matching recv");
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.in_flight == 0 && inner.heap.is_empty()
        };

        if drained {
            debug!("queue drained and idle");
            self.complete_adding();
        }
    }

    /// Signals that no further writes will occur. Idempotent; buffered jobs
    /// are still delivered to readers.
    pub fn complete_adding(&self) {
        if !self.completed.swap(true, AtomicOrdering::SeqCst) {
            info!("job queue marked complete");
            self.notify.notify_waiters();
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(AtomicOrdering::SeqCst)
    }

    /// Number of buffered (undelivered) jobs.
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::selector::{LinkSelector, PageKind, SelectorPath};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    fn job(url: &str, selectors: Vec<LinkSelector>, depth: u32) -> Job {
        let mut job = Job::seed(
            Schema::new(),
            Url::parse("https://x.test").unwrap(),
            Url::parse(url).unwrap(),
            SelectorPath::new(selectors),
            PageKind::Static,
        );
        job.depth = depth;
        job
    }

    fn transit(url: &str, depth: u32) -> Job {
        job(url, vec![LinkSelector::new(".a")], depth)
    }

    fn target(url: &str, depth: u32) -> Job {
        job(url, vec![], depth)
    }

    #[tokio::test]
    async fn delivers_by_priority_then_insertion_order() {
        let queue = JobQueue::new();
        queue.write(transit("https://x.test/deep", 2));
        queue.write(target("https://x.test/t1", 5));
        queue.write(transit("https://x.test/shallow", 1));
        queue.write(target("https://x.test/t2", 5));

        let order: Vec<String> = [
            queue.recv().await.unwrap(),
            queue.recv().await.unwrap(),
            queue.recv().await.unwrap(),
            queue.recv().await.unwrap(),
        ]
        .iter()
        .map(|j| j.url.to_string())
        .collect();

        // Targets first in FIFO order, then shallower before deeper.
        assert_eq!(
            order,
            vec![
                "https://x.test/t1",
                "https://x.test/t2",
                "https://x.test/shallow",
                "https://x.test/deep",
            ]
        );
    }

    #[tokio::test]
    async fn equal_priority_is_fifo() {
        let queue = JobQueue::new();
        for i in 0..10 {
            queue.write(transit(&format!("https://x.test/p{i}"), 1));
        }
        for i in 0..10 {
            let job = queue.recv().await.unwrap();
            assert_eq!(job.url.path(), format!("/p{i}"));
            queue.task_done();
        }
    }

    #[tokio::test]
    async fn write_after_complete_is_ignored() {
        let queue = JobQueue::new();
        queue.complete_adding();
        assert!(!queue.write(transit("https://x.test/late", 0)));
        assert!(queue.recv().await.is_none());
    }

    #[tokio::test]
    async fn buffered_jobs_drain_after_complete() {
        let queue = JobQueue::new();
        queue.write(transit("https://x.test/a", 0));
        queue.write(transit("https://x.test/b", 0));
        queue.complete_adding();

        assert!(queue.recv().await.is_some());
        assert!(queue.recv().await.is_some());
        assert!(queue.recv().await.is_none());
    }

    #[tokio::test]
    async fn last_job_with_no_children_completes_the_queue() {
        let queue = Arc::new(JobQueue::new());
        queue.write(transit("https://x.test/only", 0));

        let job = queue.recv().await.unwrap();
        assert_eq!(job.url.path(), "/only");

        let reader = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                // Must resolve to None once the in-flight job retires, not hang.
                queue.recv().await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.task_done();

        let second = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("queue deadlocked after draining")
            .unwrap();
        assert!(second.is_none());
        assert!(queue.is_completed());
    }

    #[tokio::test]
    async fn each_job_is_delivered_to_exactly_one_reader() {
        let queue = Arc::new(JobQueue::new());
        for i in 0..100 {
            queue.write(transit(&format!("https://x.test/{i}"), 1));
        }

        let mut readers = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            readers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(job) = queue.recv().await {
                    seen.push(job.url.to_string());
                    queue.task_done();
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for reader in readers {
            all.extend(reader.await.unwrap());
        }

        assert_eq!(all.len(), 100);
        assert_eq!(all.iter().collect::<HashSet<_>>().len(), 100);
    }
}
