use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Instant;
use tracing::{Instrument, debug, warn};

use crate::error::{ErrorKind, StressResult};
use crate::workers::base::{UnitKind, UnitOfWork};
use crate::workers::outcome::{OutcomeSink, UnitOutcome};
use crate::{bail, stress_error};

/// Snapshot of the pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub submitted: u64,
    pub writes_succeeded: u64,
    pub writes_failed: u64,
    pub migrations_succeeded: u64,
    pub migrations_failed: u64,
    /// Units running at the time of the snapshot.
    pub running: usize,
    /// Highest number of units observed running at the same time.
    pub peak_concurrency: usize,
}

impl PoolStats {
    /// Returns the number of units that ran to completion, successfully or not.
    pub fn completed(&self) -> u64 {
        self.writes_succeeded
            + self.writes_failed
            + self.migrations_succeeded
            + self.migrations_failed
    }

    pub fn failed(&self) -> u64 {
        self.writes_failed + self.migrations_failed
    }
}

/// Result of [`WorkerPool::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub stats: PoolStats,
    /// Units submitted but not finished when the drain returned.
    pub outstanding: usize,
    pub timed_out: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    writes_succeeded: AtomicU64,
    writes_failed: AtomicU64,
    migrations_succeeded: AtomicU64,
    migrations_failed: AtomicU64,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl Counters {
    fn record(&self, kind: UnitKind, success: bool) {
        let counter = match (kind, success) {
            (UnitKind::Write { .. }, true) => &self.writes_succeeded,
            (UnitKind::Write { .. }, false) => &self.writes_failed,
            (UnitKind::Migration, true) => &self.migrations_succeeded,
            (UnitKind::Migration, false) => &self.migrations_failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::SeqCst),
            writes_succeeded: self.writes_succeeded.load(Ordering::SeqCst),
            writes_failed: self.writes_failed.load(Ordering::SeqCst),
            migrations_succeeded: self.migrations_succeeded.load(Ordering::SeqCst),
            migrations_failed: self.migrations_failed.load(Ordering::SeqCst),
            running: self.running.load(Ordering::SeqCst),
            peak_concurrency: self.peak.load(Ordering::SeqCst),
        }
    }
}

/// A unit of work waiting in the queue.
struct Job {
    kind: UnitKind,
    future: BoxFuture<'static, StressResult<()>>,
}

/// State shared by the pool handles and the worker tasks.
struct Shared {
    /// Units submitted and not yet finished.
    pending: watch::Sender<usize>,
    counters: Counters,
    sink: Arc<dyn OutcomeSink>,
}

impl Shared {
    async fn execute(&self, job: Job) {
        let Job { kind, future } = job;

        let running = self.counters.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(running, Ordering::SeqCst);
        debug!(unit = %kind, running, "unit of work started");

        let started = Instant::now();
        let result = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(stress_error!(
                ErrorKind::UnitOfWorkPanic,
                "Unit of work panicked",
                panic_message(panic.as_ref())
            )),
        };
        let elapsed = started.elapsed();

        self.counters.running.fetch_sub(1, Ordering::SeqCst);
        self.finish(UnitOutcome {
            kind,
            elapsed,
            result,
        });
    }

    fn finish(&self, outcome: UnitOutcome) {
        self.counters.record(outcome.kind, outcome.is_success());
        self.sink.record(outcome);
        self.pending.send_modify(|pending| *pending -= 1);
    }
}

/// Pulls units from the queue and runs them one at a time until the pool is dropped.
async fn worker_loop(shared: Arc<Shared>, queue: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>) {
    loop {
        let job = {
            let mut queue = queue.lock().await;
            queue.recv().await
        };

        let Some(job) = job else {
            debug!("worker pool closed, stopping worker");
            return;
        };

        shared.execute(job).await;
    }
}

/// Bounded pool executing units of work concurrently.
///
/// The pool owns `capacity` worker tasks pulling units from a shared FIFO queue, so at most
/// `capacity` units run at the same time and units start in submission order. Completion order is
/// arbitrary. [`WorkerPool::submit`] only enqueues and never blocks. Failures and panics of a unit
/// are turned into a [`UnitOutcome`] for the configured [`OutcomeSink`] and affect neither other
/// units nor the pool.
///
/// The workers stop once every handle to the pool has been dropped and the queue is empty.
#[derive(Clone)]
pub struct WorkerPool {
    capacity: usize,
    jobs: mpsc::UnboundedSender<Job>,
    shared: Arc<Shared>,
}

impl WorkerPool {
    /// Creates a pool running at most `capacity` units at once.
    ///
    /// Must be called from within a Tokio runtime, which runs the worker tasks.
    pub fn new<S>(capacity: usize, sink: S) -> StressResult<Self>
    where
        S: OutcomeSink,
    {
        if capacity == 0 {
            bail!(
                ErrorKind::ConfigError,
                "Worker pool capacity must be at least one"
            );
        }

        let (pending, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            pending,
            counters: Counters::default(),
            sink: Arc::new(sink),
        });

        let (jobs, queue) = mpsc::unbounded_channel();
        let queue = Arc::new(Mutex::new(queue));
        let span = tracing::Span::current();
        for _ in 0..capacity {
            let worker = worker_loop(Arc::clone(&shared), Arc::clone(&queue));
            tokio::spawn(worker.instrument(span.clone()));
        }

        Ok(Self {
            capacity,
            jobs,
            shared,
        })
    }

    /// Enqueues a unit for execution and returns immediately.
    ///
    /// The unit runs in the span of the caller.
    pub fn submit<U>(&self, unit: U)
    where
        U: UnitOfWork,
    {
        let kind = unit.kind();
        let job = Job {
            kind,
            future: unit.run().in_current_span().boxed(),
        };

        self.shared.counters.submitted.fetch_add(1, Ordering::SeqCst);
        self.shared.pending.send_modify(|pending| *pending += 1);

        if self.jobs.send(job).is_err() {
            let error = stress_error!(
                ErrorKind::WorkerPoolClosed,
                "Worker pool was closed before the unit could run"
            );
            self.shared.finish(UnitOutcome {
                kind,
                elapsed: Duration::ZERO,
                result: Err(error),
            });
        }
    }

    /// Waits until every submitted unit finished or `timeout` elapsed, whichever comes first.
    ///
    /// Units still queued or running when the timeout elapses are left alone.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        let started = Instant::now();
        let mut pending = self.shared.pending.subscribe();

        let wait = pending.wait_for(|pending| *pending == 0);
        let timed_out = match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(_)) => false,
            Ok(Err(err)) => {
                warn!(
                    error = %err,
                    "wait for outstanding units was interrupted, treating it as completed"
                );
                false
            }
            Err(_) => true,
        };

        DrainReport {
            stats: self.stats(),
            outstanding: *self.shared.pending.borrow(),
            timed_out,
            elapsed: started.elapsed(),
        }
    }

    /// Returns a snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot()
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("pending", &*self.shared.pending.borrow())
            .field("stats", &self.stats())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use super::*;
    use crate::error::StressResult;
    use crate::test_utils::outcome::MemoryOutcomeSink;

    struct SleepUnit {
        index: u64,
        duration: Duration,
    }

    impl UnitOfWork for SleepUnit {
        fn kind(&self) -> UnitKind {
            UnitKind::Write { index: self.index }
        }

        fn run(self) -> impl Future<Output = StressResult<()>> + Send + 'static {
            async move {
                tokio::time::sleep(self.duration).await;
                Ok(())
            }
        }
    }

    struct PanickingUnit;

    impl UnitOfWork for PanickingUnit {
        fn kind(&self) -> UnitKind {
            UnitKind::Migration
        }

        fn run(self) -> impl Future<Output = StressResult<()>> + Send + 'static {
            async move { panic!("boom") }
        }
    }

    #[tokio::test]
    async fn zero_capacity_is_rejected() {
        let err = WorkerPool::new(0, MemoryOutcomeSink::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_never_exceeds_capacity() {
        let sink = MemoryOutcomeSink::new();
        let pool = WorkerPool::new(2, sink.clone()).unwrap();

        for index in 0..8 {
            pool.submit(SleepUnit {
                index,
                duration: Duration::from_millis(20),
            });
        }

        let report = pool.drain(Duration::from_secs(10)).await;
        assert!(!report.timed_out);
        assert_eq!(report.outstanding, 0);
        assert_eq!(report.stats.submitted, 8);
        assert_eq!(report.stats.writes_succeeded, 8);
        assert!(report.stats.peak_concurrency <= 2);
        assert_eq!(sink.outcomes().len(), 8);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panics_are_reported_as_outcomes() {
        let sink = MemoryOutcomeSink::new();
        let pool = WorkerPool::new(1, sink.clone()).unwrap();

        pool.submit(PanickingUnit);
        pool.submit(SleepUnit {
            index: 0,
            duration: Duration::ZERO,
        });

        let report = pool.drain(Duration::from_secs(10)).await;
        assert_eq!(report.stats.migrations_failed, 1);
        assert_eq!(report.stats.writes_succeeded, 1);

        let outcomes = sink.outcomes();
        let panicked = outcomes
            .iter()
            .find(|outcome| outcome.kind == UnitKind::Migration)
            .unwrap();
        let err = panicked.result.as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnitOfWorkPanic);
        assert_eq!(err.detail(), Some("boom"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn drain_returns_at_the_timeout_without_cancelling() {
        let sink = MemoryOutcomeSink::new();
        let pool = WorkerPool::new(1, sink.clone()).unwrap();

        pool.submit(SleepUnit {
            index: 0,
            duration: Duration::from_secs(30),
        });

        let timeout = Duration::from_millis(100);
        let report = pool.drain(timeout).await;

        assert!(report.timed_out);
        assert_eq!(report.outstanding, 1);
        assert!(report.elapsed < timeout + Duration::from_secs(1));
        assert_eq!(pool.stats().running, 1);
    }

    #[tokio::test]
    async fn draining_an_idle_pool_returns_immediately() {
        let pool = WorkerPool::new(3, MemoryOutcomeSink::new()).unwrap();
        let report = pool.drain(Duration::from_secs(10)).await;

        assert!(!report.timed_out);
        assert_eq!(report.stats, PoolStats::default());
    }
}
