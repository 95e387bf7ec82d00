use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::StressResult;
use crate::store::{Statement, StoreClient};

/// Tracks how many operations are in flight and the highest number seen at once.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyGauge {
    inner: Arc<GaugeInner>,
}

#[derive(Debug, Default)]
struct GaugeInner {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of an operation, which ends when the returned guard is dropped.
    pub fn enter(&self) -> GaugeGuard {
        let current = self.inner.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(current, Ordering::SeqCst);
        self.inner.total.fetch_add(1, Ordering::SeqCst);

        GaugeGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn current(&self) -> usize {
        self.inner.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Returns how many operations were started so far.
    pub fn total(&self) -> usize {
        self.inner.total.load(Ordering::SeqCst)
    }
}

/// Guard returned by [`ConcurrencyGauge::enter`].
#[derive(Debug)]
pub struct GaugeGuard {
    inner: Arc<GaugeInner>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.inner.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store client wrapper adding latency to inserts and measuring their concurrency.
///
/// Schema statements go straight to the wrapped client.
#[derive(Debug, Clone)]
pub struct InstrumentedStoreClient<C> {
    inner: C,
    latency: Duration,
    gauge: ConcurrencyGauge,
}

impl<C> InstrumentedStoreClient<C>
where
    C: StoreClient,
{
    pub fn new(inner: C, latency: Duration) -> Self {
        Self {
            inner,
            latency,
            gauge: ConcurrencyGauge::new(),
        }
    }

    pub fn gauge(&self) -> &ConcurrencyGauge {
        &self.gauge
    }
}

impl<C> StoreClient for InstrumentedStoreClient<C>
where
    C: StoreClient,
{
    fn name() -> &'static str {
        C::name()
    }

    async fn execute(&self, statement: &Statement) -> StressResult<()> {
        if !matches!(statement, Statement::Insert { .. }) {
            return self.inner.execute(statement).await;
        }

        let _guard = self.gauge.enter();
        tokio::time::sleep(self.latency).await;
        self.inner.execute(statement).await
    }
}
