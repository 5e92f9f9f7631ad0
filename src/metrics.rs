// Dispatch metrics module
//
// Provides lightweight counters for monitoring hub traffic

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Hub dispatch metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Counters are bumped from both worker threads (submission side) and the
/// owning thread (execution side) and can be logged on shutdown.
#[derive(Debug)]
pub struct DispatchMetrics {
    /// Broadcast calls that found at least one handler
    pub broadcasts: AtomicU64,

    /// Individual `show_message` invocations that succeeded
    pub deliveries: AtomicU64,

    /// `show_message` invocations that returned an error or panicked
    pub delivery_failures: AtomicU64,

    /// Handler panics caught on the owning thread (messages and dialogs)
    pub handler_panics: AtomicU64,

    /// Modal queries that found a handler
    pub modal_queries: AtomicU64,

    /// Modal queries whose handler failed
    pub query_failures: AtomicU64,

    /// Tasks submitted to the owning event loop
    pub tasks_queued: AtomicU64,

    /// Tasks the owning event loop executed
    pub tasks_executed: AtomicU64,

    /// Tasks dropped unexecuted when the event loop stopped
    pub tasks_discarded: AtomicU64,

    /// Cancel requests relayed to subscribers
    pub cancel_requests: AtomicU64,

    /// Calls that failed because the owning event loop was gone
    pub owner_unavailable: AtomicU64,

    start_time: Instant,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            broadcasts: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            handler_panics: AtomicU64::new(0),
            modal_queries: AtomicU64::new(0),
            query_failures: AtomicU64::new(0),
            tasks_queued: AtomicU64::new(0),
            tasks_executed: AtomicU64::new(0),
            tasks_discarded: AtomicU64::new(0),
            cancel_requests: AtomicU64::new(0),
            owner_unavailable: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_panic(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_modal_query(&self) {
        self.modal_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query_failure(&self) {
        self.query_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_queued(&self) {
        self.tasks_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_executed(&self) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tasks_discarded(&self, count: u64) {
        self.tasks_discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_cancel_request(&self) {
        self.cancel_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_owner_unavailable(&self) {
        self.owner_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Tasks queued but not yet executed or discarded
    pub fn tasks_pending(&self) -> u64 {
        let queued = self.tasks_queued.load(Ordering::Relaxed);
        let done = self.tasks_executed.load(Ordering::Relaxed)
            + self.tasks_discarded.load(Ordering::Relaxed);
        queued.saturating_sub(done)
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Dispatch Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Broadcasts: {}, deliveries: {}, delivery failures: {}",
            self.broadcasts.load(Ordering::Relaxed),
            self.deliveries.load(Ordering::Relaxed),
            self.delivery_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Modal queries: {}, failures: {}, handler panics: {}",
            self.modal_queries.load(Ordering::Relaxed),
            self.query_failures.load(Ordering::Relaxed),
            self.handler_panics.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Tasks: {} queued, {} executed, {} discarded",
            self.tasks_queued.load(Ordering::Relaxed),
            self.tasks_executed.load(Ordering::Relaxed),
            self.tasks_discarded.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Cancel requests: {}, owner unavailable: {}",
            self.cancel_requests.load(Ordering::Relaxed),
            self.owner_unavailable.load(Ordering::Relaxed)
        );
    }
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}
