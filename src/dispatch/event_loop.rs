// Owning event loop - the single thread allowed to run handler logic
//
// Worker threads never touch handlers. They box the invocation into a task
// and push it onto an unbounded queue; the owning thread drains the queue in
// FIFO order. A caller that must wait pairs its task with a oneshot sender.
//
// Processing quit, or dropping the loop, closes the queue and discards
// whatever is left. That drops the pending oneshot senders so blocked callers
// wake up with an error instead of hanging.

use crate::metrics::DispatchMetrics;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Work sent to the owning thread.
pub(crate) enum Task {
    Run {
        job: Box<dyn FnOnce() + Send>,
        /// Caller's span, entered while the job runs so handler logs nest under it
        span: tracing::Span,
    },
    Quit,
}

/// Receiving half of the task queue, shared between the [`EventLoop`] and the
/// hub so handlers can pump nested loops.
///
/// Only the owning thread may drain it; the receiver lock is therefore never
/// contended and is only held while waiting for the next task, never while a
/// task runs.
pub(crate) struct TaskQueue {
    rx: Mutex<mpsc::UnboundedReceiver<Task>>,
    quit: AtomicBool,
    metrics: Arc<DispatchMetrics>,
}

impl TaskQueue {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Task>, metrics: Arc<DispatchMetrics>) -> Self {
        Self {
            rx: Mutex::new(rx),
            quit: AtomicBool::new(false),
            metrics,
        }
    }

    pub(crate) fn is_quit_requested(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    /// Block until quit is requested or every sender is gone.
    fn run_blocking(&self) -> u64 {
        let mut executed = 0;
        while !self.is_quit_requested() {
            let next = self
                .rx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .blocking_recv();

            match next {
                Some(task) => executed += self.execute(task),
                None => {
                    tracing::debug!("All hub handles dropped, leaving event loop");
                    break;
                }
            }
        }
        executed
    }

    /// Execute every task already queued, without waiting for more.
    pub(crate) fn run_pending(&self) -> u64 {
        let mut executed = 0;
        while !self.is_quit_requested() {
            let next = self
                .rx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .try_recv();

            match next {
                Ok(task) => executed += self.execute(task),
                Err(_) => break,
            }
        }
        executed
    }

    fn execute(&self, task: Task) -> u64 {
        match task {
            Task::Run { job, span } => {
                let _guard = span.enter();
                job();
                self.metrics.record_task_executed();
                1
            }
            Task::Quit => {
                tracing::debug!("Quit requested, closing task queue");
                self.quit.store(true, Ordering::Release);
                // Callers must not block on a loop that will never run their task
                self.close();
                0
            }
        }
    }

    /// Refuse further tasks and drop the ones still queued.
    fn close(&self) {
        let mut rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        rx.close();

        let mut discarded = 0u64;
        while let Ok(task) = rx.try_recv() {
            if matches!(task, Task::Run { .. }) {
                discarded += 1;
            }
        }

        if discarded > 0 {
            self.metrics.record_tasks_discarded(discarded);
            tracing::warn!(discarded, "Event loop stopped with pending tasks, discarding them");
        }
    }
}

/// Driver for the owning thread's task queue.
///
/// Created together with the hub by [`NotifyHub::new`](super::NotifyHub::new)
/// on the thread that becomes the owning thread. It is `!Send`, so it cannot
/// be moved to and driven from any other thread.
///
/// # Example
/// ```ignore
/// let (hub, event_loop) = NotifyHub::new();
/// hub.register(Category::ERROR, &surface);
///
/// let worker_hub = hub.clone();
/// std::thread::spawn(move || {
///     worker_hub.broadcast(Category::ERROR, "disk full", MessageFlags::ERROR, Payload::Empty)?;
///     worker_hub.quit();
///     Ok::<_, DispatchError>(())
/// });
///
/// event_loop.run(); // returns once quit() is processed
/// ```
pub struct EventLoop {
    queue: Arc<TaskQueue>,
    _not_send: PhantomData<*const ()>,
}

impl EventLoop {
    pub(crate) fn new(queue: Arc<TaskQueue>) -> Self {
        Self {
            queue,
            _not_send: PhantomData,
        }
    }

    /// Drain tasks until [`NotifyHub::quit`](super::NotifyHub::quit) is
    /// processed or every hub handle is dropped.
    ///
    /// Returns the number of tasks executed. Tasks still queued when the loop
    /// leaves are discarded.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context, since
    /// it waits with `blocking_recv`. Drive it from a plain thread.
    pub fn run(self) -> u64 {
        tracing::info!("Event loop running");
        let executed = self.queue.run_blocking();
        tracing::info!(executed, "Event loop finished");
        executed
    }

    /// Execute everything already queued and return immediately.
    ///
    /// Useful for embedding the hub into a foreign event loop (call this from
    /// its idle or timer callback) and for tests. Once quit is processed the
    /// queue is closed, even though the loop itself is still alive.
    pub fn process_pending(&mut self) -> u64 {
        self.queue.run_pending()
    }

    pub fn is_quit_requested(&self) -> bool {
        self.queue.is_quit_requested()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.queue.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn queue() -> (mpsc::UnboundedSender<Task>, EventLoop, Arc<DispatchMetrics>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(DispatchMetrics::new());
        let queue = Arc::new(TaskQueue::new(rx, Arc::clone(&metrics)));
        (tx, EventLoop::new(queue), metrics)
    }

    fn job(f: impl FnOnce() + Send + 'static) -> Task {
        Task::Run {
            job: Box::new(f),
            span: tracing::Span::none(),
        }
    }

    #[test]
    fn test_tasks_run_in_fifo_order() {
        let (tx, event_loop, _) = queue();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            tx.send(job(move || order.lock().unwrap().push(i))).ok();
        }
        tx.send(Task::Quit).ok();

        assert_eq!(event_loop.run(), 5);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_run_returns_when_senders_dropped() {
        let (tx, event_loop, _) = queue();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        tx.send(job(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
        .ok();
        drop(tx);

        assert_eq!(event_loop.run(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_process_pending_stops_at_quit() {
        let (tx, mut event_loop, _) = queue();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        tx.send(job(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
        .ok();
        tx.send(Task::Quit).ok();
        let c = Arc::clone(&counter);
        tx.send(job(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
        .ok();

        assert_eq!(event_loop.process_pending(), 1);
        assert!(event_loop.is_quit_requested());
        assert_eq!(event_loop.process_pending(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_quit_closes_queue_while_loop_alive() {
        let (tx, mut event_loop, metrics) = queue();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        tx.send(Task::Quit).ok();
        tx.send(job(move || {
            let _ = done_tx.send(());
        }))
        .ok();

        assert_eq!(event_loop.process_pending(), 0);

        // Queued after quit: discarded, its waiter released
        assert!(done_rx.blocking_recv().is_err());
        assert_eq!(metrics.tasks_discarded.load(Ordering::Relaxed), 1);
        assert!(tx.send(job(|| {})).is_err());

        drop(event_loop);
        assert_eq!(metrics.tasks_discarded.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_drop_discards_and_releases_waiters() {
        let (tx, event_loop, metrics) = queue();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        tx.send(job(move || {
            let _ = done_tx.send(());
        }))
        .ok();
        drop(event_loop);

        assert!(done_rx.blocking_recv().is_err());
        assert_eq!(metrics.tasks_discarded.load(Ordering::Relaxed), 1);
        assert!(tx.send(Task::Quit).is_err());
    }
}
