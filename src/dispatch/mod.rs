//! Dispatch module - routes notifications and modal queries to UI handlers.
//!
//! The [`NotifyHub`] is the one hub of the process. It is constructed by the
//! composition root, cloned into every collaborator that needs it, and pairs
//! with an [`EventLoop`] that the owning (UI) thread drives.
//!
//! # Components
//!
//! - [`Handler`]: capability a UI surface implements to render messages and dialogs
//! - [`CategoryRegistry`]: category -> ordered handler list
//! - [`EventLoop`]: the owning thread's task queue
//! - [`CancelCallback`] / [`CancelRequest`]: advisory cancellation relay
//!
//! # Delivery modes
//!
//! Each call decides once how to reach its handlers:
//!
//! | caller         | `broadcast`                           | `modal_query`            |
//! |----------------|---------------------------------------|--------------------------|
//! | owning thread  | in-line, registration order           | in-line                  |
//! | worker thread  | queued; waits only with `BLOCKING`    | queued, always waits     |
//!
//! Queued work runs on the owning thread in FIFO order. Handler failures in a
//! broadcast are logged and contained; a failing dialog is returned to the
//! querying caller as a [`DispatchError`].

pub mod cancel;
pub mod error;
pub mod event_loop;
pub mod handler;
pub mod registry;

pub use cancel::{CancelCallback, CancelRequest};
pub use error::{DispatchError, HandlerError};
pub use event_loop::EventLoop;
pub use handler::{Handler, HandlerSlot};
pub use registry::CategoryRegistry;

use crate::metrics::DispatchMetrics;
use crate::models::{Category, HubSettings, MessageFlags, Payload};
use error::panic_message;
use event_loop::{Task, TaskQueue};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};
use tokio::sync::{broadcast, mpsc, oneshot};

type QueryResult = Result<Option<Payload>, DispatchError>;

/// Outcome of starting a call: either finished in-line or waiting on the
/// owning thread.
enum Reply<T> {
    Ready(T),
    Pending(oneshot::Receiver<T>),
}

struct HubInner {
    owner: ThreadId,
    registry: RwLock<CategoryRegistry>,
    task_tx: mpsc::UnboundedSender<Task>,
    queue: Arc<TaskQueue>,
    cancel_tx: broadcast::Sender<CancelRequest>,
    metrics: Arc<DispatchMetrics>,
}

/// Cross-thread notification and modal-query hub.
///
/// Cheap to clone; all clones share one registry and one owning thread.
///
/// # Usage
///
/// - [`register()`](Self::register) subscribes a handler to a category
/// - [`broadcast()`](Self::broadcast) fans a message out to every handler of a category
/// - [`modal_query()`](Self::modal_query) asks the first handler of a category for a value
/// - [`subscribe_cancel()`](Self::subscribe_cancel) listens for handler cancel requests
///
/// Blocking calls from worker threads use `blocking_recv` and must not be
/// made from inside an async runtime; use the `_async` variants there.
#[derive(Clone)]
pub struct NotifyHub {
    inner: Arc<HubInner>,
}

impl NotifyHub {
    /// Create a hub owned by the calling thread, with default settings.
    pub fn new() -> (Self, EventLoop) {
        Self::with_settings(&HubSettings::default())
    }

    /// Create a hub owned by the calling thread.
    ///
    /// The returned [`EventLoop`] must be driven on this same thread.
    pub fn with_settings(settings: &HubSettings) -> (Self, EventLoop) {
        let metrics = Arc::new(DispatchMetrics::new());
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let queue = Arc::new(TaskQueue::new(task_rx, Arc::clone(&metrics)));
        let (cancel_tx, _) = broadcast::channel(settings.cancel_capacity());

        let owner = thread::current();
        tracing::debug!(
            owner = ?owner.id(),
            name = owner.name().unwrap_or("<unnamed>"),
            "Notify hub created"
        );

        let hub = Self {
            inner: Arc::new(HubInner {
                owner: owner.id(),
                registry: RwLock::new(CategoryRegistry::new()),
                task_tx,
                queue: Arc::clone(&queue),
                cancel_tx,
                metrics,
            }),
        };

        (hub, EventLoop::new(queue))
    }

    /// Subscribe `handler` to `category`.
    ///
    /// Records `category` in the handler's mask and hands it the cancel
    /// callback. The hub keeps only a weak reference: the handler stays
    /// registered for as long as its owner keeps it alive. Registering twice
    /// delivers twice.
    pub fn register<H: Handler + 'static>(&self, category: Category, handler: &Arc<H>) {
        let handler: Arc<dyn Handler> = Arc::clone(handler) as Arc<dyn Handler>;

        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(category, &handler);

        handler.set_category_mask(handler.category_mask() | category);
        handler.set_cancel_callback(self.cancel_callback());

        tracing::debug!(
            category = %category.label(),
            mask = %handler.category_mask().label(),
            "Handler registered"
        );
    }

    /// Deliver `message` to every handler registered under `category`.
    ///
    /// From the owning thread this runs in-line. From any other thread it is
    /// queued on the owning thread; the call waits for delivery only when
    /// `flags` contains [`MessageFlags::BLOCKING`].
    ///
    /// Handler failures are logged and never returned. The only error is
    /// [`DispatchError::OwnerUnavailable`].
    ///
    /// # Panics
    ///
    /// A `BLOCKING` broadcast from a worker waits with `blocking_recv` and
    /// panics if called from within an asynchronous execution context. Use
    /// [`broadcast_async`](Self::broadcast_async) there.
    pub fn broadcast(
        &self,
        category: Category,
        message: &str,
        flags: MessageFlags,
        payload: Payload,
    ) -> Result<(), DispatchError> {
        match self.begin_broadcast(category, message, flags, payload)? {
            Reply::Ready(()) => Ok(()),
            Reply::Pending(done) => done.blocking_recv().map_err(|_| self.owner_unavailable()),
        }
    }

    /// [`broadcast`](Self::broadcast) for callers running inside an async runtime.
    pub async fn broadcast_async(
        &self,
        category: Category,
        message: &str,
        flags: MessageFlags,
        payload: Payload,
    ) -> Result<(), DispatchError> {
        match self.begin_broadcast(category, message, flags, payload)? {
            Reply::Ready(()) => Ok(()),
            Reply::Pending(done) => done.await.map_err(|_| self.owner_unavailable()),
        }
    }

    /// Ask the first handler registered under `category` to run a dialog.
    ///
    /// Returns `Ok(None)` when nobody is registered. From a worker thread the
    /// call always waits for the owning thread to produce the result.
    ///
    /// # Panics
    ///
    /// From a worker thread this waits with `blocking_recv` and panics if
    /// called from within an asynchronous execution context. Use
    /// [`modal_query_async`](Self::modal_query_async) there.
    pub fn modal_query(&self, category: Category, input: Payload) -> QueryResult {
        match self.begin_query(category, input)? {
            Reply::Ready(result) => result,
            Reply::Pending(reply) => reply.blocking_recv().map_err(|_| self.owner_unavailable())?,
        }
    }

    /// [`modal_query`](Self::modal_query) for callers running inside an async runtime.
    pub async fn modal_query_async(&self, category: Category, input: Payload) -> QueryResult {
        match self.begin_query(category, input)? {
            Reply::Ready(result) => result,
            Reply::Pending(reply) => reply.await.map_err(|_| self.owner_unavailable())?,
        }
    }

    /// Ask the owning event loop to return from [`EventLoop::run`] after the
    /// tasks queued before this call.
    pub fn quit(&self) {
        if self.inner.task_tx.send(Task::Quit).is_err() {
            tracing::debug!("Quit requested but event loop already stopped");
        }
    }

    /// Run tasks already queued for the owning thread.
    ///
    /// Meant for handlers that run their own modal loop on the owning thread
    /// and need queued traffic to keep flowing meanwhile. Does nothing when
    /// called from another thread.
    pub fn process_pending_events(&self) -> u64 {
        if !self.is_owning_thread() {
            tracing::warn!("process_pending_events called off the owning thread, ignoring");
            return 0;
        }
        self.inner.queue.run_pending()
    }

    pub fn is_owning_thread(&self) -> bool {
        thread::current().id() == self.inner.owner
    }

    /// Callback that publishes cancel requests on this hub's channel.
    pub fn cancel_callback(&self) -> CancelCallback {
        CancelCallback::new(self.inner.cancel_tx.clone(), Arc::clone(&self.inner.metrics))
    }

    /// Receive every cancel request published after this call.
    pub fn subscribe_cancel(&self) -> broadcast::Receiver<CancelRequest> {
        self.inner.cancel_tx.subscribe()
    }

    /// Live handlers registered under exactly `category`.
    pub fn handler_count(&self, category: Category) -> usize {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handler_count(category)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .categories()
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.inner.metrics
    }

    fn begin_broadcast(
        &self,
        category: Category,
        message: &str,
        flags: MessageFlags,
        payload: Payload,
    ) -> Result<Reply<()>, DispatchError> {
        let handlers = self
            .inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(category);

        if handlers.iter().all(|h| h.strong_count() == 0) {
            tracing::trace!(category = %category.label(), "No handler for broadcast, dropping");
            return Ok(Reply::Ready(()));
        }

        if self.is_owning_thread() {
            self.inner.metrics.record_broadcast();
            deliver(category, &handlers, message, flags, &payload, &self.inner.metrics);
            return Ok(Reply::Ready(()));
        }

        let metrics = Arc::clone(&self.inner.metrics);
        let message = message.to_string();
        let deliver_all =
            move || deliver(category, &handlers, &message, flags, &payload, &metrics);

        if !flags.is_blocking() {
            self.submit(deliver_all)?;
            self.inner.metrics.record_broadcast();
            return Ok(Reply::Ready(()));
        }

        let (done_tx, done_rx) = oneshot::channel();
        self.submit(move || {
            deliver_all();
            let _ = done_tx.send(());
        })?;
        self.inner.metrics.record_broadcast();
        Ok(Reply::Pending(done_rx))
    }

    fn begin_query(
        &self,
        category: Category,
        input: Payload,
    ) -> Result<Reply<QueryResult>, DispatchError> {
        let first = self
            .inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .first_live(category);

        let Some(handler) = first else {
            tracing::trace!(category = %category.label(), "No handler for modal query");
            return Ok(Reply::Ready(Ok(None)));
        };

        if self.is_owning_thread() {
            self.inner.metrics.record_modal_query();
            return Ok(Reply::Ready(ask(category, &handler, input, &self.inner.metrics)));
        }

        let metrics = Arc::clone(&self.inner.metrics);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(move || {
            let _ = reply_tx.send(ask(category, &handler, input, &metrics));
        })?;
        self.inner.metrics.record_modal_query();
        Ok(Reply::Pending(reply_rx))
    }

    fn submit<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        let task = Task::Run {
            job: Box::new(job),
            span: tracing::Span::current(),
        };

        if self.inner.task_tx.send(task).is_err() {
            return Err(self.owner_unavailable());
        }

        self.inner.metrics.record_task_queued();
        Ok(())
    }

    fn owner_unavailable(&self) -> DispatchError {
        self.inner.metrics.record_owner_unavailable();
        tracing::warn!("Owning event loop is gone, failing cross-thread call");
        DispatchError::OwnerUnavailable
    }
}

impl std::fmt::Debug for NotifyHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyHub")
            .field("owner", &self.inner.owner)
            .field("categories", &self.categories())
            .finish()
    }
}

/// Invoke `show_message` on each live handler, isolating failures.
fn deliver(
    category: Category,
    handlers: &[Weak<dyn Handler>],
    message: &str,
    flags: MessageFlags,
    payload: &Payload,
    metrics: &DispatchMetrics,
) {
    for (index, handler) in handlers.iter().enumerate() {
        let Some(handler) = handler.upgrade() else {
            continue;
        };

        match catch_unwind(AssertUnwindSafe(|| handler.show_message(message, flags, payload))) {
            Ok(Ok(())) => metrics.record_delivery(),
            Ok(Err(e)) => {
                metrics.record_delivery_failure();
                tracing::warn!(
                    category = %category.label(),
                    index,
                    "Handler failed to show message: {}",
                    e
                );
            }
            Err(panic) => {
                metrics.record_delivery_failure();
                metrics.record_handler_panic();
                tracing::error!(
                    category = %category.label(),
                    index,
                    "Handler panicked while showing message: {}",
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}

/// Run `show_dialog` on the handler and turn failures into a caller-facing error.
fn ask(
    category: Category,
    handler: &Weak<dyn Handler>,
    input: Payload,
    metrics: &DispatchMetrics,
) -> QueryResult {
    // Dropped between lookup and execution: same as never registered
    let Some(handler) = handler.upgrade() else {
        return Ok(None);
    };

    match catch_unwind(AssertUnwindSafe(|| handler.show_dialog(input))) {
        Ok(Ok(value)) => Ok(Some(value)),
        Ok(Err(source)) => {
            metrics.record_query_failure();
            tracing::warn!(category = %category.label(), "Dialog handler failed: {}", source);
            Err(DispatchError::HandlerFailed { category, source })
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            metrics.record_query_failure();
            metrics.record_handler_panic();
            tracing::error!(category = %category.label(), "Dialog handler panicked: {}", message);
            Err(DispatchError::HandlerPanicked { category, message })
        }
    }
}
