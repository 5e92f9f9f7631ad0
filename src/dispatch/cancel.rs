// Cancellation channel
//
// Relays "abandon category-scoped work" requests from handlers to whichever
// subsystems subscribed. The hub tracks no in-flight work itself.

use super::handler::Handler;
use crate::metrics::DispatchMetrics;
use crate::models::Category;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A request to abandon work belonging to any of `categories`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelRequest {
    pub categories: Category,
}

impl CancelRequest {
    /// Whether work running under `category` should observe this request.
    pub fn affects(&self, category: Category) -> bool {
        self.categories.intersects(category)
    }
}

/// Callback handed to every handler at registration.
///
/// Calling [`request`](Self::request) publishes a [`CancelRequest`] for the
/// handler's recorded category mask. Cloneable and usable from any thread.
#[derive(Clone)]
pub struct CancelCallback {
    tx: broadcast::Sender<CancelRequest>,
    metrics: Arc<DispatchMetrics>,
}

impl CancelCallback {
    pub(crate) fn new(tx: broadcast::Sender<CancelRequest>, metrics: Arc<DispatchMetrics>) -> Self {
        Self { tx, metrics }
    }

    /// Publish a cancel request for every category `handler` is registered under.
    ///
    /// Returns the number of subscribers that received it.
    pub fn request(&self, handler: &dyn Handler) -> usize {
        self.request_for(handler.category_mask())
    }

    /// Publish a cancel request for an explicit category mask.
    pub fn request_for(&self, categories: Category) -> usize {
        self.metrics.record_cancel_request();

        // No subscribers is fine: nobody has work to abandon
        let receivers = self.tx.send(CancelRequest { categories }).unwrap_or(0);

        tracing::debug!(
            categories = %categories.label(),
            receivers,
            "Cancel requested"
        );

        receivers
    }

    /// Subscribe to future cancel requests.
    pub fn subscribe(&self) -> broadcast::Receiver<CancelRequest> {
        self.tx.subscribe()
    }
}

impl std::fmt::Debug for CancelCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelCallback")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
