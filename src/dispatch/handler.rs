use super::cancel::CancelCallback;
use super::error::HandlerError;
use crate::models::{Category, MessageFlags, Payload};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

/// A UI surface's ability to render hub traffic.
///
/// Handlers are registered from any thread but the hub only ever calls
/// [`show_message`](Self::show_message) and [`show_dialog`](Self::show_dialog)
/// on the owning thread. Both may re-enter the hub.
///
/// The mask and cancel callback accessors exist so the hub can record what a
/// handler subscribed to; most implementations delegate them to an embedded
/// [`HandlerSlot`].
#[cfg_attr(test, mockall::automock)]
pub trait Handler: Send + Sync {
    /// Render a short message. Failures are logged by the hub and never
    /// reach the broadcaster.
    fn show_message(
        &self,
        message: &str,
        flags: MessageFlags,
        payload: &Payload,
    ) -> Result<(), HandlerError>;

    /// Run a modal dialog and return what the user entered.
    fn show_dialog(&self, input: Payload) -> Result<Payload, HandlerError> {
        let _ = input;
        Err(HandlerError::NoDialog)
    }

    /// Union of every category this handler was registered under
    fn category_mask(&self) -> Category;

    fn set_category_mask(&self, mask: Category);

    fn set_cancel_callback(&self, callback: CancelCallback);
}

/// Registration state a handler stores on behalf of the hub.
#[derive(Debug, Default)]
pub struct HandlerSlot {
    mask: AtomicU32,
    cancel: RwLock<Option<CancelCallback>>,
}

impl HandlerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mask(&self) -> Category {
        Category::from_bits_retain(self.mask.load(Ordering::Acquire))
    }

    pub fn set_mask(&self, mask: Category) {
        self.mask.store(mask.bits(), Ordering::Release);
    }

    pub fn set_cancel_callback(&self, callback: CancelCallback) {
        *self.cancel.write().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    pub fn cancel_callback(&self) -> Option<CancelCallback> {
        self.cancel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ask the hub to cancel work for this slot's categories.
    ///
    /// Returns `false` if the handler was never registered.
    pub fn request_cancel(&self) -> bool {
        match self.cancel_callback() {
            Some(callback) => {
                callback.request_for(self.mask());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DispatchMetrics;
    use std::sync::Arc;
    use tokio::sync::broadcast;

    #[test]
    fn test_slot_starts_unregistered() {
        let slot = HandlerSlot::new();
        assert_eq!(slot.mask(), Category::empty());
        assert!(slot.cancel_callback().is_none());
        assert!(!slot.request_cancel());
    }

    #[test]
    fn test_slot_request_cancel() {
        let (tx, mut rx) = broadcast::channel(4);
        let slot = HandlerSlot::new();
        slot.set_mask(Category::DANMU_POOL);
        slot.set_cancel_callback(CancelCallback::new(tx, Arc::new(DispatchMetrics::new())));

        assert!(slot.request_cancel());
        assert_eq!(rx.try_recv().unwrap().categories, Category::DANMU_POOL);
    }

    #[test]
    fn test_default_dialog_is_unsupported() {
        struct MessageOnly;

        impl Handler for MessageOnly {
            fn show_message(
                &self,
                _message: &str,
                _flags: MessageFlags,
                _payload: &Payload,
            ) -> Result<(), HandlerError> {
                Ok(())
            }

            fn category_mask(&self) -> Category {
                Category::empty()
            }

            fn set_category_mask(&self, _mask: Category) {}

            fn set_cancel_callback(&self, _callback: CancelCallback) {}
        }

        let result = MessageOnly.show_dialog(Payload::from(1));
        assert!(matches!(result, Err(HandlerError::NoDialog)));
    }
}
