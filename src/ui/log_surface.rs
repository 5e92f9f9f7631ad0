use crate::dispatch::{CancelCallback, Handler, HandlerError, HandlerSlot};
use crate::models::{Category, MessageFlags, Payload};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Headless surface that renders messages into the log.
///
/// Dialogs are answered from a queue of scripted answers; with the queue
/// empty the dialog counts as cancelled by the user. Every rendered message
/// is kept so callers can inspect what was shown.
#[derive(Debug)]
pub struct LogSurface {
    name: String,
    slot: HandlerSlot,
    answers: Mutex<VecDeque<Payload>>,
    shown: Mutex<Vec<String>>,
}

impl LogSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: HandlerSlot::new(),
            answers: Mutex::new(VecDeque::new()),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue the value the next dialog returns.
    pub fn push_answer(&self, answer: impl Into<Payload>) {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(answer.into());
    }

    /// Messages rendered so far, oldest first.
    pub fn shown(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The user pressed "cancel" on this surface.
    pub fn request_cancel(&self) -> bool {
        tracing::info!(surface = %self.name, "Cancel pressed");
        self.slot.request_cancel()
    }
}

impl Handler for LogSurface {
    fn show_message(
        &self,
        message: &str,
        flags: MessageFlags,
        payload: &Payload,
    ) -> Result<(), HandlerError> {
        if flags.is_error() {
            tracing::error!(surface = %self.name, ?flags, ?payload, "{}", message);
        } else {
            tracing::info!(surface = %self.name, ?flags, ?payload, "{}", message);
        }

        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        Ok(())
    }

    fn show_dialog(&self, input: Payload) -> Result<Payload, HandlerError> {
        let answer = self
            .answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        tracing::info!(surface = %self.name, ?input, ?answer, "Dialog shown");
        answer.ok_or(HandlerError::Cancelled)
    }

    fn category_mask(&self) -> Category {
        self.slot.mask()
    }

    fn set_category_mask(&self, mask: Category) {
        self.slot.set_mask(mask);
    }

    fn set_cancel_callback(&self, callback: CancelCallback) {
        self.slot.set_cancel_callback(callback);
    }
}
