use crate::models::Category;
use thiserror::Error;

/// Failure reported by a handler's own rendering code
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Dialog cancelled by user")]
    Cancelled,

    #[error("Unsupported dialog input: {0}")]
    UnsupportedInput(String),

    #[error("Handler does not provide dialogs")]
    NoDialog,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a hub operation as seen by the caller
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Handler for {} failed: {source}", .category.label())]
    HandlerFailed {
        category: Category,
        #[source]
        source: HandlerError,
    },

    #[error("Handler for {} panicked: {message}", .category.label())]
    HandlerPanicked { category: Category, message: String },

    #[error("Owning event loop is no longer processing requests")]
    OwnerUnavailable,
}

/// Render a caught panic payload as text
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
