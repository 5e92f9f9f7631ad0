// notify-hub - Cross-thread notification and modal-query dispatch hub
//
// This is the library crate containing the hub, its data models and the
// ambient setup (logging, configuration, metrics).
// The binary crate (main.rs) wires them together on a demo surface.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use dispatch::{
    CancelCallback, CancelRequest, DispatchError, EventLoop, Handler, HandlerError, HandlerSlot,
    NotifyHub,
};
pub use metrics::DispatchMetrics;
pub use models::{Category, HubConfig, HubSettings, MessageFlags, Payload};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
