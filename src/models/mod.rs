//! Data models shared by the hub and its collaborators.
//!
//! - [`Category`]: notification channel mask handlers subscribe under
//! - [`MessageFlags`]: per-message presentation and delivery flags
//! - [`Payload`]: tagged value carried by broadcasts and modal queries
//! - [`HubConfig`]: settings loaded from `Notify Hub.yaml`
//!
//! None of these types know about threads; the [`dispatch`](crate::dispatch)
//! module moves them between the caller and the owning thread.

pub mod category;
pub mod config;
pub mod flags;
pub mod payload;

pub use category::Category;
pub use config::{HubConfig, HubSettings};
pub use flags::MessageFlags;
pub use payload::Payload;
