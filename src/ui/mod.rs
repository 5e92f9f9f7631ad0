// UI module - surfaces that render hub traffic
//
// Real widgets live outside this crate. This module holds the surface the
// binary registers so traffic is visible in the log without a window system.

pub mod log_surface;

pub use log_surface::LogSurface;
