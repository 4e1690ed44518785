//! Human-readable uptime since a boot instant, rendered on a fixed period.
//!
//! [`system`] computes and formats the elapsed time, [`app`] drives it from a
//! worker thread into a [`sink::TextSink`].

pub mod app;
pub mod clock;
pub mod logging;
pub mod sink;
pub mod system;
