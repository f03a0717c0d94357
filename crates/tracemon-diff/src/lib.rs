//! Snapshot comparison and change messages.

pub mod diff;
pub mod message;

pub use diff::{diff, Changes};
pub use message::{format_event, format_latency};
