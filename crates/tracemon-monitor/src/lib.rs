//! Monitoring cycle: probe, parse, compare, notify, persist.

pub mod config;
pub mod monitor;
pub mod notify;
pub mod schedule;
pub mod store;

pub use config::MonitorConfig;
pub use monitor::{run_cycle, CycleError, CycleReport, Monitor, NotifyFailure};
pub use notify::{LogNotifier, Notifier, WebhookNotifier};
pub use schedule::{CancellationToken, PeriodicRunner};
pub use store::{JsonFileStore, SnapshotStore};
