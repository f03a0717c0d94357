use crate::config::MonitorConfig;
use crate::notify::Notifier;
use crate::store::SnapshotStore;
use anyhow::anyhow;
use thiserror::Error;
use tracemon_diff::{diff, format_event};
use tracemon_model::{ChangeEvent, TraceSnapshot};
use tracemon_trace::{parse_trace, Prober};
use tracing::{debug, info, warn};

/// A notification that could not be delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyFailure {
    pub hop_number: u32,
    pub message: String,
    pub error: String,
}

/// What happened during one monitoring cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub target: String,
    /// Hops in the snapshot the cycle compared against.
    pub previous_hops: usize,
    /// Set when the stored snapshot could not be read and an empty one was used.
    pub state_load_error: Option<String>,
    pub hops: usize,
    pub skipped_lines: usize,
    pub events: Vec<ChangeEvent>,
    pub notified: usize,
    pub notify_failures: Vec<NotifyFailure>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.state_load_error.is_none() && self.notify_failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CycleError {
    /// Nothing was parsed or persisted; the stored snapshot is untouched.
    #[error("probe failed for {target}: {error:#}")]
    Probe { target: String, error: anyhow::Error },
    /// Notifications went out but the new snapshot was not saved.
    #[error("failed to persist snapshot for {}: {error:#}", .report.target)]
    StoreWrite {
        report: Box<CycleReport>,
        error: anyhow::Error,
    },
}

/// Runs one cycle against `target`: load the previous snapshot, probe, parse,
/// notify once per change, then save the new snapshot.
///
/// An unreadable previous snapshot counts as empty. Failed notifications are
/// recorded and do not stop the remaining ones or the save.
pub fn run_cycle<P, S, N>(
    target: &str,
    prober: &P,
    store: &S,
    notifier: &N,
) -> Result<CycleReport, CycleError>
where
    P: Prober + ?Sized,
    S: SnapshotStore + ?Sized,
    N: Notifier + ?Sized,
{
    let mut report = CycleReport {
        target: target.to_string(),
        ..CycleReport::default()
    };

    let previous = match store.load() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not load previous state, starting empty");
            report.state_load_error = Some(format!("{err:#}"));
            TraceSnapshot::new()
        }
    };
    report.previous_hops = previous.len();

    let raw = prober.run(target).map_err(|error| CycleError::Probe {
        target: target.to_string(),
        error,
    })?;
    if raw.trim().is_empty() {
        return Err(CycleError::Probe {
            target: target.to_string(),
            error: anyhow!("traceroute produced no output"),
        });
    }

    let parsed = parse_trace(&raw);
    for line in &parsed.skipped_lines {
        debug!(line = %line, "skipped line without hop number");
    }
    report.hops = parsed.snapshot.len();
    report.skipped_lines = parsed.skipped_lines.len();

    for event in diff(&previous, &parsed.snapshot) {
        let message = format_event(&event);
        info!(hop = event.hop_number(), "{message}");

        match notifier.send(&message) {
            Ok(()) => report.notified += 1,
            Err(err) => {
                warn!(hop = event.hop_number(), error = %format!("{err:#}"), "notification failed");
                report.notify_failures.push(NotifyFailure {
                    hop_number: event.hop_number(),
                    message,
                    error: format!("{err:#}"),
                });
            }
        }
        report.events.push(event);
    }

    if let Err(error) = store.save(&parsed.snapshot) {
        return Err(CycleError::StoreWrite {
            report: Box::new(report),
            error,
        });
    }

    Ok(report)
}

/// Run coordinator for a single target.
pub struct Monitor<P, S, N> {
    config: MonitorConfig,
    prober: P,
    store: S,
    notifier: N,
}

impl<P: Prober, S: SnapshotStore, N: Notifier> Monitor<P, S, N> {
    pub fn new(config: MonitorConfig, prober: P, store: S, notifier: N) -> Self {
        Self {
            config,
            prober,
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        run_cycle(
            &self.config.target_host,
            &self.prober,
            &self.store,
            &self.notifier,
        )
    }

    /// Runs a cycle and logs the outcome. Errors never escape.
    pub fn run_and_log(&self) {
        match self.run_cycle() {
            Ok(report) => info!(
                target_host = %report.target,
                hops = report.hops,
                changes = report.events.len(),
                notified = report.notified,
                failed = report.notify_failures.len(),
                skipped_lines = report.skipped_lines,
                "cycle complete"
            ),
            Err(err) => warn!(error = %err, "cycle failed"),
        }
    }
}
