use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct TraceSettings {
    pub max_hops: u32,
    pub probes: u32,
    pub timeout_ms: u64,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            max_hops: 30,
            probes: 3,
            timeout_ms: 2000,
        }
    }
}

/// Source of raw traceroute text for a target.
pub trait Prober {
    fn run(&self, target: &str) -> Result<String>;
}

impl<P: Prober + ?Sized> Prober for Box<P> {
    fn run(&self, target: &str) -> Result<String> {
        (**self).run(target)
    }
}

/// Runs the system `traceroute` binary in numeric mode.
#[derive(Debug, Clone, Default)]
pub struct SystemTracerouteProber {
    settings: TraceSettings,
}

impl SystemTracerouteProber {
    pub fn new(settings: TraceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TraceSettings {
        &self.settings
    }
}

impl Prober for SystemTracerouteProber {
    fn run(&self, target: &str) -> Result<String> {
        run_traceroute(target, &self.settings)
    }
}

impl TraceSettings {
    /// Per-probe wait in whole seconds, as `traceroute -w` expects.
    pub fn wait_secs(&self) -> u64 {
        self.timeout_ms.div_ceil(1000).max(1)
    }

    /// Numeric-mode arguments for probing `target`.
    pub fn traceroute_args(&self, target: &str) -> Vec<String> {
        vec![
            "-n".to_string(),
            "-q".to_string(),
            self.probes.to_string(),
            "-m".to_string(),
            self.max_hops.to_string(),
            "-w".to_string(),
            self.wait_secs().to_string(),
            target.to_string(),
        ]
    }
}

/// Runs `traceroute` once and returns its stdout. A non-zero exit or blank
/// output is an error.
pub fn run_traceroute(target: &str, settings: &TraceSettings) -> Result<String> {
    let output = Command::new("traceroute")
        .args(settings.traceroute_args(target))
        .output()
        .with_context(|| format!("could not start traceroute toward {target}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "traceroute toward {target} exited with {}: {}",
            output.status,
            stderr.trim()
        );
    }

    debug!(target_host = target, raw = %stdout, "traceroute output");
    if stdout.trim().is_empty() {
        bail!("traceroute toward {target} printed nothing");
    }

    Ok(stdout)
}
