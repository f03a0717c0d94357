use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracemon_trace::TraceSettings;

/// Settings for one monitored target.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub target_host: String,
    /// Webhook URL. Notifications are only logged when unset.
    pub notification_endpoint: Option<String>,
    pub state_file_path: PathBuf,
    /// Reserved; change detection does not consult it.
    pub high_ping_threshold_ratio: f64,
    pub check_interval: Duration,
    /// Wrap webhook messages in a fenced code block.
    pub code_block: bool,
    pub webhook_timeout: Duration,
    pub trace: TraceSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_host: "1.1.1.1".to_string(),
            notification_endpoint: None,
            state_file_path: PathBuf::from("traceroute_log.json"),
            high_ping_threshold_ratio: 0.20,
            check_interval: Duration::from_secs(43_200),
            code_block: false,
            webhook_timeout: Duration::from_secs(10),
            trace: TraceSettings::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_host.trim().is_empty() {
            bail!("target host must not be empty");
        }
        if self.check_interval < Duration::from_secs(1) {
            bail!("check interval must be at least one second");
        }
        if !self.high_ping_threshold_ratio.is_finite() || self.high_ping_threshold_ratio < 0.0 {
            bail!(
                "high ping threshold ratio must be a non-negative number, got {}",
                self.high_ping_threshold_ratio
            );
        }
        if matches!(&self.notification_endpoint, Some(url) if url.trim().is_empty()) {
            bail!("notification endpoint must not be blank");
        }
        if self.trace.probes == 0 || self.trace.max_hops == 0 {
            bail!("traceroute needs at least one probe and one hop");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MonitorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.check_interval, Duration::from_secs(43_200));
        assert_eq!(config.state_file_path, PathBuf::from("traceroute_log.json"));
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            MonitorConfig {
                target_host: " ".to_string(),
                ..MonitorConfig::default()
            },
            MonitorConfig {
                check_interval: Duration::from_millis(500),
                ..MonitorConfig::default()
            },
            MonitorConfig {
                high_ping_threshold_ratio: -0.1,
                ..MonitorConfig::default()
            },
            MonitorConfig {
                high_ping_threshold_ratio: f64::NAN,
                ..MonitorConfig::default()
            },
            MonitorConfig {
                notification_endpoint: Some(String::new()),
                ..MonitorConfig::default()
            },
        ];

        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }
}
