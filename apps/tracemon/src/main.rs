use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracemon_monitor::{
    CancellationToken, JsonFileStore, LogNotifier, Monitor, MonitorConfig, Notifier,
    PeriodicRunner, WebhookNotifier,
};
use tracemon_trace::{SystemTracerouteProber, TraceSettings};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tracemon",
    version,
    about = "Watch the route to a host and report hop changes. Only target networks you own or have permission to test."
)]
struct Cli {
    /// Host to traceroute
    #[arg(long = "target", env = "TRACEMON_TARGET", default_value = "1.1.1.1")]
    target_host: String,

    /// Webhook URL for notifications; log only when unset
    #[arg(long = "webhook-url", env = "TRACEMON_WEBHOOK_URL")]
    notification_endpoint: Option<String>,

    /// File holding the last observed hops
    #[arg(
        long = "state-file",
        env = "TRACEMON_STATE_FILE",
        default_value = "traceroute_log.json"
    )]
    state_file_path: PathBuf,

    /// Reserved high-ping ratio; not used by change detection
    #[arg(long, env = "TRACEMON_HIGH_PING_RATIO", default_value_t = 0.20)]
    high_ping_ratio: f64,

    /// Seconds to wait between cycles
    #[arg(long = "interval", env = "TRACEMON_INTERVAL_SECS", default_value_t = 43_200)]
    interval_secs: u64,

    #[arg(long, default_value_t = 30)]
    max_hops: u32,

    #[arg(long, default_value_t = 3)]
    probes: u32,

    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Seconds before a webhook request is abandoned
    #[arg(long, default_value_t = 10)]
    webhook_timeout_secs: u64,

    /// Wrap webhook messages in a fenced code block
    #[arg(long)]
    code_block: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn config(&self) -> MonitorConfig {
        MonitorConfig {
            target_host: self.target_host.clone(),
            notification_endpoint: self.notification_endpoint.clone(),
            state_file_path: self.state_file_path.clone(),
            high_ping_threshold_ratio: self.high_ping_ratio,
            check_interval: Duration::from_secs(self.interval_secs),
            code_block: self.code_block,
            webhook_timeout: Duration::from_secs(self.webhook_timeout_secs),
            trace: TraceSettings {
                max_hops: self.max_hops,
                probes: self.probes,
                timeout_ms: self.timeout_ms,
            },
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = cli.config();
    config.validate()?;

    let notifier: Box<dyn Notifier> = match &config.notification_endpoint {
        Some(url) => Box::new(
            WebhookNotifier::new(url.clone(), config.webhook_timeout)?
                .with_code_block(config.code_block),
        ),
        None => {
            warn!("no webhook configured, notifications will only be logged");
            Box::new(LogNotifier)
        }
    };
    let prober = SystemTracerouteProber::new(config.trace.clone());
    let store = JsonFileStore::new(config.state_file_path.clone());
    let interval = config.check_interval;

    info!(
        target_host = %config.target_host,
        state_file = ?config.state_file_path,
        interval_secs = interval.as_secs(),
        "starting route monitor"
    );
    let monitor = Monitor::new(config, prober, store, notifier);

    if cli.once {
        let report = monitor.run_cycle().context("monitoring cycle failed")?;
        info!(
            changes = report.events.len(),
            notified = report.notified,
            "cycle complete"
        );
        return Ok(());
    }

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install Ctrl-C handler")?;

    let cycles = PeriodicRunner::new(interval).run(&token, || monitor.run_and_log());
    info!(cycles, "stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tracemon=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        eprintln!("failed to initialise logging: {err}");
    }
}
