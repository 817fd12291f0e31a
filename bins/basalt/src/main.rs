use anyhow::Context;
use basalt_config::BasaltConfig;
use basalt_engine::run_configured;
use basalt_evlog::{EventLog, EventLogError};
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_CONFIG: &str = "basalt.toml";

fn load_config() -> anyhow::Result<BasaltConfig> {
    match std::env::args().nth(1) {
        Some(path) => BasaltConfig::load(path.clone())
            .with_context(|| format!("loading config from {path}")),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            BasaltConfig::load(DEFAULT_CONFIG).context("loading basalt.toml")
        }
        None => Ok(BasaltConfig::default()),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_thread_names(true))
        .with(filter)
        .init();
}

fn write_event_log(log: &EventLog, file: Option<&str>) -> anyhow::Result<()> {
    let dropped = log.dropped();
    if dropped > 0 {
        tracing::warn!(dropped, "event log overflowed, oldest records lost");
    }
    match file {
        Some(path) => {
            // A missing sink loses the log, not the run; open failures are logged by the log.
            match log.drain_to_file(path) {
                Ok(n) => tracing::info!(path, records = n, "event log appended"),
                Err(EventLogError::Open { .. }) => {}
                Err(e) => tracing::error!(path, error = %e, "event log write failed"),
            }
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            log.drain_and_render(&mut out)
                .context("writing event log to stdout")?;
            out.flush()?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cfg = load_config()?;
    init_tracing(&cfg.log_level);
    tracing::debug!(?cfg, "config loaded");

    let outcome = run_configured(&cfg).context("running session")?;
    println!("{}", outcome.report);

    if let Some(log) = outcome.event_log {
        write_event_log(&log, cfg.event_log_file.as_deref())?;
    }
    Ok(())
}
