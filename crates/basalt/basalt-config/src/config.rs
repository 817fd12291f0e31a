use basalt_events::END_OF_STREAM;
use basalt_lock::{HangThresholds, LockStrategy};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct BasaltConfig {
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub payload: PayloadKind,
    #[serde(default)]
    pub lock: LockStrategy,
    #[serde(default)]
    pub logging: bool,
    #[serde(default = "defaults::event_log_capacity")]
    pub event_log_capacity: usize,
    /// Append the event log here instead of printing it to stdout.
    #[serde(default)]
    pub event_log_file: Option<String>,
    /// Yield the consumer thread between empty polls.
    #[serde(default)]
    pub consumer_backoff: bool,
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub spin: HangThresholds,
}

/// Which payload type fills the queue slots.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// A bare `u32`.
    Word,
    /// A 40-byte checksummed record.
    #[default]
    Sample,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum WorkloadConfig {
    /// A few values, then one lap of the ring.
    Unit,
    /// One value, then the sentinel.
    Empty,
    /// Fixed rounds of full and partial laps.
    Stress,
    /// `events` consecutive values.
    Count {
        #[serde(default = "defaults::events")]
        events: u32,
    },
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig::Count {
            events: defaults::events(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

mod defaults {
    pub fn log_level() -> String {
        "info".into()
    }

    pub fn capacity() -> usize {
        256
    }

    pub fn event_log_capacity() -> usize {
        10_000
    }

    pub fn events() -> u32 {
        10_000
    }
}

impl Default for BasaltConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level(),
            capacity: defaults::capacity(),
            payload: PayloadKind::default(),
            lock: LockStrategy::default(),
            logging: false,
            event_log_capacity: defaults::event_log_capacity(),
            event_log_file: None,
            consumer_backoff: false,
            workload: WorkloadConfig::default(),
            spin: HangThresholds::default(),
        }
    }
}

impl BasaltConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&toml_to_str)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: BasaltConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1".into()));
        }
        if self.event_log_capacity == 0 {
            return Err(ConfigError::Invalid(
                "event_log_capacity must be at least 1".into(),
            ));
        }
        if self.spin.abort_after <= self.spin.warn_after {
            return Err(ConfigError::Invalid(format!(
                "spin.abort_after ({}) must exceed spin.warn_after ({})",
                self.spin.abort_after, self.spin.warn_after
            )));
        }
        if let WorkloadConfig::Count { events } = self.workload {
            // Producer values run 0..events and must stay clear of the sentinel.
            if events > END_OF_STREAM {
                return Err(ConfigError::Invalid(format!(
                    "workload.events ({events}) would reach the end-of-stream value"
                )));
            }
        }
        Ok(())
    }
}
