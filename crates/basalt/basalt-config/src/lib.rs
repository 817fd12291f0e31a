mod config;

pub use config::{BasaltConfig, ConfigError, PayloadKind, WorkloadConfig};
