mod error;
mod queue;
mod roles;
mod session;

pub use error::EngineError;
pub use queue::{QueueMetrics, SharedQueue};
pub use roles::{Consumer, ConsumerState, ConsumerStats, Producer, ProducerState, Workload};
pub use session::{SessionConfig, SessionOutcome, SessionReport, run_configured, run_session};
