//! Lock disciplines guarding the shared queue.
//!
//! Two interchangeable strategies sit behind [`CriticalSection`]:
//! - [`MutexSection`]: an OS mutex; waiters block.
//! - [`SpinSection`]: a [`SpinLock`] whose atomic holder cell records which
//!   role owns it, so failed attempts are attributed to the holder.
//!
//! [`Discipline`] picks one at startup and keeps it for the life of the run.

mod discipline;
mod metrics;
mod role;
mod section;
mod spin;

pub use discipline::Discipline;
pub use metrics::ContentionMetrics;
pub use role::{LockStrategy, Role};
pub use section::{CriticalSection, MutexSection, SpinSection};
pub use spin::{HangThresholds, SpinLock};
