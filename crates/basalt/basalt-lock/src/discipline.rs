use crate::metrics::ContentionMetrics;
use crate::role::{LockStrategy, Role};
use crate::section::{CriticalSection, MutexSection, SpinSection};
use crate::spin::HangThresholds;

/// The strategy picked for a run, dispatched by `match`.
pub enum Discipline<T> {
    Mutex(MutexSection<T>),
    Spin(SpinSection<T>),
}

impl<T> Discipline<T> {
    pub fn new(strategy: LockStrategy, thresholds: HangThresholds, value: T) -> Self {
        match strategy {
            LockStrategy::Mutex => Discipline::Mutex(MutexSection::new(value)),
            LockStrategy::Spin => Discipline::Spin(SpinSection::new(value, thresholds)),
        }
    }

    pub fn strategy(&self) -> LockStrategy {
        match self {
            Discipline::Mutex(_) => LockStrategy::Mutex,
            Discipline::Spin(_) => LockStrategy::Spin,
        }
    }
}

impl<T> CriticalSection<T> for Discipline<T> {
    #[track_caller]
    #[inline]
    fn with<R>(&self, role: Role, f: impl FnOnce(&mut T) -> R) -> R {
        match self {
            Discipline::Mutex(s) => s.with(role, f),
            Discipline::Spin(s) => s.with(role, f),
        }
    }

    fn metrics(&self) -> ContentionMetrics {
        match self {
            Discipline::Mutex(s) => s.metrics(),
            Discipline::Spin(s) => s.metrics(),
        }
    }
}
