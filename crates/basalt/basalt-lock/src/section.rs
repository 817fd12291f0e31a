use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError, TryLockError};

use crate::metrics::{Contention, ContentionMetrics};
use crate::role::{FREE, Role};
use crate::spin::{HangThresholds, SpinLock};

/// Exclusive access to a `T` for the duration of a closure.
///
/// Queue code is written once against this trait; the strategy underneath is
/// chosen at construction.
pub trait CriticalSection<T> {
    /// Runs `f` with exclusive access, on behalf of `role`.
    fn with<R>(&self, role: Role, f: impl FnOnce(&mut T) -> R) -> R;

    fn metrics(&self) -> ContentionMetrics;
}

/// Blocking strategy backed by `std::sync::Mutex`.
///
/// A failed `try_lock` is charged to the role recorded in `holder` before
/// falling back to a blocking lock. The tag is set just after the lock is
/// taken and cleared just before it is released, so an attempt that fails in
/// either handover window finds `FREE` and goes uncounted: the counts are a
/// lower bound.
pub struct MutexSection<T> {
    inner: Mutex<T>,
    holder: AtomicU8,
    contention: Contention,
}

impl<T> MutexSection<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
            holder: AtomicU8::new(FREE),
            contention: Contention::default(),
        }
    }
}

impl<T> CriticalSection<T> for MutexSection<T> {
    fn with<R>(&self, role: Role, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                self.contention.note(self.holder.load(Ordering::Relaxed));
                self.inner.lock().unwrap_or_else(PoisonError::into_inner)
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        self.holder.store(role.tag(), Ordering::Relaxed);
        // Declared after `guard`, so the tag is cleared before the unlock, unwinding included.
        let _tag = HolderTag {
            holder: &self.holder,
        };
        f(&mut guard)
    }

    fn metrics(&self) -> ContentionMetrics {
        self.contention.snapshot()
    }
}

struct HolderTag<'a> {
    holder: &'a AtomicU8,
}

impl Drop for HolderTag<'_> {
    fn drop(&mut self) {
        self.holder.store(FREE, Ordering::Relaxed);
    }
}

/// Busy-waiting strategy backed by [`SpinLock`].
pub struct SpinSection<T> {
    lock: SpinLock,
    data: UnsafeCell<T>,
}

// SAFETY: `data` is only reached through `with`, which holds the spinlock for
// the whole borrow, so at most one thread touches it at a time.
unsafe impl<T: Send> Sync for SpinSection<T> {}

impl<T> SpinSection<T> {
    pub fn new(value: T, thresholds: HangThresholds) -> Self {
        Self {
            lock: SpinLock::new(thresholds),
            data: UnsafeCell::new(value),
        }
    }

    pub fn lock(&self) -> &SpinLock {
        &self.lock
    }
}

/// Releases the spinlock even if the closure unwinds.
struct SpinGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

impl<T> CriticalSection<T> for SpinSection<T> {
    #[track_caller]
    fn with<R>(&self, role: Role, f: impl FnOnce(&mut T) -> R) -> R {
        self.lock.acquire(role);
        let _guard = SpinGuard { lock: &self.lock };
        // SAFETY: we hold the lock until `_guard` drops after `f` returns.
        f(unsafe { &mut *self.data.get() })
    }

    fn metrics(&self) -> ContentionMetrics {
        self.lock.metrics()
    }
}
