//! Role-tagged spinlock with a hang detector.
//!
//! # Protocol
//!
//! **Acquire (role R):**
//! 1. CAS the holder cell from `FREE` to `R`
//! 2. On failure, charge the attempt to the role found in the cell and retry
//! 3. Past `warn_after` failed attempts, warn once that the lock may be hung
//! 4. Past `abort_after` failed attempts, log the call site and abort the process
//!
//! **Release:** store `FREE`. Only the holder ever releases, so no check is made.
//!
//! The abort is a last-resort livelock guard. A lock that is legitimately held
//! for that long means the lock is being misused, and carrying on would hide it.

use serde::Deserialize;
use std::panic::Location;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::metrics::{Contention, ContentionMetrics};
use crate::role::{FREE, Role};

/// Failed attempts between cooperative yields while spinning.
const YIELD_EVERY: u64 = 64;

/// Failed-attempt limits for a single acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct HangThresholds {
    #[serde(default = "defaults::warn_after")]
    pub warn_after: u64,
    #[serde(default = "defaults::abort_after")]
    pub abort_after: u64,
}

mod defaults {
    pub fn warn_after() -> u64 {
        50_000
    }

    pub fn abort_after() -> u64 {
        100_000
    }
}

impl Default for HangThresholds {
    fn default() -> Self {
        Self {
            warn_after: defaults::warn_after(),
            abort_after: defaults::abort_after(),
        }
    }
}

pub struct SpinLock {
    holder: AtomicU8,
    contention: Contention,
    thresholds: HangThresholds,
}

impl SpinLock {
    pub fn new(thresholds: HangThresholds) -> Self {
        Self {
            holder: AtomicU8::new(FREE),
            contention: Contention::default(),
            thresholds,
        }
    }

    /// Spins until `role` owns the lock.
    ///
    /// # Aborts
    /// Aborts the process after `abort_after` consecutive failed attempts,
    /// naming the caller's source location.
    #[track_caller]
    #[inline]
    pub fn acquire(&self, role: Role) {
        let want = role.tag();
        let mut attempts: u64 = 0;
        loop {
            match self
                .holder
                .compare_exchange_weak(FREE, want, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => {
                    if attempts > 0 {
                        self.contention.note_spin(attempts);
                    }
                    return;
                }
                Err(current) => {
                    // `current` is FREE on a spurious failure; that costs an attempt
                    // but is charged to nobody.
                    self.contention.note(current);
                    attempts += 1;
                    if attempts == self.thresholds.warn_after {
                        tracing::warn!(?role, attempts, site = %Location::caller(), "lock may be hung");
                    }
                    if attempts > self.thresholds.abort_after {
                        hung(role, attempts, Location::caller());
                    }
                    if attempts % YIELD_EVERY == 0 {
                        std::thread::yield_now();
                    } else {
                        std::hint::spin_loop();
                    }
                }
            }
        }
    }

    /// One CAS attempt; no contention accounting.
    #[inline]
    pub fn try_acquire(&self, role: Role) -> bool {
        self.holder
            .compare_exchange(FREE, role.tag(), Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub fn release(&self) {
        self.holder.store(FREE, Ordering::Release);
    }

    /// Current owner, for diagnostics only.
    pub fn holder(&self) -> Option<Role> {
        Role::from_tag(self.holder.load(Ordering::Relaxed))
    }

    pub fn metrics(&self) -> ContentionMetrics {
        self.contention.snapshot()
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new(HangThresholds::default())
    }
}

#[cold]
#[inline(never)]
fn hung(role: Role, attempts: u64, site: &Location<'_>) -> ! {
    tracing::error!(?role, attempts, %site, "spinlock probably deadlocked, aborting");
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn uncontended_acquire_and_release() {
        let lock = SpinLock::default();
        lock.acquire(Role::Producer);
        assert_eq!(lock.holder(), Some(Role::Producer));
        assert!(!lock.try_acquire(Role::Consumer));
        lock.release();
        assert_eq!(lock.holder(), None);
        assert_eq!(lock.metrics(), ContentionMetrics::default());
    }

    #[test]
    fn failed_attempts_are_charged_to_the_holder() {
        let lock = Arc::new(SpinLock::default());
        lock.acquire(Role::Producer);

        let waiter = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                lock.acquire(Role::Consumer);
                lock.release();
            })
        };

        // Give the consumer time to fail at least once against the producer.
        while lock.metrics().held_by_producer == 0 {
            thread::sleep(Duration::from_micros(50));
        }
        lock.release();
        waiter.join().unwrap();

        let m = lock.metrics();
        assert!(m.held_by_producer > 0);
        assert_eq!(m.held_by_consumer, 0);
        assert!(m.longest_spin > 0);
    }

    #[test]
    fn default_abort_is_roughly_double_warn() {
        let t = HangThresholds::default();
        assert_eq!(t.abort_after, 2 * t.warn_after);
    }
}
