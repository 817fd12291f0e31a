use std::sync::atomic::{AtomicU64, Ordering};

use crate::role::Role;

/// Contention counters, readable after (or during) a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentionMetrics {
    /// Failed acquire attempts that found the producer holding the lock.
    pub held_by_producer: u64,
    /// Failed acquire attempts that found the consumer holding the lock.
    pub held_by_consumer: u64,
    /// Most failed attempts any single acquisition needed (spin strategy only).
    pub longest_spin: u64,
}

#[derive(Default)]
pub(crate) struct Contention {
    producer: AtomicU64,
    consumer: AtomicU64,
    longest_spin: AtomicU64,
}

impl Contention {
    /// Charge one failed attempt to whoever `holder` names. Free/unknown is ignored.
    #[inline(always)]
    pub(crate) fn note(&self, holder: u8) {
        match Role::from_tag(holder) {
            Some(Role::Producer) => {
                self.producer.fetch_add(1, Ordering::Relaxed);
            }
            Some(Role::Consumer) => {
                self.consumer.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }
    }

    #[inline(always)]
    pub(crate) fn note_spin(&self, attempts: u64) {
        self.longest_spin.fetch_max(attempts, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ContentionMetrics {
        ContentionMetrics {
            held_by_producer: self.producer.load(Ordering::Relaxed),
            held_by_consumer: self.consumer.load(Ordering::Relaxed),
            longest_spin: self.longest_spin.load(Ordering::Relaxed),
        }
    }
}
