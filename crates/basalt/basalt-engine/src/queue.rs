//! The overwrite ring behind the run's lock discipline, with event logging.

use basalt_events::{EventKind, Payload};
use basalt_evlog::EventLog;
use basalt_lock::{ContentionMetrics, CriticalSection, Discipline, HangThresholds, LockStrategy, Role};
use basalt_ring::{EnqueueOutcome, OverwriteRing, RingConfig};

use crate::error::EngineError;

/// Counters readable once a run is over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueMetrics {
    pub contention: ContentionMetrics,
    pub high_water_mark: usize,
    pub evicted: u64,
    pub len: usize,
}

/// One producer and one consumer share this queue.
///
/// Enqueue runs as [`Role::Producer`], dequeue as [`Role::Consumer`]. Cursor
/// changes and their event records both happen inside the critical section,
/// so the log sees queue operations in the order they took effect.
pub struct SharedQueue<T: Payload> {
    section: Discipline<OverwriteRing<T>>,
    log: Option<EventLog>,
}

impl<T: Payload> SharedQueue<T> {
    pub fn new(
        ring: RingConfig,
        strategy: LockStrategy,
        thresholds: HangThresholds,
        log: Option<EventLog>,
    ) -> Result<Self, EngineError> {
        let ring = OverwriteRing::new(ring)?;
        Ok(Self {
            section: Discipline::new(strategy, thresholds, ring),
            log,
        })
    }

    /// Always succeeds; a full queue drops its oldest entry.
    #[track_caller]
    pub fn enqueue(&self, value: &T) -> EnqueueOutcome {
        let log = self.log.as_ref();
        self.section.with(Role::Producer, |ring| {
            let outcome = ring.enqueue(value);
            if let Some(log) = log {
                if let Some(mark) = outcome.new_high_water {
                    log.record(EventKind::NewHighWaterMark, saturating_u32(mark as u64));
                }
                log.record(EventKind::Enqueued, value.tag());
            }
            outcome
        })
    }

    /// `None` means the queue was empty, the normal outcome of a poll.
    #[track_caller]
    pub fn dequeue(&self) -> Option<T> {
        let log = self.log.as_ref();
        self.section.with(Role::Consumer, |ring| {
            let value = ring.dequeue()?;
            if let Some(log) = log {
                log.record(EventKind::Dequeued, value.tag());
            }
            Some(value)
        })
    }

    /// Records a role-level event that involves no queue state.
    pub fn note(&self, kind: EventKind, value: u32) {
        if let Some(log) = &self.log {
            log.record(kind, value);
        }
    }

    pub fn event_log(&self) -> Option<&EventLog> {
        self.log.as_ref()
    }

    pub fn strategy(&self) -> LockStrategy {
        self.section.strategy()
    }

    /// Takes the lock as the consumer to read ring counters.
    pub fn metrics(&self) -> QueueMetrics {
        let (high_water_mark, evicted, len) = self.section.with(Role::Consumer, |ring| {
            (ring.high_water_mark(), ring.evicted(), ring.len())
        });
        QueueMetrics {
            contention: self.section.metrics(),
            high_water_mark,
            evicted,
            len,
        }
    }

    pub fn dump(&self, label: &str) -> String {
        self.section.with(Role::Consumer, |ring| ring.dump(label))
    }

    /// Tears the queue down, handing back its event log.
    pub fn into_event_log(self) -> Option<EventLog> {
        self.log
    }
}

#[inline]
pub(crate) fn saturating_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize, strategy: LockStrategy, logging: bool) -> SharedQueue<u32> {
        let log = logging.then(|| EventLog::new(64).unwrap());
        SharedQueue::new(
            RingConfig::for_payload::<u32>(capacity),
            strategy,
            HangThresholds::default(),
            log,
        )
        .unwrap()
    }

    #[test]
    fn overwrite_scenario_under_both_strategies() {
        for strategy in [LockStrategy::Mutex, LockStrategy::Spin] {
            let q = queue(4, strategy, false);
            for v in 1..=5 {
                q.enqueue(&v);
            }
            let m = q.metrics();
            assert_eq!(m.len, 4);
            assert_eq!(m.high_water_mark, 4);
            assert_eq!(m.evicted, 1);
            assert_eq!(q.dequeue(), Some(2));
            assert_eq!(q.strategy(), strategy);
        }
    }

    #[test]
    fn empty_queue_yields_none() {
        let q = queue(2, LockStrategy::Spin, false);
        assert_eq!(q.dequeue(), None);
        assert_eq!(q.metrics().len, 0);
    }

    #[test]
    fn operations_are_logged_in_order() {
        let q = queue(2, LockStrategy::Mutex, true);
        q.enqueue(&10);
        q.enqueue(&11);
        q.enqueue(&12);
        assert_eq!(q.dequeue(), Some(11));

        let log = q.into_event_log().unwrap();
        let got: Vec<(EventKind, u32)> = std::iter::from_fn(|| log.pop())
            .map(|r| (r.kind, r.value))
            .collect();
        assert_eq!(
            got,
            vec![
                (EventKind::NewHighWaterMark, 1),
                (EventKind::Enqueued, 10),
                (EventKind::NewHighWaterMark, 2),
                (EventKind::Enqueued, 11),
                (EventKind::Enqueued, 12),
                (EventKind::Dequeued, 11),
            ]
        );
    }

    #[test]
    fn empty_poll_is_not_logged() {
        let q = queue(2, LockStrategy::Spin, true);
        assert_eq!(q.dequeue(), None);
        assert!(q.event_log().unwrap().is_empty());
    }

    #[test]
    fn dump_shows_live_slots() {
        let q = queue(3, LockStrategy::Spin, false);
        q.enqueue(&4);
        assert_eq!(q.dump("rb"), "rb count=1 enq=1 deq=0\n4 - -");
    }
}
