//! Producer and consumer loops.
//!
//! Termination is data driven: the producer ends its stream with the
//! end-of-stream sentinel and the consumer stops once it dequeues it. Neither
//! side ever waits on the other; the consumer just polls.

use basalt_config::WorkloadConfig;
use basalt_events::{END_OF_STREAM, EventKind, Payload};

use crate::queue::{SharedQueue, saturating_u32};

/// What the producer sends before its sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workload {
    /// `1, 2`, then `101 ..= 100 + capacity - 1`.
    Unit,
    /// A single `1`.
    Empty,
    /// 20 rounds of `1..capacity` then 20 rounds of `1..128`, each round's
    /// values offset by another 100.
    Stress,
    /// `0..n`.
    Count(u32),
}

impl Workload {
    /// The tags sent for a queue of `capacity` slots, sentinel excluded.
    ///
    /// Laps are cut short rather than reach the end-of-stream value.
    pub fn tags(self, capacity: usize) -> Box<dyn Iterator<Item = u32> + Send> {
        let lap = u32::try_from(capacity).unwrap_or(u32::MAX);
        match self {
            Workload::Unit => Box::new((1..3).chain((1..lap_end(100, lap)).map(|i| 100 + i))),
            Workload::Empty => Box::new(std::iter::once(1)),
            Workload::Stress => Box::new(
                (0..20u32)
                    .flat_map(move |round| {
                        let base = round * 100;
                        (1..lap_end(base, lap)).map(move |i| base + i)
                    })
                    .chain((20..40u32).flat_map(|round| (1..128).map(move |i| round * 100 + i))),
            ),
            Workload::Count(n) => Box::new(0..n),
        }
    }
}

/// Exclusive bound on `i` so that `base + i` stays below the sentinel.
fn lap_end(base: u32, lap: u32) -> u32 {
    lap.min(END_OF_STREAM - base)
}

impl From<WorkloadConfig> for Workload {
    fn from(cfg: WorkloadConfig) -> Self {
        match cfg {
            WorkloadConfig::Unit => Workload::Unit,
            WorkloadConfig::Empty => Workload::Empty,
            WorkloadConfig::Stress => Workload::Stress,
            WorkloadConfig::Count { events } => Workload::Count(events),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProducerState {
    Running,
    Finished,
}

pub struct Producer<'q, T: Payload> {
    queue: &'q SharedQueue<T>,
    tags: Box<dyn Iterator<Item = u32> + Send>,
    state: ProducerState,
    sent: u64,
}

impl<'q, T: Payload> Producer<'q, T> {
    pub fn new(queue: &'q SharedQueue<T>, workload: Workload, capacity: usize) -> Self {
        Self {
            queue,
            tags: workload.tags(capacity),
            state: ProducerState::Running,
            sent: 0,
        }
    }

    /// Sends the next value, or the sentinel once the workload is exhausted.
    pub fn step(&mut self) -> ProducerState {
        if self.state == ProducerState::Running {
            match self.tags.next() {
                Some(tag) => {
                    self.queue.enqueue(&T::from_tag(tag));
                    self.sent += 1;
                }
                None => {
                    self.queue.enqueue(&T::sentinel());
                    self.state = ProducerState::Finished;
                }
            }
        }
        self.state
    }

    /// Runs to `Finished`; returns how many non-sentinel values were sent.
    pub fn run(mut self) -> u64 {
        while self.step() == ProducerState::Running {}
        self.sent
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumerState {
    AwaitingFirst,
    Draining,
    Done,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Non-sentinel payloads dequeued.
    pub received: u64,
    /// Polls that found the queue empty.
    pub idle_polls: u64,
    /// Payloads whose contents did not match their tag.
    pub torn: u64,
}

pub struct Consumer<'q, T: Payload, F: FnMut(&T)> {
    queue: &'q SharedQueue<T>,
    state: ConsumerState,
    /// Empty polls since the last flush to the event log.
    idle: u64,
    stats: ConsumerStats,
    backoff: bool,
    on_payload: F,
}

impl<'q, T: Payload> Consumer<'q, T, fn(&T)> {
    pub fn new(queue: &'q SharedQueue<T>) -> Self {
        Self::with_handler(queue, |_| {})
    }
}

impl<'q, T: Payload, F: FnMut(&T)> Consumer<'q, T, F> {
    pub fn with_handler(queue: &'q SharedQueue<T>, on_payload: F) -> Self {
        Self {
            queue,
            state: ConsumerState::AwaitingFirst,
            idle: 0,
            stats: ConsumerStats::default(),
            backoff: false,
            on_payload,
        }
    }

    /// Yield the thread after each empty poll instead of spinning.
    pub fn with_backoff(mut self, backoff: bool) -> Self {
        self.backoff = backoff;
        self
    }

    /// One poll. `Done` is terminal: no further dequeues are attempted.
    pub fn step(&mut self) -> ConsumerState {
        if self.state == ConsumerState::Done {
            return ConsumerState::Done;
        }

        match self.queue.dequeue() {
            None => {
                self.idle += 1;
                self.stats.idle_polls += 1;
                if self.backoff {
                    std::thread::yield_now();
                } else {
                    std::hint::spin_loop();
                }
            }
            Some(value) => {
                // The wait for the very first value is always reported, even if zero.
                if self.state == ConsumerState::AwaitingFirst {
                    self.flush_idle();
                    self.state = ConsumerState::Draining;
                }
                self.accept(value);
            }
        }
        self.state
    }

    /// Polls until the sentinel arrives.
    pub fn run(mut self) -> ConsumerStats {
        while self.step() != ConsumerState::Done {}
        self.stats
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    fn accept(&mut self, value: T) {
        if value.is_sentinel() {
            self.state = ConsumerState::Done;
            self.queue
                .note(EventKind::Ended, saturating_u32(self.stats.received));
            return;
        }
        if self.idle > 0 {
            self.flush_idle();
        }
        if !value.is_intact() {
            self.stats.torn += 1;
        }
        self.stats.received += 1;
        (self.on_payload)(&value);
    }

    fn flush_idle(&mut self) {
        self.queue
            .note(EventKind::ConsumerIdle, saturating_u32(self.idle));
        self.idle = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_evlog::EventLog;
    use basalt_lock::{HangThresholds, LockStrategy};
    use basalt_ring::RingConfig;

    fn queue(capacity: usize, logging: bool) -> SharedQueue<u32> {
        SharedQueue::new(
            RingConfig::for_payload::<u32>(capacity),
            LockStrategy::Spin,
            HangThresholds::default(),
            logging.then(|| EventLog::new(1024).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn workload_shapes() {
        let unit: Vec<u32> = Workload::Unit.tags(4).collect();
        assert_eq!(unit, vec![1, 2, 101, 102, 103]);
        assert_eq!(Workload::Empty.tags(4).collect::<Vec<_>>(), vec![1]);
        assert_eq!(Workload::Count(3).tags(99).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(Workload::Stress.tags(256).count(), 20 * 255 + 20 * 127);
    }

    #[test]
    fn huge_capacity_laps_stop_short_of_the_sentinel() {
        assert_eq!(lap_end(100, 256), 256);
        assert_eq!(lap_end(100, u32::MAX), END_OF_STREAM - 100);
        assert_eq!(lap_end(1900, u32::MAX), END_OF_STREAM - 1900);
        // Largest values a full-width lap could produce.
        assert_eq!(100 + (lap_end(100, u32::MAX) - 1), END_OF_STREAM - 1);
        assert_eq!(1900 + (lap_end(1900, u32::MAX) - 1), END_OF_STREAM - 1);

        let head: Vec<u32> = Workload::Unit.tags(usize::MAX).take(4).collect();
        assert_eq!(head, vec![1, 2, 101, 102]);
        let head: Vec<u32> = Workload::Stress.tags(usize::MAX).take(2).collect();
        assert_eq!(head, vec![1, 2]);
    }

    #[test]
    fn producer_ends_with_sentinel() {
        let q = queue(8, false);
        let mut p = Producer::new(&q, Workload::Count(2), 8);
        assert_eq!(p.step(), ProducerState::Running);
        assert_eq!(p.step(), ProducerState::Running);
        assert_eq!(p.step(), ProducerState::Finished);
        assert_eq!(p.step(), ProducerState::Finished);
        assert_eq!(p.sent(), 2);

        let drained: Vec<u32> = std::iter::from_fn(|| q.dequeue()).collect();
        assert_eq!(drained, vec![0, 1, u32::sentinel()]);
    }

    #[test]
    fn consumer_walks_its_states() {
        let q = queue(8, false);
        let mut seen = Vec::new();
        let mut c = Consumer::with_handler(&q, |v: &u32| seen.push(*v));

        assert_eq!(c.step(), ConsumerState::AwaitingFirst);
        q.enqueue(&5);
        assert_eq!(c.step(), ConsumerState::Draining);
        assert_eq!(c.step(), ConsumerState::Draining);
        q.enqueue(&u32::sentinel());
        assert_eq!(c.step(), ConsumerState::Done);

        let stats = c.stats();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.idle_polls, 2);
        drop(c);
        assert_eq!(seen, vec![5]);
    }

    #[test]
    fn done_consumer_stops_dequeuing() {
        let q = queue(8, false);
        q.enqueue(&u32::sentinel());
        q.enqueue(&9);
        let mut c = Consumer::new(&q);
        assert_eq!(c.step(), ConsumerState::Done);
        assert_eq!(c.step(), ConsumerState::Done);
        // The value behind the sentinel is still queued.
        assert_eq!(q.dequeue(), Some(9));
    }

    #[test]
    fn idle_polls_are_flushed_to_the_log() {
        let q = queue(8, true);
        let mut c = Consumer::new(&q);
        c.step();
        c.step();
        q.enqueue(&1);
        c.step(); // first value: ConsumerIdle(2)
        q.enqueue(&2);
        c.step(); // no idle since: no flush
        c.step(); // empty
        q.enqueue(&u32::sentinel());
        c.step(); // sentinel: Ended(2), idle not flushed
        assert_eq!(c.state(), ConsumerState::Done);

        let log = q.into_event_log().unwrap();
        let roles: Vec<(EventKind, u32)> = std::iter::from_fn(|| log.pop())
            .filter(|r| matches!(r.kind, EventKind::ConsumerIdle | EventKind::Ended))
            .map(|r| (r.kind, r.value))
            .collect();
        assert_eq!(
            roles,
            vec![(EventKind::ConsumerIdle, 2), (EventKind::Ended, 2)]
        );
    }
}
