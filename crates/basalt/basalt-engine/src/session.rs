use basalt_clock::{Stopwatch, Timestamp};
use basalt_config::{BasaltConfig, PayloadKind};
use basalt_events::{Payload, Sample};
use basalt_evlog::EventLog;
use basalt_lock::{HangThresholds, LockStrategy, Role};
use basalt_ring::RingConfig;
use std::fmt;
use std::mem::size_of;
use std::thread;

use crate::error::EngineError;
use crate::queue::{QueueMetrics, SharedQueue};
use crate::roles::{Consumer, ConsumerStats, Producer, Workload};

/// Parameters for one producer/consumer run.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub capacity: usize,
    pub strategy: LockStrategy,
    pub thresholds: HangThresholds,
    pub logging: bool,
    pub event_log_capacity: usize,
    pub workload: Workload,
    pub consumer_backoff: bool,
}

impl From<&BasaltConfig> for SessionConfig {
    fn from(cfg: &BasaltConfig) -> Self {
        Self {
            capacity: cfg.capacity,
            strategy: cfg.lock,
            thresholds: cfg.spin,
            logging: cfg.logging,
            event_log_capacity: cfg.event_log_capacity,
            workload: cfg.workload.into(),
            consumer_backoff: cfg.consumer_backoff,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SessionReport {
    pub strategy: LockStrategy,
    pub capacity: usize,
    pub payload_size: usize,
    /// Non-sentinel values the producer enqueued.
    pub sent: u64,
    pub consumer: ConsumerStats,
    pub queue: QueueMetrics,
    /// From spawning the roles to joining both.
    pub elapsed: Timestamp,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "strategy={:?} capacity={} payload_size={}",
            self.strategy, self.capacity, self.payload_size
        )?;
        writeln!(f, "elapsed from spawn to join: delta={}", self.elapsed)?;
        writeln!(
            f,
            "sent={} received={} evicted={} torn={} idle_polls={} high_water_mark={}",
            self.sent,
            self.consumer.received,
            self.queue.evicted,
            self.consumer.torn,
            self.consumer.idle_polls,
            self.queue.high_water_mark
        )?;
        write!(
            f,
            "consumer contention lock_held_c={} producer contention lock_held_p={} longest_spin={}",
            self.queue.contention.held_by_consumer,
            self.queue.contention.held_by_producer,
            self.queue.contention.longest_spin
        )
    }
}

pub struct SessionOutcome {
    pub report: SessionReport,
    /// Present when logging was enabled; still holds every recorded event.
    pub event_log: Option<EventLog>,
}

/// Runs one producer thread and one consumer thread over a fresh queue of `T`.
pub fn run_session<T: Payload>(cfg: &SessionConfig) -> Result<SessionOutcome, EngineError> {
    let log = if cfg.logging {
        Some(EventLog::new(cfg.event_log_capacity)?)
    } else {
        None
    };
    let queue = SharedQueue::<T>::new(
        RingConfig::for_payload::<T>(cfg.capacity),
        cfg.strategy,
        cfg.thresholds,
        log,
    )?;

    tracing::info!(
        strategy = ?cfg.strategy,
        capacity = cfg.capacity,
        payload_size = size_of::<T>(),
        workload = ?cfg.workload,
        logging = cfg.logging,
        "starting session"
    );

    let mut watch = Stopwatch::start();
    let (sent, consumer) = thread::scope(|s| {
        let producer = s.spawn(|| Producer::new(&queue, cfg.workload, cfg.capacity).run());
        let consumer = s.spawn(|| {
            Consumer::new(&queue)
                .with_backoff(cfg.consumer_backoff)
                .run()
        });

        let sent = match producer.join() {
            Ok(sent) => sent,
            Err(_) => {
                // Unblock the consumer before reporting the failure.
                queue.enqueue(&T::sentinel());
                let _ = consumer.join();
                return Err(EngineError::RolePanicked(Role::Producer));
            }
        };
        let consumer = consumer
            .join()
            .map_err(|_| EngineError::RolePanicked(Role::Consumer))?;
        Ok((sent, consumer))
    })?;
    let elapsed = watch.stop();

    let report = SessionReport {
        strategy: queue.strategy(),
        capacity: cfg.capacity,
        payload_size: size_of::<T>(),
        sent,
        consumer,
        queue: queue.metrics(),
        elapsed,
    };
    tracing::info!(
        sent = report.sent,
        received = report.consumer.received,
        evicted = report.queue.evicted,
        elapsed = %report.elapsed,
        "session finished"
    );

    Ok(SessionOutcome {
        report,
        event_log: queue.into_event_log(),
    })
}

/// Runs a session with the payload type named in the config.
pub fn run_configured(cfg: &BasaltConfig) -> Result<SessionOutcome, EngineError> {
    let session = SessionConfig::from(cfg);
    match cfg.payload {
        PayloadKind::Word => run_session::<u32>(&session),
        PayloadKind::Sample => run_session::<Sample>(&session),
    }
}
