use basalt_clock::Stopwatch;
use basalt_engine::{SessionConfig, SessionReport, Workload, run_session};
use basalt_events::{Payload, Sample};
use basalt_lock::{HangThresholds, LockStrategy};
use std::fmt;

// ─── Latency Samples ────────────────────────────────────────────────────────

/// Nearest-rank summary of per-operation timings, in ns.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Stats {
    pub count: usize,
    pub min: u64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub max: u64,
    pub mean: f64,
}

impl Stats {
    /// `None` for an empty sample set.
    pub fn from_samples(samples: &mut [u64]) -> Option<Self> {
        samples.sort_unstable();
        let (&min, &max) = (samples.first()?, samples.last()?);
        let count = samples.len();
        let rank = |pct: usize| samples[(pct * count).div_ceil(100).saturating_sub(1)];
        Some(Self {
            count,
            min,
            p50: rank(50),
            p90: rank(90),
            p99: rank(99),
            max,
            mean: samples.iter().sum::<u64>() as f64 / count as f64,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BenchResult {
    pub name: String,
    pub stats: Stats,
}

/// One row of the report table.
impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        write!(
            f,
            "  {:<34} {:>8} {:>8} {:>8} {:>8} {:>8}  ns/op",
            self.name, s.min, s.p50, s.p90, s.p99, s.max
        )
    }
}

pub fn print_table_header() {
    println!(
        "  {:<34} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Benchmark", "min", "p50", "p90", "p99", "max"
    );
    println!("  {}", "─".repeat(86));
}

pub fn section_header(title: &str) {
    println!("\n{}", "─".repeat(90));
    println!("  {title}");
    println!("{}\n", "─".repeat(90));
}

/// Times `batches` runs of `batch_size` calls of `op`; one sample per batch.
///
/// A lone uncontended queue operation costs about as much as reading the
/// clock, so single calls are never timed on their own.
pub fn measure_batched(
    name: &str,
    batches: usize,
    batch_size: usize,
    mut op: impl FnMut(),
) -> BenchResult {
    // One untimed batch to fault in the slots and warm the lock.
    (0..batch_size).for_each(|_| op());

    let per_batch = batch_size.max(1) as u64;
    let mut samples: Vec<u64> = (0..batches.max(1))
        .map(|_| {
            let mut watch = Stopwatch::start();
            (0..batch_size).for_each(|_| op());
            (watch.stop().as_nanos() / per_batch).max(1)
        })
        .collect();

    BenchResult {
        name: name.to_string(),
        stats: Stats::from_samples(&mut samples).unwrap_or_default(),
    }
}

// ─── Session Matrix ─────────────────────────────────────────────────────────

/// One two-thread run, flattened for the JSON report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionRun {
    pub strategy: String,
    pub capacity: usize,
    pub payload_size: usize,
    pub sent: u64,
    pub received: u64,
    pub evicted: u64,
    pub idle_polls: u64,
    pub held_by_producer: u64,
    pub held_by_consumer: u64,
    pub longest_spin: u64,
    pub elapsed_ns: u64,
    /// Values sent per second over the whole run.
    pub throughput: f64,
}

impl From<&SessionReport> for SessionRun {
    fn from(r: &SessionReport) -> Self {
        let elapsed_ns = r.elapsed.as_nanos();
        Self {
            strategy: format!("{:?}", r.strategy).to_lowercase(),
            capacity: r.capacity,
            payload_size: r.payload_size,
            sent: r.sent,
            received: r.consumer.received,
            evicted: r.queue.evicted,
            idle_polls: r.consumer.idle_polls,
            held_by_producer: r.queue.contention.held_by_producer,
            held_by_consumer: r.queue.contention.held_by_consumer,
            longest_spin: r.queue.contention.longest_spin,
            elapsed_ns,
            throughput: r.sent as f64 * 1e9 / elapsed_ns.max(1) as f64,
        }
    }
}

/// Runs a `Count(events)` session of [`Sample`] payloads for every pairing.
pub fn session_matrix(
    strategies: &[LockStrategy],
    capacities: &[usize],
    events: u32,
) -> Vec<SessionRun> {
    let mut runs = Vec::new();
    for &strategy in strategies {
        for &capacity in capacities {
            let cfg = SessionConfig {
                capacity,
                strategy,
                thresholds: HangThresholds::default(),
                logging: false,
                event_log_capacity: 1,
                workload: Workload::Count(events),
                consumer_backoff: false,
            };
            match run_session::<Sample>(&cfg) {
                Ok(out) => runs.push(SessionRun::from(&out.report)),
                Err(e) => eprintln!("  [session {strategy:?}/{capacity} failed: {e}]"),
            }
        }
    }
    runs
}

/// A sample with a fixed tag, for benches that only move bytes.
pub fn bench_sample() -> Sample {
    Sample::from_tag(0x00C0_FFEE)
}

/// `1.25M`, `830.0K`, `412`.
pub fn format_rate(per_sec: f64) -> String {
    match per_sec {
        r if r >= 1e6 => format!("{:.2}M", r / 1e6),
        r if r >= 1e3 => format!("{:.1}K", r / 1e3),
        r => format!("{r:.0}"),
    }
}
