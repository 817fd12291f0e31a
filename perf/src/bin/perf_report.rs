use std::hint::black_box;
use std::mem::size_of;
use std::time::Instant;

use basalt_engine::SharedQueue;
use basalt_events::{EventKind, EventRecord, Sample};
use basalt_evlog::EventLog;
use basalt_lock::{CriticalSection, Discipline, HangThresholds, LockStrategy, Role};
use basalt_perf::*;
use basalt_ring::RingConfig;

const SESSION_EVENTS: u32 = 200_000;
const CAPACITIES: [usize; 3] = [1, 16, 256];
const STRATEGIES: [LockStrategy; 2] = [LockStrategy::Mutex, LockStrategy::Spin];

fn main() {
    let mut results: Vec<BenchResult> = Vec::new();

    print_banner();
    section_layout();
    section_clock(&mut results);
    section_uncontended(&mut results);
    let sessions = section_sessions();

    save_results(&results, &sessions);
}

fn print_banner() {
    let bar = "\u{2550}".repeat(90);
    println!("\n{bar}");
    println!("  BASALT PERFORMANCE REPORT");
    println!("  single-thread micro + two-thread session matrix");
    println!("{bar}\n");

    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(0);
    let os = run_cmd("uname", &["-srm"]).unwrap_or_else(|| "unknown".into());
    println!("  Cores:   {cores}");
    println!("  OS:      {}", os.trim());
}

fn section_layout() {
    section_header("SLOT LAYOUT");
    for (name, size) in [
        ("u32", size_of::<u32>()),
        ("Sample", size_of::<Sample>()),
        ("EventRecord", size_of::<EventRecord>()),
    ] {
        println!("  {name:<14} {size:>4} B per slot");
    }
}

fn section_clock(results: &mut Vec<BenchResult>) {
    section_header("CLOCK CALIBRATION");
    print_table_header();

    let r_now = measure_batched("basalt_clock::now()", 1000, 10_000, || {
        black_box(basalt_clock::now());
    });
    println!("{r_now}");

    let r_instant = measure_batched("Instant::now()", 1000, 10_000, || {
        black_box(Instant::now());
    });
    println!("{r_instant}");

    let log = EventLog::new(1024).expect("event log");
    let r_record = measure_batched("EventLog::record", 1000, 1_000, || {
        log.record(EventKind::Enqueued, black_box(1));
    });
    println!("{r_record}");

    println!(
        "\n  * Measurement floor: ~{} ns",
        r_now.stats.p50.min(r_instant.stats.p50)
    );
    results.extend([r_now, r_instant, r_record]);
}

fn section_uncontended(results: &mut Vec<BenchResult>) {
    section_header("UNCONTENDED LOCK + QUEUE");
    print_table_header();

    let sample = bench_sample();
    for strategy in STRATEGIES {
        let section = Discipline::new(strategy, HangThresholds::default(), 0u64);
        let r = measure_batched(&format!("{strategy:?} with()"), 1000, 10_000, || {
            section.with(Role::Producer, |n| *n += 1)
        });
        println!("{r}");
        results.push(r);

        let queue = SharedQueue::<Sample>::new(
            RingConfig::for_payload::<Sample>(256),
            strategy,
            HangThresholds::default(),
            None,
        )
        .expect("queue");
        let r = measure_batched(&format!("{strategy:?} enqueue+dequeue"), 1000, 10_000, || {
            queue.enqueue(&sample);
            black_box(queue.dequeue());
        });
        println!("{r}");
        results.push(r);
    }
}

fn section_sessions() -> Vec<SessionRun> {
    section_header("TWO-THREAD SESSIONS");
    println!(
        "  {:<6} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "lock", "cap", "received", "evicted", "held_p", "held_c", "spin_max", "values/s"
    );
    println!("  {}", "─".repeat(84));

    let runs = session_matrix(&STRATEGIES, &CAPACITIES, SESSION_EVENTS);
    for r in &runs {
        println!(
            "  {:<6} {:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            r.strategy,
            r.capacity,
            r.received,
            r.evicted,
            r.held_by_producer,
            r.held_by_consumer,
            r.longest_spin,
            format_rate(r.throughput),
        );
    }
    runs
}

fn save_results(results: &[BenchResult], sessions: &[SessionRun]) {
    let timestamp = run_cmd("date", &["+%Y%m%d_%H%M%S"])
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".into());

    let results_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/results");
    let _ = std::fs::create_dir_all(results_dir);
    let json_path = format!("{results_dir}/{timestamp}_report.json");

    let output = serde_json::json!({
        "report_type": "basalt",
        "timestamp": timestamp,
        "micro_benchmarks": results,
        "sessions": {
            "events": SESSION_EVENTS,
            "runs": sessions,
        },
    });

    let bar = "\u{2550}".repeat(90);
    let written = serde_json::to_string_pretty(&output)
        .map_err(std::io::Error::other)
        .and_then(|json| std::fs::write(&json_path, json));
    match written {
        Ok(()) => {
            println!("\n{bar}");
            println!("  Results saved to: {json_path}");
            println!("{bar}\n");
        }
        Err(e) => eprintln!("\n  [failed to save results: {e}]\n"),
    }
}

fn run_cmd(cmd: &str, args: &[&str]) -> Option<String> {
    std::process::Command::new(cmd)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
}
