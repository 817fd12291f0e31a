use basalt_events::EventKind;
use basalt_evlog::EventLog;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Instant;

fn bench_now(c: &mut Criterion) {
    c.bench_function("clock/now", |b| {
        b.iter(|| black_box(basalt_clock::now()));
    });
}

fn bench_instant_now(c: &mut Criterion) {
    c.bench_function("clock/Instant::now", |b| {
        b.iter(|| black_box(Instant::now()));
    });
}

fn bench_record(c: &mut Criterion) {
    // Small enough that the log is overwriting for nearly the whole run.
    let log = EventLog::new(1024).expect("event log");
    c.bench_function("evlog/record", |b| {
        b.iter(|| log.record(EventKind::Enqueued, black_box(42)));
    });
}

criterion_group!(benches, bench_now, bench_instant_now, bench_record);
criterion_main!(benches);
