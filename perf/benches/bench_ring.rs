use basalt_events::Sample;
use basalt_perf::bench_sample;
use basalt_ring::{OverwriteRing, RingConfig};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring/round_trip");

    let mut words = OverwriteRing::<u32>::new(RingConfig::for_payload::<u32>(256)).expect("ring");
    group.bench_function("u32", |b| {
        b.iter(|| {
            words.enqueue(black_box(&7));
            black_box(words.dequeue());
        });
    });

    let mut samples =
        OverwriteRing::<Sample>::new(RingConfig::for_payload::<Sample>(256)).expect("ring");
    let sample = bench_sample();
    group.bench_function("sample", |b| {
        b.iter(|| {
            samples.enqueue(black_box(&sample));
            black_box(samples.dequeue());
        });
    });

    group.finish();
}

fn bench_overwrite(c: &mut Criterion) {
    let mut ring =
        OverwriteRing::<Sample>::new(RingConfig::for_payload::<Sample>(64)).expect("ring");
    let sample = bench_sample();
    for _ in 0..64 {
        ring.enqueue(&sample);
    }
    c.bench_function("ring/enqueue_full", |b| {
        b.iter(|| black_box(ring.enqueue(black_box(&sample))));
    });
}

criterion_group!(benches, bench_round_trip, bench_overwrite);
criterion_main!(benches);
