//! Criterion benchmarks for reflejo-core reactive DSP primitives
//!
//! Run with: cargo bench -p reflejo-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use reflejo_core::{EnvelopeFollower, HysteresisGate, QuantileWindow, RefractoryGate, TimedWindow};

const TICK_RATE: f64 = 60.0;
const WINDOW_SIZES_MS: &[f64] = &[500.0, 1000.0, 4000.0];

fn generate_ticks(count: usize) -> Vec<(f64, f64)> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..count)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state % 256) as f64, i as f64 / TICK_RATE)
        })
        .collect()
}

fn bench_envelope_follower(c: &mut Criterion) {
    let ticks = generate_ticks(600);

    c.bench_function("EnvelopeFollower/process_600_ticks", |b| {
        b.iter(|| {
            let mut env = EnvelopeFollower::new(10.0, 100.0);
            for &(v, t) in &ticks {
                black_box(env.process(black_box(v), t));
            }
        });
    });
}

fn bench_gates(c: &mut Criterion) {
    let ticks = generate_ticks(600);

    c.bench_function("HysteresisGate/process_600_ticks", |b| {
        b.iter(|| {
            let mut gate = HysteresisGate::new(64.0, 192.0);
            for &(v, _) in &ticks {
                black_box(gate.process(black_box(v)));
            }
        });
    });

    c.bench_function("RefractoryGate/process_600_ticks", |b| {
        b.iter(|| {
            let mut gate = RefractoryGate::new(64.0, 192.0, 100.0);
            for &(v, t) in &ticks {
                black_box(gate.process(black_box(v), t));
            }
        });
    });
}

fn bench_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("QuantileWindow");
    let ticks = generate_ticks(600);

    for &window_ms in WINDOW_SIZES_MS {
        group.bench_with_input(
            BenchmarkId::new("normalize", window_ms as usize),
            &window_ms,
            |b, &window_ms| {
                b.iter(|| {
                    let mut win = QuantileWindow::new(window_ms);
                    for &(v, t) in &ticks {
                        win.push(v, t);
                        black_box(win.normalize(black_box(v), 0.01, 0.99));
                    }
                });
            },
        );
    }
    group.finish();

    c.bench_function("TimedWindow/mean_600_ticks", |b| {
        b.iter(|| {
            let mut win = TimedWindow::new(1000.0);
            for &(v, t) in &ticks {
                win.push(v, t);
                black_box(win.mean());
            }
        });
    });
}

criterion_group!(benches, bench_envelope_follower, bench_gates, bench_windows);
criterion_main!(benches);
