//! Criterion benchmarks for the per-trial hot paths.
//!
//! 1. Staircase updates over a long mixed response sequence
//! 2. Stream generation with the default item sets
//! 3. Seeded per-trial generator derivation

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rsvp_experiment::conditions::default_logmar;
use rsvp_experiment::config::{StreamConfig, TaskKind};
use rsvp_experiment::seed::{SeedMode, TrialKey};
use rsvp_experiment::{LevelScale, SizeStaircase, StaircaseRule, StreamGenerator, TrialSeeder};

fn bench_staircase(c: &mut Criterion) {
    let scale = LevelScale::new(default_logmar()).unwrap();
    let responses: Vec<bool> = (0..1000).map(|i| i % 3 != 0).collect();
    c.bench_function("staircase_1000_updates", |b| {
        b.iter_batched(
            || SizeStaircase::new(scale.clone(), 1.0, StaircaseRule::default()),
            |mut s| {
                for correct in &responses {
                    black_box(s.record_response(*correct));
                }
                black_box(s.threshold())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_stream(c: &mut Criterion) {
    let generator =
        StreamGenerator::from_config(&StreamConfig::default(), TaskKind::Identification).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    c.bench_function("stream_generate_16", |b| {
        b.iter(|| black_box(generator.generate(&mut rng, true)))
    });
}

fn bench_seeder(c: &mut Criterion) {
    let mut seeder = TrialSeeder::new(SeedMode::Session { seed: 42 }, "bench");
    let key = TrialKey {
        size_deg: 0.83,
        require_response: true,
    };
    c.bench_function("session_seed_next_rng", |b| {
        b.iter(|| black_box(seeder.next_rng(&key)))
    });
}

criterion_group!(benches, bench_staircase, bench_stream, bench_seeder);
criterion_main!(benches);
