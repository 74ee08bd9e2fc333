use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fp_core::{Budget, Engine, EngineConfig};
use num_bigint::{BigInt, BigUint};

fn bench_resonance(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let n: BigInt = "340282366920938463463374607431768211457".parse().unwrap();
    c.bench_function("resonance_128bit", |b| {
        b.iter(|| engine.resonance(black_box(&n)))
    });
}

fn bench_factorize(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let mut group = c.benchmark_group("factorize_uncached");
    let cases: [(&str, u64, u64); 4] = [
        ("trial_1001", 1001, 100),
        ("residue_close_pair", 10_007 * 10_009, 100),
        ("prime_100003", 100_003, 100),
        ("rho_unbalanced", 65_537 * 2_147_483_647, 5_000),
    ];
    for (name, n, iterations) in cases {
        let n = BigUint::from(n);
        group.bench_with_input(BenchmarkId::from_parameter(name), &n, |b, n| {
            b.iter(|| engine.factorize_uncached(n, Budget::iterations(iterations)))
        });
    }
    group.finish();
}

fn bench_cached(c: &mut Criterion) {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let n = BigUint::from(65_537u64 * 2_147_483_647);
    engine.factorize(&n);
    c.bench_function("factorize_cached_hit", |b| {
        b.iter(|| engine.factorize(black_box(&n)))
    });
}

criterion_group!(benches, bench_resonance, bench_factorize, bench_cached);
criterion_main!(benches);
