use criterion::{Criterion, criterion_group, criterion_main};
use fp_core::{Budget, Engine, EngineConfig, Factorization};
use fp_store::Store;
use num_bigint::BigUint;

fn results() -> Vec<Factorization> {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    (10_000u64..10_200)
        .map(|n| engine.factorize_uncached(&BigUint::from(n), Budget::default()))
        .collect()
}

fn bench_record(c: &mut Criterion) {
    let results = results();
    c.bench_function("record_all_200", |b| {
        b.iter_batched(
            || Store::open_in_memory().unwrap(),
            |store| store.record_all(&results).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_load(c: &mut Criterion) {
    let store = Store::open_in_memory().unwrap();
    store.record_all(&results()).unwrap();
    c.bench_function("load_exact_200", |b| b.iter(|| store.load_exact().unwrap()));
}

criterion_group!(benches, bench_record, bench_load);
criterion_main!(benches);
