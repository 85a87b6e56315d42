//! Criterion benchmarks for the economy loop.
//!
//! Benchmarks:
//!   - one simulated minute of a staffed settlement, in 100 ms steps
//!   - a single long `update` jump over the same minute
//!   - full binary save of the staffed settlement
//!
//! Run with: cargo bench -p homestead-core --bench production

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use homestead_core::prelude::*;

fn staffed_settlement() -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimConfig {
        starting_gold: 10_000.0,
        villager_arrival_ms: 500,
        population_cap: 40,
        ..Default::default()
    });
    for x in (0..40).step_by(4) {
        engine.set_tile(CellCoord::new(x + 2, 10), TileType::Forest);
        engine.place_building(BuildingKind::House, CellCoord::new(x, 2));
        engine.place_building(BuildingKind::Lumberyard, CellCoord::new(x, 10));
        engine.set_target_tile(CellCoord::new(x, 10), CellCoord::new(x + 2, 10));
    }
    engine.place_building(BuildingKind::Warehouse, CellCoord::new(10, 20));
    engine.place_building(BuildingKind::Warehouse, CellCoord::new(20, 20));

    // fill the houses, then staff and connect every yard
    engine.update(30_000);
    for (i, x) in (0..40).step_by(4).enumerate() {
        let yard = CellCoord::new(x, 10);
        engine.assign_worker(yard, WorkerKind::Villager);
        engine.assign_worker(yard, WorkerKind::Villager);
        let warehouse = if i % 2 == 0 { 10 } else { 20 };
        engine.assign_warehouse(yard, CellCoord::new(warehouse, 20));
    }
    engine
}

// ---------------------------------------------------------------------------
// Benchmark: update loop
// ---------------------------------------------------------------------------

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("economy_update");
    group.sample_size(50);

    group.bench_function("minute_in_100ms_steps", |b| {
        b.iter_batched(
            staffed_settlement,
            |mut engine| {
                for _ in 0..600 {
                    black_box(engine.update(100));
                }
                engine
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("minute_single_step", |b| {
        b.iter_batched(
            staffed_settlement,
            |mut engine| {
                black_box(engine.update(60_000));
                engine
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: save
// ---------------------------------------------------------------------------

fn bench_save(c: &mut Criterion) {
    let engine = staffed_settlement();
    c.bench_function("save_staffed_settlement", |b| {
        b.iter(|| {
            let mut bytes = Vec::with_capacity(64 * 1024);
            let _ = engine.save(&mut bytes);
            black_box(bytes)
        });
    });
}

criterion_group!(benches, bench_update, bench_save);
criterion_main!(benches);
