use criterion::{Criterion, criterion_group, criterion_main};
use sitesweeper_core::*;
use std::hint::black_box;

fn bench_generation(c: &mut Criterion) {
    let catalog = HazardCatalog::builtin();
    let mut group = c.benchmark_group("generate");
    for difficulty in Difficulty::ALL {
        group.bench_function(difficulty.id(), |b| {
            let mut seed = 0u64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                RandomBoardGenerator::new(seed)
                    .generate(black_box(difficulty.config()), &catalog)
                    .map(|board| board.hazard_count())
            })
        });
    }
    group.finish();
}

fn bench_flood_reveal(c: &mut Criterion) {
    let catalog = HazardCatalog::builtin();
    // sparse board so a single reveal sweeps most of the grid
    let config = BoardConfig::new_unchecked(200, 40);
    let board = RandomBoardGenerator::new(1)
        .generate(config, &catalog)
        .expect("valid config");
    let start = board
        .cells()
        .find(|cell| !cell.has_hazard() && cell.adjacent_hazards() == 0)
        .map(Cell::coords)
        .expect("sparse board has a zero cell");

    c.bench_function("flood_reveal_200", |b| {
        b.iter(|| {
            let mut engine = PlayEngine::new(board.clone());
            engine.reveal(black_box(start)).map(|outcome| outcome.revealed().len())
        })
    });
}

criterion_group!(benches, bench_generation, bench_flood_reveal);
criterion_main!(benches);
