//! Pathfinding benchmarks for ember_core.
//!
//! Run with: `cargo bench -p ember_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ember_core::grid::{Coord, Grid, Terrain};
use ember_core::pathfinding::find_path;
use ember_core::units::{Unit, UnitKind};

/// A 64x64 map with rock ridges that force detours.
fn ridged_grid() -> Grid {
    let mut grid = Grid::filled(64, 64, 100, Terrain::Open);
    for ridge in (8..64).step_by(16) {
        for row in 0..56 {
            grid.set_terrain(Coord::new(row, ridge), Terrain::Rock);
        }
        for row in 8..64 {
            grid.set_terrain(Coord::new(row, ridge + 8), Terrain::Forest);
        }
    }
    grid
}

/// Runs pathfinding benchmarks for the ember_core crate.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let grid = ridged_grid();
    let goal = Coord::new(63, 63);

    let wheeled = Unit::new(UnitKind::Wheeled, Coord::new(0, 0));
    c.bench_function("find_path_wheeled_64x64", |b| {
        b.iter(|| black_box(find_path(&grid, &wheeled, black_box(goal))))
    });

    let aerial = Unit::new(UnitKind::Aerial, Coord::new(0, 0));
    c.bench_function("find_path_aerial_64x64", |b| {
        b.iter(|| black_box(find_path(&grid, &aerial, black_box(goal))))
    });

    let legged = Unit::new(UnitKind::Legged, Coord::new(0, 0));
    c.bench_function("find_path_legged_64x64", |b| {
        b.iter(|| black_box(find_path(&grid, &legged, black_box(goal))))
    });
}

criterion_group!(benches, pathfinding_benchmark);
criterion_main!(benches);
