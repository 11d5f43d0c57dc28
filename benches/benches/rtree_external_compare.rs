// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use strata_index::{Aabb2D, Index};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            out.push(Aabb2D::<f64>::from_xywh(x as f64 * cell, y as f64 * cell, cell, cell));
        }
    }
    out
}

fn to_rstar_rect(r: &Aabb2D<f64>) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([r.min_x, r.min_y], [r.max_x, r.max_y])
}

// Both trees are built one insertion at a time, the way a container index
// grows as children are attached.
fn bench_incremental_build_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("rtree_external_compare_f64");
    for &n in &[64usize, 128] {
        let rects = gen_grid_rects(n, 10.0);
        let query = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_function(format!("strata_insert_query_n{n}"), |b| {
            b.iter_batched(
                Index::<f64, u32>::with_rtree,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    black_box(idx.query_rect(query).count());
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("rstar_insert_query_n{n}"), |b| {
            b.iter_batched(
                RTree::<Rectangle<[f64; 2]>>::new,
                |mut tree| {
                    for r in &rects {
                        tree.insert(to_rstar_rect(r));
                    }
                    let aabb = AABB::from_corners(
                        [query.min_x, query.min_y],
                        [query.max_x, query.max_y],
                    );
                    black_box(tree.locate_in_envelope_intersecting(&aabb).count());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_incremental_build_query);
criterion_main!(benches);
