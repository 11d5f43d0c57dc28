// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use strata_index::{Aabb2D, Index, Key};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Aabb2D::<f64>::from_xywh(x0, y0, cell, cell));
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng(0xC1A5_7E55_9999_ABCD);
    let centers: Vec<_> = (0..n_clusters)
        .map(|_| (rng.next_f64() * 2000.0, rng.next_f64() * 2000.0))
        .collect();
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(Aabb2D::<f64>::from_xywh(cx + dx, cy + dy, 12.0, 12.0));
        }
    }
    out
}

fn bench_build_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_query");
    let query = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("flatvec_n{n}"), |b| {
            b.iter_batched(
                Index::<f64, u32>::new,
                |mut idx| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        let _ = idx.insert(r, i as u32);
                    }
                    black_box(idx.query_rect(query).count());
                },
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("rtree_n{n}"), |b| {
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
    }
    group.finish();
}

fn bench_query_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_heavy");
    let rects = gen_clustered_rects(40, 250, 300.0);
    let mut flat = Index::<f64, u32>::new();
    let mut rtree = Index::<f64, u32>::with_rtree();
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = flat.insert(r, i as u32);
        let _ = rtree.insert(r, i as u32);
    }
    let mut rng = Rng(0xFACE_FEED_CAFE_BABE);
    let queries: Vec<_> = (0..256)
        .map(|_| {
            let (x, y) = (rng.next_f64() * 1900.0, rng.next_f64() * 1900.0);
            Aabb2D::<f64>::from_xywh(x, y, 100.0, 100.0)
        })
        .collect();
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.bench_function("flatvec_clustered_10k", |b| {
        b.iter(|| {
            let mut hits = 0;
            for q in &queries {
                flat.visit_rect(*q, |_, _, _| hits += 1);
            }
            black_box(hits)
        });
    });
    group.bench_function("rtree_clustered_10k", |b| {
        b.iter(|| {
            let mut hits = 0;
            for q in &queries {
                rtree.visit_rect(*q, |_, _, _| hits += 1);
            }
            black_box(hits)
        });
    });
    group.finish();
}

fn bench_update_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_heavy");
    let rects = gen_grid_rects(64, 10.0);
    group.throughput(Throughput::Elements(rects.len() as u64));
    group.bench_function("rtree_nudge_all_n64", |b| {
        b.iter_batched(
            || {
                let mut idx = Index::<f64, u32>::with_rtree();
                let keys: Vec<Key> = rects
                    .iter()
                    .copied()
                    .enumerate()
                    .map(|(i, r)| idx.insert(r, i as u32))
                    .collect();
                (idx, keys)
            },
            |(mut idx, keys)| {
                for (k, r) in keys.iter().zip(&rects) {
                    let moved = Aabb2D::<f64>::new(r.min_x + 3.0, r.min_y, r.max_x + 3.0, r.max_y);
                    idx.update(*k, moved);
                }
                black_box(idx.len());
            },
            BatchSize::SmallInput,
        );
    });
    group.bench_function("rtree_remove_half_n64", |b| {
        b.iter_batched(
            || {
                let mut idx = Index::<f64, u32>::with_rtree();
                let keys: Vec<Key> = rects
                    .iter()
                    .copied()
                    .enumerate()
                    .map(|(i, r)| idx.insert(r, i as u32))
                    .collect();
                (idx, keys)
            },
            |(mut idx, keys)| {
                for k in keys.iter().step_by(2) {
                    black_box(idx.remove(*k));
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build_query,
    bench_query_heavy,
    bench_update_heavy
);
criterion_main!(benches);
