// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use strata_render::{BatchRenderer, RecordingBackend, RendererConfig};
use strata_scene::{Color, NodeDesc, NodeId, Scene};

/// `groups` containers of `per_group` rects each, laid out in a square grid.
fn grid_scene(groups: usize, per_group: usize) -> (Scene, Vec<NodeId>) {
    let mut scene = Scene::new();
    let root = scene.root();
    let side = (groups as f64).sqrt().ceil() as usize;
    let mut containers = Vec::with_capacity(groups);
    for g in 0..groups {
        let gx = (g % side) as f64 * 220.0;
        let gy = (g / side) as f64 * 220.0;
        let group = scene.insert(root, NodeDesc::container(gx, gy));
        for i in 0..per_group {
            let x = (i % 10) as f64 * 20.0;
            let y = (i / 10) as f64 * 20.0;
            scene.insert(group, NodeDesc::rect(x, y, 18.0, 18.0, Color::WHITE));
        }
        containers.push(group);
    }
    scene.update();
    (scene, containers)
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let (mut scene, containers) = grid_scene(100, 100);
    group.bench_function("clean_pass_10k", |b| {
        b.iter(|| scene.update());
    });
    let mut flip = false;
    group.bench_function("move_one_container_10k", |b| {
        b.iter(|| {
            flip = !flip;
            let x = if flip { 5.0 } else { 0.0 };
            scene.set_position(containers[42], x, 0.0);
            scene.update();
        });
    });
    group.finish();
}

fn bench_culling(c: &mut Criterion) {
    let mut group = c.benchmark_group("culling");
    let (mut scene, _) = grid_scene(100, 100);
    for &size in &[100.0, 500.0, 2500.0] {
        let viewport = Rect::new(0.0, 0.0, size, size);
        group.bench_function(format!("query_visible_{size}"), |b| {
            b.iter(|| black_box(scene.query_visible(viewport).len()));
        });
    }
    group.bench_function("hit_test_10k", |b| {
        b.iter(|| black_box(scene.hit_test(Point::new(1105.0, 1105.0))));
    });
    group.finish();
}

fn bench_batching(c: &mut Criterion) {
    let mut group = c.benchmark_group("batching");
    let (mut scene, _) = grid_scene(100, 100);
    let config = RendererConfig::default().with_surface_size(2200, 2200);
    group.throughput(Throughput::Elements(10_000));
    for (name, threshold) in [("sort", usize::MAX), ("bitset", 0)] {
        let config = config.with_bitset_threshold(threshold);
        group.bench_function(format!("paint_full_{name}_10k"), |b| {
            b.iter_batched(
                || BatchRenderer::new(config, RecordingBackend::new()).unwrap(),
                |mut renderer| black_box(renderer.paint(&mut scene, None)),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update, bench_culling, bench_batching);
criterion_main!(benches);
