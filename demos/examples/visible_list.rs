// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll a long list by panning the view transform and cull each frame.
//!
//! Run:
//! - `cargo run -p strata_demos --example visible_list`

use kurbo::Rect;
use strata_scene::{Color, NodeDesc, Scene};

const ROW_H: f64 = 20.0;
const WIDTH: f64 = 200.0;

fn main() {
    let mut scene = Scene::new();
    let root = scene.root();
    let list = scene.insert(root, NodeDesc::container(0.0, 0.0));

    let rows = 1000_usize;
    let ids: Vec<_> = (0..rows)
        .map(|i| {
            let y = i as f64 * ROW_H;
            scene.insert(list, NodeDesc::rect(0.0, y, WIDTH, ROW_H - 1.0, Color::WHITE))
        })
        .collect();

    let viewport = Rect::new(0.0, 0.0, WIDTH, 100.0);
    for scroll in [0.0, 30.0, 200.0, 600.0] {
        scene.set_view_transform(0.0, -scroll, 1.0);
        scene.reset_stats();
        let visible = scene.query_visible(viewport);
        let mut indices: Vec<_> = visible
            .into_iter()
            .filter_map(|id| ids.iter().position(|x| *x == id))
            .collect();
        indices.sort_unstable();
        let stats = scene.stats();
        println!(
            "scroll={scroll:.1} -> rows {indices:?} ({} candidates, {} index nodes visited)",
            stats.cull_candidates, stats.index_nodes_visited
        );
    }
}
