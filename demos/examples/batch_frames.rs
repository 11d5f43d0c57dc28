// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drive the batch renderer for a few frames against the recording backend.
//!
//! Run with logging to see flushes and order rebuilds:
//! - `RUST_LOG=strata_render=trace,strata_scene=debug cargo run -p strata_demos --example batch_frames`

use strata_render::{BatchRenderer, RecordingBackend, RendererConfig};
use strata_scene::{Color, NodeDesc, Scene, TextureHandle};

fn main() {
    env_logger::init();

    let mut scene = Scene::new();
    let root = scene.root();
    let mut tiles = Vec::new();
    for row in 0..12_u32 {
        let strip = scene.insert(root, NodeDesc::container(0.0, f64::from(row) * 40.0));
        for col in 0..16_u32 {
            let x = f64::from(col) * 40.0;
            let desc = if (row + col) % 3 == 0 {
                NodeDesc::image(x, 0.0, 36.0, 36.0, TextureHandle(u64::from(col % 5)))
            } else {
                NodeDesc::rect(x, 0.0, 36.0, 36.0, Color::rgb(0.1 * (row % 10) as f32, 0.4, 0.8))
            };
            tiles.push(scene.insert(strip, desc));
        }
    }

    let config = RendererConfig::default()
        .with_surface_size(640, 480)
        .with_max_quads(64)
        .with_max_texture_slots(4);
    let mut renderer = match BatchRenderer::new(config, RecordingBackend::new()) {
        Ok(r) => r,
        Err(err) => {
            log::error!("bad renderer config: {err}");
            return;
        }
    };

    for frame in 0..5 {
        match frame {
            2 => scene.set_position(tiles[20], 700.0, 0.0),
            3 => scene.set_visible(tiles[3], false),
            _ => {}
        }
        renderer.backend_mut().clear();
        match renderer.tick(&mut scene) {
            Some(stats) => println!(
                "frame {frame}: {} quads, {} draw calls, {} early flushes, scissor {:?}",
                stats.quads, stats.draw_calls, stats.limit_flushes, stats.scissor
            ),
            None => println!("frame {frame}: nothing to paint"),
        }
    }
}
