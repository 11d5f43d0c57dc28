// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build a small scene, move things around, and hit test.
//!
//! Run:
//! - `cargo run -p strata_demos --example scene_basics`

use kurbo::{Point, Rect};
use strata_scene::{Color, NodeDesc, NodeFlags, Scene};

fn main() {
    let mut scene = Scene::new();
    let root = scene.root();

    let card = scene.insert(root, NodeDesc::rect(10.0, 10.0, 100.0, 50.0, Color::WHITE));
    let badge = scene.insert(card, NodeDesc::rect(80.0, -5.0, 24.0, 24.0, Color::BLACK));
    let label = scene.insert(
        card,
        NodeDesc::rect(8.0, 8.0, 60.0, 16.0, Color::rgb(0.2, 0.2, 0.2))
            .with_flags(NodeFlags::VISIBLE),
    );

    scene.set_position(card, 20.0, 20.0);
    println!("card origin in world: {:?}", scene.world_matrix(card) * Point::ZERO);

    for p in [Point::new(25.0, 25.0), Point::new(5.0, 5.0), Point::new(110.0, 20.0)] {
        println!("hit {p:?} -> {:?}", scene.hit_test_path(p));
    }
    // The label is not interactive; clicks fall through to the card.
    println!("hit on label -> {:?} (label is {label:?})", scene.hit_test(Point::new(35.0, 35.0)));

    scene.set_rotation(card, std::f64::consts::FRAC_PI_8);
    scene.update();
    println!("rotated badge world bounds: {:?}", scene.world_bounds(badge));
    println!("card subtree content bounds: {:?}", scene.content_bounds(card));

    let damage = scene.take_damage();
    println!("damage: {} rects, union {:?}", damage.rects.len(), damage.union_rect());

    let visible = scene.query_visible(Rect::new(0.0, 0.0, 60.0, 60.0));
    println!("visible in 60x60: {visible:?}");
    println!("{:?}", scene.stats());
}
