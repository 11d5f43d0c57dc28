// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strata Scene: a retained 2D scene graph for interactive editors.
//!
//! - Nodes carry a decomposed local transform ([`AffineTransform`]), a content box,
//!   [`NodeFlags`], and a [`NodeKind`] describing what they paint.
//! - Mutations only flip dirty bits and record [`Damage`]; one [`Scene::update`]
//!   pass reconciles world state and skips every clean subtree outright.
//! - World matrices resolve lazily on demand ([`Scene::world_matrix`]), walking only
//!   the dirty ancestor chain.
//! - Every container owns a [`ChildIndex`]: an R-tree of its direct children in the
//!   container's own local frame. Moving a container never touches its descendants'
//!   entries, and culling ([`Scene::query_visible`]) and hit testing
//!   ([`Scene::hit_test`]) compose these indexes recursively, pruning whole offscreen
//!   subtrees with a single failed box test.
//!
//! ## Not a renderer
//!
//! This crate computes paint order and visible sets but produces no geometry.
//! `strata_render` turns the visible set into batched quads.
//!
//! ## Dirty state
//!
//! Moving, scaling, rotating or resizing a node marks it `LOCAL` and `SPATIAL`,
//! marks every descendant `SPATIAL` (their world state depends on it), and marks
//! ancestors `SUBTREE` up to the first one already marked. Attaching and detaching
//! bump the [`structure epoch`](Scene::structure_epoch) so paint order is rebuilt
//! lazily.
//!
//! ## Integration with Strata Index
//!
//! Child indexes are [`strata_index::RTreeIndex`]es over `f64`. Float inputs are
//! assumed to be finite (no NaNs). Index entries are conservative AABBs of each
//! child's subtree; hit testing and culling re-check each node's own box.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use strata_scene::{Color, NodeDesc, Scene};
//!
//! let mut scene = Scene::new();
//! let root = scene.root();
//!
//! let panel = scene.insert(root, NodeDesc::rect(100.0, 100.0, 200.0, 150.0, Color::WHITE));
//! let button = scene.insert(panel, NodeDesc::rect(10.0, 10.0, 80.0, 24.0, Color::BLACK));
//!
//! // Nested content wins over its container.
//! assert_eq!(scene.hit_test(Point::new(115.0, 115.0)), Some(button));
//!
//! // Moving the panel moves the button with it.
//! scene.set_position(panel, 300.0, 100.0);
//! assert_eq!(scene.hit_test(Point::new(315.0, 115.0)), Some(button));
//!
//! // Culling returns only what intersects the viewport.
//! let visible = scene.query_visible(Rect::new(0.0, 0.0, 250.0, 250.0));
//! assert!(visible.is_empty());
//!
//! // Everything that moved produced damage.
//! let damage = scene.take_damage();
//! assert!(damage.union_rect().is_some());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod container;
mod damage;
mod error;
mod observer;
mod query;
mod scene;
mod stats;
mod transform;
mod types;
mod update;
mod util;

pub use config::SceneConfig;
pub use container::ChildIndex;
pub use damage::{Damage, MAX_DAMAGE_RECTS};
pub use error::SceneError;
pub use observer::SceneObserver;
pub use scene::Scene;
pub use stats::SceneStats;
pub use transform::AffineTransform;
pub use types::{Color, NodeDesc, NodeFlags, NodeId, NodeKind, TextureHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn nodes_survive_many_edits() {
        let mut scene = Scene::with_config(SceneConfig::default().with_rtree_max_children(4));
        let root = scene.root();
        let rows: alloc::vec::Vec<_> = (0..30)
            .map(|i| scene.insert(root, NodeDesc::container(0.0, f64::from(i) * 20.0)))
            .collect();
        let mut cells = alloc::vec::Vec::new();
        for &row in &rows {
            for j in 0..10 {
                let x = f64::from(j) * 20.0;
                cells.push(scene.insert(row, NodeDesc::rect(x, 0.0, 18.0, 18.0, Color::WHITE)));
            }
        }
        // Move every other row and dispose a handful of cells.
        for (i, &row) in (0_u32..).zip(&rows).step_by(2) {
            scene.set_position(row, 500.0, f64::from(i) * 20.0);
        }
        for &cell in cells.iter().step_by(7) {
            scene.dispose(cell);
        }
        // Row 1 stayed put; its first cell survived.
        assert_eq!(scene.hit_test(Point::new(5.0, 25.0)), Some(cells[10]));
        // Row 0 moved right.
        assert_eq!(scene.hit_test(Point::new(25.0, 5.0)), None);
        assert_eq!(scene.hit_test(Point::new(525.0, 5.0)), Some(cells[1]));
    }
}
