// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint order, hierarchical viewport culling, and hit testing.

use alloc::vec;
use alloc::vec::Vec;
use kurbo::{Affine, Point, Rect};
use strata_index::Aabb2D;

use crate::scene::Scene;
use crate::types::{NodeFlags, NodeId};
use crate::update::box_contains;
use crate::util::{invert, own_box, rect_to_aabb, transform_aabb, transform_rect_bbox};

/// Pending step of a hit test walk.
enum HitStep {
    /// Search a container's index with the container's world matrix.
    Search(NodeId, Affine),
    /// Test a child's own box.
    Test(NodeId),
}

#[derive(Default)]
struct CullCounters {
    candidates: usize,
    index_nodes: usize,
}

impl Scene {
    /// Rebuild the pre-order paint table if the structure changed since the
    /// last rebuild. Returns whether a rebuild happened.
    ///
    /// Every attached node gets a sequential render order; later siblings and
    /// descendants paint on top.
    pub fn resolve_render_order(&mut self) -> bool {
        if self.order_epoch == Some(self.structure_epoch) {
            return false;
        }
        self.order.clear();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId indices are 32-bit, so is the number of attached nodes."
            )]
            let order = self.order.len() as u32;
            let node = self.node_mut(id);
            node.render_order = order;
            stack.extend(node.children.iter().rev().copied());
            self.order.push(id);
        }
        self.order_epoch = Some(self.structure_epoch);
        self.stats.order_rebuilds += 1;
        log::debug!(
            "render order rebuilt: {} nodes at structure epoch {}",
            self.order.len(),
            self.structure_epoch
        );
        true
    }

    /// Attached nodes in paint order, as of the last
    /// [`resolve_render_order`](Self::resolve_render_order).
    pub fn order_table(&self) -> &[NodeId] {
        &self.order
    }

    /// Whether the paint order is stale.
    pub fn order_is_stale(&self) -> bool {
        self.order_epoch != Some(self.structure_epoch)
    }

    /// Visible nodes whose own box intersects `viewport`, given in surface space
    /// (after the view transform). Runs the update pass first.
    ///
    /// Results are unordered; hidden nodes and their subtrees are skipped.
    pub fn query_visible(&mut self, viewport: Rect) -> Vec<NodeId> {
        self.update();
        self.resolve_render_order();
        let root = self.root;
        let view = self.view;
        let root_world = self.node(root).world;
        let mut out = Vec::new();
        self.query_recursive(root, view, root_world, viewport, &mut out);
        out
    }

    /// Cull `container`'s subtree against `viewport` (in the space `view` maps to).
    ///
    /// The viewport is brought into each container's local frame through the
    /// inverse of `view · container_world` and searched in that container's
    /// index. Matching containers are searched in turn from a work stack. A
    /// singular matrix at any level yields no matches below it. World matrices
    /// must be current.
    pub fn query_recursive(
        &mut self,
        container: NodeId,
        view: Affine,
        container_world: Affine,
        viewport: Rect,
        out: &mut Vec<NodeId>,
    ) {
        let mut counters = CullCounters::default();
        self.cull(container, view, container_world, viewport, out, &mut counters);
        self.stats.cull_candidates += counters.candidates;
        self.stats.index_nodes_visited += counters.index_nodes;
    }

    fn cull(
        &self,
        container: NodeId,
        view: Affine,
        container_world: Affine,
        viewport: Rect,
        out: &mut Vec<NodeId>,
        counters: &mut CullCounters,
    ) {
        let mut pending = vec![(container, container_world)];
        let mut matches = Vec::new();
        while let Some((container, container_world)) = pending.pop() {
            let Some(index) = self.node(container).index.as_ref() else {
                continue;
            };
            if index.is_empty() {
                continue;
            }
            let Some(view_to_local) = invert(view * container_world) else {
                continue;
            };
            let query = rect_to_aabb(transform_rect_bbox(view_to_local, viewport));
            matches.clear();
            counters.index_nodes += index.search(query, |child, _| matches.push(child));

            for &child in &matches {
                let node = self.node(child);
                if !node.flags.contains(NodeFlags::VISIBLE) {
                    continue;
                }
                counters.candidates += 1;
                // The entry covers the whole subtree; keep the child only if its own box is in view.
                let own = transform_aabb(node.transform.matrix(), own_box(node.size));
                if own.intersects(&query) {
                    out.push(child);
                }
                if node.index.as_ref().is_some_and(|i| !i.is_empty()) {
                    pending.push((child, node.world));
                }
            }
        }
    }

    /// Topmost interactive, visible node under a world-space point.
    /// Runs the update pass and resolves paint order first.
    pub fn hit_test(&mut self, world_point: Point) -> Option<NodeId> {
        self.update();
        self.resolve_render_order();
        let root = self.root;
        let root_world = self.node(root).world;
        self.hit_test_recursive(root, root_world, world_point)
    }

    /// [`hit_test`](Self::hit_test) for a point in surface space, mapped through
    /// the inverse view transform.
    pub fn hit_test_surface(&mut self, surface_point: Point) -> Option<NodeId> {
        let inv = invert(self.view)?;
        self.hit_test(inv * surface_point)
    }

    /// Root-to-node path (inclusive) of the [`hit_test`](Self::hit_test) result.
    pub fn hit_test_path(&mut self, world_point: Point) -> Option<Vec<NodeId>> {
        let hit = self.hit_test(world_point)?;
        Some(self.path_to_root(hit))
    }

    /// Hit test below `container` with a point lookup in each index.
    ///
    /// Candidates are tried in descending render order and a child's
    /// descendants are tried before the child itself, so nested content wins
    /// over its container. The walk runs from a work stack rather than the
    /// call stack. World matrices and paint order must be current.
    pub fn hit_test_recursive(
        &self,
        container: NodeId,
        container_world: Affine,
        world_point: Point,
    ) -> Option<NodeId> {
        let mut steps = vec![HitStep::Search(container, container_world)];
        let mut candidates = Vec::new();
        while let Some(step) = steps.pop() {
            let (container, container_world) = match step {
                HitStep::Search(container, world) => (container, world),
                HitStep::Test(child) => {
                    let node = self.node(child);
                    if node.flags.contains(NodeFlags::INTERACTIVE)
                        && box_contains(node, node.world, world_point)
                    {
                        return Some(child);
                    }
                    continue;
                }
            };
            let Some(index) = self.node(container).index.as_ref() else {
                continue;
            };
            let Some(inv) = invert(container_world) else {
                continue;
            };
            let local = inv * world_point;
            candidates.clear();
            index.search(Aabb2D::point(local.x, local.y), |child, _| {
                candidates.push(child);
            });
            // Lowest first onto the stack, so the topmost candidate pops first.
            candidates.sort_unstable_by_key(|&c| self.node(c).render_order);
            for &child in &candidates {
                let node = self.node(child);
                if !node.flags.contains(NodeFlags::VISIBLE) {
                    continue;
                }
                steps.push(HitStep::Test(child));
                if node.index.is_some() {
                    steps.push(HitStep::Search(child, node.world));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, NodeDesc};
    use core::f64::consts::FRAC_PI_4;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> NodeDesc {
        NodeDesc::rect(x, y, w, h, Color::WHITE)
    }

    fn sorted(mut ids: Vec<NodeId>) -> Vec<NodeId> {
        ids.sort_by_key(|id| (id.0, id.1));
        ids
    }

    #[test]
    fn render_order_is_preorder_and_cached() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.insert(root, NodeDesc::default());
        let a1 = scene.insert(a, NodeDesc::default());
        let b = scene.insert(root, NodeDesc::default());
        assert!(scene.resolve_render_order());
        assert_eq!(scene.order_table(), &[root, a, a1, b]);
        assert_eq!(scene.render_order(b), 3);
        assert!(!scene.resolve_render_order(), "unchanged structure reuses the table");

        scene.add_child(root, a);
        assert!(scene.order_is_stale());
        assert!(scene.resolve_render_order());
        assert_eq!(scene.order_table(), &[root, b, a, a1]);
        assert_eq!(scene.stats().order_rebuilds, 2);
    }

    #[test]
    fn later_sibling_wins_hit_test() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.insert(root, rect(0.0, 0.0, 50.0, 50.0));
        let b = scene.insert(root, rect(25.0, 25.0, 50.0, 50.0));
        assert_eq!(scene.hit_test(Point::new(30.0, 30.0)), Some(b));
        assert_eq!(scene.hit_test(Point::new(10.0, 10.0)), Some(a));
        assert_eq!(scene.hit_test(Point::new(100.0, 100.0)), None);
    }

    #[test]
    fn nested_content_wins_over_container() {
        let mut scene = Scene::new();
        let root = scene.root();
        let panel = scene.insert(root, rect(100.0, 100.0, 200.0, 200.0));
        let button = scene.insert(panel, rect(10.0, 10.0, 40.0, 20.0));
        let later = scene.insert(root, rect(0.0, 0.0, 20.0, 20.0));
        assert_eq!(scene.hit_test(Point::new(115.0, 115.0)), Some(button));
        assert_eq!(scene.hit_test(Point::new(200.0, 200.0)), Some(panel));
        assert_eq!(
            scene.hit_test_path(Point::new(115.0, 115.0)),
            Some(vec![root, panel, button])
        );
        assert_eq!(scene.hit_test(Point::new(5.0, 5.0)), Some(later));
    }

    #[test]
    fn hit_test_skips_hidden_and_non_interactive() {
        let mut scene = Scene::new();
        let root = scene.root();
        let under = scene.insert(root, rect(0.0, 0.0, 50.0, 50.0));
        let over = scene.insert(root, rect(0.0, 0.0, 50.0, 50.0));
        scene.set_interactive(over, false);
        assert_eq!(scene.hit_test(Point::new(10.0, 10.0)), Some(under));
        scene.set_visible(under, false);
        assert_eq!(scene.hit_test(Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn hit_test_follows_rotation_precisely() {
        let mut scene = Scene::new();
        let root = scene.root();
        let diamond = scene.insert(root, rect(100.0, 0.0, 50.0, 50.0).with_rotation(FRAC_PI_4));
        // Inside the rotated AABB but outside the rotated box itself.
        assert_eq!(scene.hit_test(Point::new(70.0, 5.0)), None);
        assert_eq!(scene.hit_test(Point::new(100.0, 30.0)), Some(diamond));
    }

    #[test]
    fn zero_scale_container_matches_nothing() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.insert(root, NodeDesc::container(0.0, 0.0).with_scale(0.0, 0.0));
        scene.insert(group, rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(scene.hit_test(Point::new(0.0, 0.0)), None);
        assert!(scene.query_visible(Rect::new(-100.0, -100.0, 100.0, 100.0)).is_empty());
    }

    #[test]
    fn surface_hit_test_applies_inverse_view() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.insert(root, rect(10.0, 10.0, 10.0, 10.0));
        scene.set_view_transform(100.0, 0.0, 2.0);
        // World (15, 15) lands at surface (130, 30).
        assert_eq!(scene.hit_test_surface(Point::new(130.0, 30.0)), Some(a));
        assert_eq!(scene.hit_test_surface(Point::new(15.0, 15.0)), None);
    }

    #[test]
    fn scenario_move_then_hit() {
        let mut scene = Scene::new();
        let root = scene.root();
        let c = scene.insert(root, rect(10.0, 10.0, 100.0, 50.0));
        scene.set_position(c, 20.0, 20.0);
        assert_eq!(scene.world_matrix(c) * Point::ORIGIN, Point::new(20.0, 20.0));
        assert_eq!(scene.hit_test(Point::new(25.0, 25.0)), Some(c));
        assert_eq!(scene.hit_test(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn culling_has_no_false_negatives() {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut all = Vec::new();
        for gx in 0..6 {
            let group = scene.insert(
                root,
                NodeDesc::container(f64::from(gx) * 120.0, 0.0).with_rotation(f64::from(gx) * 0.2),
            );
            for i in 0..12 {
                let id = scene.insert(group, rect(f64::from(i) * 9.0, f64::from(i) * 7.0, 8.0, 8.0));
                all.push(id);
            }
        }
        scene.set_view_transform(-50.0, 10.0, 1.5);
        let viewport = Rect::new(0.0, 0.0, 400.0, 120.0);
        let visible = scene.query_visible(viewport);

        let view = scene.view_transform();
        let mut checked = 0;
        for id in all {
            let to_surface = view * scene.cached_world(id);
            let size = scene.size(id);
            let samples = [
                Point::new(0.0, 0.0),
                Point::new(size.width, 0.0),
                Point::new(0.0, size.height),
                Point::new(size.width, size.height),
                Point::new(size.width * 0.5, size.height * 0.5),
            ];
            if samples.iter().any(|&p| viewport.contains(to_surface * p)) {
                checked += 1;
                assert!(visible.contains(&id), "{id:?} culled while visible");
            }
        }
        assert!(checked > 0, "viewport should show part of the scene");
    }

    #[test]
    fn ten_thousand_nodes_one_visible() {
        let mut scene = Scene::new();
        let root = scene.root();
        let mut target = None;
        for i in 0..10_000_u32 {
            let (x, y) = if i == 5_000 {
                (20.0, 20.0)
            } else {
                (200.0 + f64::from(i % 100) * 30.0, 200.0 + f64::from(i / 100) * 30.0)
            };
            let id = scene.insert(root, rect(x, y, 20.0, 20.0));
            if i == 5_000 {
                target = Some(id);
            }
        }
        scene.update();
        scene.reset_stats();
        let visible = scene.query_visible(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(visible, vec![target.expect("created")]);
        let stats = scene.stats();
        assert_eq!(stats.cull_candidates, 1);
        assert!(
            stats.index_nodes_visited < 100,
            "visited {} index nodes",
            stats.index_nodes_visited
        );
    }

    #[test]
    fn hidden_subtrees_are_culled() {
        let mut scene = Scene::new();
        let root = scene.root();
        let group = scene.insert(root, NodeDesc::container(0.0, 0.0));
        let a = scene.insert(group, rect(0.0, 0.0, 10.0, 10.0));
        let b = scene.insert(root, rect(5.0, 5.0, 10.0, 10.0));
        let all = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(sorted(scene.query_visible(all)), sorted(vec![a, b]));
        scene.set_visible(group, false);
        assert_eq!(scene.query_visible(all), vec![b]);
    }

    #[test]
    fn deep_nesting_runs_without_recursion() {
        const DEPTH: usize = 20_000;
        let mut scene = Scene::new();
        let mut parent = scene.root();
        let mut top = None;
        for _ in 0..DEPTH {
            parent = scene.insert(parent, rect(0.0, 0.0, 10.0, 10.0));
            top.get_or_insert(parent);
        }
        let deepest = parent;
        scene.update();
        assert_eq!(scene.query_visible(Rect::new(0.0, 0.0, 5.0, 5.0)).len(), DEPTH);
        assert_eq!(scene.hit_test(Point::new(5.0, 5.0)), Some(deepest));
        assert_eq!(scene.hit_test_path(Point::new(5.0, 5.0)).map(|p| p.len()), Some(DEPTH + 1));

        scene.set_position(top.expect("inserted"), 100.0, 0.0);
        assert_eq!(scene.hit_test(Point::new(105.0, 5.0)), Some(deepest));
        assert_eq!(scene.hit_test(Point::new(5.0, 5.0)), None);
    }
}
