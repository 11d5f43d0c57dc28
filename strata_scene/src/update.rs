// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! World-state reconciliation: the per-frame update pass and lazy world matrices.

use alloc::vec::Vec;
use kurbo::{Affine, Point};
use strata_index::Aabb2D;

use crate::container::ChildIndex;
use crate::scene::{Node, Scene};
use crate::types::{Dirty, NodeId};
use crate::util::{invert, own_box, transform_aabb};

impl Scene {
    /// Bring every attached node's world matrix, world AABB and index entry up
    /// to date. Clean subtrees are skipped without being visited.
    pub fn update(&mut self) {
        let root = self.root;
        self.update_subtree(root, Affine::IDENTITY, false);
    }

    /// Update pass starting at `id`, whose parent's world matrix is `parent_world`.
    ///
    /// `parent_changed` says whether that matrix differs from the one used last
    /// time. Nodes with no dirty bits under an unchanged parent return
    /// immediately along with their whole subtree. The walk keeps its own
    /// stack, so nesting depth is bounded by memory rather than the call stack.
    pub fn update_subtree(&mut self, id: NodeId, parent_world: Affine, parent_changed: bool) {
        let mut stack = alloc::vec![Visit::Enter {
            id,
            parent_world,
            parent_changed,
        }];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter {
                    id,
                    parent_world,
                    parent_changed,
                } => self.enter_node(id, parent_world, parent_changed, &mut stack),
                Visit::Exit { id, local_changed } => {
                    // Children are done, so their entries are current.
                    self.refresh_entry(id, local_changed);
                    self.node_mut(id).dirty.remove(Dirty::LOCAL | Dirty::SUBTREE);
                }
            }
        }
    }

    /// Pre-order half of the update pass: world matrix, world bounds, damage,
    /// and scheduling of the children and the post-order entry refresh.
    fn enter_node(
        &mut self,
        id: NodeId,
        parent_world: Affine,
        parent_changed: bool,
        stack: &mut Vec<Visit>,
    ) {
        let dirty = self.node(id).dirty;
        if !parent_changed && dirty.is_empty() {
            return;
        }
        self.stats.update_visits += 1;

        let (world, world_changed, bounds_change) = {
            let node = self.node_mut(id);
            let mut world_changed = false;
            if parent_changed || dirty.intersects(Dirty::LOCAL | Dirty::SPATIAL) {
                let world = node.transform.world_matrix(Some(parent_world));
                world_changed = world != node.world;
                node.world = world;
            }
            let mut bounds_change = None;
            if world_changed || dirty.intersects(Dirty::LOCAL | Dirty::SPATIAL | Dirty::BOUNDS) {
                let bounds = transform_aabb(node.world, own_box(node.size));
                if bounds != node.world_bounds {
                    bounds_change = Some((node.world_bounds, bounds));
                    node.world_bounds = bounds;
                }
            }
            node.dirty.remove(Dirty::SPATIAL | Dirty::BOUNDS);
            (node.world, world_changed, bounds_change)
        };
        if let Some((old, new)) = bounds_change {
            self.damage_aabb(old);
            self.damage_aabb(new);
        }

        stack.push(Visit::Exit {
            id,
            local_changed: dirty.contains(Dirty::LOCAL),
        });
        // A node that was SPATIAL has SPATIAL children that must be cleared too.
        if world_changed || dirty.intersects(Dirty::SUBTREE | Dirty::SPATIAL) {
            stack.extend(self.node(id).children.iter().rev().map(|&child| Visit::Enter {
                id: child,
                parent_world: world,
                parent_changed: world_changed,
            }));
        }
    }

    fn damage_aabb(&mut self, aabb: Aabb2D<f64>) {
        if !aabb.is_empty() {
            self.damage_rect(crate::util::aabb_to_rect(aabb));
        }
    }

    /// Recompute `id`'s content bounds and, if they or its local geometry
    /// changed, its entry in the parent's index.
    ///
    /// The entry is the AABB of the content box (own box plus every child
    /// entry) mapped through the node's local matrix. A node with empty content
    /// has no entry at all.
    pub(crate) fn refresh_entry(&mut self, id: NodeId, local_changed: bool) {
        let fanout = self.config.rtree_max_children;
        let (parent, entry) = {
            let node = self.node_mut(id);
            let children = node
                .index
                .as_ref()
                .map_or(Aabb2D::<f64>::EMPTY, ChildIndex::content_bounds);
            let content = own_box(node.size).union(&children);
            let content_changed = content != node.content_bounds;
            node.content_bounds = content;
            let Some(parent) = node.parent else {
                return;
            };
            if !local_changed && !content_changed && node.index_key.is_some() {
                return;
            }
            (parent, transform_aabb(node.transform.local_matrix(), content))
        };
        if entry.is_empty() {
            let stale = self.node_mut(id).index_key.take();
            if let (Some(key), Some(index)) = (stale, self.node_mut(parent).index.as_mut()) {
                index.remove(key);
            }
            return;
        }
        let mut key = self.node(id).index_key;
        self.node_mut(parent)
            .index
            .get_or_insert_with(|| ChildIndex::new(fanout))
            .update(&mut key, id, entry);
        self.node_mut(id).index_key = key;
    }

    /// Current world matrix of `id`, resolving lazily.
    ///
    /// Only the chain of `SPATIAL` ancestors above `id` is recomputed, so the
    /// cost is bounded by the depth of the dirty chain rather than tree size.
    pub fn world_matrix(&mut self, id: NodeId) -> Affine {
        if !self.node(id).dirty.contains(Dirty::SPATIAL) {
            return self.node(id).world;
        }
        let mut chain = Vec::new();
        let mut base = Affine::IDENTITY;
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = self.node(n);
            if !node.dirty.contains(Dirty::SPATIAL) {
                base = node.world;
                break;
            }
            chain.push(n);
            cur = node.parent;
        }

        let mut world = base;
        for &n in chain.iter().rev() {
            let node = self.node_mut(n);
            world = node.transform.world_matrix(Some(world));
            node.world = world;
            node.dirty.remove(Dirty::SPATIAL);
            // The world AABB and the still-SPATIAL children wait for the update pass.
            node.dirty.insert(Dirty::BOUNDS);
            if !node.children.is_empty() {
                node.dirty.insert(Dirty::SUBTREE);
            }
        }
        if let Some(&top) = chain.last()
            && let Some(parent) = self.node(top).parent
        {
            self.mark_subtree_up(parent);
        }
        world
    }

    /// Whether `world_point` lies inside `id`'s `[0, w] × [0, h]` box.
    ///
    /// Zero-size nodes and nodes with a singular world matrix contain nothing.
    pub fn contains_point(&mut self, id: NodeId, world_point: Point) -> bool {
        let world = self.world_matrix(id);
        let node = self.node(id);
        box_contains(node, world, world_point)
    }
}

/// Pending step of the iterative update pass.
enum Visit {
    Enter {
        id: NodeId,
        parent_world: Affine,
        parent_changed: bool,
    },
    Exit {
        id: NodeId,
        local_changed: bool,
    },
}

pub(crate) fn box_contains(node: &Node, world: Affine, world_point: Point) -> bool {
    let Some(inv) = invert(world) else {
        return false;
    };
    let p = inv * world_point;
    own_box(node.size).contains_point(p.x, p.y)
}
