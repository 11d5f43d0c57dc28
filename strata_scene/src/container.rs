// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-container spatial index over direct children.

use strata_index::{Aabb2D, Index, Key, RTreeIndex};

use crate::types::NodeId;

/// R-tree of a container's direct children.
///
/// Every box is expressed in the owning container's local frame, so moving,
/// rotating or scaling the container never touches any entry. An entry covers
/// the child's own box and its whole subtree.
#[derive(Debug)]
pub struct ChildIndex {
    index: RTreeIndex<f64, NodeId>,
}

impl ChildIndex {
    /// Empty index whose R-tree nodes hold at most `max_children` entries.
    pub fn new(max_children: usize) -> Self {
        Self {
            index: Index::with_rtree_fanout(max_children),
        }
    }

    /// Number of indexed children.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if no children are indexed.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Insert or replace `child`'s box. `key` is the child's current entry handle
    /// and is updated in place.
    pub fn update(&mut self, key: &mut Option<Key>, child: NodeId, local_box: Aabb2D<f64>) {
        if let Some(k) = *key
            && self.index.update(k, local_box)
        {
            return;
        }
        *key = Some(self.index.insert(local_box, child));
    }

    /// Delete an entry. Returns the child it belonged to.
    pub fn remove(&mut self, key: Key) -> Option<NodeId> {
        self.index.remove(key)
    }

    /// Box stored for an entry.
    pub fn get(&self, key: Key) -> Option<Aabb2D<f64>> {
        self.index.get(key).map(|(aabb, _)| aabb)
    }

    /// Call `f` for every child whose box intersects `local_box`, without
    /// recursing. Returns the number of R-tree nodes examined.
    pub fn search(&self, local_box: Aabb2D<f64>, mut f: impl FnMut(NodeId, Aabb2D<f64>)) -> usize {
        self.index.visit_rect(local_box, |_, aabb, child| f(child, aabb))
    }

    /// Union of all child boxes, or the empty sentinel.
    pub fn content_bounds(&self) -> Aabb2D<f64> {
        self.index
            .bounds()
            .filter(|b| !b.is_empty())
            .unwrap_or(Aabb2D::<f64>::EMPTY)
    }
}
