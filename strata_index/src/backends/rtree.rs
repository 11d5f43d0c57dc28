// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! R-tree backend generic over scalar `T: Scalar`.
//!
//! Nodes live in an arena with parent links, and every stored slot remembers
//! the leaf that holds it, so removal and in-place updates cost O(depth)
//! instead of a search from the root.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::types::{Aabb2D, Scalar, ScalarAcc, area, overlap_area, union_aabb};

/// R-tree backend with overlap-minimizing splits and condense-on-remove.
pub struct RTree<T: Scalar> {
    max_children: usize,
    min_children: usize,
    root: Option<usize>,
    nodes: Vec<RNode<T>>,
    free_nodes: Vec<usize>,
    /// Slot → leaf node currently holding it.
    leaf_of: Vec<Option<usize>>,
    len: usize,
}

#[derive(Clone, Debug)]
struct RNode<T> {
    bbox: Aabb2D<T>,
    parent: Option<usize>,
    children: Children<T>,
}

#[derive(Clone, Debug)]
enum Children<T> {
    Leaf(Vec<(usize, Aabb2D<T>)>),
    Inner(Vec<usize>),
}

impl<T> Children<T> {
    fn len(&self) -> usize {
        match self {
            Self::Leaf(items) => items.len(),
            Self::Inner(kids) => kids.len(),
        }
    }
}

impl<T: Scalar> Default for RTree<T> {
    fn default() -> Self {
        Self::with_fanout(8)
    }
}

impl<T: Scalar> RTree<T> {
    /// Create an empty tree whose nodes hold at most `max_children` entries.
    ///
    /// The minimum fill is derived as 40% of the maximum (at least 2).
    ///
    /// # Panics
    ///
    /// Panics if `max_children < 4`.
    pub fn with_fanout(max_children: usize) -> Self {
        assert!(
            max_children >= 4,
            "R-tree fanout must be at least 4, got {max_children}"
        );
        Self {
            max_children,
            min_children: (max_children * 2 / 5).max(2),
            root: None,
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            leaf_of: Vec::new(),
            len: 0,
        }
    }

    /// Number of stored slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no slots are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree (a single leaf root has depth 1).
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cur = self.root;
        while let Some(i) = cur {
            depth += 1;
            cur = match &self.nodes[i].children {
                Children::Inner(kids) => kids.first().copied(),
                Children::Leaf(_) => None,
            };
        }
        depth
    }

    fn alloc(&mut self, node: RNode<T>) -> usize {
        if let Some(idx) = self.free_nodes.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn free_node(&mut self, idx: usize) {
        self.nodes[idx].children = Children::Leaf(Vec::new());
        self.nodes[idx].parent = None;
        self.free_nodes.push(idx);
    }

    fn record_leaf(&mut self, slot: usize, leaf: usize) {
        if self.leaf_of.len() <= slot {
            self.leaf_of.resize(slot + 1, None);
        }
        self.leaf_of[slot] = Some(leaf);
    }

    fn children_bbox(nodes: &[RNode<T>], children: &Children<T>) -> Option<Aabb2D<T>> {
        match children {
            Children::Leaf(items) => items.iter().map(|(_, b)| *b).reduce(union_aabb),
            Children::Inner(kids) => kids.iter().map(|&k| nodes[k].bbox).reduce(union_aabb),
        }
    }

    fn refit(&mut self, idx: usize) {
        if let Some(bbox) = Self::children_bbox(&self.nodes, &self.nodes[idx].children) {
            self.nodes[idx].bbox = bbox;
        }
    }

    /// Descend from `root` picking the child needing the least enlargement
    /// (ties broken by smaller area).
    fn choose_leaf(&self, root: usize, bbox: &Aabb2D<T>) -> usize {
        let mut cur = root;
        while let Children::Inner(kids) = &self.nodes[cur].children {
            let mut best: Option<(usize, ScalarAcc<T>, ScalarAcc<T>)> = None;
            for &k in kids {
                let kb = self.nodes[k].bbox;
                let own = area(&kb);
                let grown = area(&union_aabb(kb, *bbox)) - own;
                if best.is_none_or(|(_, g, a)| grown < g || (grown == g && own < a)) {
                    best = Some((k, grown, own));
                }
            }
            match best {
                Some((k, _, _)) => cur = k,
                None => break,
            }
        }
        cur
    }

    fn insert_entry(&mut self, slot: usize, aabb: Aabb2D<T>) {
        let Some(root) = self.root else {
            let idx = self.alloc(RNode {
                bbox: aabb,
                parent: None,
                children: Children::Leaf(vec![(slot, aabb)]),
            });
            self.root = Some(idx);
            self.record_leaf(slot, idx);
            return;
        };
        let leaf = self.choose_leaf(root, &aabb);
        if let Children::Leaf(items) = &mut self.nodes[leaf].children {
            items.push((slot, aabb));
        }
        self.record_leaf(slot, leaf);
        self.adjust_upward(leaf);
    }

    /// Refit bounding boxes from `idx` to the root, splitting overflowing nodes
    /// and growing a new root when the old one splits.
    fn adjust_upward(&mut self, mut idx: usize) {
        loop {
            let sibling = if self.nodes[idx].children.len() > self.max_children {
                Some(self.split(idx))
            } else {
                self.refit(idx);
                None
            };
            match (self.nodes[idx].parent, sibling) {
                (Some(parent), Some(sibling)) => {
                    self.nodes[sibling].parent = Some(parent);
                    if let Children::Inner(kids) = &mut self.nodes[parent].children {
                        kids.push(sibling);
                    }
                    idx = parent;
                }
                (Some(parent), None) => idx = parent,
                (None, Some(sibling)) => {
                    let bbox = union_aabb(self.nodes[idx].bbox, self.nodes[sibling].bbox);
                    let root = self.alloc(RNode {
                        bbox,
                        parent: None,
                        children: Children::Inner(vec![idx, sibling]),
                    });
                    self.nodes[idx].parent = Some(root);
                    self.nodes[sibling].parent = Some(root);
                    self.root = Some(root);
                    return;
                }
                (None, None) => return,
            }
        }
    }

    /// Split an overflowing node in two; the original keeps the left half and the
    /// returned sibling (not yet attached to a parent) takes the right half.
    fn split(&mut self, idx: usize) -> usize {
        let children = core::mem::replace(&mut self.nodes[idx].children, Children::Leaf(Vec::new()));
        let min = self.min_children;
        let (left, right) = match children {
            Children::Leaf(items) => {
                let (l, r) = partition(items, |(_, b)| *b, min);
                (Children::Leaf(l), Children::Leaf(r))
            }
            Children::Inner(kids) => {
                let nodes = &self.nodes;
                let (l, r) = partition(kids, |&k| nodes[k].bbox, min);
                (Children::Inner(l), Children::Inner(r))
            }
        };
        let right_bbox = Self::children_bbox(&self.nodes, &right).unwrap_or(self.nodes[idx].bbox);
        self.nodes[idx].children = left;
        self.refit(idx);

        let parent = self.nodes[idx].parent;
        let sibling = self.alloc(RNode {
            bbox: right_bbox,
            parent,
            children: right,
        });
        match &self.nodes[sibling].children {
            Children::Leaf(items) => {
                for &(slot, _) in items {
                    self.leaf_of[slot] = Some(sibling);
                }
            }
            Children::Inner(kids) => {
                let kids = kids.clone();
                for k in kids {
                    self.nodes[k].parent = Some(sibling);
                }
            }
        }
        sibling
    }

    /// Walk from a leaf that lost an entry to the root, dissolving underfull nodes
    /// and reinserting their entries.
    fn condense(&mut self, start: usize) {
        let mut orphans = Vec::new();
        let mut cur = start;
        while let Some(parent) = self.nodes[cur].parent {
            if self.nodes[cur].children.len() < self.min_children {
                if let Children::Inner(kids) = &mut self.nodes[parent].children {
                    kids.retain(|&k| k != cur);
                }
                self.drain_subtree(cur, &mut orphans);
            } else {
                self.refit(cur);
            }
            cur = parent;
        }
        self.shrink_root(cur);
        for (slot, aabb) in orphans {
            self.insert_entry(slot, aabb);
        }
    }

    fn shrink_root(&mut self, root: usize) {
        if self.nodes[root].children.len() == 0 {
            self.free_node(root);
            self.root = None;
            return;
        }
        let only_child = match &self.nodes[root].children {
            Children::Inner(kids) if kids.len() == 1 => Some(kids[0]),
            _ => None,
        };
        if let Some(child) = only_child {
            self.free_node(root);
            self.nodes[child].parent = None;
            self.root = Some(child);
        } else {
            self.refit(root);
        }
    }

    fn drain_subtree(&mut self, idx: usize, out: &mut Vec<(usize, Aabb2D<T>)>) {
        let children = core::mem::replace(&mut self.nodes[idx].children, Children::Leaf(Vec::new()));
        match children {
            Children::Leaf(items) => {
                for (slot, aabb) in items {
                    self.leaf_of[slot] = None;
                    out.push((slot, aabb));
                }
            }
            Children::Inner(kids) => {
                for k in kids {
                    self.drain_subtree(k, out);
                }
            }
        }
        self.free_node(idx);
    }

    #[cfg(test)]
    fn validate(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0, "empty tree must have no slots");
            return;
        };
        assert!(self.nodes[root].parent.is_none(), "root has no parent");
        let mut count = 0;
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            match &node.children {
                Children::Leaf(items) => {
                    for &(slot, b) in items {
                        assert!(node.bbox.contains(&b), "leaf bbox must cover entries");
                        assert_eq!(self.leaf_of[slot], Some(i), "leaf_of must point at holder");
                        count += 1;
                    }
                }
                Children::Inner(kids) => {
                    assert!(!kids.is_empty(), "inner nodes are never empty");
                    for &k in kids {
                        assert_eq!(self.nodes[k].parent, Some(i), "parent link mismatch");
                        assert!(node.bbox.contains(&self.nodes[k].bbox), "bbox must cover kids");
                        stack.push(k);
                    }
                }
            }
        }
        assert_eq!(count, self.len, "every slot is stored exactly once");
    }
}

/// Split `items` into two groups of at least `min` each.
///
/// Both axes are tried with items ordered by centroid; the cut with the least
/// overlap between the two halves wins, then the smaller combined area.
fn partition<T: Scalar, I: Copy>(
    items: Vec<I>,
    bbox_of: impl Fn(&I) -> Aabb2D<T>,
    min: usize,
) -> (Vec<I>, Vec<I>) {
    let n = items.len();
    debug_assert!(n >= 2 * min, "partition needs at least {} items", 2 * min);
    let mut best: Option<(ScalarAcc<T>, ScalarAcc<T>, Vec<I>, usize)> = None;
    for axis in 0..2 {
        let mut sorted = items.clone();
        sorted.sort_by(|a, b| {
            let (ba, bb) = (bbox_of(a), bbox_of(b));
            let (ca, cb) = if axis == 0 {
                (T::mid(ba.min_x, ba.max_x), T::mid(bb.min_x, bb.max_x))
            } else {
                (T::mid(ba.min_y, ba.max_y), T::mid(bb.min_y, bb.max_y))
            };
            T::total_cmp(ca, cb)
        });

        let mut prefix: Vec<Aabb2D<T>> = Vec::with_capacity(n);
        for item in &sorted {
            let b = bbox_of(item);
            prefix.push(prefix.last().map_or(b, |&acc| union_aabb(acc, b)));
        }
        let mut suffix: Vec<Aabb2D<T>> = Vec::with_capacity(n);
        for item in sorted.iter().rev() {
            let b = bbox_of(item);
            suffix.push(suffix.last().map_or(b, |&acc| union_aabb(acc, b)));
        }
        suffix.reverse();

        for k in min..=(n - min) {
            let (l, r) = (prefix[k - 1], suffix[k]);
            let overlap = overlap_area(&l, &r);
            let total = area(&l) + area(&r);
            let better = best
                .as_ref()
                .is_none_or(|(o, t, _, _)| overlap < *o || (overlap == *o && total < *t));
            if better {
                best = Some((overlap, total, sorted.clone(), k));
            }
        }
    }
    let (_, _, mut sorted, k) = best.unwrap_or_else(|| (T::acc_zero(), T::acc_zero(), items, n / 2));
    let right = sorted.split_off(k);
    (sorted, right)
}

impl<T: Scalar> Backend<T> for RTree<T> {
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>) {
        if self.leaf_of.get(slot).copied().flatten().is_some() {
            self.update(slot, aabb);
            return;
        }
        self.insert_entry(slot, aabb);
        self.len += 1;
    }

    fn update(&mut self, slot: usize, aabb: Aabb2D<T>) {
        let Some(leaf) = self.leaf_of.get(slot).copied().flatten() else {
            self.insert(slot, aabb);
            return;
        };
        if self.nodes[leaf].bbox.contains(&aabb) {
            if let Children::Leaf(items) = &mut self.nodes[leaf].children
                && let Some(item) = items.iter_mut().find(|(s, _)| *s == slot)
            {
                item.1 = aabb;
            }
            // Boxes on the path can only shrink; refit up to the root.
            let mut cur = Some(leaf);
            while let Some(i) = cur {
                self.refit(i);
                cur = self.nodes[i].parent;
            }
            return;
        }
        self.remove(slot);
        self.insert(slot, aabb);
    }

    fn remove(&mut self, slot: usize) {
        let Some(leaf) = self.leaf_of.get_mut(slot).and_then(Option::take) else {
            return;
        };
        if let Children::Leaf(items) = &mut self.nodes[leaf].children {
            items.retain(|(s, _)| *s != slot);
        }
        self.len -= 1;
        self.condense(leaf);
    }

    fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
        self.free_nodes.clear();
        self.leaf_of.clear();
        self.len = 0;
    }

    fn visit_rect(&self, rect: Aabb2D<T>, f: &mut dyn FnMut(usize)) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut visited = 0;
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            visited += 1;
            let node = &self.nodes[i];
            if !node.bbox.intersects(&rect) {
                continue;
            }
            match &node.children {
                Children::Leaf(items) => {
                    for (slot, b) in items {
                        if b.intersects(&rect) {
                            f(*slot);
                        }
                    }
                }
                Children::Inner(kids) => {
                    stack.extend(
                        kids.iter()
                            .copied()
                            .filter(|&k| self.nodes[k].bbox.intersects(&rect)),
                    );
                }
            }
        }
        visited
    }

    fn bounds(&self) -> Option<Aabb2D<T>> {
        self.root.map(|r| self.nodes[r].bbox)
    }
}

impl<T: Scalar> Debug for RTree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTree")
            .field("max_children", &self.max_children)
            .field("min_children", &self.min_children)
            .field("arena_nodes", &(self.nodes.len() - self.free_nodes.len()))
            .field("len", &self.len)
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

/// R-tree with f32 coordinates and f64 metrics.
pub type RTreeF32 = RTree<f32>;

/// R-tree with f64 coordinates and f64 metrics.
pub type RTreeF64 = RTree<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(tree: &RTree<f64>, rect: Aabb2D<f64>) -> Vec<usize> {
        let mut out = Vec::new();
        tree.visit_rect(rect, &mut |s| out.push(s));
        out.sort_unstable();
        out
    }

    fn grid(tree: &mut RTree<f64>, side: usize) {
        for i in 0..side * side {
            let x = (i % side) as f64 * 20.0;
            let y = (i / side) as f64 * 20.0;
            tree.insert(i, Aabb2D::<f64>::from_xywh(x, y, 10.0, 10.0));
        }
    }

    #[test]
    fn insert_and_query_splits_correctly() {
        let mut tree = RTree::<f64>::default();
        grid(&mut tree, 20);
        tree.validate();
        assert_eq!(tree.len(), 400);
        assert!(tree.depth() >= 3, "400 entries with fanout 8 need several levels");

        assert_eq!(collect(&tree, Aabb2D::point(5.0, 5.0)), vec![0]);
        assert_eq!(collect(&tree, Aabb2D::point(15.0, 5.0)), Vec::<usize>::new());
        assert_eq!(collect(&tree, Aabb2D::new(0.0, 0.0, 25.0, 5.0)), vec![0, 1]);
    }

    #[test]
    fn removal_condenses_and_keeps_others_reachable() {
        let mut tree = RTree::<f64>::default();
        grid(&mut tree, 10);
        for slot in (0..100).step_by(3) {
            tree.remove(slot);
        }
        tree.validate();
        for slot in 0..100 {
            let x = (slot % 10) as f64 * 20.0 + 5.0;
            let y = (slot / 10) as f64 * 20.0 + 5.0;
            let hits = collect(&tree, Aabb2D::point(x, y));
            if slot % 3 == 0 {
                assert!(hits.is_empty(), "slot {slot} was removed");
            } else {
                assert_eq!(hits, vec![slot]);
            }
        }
        for slot in 0..100 {
            tree.remove(slot);
        }
        tree.validate();
        assert!(tree.is_empty());
        assert_eq!(tree.bounds(), None);
    }

    #[test]
    fn update_moves_entry_in_place_or_reinserts() {
        let mut tree = RTree::<f64>::default();
        grid(&mut tree, 6);
        // Shrink within the holder leaf.
        tree.update(7, Aabb2D::<f64>::from_xywh(21.0, 21.0, 2.0, 2.0));
        tree.validate();
        assert_eq!(collect(&tree, Aabb2D::point(22.0, 22.0)), vec![7]);
        assert!(collect(&tree, Aabb2D::point(29.0, 29.0)).is_empty());
        // Move far away, forcing a reinsert.
        tree.update(7, Aabb2D::<f64>::from_xywh(1000.0, 1000.0, 5.0, 5.0));
        tree.validate();
        assert_eq!(collect(&tree, Aabb2D::point(1002.0, 1002.0)), vec![7]);
        assert_eq!(tree.len(), 36);
    }

    #[test]
    fn query_visits_far_fewer_nodes_than_entries() {
        let mut tree = RTree::<f64>::default();
        grid(&mut tree, 50);
        let visited = tree.visit_rect(Aabb2D::new(0.0, 0.0, 30.0, 30.0), &mut |_| {});
        assert!(visited < 100, "visited {visited} nodes for a corner query");
    }

    #[test]
    fn splits_tolerate_empty_sentinel_entries() {
        // The sentinel's centroid is NaN; ordering it must not disturb splits.
        let mut tree = RTree::<f64>::default();
        for i in 0..64 {
            let x = i as f64 * 20.0;
            tree.insert(2 * i, Aabb2D::<f64>::from_xywh(x, 0.0, 10.0, 10.0));
            tree.insert(2 * i + 1, Aabb2D::<f64>::EMPTY);
        }
        assert_eq!(tree.len(), 128);
        for i in 0..64 {
            let x = i as f64 * 20.0 + 5.0;
            assert_eq!(collect(&tree, Aabb2D::point(x, 5.0)), vec![2 * i]);
        }
        for i in 0..64 {
            tree.remove(2 * i + 1);
        }
        tree.validate();
        assert_eq!(tree.len(), 64);
    }

    #[test]
    fn bounds_track_contents() {
        let mut tree = RTree::<f32>::default();
        tree.insert(0, Aabb2D::<f32>::from_xywh(0.0, 0.0, 1.0, 1.0));
        tree.insert(1, Aabb2D::<f32>::from_xywh(-5.0, 3.0, 1.0, 1.0));
        assert_eq!(tree.bounds(), Some(Aabb2D::new(-5.0, 0.0, 1.0, 4.0)));
        tree.remove(1);
        assert_eq!(tree.bounds(), Some(Aabb2D::new(0.0, 0.0, 1.0, 1.0)));
    }
}
