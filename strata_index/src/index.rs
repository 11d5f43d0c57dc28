// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `Index` API and generic implementation over a pluggable backend.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::Backend;
use crate::backends::flatvec::FlatVec;
use crate::backends::rtree::RTree;
use crate::types::{Aabb2D, Scalar};

/// Generational handle for entries.
///
/// A key stays invalid once its entry is removed, even after the slot is reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index keys are 32-bit; more than u32::MAX live entries is unsupported."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Slot<T, P> {
    generation: u32,
    value: Option<(Aabb2D<T>, P)>,
}

/// A generic AABB index parameterized by a spatial backend.
///
/// Changes are applied to the backend immediately, so queries always observe
/// the latest boxes.
#[derive(Debug)]
pub struct IndexGeneric<T: Copy + PartialOrd + Debug, P: Copy + Debug, B: Backend<T>> {
    slots: Vec<Slot<T, P>>,
    free_list: Vec<usize>,
    len: usize,
    backend: B,
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T> + Default,
{
    /// Create an empty index using the backend's default constructor.
    pub fn new() -> Self {
        Self::with_backend(B::default())
    }
}

impl<T, P, B> Default for IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, B> IndexGeneric<T, P, B>
where
    T: Copy + PartialOrd + Debug,
    P: Copy + Debug,
    B: Backend<T>,
{
    /// Create an empty index around an explicitly configured backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            backend,
        }
    }

    /// Reserve space for at least `n` entries.
    pub fn reserve(&mut self, n: usize) {
        self.slots.reserve(n);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a new AABB with payload. Returns a stable handle `Key`.
    pub fn insert(&mut self, aabb: Aabb2D<T>, payload: P) -> Key {
        let idx = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.value = Some((aabb, payload));
            idx
        } else {
            self.slots.push(Slot {
                generation: 1,
                value: Some((aabb, payload)),
            });
            self.slots.len() - 1
        };
        self.backend.insert(idx, aabb);
        self.len += 1;
        Key::new(idx, self.slots[idx].generation)
    }

    /// Replace the AABB of a live entry. Returns `false` for stale keys.
    pub fn update(&mut self, key: Key, aabb: Aabb2D<T>) -> bool {
        let Some((stored, _)) = self.value_mut(key) else {
            return false;
        };
        if *stored != aabb {
            *stored = aabb;
            self.backend.update(key.idx(), aabb);
        }
        true
    }

    /// Remove an entry, returning its payload. Stale keys return `None`.
    pub fn remove(&mut self, key: Key) -> Option<P> {
        let (_, payload) = self.value_mut(key).map(|v| *v)?;
        self.slots[key.idx()].value = None;
        self.free_list.push(key.idx());
        self.backend.remove(key.idx());
        self.len -= 1;
        Some(payload)
    }

    /// The stored AABB and payload for `key`, if it is still live.
    pub fn get(&self, key: Key) -> Option<(Aabb2D<T>, P)> {
        let slot = self.slots.get(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.value
    }

    /// Whether `key` refers to a live entry.
    pub fn contains_key(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Clear the index. Outstanding keys become stale.
    pub fn clear(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                self.free_list.push(idx);
            }
        }
        self.len = 0;
        self.backend.clear();
    }

    /// Union of every stored AABB, or `None` when empty.
    pub fn bounds(&self) -> Option<Aabb2D<T>> {
        self.backend.bounds()
    }

    /// Iterate over all live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Aabb2D<T>, P)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.value
                .map(|(aabb, payload)| (Key::new(idx, slot.generation), aabb, payload))
        })
    }

    /// Call `f` for each entry whose AABB intersects `rect`.
    ///
    /// Returns the number of backend nodes examined, which is what query cost
    /// instrumentation should count.
    pub fn visit_rect(&self, rect: Aabb2D<T>, mut f: impl FnMut(Key, Aabb2D<T>, P)) -> usize {
        let slots = &self.slots;
        self.backend.visit_rect(rect, &mut |idx| {
            if let Some(slot) = slots.get(idx)
                && let Some((aabb, payload)) = slot.value
            {
                f(Key::new(idx, slot.generation), aabb, payload);
            }
        })
    }

    /// Call `f` for each entry whose AABB contains the point.
    pub fn visit_point(&self, x: T, y: T, f: impl FnMut(Key, Aabb2D<T>, P)) -> usize {
        self.visit_rect(Aabb2D::point(x, y), f)
    }

    /// Query for entries whose AABB contains the point.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = (Key, P)> + '_ {
        self.query_rect(Aabb2D::point(x, y))
    }

    /// Query for entries whose AABB intersects the given rectangle.
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut out = Vec::new();
        self.visit_rect(rect, |key, _, payload| out.push((key, payload)));
        out.into_iter()
    }

    fn value_mut(&mut self, key: Key) -> Option<&mut (Aabb2D<T>, P)> {
        let slot = self.slots.get_mut(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.value.as_mut()
    }
}

/// Default index using a flat vector backend.
pub type Index<T, P> = IndexGeneric<T, P, FlatVec<T>>;

/// Index backed by an R-tree.
pub type RTreeIndex<T, P> = IndexGeneric<T, P, RTree<T>>;

impl<T: Scalar, P: Copy + Debug> Index<T, P> {
    /// Create an R-tree-backed index with the default fanout.
    pub fn with_rtree() -> RTreeIndex<T, P> {
        RTreeIndex::new()
    }

    /// Create an R-tree-backed index whose nodes hold at most `max_children` entries.
    pub fn with_rtree_fanout(max_children: usize) -> RTreeIndex<T, P> {
        RTreeIndex::with_backend(RTree::with_fanout(max_children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Small deterministic generator so differential tests need no extra crates.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }

        fn coord(&mut self, range: u64) -> f64 {
            (self.next() % range) as f64
        }
    }

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    #[test]
    fn insert_update_remove_and_query() {
        let mut idx: Index<f64, u32> = Index::new();
        let k1 = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
        let _k2 = idx.insert(Aabb2D::new(20.0, 20.0, 30.0, 30.0), 2);
        assert!(idx.update(k1, Aabb2D::new(5.0, 5.0, 15.0, 15.0)));

        let hits: Vec<_> = idx.query_point(6.0, 6.0).collect();
        assert_eq!(hits, vec![(k1, 1)]);
        assert_eq!(idx.query_point(1.0, 1.0).count(), 0);

        assert_eq!(idx.remove(k1), Some(1));
        assert_eq!(idx.query_point(6.0, 6.0).count(), 0);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn stale_keys_are_rejected_after_slot_reuse() {
        let mut idx: RTreeIndex<f64, u32> = Index::with_rtree();
        let old = idx.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 7);
        assert_eq!(idx.remove(old), Some(7));
        let new = idx.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 8);
        assert_ne!(old, new, "reused slot must get a fresh generation");
        assert_eq!(idx.remove(old), None);
        assert!(!idx.update(old, Aabb2D::new(5.0, 5.0, 6.0, 6.0)));
        assert_eq!(idx.get(new), Some((Aabb2D::new(0.0, 0.0, 1.0, 1.0), 8)));
    }

    #[test]
    fn clear_invalidates_keys_and_bounds() {
        let mut idx: RTreeIndex<f32, u8> = Index::with_rtree();
        let k = idx.insert(Aabb2D::new(0.0, 0.0, 4.0, 4.0), 0);
        assert_eq!(idx.bounds(), Some(Aabb2D::new(0.0, 0.0, 4.0, 4.0)));
        idx.clear();
        assert!(idx.is_empty());
        assert!(!idx.contains_key(k));
        assert_eq!(idx.bounds(), None);
        assert_eq!(idx.query_point(1.0, 1.0).count(), 0);
    }

    #[test]
    fn rtree_matches_flat_vec_under_random_edits() {
        let mut rng = Lcg(0x5eed);
        let mut flat: Index<f64, u32> = Index::new();
        let mut tree: RTreeIndex<f64, u32> = Index::with_rtree();
        let mut live: Vec<(Key, Key)> = Vec::new();

        for step in 0..2_000_u32 {
            match rng.next() % 4 {
                0 | 1 => {
                    let (x, y) = (rng.coord(1_000), rng.coord(1_000));
                    let (w, h) = (rng.coord(60), rng.coord(60));
                    let aabb = Aabb2D::new(x, y, x + w, y + h);
                    live.push((flat.insert(aabb, step), tree.insert(aabb, step)));
                }
                2 if !live.is_empty() => {
                    let (fk, tk) = live[(rng.next() as usize) % live.len()];
                    let (x, y) = (rng.coord(1_000), rng.coord(1_000));
                    let aabb = Aabb2D::new(x, y, x + 10.0, y + 10.0);
                    assert!(flat.update(fk, aabb));
                    assert!(tree.update(tk, aabb));
                }
                3 if !live.is_empty() => {
                    let (fk, tk) = live.swap_remove((rng.next() as usize) % live.len());
                    assert_eq!(flat.remove(fk), tree.remove(tk));
                }
                _ => {}
            }

            if step % 50 == 0 {
                let (x, y) = (rng.coord(1_000), rng.coord(1_000));
                let q = Aabb2D::new(x, y, x + 150.0, y + 150.0);
                let a = sorted(flat.query_rect(q).map(|(_, p)| p).collect());
                let b = sorted(tree.query_rect(q).map(|(_, p)| p).collect());
                assert_eq!(a, b, "query {q:?} diverged at step {step}");
            }
        }
        assert_eq!(flat.len(), tree.len());
        assert_eq!(flat.bounds(), tree.bounds());
    }

    #[test]
    fn visit_reports_backend_cost() {
        let mut flat: Index<f64, u32> = Index::new();
        for i in 0..10 {
            let x = f64::from(i) * 10.0;
            flat.insert(Aabb2D::new(x, 0.0, x + 5.0, 5.0), i);
        }
        let mut seen = Vec::new();
        let visited = flat.visit_point(12.0, 2.0, |_, _, p| seen.push(p));
        assert_eq!(seen, vec![1]);
        assert_eq!(visited, 10, "flat scans examine every entry");
    }
}
