// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for spatial indexing implementations.

use crate::types::Aabb2D;
use core::fmt::Debug;

/// Spatial backend abstraction used by [`IndexGeneric`](crate::IndexGeneric).
///
/// Backends only see dense slot numbers; payloads and generations live in the index.
pub trait Backend<T: Copy + PartialOrd + Debug> {
    /// Insert a new slot into the spatial structure.
    fn insert(&mut self, slot: usize, aabb: Aabb2D<T>);

    /// Update an existing slot's AABB.
    fn update(&mut self, slot: usize, aabb: Aabb2D<T>);

    /// Remove a slot from the spatial structure. Unknown slots are ignored.
    fn remove(&mut self, slot: usize);

    /// Clear all spatial structures.
    fn clear(&mut self);

    /// Call `f` for every slot whose AABB intersects `rect`.
    ///
    /// Returns the number of structural elements examined (tree nodes for hierarchical
    /// backends, entries for linear ones) so callers can account for query cost.
    fn visit_rect(&self, rect: Aabb2D<T>, f: &mut dyn FnMut(usize)) -> usize;

    /// Call `f` for every slot whose AABB contains the point.
    fn visit_point(&self, x: T, y: T, f: &mut dyn FnMut(usize)) -> usize {
        self.visit_rect(Aabb2D::point(x, y), f)
    }

    /// Union of every stored AABB, or `None` when empty.
    fn bounds(&self) -> Option<Aabb2D<T>>;
}
