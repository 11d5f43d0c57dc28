// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decomposed local transform with a cached, versioned matrix.

use kurbo::{Affine, Vec2};

/// Position, non-uniform scale and rotation of a node relative to its parent.
///
/// The composed matrix is `translate · rotate · scale` and is only recomputed
/// after a setter actually changed something. Each recomputation bumps
/// [`version`](Self::version), so dependents can key caches on it.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineTransform {
    position: Vec2,
    scale: Vec2,
    rotation: f64,
    local: Affine,
    dirty: bool,
    version: u64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            local: Affine::IDENTITY,
            dirty: false,
            version: 0,
        }
    }
}

impl AffineTransform {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform with every component given.
    pub fn from_parts(position: Vec2, scale: Vec2, rotation: f64) -> Self {
        let mut t = Self::default();
        t.set_all(position, scale, rotation);
        t
    }

    /// Position relative to the parent.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Non-uniform scale.
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Rotation in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Number of times the local matrix has been recomputed.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether a setter changed a component since the matrix was last computed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set the position. Returns `false` when the value is unchanged.
    pub fn set_position(&mut self, x: f64, y: f64) -> bool {
        debug_assert!(x.is_finite() && y.is_finite(), "non-finite position");
        let p = Vec2::new(x, y);
        if p == self.position {
            return false;
        }
        self.position = p;
        self.dirty = true;
        true
    }

    /// Set the scale. Returns `false` when the value is unchanged.
    pub fn set_scale(&mut self, sx: f64, sy: f64) -> bool {
        debug_assert!(sx.is_finite() && sy.is_finite(), "non-finite scale");
        let s = Vec2::new(sx, sy);
        if s == self.scale {
            return false;
        }
        self.scale = s;
        self.dirty = true;
        true
    }

    /// Set the rotation in radians. Returns `false` when the value is unchanged.
    pub fn set_rotation(&mut self, radians: f64) -> bool {
        debug_assert!(radians.is_finite(), "non-finite rotation");
        if radians == self.rotation {
            return false;
        }
        self.rotation = radians;
        self.dirty = true;
        true
    }

    /// Set every component at once, dirtying at most once.
    pub fn set_all(&mut self, position: Vec2, scale: Vec2, rotation: f64) -> bool {
        let moved = self.set_position(position.x, position.y);
        let scaled = self.set_scale(scale.x, scale.y);
        let rotated = self.set_rotation(rotation);
        moved || scaled || rotated
    }

    fn compose(&self) -> Affine {
        Affine::translate(self.position)
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }

    /// The local matrix, recomputing it first if a component changed.
    pub fn local_matrix(&mut self) -> Affine {
        if self.dirty {
            self.local = self.compose();
            self.version += 1;
            self.dirty = false;
        }
        self.local
    }

    /// The local matrix without touching the cache.
    ///
    /// Equal to [`local_matrix`](Self::local_matrix) but composes on the fly while dirty.
    pub fn matrix(&self) -> Affine {
        if self.dirty { self.compose() } else { self.local }
    }

    /// `parent · local`, or the local matrix for a root.
    pub fn world_matrix(&mut self, parent: Option<Affine>) -> Affine {
        let local = self.local_matrix();
        match parent {
            Some(p) => p * local,
            None => local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;
    use kurbo::Point;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn unchanged_values_do_not_dirty() {
        let mut t = AffineTransform::new();
        assert!(!t.set_position(0.0, 0.0));
        assert!(!t.set_scale(1.0, 1.0));
        assert!(!t.set_rotation(0.0));
        assert!(!t.is_dirty());
        assert!(t.set_position(3.0, 4.0));
        assert!(t.is_dirty());
    }

    #[test]
    fn version_bumps_once_per_recompute() {
        let mut t = AffineTransform::new();
        t.set_position(1.0, 2.0);
        t.set_rotation(0.5);
        let _ = t.local_matrix();
        let _ = t.local_matrix();
        assert_eq!(t.version(), 1);
        t.set_scale(2.0, 2.0);
        let _ = t.local_matrix();
        assert_eq!(t.version(), 2);
    }

    #[test]
    fn composition_is_translate_rotate_scale() {
        let mut t = AffineTransform::from_parts(Vec2::new(10.0, 0.0), Vec2::new(2.0, 1.0), FRAC_PI_2);
        let m = t.local_matrix();
        // Scale x by 2, rotate +90° (x → y), then translate.
        assert!(close(m * Point::new(1.0, 0.0), Point::new(10.0, 2.0)));
        assert_eq!(t.matrix(), m);
    }

    #[test]
    fn world_matrix_composes_parent_first() {
        let mut t = AffineTransform::new();
        t.set_position(5.0, 5.0);
        let parent = Affine::scale(2.0);
        let w = t.world_matrix(Some(parent));
        assert!(close(w * Point::ORIGIN, Point::new(10.0, 10.0)));
        assert_eq!(t.world_matrix(None), Affine::translate((5.0, 5.0)));
    }
}
