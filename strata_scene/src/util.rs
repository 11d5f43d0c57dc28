// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry conversions shared by the update pass and queries.

use kurbo::{Affine, Point, Rect, Size};
use strata_index::Aabb2D;

/// Transform an axis-aligned `Rect` by an `Affine` and return the AABB of the
/// four transformed corners.
pub(crate) fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let p0 = affine * Point::new(rect.x0, rect.y0);
    let p1 = affine * Point::new(rect.x1, rect.y0);
    let p2 = affine * Point::new(rect.x0, rect.y1);
    let p3 = affine * Point::new(rect.x1, rect.y1);
    let min_x = p0.x.min(p1.x).min(p2.x).min(p3.x);
    let min_y = p0.y.min(p1.y).min(p2.y).min(p3.y);
    let max_x = p0.x.max(p1.x).max(p2.x).max(p3.x);
    let max_y = p0.y.max(p1.y).max(p2.y).max(p3.y);
    Rect::new(min_x, min_y, max_x, max_y)
}

/// Transform an AABB, keeping the empty sentinel empty.
pub(crate) fn transform_aabb(affine: Affine, aabb: Aabb2D<f64>) -> Aabb2D<f64> {
    if aabb.is_empty() {
        return Aabb2D::<f64>::EMPTY;
    }
    rect_to_aabb(transform_rect_bbox(affine, aabb_to_rect(aabb)))
}

/// The `[0, w] × [0, h]` content box, or the empty sentinel for a zero-size node.
pub(crate) fn own_box(size: Size) -> Aabb2D<f64> {
    if size.width <= 0.0 || size.height <= 0.0 {
        Aabb2D::<f64>::EMPTY
    } else {
        Aabb2D::new(0.0, 0.0, size.width, size.height)
    }
}

pub(crate) fn rect_to_aabb(r: Rect) -> Aabb2D<f64> {
    Aabb2D::new(r.x0, r.y0, r.x1, r.y1)
}

pub(crate) fn aabb_to_rect(a: Aabb2D<f64>) -> Rect {
    Rect::new(a.min_x, a.min_y, a.max_x, a.max_y)
}

/// Inverse of `affine`, or `None` when it is singular or not finite.
pub(crate) fn invert(affine: Affine) -> Option<Affine> {
    let det = affine.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some(affine.inverse())
}
