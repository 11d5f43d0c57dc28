// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulated repaint regions.

use alloc::vec::Vec;
use kurbo::Rect;

/// Rect count past which the accumulated damage collapses to its union.
pub const MAX_DAMAGE_RECTS: usize = 8;

/// World-space regions that need repainting since the last
/// [`Scene::take_damage`](crate::Scene::take_damage).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Damage {
    /// Damaged world-space rectangles.
    ///
    /// No rect is covered by another, and there are at most
    /// [`MAX_DAMAGE_RECTS`] of them.
    pub rects: Vec<Rect>,
    /// Everything must be repainted; `rects` is irrelevant.
    pub full: bool,
}

impl Damage {
    /// True when nothing needs repainting.
    pub fn is_empty(&self) -> bool {
        !self.full && self.rects.is_empty()
    }

    /// Returns the union of all damage rects.
    ///
    /// `None` when there are no rects; check [`full`](Self::full) separately.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    pub(crate) fn add_rect(&mut self, rect: Rect) {
        if self.full || !(rect.width() >= 0.0 && rect.height() >= 0.0) {
            return;
        }
        if self.rects.iter().any(|r| covers(*r, rect)) {
            return;
        }
        self.rects.retain(|r| !covers(rect, *r));
        self.rects.push(rect);
        if self.rects.len() > MAX_DAMAGE_RECTS {
            if let Some(union) = self.union_rect() {
                self.rects.clear();
                self.rects.push(union);
            }
        }
    }

    pub(crate) fn add_full(&mut self) {
        self.full = true;
        self.rects.clear();
    }
}

fn covers(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}
