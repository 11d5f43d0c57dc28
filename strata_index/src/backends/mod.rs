// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different spatial strategies.
//!
//! - `flatvec`: flat vector with linear scans (small, simple, used as a reference).
//! - `rtree`: generic R-tree (`T: Scalar`) with overlap-minimizing splits
//!   (aliases: `RTreeF32`, `RTreeF64`).
//!
//! Split heuristic
//! ---------------
//! An overflowing node sorts its entries by centroid along each axis and
//! evaluates every cut `k` leaving at least the minimum fill on both sides.
//! Prefix/suffix bounding boxes make each axis O(n). The cut with the least
//! overlap between the two halves wins; ties go to the smaller summed area.
//! Areas use widened accumulators (`f32`→`f64`).

pub mod flatvec;
pub mod rtree;

pub use flatvec::FlatVec;
pub use rtree::{RTree, RTreeF32, RTreeF64};
