// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strata Index: a generic 2D AABB index.
//!
//! Strata Index is the spatial building block under the Strata scene graph.
//!
//! - Insert, update, and remove axis-aligned bounding boxes (AABBs) with user payloads.
//! - Query by point or intersecting rectangle.
//! - Count the backend nodes a query examined, for cost instrumentation.
//!
//! It is generic over the scalar type `T` and does not depend on any geometry crate.
//! Higher layers compute boxes in whatever frame they like (the scene stores each
//! container's children in that container's local space) and feed them here.
//!
//! Backends are pluggable via a simple trait so you can swap the spatial strategy
//! without API churn. The default backend is a flat vector (linear scan); the
//! R-tree backend is what the scene uses.
//!
//! # Example
//!
//! ```rust
//! use strata_index::{Aabb2D, Index, RTreeIndex};
//!
//! let mut idx: RTreeIndex<f64, u32> = Index::with_rtree();
//! let k1 = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
//! let _k2 = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), 2);
//!
//! // Move the first box; the change is visible to the next query.
//! idx.update(k1, Aabb2D::new(20.0, 0.0, 30.0, 10.0));
//!
//! let hits: Vec<_> = idx.query_point(6.0, 6.0).collect();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].1, 2);
//!
//! // Visiting reports how many tree nodes were examined.
//! let mut found = 0;
//! let visited = idx.visit_rect(Aabb2D::new(0.0, 0.0, 100.0, 100.0), |_, _, _| found += 1);
//! assert_eq!(found, 2);
//! assert!(visited >= 1);
//! ```
//!
//! ## Choosing a backend
//!
//! - `FlatVec` (default): simplest and smallest, linear scans. Good for very small sets
//!   and as a reference when validating other backends.
//! - `RTreeF32`/`RTreeF64`: R-tree with overlap-minimizing splits, O(depth) removal and
//!   in-place updates for boxes that stay inside their leaf. See the [`backends`] docs.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Boxes are closed, so a
//! point on an edge hits, and inverted boxes (such as [`Aabb2D::EMPTY`](Aabb2D)) never
//! intersect anything.

#![no_std]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod index;
pub mod types;

pub use backend::Backend;
pub use backends::flatvec::FlatVec;
pub use backends::rtree::{RTree, RTreeF32, RTreeF64};
pub use index::{Index, IndexGeneric, Key, RTreeIndex};
pub use types::{Aabb2D, Scalar};
