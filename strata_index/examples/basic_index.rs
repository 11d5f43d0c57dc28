// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Strata Index: insert, update, remove, and query with visit counts.

use strata_index::{Aabb2D, Index};

fn main() {
    let mut idx = Index::<f64, u32>::with_rtree_fanout(4);
    let k1 = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
    let k2 = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), 2);
    for i in 3..40_u32 {
        let x = f64::from(i) * 20.0;
        idx.insert(Aabb2D::new(x, 0.0, x + 10.0, 10.0), i);
    }

    let hits: Vec<_> = idx.query_point(6.0, 6.0).map(|(_, p)| p).collect();
    println!("hits at (6,6): {hits:?}");

    // Move box 1 away; the stale overlap disappears.
    idx.update(k1, Aabb2D::new(20.0, 20.0, 30.0, 30.0));
    let hits: Vec<_> = idx.query_point(6.0, 6.0).map(|(_, p)| p).collect();
    println!("after move, hits at (6,6): {hits:?}");

    let mut found = 0;
    let visited = idx.visit_rect(Aabb2D::new(400.0, 0.0, 450.0, 10.0), |_, _, _| found += 1);
    println!("{found} boxes found, {visited} tree nodes visited of {} entries", idx.len());

    println!("removed payload {:?}; key still valid: {}", idx.remove(k2), idx.contains_key(k2));
    println!("bounds: {:?}", idx.bounds());
}
