// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instrumentation counters.

/// Work counters accumulated across update passes and queries.
///
/// Reset with [`Scene::reset_stats`](crate::Scene::reset_stats).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Nodes the update pass did not skip.
    pub update_visits: usize,
    /// Children returned by container index searches during culling.
    pub cull_candidates: usize,
    /// R-tree nodes examined by container index searches.
    pub index_nodes_visited: usize,
    /// Full pre-order render order rebuilds.
    pub order_rebuilds: usize,
}
