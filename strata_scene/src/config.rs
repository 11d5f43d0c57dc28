// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene construction options.

/// Tuning for a [`Scene`](crate::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneConfig {
    /// Maximum entries per R-tree node in every container index. At least 4.
    pub rtree_max_children: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            rtree_max_children: 8,
        }
    }
}

impl SceneConfig {
    /// Replace the container index fanout. Values below 4 are raised to 4.
    pub fn with_rtree_max_children(mut self, max_children: usize) -> Self {
        self.rtree_max_children = max_children.max(4);
        self
    }
}
