// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by the checked structural operations.

use crate::types::NodeId;

/// Why a checked structural edit was rejected.
///
/// The unchecked variants ([`Scene::add_child`](crate::Scene::add_child) and
/// friends) panic with the same message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The id was disposed or never belonged to this scene.
    #[error("node {0:?} is disposed or dangling")]
    Disposed(NodeId),
    /// A node cannot become its own child.
    #[error("node {0:?} cannot be its own parent")]
    SelfParent(NodeId),
    /// Attaching would make a node its own ancestor.
    #[error("attaching {child:?} under its descendant {parent:?} would create a cycle")]
    WouldCycle {
        /// Requested parent, a descendant of `child`.
        parent: NodeId,
        /// Node being attached.
        child: NodeId,
    },
    /// The node is not a direct child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Node that was expected to be a child.
        child: NodeId,
    },
    /// The scene root cannot be attached, detached, or disposed.
    #[error("the scene root {0:?} cannot be re-parented or disposed")]
    Root(NodeId),
}
