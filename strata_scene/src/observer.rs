// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Notification seam between the scene and whoever presents it.

use kurbo::Rect;

/// Receives scene notifications as mutations happen.
///
/// Installed with [`Scene::set_observer`](crate::Scene::set_observer). Both
/// methods default to no-ops. Damage is also accumulated on the scene itself,
/// so observing is optional.
pub trait SceneObserver {
    /// Children were attached, detached, or disposed. `epoch` is the scene's new
    /// structure epoch; paint order is stale until it is resolved again.
    fn structure_changed(&mut self, epoch: u64) {
        let _ = epoch;
    }

    /// A world-space region needs repainting, or everything does when `rect` is `None`.
    fn damaged(&mut self, rect: Option<Rect>) {
        let _ = rect;
    }
}
