// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame statistics.

use crate::backend::ScissorRect;

/// What one [`paint`](crate::BatchRenderer::paint) did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw calls issued.
    pub draw_calls: u32,
    /// Quads drawn across all draw calls.
    pub quads: u32,
    /// Nodes returned by culling, paintable or not.
    pub visible: usize,
    /// Whether the paint order table was rebuilt this frame.
    pub order_rebuilt: bool,
    /// Whether batching scanned the order table through a bitset instead of sorting.
    pub used_bitset: bool,
    /// Batches flushed early because a quad or texture slot limit was reached.
    pub limit_flushes: u32,
    /// Scissor the frame was drawn under; `None` for a full repaint.
    pub scissor: Option<ScissorRect>,
}
