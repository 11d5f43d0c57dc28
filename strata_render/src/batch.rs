// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU-side accumulation of one draw call.

use alloc::vec::Vec;
use strata_scene::TextureHandle;

use crate::backend::GpuBackend;
use crate::vertex::{NO_TEXTURE, QuadVertex};

/// Why a batch was flushed before it finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlushCause {
    /// The next quad would exceed the quad limit.
    QuadLimit,
    /// The next quad needs a texture and every slot is taken.
    SlotLimit,
}

/// Vertices and bound textures for the draw call being built.
#[derive(Debug)]
pub(crate) struct QuadBatch {
    vertices: Vec<QuadVertex>,
    slots: Vec<TextureHandle>,
    quads: u32,
    max_quads: u32,
    max_slots: usize,
}

impl QuadBatch {
    pub(crate) fn new(max_quads: u32, max_slots: u32) -> Self {
        Self {
            vertices: Vec::with_capacity(max_quads as usize * 4),
            slots: Vec::with_capacity(max_slots as usize),
            quads: 0,
            max_quads,
            max_slots: max_slots as usize,
        }
    }

    pub(crate) fn quads(&self) -> u32 {
        self.quads
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.quads == 0
    }

    /// Whether the batch must be flushed before a quad sampling `texture` is
    /// written into it.
    pub(crate) fn must_flush_for(&self, texture: Option<TextureHandle>) -> Option<FlushCause> {
        if self.quads >= self.max_quads {
            return Some(FlushCause::QuadLimit);
        }
        match texture {
            Some(t) if !self.slots.contains(&t) && self.slots.len() >= self.max_slots => {
                Some(FlushCause::SlotLimit)
            }
            _ => None,
        }
    }

    /// Slot for `texture`, binding it if needed. Caller checked
    /// [`must_flush_for`](Self::must_flush_for) first.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Slot counts are tiny; f32 represents them exactly."
    )]
    fn slot_for(&mut self, texture: Option<TextureHandle>) -> f32 {
        let Some(t) = texture else {
            return NO_TEXTURE;
        };
        let idx = match self.slots.iter().position(|s| *s == t) {
            Some(i) => i,
            None => {
                self.slots.push(t);
                self.slots.len() - 1
            }
        };
        idx as f32
    }

    /// Append one quad. Corners go top-left, top-right, bottom-left,
    /// bottom-right; `uv` follows the same order.
    pub(crate) fn push(
        &mut self,
        corners: [[f32; 2]; 4],
        uv: [[f32; 2]; 4],
        color: [f32; 4],
        texture: Option<TextureHandle>,
    ) {
        debug_assert!(
            self.must_flush_for(texture).is_none(),
            "quad written into a full batch"
        );
        let texture_slot = self.slot_for(texture);
        for (position, uv) in corners.into_iter().zip(uv) {
            self.vertices.push(QuadVertex {
                position,
                uv,
                color,
                texture_slot,
            });
        }
        self.quads += 1;
    }

    /// Submit the batch as one draw call and reset it. Returns the quads drawn.
    pub(crate) fn flush(&mut self, backend: &mut dyn GpuBackend) -> u32 {
        let quads = self.quads;
        if quads == 0 {
            return 0;
        }
        backend.upload_vertices(&self.vertices);
        backend.bind_textures(&self.slots);
        backend.draw_quads(quads);
        self.vertices.clear();
        self.slots.clear();
        self.quads = 0;
        quads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;

    const CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

    fn push(b: &mut QuadBatch, tex: Option<u64>) {
        b.push(CORNERS, CORNERS, [1.0; 4], tex.map(TextureHandle));
    }

    #[test]
    fn same_texture_reuses_its_slot() {
        let mut b = QuadBatch::new(16, 2);
        push(&mut b, Some(7));
        push(&mut b, Some(9));
        push(&mut b, Some(7));
        assert_eq!(b.slots, [TextureHandle(7), TextureHandle(9)]);
        let slots: Vec<f32> = b.vertices.iter().step_by(4).map(|v| v.texture_slot).collect();
        assert_eq!(slots, [0.0, 1.0, 0.0]);
        // Bound textures never force a flush.
        assert_eq!(b.must_flush_for(Some(TextureHandle(9))), None);
        assert_eq!(b.must_flush_for(None), None);
        assert_eq!(
            b.must_flush_for(Some(TextureHandle(3))),
            Some(FlushCause::SlotLimit)
        );
    }

    #[test]
    fn quad_limit_is_reported_before_writing() {
        let mut b = QuadBatch::new(2, 4);
        push(&mut b, None);
        assert_eq!(b.must_flush_for(None), None);
        push(&mut b, None);
        assert_eq!(b.must_flush_for(None), Some(FlushCause::QuadLimit));
    }

    #[test]
    fn flush_draws_and_resets() {
        let mut b = QuadBatch::new(8, 4);
        let mut gpu = RecordingBackend::new();
        assert_eq!(b.flush(&mut gpu), 0);
        assert!(gpu.draws.is_empty(), "empty batches issue no draw");
        push(&mut b, Some(1));
        push(&mut b, None);
        assert_eq!(b.flush(&mut gpu), 2);
        assert!(b.is_empty());
        assert_eq!(gpu.draws.len(), 1);
        assert_eq!(gpu.draws[0].vertices.len(), 8);
        assert_eq!(gpu.draws[0].textures, [TextureHandle(1)]);
        assert_eq!(gpu.draws[0].vertices[4].texture_slot, NO_TEXTURE);
    }
}
