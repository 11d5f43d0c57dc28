// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertex layout shared by every batch.

#![allow(
    unsafe_code,
    reason = "bytemuck derives emit unsafe impls for Pod and Zeroable"
)]

use alloc::vec::Vec;
use kurbo::Point;

/// Texture slot value for untextured quads.
pub const NO_TEXTURE: f32 = -1.0;

/// One corner of a quad, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
    /// Texture coordinates.
    pub uv: [f32; 2],
    /// Straight-alpha RGBA.
    pub color: [f32; 4],
    /// Index into the batch's bound textures, or [`NO_TEXTURE`].
    pub texture_slot: f32,
}

/// Corner order of every quad: top-left, top-right, bottom-left, bottom-right.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Index buffer covering `quads` quads of four vertices each.
///
/// Built once per renderer; every batch draws a prefix of it.
pub fn quad_indices(quads: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(quads as usize * QUAD_INDICES.len());
    for q in 0..quads {
        let base = q * 4;
        out.extend(QUAD_INDICES.iter().map(|i| base + i));
    }
    out
}

/// Surface pixel position to normalized device coordinates (y up).
#[allow(
    clippy::cast_possible_truncation,
    reason = "GPU vertex attributes are f32; surface coordinates fit comfortably."
)]
pub fn to_ndc(p: Point, surface_width: f64, surface_height: f64) -> [f32; 2] {
    [
        ((p.x / surface_width) * 2.0 - 1.0) as f32,
        (1.0 - (p.y / surface_height) * 2.0) as f32,
    ]
}
