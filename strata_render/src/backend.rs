// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between batching and an actual GPU API.

use alloc::vec::Vec;
use strata_scene::TextureHandle;

use crate::vertex::QuadVertex;

/// Pixel rectangle limiting rasterization, in surface coordinates (y down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScissorRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Commands a [`BatchRenderer`](crate::BatchRenderer) issues to the GPU.
///
/// An implementation owns the device-side vertex and index buffers and the
/// texture units. Calls arrive in a fixed pattern per batch:
/// `upload_vertices`, `bind_textures`, `draw_quads`. `upload_indices` happens
/// once, when the renderer is created.
pub trait GpuBackend {
    /// Store the shared quad index buffer.
    fn upload_indices(&mut self, indices: &[u32]);

    /// Replace the start of the vertex buffer with `vertices`.
    fn upload_vertices(&mut self, vertices: &[QuadVertex]);

    /// Bind `textures[i]` to texture unit `i`.
    fn bind_textures(&mut self, textures: &[TextureHandle]);

    /// Restrict drawing to `rect`, or lift the restriction.
    fn set_scissor(&mut self, rect: Option<ScissorRect>);

    /// Draw the first `quads` quads of the uploaded vertex buffer.
    fn draw_quads(&mut self, quads: u32);
}

/// One recorded draw call, with the state it was issued under.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    /// Vertices uploaded for this batch.
    pub vertices: Vec<QuadVertex>,
    /// Textures bound for this batch.
    pub textures: Vec<TextureHandle>,
    /// Scissor active at draw time.
    pub scissor: Option<ScissorRect>,
    /// Quads drawn.
    pub quads: u32,
}

/// Headless backend that records every draw.
///
/// Used by tests, benches and demos; call [`clear`](Self::clear) between
/// frames to compare them.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    /// Last uploaded index buffer.
    pub indices: Vec<u32>,
    /// Draws since the last [`clear`](Self::clear).
    pub draws: Vec<RecordedDraw>,
    vertices: Vec<QuadVertex>,
    textures: Vec<TextureHandle>,
    scissor: Option<ScissorRect>,
}

impl RecordingBackend {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget recorded draws; keeps the index buffer.
    pub fn clear(&mut self) {
        self.draws.clear();
    }

    /// Quads drawn across all recorded draws.
    pub fn total_quads(&self) -> u32 {
        self.draws.iter().map(|d| d.quads).sum()
    }
}

impl GpuBackend for RecordingBackend {
    fn upload_indices(&mut self, indices: &[u32]) {
        self.indices.clear();
        self.indices.extend_from_slice(indices);
    }

    fn upload_vertices(&mut self, vertices: &[QuadVertex]) {
        self.vertices.clear();
        self.vertices.extend_from_slice(vertices);
    }

    fn bind_textures(&mut self, textures: &[TextureHandle]) {
        self.textures.clear();
        self.textures.extend_from_slice(textures);
    }

    fn set_scissor(&mut self, rect: Option<ScissorRect>) {
        self.scissor = rect;
    }

    fn draw_quads(&mut self, quads: u32) {
        self.draws.push(RecordedDraw {
            vertices: self.vertices[..quads as usize * 4].to_vec(),
            textures: self.textures.clone(),
            scissor: self.scissor,
            quads,
        });
    }
}
