// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame paint cycle.

use alloc::vec::Vec;
use kurbo::{Point, Rect};
use strata_scene::{NodeId, NodeKind, Scene, TextureHandle};

use crate::backend::{GpuBackend, ScissorRect};
use crate::batch::QuadBatch;
use crate::config::{ConfigError, RendererConfig};
use crate::stats::FrameStats;
use crate::vertex::{quad_indices, to_ndc};

/// Where a [`BatchRenderer`] is in its paint cycle.
///
/// A cycle always runs `Idle → OrderResolution → Culling → Batching → Flush → Idle`
/// to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    /// Between frames.
    #[default]
    Idle,
    /// Reconciling world state and rebuilding the paint order table.
    OrderResolution,
    /// Querying the scene for nodes inside the painted region.
    Culling,
    /// Writing quads, flushing early when a limit is hit.
    Batching,
    /// Submitting the last batch.
    Flush,
}

const UNIT_UV: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

/// Paints a [`Scene`] as batched quads through a [`GpuBackend`].
///
/// Owns the backend, the CPU vertex buffer and the texture slot table. Every
/// frame resolves paint order, culls against the painted region, sorts the
/// visible set into paint order, and streams one quad per paintable node into
/// batches of at most `max_quads` quads and `max_texture_slots` textures.
#[derive(Debug)]
pub struct BatchRenderer<B: GpuBackend> {
    config: RendererConfig,
    backend: B,
    batch: QuadBatch,
    phase: Phase,
    needs_full_repaint: bool,
    visible: Vec<NodeId>,
    order_bits: Vec<u64>,
}

impl<B: GpuBackend> BatchRenderer<B> {
    /// Validate `config` and upload the shared quad index buffer.
    pub fn new(config: RendererConfig, mut backend: B) -> Result<Self, ConfigError> {
        config.validate()?;
        backend.upload_indices(&quad_indices(config.max_quads));
        Ok(Self {
            config,
            backend,
            batch: QuadBatch::new(config.max_quads, config.max_texture_slots),
            phase: Phase::Idle,
            needs_full_repaint: true,
            visible: Vec::new(),
            order_bits: Vec::new(),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Current paint cycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The backend draws go to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Give the backend back.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Resize the target surface. The next [`tick`](Self::tick) repaints everything.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        if self.config.surface_size != (width, height) {
            self.config.surface_size = (width, height);
            self.needs_full_repaint = true;
        }
    }

    /// Paint whatever the scene damaged since the last tick.
    ///
    /// Runs the update pass, takes the scene's damage, maps it through the view
    /// transform and paints under a scissor covering it. The first tick, a tick
    /// after [`set_surface_size`](Self::set_surface_size), and full damage paint
    /// the whole surface. Returns `None` when nothing was damaged.
    pub fn tick(&mut self, scene: &mut Scene) -> Option<FrameStats> {
        scene.update();
        let damage = scene.take_damage();
        let full = core::mem::take(&mut self.needs_full_repaint) || damage.full;
        let region = if full {
            None
        } else {
            let Some(world) = damage.union_rect() else {
                log::trace!("tick: nothing damaged");
                return None;
            };
            Some(scene.view_transform().transform_rect_bbox(world))
        };
        Some(self.paint(scene, region))
    }

    /// Run one paint cycle.
    ///
    /// `damage` is in surface pixels; `None` paints the whole surface. A damage
    /// rect is clamped to the surface and drawn under a scissor rounded out to
    /// whole pixels. The scene's accumulated damage is left untouched.
    pub fn paint(&mut self, scene: &mut Scene, damage: Option<Rect>) -> FrameStats {
        let mut stats = FrameStats::default();

        self.enter(Phase::OrderResolution);
        scene.update();
        stats.order_rebuilt = scene.resolve_render_order();

        self.enter(Phase::Culling);
        let surface = self.surface_rect();
        let clamped = damage.map_or(surface, |d| d.intersect(surface));
        if !(clamped.width() > 0.0 && clamped.height() > 0.0) {
            log::trace!("paint: empty region {clamped:?}, nothing to draw");
            self.enter(Phase::Idle);
            return stats;
        }
        // Cull against exactly the pixels the scissor lets through.
        let region = match damage {
            Some(_) => clamped.expand().intersect(surface),
            None => surface,
        };
        stats.scissor = damage.map(|_| scissor_for(region));
        self.backend.set_scissor(stats.scissor);
        self.visible = scene.query_visible(region);
        stats.visible = self.visible.len();

        self.enter(Phase::Batching);
        if self.visible.len() > self.config.bitset_threshold {
            stats.used_bitset = true;
            self.sort_by_bitset(scene);
        } else {
            self.visible.sort_unstable_by_key(|&id| scene.render_order(id));
        }
        self.write_quads(scene, &mut stats);

        self.enter(Phase::Flush);
        flush(&mut self.batch, &mut self.backend, &mut stats);
        log::trace!(
            "frame: {} visible, {} quads in {} draw calls ({} early flushes)",
            stats.visible,
            stats.quads,
            stats.draw_calls,
            stats.limit_flushes
        );
        self.enter(Phase::Idle);
        stats
    }

    fn enter(&mut self, phase: Phase) {
        log::trace!("paint phase {:?} -> {phase:?}", self.phase);
        self.phase = phase;
    }

    fn surface_rect(&self) -> Rect {
        let (w, h) = self.config.surface_size;
        Rect::new(0.0, 0.0, f64::from(w), f64::from(h))
    }

    /// Reorder `visible` by marking render orders in a bitset and scanning it
    /// against the order table once.
    fn sort_by_bitset(&mut self, scene: &Scene) {
        let table = scene.order_table();
        self.order_bits.clear();
        self.order_bits.resize(table.len().div_ceil(64), 0);
        for &id in &self.visible {
            let order = scene.render_order(id) as usize;
            self.order_bits[order / 64] |= 1_u64 << (order % 64);
        }
        self.visible.clear();
        for (word_idx, &word) in self.order_bits.iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                self.visible.push(table[word_idx * 64 + bit]);
                bits &= bits - 1;
            }
        }
    }

    fn write_quads(&mut self, scene: &Scene, stats: &mut FrameStats) {
        let view = scene.view_transform();
        let (sw, sh) = self.config.surface_size;
        let (sw, sh) = (f64::from(sw), f64::from(sh));
        for &id in &self.visible {
            let Some((color, uv, texture)) = quad_style(scene.kind(id)) else {
                continue;
            };
            let to_surface = view * scene.cached_world(id);
            let size = scene.size(id);
            let corners = [
                Point::ZERO,
                Point::new(size.width, 0.0),
                Point::new(0.0, size.height),
                Point::new(size.width, size.height),
            ]
            .map(|p| to_ndc(to_surface * p, sw, sh));

            if let Some(cause) = self.batch.must_flush_for(texture) {
                log::debug!(
                    "flushing batch early ({cause:?}) at {} quads",
                    self.batch.quads()
                );
                stats.limit_flushes += 1;
                flush(&mut self.batch, &mut self.backend, stats);
            }
            self.batch.push(corners, uv, color, texture);
        }
    }
}

fn flush(batch: &mut QuadBatch, backend: &mut dyn GpuBackend, stats: &mut FrameStats) {
    if batch.is_empty() {
        return;
    }
    stats.quads += batch.flush(backend);
    stats.draw_calls += 1;
}

/// Color, per-corner UVs and texture of a node's quad, or `None` for kinds
/// that paint nothing.
fn quad_style(kind: &NodeKind) -> Option<([f32; 4], [[f32; 2]; 4], Option<TextureHandle>)> {
    match *kind {
        NodeKind::Container => None,
        NodeKind::Rectangle { color } => Some((color.to_array(), UNIT_UV, None)),
        NodeKind::Image { texture, uv, tint } => {
            Some((tint.to_array(), uv_corners(uv), Some(texture)))
        }
        NodeKind::Text { texture, uv, color } => {
            Some((color.to_array(), uv_corners(uv), Some(texture)))
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Texture coordinates are normalized; f32 is what the GPU samples with."
)]
fn uv_corners(uv: Rect) -> [[f32; 2]; 4] {
    let (u0, v0, u1, v1) = (uv.x0 as f32, uv.y0 as f32, uv.x1 as f32, uv.y1 as f32);
    [[u0, v0], [u1, v0], [u0, v1], [u1, v1]]
}

/// Convert a pixel-aligned, surface-clamped rect to a scissor rect.
#[allow(
    clippy::cast_possible_truncation,
    reason = "The rect is pixel-aligned and clamped to a surface whose size is u32 pixels."
)]
fn scissor_for(r: Rect) -> ScissorRect {
    ScissorRect {
        x: r.x0 as u32,
        y: r.y0 as u32,
        width: r.width() as u32,
        height: r.height() as u32,
    }
}
