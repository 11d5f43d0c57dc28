// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer limits and validation.

use thiserror::Error;

/// Limits and tuning for a [`BatchRenderer`](crate::BatchRenderer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Quads per draw call; the vertex buffer holds four vertices per quad.
    pub max_quads: u32,
    /// Texture units a single batch may bind.
    pub max_texture_slots: u32,
    /// Visible-set size above which batching marks a bitset over the paint
    /// order table instead of sorting.
    pub bitset_threshold: usize,
    /// Target surface size in pixels.
    pub surface_size: (u32, u32),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_quads: 10_000,
            max_texture_slots: 16,
            bitset_threshold: 4096,
            surface_size: (800, 600),
        }
    }
}

impl RendererConfig {
    /// Replace the per-batch quad limit.
    pub fn with_max_quads(mut self, max_quads: u32) -> Self {
        self.max_quads = max_quads;
        self
    }

    /// Replace the per-batch texture slot limit.
    pub fn with_max_texture_slots(mut self, slots: u32) -> Self {
        self.max_texture_slots = slots;
        self
    }

    /// Replace the bitset threshold.
    pub fn with_bitset_threshold(mut self, threshold: usize) -> Self {
        self.bitset_threshold = threshold;
        self
    }

    /// Replace the surface size.
    pub fn with_surface_size(mut self, width: u32, height: u32) -> Self {
        self.surface_size = (width, height);
        self
    }

    /// Check the limits a renderer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_quads == 0 {
            return Err(ConfigError::ZeroQuads);
        }
        if self.max_texture_slots == 0 {
            return Err(ConfigError::ZeroTextureSlots);
        }
        if self.max_quads > MAX_BATCH_QUADS {
            return Err(ConfigError::TooManyQuads {
                max_quads: self.max_quads,
            });
        }
        Ok(())
    }
}

/// Largest accepted `max_quads`.
///
/// The vertex and index buffers are sized for a full batch up front, so this
/// bounds what a renderer allocates. It is far below the `u32` index range.
pub const MAX_BATCH_QUADS: u32 = 1 << 18;

/// A [`RendererConfig`] the renderer cannot work with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_quads` is zero.
    #[error("max_quads must be at least 1")]
    ZeroQuads,
    /// `max_texture_slots` is zero.
    #[error("max_texture_slots must be at least 1")]
    ZeroTextureSlots,
    /// `max_quads` is above [`MAX_BATCH_QUADS`].
    #[error("max_quads {max_quads} exceeds the batch limit of {} quads", MAX_BATCH_QUADS)]
    TooManyQuads {
        /// The rejected limit.
        max_quads: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(RendererConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let c = RendererConfig::default().with_max_quads(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroQuads));
        let c = RendererConfig::default().with_max_texture_slots(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroTextureSlots));
    }

    #[test]
    fn batch_size_is_capped() {
        let ok = RendererConfig::default().with_max_quads(MAX_BATCH_QUADS);
        assert_eq!(ok.validate(), Ok(()));
        for max_quads in [MAX_BATCH_QUADS + 1, u32::MAX / 4, u32::MAX] {
            let c = RendererConfig::default().with_max_quads(max_quads);
            assert_eq!(c.validate(), Err(ConfigError::TooManyQuads { max_quads }));
        }
    }
}
