// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, paintable content, and
//! node descriptions.

use kurbo::{Rect, Size, Vec2};

/// Identifier for a node in the scene.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the node is disposed.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On dispose, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///   An id value is therefore never handed out twice.
///
/// Passing a stale id to a scene method panics; use
/// [`Scene::is_alive`](crate::Scene::is_alive) or the `try_*` methods to check first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Public per-node state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node participates in hit testing.
        const INTERACTIVE = 0b0000_0001;
        /// Pointer is over the node. Maintained by the embedder.
        const HOVERED     = 0b0000_0010;
        /// Node is part of the current selection. Maintained by the embedder.
        const SELECTED    = 0b0000_0100;
        /// Node and its subtree are painted, culled, and hit tested.
        const VISIBLE     = 0b0000_1000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::INTERACTIVE
    }
}

bitflags::bitflags! {
    /// Internal dirty state.
    ///
    /// `SPATIAL` on a node implies `SPATIAL` on every descendant, and a node with
    /// any bit set has `SUBTREE` on all of its attached ancestors.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub(crate) struct Dirty: u8 {
        /// Local transform or size changed; the parent index entry must be refreshed.
        const LOCAL   = 0b0001;
        /// A descendant needs attention during the update pass.
        const SUBTREE = 0b0010;
        /// Cached world matrix and AABB are untrusted.
        const SPATIAL = 0b0100;
        /// World matrix was resolved lazily; the world AABB still needs reconciling.
        const BOUNDS  = 0b1000;
    }
}

/// Straight-alpha RGBA color with `f32` channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color with alpha.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Color channels as an array, in vertex attribute order.
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Opaque handle to a texture owned by the embedder's resource loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// What a node paints inside its `[0, w] × [0, h]` box.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum NodeKind {
    /// Groups children; paints nothing itself.
    #[default]
    Container,
    /// Solid color fill.
    Rectangle {
        /// Fill color.
        color: Color,
    },
    /// Textured quad.
    Image {
        /// Texture to sample.
        texture: TextureHandle,
        /// Normalized texture coordinates of the sampled region.
        uv: Rect,
        /// Multiplied with the sampled texel.
        tint: Color,
    },
    /// Pre-rasterized text run. Shaping and rasterization happen elsewhere.
    Text {
        /// Texture holding the rasterized run.
        texture: TextureHandle,
        /// Normalized texture coordinates of the run inside `texture`.
        uv: Rect,
        /// Text color.
        color: Color,
    },
}

impl NodeKind {
    /// Whether this kind produces geometry when painted.
    pub const fn is_paintable(&self) -> bool {
        !matches!(self, Self::Container)
    }

    /// Texture sampled by this kind, if any.
    pub const fn texture(&self) -> Option<TextureHandle> {
        match self {
            Self::Image { texture, .. } | Self::Text { texture, .. } => Some(*texture),
            Self::Container | Self::Rectangle { .. } => None,
        }
    }
}

/// Initial state for a node created with [`Scene::create`](crate::Scene::create)
/// or [`Scene::insert`](crate::Scene::insert).
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDesc {
    /// Position relative to the parent.
    pub position: Vec2,
    /// Non-uniform scale.
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Content box size; a non-positive side makes the node a zero-size container.
    pub size: Size,
    /// Paintable content.
    pub kind: NodeKind,
    /// Initial flags.
    pub flags: NodeFlags,
}

impl Default for NodeDesc {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            size: Size::ZERO,
            kind: NodeKind::Container,
            flags: NodeFlags::default(),
        }
    }
}

impl NodeDesc {
    /// A zero-size container at the given position.
    pub fn container(x: f64, y: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::default()
        }
    }

    /// A solid rectangle at `(x, y)` with the given size.
    pub fn rect(x: f64, y: f64, w: f64, h: f64, color: Color) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Size::new(w, h),
            kind: NodeKind::Rectangle { color },
            ..Self::default()
        }
    }

    /// An image showing the full texture at `(x, y)` with the given size.
    pub fn image(x: f64, y: f64, w: f64, h: f64, texture: TextureHandle) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Size::new(w, h),
            kind: NodeKind::Image {
                texture,
                uv: Rect::new(0.0, 0.0, 1.0, 1.0),
                tint: Color::WHITE,
            },
            ..Self::default()
        }
    }

    /// Replace the flags.
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Replace the rotation.
    pub fn with_rotation(mut self, radians: f64) -> Self {
        self.rotation = radians;
        self
    }

    /// Replace the scale.
    pub fn with_scale(mut self, sx: f64, sy: f64) -> Self {
        self.scale = Vec2::new(sx, sy);
        self
    }
}
