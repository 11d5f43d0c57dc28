// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strata Render: quad batching for [`strata_scene`].
//!
//! [`BatchRenderer`] paints a [`Scene`](strata_scene::Scene) once per frame in
//! four phases:
//!
//! 1. **Order resolution**: the update pass runs and the scene's flat pre-order
//!    paint table is rebuilt if the structure changed.
//! 2. **Culling**: the scene's hierarchical indexes return the nodes touching
//!    the surface, or only the damaged part of it.
//! 3. **Batching**: visible nodes are put in paint order (a sort, or a bitset scan
//!    of the order table when most of the tree is visible) and each paintable node
//!    becomes one quad of four [`QuadVertex`]es. A batch holds at most
//!    `max_quads` quads and `max_texture_slots` distinct textures; when the next
//!    quad would exceed either, the batch is flushed before the quad is written.
//! 4. **Flush**: the batch becomes one draw call.
//!
//! The GPU itself sits behind [`GpuBackend`]. [`RecordingBackend`] records draws
//! headlessly for tests and tooling.
//!
//! # Example
//!
//! ```rust
//! use strata_render::{BatchRenderer, RecordingBackend, RendererConfig};
//! use strata_scene::{Color, NodeDesc, Scene};
//!
//! let mut scene = Scene::new();
//! let root = scene.root();
//! let card = scene.insert(root, NodeDesc::rect(10.0, 10.0, 100.0, 60.0, Color::WHITE));
//!
//! let config = RendererConfig::default().with_surface_size(640, 480);
//! let mut renderer = BatchRenderer::new(config, RecordingBackend::new()).unwrap();
//!
//! // The first tick paints everything.
//! let frame = renderer.tick(&mut scene).unwrap();
//! assert_eq!((frame.draw_calls, frame.quads), (1, 1));
//!
//! // Nothing changed: nothing to paint.
//! assert!(renderer.tick(&mut scene).is_none());
//!
//! // A move repaints only the damaged region.
//! scene.set_position(card, 200.0, 10.0);
//! let frame = renderer.tick(&mut scene).unwrap();
//! assert!(frame.scissor.is_some());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod backend;
mod batch;
mod config;
mod renderer;
mod stats;
mod vertex;

pub use backend::{GpuBackend, RecordedDraw, RecordingBackend, ScissorRect};
pub use config::{ConfigError, MAX_BATCH_QUADS, RendererConfig};
pub use renderer::{BatchRenderer, Phase};
pub use stats::FrameStats;
pub use vertex::{NO_TEXTURE, QuadVertex, quad_indices, to_ndc};
