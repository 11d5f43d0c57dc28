// Copyright 2025 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene arena: node storage, structure edits, property setters, and damage.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use kurbo::{Affine, Rect, Size, Vec2};
use strata_index::{Aabb2D, Key};

use crate::config::SceneConfig;
use crate::container::ChildIndex;
use crate::damage::Damage;
use crate::error::SceneError;
use crate::observer::SceneObserver;
use crate::stats::SceneStats;
use crate::transform::AffineTransform;
use crate::types::{Dirty, NodeDesc, NodeFlags, NodeId, NodeKind};
use crate::util::{aabb_to_rect, transform_aabb, transform_rect_bbox};

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) transform: AffineTransform,
    pub(crate) size: Size,
    pub(crate) kind: NodeKind,
    pub(crate) flags: NodeFlags,
    pub(crate) dirty: Dirty,
    /// Last resolved world matrix.
    pub(crate) world: Affine,
    /// World AABB of the own box, or the empty sentinel.
    pub(crate) world_bounds: Aabb2D<f64>,
    /// Local-space union of the own box and every child entry.
    pub(crate) content_bounds: Aabb2D<f64>,
    pub(crate) render_order: u32,
    /// Index over direct children, created with the first child.
    pub(crate) index: Option<ChildIndex>,
    /// This node's entry in its parent's index.
    pub(crate) index_key: Option<Key>,
}

impl Node {
    fn new(desc: NodeDesc) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: AffineTransform::from_parts(desc.position, desc.scale, desc.rotation),
            size: desc.size,
            kind: desc.kind,
            flags: desc.flags,
            dirty: Dirty::LOCAL | Dirty::SPATIAL,
            world: Affine::IDENTITY,
            world_bounds: Aabb2D::<f64>::EMPTY,
            content_bounds: Aabb2D::<f64>::EMPTY,
            render_order: u32::MAX,
            index: None,
            index_key: None,
        }
    }
}

/// Retained scene graph rooted at a single zero-size container.
///
/// Mutations only set dirty bits and record damage; [`update`](Self::update)
/// reconciles world matrices, world AABBs and container indexes in one pass.
/// Queries run that pass themselves, so they always see the latest state.
pub struct Scene {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    alive: usize,
    pub(crate) root: NodeId,
    pub(crate) config: SceneConfig,
    pub(crate) view: Affine,
    damage: Damage,
    observer: Option<Box<dyn SceneObserver>>,
    pub(crate) structure_epoch: u64,
    pub(crate) order_epoch: Option<u64>,
    pub(crate) order: Vec<NodeId>,
    pub(crate) stats: SceneStats,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes_total", &self.nodes.len())
            .field("nodes_alive", &self.alive)
            .field("free_list", &self.free_list.len())
            .field("root", &self.root)
            .field("structure_epoch", &self.structure_epoch)
            .field("view", &self.view)
            .field("damage", &self.damage)
            .field("has_observer", &self.observer.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene holding only its root container.
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Create a scene with explicit tuning.
    pub fn with_config(config: SceneConfig) -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            alive: 0,
            root: NodeId::new(0, 1),
            config: config.with_rtree_max_children(config.rtree_max_children),
            view: Affine::IDENTITY,
            damage: Damage::default(),
            observer: None,
            structure_epoch: 0,
            order_epoch: None,
            order: Vec::new(),
            stats: SceneStats::default(),
        };
        scene.root = scene.alloc(Node::new(NodeDesc::default()));
        scene
    }

    /// The root container. It has no parent and cannot be disposed.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Construction options.
    pub fn config(&self) -> SceneConfig {
        self.config
    }

    /// Number of live nodes, including the root and detached nodes.
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Always false: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Incremented by every attach, detach, and dispose.
    pub fn structure_epoch(&self) -> u64 {
        self.structure_epoch
    }

    /// Work counters since the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Zero the work counters.
    pub fn reset_stats(&mut self) {
        self.stats = SceneStats::default();
    }

    /// Install or remove the observer, returning the previous one.
    pub fn set_observer(
        &mut self,
        observer: Option<Box<dyn SceneObserver>>,
    ) -> Option<Box<dyn SceneObserver>> {
        core::mem::replace(&mut self.observer, observer)
    }

    // --- node lifecycle ---

    fn alloc(&mut self, node: Node) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.generations.push(1);
            self.nodes.len() - 1
        };
        self.alive += 1;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, self.generations[idx])
    }

    /// Create a detached node.
    pub fn create(&mut self, desc: NodeDesc) -> NodeId {
        self.alloc(Node::new(desc))
    }

    /// Create a node and append it to `parent`'s children.
    pub fn insert(&mut self, parent: NodeId, desc: NodeDesc) -> NodeId {
        let id = self.create(desc);
        self.add_child(parent, id);
        id
    }

    /// Whether `id` refers to a live node of this scene.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.try_node(id).is_some()
    }

    fn try_node(&self, id: NodeId) -> Option<&Node> {
        if self.generations.get(id.idx()) != Some(&id.1) {
            return None;
        }
        self.nodes[id.idx()].as_ref()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.try_node(id)
            .unwrap_or_else(|| panic!("disposed or dangling NodeId {id:?}"))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        if self.generations.get(id.idx()) == Some(&id.1)
            && let Some(node) = self.nodes[id.idx()].as_mut()
        {
            return node;
        }
        panic!("disposed or dangling NodeId {id:?}");
    }

    fn check_alive(&self, id: NodeId) -> Result<(), SceneError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(SceneError::Disposed(id))
        }
    }

    // --- structure ---

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.node(id).parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.node(p).parent;
        }
        false
    }

    /// Append `child` to `parent`, detaching it from its previous parent first.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale, if `child` is the root, or if `parent` is
    /// `child` or one of its descendants. See [`try_add_child`](Self::try_add_child).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = self.try_add_child(parent, child) {
            panic!("add_child failed: {err}");
        }
    }

    /// Checked [`add_child`](Self::add_child).
    pub fn try_add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check_alive(parent)?;
        self.check_alive(child)?;
        if parent == child {
            return Err(SceneError::SelfParent(child));
        }
        if child == self.root {
            return Err(SceneError::Root(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::WouldCycle { parent, child });
        }
        if let Some(old) = self.node(child).parent {
            self.detach(old, child);
        }
        self.attach(parent, child);
        self.structure_changed();
        Ok(())
    }

    /// Detach `child` from `parent`. The child stays alive, detached.
    ///
    /// # Panics
    ///
    /// Panics if either id is stale or `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = self.try_remove_child(parent, child) {
            panic!("remove_child failed: {err}");
        }
    }

    /// Checked [`remove_child`](Self::remove_child).
    pub fn try_remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check_alive(parent)?;
        self.check_alive(child)?;
        if self.node(child).parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach(parent, child);
        self.structure_changed();
        Ok(())
    }

    /// Dispose `id` and its whole subtree, detaching it from its parent first.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or is the root.
    pub fn dispose(&mut self, id: NodeId) {
        if let Err(err) = self.try_dispose(id) {
            panic!("dispose failed: {err}");
        }
    }

    /// Checked [`dispose`](Self::dispose).
    pub fn try_dispose(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.check_alive(id)?;
        if id == self.root {
            return Err(SceneError::Root(id));
        }
        if let Some(parent) = self.node(id).parent {
            self.detach(parent, id);
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
                self.alive -= 1;
            }
        }
        self.structure_changed();
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        let fanout = self.config.rtree_max_children;
        let p = self.node_mut(parent);
        p.children.push(child);
        p.index.get_or_insert_with(|| ChildIndex::new(fanout));
        let c = self.node_mut(child);
        c.parent = Some(parent);
        c.dirty |= Dirty::LOCAL;
        self.mark_spatial(child);
        self.mark_subtree_up(parent);
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        self.invalidate(child, None);
        let key = {
            let c = self.node_mut(child);
            c.parent = None;
            c.dirty |= Dirty::LOCAL;
            c.index_key.take()
        };
        let p = self.node_mut(parent);
        p.children.retain(|&c| c != child);
        if let (Some(key), Some(index)) = (key, p.index.as_mut()) {
            index.remove(key);
        }
        self.mark_spatial(child);
        self.mark_subtree_up(parent);
    }

    fn structure_changed(&mut self) {
        self.structure_epoch += 1;
        log::trace!("scene structure changed, epoch {}", self.structure_epoch);
        if let Some(observer) = self.observer.as_mut() {
            observer.structure_changed(self.structure_epoch);
        }
    }

    // --- dirty propagation ---

    /// Mark `id`'s local geometry changed: `LOCAL` and `SPATIAL` on the node,
    /// `SPATIAL` on every descendant, and `SUBTREE` on its ancestors.
    pub(crate) fn mark_transform_dirty(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.dirty |= Dirty::LOCAL;
        let parent = node.parent;
        self.mark_spatial(id);
        if let Some(parent) = parent {
            self.mark_subtree_up(parent);
        }
    }

    /// Set `SPATIAL` on `id` and its descendants.
    ///
    /// A node that already carries `SPATIAL` has it on its whole subtree, so the
    /// walk stops there.
    pub(crate) fn mark_spatial(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let node = self.node_mut(n);
            if node.dirty.contains(Dirty::SPATIAL) {
                continue;
            }
            node.dirty |= Dirty::SPATIAL;
            stack.extend(node.children.iter().copied());
        }
    }

    /// Set `SUBTREE` on `id` and its ancestors, stopping at the first that has it.
    pub(crate) fn mark_subtree_up(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            let node = self.node_mut(n);
            if node.dirty.contains(Dirty::SUBTREE) {
                break;
            }
            node.dirty |= Dirty::SUBTREE;
            cur = node.parent;
        }
    }

    // --- damage ---

    /// Request a repaint of part of `id`.
    ///
    /// `rect` is in the node's local coordinates and is mapped through the last
    /// resolved world matrix; `None` damages the node's whole subtree. A node
    /// without a parent degrades to a full repaint.
    pub fn invalidate(&mut self, id: NodeId, rect: Option<Rect>) {
        let node = self.node(id);
        if node.parent.is_none() {
            self.damage_full();
            return;
        }
        let world = match rect {
            Some(r) => Some(transform_rect_bbox(node.world, r)),
            None => {
                let b = transform_aabb(node.world, node.content_bounds).union(&node.world_bounds);
                (!b.is_empty()).then(|| aabb_to_rect(b))
            }
        };
        if let Some(r) = world {
            self.damage_rect(r);
        }
    }

    pub(crate) fn damage_rect(&mut self, rect: Rect) {
        self.damage.add_rect(rect);
        if let Some(observer) = self.observer.as_mut() {
            observer.damaged(Some(rect));
        }
    }

    pub(crate) fn damage_full(&mut self) {
        self.damage.add_full();
        if let Some(observer) = self.observer.as_mut() {
            observer.damaged(None);
        }
    }

    /// Damage accumulated so far.
    pub fn damage(&self) -> &Damage {
        &self.damage
    }

    /// Take the accumulated damage, leaving it empty.
    pub fn take_damage(&mut self) -> Damage {
        core::mem::take(&mut self.damage)
    }

    // --- properties ---

    fn geometry_changed(&mut self, id: NodeId) {
        self.invalidate(id, None);
        self.mark_transform_dirty(id);
    }

    /// Move a node relative to its parent. No-op when unchanged.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) {
        if self.node_mut(id).transform.set_position(x, y) {
            self.geometry_changed(id);
        }
    }

    /// Scale a node. No-op when unchanged.
    pub fn set_scale(&mut self, id: NodeId, sx: f64, sy: f64) {
        if self.node_mut(id).transform.set_scale(sx, sy) {
            self.geometry_changed(id);
        }
    }

    /// Rotate a node (radians). No-op when unchanged.
    pub fn set_rotation(&mut self, id: NodeId, radians: f64) {
        if self.node_mut(id).transform.set_rotation(radians) {
            self.geometry_changed(id);
        }
    }

    /// Set position, scale and rotation together, dirtying at most once.
    pub fn set_transform(&mut self, id: NodeId, position: Vec2, scale: Vec2, rotation: f64) {
        if self.node_mut(id).transform.set_all(position, scale, rotation) {
            self.geometry_changed(id);
        }
    }

    /// Resize the content box. No-op when unchanged.
    pub fn set_size(&mut self, id: NodeId, width: f64, height: f64) {
        debug_assert!(width.is_finite() && height.is_finite(), "non-finite size");
        let size = Size::new(width, height);
        let node = self.node_mut(id);
        if node.size == size {
            return;
        }
        node.size = size;
        self.geometry_changed(id);
    }

    /// Replace the paintable content. No-op when unchanged.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        let node = self.node_mut(id);
        if node.kind == kind {
            return;
        }
        node.kind = kind;
        self.invalidate(id, None);
    }

    /// Replace all flags. Visual flags (`HOVERED`, `SELECTED`, `VISIBLE`) damage the node.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        let node = self.node_mut(id);
        let old = node.flags;
        if old == flags {
            return;
        }
        node.flags = flags;
        let visual = NodeFlags::HOVERED | NodeFlags::SELECTED | NodeFlags::VISIBLE;
        if (old ^ flags).intersects(visual) {
            self.invalidate(id, None);
        }
    }

    fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) {
        let mut flags = self.node(id).flags;
        flags.set(flag, on);
        self.set_flags(id, flags);
    }

    /// Toggle participation in hit testing.
    pub fn set_interactive(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, NodeFlags::INTERACTIVE, on);
    }

    /// Toggle the hover state.
    pub fn set_hovered(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, NodeFlags::HOVERED, on);
    }

    /// Toggle the selection state.
    pub fn set_selected(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, NodeFlags::SELECTED, on);
    }

    /// Show or hide the node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, NodeFlags::VISIBLE, on);
    }

    /// Set the camera: `translate(pan) · scale`, mapping world to surface space.
    pub fn set_view_transform(&mut self, pan_x: f64, pan_y: f64, scale: f64) {
        let view = Affine::translate((pan_x, pan_y)) * Affine::scale(scale);
        if view != self.view {
            self.view = view;
            self.damage_full();
        }
    }

    /// Current camera transform.
    pub fn view_transform(&self) -> Affine {
        self.view
    }

    // --- accessors ---

    /// Parent of `id`, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of `id` in insertion (paint) order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Local transform components.
    pub fn transform(&self, id: NodeId) -> &AffineTransform {
        &self.node(id).transform
    }

    /// Content box size.
    pub fn size(&self, id: NodeId) -> Size {
        self.node(id).size
    }

    /// Paintable content.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// Public flags.
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).flags
    }

    /// World matrix as of the last update pass or lazy resolution.
    ///
    /// Use [`world_matrix`](Self::world_matrix) for a guaranteed current value.
    pub fn cached_world(&self, id: NodeId) -> Affine {
        self.node(id).world
    }

    /// World AABB of the node's own box as of the last update pass, or `None`
    /// for a zero-size node.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        let b = self.node(id).world_bounds;
        (!b.is_empty()).then(|| aabb_to_rect(b))
    }

    /// Local-space bounds of the node's box and its whole subtree.
    pub fn content_bounds(&self, id: NodeId) -> Option<Rect> {
        let b = self.node(id).content_bounds;
        (!b.is_empty()).then(|| aabb_to_rect(b))
    }

    /// Paint order assigned by the last [`resolve_render_order`](Self::resolve_render_order).
    pub fn render_order(&self, id: NodeId) -> u32 {
        self.node(id).render_order
    }

    /// The spatial index over `id`'s children, if it ever had any.
    pub fn child_index(&self, id: NodeId) -> Option<&ChildIndex> {
        self.node(id).index.as_ref()
    }

    /// Root-to-node path, inclusive.
    pub fn path_to_root(&self, mut id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        while let Some(p) = self.node(id).parent {
            out.push(p);
            id = p;
        }
        out.reverse();
        out
    }
}
