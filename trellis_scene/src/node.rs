// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node storage and the derived-value cache.
//!
//! Ancestor-dependent quantities (absolute transform, absolute opacity,
//! visibility, listening, owning stage) are computed on first read and
//! memoized under a [`CacheKey`]. Writes never recompute: they clear the entry
//! on the node and on every descendant, or for the transform family mark the
//! slot dirty so the next read refills it in place.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::vec::Vec;

use bitflags::bitflags;
use kurbo::{Point, Vec2};
use log::warn;
use smallvec::SmallVec;
use trellis_transform::Transform;

use crate::attr::{self, AttrMap, builtin};
use crate::drag::DragBoundFn;
use crate::event::{INTERNAL_NAMESPACE, ListenerTable};
use crate::hit::HitRaster;
use crate::raster::RasterCache;
use crate::render::{Drawing, LayerState};
use crate::{NodeId, Role, Scene};

/// Names of cached derived quantities.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Local transform from the node's own attributes.
    Transform,
    /// Transform from node space to stage space.
    AbsoluteTransform,
    /// Product of opacities up to the root.
    AbsoluteOpacity,
    /// Own and every ancestor's `visible` flag.
    Visible,
    /// Own and every ancestor's `listening` flag.
    Listening,
    /// The owning stage, if attached.
    Stage,
}

/// State of a cache entry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CacheState {
    /// Never computed, or cleared.
    #[default]
    Absent,
    /// Present but stale; recomputed on the next read.
    Dirty,
    /// Present and current.
    Valid,
}

/// Which parts of the local transform a node contributes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TransformsEnabled {
    /// The full local transform.
    #[default]
    All,
    /// Only `translate(x - offsetX, y - offsetY)`.
    Position,
    /// Nothing.
    None,
}

impl TransformsEnabled {
    fn parse(s: &str) -> Self {
        match s {
            "position" => Self::Position,
            "none" => Self::None,
            _ => Self::All,
        }
    }

    /// Attribute value for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Position => "position",
            Self::None => "none",
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct TransformSlot {
    matrix: Transform,
    state: CacheState,
}

impl TransformSlot {
    fn valid(&self) -> Option<Transform> {
        (self.state == CacheState::Valid).then_some(self.matrix)
    }

    fn store(&mut self, t: &Transform) {
        t.copy_into(&mut self.matrix);
        self.state = CacheState::Valid;
    }

    fn mark_dirty(&mut self) {
        if self.state == CacheState::Valid {
            self.state = CacheState::Dirty;
        }
    }
}

bitflags! {
    /// Dependency listeners already installed on a node.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub(crate) struct Watched: u8 {
        const VISIBLE = 1 << 0;
        const LISTENING = 1 << 1;
        const OPACITY = 1 << 2;
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct DerivedCache {
    pub(crate) transform: TransformSlot,
    pub(crate) absolute_transform: TransformSlot,
    pub(crate) absolute_opacity: Option<f64>,
    pub(crate) visible: Option<bool>,
    pub(crate) listening: Option<bool>,
    pub(crate) stage: Option<Option<NodeId>>,
    pub(crate) watched: Watched,
}

impl DerivedCache {
    fn clear(&mut self, key: CacheKey) {
        match key {
            CacheKey::Transform => self.transform.mark_dirty(),
            CacheKey::AbsoluteTransform => self.absolute_transform.mark_dirty(),
            CacheKey::AbsoluteOpacity => self.absolute_opacity = None,
            CacheKey::Visible => self.visible = None,
            CacheKey::Listening => self.listening = None,
            CacheKey::Stage => self.stage = None,
        }
    }

    fn state(&self, key: CacheKey) -> CacheState {
        let present = |p: bool| if p { CacheState::Valid } else { CacheState::Absent };
        match key {
            CacheKey::Transform => self.transform.state,
            CacheKey::AbsoluteTransform => self.absolute_transform.state,
            CacheKey::AbsoluteOpacity => present(self.absolute_opacity.is_some()),
            CacheKey::Visible => present(self.visible.is_some()),
            CacheKey::Listening => present(self.listening.is_some()),
            CacheKey::Stage => present(self.stage.is_some()),
        }
    }
}

/// Everything the scene stores for one node.
pub(crate) struct NodeData {
    pub(crate) role: Role,
    pub(crate) class_name: Cow<'static, str>,
    pub(crate) attrs: AttrMap,
    pub(crate) listeners: ListenerTable,
    pub(crate) parent: Option<NodeId>,
    pub(crate) index: usize,
    pub(crate) children: Vec<NodeId>,
    pub(crate) cache: DerivedCache,
    pub(crate) drawing: Option<Drawing>,
    pub(crate) drag_bound: Option<DragBoundFn>,
    pub(crate) raster: Option<RasterCache>,
    pub(crate) hit_raster: Option<Rc<HitRaster>>,
    pub(crate) layer: Option<LayerState>,
}

impl NodeData {
    pub(crate) fn new(role: Role, class_name: Cow<'static, str>) -> Self {
        Self {
            role,
            class_name,
            attrs: AttrMap::new(),
            listeners: ListenerTable::default(),
            parent: None,
            index: 0,
            children: Vec::new(),
            cache: DerivedCache::default(),
            drawing: None,
            drag_bound: None,
            raster: None,
            hit_raster: None,
            layer: (role == Role::Layer).then(LayerState::default),
        }
    }

    fn transforms_enabled(&self) -> TransformsEnabled {
        TransformsEnabled::parse(attr::text_in(&self.attrs, &builtin::TRANSFORMS_ENABLED))
    }

    /// Local transform: translate, rotate, skew, scale, then un-offset.
    fn compute_local(&self) -> Transform {
        let a = &self.attrs;
        let x = attr::number_in(a, &builtin::X);
        let y = attr::number_in(a, &builtin::Y);
        let rotation = attr::number_in(a, &builtin::ROTATION);
        let scale_x = attr::number_in(a, &builtin::SCALE_X);
        let scale_y = attr::number_in(a, &builtin::SCALE_Y);
        let skew_x = attr::number_in(a, &builtin::SKEW_X);
        let skew_y = attr::number_in(a, &builtin::SKEW_Y);
        let offset_x = attr::number_in(a, &builtin::OFFSET_X);
        let offset_y = attr::number_in(a, &builtin::OFFSET_Y);

        let mut t = Transform::IDENTITY;
        if x != 0.0 || y != 0.0 {
            t.translate(x, y);
        }
        if rotation != 0.0 {
            t.rotate(rotation.to_radians());
        }
        if skew_x != 0.0 || skew_y != 0.0 {
            t.skew(skew_x, skew_y);
        }
        if scale_x != 1.0 || scale_y != 1.0 {
            t.scale(scale_x, scale_y);
        }
        if offset_x != 0.0 || offset_y != 0.0 {
            t.translate(-offset_x, -offset_y);
        }
        t
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct BatchEntry {
    node: NodeId,
    pending: bool,
}

impl Scene {
    /// State of a cached derived quantity, for diagnostics and tests.
    #[must_use]
    pub fn cache_state(&self, id: NodeId, key: CacheKey) -> CacheState {
        self.nodes
            .get(&id)
            .map_or(CacheState::Absent, |n| n.cache.state(key))
    }

    /// Clears one cache entry on `id` only.
    pub fn clear_cache_entry(&mut self, id: NodeId, key: CacheKey) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.cache.clear(key);
        }
    }

    /// Clears one cache entry on `id` and every descendant.
    pub fn clear_self_and_descendant_cache(&mut self, id: NodeId, key: CacheKey) {
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.push(id);
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&n) {
                node.cache.clear(key);
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Clears every ancestor-dependent entry on a subtree after a move.
    pub(crate) fn clear_structural_caches(&mut self, id: NodeId) {
        for key in [
            CacheKey::AbsoluteTransform,
            CacheKey::AbsoluteOpacity,
            CacheKey::Visible,
            CacheKey::Listening,
            CacheKey::Stage,
        ] {
            self.clear_self_and_descendant_cache(id, key);
        }
    }

    /// Installs the internal listener that clears `key` when its attribute changes.
    fn watch(&mut self, id: NodeId, key: CacheKey) {
        let (flag, event) = match key {
            CacheKey::Visible => (Watched::VISIBLE, "visibleChange"),
            CacheKey::Listening => (Watched::LISTENING, "listeningChange"),
            CacheKey::AbsoluteOpacity => (Watched::OPACITY, "opacityChange"),
            _ => return,
        };
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if node.cache.watched.contains(flag) {
            return;
        }
        node.cache.watched.insert(flag);
        node.listeners.add(
            event,
            INTERNAL_NAMESPACE,
            Rc::new(move |scene: &mut Self, event: &mut crate::Event| {
                if let Some(current) = event.current_target {
                    scene.clear_self_and_descendant_cache(current, key);
                }
            }),
        );
    }

    /// Transform attributes changed on `id`.
    pub(crate) fn invalidate_transform(&mut self, id: NodeId) {
        if let Some(entry) = self.transform_batch.iter_mut().find(|e| e.node == id) {
            entry.pending = true;
            return;
        }
        self.clear_cache_entry(id, CacheKey::Transform);
        self.clear_self_and_descendant_cache(id, CacheKey::AbsoluteTransform);
    }

    /// Runs `f` with transform invalidation for `id` deferred to a single
    /// pass at the end.
    ///
    /// Reads of a transform inside `f` flush the pending invalidation first,
    /// so handlers never observe a stale matrix.
    pub fn batch_transform_changes(&mut self, id: NodeId, f: impl FnOnce(&mut Self)) {
        if self.transform_batch.iter().any(|e| e.node == id) {
            f(self);
            return;
        }
        self.transform_batch.push(BatchEntry {
            node: id,
            pending: false,
        });
        f(self);
        let Some(pos) = self.transform_batch.iter().position(|e| e.node == id) else {
            return;
        };
        let entry = self.transform_batch.remove(pos);
        if entry.pending {
            self.invalidate_transform(id);
        }
    }

    fn flush_transform_batches(&mut self) {
        if self.transform_batch.iter().all(|e| !e.pending) {
            return;
        }
        let pending: SmallVec<[NodeId; 2]> = self
            .transform_batch
            .iter_mut()
            .filter(|e| e.pending)
            .map(|e| {
                e.pending = false;
                e.node
            })
            .collect();
        for id in pending {
            self.clear_cache_entry(id, CacheKey::Transform);
            self.clear_self_and_descendant_cache(id, CacheKey::AbsoluteTransform);
        }
    }

    /// The node's local transform.
    pub fn local_transform(&mut self, id: NodeId) -> Transform {
        self.flush_transform_batches();
        let Some(node) = self.nodes.get_mut(&id) else {
            return Transform::IDENTITY;
        };
        if let Some(t) = node.cache.transform.valid() {
            return t;
        }
        let t = node.compute_local();
        node.cache.transform.store(&t);
        t
    }

    /// Transform from the node's space to stage space.
    pub fn absolute_transform(&mut self, id: NodeId) -> Transform {
        self.flush_transform_batches();
        let Some(node) = self.nodes.get(&id) else {
            return Transform::IDENTITY;
        };
        if let Some(t) = node.cache.absolute_transform.valid() {
            return t;
        }
        let parent = node.parent;
        let mut at = match parent {
            Some(p) => self.absolute_transform(p),
            None => Transform::IDENTITY,
        };
        self.contribute(id, &mut at);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.cache.absolute_transform.store(&at);
        }
        at
    }

    /// Transform from the node's space to the space of ancestor `top`.
    ///
    /// `top`'s own transform is excluded. `None` yields the cached absolute
    /// transform; a relative result is never cached.
    pub fn absolute_transform_relative(&mut self, id: NodeId, top: Option<NodeId>) -> Transform {
        let Some(top) = top else {
            return self.absolute_transform(id);
        };
        let mut family: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            if n == top {
                break;
            }
            family.push(n);
            current = self.parent(n);
        }
        let mut at = Transform::IDENTITY;
        for n in family.into_iter().rev() {
            self.contribute(n, &mut at);
        }
        at
    }

    fn contribute(&mut self, id: NodeId, at: &mut Transform) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match node.transforms_enabled() {
            TransformsEnabled::All => {
                let local = self.local_transform(id);
                at.multiply(&local);
            }
            TransformsEnabled::Position => {
                let a = &node.attrs;
                at.translate(
                    attr::number_in(a, &builtin::X) - attr::number_in(a, &builtin::OFFSET_X),
                    attr::number_in(a, &builtin::Y) - attr::number_in(a, &builtin::OFFSET_Y),
                );
            }
            TransformsEnabled::None => {}
        }
    }

    /// The node's transforms mode.
    #[must_use]
    pub fn transforms_enabled(&self, id: NodeId) -> TransformsEnabled {
        self.nodes
            .get(&id)
            .map_or(TransformsEnabled::All, NodeData::transforms_enabled)
    }

    /// Sets the node's transforms mode.
    pub fn set_transforms_enabled(&mut self, id: NodeId, mode: TransformsEnabled) -> bool {
        self.set_declared(id, &builtin::TRANSFORMS_ENABLED, mode.as_str().into())
    }

    /// Whether the node and all of its ancestors are visible.
    pub fn is_visible(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if let Some(v) = node.cache.visible {
            return v;
        }
        let own = attr::bool_in(&node.attrs, &builtin::VISIBLE);
        let parent = node.parent;
        self.watch(id, CacheKey::Visible);
        let v = own && parent.is_none_or(|p| self.is_visible(p));
        if let Some(node) = self.nodes.get_mut(&id) {
            node.cache.visible = Some(v);
        }
        v
    }

    /// Whether the node and all of its ancestors listen for events.
    pub fn is_listening(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if let Some(v) = node.cache.listening {
            return v;
        }
        let own = attr::bool_in(&node.attrs, &builtin::LISTENING);
        let parent = node.parent;
        self.watch(id, CacheKey::Listening);
        let v = own && parent.is_none_or(|p| self.is_listening(p));
        if let Some(node) = self.nodes.get_mut(&id) {
            node.cache.listening = Some(v);
        }
        v
    }

    /// Own opacity times every ancestor's, clamped into `[0, 1]`.
    pub fn absolute_opacity(&mut self, id: NodeId) -> f64 {
        let Some(node) = self.nodes.get(&id) else {
            return 0.0;
        };
        if let Some(v) = node.cache.absolute_opacity {
            return v;
        }
        let own = attr::number_in(&node.attrs, &builtin::OPACITY).clamp(0.0, 1.0);
        let parent = node.parent;
        self.watch(id, CacheKey::AbsoluteOpacity);
        let v = own * parent.map_or(1.0, |p| self.absolute_opacity(p));
        if let Some(node) = self.nodes.get_mut(&id) {
            node.cache.absolute_opacity = Some(v);
        }
        v
    }

    /// Opacity of `id` relative to ancestor `top`, excluding `top`'s own.
    pub(crate) fn opacity_relative(&mut self, id: NodeId, top: Option<NodeId>) -> f64 {
        let Some(top) = top else {
            return self.absolute_opacity(id);
        };
        let mut out = 1.0;
        let mut current = Some(id);
        while let Some(n) = current {
            if n == top {
                break;
            }
            let Some(node) = self.nodes.get(&n) else {
                break;
            };
            out *= attr::number_in(&node.attrs, &builtin::OPACITY).clamp(0.0, 1.0);
            current = node.parent;
        }
        out
    }

    /// The stage the node is attached to, if any.
    pub fn stage_of(&mut self, id: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        if let Some(stage) = node.cache.stage {
            return stage;
        }
        let stage = if node.role == Role::Stage {
            Some(id)
        } else {
            node.parent.and_then(|p| self.stage_of(p))
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.cache.stage = Some(stage);
        }
        stage
    }

    /// Whether the node is attached to this scene's stage.
    pub fn is_on_stage(&mut self, id: NodeId) -> bool {
        self.stage_of(id).is_some()
    }

    /// Stage-space position of the node's origin (before its offset).
    ///
    /// With `top`, the position is relative to that ancestor instead.
    pub fn absolute_position(&mut self, id: NodeId, top: Option<NodeId>) -> Point {
        let mut t = self.absolute_transform_relative(id, top);
        let offset = self.offset(id);
        t.translate(offset.x, offset.y);
        t.translation()
    }

    /// Moves the node so its origin lands on stage point `pos`.
    pub fn set_absolute_position(&mut self, id: NodeId, pos: Point) -> bool {
        if !self.contains(id) {
            warn!("cannot position missing node {id}");
            return false;
        }
        let parent_t = match self.parent(id) {
            Some(p) => self.absolute_transform(p),
            None => Transform::IDENTITY,
        };
        let Some(inv) = parent_t.try_inverse() else {
            warn!("parent transform of node {id} is not invertible; position unchanged");
            return false;
        };
        let local = inv.point(pos);
        self.batch_transform_changes(id, |scene| {
            scene.set_position(id, local.to_vec2());
        });
        true
    }

    /// Scale of the node in stage space.
    pub fn absolute_scale(&mut self, id: NodeId) -> Vec2 {
        self.absolute_transform(id).decompose().scale
    }

    /// Sum of the node's and its ancestors' rotations, in degrees.
    #[must_use]
    pub fn absolute_rotation(&self, id: NodeId) -> f64 {
        let mut total = 0.0;
        let mut current = Some(id);
        while let Some(n) = current {
            total += self.rotation(n);
            current = self.parent(n);
        }
        total
    }

    /// The last pointer position mapped into the node's own space.
    pub fn relative_pointer_position(&mut self, id: NodeId) -> Option<Point> {
        let pos = self.pointer_position()?;
        let inv = self.absolute_transform(id).try_inverse()?;
        Some(inv.point(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneConfig;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn local_transform_composition_order() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        scene.set_position(g, Vec2::new(10.0, 0.0));
        scene.set_rotation(g, 90.0);
        scene.set_offset(g, Vec2::new(1.0, 0.0));
        let t = scene.local_transform(g);
        // Offset moves the origin first, then rotation, then translation.
        assert!(close(t.point(Point::new(1.0, 0.0)), Point::new(10.0, 0.0)));
        assert!(close(t.point(Point::new(2.0, 0.0)), Point::new(10.0, 1.0)));
    }

    #[test]
    fn transform_slot_goes_dirty_not_absent() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        assert_eq!(scene.cache_state(g, CacheKey::Transform), CacheState::Absent);
        scene.local_transform(g);
        assert_eq!(scene.cache_state(g, CacheKey::Transform), CacheState::Valid);
        scene.set_x(g, 4.0);
        assert_eq!(scene.cache_state(g, CacheKey::Transform), CacheState::Dirty);
        assert_eq!(scene.local_transform(g).translation(), Point::new(4.0, 0.0));
    }

    #[test]
    fn position_mode_ignores_rotation() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        scene.set_position(g, Vec2::new(5.0, 5.0));
        scene.set_rotation(g, 45.0);
        scene.set_transforms_enabled(g, TransformsEnabled::Position);
        let t = scene.absolute_transform(g);
        assert_eq!(t, Transform::from_translation(5.0, 5.0));
        scene.set_transforms_enabled(g, TransformsEnabled::None);
        assert_eq!(scene.absolute_transform(g), Transform::IDENTITY);
    }

    #[test]
    fn visibility_follows_ancestors() {
        let mut scene = Scene::new(SceneConfig::default());
        let layer = scene.create_layer();
        let group = scene.create_group();
        scene.add(scene.stage(), layer);
        scene.add(layer, group);
        assert!(scene.is_visible(group));
        scene.set_visible(layer, false);
        assert_eq!(scene.cache_state(group, CacheKey::Visible), CacheState::Absent);
        assert!(!scene.is_visible(group));
        scene.set_visible(layer, true);
        assert!(scene.is_visible(group));
    }

    #[test]
    fn opacity_read_is_cached_until_dependency_changes() {
        let mut scene = Scene::new(SceneConfig::default());
        let layer = scene.create_layer();
        let group = scene.create_group();
        scene.add(scene.stage(), layer);
        scene.add(layer, group);
        scene.set_opacity(layer, 0.5);
        scene.set_opacity(group, 0.5);
        assert_eq!(scene.absolute_opacity(group), 0.25);
        assert_eq!(
            scene.cache_state(group, CacheKey::AbsoluteOpacity),
            CacheState::Valid
        );
        scene.set_opacity(layer, 1.0);
        assert_eq!(
            scene.cache_state(group, CacheKey::AbsoluteOpacity),
            CacheState::Absent
        );
        assert_eq!(scene.absolute_opacity(group), 0.5);
    }

    #[test]
    fn batch_defers_invalidation_but_reads_stay_coherent() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        scene.absolute_transform(g);
        scene.batch_transform_changes(g, |scene| {
            scene.set_x(g, 3.0);
            assert_eq!(
                scene.cache_state(g, CacheKey::AbsoluteTransform),
                CacheState::Valid,
                "invalidation is deferred"
            );
            scene.set_y(g, 4.0);
            assert_eq!(
                scene.absolute_transform(g).translation(),
                Point::new(3.0, 4.0),
                "a read flushes pending invalidation"
            );
        });
        assert_eq!(scene.absolute_position(g, None), Point::new(3.0, 4.0));
    }

    #[test]
    fn absolute_position_round_trips_through_parent_transform() {
        let mut scene = Scene::new(SceneConfig::default());
        let layer = scene.create_layer();
        let group = scene.create_group();
        let inner = scene.create_group();
        scene.add(scene.stage(), layer);
        scene.add(layer, group);
        scene.add(group, inner);
        scene.set_position(group, Vec2::new(100.0, 50.0));
        scene.set_scale(group, Vec2::new(2.0, 2.0));
        scene.set_rotation(group, 30.0);

        assert!(scene.set_absolute_position(inner, Point::new(7.0, 9.0)));
        assert!(close(
            scene.absolute_position(inner, None),
            Point::new(7.0, 9.0)
        ));
    }

    #[test]
    fn relative_transform_excludes_top() {
        let mut scene = Scene::new(SceneConfig::default());
        let a = scene.create_group();
        let b = scene.create_group();
        let layer = scene.create_layer();
        scene.add(scene.stage(), layer);
        scene.add(layer, a);
        scene.add(a, b);
        scene.set_x(a, 10.0);
        scene.set_x(b, 1.0);
        assert_eq!(
            scene.absolute_transform_relative(b, Some(a)),
            Transform::from_translation(1.0, 0.0)
        );
        assert_eq!(
            scene.absolute_transform_relative(b, Some(b)),
            Transform::IDENTITY
        );
        assert_eq!(
            scene.absolute_transform(b),
            Transform::from_translation(11.0, 0.0)
        );
    }
}
