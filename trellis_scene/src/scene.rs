// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene arena.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::animation::AnimationRegistry;
use crate::attr::TRANSFORM_CHANGE_EVENTS;
use crate::drag::DragRegistry;
use crate::event::{Handler, INTERNAL_NAMESPACE, ListenerTable};
use crate::node::{BatchEntry, NodeData};
use crate::pointer::PointerState;
use crate::reference::RefSurfaceFactory;
use crate::render::{Drawing, ShapeSpec};
use crate::surface::{Surface, SurfaceFactory};
use crate::{Event, NodeId, Role, SceneConfig};

/// A stage and every node created for it.
///
/// The scene owns all nodes in an arena keyed by [`NodeId`]. Nodes are created
/// detached and attached with [`Scene::add`]. Parent links are plain ids, so
/// the tree holds no reference cycles.
///
/// The scene also owns the state shared by its nodes: the id and name lookup
/// tables, the drag registry, the pointer state, the animation registry and
/// the surface factory.
pub struct Scene {
    pub(crate) nodes: HashMap<NodeId, NodeData>,
    pub(crate) stage: NodeId,
    pub(crate) config: SceneConfig,
    pub(crate) role_listeners: HashMap<Role, ListenerTable>,
    pub(crate) ids: HashMap<String, NodeId>,
    pub(crate) names: HashMap<String, SmallVec<[NodeId; 2]>>,
    pub(crate) drag: DragRegistry,
    pub(crate) pointer: PointerState,
    pub(crate) animations: AnimationRegistry,
    pub(crate) transform_batch: SmallVec<[BatchEntry; 2]>,
    pub(crate) surfaces: Box<dyn SurfaceFactory>,
    pub(crate) scratch: Option<Box<dyn Surface>>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("stage", &self.stage)
            .field("nodes", &self.nodes.len())
            .field("config", &self.config)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// A scene drawing through the reference CPU backend.
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self::with_surface_factory(config, Box::new(RefSurfaceFactory::default()))
    }

    /// A scene whose layer, cache and scratch surfaces come from `surfaces`.
    #[must_use]
    pub fn with_surface_factory(config: SceneConfig, surfaces: Box<dyn SurfaceFactory>) -> Self {
        let stage = NodeId::next();
        let mut nodes = HashMap::new();
        nodes.insert(stage, NodeData::new(Role::Stage, Cow::Borrowed("Stage")));
        let mut scene = Self {
            nodes,
            stage,
            config,
            role_listeners: HashMap::new(),
            ids: HashMap::new(),
            names: HashMap::new(),
            drag: DragRegistry::default(),
            pointer: PointerState::default(),
            animations: AnimationRegistry::default(),
            transform_batch: SmallVec::new(),
            surfaces,
            scratch: None,
        };
        scene.install_builtin_listeners();
        scene
    }

    fn install_builtin_listeners(&mut self) {
        let invalidate: Handler = Rc::new(|scene: &mut Self, event: &mut Event| {
            if let Some(id) = event.current_target {
                scene.invalidate_transform(id);
            }
        });
        let table = self.role_listeners.entry(Role::Node).or_default();
        for event in TRANSFORM_CHANGE_EVENTS {
            table.add(event, INTERNAL_NAMESPACE, invalidate.clone());
        }
    }

    /// Settings the scene was created with.
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The stage node.
    #[must_use]
    pub fn stage(&self) -> NodeId {
        self.stage
    }

    fn insert_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::next();
        self.nodes.insert(id, data);
        id
    }

    /// Creates a detached layer.
    pub fn create_layer(&mut self) -> NodeId {
        self.insert_node(NodeData::new(Role::Layer, Cow::Borrowed("Layer")))
    }

    /// Creates a detached group.
    pub fn create_group(&mut self) -> NodeId {
        self.insert_node(NodeData::new(Role::Group, Cow::Borrowed("Group")))
    }

    /// Creates a detached shape drawn by `spec`.
    pub fn create_shape(&mut self, spec: ShapeSpec) -> NodeId {
        let ShapeSpec {
            class_name,
            scene_fn,
            hit_fn,
            self_rect,
        } = spec;
        let mut data = NodeData::new(Role::Shape, class_name);
        data.drawing = Some(Drawing {
            scene_fn,
            hit_fn,
            self_rect,
        });
        self.insert_node(data)
    }

    /// Whether `id` names a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes, including the stage.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the stage is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node's role.
    #[must_use]
    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.nodes.get(&id).map(|n| n.role)
    }

    /// The node's class name, such as `"Rect"` or `"Layer"`.
    #[must_use]
    pub fn class_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.class_name.as_ref())
    }

    /// The owning container.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id)?.parent
    }

    /// Children in paint order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Whether the node has children.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// Number of ancestors.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Lowest node that is `a` or an ancestor of `a` and also `b` or an
    /// ancestor of `b`.
    #[must_use]
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let path_b: SmallVec<[NodeId; 16]> =
            core::iter::once(b).chain(self.ancestors(b)).collect();
        core::iter::once(a)
            .chain(self.ancestors(a))
            .find(|n| path_b.contains(n))
    }

    /// The node's layer: itself when it is one, else its nearest layer ancestor.
    #[must_use]
    pub fn layer_of(&self, id: NodeId) -> Option<NodeId> {
        core::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.role(*n) == Some(Role::Layer))
    }

    /// The node with lookup id `key` on this stage.
    #[must_use]
    pub fn node_by_id(&self, key: &str) -> Option<NodeId> {
        self.ids.get(key).copied()
    }

    /// Nodes on this stage tagged with `name`, in registration order.
    #[must_use]
    pub fn nodes_by_name(&self, name: &str) -> &[NodeId] {
        self.names
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.push(id);
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.get(&n) {
                out.push(n);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_scene_has_only_the_stage() {
        let scene = Scene::new(SceneConfig::default());
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.role(scene.stage()), Some(Role::Stage));
        assert_eq!(scene.parent(scene.stage()), None);
    }

    #[test]
    fn common_ancestor_of_siblings_and_lines() {
        let mut scene = Scene::new(SceneConfig::default());
        let layer = scene.create_layer();
        let a = scene.create_group();
        let b = scene.create_group();
        let a1 = scene.create_group();
        scene.add(scene.stage(), layer);
        scene.add(layer, a);
        scene.add(layer, b);
        scene.add(a, a1);
        assert_eq!(scene.common_ancestor(a1, b), Some(layer));
        assert_eq!(scene.common_ancestor(a1, a), Some(a));
        assert_eq!(scene.depth(a1), 3);
        assert!(scene.is_ancestor_of(layer, a1));
        assert!(!scene.is_ancestor_of(a1, a1));
        assert_eq!(scene.layer_of(a1), Some(layer));
    }

    #[test]
    fn subtree_is_preorder() {
        let mut scene = Scene::new(SceneConfig::default());
        let layer = scene.create_layer();
        let a = scene.create_group();
        let b = scene.create_group();
        let a1 = scene.create_group();
        scene.add(scene.stage(), layer);
        scene.add(layer, a);
        scene.add(layer, b);
        scene.add(a, a1);
        assert_eq!(scene.subtree(layer), [layer, a, a1, b]);
    }
}
