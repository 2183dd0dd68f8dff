// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree mutation: attaching, detaching, destroying and reordering children.

use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, warn};
use smallvec::SmallVec;

use crate::attr::{self, builtin};
use crate::event::{Event, EventDetail};
use crate::{NodeId, Scene};

impl Scene {
    /// Appends `child` to `parent`, moving it out of its current container.
    ///
    /// Fails with a warning when the roles are incompatible, when `child` is
    /// `parent` or one of its ancestors, or when either node is missing.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> bool {
        let (Some(parent_role), Some(child_role)) = (self.role(parent), self.role(child)) else {
            warn!("cannot add {child} to {parent}: node does not exist");
            return false;
        };
        if parent == child || self.is_ancestor_of(child, parent) {
            warn!("cannot add {child} to {parent}: a node cannot contain its own ancestor");
            return false;
        }
        if !parent_role.accepts(child_role) {
            warn!("cannot add {child_role} {child} to {parent_role} {parent}");
            return false;
        }
        if self.parent(child).is_some() {
            self.detach(child);
        }

        let Some(p) = self.nodes.get_mut(&parent) else {
            return false;
        };
        let index = p.children.len();
        p.children.push(child);
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
            c.index = index;
        }
        self.clear_structural_caches(child);
        if self.is_on_stage(parent) {
            self.register_subtree(child);
        }

        let mut event = Event::new("add").with_detail(EventDetail::Child(child));
        event.target = Some(parent);
        self.dispatch(parent, &mut event);
        self.request_draw(child);
        true
    }

    /// Moves `id` under `new_parent`.
    pub fn move_to(&mut self, id: NodeId, new_parent: NodeId) -> bool {
        self.add(new_parent, id)
    }

    /// Detaches `id` from its container. The node stays alive.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if self.parent(id).is_none() {
            self.cancel_drags_in(id);
            self.clear_structural_caches(id);
            return false;
        }
        self.request_draw(id);
        self.detach(id)
    }

    fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        self.cancel_drags_in(id);
        if self.is_on_stage(id) {
            self.unregister_subtree(id);
        }
        let index = self.nodes.get(&id).map_or(0, |n| n.index);
        if let Some(p) = self.nodes.get_mut(&parent) {
            if p.children.get(index) == Some(&id) {
                p.children.remove(index);
            } else {
                p.children.retain(|c| *c != id);
            }
        }
        self.reindex_children(parent);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
            node.index = 0;
        }
        self.clear_structural_caches(id);

        let mut event = Event::new("remove").with_detail(EventDetail::Child(id));
        event.target = Some(parent);
        self.dispatch(parent, &mut event);
        true
    }

    /// Detaches `id` and deletes it and its whole subtree from the scene.
    ///
    /// Raster caches are released and ids held elsewhere stop resolving.
    pub fn destroy(&mut self, id: NodeId) -> bool {
        if id == self.stage {
            warn!("the stage cannot be destroyed; drop the scene instead");
            return false;
        }
        if !self.contains(id) {
            return false;
        }
        self.remove(id);
        for n in self.subtree(id) {
            if let Some(node) = self.nodes.remove(&n) {
                if node.raster.is_some() {
                    debug!("released raster cache of destroyed node {n}");
                }
            }
            self.pointer.forget(n);
            self.animations.forget_layer(n);
        }
        true
    }

    /// Detaches every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.remove(child);
        }
    }

    /// Destroys every child of `id`.
    pub fn destroy_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.destroy(child);
        }
    }

    fn reindex_children(&mut self, parent: NodeId) {
        let children = match self.nodes.get_mut(&parent) {
            Some(p) => core::mem::take(&mut p.children),
            None => return,
        };
        for (i, c) in children.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(c) {
                node.index = i;
            }
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children = children;
        }
    }

    fn reorder(
        &mut self,
        id: NodeId,
        op: &str,
        target: impl FnOnce(usize, usize) -> Option<usize>,
    ) -> bool {
        let Some(parent) = self.parent(id) else {
            warn!("node {id} has no parent; {op} is ignored");
            return false;
        };
        let len = self.children(parent).len();
        let index = self.z_index(id);
        let Some(to) = target(index, len) else {
            return false;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            let moved = p.children.remove(index);
            p.children.insert(to, moved);
        }
        self.reindex_children(parent);
        self.request_draw(id);
        true
    }

    /// Moves the node above all of its siblings.
    pub fn move_to_top(&mut self, id: NodeId) -> bool {
        self.reorder(id, "move_to_top", |index, len| {
            (index + 1 < len).then(|| len - 1)
        })
    }

    /// Moves the node one step up.
    pub fn move_up(&mut self, id: NodeId) -> bool {
        self.reorder(id, "move_up", |index, len| {
            (index + 1 < len).then_some(index + 1)
        })
    }

    /// Moves the node one step down.
    pub fn move_down(&mut self, id: NodeId) -> bool {
        self.reorder(id, "move_down", |index, _| index.checked_sub(1))
    }

    /// Moves the node below all of its siblings.
    pub fn move_to_bottom(&mut self, id: NodeId) -> bool {
        self.reorder(id, "move_to_bottom", |index, _| (index > 0).then_some(0))
    }

    /// Places the node at sibling position `z`.
    pub fn set_z_index(&mut self, id: NodeId, z: usize) -> bool {
        let Some(parent) = self.parent(id) else {
            warn!("node {id} has no parent; set_z_index is ignored");
            return false;
        };
        let len = self.children(parent).len();
        if z >= len {
            warn!(
                "z-index {z} is out of range for node {id}; valid range is 0..={}",
                len.saturating_sub(1)
            );
            return false;
        }
        self.reorder(id, "set_z_index", |_, _| Some(z))
    }

    /// Position among siblings.
    #[must_use]
    pub fn z_index(&self, id: NodeId) -> usize {
        self.nodes.get(&id).map_or(0, |n| n.index)
    }

    /// One-based position in a breadth-first walk of the stage's descendants.
    ///
    /// A node not on the stage logs a warning and reports `0`.
    pub fn absolute_z_index(&mut self, id: NodeId) -> usize {
        if id == self.stage {
            return 0;
        }
        if !self.is_on_stage(id) {
            warn!("node {id} is not on a stage; absolute z-index is 0");
            return 0;
        }
        let mut level: Vec<NodeId> = self.children(self.stage).to_vec();
        let mut position = 0;
        while !level.is_empty() {
            let mut next = Vec::new();
            for n in level {
                position += 1;
                if n == id {
                    return position;
                }
                next.extend_from_slice(self.children(n));
            }
            level = next;
        }
        0
    }

    fn register_subtree(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            let Some(node) = self.nodes.get(&n) else {
                continue;
            };
            let key = String::from(attr::text_in(&node.attrs, &builtin::ID));
            let names: SmallVec<[String; 2]> = attr::text_in(&node.attrs, &builtin::NAME)
                .split_whitespace()
                .map(String::from)
                .collect();
            if !key.is_empty() {
                self.register_id(&key, n);
            }
            for name in names {
                self.register_name(name, n);
            }
        }
    }

    fn unregister_subtree(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            let Some(node) = self.nodes.get(&n) else {
                continue;
            };
            let key = String::from(attr::text_in(&node.attrs, &builtin::ID));
            let names: SmallVec<[String; 2]> = attr::text_in(&node.attrs, &builtin::NAME)
                .split_whitespace()
                .map(String::from)
                .collect();
            self.unregister_id(&key, n);
            for name in names {
                self.unregister_name(&name, n);
            }
        }
    }

    fn register_id(&mut self, key: &str, id: NodeId) {
        if let Some(previous) = self.ids.insert(String::from(key), id) {
            if previous != id {
                debug!("id {key:?} now resolves to {id} instead of {previous}");
            }
        }
    }

    fn unregister_id(&mut self, key: &str, id: NodeId) {
        if self.ids.get(key) == Some(&id) {
            self.ids.remove(key);
        }
    }

    fn register_name(&mut self, name: String, id: NodeId) {
        let list = self.names.entry(name).or_default();
        if !list.contains(&id) {
            list.push(id);
        }
    }

    fn unregister_name(&mut self, name: &str, id: NodeId) {
        if let Some(list) = self.names.get_mut(name) {
            list.retain(|n| *n != id);
            if list.is_empty() {
                self.names.remove(name);
            }
        }
    }

    pub(crate) fn reregister_id(&mut self, id: NodeId, old: Option<&str>) {
        if !self.is_on_stage(id) {
            return;
        }
        if let Some(old) = old {
            self.unregister_id(old, id);
        }
        let key = String::from(self.get_text(id, &builtin::ID));
        if !key.is_empty() {
            self.register_id(&key, id);
        }
    }

    pub(crate) fn reregister_names(&mut self, id: NodeId, old: Option<&str>) {
        if !self.is_on_stage(id) {
            return;
        }
        for name in old.unwrap_or_default().split_whitespace() {
            self.unregister_name(name, id);
        }
        let names: SmallVec<[String; 2]> = self
            .get_text(id, &builtin::NAME)
            .split_whitespace()
            .map(String::from)
            .collect();
        for name in names {
            self.register_name(name, id);
        }
    }
}
