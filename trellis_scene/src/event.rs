// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener tables, dispatch and bubbling.
//!
//! Listeners are registered with `event[.namespace]` tokens:
//!
//! ```
//! use trellis_scene::{Scene, SceneConfig};
//!
//! let mut scene = Scene::new(SceneConfig::default());
//! let layer = scene.create_layer();
//! scene.add(scene.stage(), layer);
//! scene.on(layer, "poke.demo", |_, event| event.cancel_bubble = true);
//! let event = scene.fire(layer, "poke", true);
//! assert!(event.cancel_bubble);
//! scene.off(layer, ".demo");
//! ```
//!
//! For each node reached, role-level listeners run first (from [`Role::Node`]
//! down to the node's concrete role), followed by the node's own listeners,
//! each group in registration order. The handler list is copied before any
//! handler runs, so handlers may freely add or remove listeners and nodes.

use alloc::rc::Rc;
use alloc::string::String;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use log::warn;
use smallvec::SmallVec;

use crate::pointer::{PointerId, PointerType};
use crate::{NodeId, Role, Scene, Value};

/// Namespace of engine-installed listeners.
///
/// `off` only removes these when the namespace is named explicitly.
pub const INTERNAL_NAMESPACE: &str = "trellis";

/// A listener callback.
pub type Handler = Rc<dyn Fn(&mut Scene, &mut Event)>;

/// Payload of an [`Event`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventDetail {
    /// No payload.
    #[default]
    None,
    /// A scalar attribute changed.
    Change {
        /// Attribute key.
        attr: String,
        /// Previous value, `None` when it was unset.
        old: Option<Value>,
        /// New value, `None` when it was removed.
        new: Option<Value>,
    },
    /// A composite attribute changed.
    VectorChange {
        /// Composite name.
        attr: String,
        /// Previous value.
        old: Vec2,
        /// New value.
        new: Vec2,
    },
    /// Pointer input.
    Pointer(PointerDetail),
    /// A child was added to or removed from the current target.
    Child(NodeId),
    /// Application data.
    Custom(Value),
}

/// Pointer payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerDetail {
    /// The pointer.
    pub pointer_id: PointerId,
    /// Stage-space position.
    pub position: Point,
    /// Pressed button, for mouse and pen.
    pub button: Option<u16>,
    /// Device kind.
    pub kind: PointerType,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

/// An event travelling through the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event type, without namespace.
    pub name: String,
    /// The node the event was fired on.
    pub target: Option<NodeId>,
    /// The node whose listeners are running.
    pub current_target: Option<NodeId>,
    /// Set by a handler to stop bubbling after the current node.
    pub cancel_bubble: bool,
    /// Payload.
    pub detail: EventDetail,
}

impl Event {
    /// An event with no payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            current_target: None,
            cancel_bubble: false,
            detail: EventDetail::None,
        }
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Stops bubbling after the current node.
    pub fn stop_propagation(&mut self) {
        self.cancel_bubble = true;
    }

    /// The pointer payload, if any.
    #[must_use]
    pub fn pointer(&self) -> Option<&PointerDetail> {
        match &self.detail {
            EventDetail::Pointer(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Clone)]
struct Listener {
    namespace: String,
    handler: Handler,
}

/// Ordered listeners keyed by event type.
#[derive(Clone, Default)]
pub(crate) struct ListenerTable {
    by_event: HashMap<String, SmallVec<[Listener; 2]>>,
}

impl ListenerTable {
    pub(crate) fn add(&mut self, event: &str, namespace: &str, handler: Handler) {
        self.by_event
            .entry_ref(event)
            .or_default()
            .push(Listener {
                namespace: String::from(namespace),
                handler,
            });
    }

    /// Removes listeners for `event` (every event when `None`) whose
    /// namespace matches (any non-internal namespace when `None`).
    pub(crate) fn remove(&mut self, event: Option<&str>, namespace: Option<&str>) -> usize {
        let keep = |l: &Listener| match namespace {
            Some(ns) => l.namespace != ns,
            None => l.namespace == INTERNAL_NAMESPACE,
        };
        let mut removed = 0;
        match event {
            Some(event) => {
                if let Some(list) = self.by_event.get_mut(event) {
                    let before = list.len();
                    list.retain(|l| keep(l));
                    removed = before - list.len();
                    if list.is_empty() {
                        self.by_event.remove(event);
                    }
                }
            }
            None => {
                self.by_event.retain(|_, list| {
                    let before = list.len();
                    list.retain(|l| keep(l));
                    removed += before - list.len();
                    !list.is_empty()
                });
            }
        }
        removed
    }

    fn collect_into(&self, event: &str, out: &mut SmallVec<[Handler; 8]>) {
        if let Some(list) = self.by_event.get(event) {
            out.extend(list.iter().map(|l| l.handler.clone()));
        }
    }

    pub(crate) fn count(&self, event: &str) -> usize {
        self.by_event.get(event).map_or(0, SmallVec::len)
    }
}

/// Splits `"a.ns b"` into `(event, namespace)` pairs.
fn tokens(spec: &str) -> impl Iterator<Item = (&str, &str)> {
    spec.split_whitespace()
        .map(|t| t.split_once('.').unwrap_or((t, "")))
}

fn is_enter_leave(name: &str) -> bool {
    matches!(name, "mouseenter" | "mouseleave")
}

impl Scene {
    /// Registers `handler` for each `event[.namespace]` token in `spec`.
    pub fn on(
        &mut self,
        id: NodeId,
        spec: &str,
        handler: impl Fn(&mut Self, &mut Event) + 'static,
    ) -> bool {
        let handler: Handler = Rc::new(handler);
        let Some(node) = self.nodes.get_mut(&id) else {
            warn!("cannot add listeners to missing node {id}");
            return false;
        };
        let mut added = false;
        for (event, namespace) in tokens(spec) {
            if event.is_empty() {
                warn!("listener token \".{namespace}\" has no event type; ignored");
                continue;
            }
            node.listeners.add(event, namespace, handler.clone());
            added = true;
        }
        added
    }

    /// Removes listeners by `event`, `.namespace`, or `event.namespace`.
    ///
    /// Returns the number of listeners removed.
    pub fn off(&mut self, id: NodeId, spec: &str) -> usize {
        let Some(node) = self.nodes.get_mut(&id) else {
            return 0;
        };
        let mut removed = 0;
        for (event, namespace) in tokens(spec) {
            let event = (!event.is_empty()).then_some(event);
            let namespace = (!namespace.is_empty()).then_some(namespace);
            if event.is_none() && namespace.is_none() {
                continue;
            }
            removed += node.listeners.remove(event, namespace);
        }
        removed
    }

    /// Registers a listener shared by every node whose role lineage includes `role`.
    pub fn on_role(
        &mut self,
        role: Role,
        spec: &str,
        handler: impl Fn(&mut Self, &mut Event) + 'static,
    ) {
        let handler: Handler = Rc::new(handler);
        let table = self.role_listeners.entry(role).or_default();
        for (event, namespace) in tokens(spec) {
            if !event.is_empty() {
                table.add(event, namespace, handler.clone());
            }
        }
    }

    /// Removes role-level listeners, with the same token rules as [`Scene::off`].
    pub fn off_role(&mut self, role: Role, spec: &str) -> usize {
        let Some(table) = self.role_listeners.get_mut(&role) else {
            return 0;
        };
        let mut removed = 0;
        for (event, namespace) in tokens(spec) {
            let event = (!event.is_empty()).then_some(event);
            let namespace = (!namespace.is_empty()).then_some(namespace);
            if event.is_some() || namespace.is_some() {
                removed += table.remove(event, namespace);
            }
        }
        removed
    }

    /// Number of instance listeners for `event` on `id`.
    #[must_use]
    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.nodes.get(&id).map_or(0, |n| n.listeners.count(event))
    }

    /// Fires a payload-free event on `id`, optionally bubbling.
    pub fn fire(&mut self, id: NodeId, name: &str, bubble: bool) -> Event {
        self.fire_event(id, Event::new(name), bubble)
    }

    /// Fires `event` on `id`, optionally bubbling, and returns it after dispatch.
    pub fn fire_event(&mut self, id: NodeId, mut event: Event, bubble: bool) -> Event {
        if event.target.is_none() {
            event.target = Some(id);
        }
        if bubble {
            self.dispatch_and_bubble(id, &mut event, None);
        } else {
            self.dispatch(id, &mut event);
        }
        event
    }

    /// Runs the listeners of a single node.
    pub(crate) fn dispatch(&mut self, id: NodeId, event: &mut Event) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        event.current_target = Some(id);
        let mut handlers: SmallVec<[Handler; 8]> = SmallVec::new();
        for role in node.role.lineage() {
            if let Some(table) = self.role_listeners.get(role) {
                table.collect_into(&event.name, &mut handlers);
            }
        }
        node.listeners.collect_into(&event.name, &mut handlers);
        for handler in handlers {
            handler(self, event);
        }
    }

    /// Dispatches on `id` and then on each listening ancestor.
    ///
    /// For `mouseenter`/`mouseleave`, `related` is the node the pointer came
    /// from or went to; the walk stops at the lowest common ancestor of `id`
    /// and `related`, and never reaches the stage.
    pub(crate) fn dispatch_and_bubble(
        &mut self,
        id: NodeId,
        event: &mut Event,
        related: Option<NodeId>,
    ) {
        let enter_leave = is_enter_leave(&event.name);
        let stop_at = if enter_leave {
            related
                .filter(|r| self.contains(*r))
                .and_then(|r| self.common_ancestor(id, r))
        } else {
            None
        };
        let mut current = Some(id);
        while let Some(n) = current {
            if enter_leave
                && (Some(n) == stop_at || self.role(n) == Some(Role::Stage))
            {
                break;
            }
            if !self.contains(n) {
                break;
            }
            self.dispatch(n, event);
            if event.cancel_bubble {
                break;
            }
            current = match self.parent(n) {
                Some(p) if self.is_listening(p) => Some(p),
                _ => None,
            };
        }
    }
}
