// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag-and-drop state machine.
//!
//! A qualifying press on a draggable node creates a [`DragElement`] in the
//! [`DragStatus::Ready`] state. It is promoted to [`DragStatus::Dragging`]
//! once the bound pointer has moved `dragDistance` away from where it was
//! pressed, and becomes [`DragStatus::Stopped`] just before the release is
//! dispatched. After the release the entry is removed and `dragend` fires.
//!
//! Events: one `dragstart`, a `dragmove` per movement, one `dragend`; all
//! bubble from the dragged node.

use alloc::rc::Rc;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Vec2};
use log::{debug, warn};

use crate::event::{Event, EventDetail};
use crate::pointer::{PointerId, PointerInput, PointerType};
use crate::{NodeId, Scene};

/// Where a drag element is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragStatus {
    /// Pressed, waiting for the pointer to travel the drag distance.
    Ready,
    /// Following the pointer.
    Dragging,
    /// Released; removed once the release has been dispatched.
    Stopped,
}

/// An in-flight drag of one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragElement {
    /// The dragged node.
    pub node: NodeId,
    /// Pointer position at the press.
    pub start_pointer: Point,
    /// Pointer position minus the node's absolute position at the press.
    pub offset: Vec2,
    /// Lifecycle state.
    pub status: DragStatus,
    /// The pointer driving the drag; `None` follows any pointer.
    pub pointer_id: Option<PointerId>,
    pub(crate) last_pointer: Point,
}

impl DragElement {
    /// Pointer travel since the press.
    #[must_use]
    pub fn total_offset(&self) -> Vec2 {
        self.last_pointer - self.start_pointer
    }

    fn follows(&self, pointer: PointerId) -> bool {
        self.pointer_id.is_none_or(|p| p == pointer)
    }
}

/// Constrains a dragged node's absolute position.
///
/// Receives the unconstrained position and returns the one to apply.
/// Returning `None` is a configuration error: it is logged and the
/// unconstrained position is used.
pub type DragBoundFn = Rc<dyn Fn(&Scene, NodeId, Point) -> Option<Point>>;

/// The drag elements of a scene.
#[derive(Clone, Debug, Default)]
pub(crate) struct DragRegistry {
    elements: Vec<DragElement>,
    pub(crate) just_dragged: bool,
}

impl DragRegistry {
    fn get(&self, node: NodeId) -> Option<&DragElement> {
        self.elements.iter().find(|e| e.node == node)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut DragElement> {
        self.elements.iter_mut().find(|e| e.node == node)
    }

    fn remove(&mut self, node: NodeId) -> Option<DragElement> {
        let index = self.elements.iter().position(|e| e.node == node)?;
        Some(self.elements.remove(index))
    }
}

const DRAG_LISTENERS: &str = "mousedown.trellis touchstart.trellis";

impl Scene {
    /// Installs or removes the press listeners that start drags, matching
    /// the node's `draggable` flag. Disabling stops an in-flight drag.
    pub(crate) fn sync_drag_listeners(&mut self, id: NodeId) {
        self.off(id, DRAG_LISTENERS);
        if self.draggable(id) {
            self.on(id, DRAG_LISTENERS, |scene, event| {
                scene.begin_drag_candidate(event);
            });
        } else {
            self.stop_drag(id);
        }
    }

    fn begin_drag_candidate(&mut self, event: &Event) {
        let (Some(node), Some(pointer)) = (event.current_target, event.pointer().copied()) else {
            return;
        };
        let checks_button = matches!(pointer.kind, PointerType::Mouse | PointerType::Pen);
        if checks_button
            && !pointer
                .button
                .is_some_and(|b| self.config.drag_buttons.contains(&b))
        {
            return;
        }
        if self.is_dragging(node) || self.drag.get(node).is_some() {
            return;
        }
        let blocked = self.drag.elements.iter().any(|e| {
            self.is_ancestor_of(node, e.node)
                || (e.status == DragStatus::Dragging && self.is_ancestor_of(e.node, node))
        });
        if blocked {
            return;
        }
        self.create_drag_element(node, pointer.position, Some(pointer.pointer_id));
    }

    fn create_drag_element(
        &mut self,
        node: NodeId,
        pointer: Point,
        pointer_id: Option<PointerId>,
    ) -> bool {
        if !self.is_on_stage(node) {
            warn!("cannot drag node {node}: it is not on the stage");
            return false;
        }
        let origin = self.absolute_position(node, None);
        self.drag.elements.push(DragElement {
            node,
            start_pointer: pointer,
            offset: pointer - origin,
            status: DragStatus::Ready,
            pointer_id,
            last_pointer: pointer,
        });
        true
    }

    fn fire_drag_event(&mut self, node: NodeId, name: &str, input: Option<&PointerInput>) {
        if !self.contains(node) {
            return;
        }
        let detail = input.map_or(EventDetail::None, |i| EventDetail::Pointer(i.detail()));
        let mut event = Event::new(name).with_detail(detail);
        event.target = Some(node);
        self.dispatch_and_bubble(node, &mut event, None);
    }

    /// Feeds a pointer move to every drag element bound to that pointer.
    pub(crate) fn drag_pointer_move(&mut self, input: &PointerInput) {
        let bound: Vec<NodeId> = self
            .drag
            .elements
            .iter()
            .filter(|e| e.follows(input.pointer_id))
            .map(|e| e.node)
            .collect();
        for node in bound {
            let Some(element) = self.drag.get(node).copied() else {
                continue;
            };
            if element.status == DragStatus::Ready {
                let travel = input.position - element.start_pointer;
                if travel.x.abs().max(travel.y.abs()) < self.drag_distance(node) {
                    continue;
                }
                if let Some(e) = self.drag.get_mut(node) {
                    e.status = DragStatus::Dragging;
                    e.pointer_id = Some(input.pointer_id);
                }
                debug!("drag started on node {node}");
                self.fire_drag_event(node, "dragstart", Some(input));
            }
            if self.is_dragging(node) {
                self.drag_to(node, input);
            }
        }
    }

    fn drag_to(&mut self, node: NodeId, input: &PointerInput) {
        let Some(element) = self.drag.get_mut(node) else {
            return;
        };
        element.last_pointer = input.position;
        let mut target = input.position - element.offset;
        let bound = self.nodes.get(&node).and_then(|n| n.drag_bound.clone());
        if let Some(bound) = bound {
            match bound(self, node, target) {
                Some(p) => target = p,
                None => warn!("drag bound of node {node} returned no position; ignoring it"),
            }
        }
        if self.absolute_position(node, None) != target {
            self.set_absolute_position(node, target);
            self.request_draw(node);
        }
        self.fire_drag_event(node, "dragmove", Some(input));
    }

    /// First half of a release: stop the pointer's active drags so the
    /// release dispatch sees them as finished and no click follows.
    pub(crate) fn end_drag_before(&mut self, pointer: PointerId) {
        let mut stopped = false;
        for e in &mut self.drag.elements {
            if e.follows(pointer) && e.status == DragStatus::Dragging {
                e.status = DragStatus::Stopped;
                stopped = true;
                debug!("drag stopped on node {}", e.node);
            }
        }
        if stopped {
            self.drag.just_dragged = true;
            self.pointer.suppress_click(pointer);
        }
    }

    /// Second half of a release: drop the pointer's drag elements and fire
    /// `dragend` for those that were dragging.
    pub(crate) fn end_drag_after(&mut self, input: &PointerInput) {
        let mut ended = Vec::new();
        self.drag.elements.retain(|e| {
            if !e.follows(input.pointer_id) {
                return true;
            }
            if e.status == DragStatus::Stopped {
                ended.push(e.node);
            }
            false
        });
        for node in ended {
            self.fire_drag_event(node, "dragend", Some(input));
        }
    }

    /// Starts dragging `id` from the current pointer position, skipping the
    /// drag distance.
    pub fn start_drag(&mut self, id: NodeId) -> bool {
        if self.is_dragging(id) {
            return false;
        }
        if self.drag.get(id).is_none() {
            let pointer = match self.pointer_position() {
                Some(p) => p,
                None => self.absolute_position(id, None),
            };
            if !self.create_drag_element(id, pointer, None) {
                return false;
            }
        }
        if let Some(e) = self.drag.get_mut(id) {
            e.status = DragStatus::Dragging;
        }
        debug!("drag started on node {id}");
        self.fire_drag_event(id, "dragstart", None);
        true
    }

    /// Ends any drag of `id`, firing `dragend` if it was dragging.
    ///
    /// Calling it again, or on a node that is not dragged, does nothing.
    pub fn stop_drag(&mut self, id: NodeId) -> bool {
        let Some(element) = self.drag.remove(id) else {
            return false;
        };
        if element.status == DragStatus::Ready {
            return false;
        }
        self.drag.just_dragged = true;
        debug!("drag stopped on node {id}");
        self.fire_drag_event(id, "dragend", None);
        true
    }

    /// Stops every drag of `id` or its descendants.
    pub(crate) fn cancel_drags_in(&mut self, id: NodeId) {
        let affected: Vec<NodeId> = self
            .drag
            .elements
            .iter()
            .map(|e| e.node)
            .filter(|n| *n == id || self.is_ancestor_of(id, *n))
            .collect();
        for node in affected {
            self.stop_drag(node);
        }
    }

    /// Whether `id` is following a pointer.
    #[must_use]
    pub fn is_dragging(&self, id: NodeId) -> bool {
        self.drag
            .get(id)
            .is_some_and(|e| e.status == DragStatus::Dragging)
    }

    /// Whether any node in the scene is being dragged.
    #[must_use]
    pub fn is_any_dragging(&self) -> bool {
        self.drag
            .elements
            .iter()
            .any(|e| e.status == DragStatus::Dragging)
    }

    /// The drag element of `id`, if any.
    #[must_use]
    pub fn drag_element(&self, id: NodeId) -> Option<DragElement> {
        self.drag.get(id).copied()
    }

    /// Number of live drag elements.
    #[must_use]
    pub fn drag_element_count(&self) -> usize {
        self.drag.elements.len()
    }

    /// Constrains drag positions of `id`; `None` removes the constraint.
    pub fn set_drag_bound(
        &mut self,
        id: NodeId,
        bound: Option<impl Fn(&Self, NodeId, Point) -> Option<Point> + 'static>,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            warn!("cannot set a drag bound on missing node {id}");
            return false;
        };
        node.drag_bound = bound.map(|f| Rc::new(f) as DragBoundFn);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::PointerAction;
    use crate::{SceneConfig, ShapeSpec};
    use alloc::string::String;
    use core::cell::RefCell;
    use kurbo::Rect;

    type Log = Rc<RefCell<Vec<String>>>;

    fn scene_with_square() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new(SceneConfig::new(200.0, 200.0));
        let layer = scene.create_layer();
        let group = scene.create_group();
        scene.add(scene.stage(), layer);
        scene.add(layer, group);
        let square = scene.create_shape(ShapeSpec::new("Rect", |ctx, _| {
            ctx.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
            ctx.fill();
        }));
        scene.add(group, square);
        (scene, group, square)
    }

    fn record(scene: &mut Scene, id: NodeId, log: &Log) {
        let log = log.clone();
        scene.on(id, "dragstart dragmove dragend click", move |_, e| {
            log.borrow_mut().push(e.name.clone());
        });
    }

    fn at(action: PointerAction, x: f64, y: f64) -> PointerInput {
        PointerInput::new(action, Point::new(x, y))
    }

    #[test]
    fn lifecycle_fires_start_moves_end() {
        let (mut scene, _, square) = scene_with_square();
        scene.set_draggable(square, true);
        let log = Log::default();
        record(&mut scene, square, &log);

        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        assert_eq!(
            scene.drag_element(square).map(|e| e.status),
            Some(DragStatus::Ready)
        );
        scene.handle_pointer(at(PointerAction::Move, 6.0, 5.0));
        assert!(!scene.is_dragging(square), "under the drag distance");
        scene.handle_pointer(at(PointerAction::Move, 10.0, 5.0));
        assert!(scene.is_dragging(square));
        assert_eq!(scene.position(square), Vec2::new(5.0, 0.0));
        scene.handle_pointer(at(PointerAction::Move, 20.0, 8.0));
        assert_eq!(scene.position(square), Vec2::new(15.0, 3.0));
        scene.handle_pointer(at(PointerAction::Up, 20.0, 8.0));

        assert_eq!(
            log.borrow().as_slice(),
            ["dragstart", "dragmove", "dragmove", "dragend"]
        );
        assert_eq!(scene.drag_element_count(), 0);
    }

    #[test]
    fn press_without_movement_still_clicks() {
        let (mut scene, _, square) = scene_with_square();
        scene.set_draggable(square, true);
        let log = Log::default();
        record(&mut scene, square, &log);
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        scene.handle_pointer(at(PointerAction::Up, 5.0, 5.0));
        assert_eq!(log.borrow().as_slice(), ["click"]);
        assert_eq!(scene.drag_element_count(), 0);
    }

    #[test]
    fn bound_constrains_and_none_is_ignored() {
        let (mut scene, _, square) = scene_with_square();
        scene.set_draggable(square, true);
        scene.set_drag_bound(
            square,
            Some(|_: &Scene, _: NodeId, p: Point| Some(Point::new(p.x, 0.0))),
        );
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        scene.handle_pointer(at(PointerAction::Move, 30.0, 40.0));
        assert_eq!(scene.position(square), Vec2::new(25.0, 0.0));

        scene.set_drag_bound(square, Some(|_: &Scene, _: NodeId, _: Point| None));
        scene.handle_pointer(at(PointerAction::Move, 35.0, 45.0));
        assert_eq!(scene.position(square), Vec2::new(30.0, 40.0));
    }

    #[test]
    fn inner_draggable_wins_over_ancestor() {
        let (mut scene, group, square) = scene_with_square();
        scene.set_draggable(group, true);
        scene.set_draggable(square, true);
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        scene.handle_pointer(at(PointerAction::Move, 50.0, 5.0));
        assert!(scene.is_dragging(square));
        assert!(!scene.is_dragging(group));
        assert_eq!(scene.drag_element_count(), 1);
    }

    #[test]
    fn dragging_a_group_moves_its_children() {
        let (mut scene, group, square) = scene_with_square();
        scene.set_draggable(group, true);
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        scene.handle_pointer(at(PointerAction::Move, 25.0, 5.0));
        assert!(scene.is_dragging(group));
        assert_eq!(scene.absolute_position(square, None), Point::new(20.0, 0.0));
    }

    #[test]
    fn other_buttons_do_not_drag() {
        let (mut scene, _, square) = scene_with_square();
        scene.set_draggable(square, true);
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0).with_button(Some(2)));
        assert_eq!(scene.drag_element_count(), 0);
    }

    #[test]
    fn touch_drags_without_buttons() {
        let (mut scene, _, square) = scene_with_square();
        scene.set_draggable(square, true);
        let finger = PointerId(3);
        let down = PointerInput::touch(PointerAction::Down, finger, Point::new(5.0, 5.0));
        scene.handle_pointer(down);
        let other = PointerInput::touch(PointerAction::Move, PointerId(4), Point::new(90.0, 5.0));
        scene.handle_pointer(other);
        assert!(!scene.is_dragging(square), "only the pressing finger drags");
        let moved = PointerInput::touch(PointerAction::Move, finger, Point::new(45.0, 5.0));
        scene.handle_pointer(moved);
        assert_eq!(scene.position(square), Vec2::new(40.0, 0.0));
    }

    #[test]
    fn stop_drag_is_idempotent() {
        let (mut scene, _, square) = scene_with_square();
        let log = Log::default();
        record(&mut scene, square, &log);
        assert!(scene.start_drag(square));
        assert!(scene.stop_drag(square));
        assert!(!scene.stop_drag(square));
        assert_eq!(log.borrow().as_slice(), ["dragstart", "dragend"]);
    }

    #[test]
    fn removal_and_disabling_end_drags() {
        let (mut scene, group, square) = scene_with_square();
        scene.set_draggable(square, true);
        let log = Log::default();
        record(&mut scene, square, &log);
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        scene.handle_pointer(at(PointerAction::Move, 50.0, 5.0));
        scene.remove(group);
        assert_eq!(scene.drag_element_count(), 0);
        assert_eq!(log.borrow().last().map(String::as_str), Some("dragend"));

        let (mut scene, _, square) = scene_with_square();
        scene.set_draggable(square, true);
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        scene.handle_pointer(at(PointerAction::Move, 50.0, 5.0));
        scene.set_draggable(square, false);
        assert!(!scene.is_any_dragging());
        assert_eq!(scene.listener_count(square, "mousedown"), 0);
    }

    #[test]
    fn hover_is_suppressed_while_dragging() {
        let (mut scene, _, square) = scene_with_square();
        scene.set_draggable(square, true);
        let moves = Rc::new(RefCell::new(0));
        let m = moves.clone();
        scene.on(square, "mousemove", move |_, _| *m.borrow_mut() += 1);
        scene.handle_pointer(at(PointerAction::Down, 5.0, 5.0));
        scene.handle_pointer(at(PointerAction::Move, 50.0, 5.0));
        scene.handle_pointer(at(PointerAction::Move, 52.0, 5.0));
        assert!(scene.is_dragging(square));
        assert_eq!(*moves.borrow(), 0, "the pointer is over the dragged node");
    }
}
