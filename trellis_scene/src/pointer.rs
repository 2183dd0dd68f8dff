// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer routing: hover transitions, clicks and drag input.
//!
//! Hosts feed normalized [`PointerInput`]s to [`Scene::handle_pointer`].
//! Mouse and pen share the mouse event family; touch has its own family
//! with no hover events:
//!
//! | input  | mouse / pen                                        | touch        |
//! |--------|----------------------------------------------------|--------------|
//! | down   | `mousedown`                                        | `touchstart` |
//! | move   | `mouseout` `mouseleave` `mouseover` `mouseenter` `mousemove` | `touchmove` |
//! | up     | `mouseup` `click` `dblclick`                       | `touchend` `tap` `dbltap` |
//!
//! Inputs that hit nothing are delivered to the stage.
//!
//! ```
//! use std::{cell::Cell, rc::Rc};
//! use kurbo::{Point, Rect};
//! use trellis_scene::{PointerAction, PointerInput, Scene, SceneConfig, ShapeSpec};
//!
//! let mut scene = Scene::new(SceneConfig::new(100.0, 100.0));
//! let layer = scene.create_layer();
//! scene.add(scene.stage(), layer);
//! let button = scene.create_shape(ShapeSpec::new("Rect", |ctx, _| {
//!     ctx.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
//!     ctx.fill();
//! }));
//! scene.add(layer, button);
//!
//! let clicks = Rc::new(Cell::new(0));
//! let count = clicks.clone();
//! scene.on(button, "click", move |_, _| count.set(count.get() + 1));
//!
//! let at = Point::new(5.0, 5.0);
//! scene.handle_pointer(PointerInput::new(PointerAction::Down, at));
//! scene.handle_pointer(PointerInput::new(PointerAction::Up, at));
//! assert_eq!(clicks.get(), 1);
//! ```

use kurbo::Point;
use smallvec::SmallVec;

use crate::event::{Event, EventDetail, PointerDetail};
use crate::{NodeId, Scene};

/// Host-assigned pointer identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

/// Kind of pointing device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerType {
    /// A mouse.
    #[default]
    Mouse,
    /// A finger on a touch screen.
    Touch,
    /// A stylus.
    Pen,
}

/// What happened to the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerAction {
    /// Button pressed or contact started.
    Down,
    /// Moved.
    Move,
    /// Button released or contact ended.
    Up,
    /// The host aborted the interaction.
    ///
    /// Dispatches `mouseup` or `touchend` and ends drags like [`Up`](Self::Up),
    /// but never produces a click or tap.
    Cancel,
    /// Left the stage.
    Leave,
}

/// One normalized pointer input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    /// What happened.
    pub action: PointerAction,
    /// Which pointer.
    pub pointer_id: PointerId,
    /// Device kind.
    pub pointer_type: PointerType,
    /// Stage-space position.
    pub position: Point,
    /// Button number for mouse and pen presses.
    pub button: Option<u16>,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

impl PointerInput {
    /// A mouse input from pointer 0; presses and releases use button 0.
    #[must_use]
    pub fn new(action: PointerAction, position: Point) -> Self {
        Self {
            action,
            pointer_id: PointerId(0),
            pointer_type: PointerType::Mouse,
            position,
            button: matches!(action, PointerAction::Down | PointerAction::Up).then_some(0),
            time_ms: 0,
        }
    }

    /// A touch input.
    #[must_use]
    pub fn touch(action: PointerAction, pointer_id: PointerId, position: Point) -> Self {
        Self {
            action,
            pointer_id,
            pointer_type: PointerType::Touch,
            position,
            button: None,
            time_ms: 0,
        }
    }

    /// Replaces the device kind.
    #[must_use]
    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self
    }

    /// Replaces the button.
    #[must_use]
    pub fn with_button(mut self, button: Option<u16>) -> Self {
        self.button = button;
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn at(mut self, time_ms: u64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub(crate) fn detail(&self) -> PointerDetail {
        PointerDetail {
            pointer_id: self.pointer_id,
            position: self.position,
            button: self.button,
            kind: self.pointer_type,
            time_ms: self.time_ms,
        }
    }
}

struct EventNames {
    down: &'static str,
    moved: &'static str,
    up: &'static str,
    hover: Option<HoverNames>,
    click: &'static str,
    dbl: &'static str,
}

struct HoverNames {
    over: &'static str,
    out: &'static str,
    enter: &'static str,
    leave: &'static str,
}

const MOUSE: EventNames = EventNames {
    down: "mousedown",
    moved: "mousemove",
    up: "mouseup",
    hover: Some(HoverNames {
        over: "mouseover",
        out: "mouseout",
        enter: "mouseenter",
        leave: "mouseleave",
    }),
    click: "click",
    dbl: "dblclick",
};

const TOUCH: EventNames = EventNames {
    down: "touchstart",
    moved: "touchmove",
    up: "touchend",
    hover: None,
    click: "tap",
    dbl: "dbltap",
};

/// Hover and double-click bookkeeping for one event family.
#[derive(Clone, Copy, Debug, Default)]
struct FamilyState {
    hovered: Option<NodeId>,
    stage_hovered: bool,
    last_click: Option<(NodeId, u64)>,
}

impl FamilyState {
    fn forget(&mut self, node: NodeId) {
        if self.hovered == Some(node) {
            self.hovered = None;
        }
        if self.last_click.is_some_and(|(n, _)| n == node) {
            self.last_click = None;
        }
    }
}

/// A pointer that is down, with the node it pressed.
#[derive(Clone, Copy, Debug)]
struct Press {
    pointer: PointerId,
    node: Option<NodeId>,
    listen_click: bool,
}

/// Pointer state owned by a scene.
#[derive(Clone, Debug, Default)]
pub(crate) struct PointerState {
    positions: SmallVec<[(PointerId, Point); 2]>,
    last: Option<Point>,
    mouse: FamilyState,
    touch: FamilyState,
    presses: SmallVec<[Press; 2]>,
    captures: SmallVec<[(PointerId, NodeId); 1]>,
}

impl PointerState {
    fn family(&mut self, kind: PointerType) -> &mut FamilyState {
        match kind {
            PointerType::Touch => &mut self.touch,
            PointerType::Mouse | PointerType::Pen => &mut self.mouse,
        }
    }

    fn set_position(&mut self, pointer: PointerId, position: Point) {
        match self.positions.iter_mut().find(|(p, _)| *p == pointer) {
            Some(entry) => entry.1 = position,
            None => self.positions.push((pointer, position)),
        }
        self.last = Some(position);
    }

    fn remove_position(&mut self, pointer: PointerId) {
        self.positions.retain(|(p, _)| *p != pointer);
    }

    fn capture(&self, pointer: PointerId) -> Option<NodeId> {
        self.captures
            .iter()
            .find(|(p, _)| *p == pointer)
            .map(|(_, n)| *n)
    }

    fn press(&mut self, pointer: PointerId, node: Option<NodeId>) {
        self.presses.retain(|p| p.pointer != pointer);
        self.presses.push(Press {
            pointer,
            node,
            listen_click: true,
        });
    }

    fn take_press(&mut self, pointer: PointerId) -> Option<Press> {
        let index = self.presses.iter().position(|p| p.pointer == pointer)?;
        Some(self.presses.remove(index))
    }

    /// No click follows the current press of `pointer`.
    pub(crate) fn suppress_click(&mut self, pointer: PointerId) {
        for press in self.presses.iter_mut().filter(|p| p.pointer == pointer) {
            press.listen_click = false;
        }
    }

    /// Drops every reference to a destroyed node.
    pub(crate) fn forget(&mut self, node: NodeId) {
        self.mouse.forget(node);
        self.touch.forget(node);
        for press in &mut self.presses {
            if press.node == Some(node) {
                press.node = None;
            }
        }
        self.captures.retain(|(_, n)| *n != node);
    }
}

const fn names(kind: PointerType) -> &'static EventNames {
    match kind {
        PointerType::Touch => &TOUCH,
        PointerType::Mouse | PointerType::Pen => &MOUSE,
    }
}

impl Scene {
    /// Position of the most recent pointer input.
    #[must_use]
    pub fn pointer_position(&self) -> Option<Point> {
        self.pointer.last
    }

    /// Position of a pointer that is currently down or hovering.
    #[must_use]
    pub fn pointer_position_by_id(&self, pointer: PointerId) -> Option<Point> {
        self.pointer
            .positions
            .iter()
            .find(|(p, _)| *p == pointer)
            .map(|(_, pos)| *pos)
    }

    /// Every tracked pointer with its position.
    #[must_use]
    pub fn pointer_positions(&self) -> &[(PointerId, Point)] {
        &self.pointer.positions
    }

    /// Routes every event of `pointer` to `node` until released.
    pub fn set_pointer_capture(&mut self, pointer: PointerId, node: NodeId) -> bool {
        if !self.contains(node) {
            log::warn!("cannot capture pointer {} to missing node {node}", pointer.0);
            return false;
        }
        self.pointer.captures.retain(|(p, _)| *p != pointer);
        self.pointer.captures.push((pointer, node));
        true
    }

    /// Ends a capture. Returns whether one existed.
    pub fn release_capture(&mut self, pointer: PointerId) -> bool {
        let before = self.pointer.captures.len();
        self.pointer.captures.retain(|(p, _)| *p != pointer);
        before != self.pointer.captures.len()
    }

    /// Whether `pointer` is captured by `node`.
    #[must_use]
    pub fn has_pointer_capture(&self, pointer: PointerId, node: NodeId) -> bool {
        self.pointer.capture(pointer) == Some(node)
    }

    fn pointer_target(&mut self, input: &PointerInput) -> Option<NodeId> {
        match self.pointer.capture(input.pointer_id) {
            Some(node) if self.contains(node) => Some(node),
            _ => self.get_intersection(input.position),
        }
    }

    fn fire_pointer(
        &mut self,
        target: Option<NodeId>,
        name: &str,
        input: &PointerInput,
        related: Option<NodeId>,
    ) {
        let mut event = Event::new(name).with_detail(EventDetail::Pointer(input.detail()));
        match target.filter(|t| self.contains(*t)) {
            Some(t) => {
                event.target = Some(t);
                self.dispatch_and_bubble(t, &mut event, related);
            }
            None => {
                let stage = self.stage;
                event.target = Some(stage);
                self.dispatch(stage, &mut event);
            }
        }
    }

    /// Processes one pointer input and returns the node it resolved to.
    pub fn handle_pointer(&mut self, input: PointerInput) -> Option<NodeId> {
        match input.action {
            PointerAction::Down => self.pointer_down(&input),
            PointerAction::Move => self.pointer_move(&input),
            PointerAction::Up => self.pointer_up(&input, true),
            PointerAction::Cancel => self.pointer_up(&input, false),
            PointerAction::Leave => {
                self.pointer_leave(&input);
                None
            }
        }
    }

    fn pointer_down(&mut self, input: &PointerInput) -> Option<NodeId> {
        self.pointer.set_position(input.pointer_id, input.position);
        let shape = self.pointer_target(input);
        self.drag.just_dragged = false;
        self.pointer.press(input.pointer_id, shape);
        if self.config.capture_pointer_events {
            if let Some(shape) = shape {
                self.set_pointer_capture(input.pointer_id, shape);
            }
        }
        self.fire_pointer(shape, names(input.pointer_type).down, input, None);
        shape
    }

    fn pointer_move(&mut self, input: &PointerInput) -> Option<NodeId> {
        self.pointer.set_position(input.pointer_id, input.position);
        let mut shape = None;
        if !self.is_any_dragging() || self.config.hit_on_drag_enabled {
            shape = self.pointer_target(input);
            let names = names(input.pointer_type);
            if let Some(hover) = &names.hover {
                self.update_hover(shape, hover, input);
            }
            self.fire_pointer(shape, names.moved, input, None);
        }
        self.drag_pointer_move(input);
        shape
    }

    fn update_hover(&mut self, shape: Option<NodeId>, hover: &HoverNames, input: &PointerInput) {
        let family = *self.pointer.family(input.pointer_type);
        let previous = family.hovered.filter(|n| self.contains(*n));
        if previous != shape {
            if let Some(prev) = previous {
                self.fire_pointer(Some(prev), hover.out, input, shape);
                self.fire_pointer(Some(prev), hover.leave, input, shape);
            }
            if let Some(next) = shape {
                self.fire_pointer(Some(next), hover.over, input, previous);
                self.fire_pointer(Some(next), hover.enter, input, previous);
            }
        }
        let stage_hovered = shape.is_none();
        if stage_hovered && !family.stage_hovered {
            self.fire_pointer(None, hover.over, input, None);
        }
        let family = self.pointer.family(input.pointer_type);
        family.hovered = shape;
        family.stage_hovered = stage_hovered;
    }

    fn pointer_up(&mut self, input: &PointerInput, completed: bool) -> Option<NodeId> {
        self.pointer.set_position(input.pointer_id, input.position);
        self.end_drag_before(input.pointer_id);
        let shape = self.pointer_target(input);
        let names = names(input.pointer_type);
        let window = self.config.dbl_click_window_ms;
        let just_dragged = self.drag.just_dragged;

        let press = self.pointer.take_press(input.pointer_id);
        let clicked = completed
            && shape.is_some()
            && press.is_some_and(|p| p.listen_click && p.node == shape);
        let family = self.pointer.family(input.pointer_type);
        let mut double = false;
        if clicked {
            if let Some(node) = shape {
                double = !just_dragged
                    && family.last_click.is_some_and(|(prev, at)| {
                        prev == node && input.time_ms.saturating_sub(at) <= window
                    });
                family.last_click = (!double).then_some((node, input.time_ms));
            }
        }

        self.fire_pointer(shape, names.up, input, None);
        if clicked {
            self.fire_pointer(shape, names.click, input, None);
            if double {
                self.fire_pointer(shape, names.dbl, input, None);
            }
        }
        self.release_capture(input.pointer_id);
        self.end_drag_after(input);
        if input.pointer_type == PointerType::Touch {
            self.pointer.remove_position(input.pointer_id);
        }
        shape
    }

    fn pointer_leave(&mut self, input: &PointerInput) {
        if let Some(hover) = &names(input.pointer_type).hover {
            let hovered = self.pointer.family(input.pointer_type).hovered;
            let previous = hovered.filter(|n| self.contains(*n));
            if let Some(prev) = previous {
                self.fire_pointer(Some(prev), hover.out, input, None);
                self.fire_pointer(Some(prev), hover.leave, input, None);
            }
            self.fire_pointer(None, hover.leave, input, None);
            let family = self.pointer.family(input.pointer_type);
            family.hovered = None;
            family.stage_hovered = false;
        }
        self.pointer.remove_position(input.pointer_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SceneConfig, ShapeSpec};
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use kurbo::{Rect, Vec2};

    type Log = Rc<RefCell<Vec<(String, NodeId)>>>;

    const EVENTS: &str = "mousedown mouseup mousemove mouseover mouseout mouseenter \
                          mouseleave click dblclick touchstart touchend tap dbltap";

    fn listen(scene: &mut Scene, id: NodeId, log: &Log) {
        let log = log.clone();
        scene.on(id, EVENTS, move |_, e| {
            log.borrow_mut()
                .push((e.name.clone(), e.current_target.unwrap()));
        });
    }

    fn names_at(log: &Log, node: NodeId) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|(_, n)| *n == node)
            .map(|(e, _)| e.clone())
            .collect()
    }

    /// Stage, one layer, one group holding two 10x10 squares at x = 0 and x = 20.
    fn fixture(config: SceneConfig) -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new(config);
        let layer = scene.create_layer();
        let group = scene.create_group();
        scene.add(scene.stage(), layer);
        scene.add(layer, group);
        let mut square = |x: f64| {
            let id = scene.create_shape(ShapeSpec::new("Rect", |ctx, _| {
                ctx.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
                ctx.fill();
            }));
            scene.set_position(id, Vec2::new(x, 0.0));
            scene.add(group, id);
            id
        };
        let a = square(0.0);
        let b = square(20.0);
        (scene, group, a, b)
    }

    fn input(action: PointerAction, x: f64) -> PointerInput {
        PointerInput::new(action, Point::new(x, 5.0))
    }

    #[test]
    fn click_requires_down_and_up_on_the_same_node() {
        let (mut scene, _, a, b) = fixture(SceneConfig::default());
        let log = Log::default();
        listen(&mut scene, a, &log);
        listen(&mut scene, b, &log);

        scene.handle_pointer(input(PointerAction::Down, 5.0));
        scene.handle_pointer(input(PointerAction::Up, 5.0));
        assert_eq!(names_at(&log, a), ["mousedown", "mouseup", "click"]);

        log.borrow_mut().clear();
        scene.handle_pointer(input(PointerAction::Down, 5.0));
        scene.handle_pointer(input(PointerAction::Up, 25.0));
        assert_eq!(names_at(&log, a), ["mousedown"]);
        assert_eq!(names_at(&log, b), ["mouseup"]);
    }

    #[test]
    fn double_click_within_window() {
        let (mut scene, _, a, _) = fixture(SceneConfig::default().with_dbl_click_window_ms(300));
        let log = Log::default();
        listen(&mut scene, a, &log);
        let click = |scene: &mut Scene, t: u64| {
            scene.handle_pointer(input(PointerAction::Down, 5.0).at(t));
            scene.handle_pointer(input(PointerAction::Up, 5.0).at(t));
        };
        click(&mut scene, 0);
        click(&mut scene, 200);
        click(&mut scene, 1000);
        let dbl = names_at(&log, a).iter().filter(|e| *e == "dblclick").count();
        assert_eq!(dbl, 1);
    }

    #[test]
    fn enter_and_leave_stop_at_common_ancestor() {
        let (mut scene, group, a, b) = fixture(SceneConfig::default());
        let log = Log::default();
        for id in [group, a, b] {
            listen(&mut scene, id, &log);
        }
        scene.handle_pointer(input(PointerAction::Move, 5.0));
        assert!(names_at(&log, group).contains(&String::from("mouseenter")));

        log.borrow_mut().clear();
        scene.handle_pointer(input(PointerAction::Move, 25.0));
        let group_events = names_at(&log, group);
        assert!(!group_events.contains(&String::from("mouseenter")));
        assert!(!group_events.contains(&String::from("mouseleave")));
        assert!(group_events.contains(&String::from("mouseout")), "out bubbles");
        assert_eq!(names_at(&log, a), ["mouseout", "mouseleave"]);
        assert_eq!(names_at(&log, b), ["mouseover", "mouseenter", "mousemove"]);

        log.borrow_mut().clear();
        scene.handle_pointer(input(PointerAction::Move, 50.0));
        assert!(names_at(&log, group).contains(&String::from("mouseleave")));
    }

    #[test]
    fn misses_go_to_the_stage() {
        let (mut scene, _, _, _) = fixture(SceneConfig::default());
        let log = Log::default();
        let stage = scene.stage();
        listen(&mut scene, stage, &log);
        assert_eq!(scene.handle_pointer(input(PointerAction::Move, 50.0)), None);
        scene.handle_pointer(input(PointerAction::Move, 60.0));
        scene.handle_pointer(input(PointerAction::Leave, 60.0));
        assert_eq!(
            names_at(&log, stage),
            ["mouseover", "mousemove", "mousemove", "mouseleave"]
        );
        assert!(scene.pointer_positions().is_empty());
    }

    #[test]
    fn capture_routes_to_the_capturing_node() {
        let (mut scene, _, a, b) =
            fixture(SceneConfig::default().with_pointer_capture(true));
        let log = Log::default();
        listen(&mut scene, a, &log);
        listen(&mut scene, b, &log);
        scene.handle_pointer(input(PointerAction::Down, 5.0));
        assert!(scene.has_pointer_capture(PointerId(0), a));
        assert_eq!(scene.handle_pointer(input(PointerAction::Up, 25.0)), Some(a));
        assert!(names_at(&log, b).is_empty());
        assert!(!scene.has_pointer_capture(PointerId(0), a));
    }

    #[test]
    fn touch_uses_its_own_family() {
        let (mut scene, _, a, _) = fixture(SceneConfig::default());
        let log = Log::default();
        listen(&mut scene, a, &log);
        let finger = PointerId(7);
        let at = Point::new(5.0, 5.0);
        scene.handle_pointer(PointerInput::touch(PointerAction::Down, finger, at));
        assert_eq!(scene.pointer_position_by_id(finger), Some(at));
        scene.handle_pointer(PointerInput::touch(PointerAction::Up, finger, at));
        assert_eq!(names_at(&log, a), ["touchstart", "touchend", "tap"]);
        assert_eq!(scene.pointer_position_by_id(finger), None);
        assert_eq!(scene.pointer_position(), Some(at));
    }

    #[test]
    fn cancel_never_clicks() {
        let (mut scene, _, a, _) = fixture(SceneConfig::default());
        let log = Log::default();
        listen(&mut scene, a, &log);
        scene.handle_pointer(input(PointerAction::Down, 5.0));
        scene.handle_pointer(input(PointerAction::Cancel, 5.0));
        assert_eq!(names_at(&log, a), ["mousedown", "mouseup"]);
    }

    #[test]
    fn concurrent_touches_tap_independently() {
        let (mut scene, _, a, b) = fixture(SceneConfig::default());
        let log = Log::default();
        listen(&mut scene, a, &log);
        listen(&mut scene, b, &log);
        let (first, second) = (PointerId(1), PointerId(2));
        let on_a = Point::new(5.0, 5.0);
        let on_b = Point::new(25.0, 5.0);

        scene.handle_pointer(PointerInput::touch(PointerAction::Down, first, on_a));
        scene.handle_pointer(PointerInput::touch(PointerAction::Down, second, on_b));
        scene.handle_pointer(PointerInput::touch(PointerAction::Up, second, on_b));
        scene.handle_pointer(PointerInput::touch(PointerAction::Up, first, on_a));

        assert_eq!(names_at(&log, a), ["touchstart", "touchend", "tap"]);
        assert_eq!(names_at(&log, b), ["touchstart", "touchend", "tap"]);
    }

    #[test]
    fn release_of_another_touch_does_not_tap() {
        let (mut scene, _, a, _) = fixture(SceneConfig::default());
        let log = Log::default();
        listen(&mut scene, a, &log);
        let on_a = Point::new(5.0, 5.0);

        scene.handle_pointer(PointerInput::touch(PointerAction::Down, PointerId(1), on_a));
        scene.handle_pointer(PointerInput::touch(PointerAction::Up, PointerId(2), on_a));
        assert_eq!(names_at(&log, a), ["touchstart", "touchend"]);
        scene.handle_pointer(PointerInput::touch(PointerAction::Up, PointerId(1), on_a));
        assert_eq!(names_at(&log, a), ["touchstart", "touchend", "touchend", "tap"]);
    }
}
