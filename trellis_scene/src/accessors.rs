// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed getters and setters for the built-in attributes.

use kurbo::Vec2;

use crate::attr::builtin;
use crate::{NodeId, Scene, Value};

macro_rules! number_attrs {
    ($($(#[$doc:meta])* $get:ident, $set:ident => $decl:ident;)*) => {
        impl Scene {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $get(&self, id: NodeId) -> f64 {
                    self.get_number(id, &builtin::$decl)
                }

                #[doc = concat!("Sets the value read by [`Scene::", stringify!($get), "`].")]
                pub fn $set(&mut self, id: NodeId, value: f64) -> bool {
                    self.set_declared(id, &builtin::$decl, Value::Number(value))
                }
            )*
        }
    };
}

macro_rules! bool_attrs {
    ($($(#[$doc:meta])* $get:ident, $set:ident => $decl:ident;)*) => {
        impl Scene {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $get(&self, id: NodeId) -> bool {
                    self.get_bool(id, &builtin::$decl)
                }

                #[doc = concat!("Sets the flag read by [`Scene::", stringify!($get), "`].")]
                pub fn $set(&mut self, id: NodeId, value: bool) -> bool {
                    self.set_declared(id, &builtin::$decl, Value::Bool(value))
                }
            )*
        }
    };
}

macro_rules! text_attrs {
    ($($(#[$doc:meta])* $get:ident, $set:ident => $decl:ident;)*) => {
        impl Scene {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $get(&self, id: NodeId) -> &str {
                    self.get_text(id, &builtin::$decl)
                }

                #[doc = concat!("Sets the string read by [`Scene::", stringify!($get), "`].")]
                pub fn $set(&mut self, id: NodeId, value: &str) -> bool {
                    self.set_declared(id, &builtin::$decl, Value::from(value))
                }
            )*
        }
    };
}

macro_rules! vec2_attrs {
    ($($(#[$doc:meta])* $get:ident, $set:ident => $decl:ident;)*) => {
        impl Scene {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $get(&self, id: NodeId) -> Vec2 {
                    self.get_vec2(id, &builtin::$decl)
                }

                #[doc = concat!("Sets the vector read by [`Scene::", stringify!($get), "`].")]
                ///
                /// Fires a single change event for the pair.
                pub fn $set(&mut self, id: NodeId, value: Vec2) -> bool {
                    self.set_vec2(id, &builtin::$decl, value)
                }
            )*
        }
    };
}

number_attrs! {
    /// Horizontal position in the parent's space.
    x, set_x => X;
    /// Vertical position in the parent's space.
    y, set_y => Y;
    /// Rotation in degrees.
    rotation, set_rotation => ROTATION;
    /// Horizontal scale factor.
    scale_x, set_scale_x => SCALE_X;
    /// Vertical scale factor.
    scale_y, set_scale_y => SCALE_Y;
    /// Horizontal skew factor.
    skew_x, set_skew_x => SKEW_X;
    /// Vertical skew factor.
    skew_y, set_skew_y => SKEW_Y;
    /// Horizontal origin offset.
    offset_x, set_offset_x => OFFSET_X;
    /// Vertical origin offset.
    offset_y, set_offset_y => OFFSET_Y;
    /// Own opacity.
    opacity, set_opacity => OPACITY;
    /// Width of the self rect.
    width, set_width => WIDTH;
    /// Height of the self rect.
    height, set_height => HEIGHT;
}

bool_attrs! {
    /// Own visibility flag; see [`Scene::is_visible`] for the inherited value.
    visible, set_visible => VISIBLE;
    /// Own listening flag; see [`Scene::is_listening`] for the inherited value.
    listening, set_listening => LISTENING;
    /// Whether pointer drags move the node.
    draggable, set_draggable => DRAGGABLE;
}

text_attrs! {
    /// Lookup id.
    id, set_id => ID;
    /// Space separated tags.
    name, set_name => NAME;
}

vec2_attrs! {
    /// Position in the parent's space.
    position, set_position => POSITION;
    /// Scale factors.
    scale, set_scale => SCALE;
    /// Skew factors.
    skew, set_skew => SKEW;
    /// Origin offset.
    offset, set_offset => OFFSET;
}

impl Scene {
    /// Pointer travel before a drag starts, falling back to the scene default.
    #[must_use]
    pub fn drag_distance(&self, id: NodeId) -> f64 {
        self.attr(id, builtin::DRAG_DISTANCE.name)
            .and_then(|v| v.as_number())
            .unwrap_or(self.config.drag_distance)
    }

    /// Sets the per-node drag threshold.
    pub fn set_drag_distance(&mut self, id: NodeId, distance: f64) -> bool {
        self.set_declared(id, &builtin::DRAG_DISTANCE, Value::Number(distance))
    }

    /// Rotation in radians.
    #[must_use]
    pub fn rotation_radians(&self, id: NodeId) -> f64 {
        self.rotation(id).to_radians()
    }

    /// Whether the node's `name` contains the tag `name`.
    #[must_use]
    pub fn has_name(&self, id: NodeId, name: &str) -> bool {
        self.name(id).split_whitespace().any(|n| n == name)
    }

    /// Adds a tag to the node's `name`.
    pub fn add_name(&mut self, id: NodeId, name: &str) -> bool {
        if self.has_name(id, name) {
            return false;
        }
        let current = self.name(id);
        let next = if current.is_empty() {
            alloc::string::String::from(name)
        } else {
            alloc::format!("{current} {name}")
        };
        self.set_name(id, &next)
    }

    /// Removes a tag from the node's `name`.
    pub fn remove_name(&mut self, id: NodeId, name: &str) -> bool {
        if !self.has_name(id, name) {
            return false;
        }
        let next = self
            .name(id)
            .split_whitespace()
            .filter(|n| *n != name)
            .collect::<alloc::vec::Vec<_>>()
            .join(" ");
        self.set_name(id, &next)
    }
}

#[cfg(test)]
mod tests {
    use crate::event::EventDetail;
    use crate::{Scene, SceneConfig};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use kurbo::Vec2;

    #[test]
    fn composite_write_fires_one_event() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        let seen: Rc<RefCell<Vec<EventDetail>>> = Rc::default();
        let log = seen.clone();
        scene.on(g, "positionChange xChange yChange", move |_, e| {
            log.borrow_mut().push(e.detail.clone());
        });
        assert!(scene.set_position(g, Vec2::new(1.0, 2.0)));
        assert_eq!(seen.borrow().len(), 1);
        assert!(matches!(
            &seen.borrow()[0],
            EventDetail::VectorChange { new, .. } if *new == Vec2::new(1.0, 2.0)
        ));
        assert_eq!(scene.x(g), 1.0);
        assert!(!scene.set_position(g, Vec2::new(1.0, 2.0)), "unchanged");
    }

    #[test]
    fn invalid_value_keeps_old_one() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        scene.set_x(g, 5.0);
        assert!(!scene.set_x(g, f64::NAN));
        assert_eq!(scene.x(g), 5.0);
        assert!(!scene.set_attr(g, "visible", 3.0));
        assert!(scene.visible(g));
        assert!(!scene.set_width(g, -1.0));
    }

    #[test]
    fn change_event_carries_old_and_new() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        let seen: Rc<RefCell<Vec<EventDetail>>> = Rc::default();
        let log = seen.clone();
        scene.on(g, "fillChange", move |_, e| log.borrow_mut().push(e.detail.clone()));
        scene.set_attr(g, "fill", "red");
        scene.set_attr(g, "fill", "red");
        scene.remove_attr(g, "fill");
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[1], EventDetail::Change { new: None, .. }));
    }

    #[test]
    fn name_tags() {
        let mut scene = Scene::new(SceneConfig::default());
        let g = scene.create_group();
        scene.add_name(g, "a");
        scene.add_name(g, "b");
        assert_eq!(scene.name(g), "a b");
        assert!(scene.has_name(g, "b"));
        assert!(!scene.has_name(g, "a b"));
        scene.remove_name(g, "a");
        assert_eq!(scene.name(g), "b");
    }

    #[test]
    fn drag_distance_falls_back_to_config() {
        let mut scene = Scene::new(SceneConfig::default().with_drag_distance(7.0));
        let g = scene.create_group();
        assert_eq!(scene.drag_distance(g), 7.0);
        scene.set_drag_distance(g, 2.0);
        assert_eq!(scene.drag_distance(g), 2.0);
    }
}
