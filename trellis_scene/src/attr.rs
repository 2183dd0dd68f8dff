// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute declarations, validation and the generic accessors.
//!
//! Every attribute write funnels through [`Scene::set_attr`] or one of the
//! typed setters generated from the declarations in [`builtin`], so change
//! notification, cache invalidation and redraw requests are uniform.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Vec2;
use log::warn;

use crate::event::{Event, EventDetail};
use crate::{NodeId, Scene, Value};

pub(crate) type AttrMap = HashMap<Cow<'static, str>, Value>;

/// Default of a declared attribute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttrDefault {
    /// No default; reads of an unset attribute return `None`.
    Unset,
    /// A number.
    Number(f64),
    /// A flag.
    Bool(bool),
    /// A string.
    Text(&'static str),
}

impl AttrDefault {
    /// The default as a [`Value`].
    #[must_use]
    pub fn to_value(self) -> Option<Value> {
        match self {
            Self::Unset => None,
            Self::Number(n) => Some(Value::Number(n)),
            Self::Bool(b) => Some(Value::Bool(b)),
            Self::Text(s) => Some(Value::from(s)),
        }
    }
}

/// Checks a value before it is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validator {
    /// Any finite number.
    Number,
    /// A finite number `>= 0`.
    PositiveNumber,
    /// A finite number. Derived opacity clamps it into `[0, 1]`.
    Opacity,
    /// A flag.
    Bool,
    /// Any string.
    Text,
    /// One of a fixed set of strings.
    OneOf(&'static [&'static str]),
}

impl Validator {
    /// Whether `value` passes.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Number | Self::Opacity, Value::Number(n)) => n.is_finite(),
            (Self::PositiveNumber, Value::Number(n)) => n.is_finite() && *n >= 0.0,
            (Self::Bool, Value::Bool(_)) | (Self::Text, Value::Text(_)) => true,
            (Self::OneOf(options), Value::Text(s)) => options.contains(&s.as_str()),
            _ => false,
        }
    }

    const fn expected(&self) -> &'static str {
        match self {
            Self::Number | Self::Opacity => "a finite number",
            Self::PositiveNumber => "a finite non-negative number",
            Self::Bool => "a boolean",
            Self::Text => "a string",
            Self::OneOf(_) => "one of the allowed strings",
        }
    }
}

/// Work done after a declared attribute changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttrHook {
    /// Re-register the node under its new id.
    Identity,
    /// Re-register the node under its new names.
    Names,
    /// Install or remove drag listeners.
    Draggable,
    /// Drop the pixel hit raster.
    HitGeometry,
}

/// A declared scalar attribute.
#[derive(Clone, Copy, Debug)]
pub struct AttrDecl {
    /// Key in the attribute map; also the change event prefix.
    pub name: &'static str,
    /// Value reported when unset.
    pub default: AttrDefault,
    /// Checked on write.
    pub validator: Option<Validator>,
    pub(crate) hook: Option<AttrHook>,
}

impl AttrDecl {
    /// A declaration with no validator.
    #[must_use]
    pub const fn new(name: &'static str, default: AttrDefault) -> Self {
        Self {
            name,
            default,
            validator: None,
            hook: None,
        }
    }

    /// Adds a validator.
    #[must_use]
    pub const fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    const fn with_hook(mut self, hook: AttrHook) -> Self {
        self.hook = Some(hook);
        self
    }
}

/// A 2D attribute stored as two scalar keys (`nameX`, `nameY`).
#[derive(Clone, Copy, Debug)]
pub struct CompositeDecl {
    /// Change event prefix of the composite.
    pub name: &'static str,
    /// First component.
    pub x: AttrDecl,
    /// Second component.
    pub y: AttrDecl,
}

/// Declarations shared by every node.
pub mod builtin {
    use super::{AttrDecl, AttrDefault, AttrHook, CompositeDecl, Validator};

    const fn number(name: &'static str, default: f64) -> AttrDecl {
        AttrDecl::new(name, AttrDefault::Number(default)).with_validator(Validator::Number)
    }

    /// Horizontal position in the parent's space.
    pub const X: AttrDecl = number("x", 0.0);
    /// Vertical position in the parent's space.
    pub const Y: AttrDecl = number("y", 0.0);
    /// Rotation in degrees.
    pub const ROTATION: AttrDecl = number("rotation", 0.0);
    /// Horizontal scale.
    pub const SCALE_X: AttrDecl = number("scaleX", 1.0);
    /// Vertical scale.
    pub const SCALE_Y: AttrDecl = number("scaleY", 1.0);
    /// Horizontal skew.
    pub const SKEW_X: AttrDecl = number("skewX", 0.0);
    /// Vertical skew.
    pub const SKEW_Y: AttrDecl = number("skewY", 0.0);
    /// Horizontal origin offset.
    pub const OFFSET_X: AttrDecl = number("offsetX", 0.0);
    /// Vertical origin offset.
    pub const OFFSET_Y: AttrDecl = number("offsetY", 0.0);
    /// Own opacity, multiplied down the tree.
    pub const OPACITY: AttrDecl =
        AttrDecl::new("opacity", AttrDefault::Number(1.0)).with_validator(Validator::Opacity);
    /// Own visibility flag.
    pub const VISIBLE: AttrDecl =
        AttrDecl::new("visible", AttrDefault::Bool(true)).with_validator(Validator::Bool);
    /// Own listening flag.
    pub const LISTENING: AttrDecl =
        AttrDecl::new("listening", AttrDefault::Bool(true)).with_validator(Validator::Bool);
    /// Lookup id, unique among nodes on a stage.
    pub const ID: AttrDecl = AttrDecl::new("id", AttrDefault::Text(""))
        .with_validator(Validator::Text)
        .with_hook(AttrHook::Identity);
    /// Space separated tags.
    pub const NAME: AttrDecl = AttrDecl::new("name", AttrDefault::Text(""))
        .with_validator(Validator::Text)
        .with_hook(AttrHook::Names);
    /// Whether pointer drags move the node.
    pub const DRAGGABLE: AttrDecl = AttrDecl::new("draggable", AttrDefault::Bool(false))
        .with_validator(Validator::Bool)
        .with_hook(AttrHook::Draggable);
    /// Per-node drag threshold; unset falls back to the scene default.
    pub const DRAG_DISTANCE: AttrDecl =
        AttrDecl::new("dragDistance", AttrDefault::Unset).with_validator(Validator::PositiveNumber);
    /// Width of the self rect.
    pub const WIDTH: AttrDecl = AttrDecl::new("width", AttrDefault::Number(0.0))
        .with_validator(Validator::PositiveNumber)
        .with_hook(AttrHook::HitGeometry);
    /// Height of the self rect.
    pub const HEIGHT: AttrDecl = AttrDecl::new("height", AttrDefault::Number(0.0))
        .with_validator(Validator::PositiveNumber)
        .with_hook(AttrHook::HitGeometry);
    /// Which parts of the local transform apply: `all`, `position` or `none`.
    pub const TRANSFORMS_ENABLED: AttrDecl =
        AttrDecl::new("transformsEnabled", AttrDefault::Text("all"))
            .with_validator(Validator::OneOf(&["all", "position", "none"]));
    /// Per-shape hit strategy: `path` or `pixel`.
    pub const HIT_STRATEGY: AttrDecl = AttrDecl::new("hitStrategy", AttrDefault::Unset)
        .with_validator(Validator::OneOf(&["path", "pixel"]))
        .with_hook(AttrHook::HitGeometry);

    /// Position as one vector.
    pub const POSITION: CompositeDecl = CompositeDecl {
        name: "position",
        x: X,
        y: Y,
    };
    /// Scale as one vector.
    pub const SCALE: CompositeDecl = CompositeDecl {
        name: "scale",
        x: SCALE_X,
        y: SCALE_Y,
    };
    /// Skew as one vector.
    pub const SKEW: CompositeDecl = CompositeDecl {
        name: "skew",
        x: SKEW_X,
        y: SKEW_Y,
    };
    /// Origin offset as one vector.
    pub const OFFSET: CompositeDecl = CompositeDecl {
        name: "offset",
        x: OFFSET_X,
        y: OFFSET_Y,
    };

    /// Every scalar declaration, for lookup by key.
    pub const ALL: &[AttrDecl] = &[
        X,
        Y,
        ROTATION,
        SCALE_X,
        SCALE_Y,
        SKEW_X,
        SKEW_Y,
        OFFSET_X,
        OFFSET_Y,
        OPACITY,
        VISIBLE,
        LISTENING,
        ID,
        NAME,
        DRAGGABLE,
        DRAG_DISTANCE,
        WIDTH,
        HEIGHT,
        TRANSFORMS_ENABLED,
        HIT_STRATEGY,
    ];
}

/// Change events of every attribute that feeds the local transform.
pub(crate) const TRANSFORM_CHANGE_EVENTS: &[&str] = &[
    "xChange",
    "yChange",
    "rotationChange",
    "scaleXChange",
    "scaleYChange",
    "skewXChange",
    "skewYChange",
    "offsetXChange",
    "offsetYChange",
    "transformsEnabledChange",
    "positionChange",
    "scaleChange",
    "skewChange",
    "offsetChange",
];

/// Keys that never change how a node itself looks.
const NON_APPEARANCE: &[&str] = &[
    "x",
    "y",
    "rotation",
    "scaleX",
    "scaleY",
    "skewX",
    "skewY",
    "offsetX",
    "offsetY",
    "transformsEnabled",
    "opacity",
    "visible",
    "listening",
    "draggable",
    "dragDistance",
    "id",
    "name",
    "hitStrategy",
];

/// Keys that never change how a subtree looks from an ancestor's cache.
const NON_VISUAL: &[&str] = &[
    "listening",
    "draggable",
    "dragDistance",
    "id",
    "name",
    "hitStrategy",
];

/// Looks up a built-in declaration by key.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static AttrDecl> {
    builtin::ALL.iter().find(|decl| decl.name == name)
}

/// Whether a change to `key` alters the node's own pixels.
pub(crate) fn affects_own_appearance(key: &str) -> bool {
    !NON_APPEARANCE.contains(&key)
}

/// Whether a change to `key` alters what an ancestor's raster shows.
pub(crate) fn affects_subtree_appearance(key: &str) -> bool {
    !NON_VISUAL.contains(&key)
}

pub(crate) fn number_in(attrs: &AttrMap, decl: &AttrDecl) -> f64 {
    match attrs.get(decl.name) {
        Some(Value::Number(n)) => *n,
        _ => match decl.default {
            AttrDefault::Number(n) => n,
            _ => 0.0,
        },
    }
}

pub(crate) fn bool_in(attrs: &AttrMap, decl: &AttrDecl) -> bool {
    match attrs.get(decl.name) {
        Some(Value::Bool(b)) => *b,
        _ => matches!(decl.default, AttrDefault::Bool(true)),
    }
}

pub(crate) fn text_in<'a>(attrs: &'a AttrMap, decl: &AttrDecl) -> &'a str {
    match attrs.get(decl.name) {
        Some(Value::Text(s)) => s,
        _ => match decl.default {
            AttrDefault::Text(s) => s,
            _ => "",
        },
    }
}

impl Scene {
    /// The stored value of `key`, or the built-in default when unset.
    #[must_use]
    pub fn attr(&self, id: NodeId, key: &str) -> Option<Value> {
        let node = self.nodes.get(&id)?;
        node.attrs
            .get(key)
            .cloned()
            .or_else(|| lookup(key).and_then(|d| d.default.to_value()))
    }

    /// Writes `key`, validating it when the key is declared.
    ///
    /// Returns `true` when the stored value changed. An unchanged value fires
    /// nothing.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        match lookup(key) {
            Some(decl) => self.set_declared(id, decl, value),
            None => self.store_attr(id, Cow::Owned(String::from(key)), Some(value), None),
        }
    }

    /// Writes several attributes, invalidating transforms once at the end.
    pub fn set_attrs<I, K, V>(&mut self, id: NodeId, attrs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.batch_transform_changes(id, |scene| {
            for (key, value) in attrs {
                scene.set_attr(id, key.as_ref(), value);
            }
        });
    }

    /// Removes `key`. Reads fall back to the default afterwards.
    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> bool {
        match lookup(key) {
            Some(decl) => self.store_attr(id, Cow::Borrowed(decl.name), None, decl.hook),
            None => self.store_attr(id, Cow::Owned(String::from(key)), None, None),
        }
    }

    /// Reads a declared number.
    #[must_use]
    pub fn get_number(&self, id: NodeId, decl: &AttrDecl) -> f64 {
        self.nodes
            .get(&id)
            .map_or_else(|| number_in(&AttrMap::new(), decl), |n| number_in(&n.attrs, decl))
    }

    /// Reads a declared flag.
    #[must_use]
    pub fn get_bool(&self, id: NodeId, decl: &AttrDecl) -> bool {
        self.nodes
            .get(&id)
            .map_or(matches!(decl.default, AttrDefault::Bool(true)), |n| {
                bool_in(&n.attrs, decl)
            })
    }

    /// Reads a declared string.
    #[must_use]
    pub fn get_text(&self, id: NodeId, decl: &AttrDecl) -> &str {
        match self.nodes.get(&id) {
            Some(node) => text_in(&node.attrs, decl),
            None => match decl.default {
                AttrDefault::Text(s) => s,
                _ => "",
            },
        }
    }

    /// Reads a composite attribute.
    #[must_use]
    pub fn get_vec2(&self, id: NodeId, decl: &CompositeDecl) -> Vec2 {
        Vec2::new(self.get_number(id, &decl.x), self.get_number(id, &decl.y))
    }

    /// Writes a declared attribute.
    pub fn set_declared(&mut self, id: NodeId, decl: &AttrDecl, value: Value) -> bool {
        if let Some(validator) = decl.validator {
            if !validator.accepts(&value) {
                warn!(
                    "{value} is not a valid value for \"{}\" on node {id}; expected {}",
                    decl.name,
                    validator.expected()
                );
                return false;
            }
        }
        self.store_attr(id, Cow::Borrowed(decl.name), Some(value), decl.hook)
    }

    /// Writes both components of a composite, firing one `<name>Change`.
    pub fn set_vec2(&mut self, id: NodeId, decl: &CompositeDecl, value: Vec2) -> bool {
        let parts = [(&decl.x, value.x), (&decl.y, value.y)];
        for (component, v) in parts {
            if let Some(validator) = component.validator {
                if !validator.accepts(&Value::Number(v)) {
                    warn!(
                        "{v} is not a valid value for \"{}\" on node {id}; expected {}",
                        component.name,
                        validator.expected()
                    );
                    return false;
                }
            }
        }
        let old = self.get_vec2(id, decl);
        let Some(node) = self.nodes.get_mut(&id) else {
            warn!("cannot set \"{}\" on missing node {id}", decl.name);
            return false;
        };
        if old == value {
            return false;
        }
        for (component, v) in parts {
            node.attrs
                .insert(Cow::Borrowed(component.name), Value::Number(v));
        }
        for (component, _) in parts {
            self.invalidate_rasters_for(id, component.name);
        }
        let mut event = Event::new(format!("{}Change", decl.name)).with_detail(
            EventDetail::VectorChange {
                attr: String::from(decl.name),
                old,
                new: value,
            },
        );
        event.target = Some(id);
        self.dispatch(id, &mut event);
        self.request_draw(id);
        true
    }

    pub(crate) fn store_attr(
        &mut self,
        id: NodeId,
        key: Cow<'static, str>,
        value: Option<Value>,
        hook: Option<AttrHook>,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            warn!("cannot set \"{key}\" on missing node {id}");
            return false;
        };
        let old = node.attrs.get(key.as_ref()).cloned();
        if old == value {
            return false;
        }
        match &value {
            Some(v) => {
                node.attrs.insert(key.clone(), v.clone());
            }
            None => {
                node.attrs.remove(key.as_ref());
            }
        }
        self.invalidate_rasters_for(id, &key);
        let mut event = Event::new(format!("{key}Change")).with_detail(EventDetail::Change {
            attr: String::from(key.as_ref()),
            old: old.clone(),
            new: value,
        });
        event.target = Some(id);
        self.dispatch(id, &mut event);
        if let Some(hook) = hook {
            self.run_attr_hook(id, hook, old.as_ref());
        }
        self.request_draw(id);
        true
    }

    fn run_attr_hook(&mut self, id: NodeId, hook: AttrHook, old: Option<&Value>) {
        match hook {
            AttrHook::Identity => {
                let old = old.and_then(Value::as_text).map(String::from);
                self.reregister_id(id, old.as_deref());
            }
            AttrHook::Names => {
                let old = old.and_then(Value::as_text).map(String::from);
                self.reregister_names(id, old.as_deref());
            }
            AttrHook::Draggable => self.sync_drag_listeners(id),
            AttrHook::HitGeometry => self.clear_hit_raster(id),
        }
    }

    /// Snapshot of the explicitly stored attributes.
    #[must_use]
    pub fn attrs_snapshot(&self, id: NodeId) -> Vec<(String, Value)> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<_> = node
            .attrs
            .iter()
            .map(|(k, v)| (String::from(k.as_ref()), v.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}
