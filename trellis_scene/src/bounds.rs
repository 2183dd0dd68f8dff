// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounds of shapes and subtrees.

use kurbo::{Affine, Rect};

use crate::attr::{self, builtin};
use crate::render::ShapeCx;
use crate::{NodeId, Role, Scene};

/// Options for [`Scene::client_rect`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientRectConfig {
    /// Report the rect in the node's own space.
    pub skip_transform: bool,
    /// Report the rect in the space of this ancestor instead of stage space.
    pub relative_to: Option<NodeId>,
}

impl Scene {
    /// A shape's rect in its own space: the shape's override, else
    /// `(0, 0, width, height)`.
    #[must_use]
    pub fn self_rect(&self, id: NodeId) -> Rect {
        let custom = self
            .nodes
            .get(&id)
            .and_then(|n| n.drawing.as_ref())
            .and_then(|d| d.self_rect.clone());
        match custom {
            Some(f) => f(&ShapeCx::new(self, id)),
            None => Rect::new(0.0, 0.0, self.width(id), self.height(id)),
        }
    }

    /// Bounding box of a shape, or of the visible shapes under a container.
    ///
    /// A container with no visible shapes reports [`Rect::ZERO`].
    pub fn client_rect(&mut self, id: NodeId, config: ClientRectConfig) -> Rect {
        let local = match self.role(id) {
            None => return Rect::ZERO,
            Some(Role::Shape) => Some(self.self_rect(id)),
            Some(_) => self.children_rect(id, id),
        };
        let Some(local) = local else {
            return Rect::ZERO;
        };
        if config.skip_transform {
            return local;
        }
        let t = self.absolute_transform_relative(id, config.relative_to);
        Affine::from(t).transform_rect_bbox(local)
    }

    /// Union of the visible shapes under `id`, in the space of `top`.
    fn children_rect(&mut self, id: NodeId, top: NodeId) -> Option<Rect> {
        let mut out: Option<Rect> = None;
        for child in self.children(id).to_vec() {
            let Some(node) = self.nodes.get(&child) else {
                continue;
            };
            if !attr::bool_in(&node.attrs, &builtin::VISIBLE) {
                continue;
            }
            let rect = if node.role == Role::Shape {
                let t = self.absolute_transform_relative(child, Some(top));
                Some(Affine::from(t).transform_rect_bbox(self.self_rect(child)))
            } else {
                self.children_rect(child, top)
            };
            if let Some(rect) = rect {
                out = Some(out.map_or(rect, |r| r.union(rect)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SceneConfig, ShapeSpec};
    use kurbo::Vec2;

    fn boxed(scene: &mut Scene, w: f64, h: f64) -> NodeId {
        let id = scene.create_shape(ShapeSpec::new("Rect", |_, _| {}));
        scene.set_width(id, w);
        scene.set_height(id, h);
        id
    }

    #[test]
    fn shape_rect_follows_transform() {
        let mut scene = Scene::new(SceneConfig::default());
        let rect = boxed(&mut scene, 10.0, 4.0);
        scene.set_position(rect, Vec2::new(5.0, 5.0));
        scene.set_scale(rect, Vec2::new(2.0, 2.0));
        let r = scene.client_rect(rect, ClientRectConfig::default());
        assert_eq!(r, Rect::new(5.0, 5.0, 25.0, 13.0));
        let own = scene.client_rect(
            rect,
            ClientRectConfig {
                skip_transform: true,
                ..Default::default()
            },
        );
        assert_eq!(own, Rect::new(0.0, 0.0, 10.0, 4.0));
    }

    #[test]
    fn container_unions_visible_children() {
        let mut scene = Scene::new(SceneConfig::default());
        let group = scene.create_group();
        let a = boxed(&mut scene, 2.0, 2.0);
        let b = boxed(&mut scene, 2.0, 2.0);
        let hidden = boxed(&mut scene, 100.0, 100.0);
        scene.add(group, a);
        scene.add(group, b);
        scene.add(group, hidden);
        scene.set_position(b, Vec2::new(8.0, 3.0));
        scene.set_visible(hidden, false);
        scene.set_x(group, 1.0);
        assert_eq!(
            scene.client_rect(group, ClientRectConfig::default()),
            Rect::new(1.0, 0.0, 11.0, 5.0)
        );
    }

    #[test]
    fn empty_container_is_zero() {
        let mut scene = Scene::new(SceneConfig::default());
        let group = scene.create_group();
        let inner = scene.create_group();
        scene.add(group, inner);
        assert_eq!(scene.client_rect(group, ClientRectConfig::default()), Rect::ZERO);
    }

    #[test]
    fn custom_self_rect() {
        let mut scene = Scene::new(SceneConfig::default());
        let dot = scene.create_shape(
            ShapeSpec::new("Circle", |_, _| {}).with_self_rect(|shape| {
                let r = shape.number("radius", 0.0);
                Rect::new(-r, -r, r, r)
            }),
        );
        scene.set_attr(dot, "radius", 3.0);
        assert_eq!(scene.self_rect(dot), Rect::new(-3.0, -3.0, 3.0, 3.0));
    }
}
