// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape drawing callbacks, per-layer surfaces and redraw coalescing.
//!
//! Layers are the unit of redraw. [`Scene::request_draw`] only marks the
//! owning layer; [`Scene::tick`] runs animations and then paints each marked
//! layer once.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use log::{error, trace, warn};
use trellis_transform::Transform;

use crate::attr::{self, AttrDecl};
use crate::surface::{DrawContext, ImageData, Surface, pixel_extent};
use crate::{NodeId, Role, Scene, Value};

/// Draws a shape in its own local space.
pub type SceneFn = Rc<dyn Fn(&mut dyn DrawContext, &ShapeCx<'_>)>;

/// Computes a shape's self rect in its own local space.
pub type SelfRectFn = Rc<dyn Fn(&ShapeCx<'_>) -> Rect>;

/// Read access to the shape being drawn.
#[derive(Clone, Copy)]
pub struct ShapeCx<'a> {
    scene: &'a Scene,
    node: NodeId,
}

impl<'a> ShapeCx<'a> {
    pub(crate) fn new(scene: &'a Scene, node: NodeId) -> Self {
        Self { scene, node }
    }

    /// The node being drawn.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// An attribute of the node.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<Value> {
        self.scene.attr(self.node, key)
    }

    /// A numeric attribute, or `fallback`.
    #[must_use]
    pub fn number(&self, key: &str, fallback: f64) -> f64 {
        self.attr(key).and_then(|v| v.as_number()).unwrap_or(fallback)
    }

    /// A declared numeric attribute.
    #[must_use]
    pub fn declared(&self, decl: &AttrDecl) -> f64 {
        self.scene.get_number(self.node, decl)
    }

    /// Width of the node.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.scene.width(self.node)
    }

    /// Height of the node.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.scene.height(self.node)
    }
}

/// Everything needed to create a shape node.
///
/// ```
/// use kurbo::Rect;
/// use trellis_scene::{Scene, SceneConfig, ShapeSpec};
///
/// let mut scene = Scene::new(SceneConfig::default());
/// let rect = scene.create_shape(ShapeSpec::new("Rect", |ctx, shape| {
///     ctx.rect(Rect::new(0.0, 0.0, shape.width(), shape.height()));
///     ctx.fill();
/// }));
/// assert_eq!(scene.class_name(rect), Some("Rect"));
/// ```
pub struct ShapeSpec {
    pub(crate) class_name: Cow<'static, str>,
    pub(crate) scene_fn: SceneFn,
    pub(crate) hit_fn: Option<SceneFn>,
    pub(crate) self_rect: Option<SelfRectFn>,
}

impl ShapeSpec {
    /// A shape of class `class_name` drawn by `scene_fn`.
    pub fn new(
        class_name: impl Into<Cow<'static, str>>,
        scene_fn: impl Fn(&mut dyn DrawContext, &ShapeCx<'_>) + 'static,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            scene_fn: Rc::new(scene_fn),
            hit_fn: None,
            self_rect: None,
        }
    }

    /// Uses `hit_fn` instead of the drawing callback for hit geometry.
    #[must_use]
    pub fn with_hit_fn(
        mut self,
        hit_fn: impl Fn(&mut dyn DrawContext, &ShapeCx<'_>) + 'static,
    ) -> Self {
        self.hit_fn = Some(Rc::new(hit_fn));
        self
    }

    /// Overrides the default `(0, 0, width, height)` self rect.
    #[must_use]
    pub fn with_self_rect(mut self, self_rect: impl Fn(&ShapeCx<'_>) -> Rect + 'static) -> Self {
        self.self_rect = Some(Rc::new(self_rect));
        self
    }
}

/// Drawing callbacks stored on a shape node.
#[derive(Clone)]
pub(crate) struct Drawing {
    pub(crate) scene_fn: SceneFn,
    pub(crate) hit_fn: Option<SceneFn>,
    pub(crate) self_rect: Option<SelfRectFn>,
}

impl Drawing {
    pub(crate) fn hit_geometry(&self) -> SceneFn {
        self.hit_fn.clone().unwrap_or_else(|| self.scene_fn.clone())
    }
}

/// The surface and dirty flag of a layer.
#[derive(Default)]
pub(crate) struct LayerState {
    pub(crate) surface: Option<Box<dyn Surface>>,
    pub(crate) needs_redraw: bool,
}

pub(crate) enum DrawItem {
    Shape {
        node: NodeId,
        transform: Transform,
        alpha: f64,
        scene_fn: SceneFn,
    },
    Raster {
        transform: Transform,
        alpha: f64,
        image: Rc<ImageData>,
    },
}

impl DrawItem {
    /// Draws one item with `base` applied ahead of its own transform.
    pub(crate) fn paint(&self, scene: &Scene, ctx: &mut dyn DrawContext, base: &Transform) {
        match self {
            Self::Shape {
                node,
                transform,
                alpha,
                scene_fn,
            } => {
                ctx.save();
                ctx.set_transform(&(*base * *transform));
                ctx.set_global_alpha(*alpha);
                ctx.begin_path();
                scene_fn(&mut *ctx, &ShapeCx::new(scene, *node));
                ctx.restore();
            }
            Self::Raster {
                transform,
                alpha,
                image,
            } => {
                ctx.save();
                ctx.set_transform(&(*base * *transform));
                ctx.set_global_alpha(*alpha);
                ctx.draw_image(image, Point::ORIGIN);
                ctx.restore();
            }
        }
    }
}

impl Scene {
    /// Marks the layer that owns `id` for repaint on the next [`Scene::tick`].
    ///
    /// On the stage every layer is marked. Nodes outside a layer are ignored.
    pub fn request_draw(&mut self, id: NodeId) {
        if id == self.stage {
            for layer in self.children(self.stage).to_vec() {
                self.mark_layer(layer);
            }
            return;
        }
        if let Some(layer) = self.layer_of(id) {
            self.mark_layer(layer);
        }
    }

    fn mark_layer(&mut self, layer: NodeId) {
        if let Some(state) = self.nodes.get_mut(&layer).and_then(|n| n.layer.as_mut()) {
            state.needs_redraw = true;
        }
    }

    /// Whether `layer` is waiting for a repaint.
    #[must_use]
    pub fn needs_redraw(&self, layer: NodeId) -> bool {
        self.nodes
            .get(&layer)
            .and_then(|n| n.layer.as_ref())
            .is_some_and(|s| s.needs_redraw)
    }

    /// Paints onto `surface` when the layer is drawn, instead of a surface
    /// created from the scene's factory.
    pub fn bind_surface(&mut self, layer: NodeId, surface: Box<dyn Surface>) -> bool {
        let Some(state) = self.nodes.get_mut(&layer).and_then(|n| n.layer.as_mut()) else {
            warn!("cannot bind a surface to {layer}: not a layer");
            return false;
        };
        state.surface = Some(surface);
        state.needs_redraw = true;
        true
    }

    /// The surface a layer paints onto, once it has been drawn or bound.
    #[must_use]
    pub fn layer_surface(&self, layer: NodeId) -> Option<&dyn Surface> {
        self.nodes
            .get(&layer)?
            .layer
            .as_ref()?
            .surface
            .as_deref()
    }

    /// Runs animations for the frame at `time_ms`, then paints every layer
    /// marked since the last tick.
    ///
    /// Returns the number of layers painted.
    pub fn tick(&mut self, time_ms: f64) -> usize {
        self.run_animations(time_ms);
        let dirty: Vec<NodeId> = self
            .children(self.stage)
            .iter()
            .copied()
            .filter(|l| self.needs_redraw(*l))
            .collect();
        let mut painted = 0;
        for layer in dirty {
            if self.draw_layer(layer) {
                painted += 1;
            }
        }
        painted
    }

    /// Paints `layer` now, clearing its dirty flag.
    pub fn draw_layer(&mut self, layer: NodeId) -> bool {
        if self.role(layer) != Some(Role::Layer) {
            warn!("cannot draw {layer}: not a layer");
            return false;
        }
        let Some(mut surface) = self.take_layer_surface(layer) else {
            return false;
        };
        let items = if self.is_visible(layer) {
            self.collect_draw_items(layer, None)
        } else {
            Vec::new()
        };
        let mut base = Transform::IDENTITY;
        base.scale(self.config.pixel_ratio, self.config.pixel_ratio);
        let ctx = surface.context();
        ctx.reset_transform();
        ctx.clear();
        for item in &items {
            item.paint(self, ctx, &base);
        }
        trace!("painted layer {layer}: {} items", items.len());
        if let Some(state) = self.nodes.get_mut(&layer).and_then(|n| n.layer.as_mut()) {
            state.surface = Some(surface);
            state.needs_redraw = false;
        }
        true
    }

    fn take_layer_surface(&mut self, layer: NodeId) -> Option<Box<dyn Surface>> {
        let existing = self
            .nodes
            .get_mut(&layer)?
            .layer
            .as_mut()?
            .surface
            .take();
        if existing.is_some() {
            return existing;
        }
        let ratio = self.config.pixel_ratio;
        let width = pixel_extent(self.config.width * ratio);
        let height = pixel_extent(self.config.height * ratio);
        match self.surfaces.create_surface(width, height) {
            Ok(surface) => Some(surface),
            Err(err) => {
                error!("cannot create surface for layer {layer}: {err}");
                None
            }
        }
    }

    /// Draw list for the subtree under `root`, back to front.
    ///
    /// With `top`, transforms and opacity are relative to that ancestor and
    /// the ancestor's own raster cache is ignored.
    pub(crate) fn collect_draw_items(&mut self, root: NodeId, top: Option<NodeId>) -> Vec<DrawItem> {
        let mut out = Vec::new();
        let children = self.children(root).to_vec();
        for child in children {
            self.collect_into(child, top, &mut out);
        }
        out
    }

    pub(crate) fn collect_into(&mut self, id: NodeId, top: Option<NodeId>, out: &mut Vec<DrawItem>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !attr::bool_in(&node.attrs, &attr::builtin::VISIBLE) {
            return;
        }
        if let Some(raster) = &node.raster {
            let image = raster.image.clone();
            let (origin, ratio) = (raster.origin, raster.pixel_ratio);
            let mut transform = self.absolute_transform_relative(id, top);
            transform.translate(origin.x, origin.y);
            transform.scale(1.0 / ratio, 1.0 / ratio);
            let alpha = self.opacity_relative(id, top);
            out.push(DrawItem::Raster {
                transform,
                alpha,
                image,
            });
            return;
        }
        if let Some(drawing) = &node.drawing {
            let scene_fn = drawing.scene_fn.clone();
            let transform = self.absolute_transform_relative(id, top);
            let alpha = self.opacity_relative(id, top);
            out.push(DrawItem::Shape {
                node: id,
                transform,
                alpha,
                scene_fn,
            });
            return;
        }
        let children = self.children(id).to_vec();
        for child in children {
            self.collect_into(child, top, out);
        }
    }
}
