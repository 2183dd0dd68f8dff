// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point-to-node resolution.
//!
//! Layers are searched top to bottom and each subtree back to front, so the
//! shape drawn last under the point wins. Invisible or non-listening
//! subtrees are skipped whole. Each shape is tested with its
//! [`HitStrategy`]:
//!
//! - [`HitStrategy::PathContainment`] replays the hit geometry into a scratch
//!   context under the shape's absolute transform and asks the context
//!   whether the point is inside a filled path or on a stroked one. Nothing
//!   is rasterized.
//! - [`HitStrategy::PixelSampling`] keeps an opaque-black mask of the shape
//!   over its self rect in local space, refreshed lazily after appearance
//!   changes, and reports a hit where the mask alpha is non-zero.
//!
//! Raster caches are ignored; hits always use the live geometry.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use log::{error, warn};
use peniko::Color;
use trellis_transform::Transform;

use crate::attr::{self, builtin};
use crate::render::ShapeCx;
use crate::surface::{DrawContext, ImageData, Surface, SurfaceError, pixel_extent};
use crate::{NodeId, Role, Scene};

/// How a shape decides whether it contains a point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitStrategy {
    /// Geometric containment in the drawn paths.
    #[default]
    PathContainment,
    /// Alpha of a rendered mask.
    PixelSampling,
}

impl HitStrategy {
    /// Value of the `hitStrategy` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathContainment => "path",
            Self::PixelSampling => "pixel",
        }
    }

    /// Parses a `hitStrategy` attribute value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::PathContainment),
            "pixel" => Some(Self::PixelSampling),
            _ => None,
        }
    }
}

/// Opaque mask of a shape over its self rect.
#[derive(Debug)]
pub(crate) struct HitRaster {
    rect: Rect,
    ratio: f64,
    image: ImageData,
}

impl HitRaster {
    fn contains(&self, local: Point) -> bool {
        let x = (local.x - self.rect.x0) * self.ratio;
        let y = (local.y - self.rect.y0) * self.ratio;
        if x < 0.0 || y < 0.0 {
            return false;
        }
        self.image
            .alpha(pixel_extent(x.floor()), pixel_extent(y.floor()))
            != 0
    }
}

/// Turns fills and strokes into containment checks.
struct HitProbe<'a> {
    inner: &'a mut dyn DrawContext,
    point: Point,
    hit: bool,
}

/// Paints every fill and stroke opaque black.
struct HitPainter<'a> {
    inner: &'a mut dyn DrawContext,
}

const MASK: Color = Color::from_rgba8(0, 0, 0, 255);

macro_rules! forward_paths {
    () => {
        fn begin_path(&mut self) {
            self.inner.begin_path();
        }
        fn close_path(&mut self) {
            self.inner.close_path();
        }
        fn move_to(&mut self, p: Point) {
            self.inner.move_to(p);
        }
        fn line_to(&mut self, p: Point) {
            self.inner.line_to(p);
        }
        fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) {
            self.inner.bezier_curve_to(c1, c2, p);
        }
        fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, ccw: bool) {
            self.inner.arc(center, radius, start, end, ccw);
        }
        fn rect(&mut self, rect: Rect) {
            self.inner.rect(rect);
        }
        fn set_line_width(&mut self, width: f64) {
            self.inner.set_line_width(width);
        }
        fn save(&mut self) {
            self.inner.save();
        }
        fn restore(&mut self) {
            self.inner.restore();
        }
        fn transform(&mut self, t: &Transform) {
            self.inner.transform(t);
        }
        fn set_transform(&mut self, t: &Transform) {
            self.inner.set_transform(t);
        }
        fn is_point_in_path(&self, p: Point) -> bool {
            self.inner.is_point_in_path(p)
        }
        fn is_point_in_stroke(&self, p: Point) -> bool {
            self.inner.is_point_in_stroke(p)
        }
        fn get_image_data(
            &self,
            x: u32,
            y: u32,
            width: u32,
            height: u32,
        ) -> Result<ImageData, SurfaceError> {
            self.inner.get_image_data(x, y, width, height)
        }
    };
}

impl DrawContext for HitProbe<'_> {
    forward_paths!();

    fn fill(&mut self) {
        self.hit |= self.inner.is_point_in_path(self.point);
    }

    fn stroke(&mut self) {
        self.hit |= self.inner.is_point_in_stroke(self.point);
    }

    fn set_fill_style(&mut self, _: Color) {}

    fn set_stroke_style(&mut self, _: Color) {}

    fn set_global_alpha(&mut self, _: f64) {}

    fn put_image_data(&mut self, _: &ImageData, _: i32, _: i32) {}

    fn draw_image(&mut self, _: &ImageData, _: Point) {}

    fn clear(&mut self) {}
}

impl DrawContext for HitPainter<'_> {
    forward_paths!();

    fn fill(&mut self) {
        self.inner.set_fill_style(MASK);
        self.inner.fill();
    }

    fn stroke(&mut self) {
        self.inner.set_stroke_style(MASK);
        self.inner.stroke();
    }

    fn set_fill_style(&mut self, _: Color) {}

    fn set_stroke_style(&mut self, _: Color) {}

    fn set_global_alpha(&mut self, _: f64) {
        self.inner.set_global_alpha(1.0);
    }

    fn put_image_data(&mut self, image: &ImageData, x: i32, y: i32) {
        self.inner.put_image_data(image, x, y);
    }

    fn draw_image(&mut self, image: &ImageData, at: Point) {
        self.inner.draw_image(image, at);
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

impl Scene {
    /// The top-most listening, visible shape under stage point `point`.
    pub fn get_intersection(&mut self, point: Point) -> Option<NodeId> {
        let stage = self.stage;
        if !self.is_visible(stage) || !self.is_listening(stage) {
            return None;
        }
        let layers: Vec<NodeId> = self.children(self.stage).to_vec();
        layers
            .into_iter()
            .rev()
            .find_map(|layer| self.intersect_in(layer, point))
    }

    fn intersect_in(&mut self, id: NodeId, point: Point) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        if !attr::bool_in(&node.attrs, &builtin::VISIBLE)
            || !attr::bool_in(&node.attrs, &builtin::LISTENING)
        {
            return None;
        }
        if node.role == Role::Shape {
            return self.shape_contains(id, point).then_some(id);
        }
        let children: Vec<NodeId> = node.children.clone();
        children
            .into_iter()
            .rev()
            .find_map(|child| self.intersect_in(child, point))
    }

    /// The strategy used for `id`: its `hitStrategy` attribute, else the
    /// scene default.
    #[must_use]
    pub fn hit_strategy(&self, id: NodeId) -> HitStrategy {
        HitStrategy::parse(self.get_text(id, &builtin::HIT_STRATEGY))
            .unwrap_or(self.config.hit_strategy)
    }

    /// Overrides the scene's hit strategy for one shape.
    pub fn set_hit_strategy(&mut self, id: NodeId, strategy: HitStrategy) -> bool {
        self.set_declared(id, &builtin::HIT_STRATEGY, strategy.as_str().into())
    }

    /// Whether shape `id` contains stage point `point`, ignoring visibility.
    pub fn shape_contains(&mut self, id: NodeId, point: Point) -> bool {
        match self.hit_strategy(id) {
            HitStrategy::PathContainment => self.path_contains(id, point),
            HitStrategy::PixelSampling => self.pixel_contains(id, point),
        }
    }

    fn hit_geometry(&self, id: NodeId) -> Option<crate::render::SceneFn> {
        self.nodes.get(&id)?.drawing.as_ref().map(|d| d.hit_geometry())
    }

    fn take_scratch(&mut self) -> Option<Box<dyn Surface>> {
        if let Some(scratch) = self.scratch.take() {
            return Some(scratch);
        }
        match self.surfaces.create_surface(1, 1) {
            Ok(surface) => Some(surface),
            Err(err) => {
                error!("cannot create hit scratch surface: {err}");
                None
            }
        }
    }

    fn path_contains(&mut self, id: NodeId, point: Point) -> bool {
        let Some(geometry) = self.hit_geometry(id) else {
            return false;
        };
        let transform = self.absolute_transform(id);
        let Some(mut scratch) = self.take_scratch() else {
            return false;
        };
        let mut probe = HitProbe {
            inner: scratch.context(),
            point,
            hit: false,
        };
        probe.inner.save();
        probe.set_transform(&transform);
        probe.begin_path();
        geometry(&mut probe, &ShapeCx::new(self, id));
        probe.inner.restore();
        probe.inner.begin_path();
        let hit = probe.hit;
        self.scratch = Some(scratch);
        hit
    }

    fn pixel_contains(&mut self, id: NodeId, point: Point) -> bool {
        let cached = self.nodes.get(&id).and_then(|n| n.hit_raster.clone());
        let Some(mask) = cached.or_else(|| self.build_hit_raster(id)) else {
            return false;
        };
        let Some(inv) = self.absolute_transform(id).try_inverse() else {
            return false;
        };
        mask.contains(inv.point(point))
    }

    fn build_hit_raster(&mut self, id: NodeId) -> Option<Rc<HitRaster>> {
        let geometry = self.hit_geometry(id)?;
        let rect = self.self_rect(id);
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            warn!("shape {id} has an empty self rect; pixel hit testing never matches");
            return None;
        }
        let ratio = self.config.pixel_ratio;
        let mut surface = match self
            .surfaces
            .create_surface(pixel_extent(rect.width() * ratio), pixel_extent(rect.height() * ratio))
        {
            Ok(surface) => surface,
            Err(err) => {
                error!("cannot create hit mask for shape {id}: {err}");
                return None;
            }
        };
        let mut base = Transform::IDENTITY;
        base.scale(ratio, ratio).translate(-rect.x0, -rect.y0);
        let mut painter = HitPainter {
            inner: surface.context(),
        };
        painter.set_transform(&base);
        painter.inner.set_global_alpha(1.0);
        painter.begin_path();
        geometry(&mut painter, &ShapeCx::new(self, id));
        let image = match surface.snapshot() {
            Ok(image) => image,
            Err(err) => {
                error!("cannot read hit mask of shape {id}: {err}");
                return None;
            }
        };
        let mask = Rc::new(HitRaster { rect, ratio, image });
        if let Some(node) = self.nodes.get_mut(&id) {
            node.hit_raster = Some(mask.clone());
        }
        Some(mask)
    }

    /// Drops the pixel hit mask of `id`.
    pub(crate) fn clear_hit_raster(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.hit_raster = None;
        }
    }

    /// Whether a pixel hit mask is currently held for `id`.
    #[must_use]
    pub fn has_hit_mask(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.hit_raster.is_some())
    }
}
