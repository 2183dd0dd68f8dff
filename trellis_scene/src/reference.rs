// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference CPU backend.
//!
//! [`RefContext`] keeps the current path in device space as a
//! [`kurbo::BezPath`], answers containment with [`kurbo::Shape::contains`]
//! (non-zero winding) and strokes with [`kurbo::stroke`]. Rasterization is
//! point sampled at pixel centers into straight-alpha RGBA8, with no
//! anti-aliasing, which keeps pixel assertions in tests exact.
//!
//! ```
//! use kurbo::{Point, Rect};
//! use peniko::Color;
//! use trellis_scene::reference::RefSurfaceFactory;
//! use trellis_scene::{DrawContext, SurfaceFactory};
//!
//! let mut surface = RefSurfaceFactory::default().create_surface(4, 4).unwrap();
//! let ctx = surface.context();
//! ctx.set_fill_style(Color::from_rgba8(255, 0, 0, 255));
//! ctx.rect(Rect::new(0.0, 0.0, 2.0, 2.0));
//! ctx.fill();
//! assert!(ctx.is_point_in_path(Point::new(1.0, 1.0)));
//!
//! let pixels = surface.snapshot().unwrap();
//! assert_eq!(pixels.pixel(0, 0), Some([255, 0, 0, 255]));
//! assert_eq!(pixels.alpha(3, 3), 0);
//! ```

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::f64::consts::TAU;

use kurbo::{Affine, Arc, BezPath, PathEl, Point, Rect, Shape, Stroke, StrokeOpts, Vec2};
use peniko::Color;
use trellis_transform::Transform;

use crate::surface::{DrawContext, ImageData, Surface, SurfaceError, SurfaceFactory};

const TOLERANCE: f64 = 0.1;
const BLACK: Color = Color::from_rgba8(0, 0, 0, 255);

#[derive(Clone, Copy, Debug)]
struct DrawState {
    transform: Transform,
    fill: Color,
    stroke: Color,
    line_width: f64,
    global_alpha: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            fill: BLACK,
            stroke: BLACK,
            line_width: 1.0,
            global_alpha: 1.0,
        }
    }
}

/// CPU drawing context over an [`ImageData`] buffer.
#[derive(Clone, Debug)]
pub struct RefContext {
    pixels: ImageData,
    state: DrawState,
    stack: Vec<DrawState>,
    path: BezPath,
    has_subpath: bool,
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "channel values are clamped to 0..=255 first"
)]
fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "coordinates are clamped to the surface first"
)]
fn clamp_px(v: f64, max: u32) -> u32 {
    v.clamp(0.0, f64::from(max)) as u32
}

impl RefContext {
    /// A transparent context of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: ImageData::new(width, height),
            state: DrawState::default(),
            stack: Vec::new(),
            path: BezPath::new(),
            has_subpath: false,
        }
    }

    /// The pixel buffer.
    #[must_use]
    pub fn pixels(&self) -> &ImageData {
        &self.pixels
    }

    /// The current path in device space.
    #[must_use]
    pub fn current_path(&self) -> &BezPath {
        &self.path
    }

    fn device(&self, p: Point) -> Point {
        self.state.transform.point(p)
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            f64::from(self.pixels.width),
            f64::from(self.pixels.height),
        )
    }

    fn pixel_span(&self, area: Rect) -> Option<(u32, u32, u32, u32)> {
        let area = area.intersect(self.bounds());
        if area.width() <= 0.0 || area.height() <= 0.0 {
            return None;
        }
        Some((
            clamp_px(area.x0.floor(), self.pixels.width),
            clamp_px(area.y0.floor(), self.pixels.height),
            clamp_px(area.x1.ceil(), self.pixels.width),
            clamp_px(area.y1.ceil(), self.pixels.height),
        ))
    }

    fn blend(&mut self, x: u32, y: u32, rgb: [u8; 3], alpha: f64) {
        let Some(dst) = self.pixels.pixel(x, y) else {
            return;
        };
        let da = f64::from(dst[3]) / 255.0;
        let out_a = alpha + da * (1.0 - alpha);
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| {
            channel((f64::from(s) * alpha + f64::from(d) * da * (1.0 - alpha)) / out_a)
        };
        self.pixels.set_pixel(
            x,
            y,
            [
                mix(rgb[0], dst[0]),
                mix(rgb[1], dst[1]),
                mix(rgb[2], dst[2]),
                channel(out_a * 255.0),
            ],
        );
    }

    fn paint(&mut self, area: &BezPath, color: Color) {
        let rgba = color.to_rgba8();
        let alpha = f64::from(rgba.a) / 255.0 * self.state.global_alpha;
        if alpha <= 0.0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.pixel_span(area.bounding_box()) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if area.contains(center) {
                    self.blend(x, y, [rgba.r, rgba.g, rgba.b], alpha);
                }
            }
        }
    }

    fn stroke_outline(&self) -> BezPath {
        let scale = self.state.transform.determinant().abs().sqrt();
        let style = Stroke::new(self.state.line_width * scale);
        kurbo::stroke(self.path.iter(), &style, &StrokeOpts::default(), TOLERANCE)
    }

    fn ensure_subpath(&mut self, p: Point) -> bool {
        if self.has_subpath {
            return true;
        }
        self.path.move_to(p);
        self.has_subpath = true;
        false
    }
}

/// The path with every open subpath closed, as fills treat it.
fn closed(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    out.close_path();
                }
                open = true;
            }
            PathEl::ClosePath => open = false,
            _ => {}
        }
        out.push(*el);
    }
    if open {
        out.close_path();
    }
    out
}

fn arc_sweep(start: f64, end: f64, counter_clockwise: bool) -> f64 {
    let raw = end - start;
    if counter_clockwise {
        if raw <= -TAU {
            -TAU
        } else {
            let s = -raw;
            -(s - TAU * (s / TAU).floor())
        }
    } else if raw >= TAU {
        TAU
    } else {
        raw - TAU * (raw / TAU).floor()
    }
}

impl DrawContext for RefContext {
    fn begin_path(&mut self) {
        self.path = BezPath::new();
        self.has_subpath = false;
    }

    fn close_path(&mut self) {
        if self.has_subpath {
            self.path.close_path();
        }
    }

    fn move_to(&mut self, p: Point) {
        let p = self.device(p);
        self.path.move_to(p);
        self.has_subpath = true;
    }

    fn line_to(&mut self, p: Point) {
        let p = self.device(p);
        if self.ensure_subpath(p) {
            self.path.line_to(p);
        }
    }

    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        let (c1, c2, p) = (self.device(c1), self.device(c2), self.device(p));
        self.ensure_subpath(c1);
        self.path.curve_to(c1, c2, p);
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, counter_clockwise: bool) {
        let arc = Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: start,
            sweep_angle: arc_sweep(start, end, counter_clockwise),
            x_rotation: 0.0,
        };
        let first = self.device(center + Vec2::from_angle(start) * radius);
        if self.has_subpath {
            self.path.line_to(first);
        } else {
            self.path.move_to(first);
            self.has_subpath = true;
        }
        let affine = Affine::from(self.state.transform);
        for el in arc.append_iter(TOLERANCE) {
            self.path.push(affine * el);
        }
    }

    fn rect(&mut self, rect: Rect) {
        self.move_to(Point::new(rect.x0, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y1));
        self.line_to(Point::new(rect.x0, rect.y1));
        self.close_path();
    }

    fn fill(&mut self) {
        let area = closed(&self.path);
        self.paint(&area, self.state.fill);
    }

    fn stroke(&mut self) {
        let outline = self.stroke_outline();
        self.paint(&outline, self.state.stroke);
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() {
            self.state.global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn transform(&mut self, t: &Transform) {
        self.state.transform.multiply(t);
    }

    fn set_transform(&mut self, t: &Transform) {
        self.state.transform = *t;
    }

    fn is_point_in_path(&self, p: Point) -> bool {
        closed(&self.path).contains(p)
    }

    fn is_point_in_stroke(&self, p: Point) -> bool {
        !self.path.elements().is_empty() && self.stroke_outline().contains(p)
    }

    fn get_image_data(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<ImageData, SurfaceError> {
        let fits = |start: u32, len: u32, max: u32| start.checked_add(len).is_some_and(|end| end <= max);
        if !fits(x, width, self.pixels.width) || !fits(y, height, self.pixels.height) {
            return Err(SurfaceError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        let mut out = ImageData::new(width, height);
        for row in 0..height {
            for col in 0..width {
                if let Some(p) = self.pixels.pixel(x + col, y + row) {
                    out.set_pixel(col, row, p);
                }
            }
        }
        Ok(out)
    }

    fn put_image_data(&mut self, image: &ImageData, x: i32, y: i32) {
        for row in 0..image.height {
            for col in 0..image.width {
                let dx = i64::from(x) + i64::from(col);
                let dy = i64::from(y) + i64::from(row);
                let (Ok(dx), Ok(dy)) = (u32::try_from(dx), u32::try_from(dy)) else {
                    continue;
                };
                if let Some(p) = image.pixel(col, row) {
                    self.pixels.set_pixel(dx, dy, p);
                }
            }
        }
    }

    fn draw_image(&mut self, image: &ImageData, at: Point) {
        let mut t = self.state.transform;
        t.translate(at.x, at.y);
        let Some(inv) = t.try_inverse() else {
            return;
        };
        let src = Rect::new(0.0, 0.0, f64::from(image.width), f64::from(image.height));
        let Some((x0, y0, x1, y1)) = self.pixel_span(Affine::from(t).transform_rect_bbox(src))
        else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let s = inv.point(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
                if s.x < 0.0 || s.y < 0.0 || s.x >= src.x1 || s.y >= src.y1 {
                    continue;
                }
                let sx = clamp_px(s.x.floor(), image.width);
                let sy = clamp_px(s.y.floor(), image.height);
                let Some(p) = image.pixel(sx, sy) else {
                    continue;
                };
                let alpha = f64::from(p[3]) / 255.0 * self.state.global_alpha;
                if alpha > 0.0 {
                    self.blend(x, y, [p[0], p[1], p[2]], alpha);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.pixels.data.fill(0);
    }
}

/// A [`Surface`] backed by a [`RefContext`].
#[derive(Clone, Debug)]
pub struct RefSurface {
    ctx: RefContext,
}

impl RefSurface {
    /// A transparent surface.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            ctx: RefContext::new(width, height),
        }
    }

    /// The pixel buffer, without copying.
    #[must_use]
    pub fn pixels(&self) -> &ImageData {
        self.ctx.pixels()
    }
}

impl Surface for RefSurface {
    fn width(&self) -> u32 {
        self.ctx.pixels.width
    }

    fn height(&self) -> u32 {
        self.ctx.pixels.height
    }

    fn context(&mut self) -> &mut dyn DrawContext {
        &mut self.ctx
    }

    fn snapshot(&self) -> Result<ImageData, SurfaceError> {
        Ok(self.ctx.pixels.clone())
    }
}

/// Creates [`RefSurface`]s.
#[derive(Clone, Debug)]
pub struct RefSurfaceFactory {
    max_dimension: u32,
    created: usize,
}

impl Default for RefSurfaceFactory {
    fn default() -> Self {
        Self {
            max_dimension: 8192,
            created: 0,
        }
    }
}

impl RefSurfaceFactory {
    /// Refuses surfaces wider or taller than `max_dimension` pixels.
    #[must_use]
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension,
            created: 0,
        }
    }

    /// Number of surfaces created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created
    }
}

impl SurfaceFactory for RefSurfaceFactory {
    fn create_surface(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, SurfaceError> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        self.created += 1;
        Ok(Box::new(RefSurface::new(width, height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;

    const RED: Color = Color::from_rgba8(255, 0, 0, 255);

    #[test]
    fn rect_fill_is_point_sampled() {
        let mut ctx = RefContext::new(4, 4);
        ctx.set_fill_style(RED);
        ctx.rect(Rect::new(1.0, 1.0, 3.0, 3.0));
        ctx.fill();
        assert_eq!(ctx.pixels().pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(ctx.pixels().alpha(0, 0), 0);
        assert_eq!(ctx.pixels().alpha(3, 3), 0);
    }

    #[test]
    fn transform_applies_to_path_commands() {
        let mut ctx = RefContext::new(8, 8);
        let mut t = Transform::IDENTITY;
        t.translate(4.0, 4.0);
        ctx.set_transform(&t);
        ctx.rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        assert!(ctx.is_point_in_path(Point::new(5.0, 5.0)));
        assert!(!ctx.is_point_in_path(Point::new(1.0, 1.0)));
    }

    #[test]
    fn full_circle_arc_contains_center() {
        let mut ctx = RefContext::new(20, 20);
        ctx.arc(Point::new(10.0, 10.0), 5.0, 0.0, 2.0 * PI, false);
        ctx.close_path();
        assert!(ctx.is_point_in_path(Point::new(10.0, 10.0)));
        assert!(ctx.is_point_in_path(Point::new(13.0, 10.0)));
        assert!(!ctx.is_point_in_path(Point::new(16.0, 10.0)));
    }

    #[test]
    fn stroke_containment_uses_line_width() {
        let mut ctx = RefContext::new(20, 20);
        ctx.move_to(Point::new(0.0, 10.0));
        ctx.line_to(Point::new(20.0, 10.0));
        ctx.set_line_width(4.0);
        assert!(ctx.is_point_in_stroke(Point::new(10.0, 11.5)));
        assert!(!ctx.is_point_in_stroke(Point::new(10.0, 13.0)));
    }

    #[test]
    fn global_alpha_blends_over_transparent() {
        let mut ctx = RefContext::new(1, 1);
        ctx.set_fill_style(RED);
        ctx.set_global_alpha(0.5);
        ctx.rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        ctx.fill();
        assert_eq!(ctx.pixels().pixel(0, 0), Some([255, 0, 0, 128]));
    }

    #[test]
    fn save_restore_round_trips_state() {
        let mut ctx = RefContext::new(4, 4);
        ctx.save();
        ctx.set_transform(&Transform::from_translation(2.0, 0.0));
        ctx.restore();
        ctx.rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!(ctx.is_point_in_path(Point::new(0.5, 0.5)));
    }

    #[test]
    fn draw_image_scales_through_transform() {
        let mut img = ImageData::new(1, 1);
        img.set_pixel(0, 0, [0, 0, 255, 255]);
        let mut ctx = RefContext::new(4, 4);
        let mut t = Transform::IDENTITY;
        t.scale(2.0, 2.0);
        ctx.set_transform(&t);
        ctx.draw_image(&img, Point::new(1.0, 0.0));
        assert_eq!(ctx.pixels().alpha(2, 0), 255);
        assert_eq!(ctx.pixels().alpha(3, 1), 255);
        assert_eq!(ctx.pixels().alpha(1, 0), 0);
    }

    #[test]
    fn image_data_region_bounds() {
        let ctx = RefContext::new(4, 4);
        assert!(ctx.get_image_data(2, 2, 2, 2).is_ok());
        assert!(matches!(
            ctx.get_image_data(3, 0, 2, 1),
            Err(SurfaceError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn factory_rejects_empty_surfaces() {
        let mut factory = RefSurfaceFactory::default();
        assert!(factory.create_surface(0, 10).is_err());
        assert!(factory.create_surface(10, 10).is_ok());
        assert_eq!(factory.created(), 1);
    }
}
