// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing surfaces consumed by the render pass, raster caches and hit tests.
//!
//! The engine never rasterizes by itself. A [`SurfaceFactory`] hands out
//! [`Surface`]s, and shapes draw through the stateful, canvas-like
//! [`DrawContext`] each surface exposes. [`crate::reference`] provides a CPU
//! implementation of all three.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect};
use peniko::Color;
use trellis_transform::Transform;

/// Failure of a surface operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The backend cannot create a surface of this size.
    #[error("cannot create a {width}x{height} surface")]
    InvalidSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// Pixel reads are not permitted on this surface.
    #[error("surface pixels are not readable: {0}")]
    Unreadable(String),
    /// The requested region lies outside the surface.
    #[error("region {x},{y} {width}x{height} is outside the surface")]
    OutOfBounds {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
    },
    /// Any other backend failure.
    #[error("surface backend failure: {0}")]
    Backend(String),
}

/// Straight-alpha RGBA8 pixels, row major.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl ImageData {
    /// A transparent image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    /// The pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        let p = self.data.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Alpha at `(x, y)`, zero outside the image.
    #[must_use]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y).map_or(0, |p| p[3])
    }

    /// Overwrites the pixel at `(x, y)`; out-of-range writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            if let Some(p) = self.data.get_mut(i..i + 4) {
                p.copy_from_slice(&rgba);
            }
        }
    }

    /// Whether every pixel is fully transparent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|p| p[3] == 0)
    }
}

/// A stateful, canvas-like 2D drawing context.
///
/// Path commands are given in user space and mapped through the current
/// transform. Containment queries take device-space points.
pub trait DrawContext {
    /// Starts a new path, discarding the current one.
    fn begin_path(&mut self);
    /// Closes the current subpath.
    fn close_path(&mut self);
    /// Starts a subpath at `p`.
    fn move_to(&mut self, p: Point);
    /// Adds a line to `p`.
    fn line_to(&mut self, p: Point);
    /// Adds a cubic Bézier segment.
    fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point);
    /// Adds a circular arc, angles in radians.
    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, counter_clockwise: bool);
    /// Adds a closed rectangle subpath.
    fn rect(&mut self, rect: Rect);
    /// Fills the current path with the fill color.
    fn fill(&mut self);
    /// Strokes the current path with the stroke color and line width.
    fn stroke(&mut self);
    /// Sets the fill color.
    fn set_fill_style(&mut self, color: Color);
    /// Sets the stroke color.
    fn set_stroke_style(&mut self, color: Color);
    /// Sets the stroke width in user units.
    fn set_line_width(&mut self, width: f64);
    /// Sets the alpha multiplied into every draw.
    fn set_global_alpha(&mut self, alpha: f64);
    /// Pushes the drawing state.
    fn save(&mut self);
    /// Pops the drawing state.
    fn restore(&mut self);
    /// Post-multiplies the current transform.
    fn transform(&mut self, t: &Transform);
    /// Replaces the current transform.
    fn set_transform(&mut self, t: &Transform);
    /// Resets the current transform to identity.
    fn reset_transform(&mut self) {
        self.set_transform(&Transform::IDENTITY);
    }
    /// Whether device point `p` is inside the current path.
    fn is_point_in_path(&self, p: Point) -> bool;
    /// Whether device point `p` is on the stroked outline of the current path.
    fn is_point_in_stroke(&self, p: Point) -> bool;
    /// Copies device pixels out of the surface.
    fn get_image_data(&self, x: u32, y: u32, width: u32, height: u32)
    -> Result<ImageData, SurfaceError>;
    /// Copies pixels into the surface at device position `(x, y)`, ignoring
    /// transform and alpha.
    fn put_image_data(&mut self, image: &ImageData, x: i32, y: i32);
    /// Draws `image` with its top-left corner at user-space `at`, through the
    /// current transform and global alpha.
    fn draw_image(&mut self, image: &ImageData, at: Point);
    /// Clears every pixel to transparent.
    fn clear(&mut self);
}

/// A pixel buffer with a drawing context.
pub trait Surface {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
    /// The drawing context.
    fn context(&mut self) -> &mut dyn DrawContext;
    /// Copies every pixel.
    fn snapshot(&self) -> Result<ImageData, SurfaceError>;
}

/// Creates off-screen surfaces.
pub trait SurfaceFactory {
    /// A transparent surface of `width` by `height` pixels.
    fn create_surface(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, SurfaceError>;
}

/// Rounds a non-negative extent up to whole pixels.
#[expect(
    clippy::cast_possible_truncation,
    reason = "extents are clamped to the u32 range first"
)]
pub(crate) fn pixel_extent(units: f64) -> u32 {
    units.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_pixels_and_bounds() {
        let mut img = ImageData::new(2, 2);
        assert!(img.is_blank());
        img.set_pixel(1, 0, [1, 2, 3, 4]);
        img.set_pixel(5, 5, [9, 9, 9, 9]);
        assert_eq!(img.pixel(1, 0), Some([1, 2, 3, 4]));
        assert_eq!(img.alpha(1, 0), 4);
        assert_eq!(img.pixel(2, 0), None);
        assert!(!img.is_blank());
    }

    #[test]
    fn extents_round_up() {
        assert_eq!(pixel_extent(2.1), 3);
        assert_eq!(pixel_extent(-4.0), 0);
    }
}
