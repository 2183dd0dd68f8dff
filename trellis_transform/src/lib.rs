// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Transform: a mutable 2D affine matrix in canvas coefficient order.
//!
//! A [`Transform`] stores six coefficients `[m0, m1, m2, m3, m4, m5]` laid out as
//!
//! ```text
//! | m0 m2 m4 |
//! | m1 m3 m5 |
//! | 0  0  1  |
//! ```
//!
//! which is the same order used by `kurbo::Affine` and by the HTML canvas
//! `setTransform(a, b, c, d, e, f)` call.
//!
//! Every operation post-multiplies: `t.translate(..)` followed by `t.scale(..)`
//! means "scale in the already translated space". This matches how a scene
//! graph composes a node's local transform from its parent outward.
//!
//! Methods mutate in place and return `&mut Self` so they chain:
//!
//! ```
//! use kurbo::Point;
//! use trellis_transform::Transform;
//!
//! let mut t = Transform::IDENTITY;
//! t.translate(10.0, 20.0).scale(2.0, 2.0);
//! assert_eq!(t.point(Point::new(1.0, 1.0)), Point::new(12.0, 22.0));
//!
//! let inv = t.try_inverse().unwrap();
//! assert_eq!(inv.point(Point::new(12.0, 22.0)), Point::new(1.0, 1.0));
//! ```
//!
//! [`Transform::decompose`] recovers translation, rotation, scale and skew
//! such that [`Decomposition::to_transform`] rebuilds the matrix.
//!
//! This crate is `no_std`. Enable the `libm` feature when building without `std`.

#![no_std]

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use core::f64::consts::FRAC_PI_2;
use core::ops::{Mul, MulAssign};

use kurbo::{Affine, Point, Vec2};

/// A 2D affine transform stored as six coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    m: [f64; 6],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Creates a transform from raw coefficients.
    #[must_use]
    pub const fn new(m: [f64; 6]) -> Self {
        Self { m }
    }

    /// Creates a pure translation.
    #[must_use]
    pub const fn from_translation(x: f64, y: f64) -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    /// Returns the raw coefficients.
    #[must_use]
    pub const fn coeffs(&self) -> [f64; 6] {
        self.m
    }

    /// Resets to identity.
    pub fn reset(&mut self) -> &mut Self {
        self.m = Self::IDENTITY.m;
        self
    }

    /// Writes this transform's coefficients into `dst`.
    ///
    /// Keeps the destination's storage; useful for cache slots.
    pub fn copy_into(&self, dst: &mut Self) {
        dst.m = self.m;
    }

    /// Post-multiplies by a translation.
    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        let m = &mut self.m;
        m[4] += m[0] * x + m[2] * y;
        m[5] += m[1] * x + m[3] * y;
        self
    }

    /// Post-multiplies by a non-uniform scale.
    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        let m = &mut self.m;
        m[0] *= sx;
        m[1] *= sx;
        m[2] *= sy;
        m[3] *= sy;
        self
    }

    /// Post-multiplies by a rotation, in radians.
    pub fn rotate(&mut self, radians: f64) -> &mut Self {
        let (s, c) = radians.sin_cos();
        let [m0, m1, m2, m3, _, _] = self.m;
        self.m[0] = m0 * c + m2 * s;
        self.m[1] = m1 * c + m3 * s;
        self.m[2] = m0 * -s + m2 * c;
        self.m[3] = m1 * -s + m3 * c;
        self
    }

    /// Post-multiplies by a skew.
    ///
    /// `kx` shears x by y, `ky` shears y by x.
    pub fn skew(&mut self, kx: f64, ky: f64) -> &mut Self {
        let [m0, m1, m2, m3, _, _] = self.m;
        self.m[0] = m0 + m2 * ky;
        self.m[1] = m1 + m3 * ky;
        self.m[2] = m2 + m0 * kx;
        self.m[3] = m3 + m1 * kx;
        self
    }

    /// Post-multiplies by `other`: `self = self * other`.
    pub fn multiply(&mut self, other: &Self) -> &mut Self {
        let a = self.m;
        let b = other.m;
        self.m = [
            a[0] * b[0] + a[2] * b[1],
            a[1] * b[0] + a[3] * b[1],
            a[0] * b[2] + a[2] * b[3],
            a[1] * b[2] + a[3] * b[3],
            a[0] * b[4] + a[2] * b[5] + a[4],
            a[1] * b[4] + a[3] * b[5] + a[5],
        ];
        self
    }

    /// Determinant of the linear part.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.m[0] * self.m[3] - self.m[1] * self.m[2]
    }

    /// Whether the transform has a finite, non-zero determinant.
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det != 0.0 && det.is_finite()
    }

    /// Returns the inverse, or `None` when the transform is singular.
    #[must_use]
    pub fn try_inverse(&self) -> Option<Self> {
        if !self.is_invertible() {
            return None;
        }
        let [m0, m1, m2, m3, m4, m5] = self.m;
        let d = 1.0 / self.determinant();
        Some(Self {
            m: [
                m3 * d,
                -m1 * d,
                -m2 * d,
                m0 * d,
                d * (m2 * m5 - m3 * m4),
                d * (m1 * m4 - m0 * m5),
            ],
        })
    }

    /// Inverts in place.
    ///
    /// A singular transform has no inverse; the coefficients then become
    /// non-finite, exactly as the closed form produces. Prefer
    /// [`Transform::try_inverse`] when the input may be degenerate.
    pub fn invert(&mut self) -> &mut Self {
        let [m0, m1, m2, m3, m4, m5] = self.m;
        let d = 1.0 / self.determinant();
        self.m = [
            m3 * d,
            -m1 * d,
            -m2 * d,
            m0 * d,
            d * (m2 * m5 - m3 * m4),
            d * (m1 * m4 - m0 * m5),
        ];
        self
    }

    /// Maps a point.
    #[must_use]
    pub fn point(&self, p: Point) -> Point {
        let m = &self.m;
        Point::new(m[0] * p.x + m[2] * p.y + m[4], m[1] * p.x + m[3] * p.y + m[5])
    }

    /// Maps a vector (ignores translation).
    #[must_use]
    pub fn vector(&self, v: Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(m[0] * v.x + m[2] * v.y, m[1] * v.x + m[3] * v.y)
    }

    /// The translation component.
    #[must_use]
    pub fn translation(&self) -> Point {
        Point::new(self.m[4], self.m[5])
    }

    /// Splits the matrix into translation, rotation, scale and skew.
    ///
    /// Rotation is in radians. At most one of the two skew components is
    /// non-zero: `skew.x` when the first column is non-degenerate, otherwise
    /// `skew.y`.
    #[must_use]
    pub fn decompose(&self) -> Decomposition {
        let [a, b, c, d, e, f] = self.m;
        let delta = a * d - b * c;
        let shear = |num: f64| if delta == 0.0 { 0.0 } else { num / delta };
        let mut out = Decomposition {
            translation: Vec2::new(e, f),
            rotation: 0.0,
            scale: Vec2::ZERO,
            skew: Vec2::ZERO,
        };

        if a != 0.0 || b != 0.0 {
            let r = a.hypot(b);
            out.rotation = if b > 0.0 { (a / r).acos() } else { -(a / r).acos() };
            out.scale = Vec2::new(r, delta / r);
            out.skew = Vec2::new(shear(a * c + b * d), 0.0);
        } else if c != 0.0 || d != 0.0 {
            let s = c.hypot(d);
            out.rotation = FRAC_PI_2 - if d > 0.0 { (-c / s).acos() } else { -(c / s).acos() };
            out.scale = Vec2::new(delta / s, s);
            out.skew = Vec2::new(0.0, shear(a * c + b * d));
        }
        out
    }

    /// Whether all coefficients are within `eps` of `other`'s.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

/// Result of [`Transform::decompose`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decomposition {
    /// Translation.
    pub translation: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Scale along x and y.
    pub scale: Vec2,
    /// Skew factors.
    pub skew: Vec2,
}

impl Decomposition {
    /// Rebuilds the matrix as translate, rotate, skew, then scale.
    #[must_use]
    pub fn to_transform(&self) -> Transform {
        let mut t = Transform::from_translation(self.translation.x, self.translation.y);
        t.rotate(self.rotation)
            .skew(self.skew.x, self.skew.y)
            .scale(self.scale.x, self.scale.y);
        t
    }
}

impl Mul for Transform {
    type Output = Self;

    fn mul(mut self, rhs: Self) -> Self {
        self.multiply(&rhs);
        self
    }
}

impl MulAssign for Transform {
    fn mul_assign(&mut self, rhs: Self) {
        self.multiply(&rhs);
    }
}

impl From<Affine> for Transform {
    fn from(affine: Affine) -> Self {
        Self::new(affine.as_coeffs())
    }
}

impl From<Transform> for Affine {
    fn from(t: Transform) -> Self {
        Self::new(t.m)
    }
}
