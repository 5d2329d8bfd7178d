// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 16.16 fixed-point numbers and projective transforms.

use peniko::kurbo::Affine;

/// A 16.16 fixed-point number.
pub type Fixed = i32;

pub const FIXED_1: Fixed = 1 << 16;
/// The smallest positive fixed-point value.
pub const FIXED_E: Fixed = 1;
pub const FIXED_1_MINUS_E: Fixed = FIXED_1 - FIXED_E;
pub const FIXED_HALF: Fixed = FIXED_1 / 2;

#[inline(always)]
pub const fn int_to_fixed(i: i32) -> Fixed {
    i << 16
}

/// `int_to_fixed`, clamped to the representable range.
#[inline(always)]
pub const fn int_to_fixed_saturating(i: i32) -> Fixed {
    if i > fixed_to_int(Fixed::MAX) {
        Fixed::MAX
    } else if i < fixed_to_int(Fixed::MIN) {
        Fixed::MIN
    } else {
        int_to_fixed(i)
    }
}

/// Floor of a fixed-point number.
#[inline(always)]
pub const fn fixed_to_int(f: Fixed) -> i32 {
    f >> 16
}

#[inline(always)]
pub const fn fixed_frac(f: Fixed) -> Fixed {
    f & FIXED_1_MINUS_E
}

#[inline(always)]
pub const fn fixed_floor(f: Fixed) -> Fixed {
    f & !FIXED_1_MINUS_E
}

#[inline]
pub fn double_to_fixed(d: f64) -> Fixed {
    (d * 65536.0).round() as Fixed
}

#[inline]
pub fn fixed_to_double(f: Fixed) -> f64 {
    f as f64 / 65536.0
}

/// A point in fixed-point coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PointFixed {
    pub x: Fixed,
    pub y: Fixed,
}

impl PointFixed {
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }
}

impl From<peniko::kurbo::Point> for PointFixed {
    fn from(p: peniko::kurbo::Point) -> Self {
        Self::new(double_to_fixed(p.x), double_to_fixed(p.y))
    }
}

/// A 3x3 projective matrix in fixed point, mapping destination space to source space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transform {
    pub matrix: [[Fixed; 3]; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        matrix: [[FIXED_1, 0, 0], [0, FIXED_1, 0], [0, 0, FIXED_1]],
    };

    pub const fn scale(sx: Fixed, sy: Fixed) -> Self {
        Self {
            matrix: [[sx, 0, 0], [0, sy, 0], [0, 0, FIXED_1]],
        }
    }

    pub const fn translate(tx: Fixed, ty: Fixed) -> Self {
        Self {
            matrix: [[FIXED_1, 0, tx], [0, FIXED_1, ty], [0, 0, FIXED_1]],
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether the bottom row is `[0, 0, 1]`.
    pub fn is_affine(&self) -> bool {
        self.matrix[2] == [0, 0, FIXED_1]
    }

    /// Whether the transform only scales and translates along the axes.
    pub fn is_scale(&self) -> bool {
        self.is_affine() && self.matrix[0][1] == 0 && self.matrix[1][0] == 0
    }

    /// Whether the transform is a translation by whole pixels.
    pub fn is_int_translate(&self) -> bool {
        self.is_scale()
            && self.matrix[0][0] == FIXED_1
            && self.matrix[1][1] == FIXED_1
            && fixed_frac(self.matrix[0][2]) == 0
            && fixed_frac(self.matrix[1][2]) == 0
    }

    /// Multiply the homogeneous vector `(x, y, w)` by the matrix, rounding to nearest.
    pub fn transform_3d(&self, v: [Fixed; 3]) -> [Fixed; 3] {
        let mut out = [0; 3];

        for (i, row) in self.matrix.iter().enumerate() {
            let sum: i64 = row
                .iter()
                .zip(v)
                .map(|(&m, v)| m as i64 * v as i64)
                .sum();
            out[i] = ((sum + 0x8000) >> 16) as Fixed;
        }

        out
    }

    /// Transform a point, performing the projective division. Returns `None`
    /// when the point maps to infinity.
    pub fn transform_point(&self, p: PointFixed) -> Option<PointFixed> {
        let [x, y, w] = self.transform_3d([p.x, p.y, FIXED_1]);

        if w == FIXED_1 {
            return Some(PointFixed::new(x, y));
        }
        if w == 0 {
            return None;
        }

        let div = |v: Fixed| Fixed::try_from(((v as i64) << 16) / w as i64).ok();

        Some(PointFixed::new(div(x)?, div(y)?))
    }
}

impl From<Affine> for Transform {
    fn from(value: Affine) -> Self {
        let [a, b, c, d, e, f] = value.as_coeffs();
        let t = double_to_fixed;

        Self {
            matrix: [[t(a), t(c), t(e)], [t(b), t(d), t(f)], [0, 0, FIXED_1]],
        }
    }
}
