// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear, radial and conical gradients.
//!
//! Every gradient maps a sample position to a parameter `t`; the repeat mode then
//! folds `t` into `[0, 1]` and the color is interpolated between the two enclosing
//! stops in premultiplied 16-bit space.

use crate::color::Color;
use crate::image::{Classification, Common, Repeat};
use crate::transform::{fixed_to_double, Fixed, PointFixed};
use std::f64::consts::PI;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GradientStop {
    /// The position of the stop in `[0, 1]`.
    pub x: Fixed,
    pub color: Color,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Circle {
    pub x: Fixed,
    pub y: Fixed,
    pub radius: Fixed,
}

#[derive(Clone, Debug, PartialEq)]
struct Stops(Vec<GradientStop>);

impl Stops {
    fn new(stops: &[GradientStop]) -> Self {
        let mut stops = stops.to_vec();
        stops.sort_by_key(|s| s.x);
        Self(stops)
    }

    fn is_opaque(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|s| s.color.alpha == 0xffff)
    }

    /// The premultiplied color at `t`, after the repeat mode has been applied.
    fn color_at(&self, t: f64, repeat: Repeat) -> Color {
        let t = match repeat {
            Repeat::None if !(0.0..=1.0).contains(&t) => return Color::TRANSPARENT,
            Repeat::None | Repeat::Pad => t.clamp(0.0, 1.0),
            Repeat::Normal => t - t.floor(),
            Repeat::Reflect => {
                let t = t.rem_euclid(2.0);
                if t > 1.0 {
                    2.0 - t
                } else {
                    t
                }
            }
        };

        let (Some(first), Some(last)) = (self.0.first(), self.0.last()) else {
            return Color::TRANSPARENT;
        };

        if t <= fixed_to_double(first.x) {
            return first.color;
        }
        if t >= fixed_to_double(last.x) {
            return last.color;
        }

        let i = self
            .0
            .windows(2)
            .position(|w| t < fixed_to_double(w[1].x))
            .unwrap_or(self.0.len() - 2);
        let (s0, s1) = (&self.0[i], &self.0[i + 1]);
        let (x0, x1) = (fixed_to_double(s0.x), fixed_to_double(s1.x));
        let f = if x1 > x0 { (t - x0) / (x1 - x0) } else { 0.0 };
        let lerp = |a: u16, b: u16| (a as f64 + (b as f64 - a as f64) * f + 0.5) as u16;

        Color::new(
            lerp(s0.color.red, s1.color.red),
            lerp(s0.color.green, s1.color.green),
            lerp(s0.color.blue, s1.color.blue),
            lerp(s0.color.alpha, s1.color.alpha),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    p1: PointFixed,
    p2: PointFixed,
    stops: Stops,
}

impl LinearGradient {
    pub(crate) fn new(p1: PointFixed, p2: PointFixed, stops: &[GradientStop]) -> Self {
        Self {
            p1,
            p2,
            stops: Stops::new(stops),
        }
    }

    pub(crate) fn is_opaque(&self) -> bool {
        self.stops.is_opaque()
    }

    pub(crate) fn classify(&self) -> Classification {
        if self.p1.y == self.p2.y {
            Classification::HorizontalInvariant
        } else if self.p1.x == self.p2.x {
            Classification::VerticalInvariant
        } else {
            Classification::Unknown
        }
    }

    fn parameter(&self, (x, y): (f64, f64)) -> Option<f64> {
        let (x1, y1) = (fixed_to_double(self.p1.x), fixed_to_double(self.p1.y));
        let (dx, dy) = (
            fixed_to_double(self.p2.x) - x1,
            fixed_to_double(self.p2.y) - y1,
        );
        let len = dx * dx + dy * dy;

        if len == 0.0 {
            return Some(0.0);
        }

        Some(((x - x1) * dx + (y - y1) * dy) / len)
    }

    pub(crate) fn fetch_scanline(&self, common: &Common, x: i32, y: i32, out: &mut [u32]) {
        fetch(common, &self.stops, x, y, out, |p| self.parameter(p));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RadialGradient {
    inner: Circle,
    outer: Circle,
    stops: Stops,
}

impl RadialGradient {
    pub(crate) fn new(inner: Circle, outer: Circle, stops: &[GradientStop]) -> Self {
        Self {
            inner,
            outer,
            stops: Stops::new(stops),
        }
    }

    /// Opaque stops only cover every pixel when one circle contains the other.
    pub(crate) fn is_opaque(&self) -> bool {
        self.stops.is_opaque() && self.a() < 0.0
    }

    /// Quadratic coefficient of the circle equation in `t`.
    fn a(&self) -> f64 {
        let f = fixed_to_double;
        let cdx = f(self.outer.x) - f(self.inner.x);
        let cdy = f(self.outer.y) - f(self.inner.y);
        let dr = f(self.outer.radius) - f(self.inner.radius);
        cdx * cdx + cdy * cdy - dr * dr
    }

    /// The largest `t` such that the point lies on the circle interpolated between
    /// the two circles at `t` and that circle has a non-negative radius.
    fn parameter(&self, (x, y): (f64, f64)) -> Option<f64> {
        let f = fixed_to_double;
        let (cx, cy, r1) = (f(self.inner.x), f(self.inner.y), f(self.inner.radius));
        let (cdx, cdy, dr) = (
            f(self.outer.x) - cx,
            f(self.outer.y) - cy,
            f(self.outer.radius) - r1,
        );
        let (pdx, pdy) = (x - cx, y - cy);

        let a = self.a();
        let b = pdx * cdx + pdy * cdy + r1 * dr;
        let c = pdx * pdx + pdy * pdy - r1 * r1;
        let valid = |t: f64| r1 + t * dr >= 0.0;

        if a == 0.0 {
            if b == 0.0 {
                return None;
            }
            let t = c / (2.0 * b);
            return valid(t).then_some(t);
        }

        let discr = b * b - a * c;
        if discr < 0.0 {
            return None;
        }

        let sqrt = discr.sqrt();
        let (t1, t2) = ((b + sqrt) / a, (b - sqrt) / a);
        let (hi, lo) = if t1 >= t2 { (t1, t2) } else { (t2, t1) };

        if valid(hi) {
            Some(hi)
        } else if valid(lo) {
            Some(lo)
        } else {
            None
        }
    }

    pub(crate) fn fetch_scanline(&self, common: &Common, x: i32, y: i32, out: &mut [u32]) {
        fetch(common, &self.stops, x, y, out, |p| self.parameter(p));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConicalGradient {
    center: PointFixed,
    /// Start angle in radians.
    angle: f64,
    stops: Stops,
}

impl ConicalGradient {
    pub(crate) fn new(center: PointFixed, angle: Fixed, stops: &[GradientStop]) -> Self {
        Self {
            center,
            angle: fixed_to_double(angle).to_radians(),
            stops: Stops::new(stops),
        }
    }

    pub(crate) fn is_opaque(&self) -> bool {
        self.stops.is_opaque()
    }

    fn parameter(&self, (x, y): (f64, f64)) -> Option<f64> {
        let dx = x - fixed_to_double(self.center.x);
        let dy = y - fixed_to_double(self.center.y);
        let t = (dy.atan2(dx) + self.angle).rem_euclid(2.0 * PI);

        Some(1.0 - t / (2.0 * PI))
    }

    pub(crate) fn fetch_scanline(&self, common: &Common, x: i32, y: i32, out: &mut [u32]) {
        fetch(common, &self.stops, x, y, out, |p| self.parameter(p));
    }
}

/// Sample the gradient at the pixel centers of a scanline.
fn fetch(
    common: &Common,
    stops: &Stops,
    x: i32,
    y: i32,
    out: &mut [u32],
    parameter: impl Fn((f64, f64)) -> Option<f64>,
) {
    let m = common.transform.map(|t| t.matrix.map(|row| row.map(fixed_to_double)));

    for (i, o) in out.iter_mut().enumerate() {
        let (px, py) = ((x + i as i32) as f64 + 0.5, y as f64 + 0.5);

        let p = match m {
            None => Some((px, py)),
            Some(m) => {
                let w = m[2][0] * px + m[2][1] * py + m[2][2];
                (w != 0.0).then(|| {
                    (
                        (m[0][0] * px + m[0][1] * py + m[0][2]) / w,
                        (m[1][0] * px + m[1][1] * py + m[1][2]) / w,
                    )
                })
            }
        };

        *o = p
            .and_then(&parameter)
            .map_or(0, |t| stops.color_at(t, common.repeat).to_argb32());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use crate::transform::{int_to_fixed, FIXED_1};

    fn stops() -> [GradientStop; 2] {
        [
            GradientStop {
                x: 0,
                color: Color::from_argb32(0xff00_0000),
            },
            GradientStop {
                x: FIXED_1,
                color: Color::from_argb32(0xffff_ffff),
            },
        ]
    }

    #[test]
    fn linear_interpolates_between_stops() {
        let g = LinearGradient::new(
            PointFixed::new(0, 0),
            PointFixed::new(int_to_fixed(4), 0),
            &stops(),
        );
        let image = Image::linear_gradient(g.p1, g.p2, &stops());
        let mut out = [0; 4];
        g.fetch_scanline(&image.common, 0, 0, &mut out);

        // Samples at 0.5, 1.5, 2.5 and 3.5 out of 4.
        assert_eq!(out[0], 0xff20_2020);
        assert_eq!(out[3], 0xffdf_dfdf);
        assert_eq!(g.classify(), Classification::HorizontalInvariant);
    }

    #[test]
    fn repeat_none_is_transparent_outside() {
        let s = Stops::new(&stops());
        assert_eq!(s.color_at(1.5, Repeat::None), Color::TRANSPARENT);
        assert_eq!(s.color_at(1.5, Repeat::Pad).to_argb32(), 0xffff_ffff);
        assert_eq!(
            s.color_at(1.25, Repeat::Normal),
            s.color_at(0.25, Repeat::Pad)
        );
        assert_eq!(
            s.color_at(1.25, Repeat::Reflect),
            s.color_at(0.75, Repeat::Pad)
        );
    }

    #[test]
    fn radial_center_and_edge() {
        let inner = Circle {
            x: 0,
            y: 0,
            radius: 0,
        };
        let outer = Circle {
            x: 0,
            y: 0,
            radius: int_to_fixed(10),
        };
        let g = RadialGradient::new(inner, outer, &stops());

        assert_eq!(g.parameter((0.0, 0.0)), Some(0.0));
        assert_eq!(g.parameter((10.0, 0.0)), Some(1.0));
        assert_eq!(g.parameter((0.0, 5.0)), Some(0.5));
        assert!(g.is_opaque());
    }

    #[test]
    fn disjoint_radial_is_not_opaque() {
        let circle = |x| Circle {
            x: int_to_fixed(x),
            y: 0,
            radius: FIXED_1,
        };
        let g = RadialGradient::new(circle(0), circle(10), &stops());

        // Points far off the axis lie on no interpolated circle.
        assert_eq!(g.parameter((5.0, 20.0)), None);
        assert!(!g.is_opaque());
    }

    #[test]
    fn conical_sweeps_once() {
        let g = ConicalGradient::new(PointFixed::new(0, 0), 0, &stops());
        let t = g.parameter((0.0, -1.0)).unwrap();
        assert!((t - 0.25).abs() < 1e-9);
        assert!(g.is_opaque());
    }
}
