// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trapezoids, traps and triangles, and compositing through their coverage.
//!
//! All coordinates are 16.16 fixed point in the coordinate space of the image they are
//! rasterized into, shifted by whole-pixel offsets.

use crate::edge::{alpha_depth, rasterize_edges, sample_ceil_y, sample_floor_y, Edge};
use crate::error::Error;
use crate::execute::Implementation;
use crate::format::Format;
use crate::image::Image;
use crate::operator::Operator;
use crate::region::Box32;
use crate::transform::{
    fixed_to_int, int_to_fixed, int_to_fixed_saturating, Fixed, PointFixed, FIXED_1_MINUS_E,
};
use log::debug;

/// A line through two points.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LineFixed {
    pub p1: PointFixed,
    pub p2: PointFixed,
}

impl LineFixed {
    pub const fn new(p1: PointFixed, p2: PointFixed) -> Self {
        Self { p1, p2 }
    }
}

/// The area between `top` and `bottom` bounded by two lines. The lines only give the
/// direction of the sides and may extend beyond either horizontal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Trapezoid {
    pub top: Fixed,
    pub bottom: Fixed,
    pub left: LineFixed,
    pub right: LineFixed,
}

impl Trapezoid {
    /// Whether the trapezoid has height and both sides are not horizontal.
    pub fn is_valid(&self) -> bool {
        self.left.p1.y != self.left.p2.y
            && self.right.p1.y != self.right.p2.y
            && self.bottom > self.top
    }

    /// The whole-pixel box that covers the trapezoid.
    fn extents(&self) -> Box32 {
        let ceil = |v: Fixed| fixed_to_int(v.saturating_add(FIXED_1_MINUS_E));
        let xs = [
            self.left.p1.x,
            self.left.p2.x,
            self.right.p1.x,
            self.right.p2.x,
        ];

        Box32::new(
            xs.iter().map(|x| fixed_to_int(*x)).min().unwrap_or(0),
            fixed_to_int(self.top),
            xs.iter().map(|x| ceil(*x)).max().unwrap_or(0),
            ceil(self.bottom),
        )
    }
}

/// A horizontal span from `l` to `r` at height `y`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SpanFix {
    pub l: Fixed,
    pub r: Fixed,
    pub y: Fixed,
}

/// A trapezoid given by its top and bottom spans.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Trap {
    pub top: SpanFix,
    pub bot: SpanFix,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Triangle {
    pub p1: PointFixed,
    pub p2: PointFixed,
    pub p3: PointFixed,
}

impl Triangle {
    /// Split the triangle at its middle vertex into a top and a bottom trapezoid.
    pub fn to_trapezoids(&self) -> [Trapezoid; 2] {
        // Order by y, then by x for vertices at the same height.
        let greater = |a: PointFixed, b: PointFixed| {
            if a.y == b.y {
                a.x > b.x
            } else {
                a.y > b.y
            }
        };
        // y points down, so a negative cross product means `b` lies clockwise of `a`.
        let clockwise = |origin: PointFixed, a: PointFixed, b: PointFixed| {
            let (ax, ay) = ((a.x - origin.x) as i64, (a.y - origin.y) as i64);
            let (bx, by) = ((b.x - origin.x) as i64, (b.y - origin.y) as i64);
            by * ax - ay * bx < 0
        };

        let (mut top, mut left, mut right) = (self.p1, self.p2, self.p3);
        if greater(top, left) {
            std::mem::swap(&mut top, &mut left);
        }
        if greater(top, right) {
            std::mem::swap(&mut top, &mut right);
        }
        if clockwise(top, right, left) {
            std::mem::swap(&mut left, &mut right);
        }

        let upper = Trapezoid {
            top: top.y,
            bottom: left.y.min(right.y),
            left: LineFixed::new(top, left),
            right: LineFixed::new(top, right),
        };

        let mut lower = upper;
        if right.y < left.y {
            lower.top = right.y;
            lower.bottom = left.y;
            lower.right = LineFixed::new(right, left);
        } else {
            lower.top = left.y;
            lower.bottom = right.y;
            lower.left = LineFixed::new(left, right);
        }

        [upper, lower]
    }
}

/// The first and last sample rows inside `image` between `top` and `bottom`, which are
/// already offset, or `None` if there are none.
fn sample_rows(bpp: u32, height: i32, top: Fixed, bottom: Fixed) -> Option<(Fixed, Fixed)> {
    let t = sample_ceil_y(top.max(0), bpp);

    let mut b = bottom;
    if fixed_to_int(b) >= height {
        b = int_to_fixed(height) - 1;
    }
    let b = sample_floor_y(b, bpp);

    (b >= t).then_some((t, b))
}

/// Add the coverage of `trap`, shifted by whole pixels, to an alpha image.
///
/// Invalid trapezoids are ignored. Fails if `image` is not an 8-, 4- or 1-bit alpha
/// image.
pub fn rasterize_trapezoid(
    image: &mut Image,
    trap: &Trapezoid,
    x_off: i32,
    y_off: i32,
) -> Result<(), Error> {
    let Some(bpp) = alpha_depth(image)? else {
        return Ok(());
    };
    if !trap.is_valid() {
        return Ok(());
    }

    let y_off_fixed = int_to_fixed_saturating(y_off);
    let Some((t, b)) = sample_rows(
        bpp,
        image.height(),
        trap.top.saturating_add(y_off_fixed),
        trap.bottom.saturating_add(y_off_fixed),
    ) else {
        return Ok(());
    };

    let mut l = Edge::from_line(bpp, t, &trap.left, x_off, y_off);
    let mut r = Edge::from_line(bpp, t, &trap.right, x_off, y_off);
    rasterize_edges(image, &mut l, &mut r, t, b)
}

/// Add the coverage of every valid trapezoid in `traps` to an alpha image.
pub fn add_trapezoids(
    image: &mut Image,
    x_off: i16,
    y_off: i32,
    traps: &[Trapezoid],
) -> Result<(), Error> {
    add_trapezoids_at(image, x_off as i32, y_off, traps)
}

/// Add the coverage of `traps` to an alpha image.
pub fn add_traps(image: &mut Image, x_off: i16, y_off: i16, traps: &[Trap]) -> Result<(), Error> {
    let Some(bpp) = alpha_depth(image)? else {
        return Ok(());
    };
    let height = image.height();
    let (x_off, y_off) = (int_to_fixed(x_off as i32), int_to_fixed(y_off as i32));

    for trap in traps {
        let (top, bot) = (trap.top.y.saturating_add(y_off), trap.bot.y.saturating_add(y_off));
        let Some((t, b)) = sample_rows(bpp, height, top, bot) else {
            continue;
        };

        let x = |v: Fixed| v.saturating_add(x_off);
        let mut l = Edge::new(bpp, t, x(trap.top.l), top, x(trap.bot.l), bot);
        let mut r = Edge::new(bpp, t, x(trap.top.r), top, x(trap.bot.r), bot);
        rasterize_edges(image, &mut l, &mut r, t, b)?;
    }

    Ok(())
}

/// Add the coverage of `triangles` to an alpha image.
pub fn add_triangles(
    image: &mut Image,
    x_off: i32,
    y_off: i32,
    triangles: &[Triangle],
) -> Result<(), Error> {
    for triangle in triangles {
        for trap in triangle.to_trapezoids() {
            rasterize_trapezoid(image, &trap, x_off, y_off)?;
        }
    }

    Ok(())
}

/// Operators for which a transparent source leaves the destination unchanged, so only
/// the area covered by trapezoids has to be composited.
fn zero_src_has_no_effect(op: Operator) -> bool {
    matches!(
        op,
        Operator::Dst
            | Operator::Over
            | Operator::OverReverse
            | Operator::OutReverse
            | Operator::Atop
            | Operator::Xor
            | Operator::Add
            | Operator::Saturate
    )
}

impl Implementation {
    /// Composite `src` onto `dest` through the coverage of `traps`, rasterized into a
    /// temporary mask of `mask_format`. Trapezoid coordinates are shifted by
    /// `(x_dst, y_dst)` and the source is aligned so that `(x_src, y_src)` lands on
    /// `(x_dst, y_dst)`.
    ///
    /// Does nothing if `mask_format` is not an alpha format the rasterizer supports.
    #[allow(clippy::too_many_arguments)]
    pub fn composite_trapezoids(
        &self,
        op: Operator,
        src: &Image,
        dest: &mut Image,
        mask_format: Format,
        x_src: i32,
        y_src: i32,
        x_dst: i32,
        y_dst: i32,
        traps: &[Trapezoid],
    ) {
        if traps.is_empty() || dest.bits().is_none() {
            return;
        }

        let everywhere = Box32::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        if op == Operator::Add
            && src.is_opaque(everywhere)
            && dest.format() == Some(mask_format)
            && !dest.common.have_clip_region
        {
            // Coverage can be added straight into the destination.
            if let Err(e) = add_trapezoids_at(dest, x_dst, y_dst, traps) {
                debug!("trapezoids not rasterized: {e}");
            }
            return;
        }

        let extents = if zero_src_has_no_effect(op) {
            let b = traps
                .iter()
                .filter(|t| t.is_valid())
                .map(Trapezoid::extents)
                .reduce(|a, b| {
                    Box32::new(a.x1.min(b.x1), a.y1.min(b.y1), a.x2.max(b.x2), a.y2.max(b.y2))
                });
            match b {
                Some(b) if !b.is_empty() => b,
                _ => return,
            }
        } else {
            Box32::new(
                -x_dst,
                -y_dst,
                dest.width() - x_dst,
                dest.height() - y_dst,
            )
        };

        let (width, height) = (extents.x2 - extents.x1, extents.y2 - extents.y1);
        let mut mask = match Image::new_bits(mask_format, width, height) {
            Ok(mask) => mask,
            Err(e) => {
                debug!("no {width}x{height} trapezoid mask: {e}");
                return;
            }
        };

        if let Err(e) = add_trapezoids_at(&mut mask, -extents.x1, -extents.y1, traps) {
            debug!("trapezoids not rasterized: {e}");
            return;
        }

        self.composite(
            op,
            src,
            Some(&mask),
            dest,
            x_src + extents.x1,
            y_src + extents.y1,
            0,
            0,
            x_dst + extents.x1,
            y_dst + extents.y1,
            width,
            height,
        );
    }

    /// Like [`Self::composite_trapezoids`], for triangles.
    #[allow(clippy::too_many_arguments)]
    pub fn composite_triangles(
        &self,
        op: Operator,
        src: &Image,
        dest: &mut Image,
        mask_format: Format,
        x_src: i32,
        y_src: i32,
        x_dst: i32,
        y_dst: i32,
        triangles: &[Triangle],
    ) {
        let traps: Vec<Trapezoid> = triangles.iter().flat_map(Triangle::to_trapezoids).collect();
        self.composite_trapezoids(op, src, dest, mask_format, x_src, y_src, x_dst, y_dst, &traps);
    }
}

fn add_trapezoids_at(
    image: &mut Image,
    x_off: i32,
    y_off: i32,
    traps: &[Trapezoid],
) -> Result<(), Error> {
    for trap in traps {
        rasterize_trapezoid(image, trap, x_off, y_off)?;
    }

    Ok(())
}
