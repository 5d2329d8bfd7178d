// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Antialiased edge rasterization into alpha images.
//!
//! Coverage is sampled on a grid of sub-pixel rows and columns whose size depends on
//! the depth of the alpha format: 15 rows by 17 columns for 8 bits, 3 by 5 for 4 bits
//! and a single sample at the pixel center for 1 bit. Rows are sampled at
//! `Y_FRAC_FIRST + k * STEP_Y_SMALL` within each pixel, so stepping from the last
//! sample of a pixel to the first sample of the next one is a "big" step.

use crate::error::Error;
use crate::format::ChannelOrder;
use crate::image::{BitsImage, Image};
use crate::transform::{
    fixed_floor, fixed_frac, fixed_to_int, int_to_fixed, int_to_fixed_saturating, Fixed, FIXED_1,
};
use crate::trap::LineFixed;

/// The sampling grid for one alpha depth.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Grid {
    pub(crate) n_y: i32,
    pub(crate) step_y_small: Fixed,
    pub(crate) step_y_big: Fixed,
    pub(crate) y_frac_first: Fixed,
    pub(crate) y_frac_last: Fixed,
    pub(crate) n_x: i32,
    pub(crate) step_x_small: Fixed,
    pub(crate) x_frac_first: Fixed,
}

impl Grid {
    pub(crate) const fn new(bits: u32) -> Self {
        let n_y = if bits == 1 { 1 } else { (1 << (bits / 2)) - 1 };
        let n_x = if bits == 1 { 1 } else { (1 << (bits / 2)) + 1 };
        let step_y_small = FIXED_1 / n_y;
        let step_y_big = FIXED_1 - (n_y - 1) * step_y_small;
        let y_frac_first = step_y_big / 2;
        let step_x_small = FIXED_1 / n_x;
        let step_x_big = FIXED_1 - (n_x - 1) * step_x_small;

        Self {
            n_y,
            step_y_small,
            step_y_big,
            y_frac_first,
            y_frac_last: y_frac_first + (n_y - 1) * step_y_small,
            n_x,
            step_x_small,
            x_frac_first: step_x_big / 2,
        }
    }

    /// The number of sample columns left of `x` within its pixel.
    #[inline]
    fn samples_x(&self, x: Fixed) -> i32 {
        if self.n_x == 1 {
            0
        } else {
            (fixed_frac(x) + self.x_frac_first) / self.step_x_small
        }
    }
}

/// The first sample row at or below `y`, for an alpha format of `bits` bits.
pub fn sample_ceil_y(y: Fixed, bits: u32) -> Fixed {
    let grid = Grid::new(bits);
    let mut i = fixed_floor(y);
    let mut f = (fixed_frac(y) - grid.y_frac_first + grid.step_y_small - 1)
        .div_euclid(grid.step_y_small)
        * grid.step_y_small
        + grid.y_frac_first;

    if f > grid.y_frac_last {
        if fixed_to_int(i) == i16::MAX as i32 {
            f = 0xffff;
        } else {
            f = grid.y_frac_first;
            i += FIXED_1;
        }
    }

    i | f
}

/// The last sample row at or above `y`, for an alpha format of `bits` bits.
pub fn sample_floor_y(y: Fixed, bits: u32) -> Fixed {
    let grid = Grid::new(bits);
    let mut i = fixed_floor(y);
    let mut f = (fixed_frac(y) - grid.y_frac_first).div_euclid(grid.step_y_small)
        * grid.step_y_small
        + grid.y_frac_first;

    if f < grid.y_frac_first {
        if fixed_to_int(i) == i16::MIN as i32 {
            f = 0;
        } else {
            f = grid.y_frac_last;
            i -= FIXED_1;
        }
    }

    i | f
}

/// A line being walked down one sample row at a time.
///
/// `x` advances by `stepx` per unit of `y` plus an error term that accumulates `dx`
/// and moves `x` by one more unit each time it crosses `dy`, so the walk never
/// drifts from the exact line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    x: Fixed,
    e: i64,
    stepx: Fixed,
    signdx: Fixed,
    dy: Fixed,
    dx: Fixed,
    stepx_small: Fixed,
    stepx_big: Fixed,
    dx_small: Fixed,
    dx_big: Fixed,
}

impl Edge {
    /// An edge from `(x_top, y_top)` to `(x_bot, y_bot)`, positioned at `y_start`, for
    /// an alpha format of `bits` bits.
    pub fn new(
        bits: u32,
        y_start: Fixed,
        x_top: Fixed,
        y_top: Fixed,
        x_bot: Fixed,
        y_bot: Fixed,
    ) -> Self {
        let dx = x_bot.saturating_sub(x_top);
        let dy = y_bot.saturating_sub(y_top);

        let mut edge = Self {
            x: x_top,
            e: 0,
            stepx: 0,
            signdx: 0,
            dy,
            dx: 0,
            stepx_small: 0,
            stepx_big: 0,
            dx_small: 0,
            dx_big: 0,
        };

        if dy != 0 {
            if dx >= 0 {
                edge.signdx = 1;
                edge.stepx = dx / dy;
                edge.dx = dx % dy;
                edge.e = -(dy as i64);
            } else {
                edge.signdx = -1;
                edge.stepx = -(-dx / dy);
                edge.dx = -dx % dy;
                edge.e = 0;
            }

            let grid = Grid::new(bits);
            (edge.stepx_small, edge.dx_small) = edge.multi_step(grid.step_y_small);
            (edge.stepx_big, edge.dx_big) = edge.multi_step(grid.step_y_big);
        }

        edge.step(y_start.saturating_sub(y_top));
        edge
    }

    /// An edge along `line` offset by whole pixels, positioned at `y`.
    pub fn from_line(bits: u32, y: Fixed, line: &LineFixed, x_off: i32, y_off: i32) -> Self {
        let (x_off, y_off) = (int_to_fixed_saturating(x_off), int_to_fixed_saturating(y_off));
        let (top, bot) = if line.p1.y <= line.p2.y {
            (line.p1, line.p2)
        } else {
            (line.p2, line.p1)
        };

        Self::new(
            bits,
            y,
            top.x.saturating_add(x_off),
            top.y.saturating_add(y_off),
            bot.x.saturating_add(x_off),
            bot.y.saturating_add(y_off),
        )
    }

    /// The current x position.
    pub fn x(&self) -> Fixed {
        self.x
    }

    /// Advance by `n` units of y, which may be negative.
    pub fn step(&mut self, n: Fixed) {
        if self.dy == 0 {
            return;
        }

        let dy = self.dy as i64;
        self.x = self.x.wrapping_add(n.wrapping_mul(self.stepx));
        let mut ne = self.e + n as i64 * self.dx as i64;

        if n >= 0 {
            if ne > 0 {
                let nx = (ne + dy - 1) / dy;
                ne -= nx * dy;
                self.x = self.x.wrapping_add(nx as Fixed * self.signdx);
            }
        } else if ne <= -dy {
            let nx = -ne / dy;
            ne += nx * dy;
            self.x = self.x.wrapping_sub(nx as Fixed * self.signdx);
        }

        self.e = ne;
    }

    /// The whole and fractional x advance for `n` units of y.
    fn multi_step(&self, n: Fixed) -> (Fixed, Fixed) {
        let mut ne = n as i64 * self.dx as i64;
        let mut stepx = n.wrapping_mul(self.stepx);

        if ne > 0 {
            let nx = ne / self.dy as i64;
            ne -= nx * self.dy as i64;
            stepx = stepx.wrapping_add(nx as Fixed * self.signdx);
        }

        (stepx, ne as Fixed)
    }

    #[inline]
    fn advance(&mut self, stepx: Fixed, dx: Fixed) {
        self.x = self.x.wrapping_add(stepx);
        self.e += dx as i64;

        if self.e > 0 {
            self.e -= self.dy as i64;
            self.x = self.x.wrapping_add(self.signdx);
        }
    }

    #[inline]
    fn step_small(&mut self) {
        self.advance(self.stepx_small, self.dx_small);
    }

    #[inline]
    fn step_big(&mut self) {
        self.advance(self.stepx_big, self.dx_big);
    }
}

/// Add the coverage between `l` and `r` from sample row `t` down to sample row `b`
/// (both inclusive) to an alpha image.
///
/// `t` moves down to the next sample row and `b` up to the previous one, with the
/// edges stepped to match.
///
/// Coverage saturates at full alpha. Sample rows outside the image are skipped.
/// Returns an error for bits images that are not 1-, 4- or 8-bit alpha bitmaps.
pub fn rasterize_edges(
    image: &mut Image,
    l: &mut Edge,
    r: &mut Edge,
    mut t: Fixed,
    mut b: Fixed,
) -> Result<(), Error> {
    let Some(bpp) = alpha_depth(image)? else {
        return Ok(());
    };
    let Some(image) = image.bits_mut() else {
        return Ok(());
    };

    let top = sample_ceil_y(t.max(0), bpp);
    if top != t {
        l.step(top.saturating_sub(t));
        r.step(top.saturating_sub(t));
        t = top;
    }
    b = sample_floor_y(b.min(int_to_fixed(image.height) - 1), bpp);
    if t > b {
        return Ok(());
    }

    match bpp {
        1 => rasterize_1(image, l, r, t, b),
        4 => rasterize_4(image, l, r, t, b),
        _ => rasterize_8(image, l, r, t, b),
    }

    Ok(())
}

/// The depth of an alpha-only image, or `None` for images without pixel storage.
pub(crate) fn alpha_depth(image: &Image) -> Result<Option<u32>, Error> {
    match image.format() {
        Some(format) if format.order() == ChannelOrder::A && matches!(format.bpp(), 1 | 4 | 8) => {
            Ok(Some(format.bpp()))
        }
        Some(format) => Err(Error::UnsupportedFormat(format)),
        None => Ok(None),
    }
}

/// Clip the span of one sample row to the image width. Full coverage of the last pixel
/// is expressed as one unit short of its right edge.
#[inline]
fn clip_span(l: &Edge, r: &Edge, width: i32) -> (Fixed, Fixed) {
    let lx = l.x.max(0);
    let mut rx = r.x;

    if fixed_to_int(rx) >= width {
        rx = int_to_fixed(width) - 1;
    }

    (lx, rx)
}

/// Step both edges to the next sample row. Returns whether that row is in the next
/// pixel row.
#[inline]
fn next_row(grid: &Grid, l: &mut Edge, r: &mut Edge, y: &mut Fixed) -> bool {
    if grid.n_y > 1 && fixed_frac(*y) != grid.y_frac_last {
        l.step_small();
        r.step_small();
        *y += grid.step_y_small;
        false
    } else {
        l.step_big();
        r.step_big();
        *y += grid.step_y_big;
        true
    }
}

fn rasterize_1(image: &mut BitsImage, l: &mut Edge, r: &mut Edge, t: Fixed, b: Fixed) {
    let grid = Grid::new(1);
    let width = image.width;
    let mut y = t;
    let mut row = fixed_to_int(y);

    loop {
        // Sample just left of the pixel center, so that samples exactly on an edge
        // round towards the top left.
        let lx = l.x.saturating_add(grid.x_frac_first - 1).max(0);
        let mut rx = r.x.saturating_add(grid.x_frac_first - 1);
        if fixed_to_int(rx) >= width {
            rx = int_to_fixed(width);
        }

        if rx > lx {
            let (lxi, rxi) = (fixed_to_int(lx) as usize, fixed_to_int(rx) as usize);
            set_bits(image.row_as_mut::<u8>(row), lxi, rxi);
        }

        if y >= b {
            break;
        }
        if next_row(&grid, l, r, &mut y) {
            row += 1;
        }
    }
}

/// Set pixels `from..to` of a 1-bit row.
fn set_bits(row: &mut [u8], from: usize, to: usize) {
    if from >= to {
        return;
    }

    let (first, last) = (from / 8, (to - 1) / 8);
    let head = 0xff_u8 << (from % 8);
    let tail = 0xff_u8 >> (7 - (to - 1) % 8);

    if first == last {
        row[first] |= head & tail;
    } else {
        row[first] |= head;
        row[first + 1..last].fill(0xff);
        row[last] |= tail;
    }
}

fn rasterize_4(image: &mut BitsImage, l: &mut Edge, r: &mut Edge, t: Fixed, b: Fixed) {
    let grid = Grid::new(4);
    let width = image.width;
    let mut y = t;
    let mut row = fixed_to_int(y);

    loop {
        let (lx, rx) = clip_span(l, r, width);

        if rx > lx {
            let (lxi, rxi) = (fixed_to_int(lx) as usize, fixed_to_int(rx) as usize);
            let (lxs, rxs) = (grid.samples_x(lx), grid.samples_x(rx));
            let line = image.row_as_mut::<u8>(row);

            if lxi == rxi {
                add_4(line, lxi, rxs - lxs);
            } else {
                add_4(line, lxi, grid.n_x - lxs);
                for x in lxi + 1..rxi {
                    add_4(line, x, grid.n_x);
                }
                add_4(line, rxi, rxs);
            }
        }

        if y >= b {
            break;
        }
        if next_row(&grid, l, r, &mut y) {
            row += 1;
        }
    }
}

/// Add `a` to the 4-bit pixel `x`, saturating.
#[inline]
fn add_4(line: &mut [u8], x: usize, a: i32) {
    let shift = (x % 2) * 4;
    let byte = &mut line[x / 2];
    let v = ((*byte >> shift) & 0xf) as i32 + a;
    let v = v.min(0xf) as u8;
    *byte = (*byte & !(0xf << shift)) | (v << shift);
}

/// Saturating add of `a` to every byte of `span`.
#[inline]
fn add_saturate_8(span: &mut [u8], a: i32) {
    let a = a.min(0xff) as u8;
    for v in span {
        *v = v.saturating_add(a);
    }
}

/// Contiguous full-coverage pixels shared by consecutive sample rows of one pixel row,
/// whose coverage is added once the run ends instead of once per sample row.
#[derive(Default)]
struct FillRun {
    start: usize,
    end: usize,
    rows: i32,
    active: bool,
}

impl FillRun {
    /// Add the pending coverage to `line` and forget the run.
    fn flush(&mut self, line: &mut [u8], grid: &Grid) {
        if self.active && self.start != self.end {
            if self.rows == grid.n_y {
                line[self.start..self.end].fill(0xff);
            } else {
                add_saturate_8(&mut line[self.start..self.end], self.rows * grid.n_x);
            }
        }

        *self = Self::default();
    }

    /// Record that one sample row fully covers `lxi..rxi`.
    fn add(&mut self, line: &mut [u8], grid: &Grid, lxi: usize, rxi: usize) {
        let full = grid.n_x;
        let pending = self.rows * full;

        if !self.active {
            *self = Self {
                start: lxi,
                end: rxi,
                rows: 1,
                active: true,
            };
        } else if lxi >= self.end || rxi < self.start {
            add_saturate_8(&mut line[self.start..self.end], pending);
            *self = Self {
                start: lxi,
                end: rxi,
                rows: 1,
                active: true,
            };
        } else {
            if lxi > self.start {
                add_saturate_8(&mut line[self.start..lxi], pending);
                self.start = lxi;
            } else if lxi < self.start {
                add_saturate_8(&mut line[lxi..self.start], full);
            }

            if rxi < self.end {
                add_saturate_8(&mut line[rxi..self.end], pending);
                self.end = rxi;
            } else if self.end < rxi {
                add_saturate_8(&mut line[self.end..rxi], full);
            }

            self.rows += 1;
        }
    }
}

fn rasterize_8(image: &mut BitsImage, l: &mut Edge, r: &mut Edge, t: Fixed, b: Fixed) {
    let grid = Grid::new(8);
    let width = image.width;
    let mut y = t;
    let mut row = fixed_to_int(y);
    let mut run = FillRun::default();

    loop {
        let line = image.row_as_mut::<u8>(row);
        let (lx, rx) = clip_span(l, r, width);

        if rx > lx {
            let (lxi, rxi) = (fixed_to_int(lx) as usize, fixed_to_int(rx) as usize);
            let (lxs, rxs) = (grid.samples_x(lx), grid.samples_x(rx));

            if lxi == rxi {
                add_saturate_8(&mut line[lxi..lxi + 1], rxs - lxs);
            } else {
                add_saturate_8(&mut line[lxi..lxi + 1], grid.n_x - lxs);

                let lxi = lxi + 1;
                // Short spans are not worth tracking.
                if rxi - lxi > 4 {
                    run.add(line, &grid, lxi, rxi);
                } else {
                    add_saturate_8(&mut line[lxi..rxi], grid.n_x);
                }

                add_saturate_8(&mut line[rxi..rxi + 1], rxs);
            }
        }

        if y >= b {
            run.flush(line, &grid);
            break;
        }

        if next_row(&grid, l, r, &mut y) {
            run.flush(line, &grid);
            row += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn grid_constants() {
        let g8 = Grid::new(8);
        assert_eq!((g8.n_y, g8.step_y_small, g8.step_y_big), (15, 4369, 4370));
        assert_eq!((g8.y_frac_first, g8.y_frac_last), (2185, 63351));
        assert_eq!((g8.n_x, g8.step_x_small, g8.x_frac_first), (17, 3855, 1928));

        let g4 = Grid::new(4);
        assert_eq!((g4.n_y, g4.step_y_small, g4.step_y_big), (3, 21845, 21846));
        assert_eq!((g4.y_frac_first, g4.y_frac_last), (10923, 54613));
        assert_eq!((g4.n_x, g4.step_x_small, g4.x_frac_first), (5, 13107, 6554));

        let g1 = Grid::new(1);
        assert_eq!((g1.y_frac_first, g1.y_frac_last), (32768, 32768));
    }

    #[test]
    fn sample_rounding() {
        assert_eq!(sample_ceil_y(0, 8), 2185);
        assert_eq!(sample_ceil_y(2185, 8), 2185);
        assert_eq!(sample_ceil_y(2186, 8), 2185 + 4369);
        assert_eq!(sample_ceil_y(63352, 8), FIXED_1 + 2185);
        assert_eq!(sample_floor_y(FIXED_1, 8), 63351);
        assert_eq!(sample_floor_y(FIXED_1 + 2185, 8), FIXED_1 + 2185);
        assert_eq!(sample_ceil_y(int_to_fixed(3), 1), int_to_fixed(3) + 32768);
        assert_eq!(sample_floor_y(int_to_fixed(3), 1), int_to_fixed(2) + 32768);
    }

    #[test]
    fn steep_edges_do_not_drift() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let x_top = rng.gen_range(-int_to_fixed(100)..int_to_fixed(100));
            let x_bot = rng.gen_range(-int_to_fixed(100)..int_to_fixed(100));
            let y_top = rng.gen_range(0..FIXED_1);
            let y_bot = y_top + rng.gen_range(int_to_fixed(1000)..int_to_fixed(4000));
            let (dx, dy) = ((x_bot - x_top) as i64, (y_bot - y_top) as i64);

            let mut edge = Edge::new(8, y_top, x_top, y_top, x_bot, y_bot);
            let mut y = y_top;
            let mut steps = 0;

            while y < y_bot {
                let k = (y - y_top) as i64;
                let offset = (edge.x() - x_top) as i64 * dy;
                assert!(offset <= k * dx && offset >= k * dx - dy, "k = {k}");

                if steps % 2 == 0 {
                    edge.step_small();
                    y += Grid::new(8).step_y_small;
                } else {
                    edge.step_big();
                    y += Grid::new(8).step_y_big;
                }
                steps += 1;
            }
        }
    }

    #[test]
    fn stepping_back_undoes_stepping_forward() {
        let mut edge = Edge::new(8, 0, 0, 0, -int_to_fixed(7), int_to_fixed(3));
        let start = edge;
        edge.step(12345);
        edge.step(-12345);
        assert_eq!(edge, start);
    }

    #[test]
    fn full_pixel_rectangle_is_opaque() {
        for (format, full) in [(Format::A8, 0xff), (Format::A4, 0xf), (Format::A1, 1)] {
            let bpp = format.bpp();
            let mut image = Image::new_bits(format, 8, 4).unwrap();
            let t = sample_ceil_y(int_to_fixed(1), bpp);
            let b = sample_floor_y(int_to_fixed(3) - 1, bpp);
            let mut l = Edge::new(bpp, t, int_to_fixed(2), 0, int_to_fixed(2), int_to_fixed(4));
            let mut r = Edge::new(bpp, t, int_to_fixed(6), 0, int_to_fixed(6), int_to_fixed(4));

            rasterize_edges(&mut image, &mut l, &mut r, t, b).unwrap();

            let bits = image.bits().unwrap();
            for y in 0..4 {
                for x in 0..8 {
                    let inside = (1..3).contains(&y) && (2..6).contains(&x);
                    let expected = if inside { full } else { 0 };
                    assert_eq!(bits.read_raw(x, y, None), expected, "{format:?} ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn off_grid_rows_snap_to_samples() {
        for format in [Format::A8, Format::A4, Format::A1] {
            let bpp = format.bpp();
            let rasterize = |t, b| {
                let mut image = Image::new_bits(format, 8, 3).unwrap();
                let mut l = Edge::new(bpp, t, int_to_fixed(1), 0, int_to_fixed(1), int_to_fixed(3));
                let mut r = Edge::new(bpp, t, int_to_fixed(7), 0, int_to_fixed(5), int_to_fixed(3));
                rasterize_edges(&mut image, &mut l, &mut r, t, b).unwrap();
                image
            };

            // Bottoms between samples of the last row, and past the image.
            for b in [int_to_fixed(3) - 1, int_to_fixed(2) + 100, int_to_fixed(9) + 7] {
                let t = 1 + FIXED_1 / 3;
                let snapped = rasterize(
                    sample_ceil_y(t, bpp),
                    sample_floor_y(b.min(int_to_fixed(3) - 1), bpp),
                );
                let image = rasterize(t, b);

                assert_eq!(image.data(), snapped.data(), "{format:?} b = {b:#x}");
            }
        }
    }

    #[test]
    fn rejects_color_formats() {
        let mut image = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        let mut l = Edge::new(8, 0, 0, 0, 0, FIXED_1);
        let mut r = l;
        assert_eq!(
            rasterize_edges(&mut image, &mut l, &mut r, 0, 0),
            Err(Error::UnsupportedFormat(Format::A8R8G8B8))
        );
    }

    /// Accumulate every sample row independently, without the fill-run bookkeeping.
    fn naive_8(image: &mut BitsImage, l: &mut Edge, r: &mut Edge, t: Fixed, b: Fixed) {
        let grid = Grid::new(8);
        let width = image.width;
        let mut y = t;
        let mut row = fixed_to_int(y);

        loop {
            let line = image.row_as_mut::<u8>(row);
            let (lx, rx) = clip_span(l, r, width);

            if rx > lx {
                let (lxi, rxi) = (fixed_to_int(lx) as usize, fixed_to_int(rx) as usize);
                let (lxs, rxs) = (grid.samples_x(lx), grid.samples_x(rx));

                if lxi == rxi {
                    add_saturate_8(&mut line[lxi..lxi + 1], rxs - lxs);
                } else {
                    add_saturate_8(&mut line[lxi..lxi + 1], grid.n_x - lxs);
                    add_saturate_8(&mut line[lxi + 1..rxi], grid.n_x);
                    add_saturate_8(&mut line[rxi..rxi + 1], rxs);
                }
            }

            if y >= b {
                break;
            }
            if next_row(&grid, l, r, &mut y) {
                row += 1;
            }
        }
    }

    #[test]
    fn fill_runs_match_naive_accumulation() {
        let mut rng = StdRng::seed_from_u64(11);
        let (width, height) = (40, 24);

        for _ in 0..200 {
            let mut point = || {
                (
                    rng.gen_range(-int_to_fixed(8)..int_to_fixed(width + 8)),
                    rng.gen_range(-int_to_fixed(4)..int_to_fixed(height + 4)),
                )
            };
            let (a, b) = (point(), point());
            let (c, d) = (point(), point());
            let top = a.1.min(b.1).max(c.1.min(d.1)).max(0);
            let bottom = a.1.max(b.1).min(c.1.max(d.1)).min(int_to_fixed(height) - 1);
            if (a.1 - b.1).abs() < FIXED_1 || (c.1 - d.1).abs() < FIXED_1 {
                continue;
            }

            let t = sample_ceil_y(top, 8);
            let bot = sample_floor_y(bottom, 8);
            if bot < t {
                continue;
            }

            let line = |p: (Fixed, Fixed), q: (Fixed, Fixed)| LineFixed {
                p1: crate::transform::PointFixed::new(p.0, p.1),
                p2: crate::transform::PointFixed::new(q.0, q.1),
            };
            let (left, right) = (line(a, b), line(c, d));

            let mut fast = BitsImage::new(Format::A8, width, height).unwrap();
            // Start from partially covered pixels so saturation is exercised.
            for v in fast.bits.iter_mut() {
                *v = rng.gen::<u32>() & 0x7f7f_7f7f;
            }
            let mut naive = fast.clone();

            let mut l = Edge::from_line(8, t, &left, 0, 0);
            let mut r = Edge::from_line(8, t, &right, 0, 0);
            rasterize_8(&mut fast, &mut l, &mut r, t, bot);

            let mut l = Edge::from_line(8, t, &left, 0, 0);
            let mut r = Edge::from_line(8, t, &right, 0, 0);
            naive_8(&mut naive, &mut l, &mut r, t, bot);

            assert_eq!(fast.bits, naive.bits);
        }
    }
}
