// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-point color algebra.
//!
//! Every channel is an unsigned normalized integer: 8 bits (`un8`) for the regular
//! pipeline and 16 bits (`un16`) for the wide one. Multiplication rounds to nearest
//! and is exact against `round(a * b / max)`.
//!
//! The `un8x4` helpers operate on a packed `0xAARRGGBB` word two channels at a time,
//! keeping each channel in its own 16-bit lane.

pub(crate) const A_SHIFT: u32 = 24;
pub(crate) const R_SHIFT: u32 = 16;
pub(crate) const G_SHIFT: u32 = 8;

const ONE_HALF: u32 = 0x80;
const RB_MASK: u32 = 0x00ff_00ff;
const RB_ONE_HALF: u32 = 0x0080_0080;
const RB_MASK_PLUS_ONE: u32 = 0x1000_0100;

/// `round(a * b / 255)` for `a, b` in `0..=255`.
#[inline(always)]
pub const fn mul_un8(a: u32, b: u32) -> u32 {
    let t = a * b + ONE_HALF;
    ((t >> 8) + t) >> 8
}

/// `round(a * 255 / b)`, the inverse of [`mul_un8`]. `b` must be non-zero.
#[inline(always)]
pub const fn div_un8(a: u32, b: u32) -> u32 {
    (a * 255 + b / 2) / b
}

/// Saturating addition of two 8-bit channels.
#[inline(always)]
pub const fn add_un8(a: u32, b: u32) -> u32 {
    let t = a + b;
    if t > 255 {
        255
    } else {
        t
    }
}

/// `round(a * b / 65535)` for `a, b` in `0..=65535`.
#[inline(always)]
pub const fn mul_un16(a: u64, b: u64) -> u64 {
    let t = a * b + 0x8000;
    ((t >> 16) + t) >> 16
}

/// `round(a * 65535 / b)`. `b` must be non-zero.
#[inline(always)]
pub const fn div_un16(a: u64, b: u64) -> u64 {
    (a * 0xffff + b / 2) / b
}

/// Saturating addition of two 16-bit channels.
#[inline(always)]
pub const fn add_un16(a: u64, b: u64) -> u64 {
    let t = a + b;
    if t > 0xffff {
        0xffff
    } else {
        t
    }
}

/// The alpha channel of a packed pixel.
#[inline(always)]
pub const fn alpha(x: u32) -> u32 {
    x >> A_SHIFT
}

#[inline(always)]
fn rb_mul_un8(x: u32, a: u32) -> u32 {
    let t = (x & RB_MASK) * a + RB_ONE_HALF;
    ((t + ((t >> 8) & RB_MASK)) >> 8) & RB_MASK
}

#[inline(always)]
fn rb_add(x: u32, y: u32) -> u32 {
    let t = x + y;
    (t | (RB_MASK_PLUS_ONE - ((t >> 8) & RB_MASK))) & RB_MASK
}

#[inline(always)]
fn rb_mul_rb(x: u32, a: u32) -> u32 {
    let mut t = (x & 0xff) * (a & 0xff);
    t |= (x & 0x00ff_0000) * ((a >> R_SHIFT) & 0xff);
    t += RB_ONE_HALF;
    ((t + ((t >> 8) & RB_MASK)) >> 8) & RB_MASK
}

/// Multiply every channel of `x` by the scalar `a`.
#[inline(always)]
pub fn un8x4_mul_un8(x: u32, a: u32) -> u32 {
    rb_mul_un8(x, a) | (rb_mul_un8(x >> 8, a) << 8)
}

/// Channel-wise saturating addition.
#[inline(always)]
pub fn un8x4_add_un8x4(x: u32, y: u32) -> u32 {
    rb_add(x & RB_MASK, y & RB_MASK) | (rb_add((x >> 8) & RB_MASK, (y >> 8) & RB_MASK) << 8)
}

/// Channel-wise multiplication.
#[inline(always)]
pub fn un8x4_mul_un8x4(x: u32, a: u32) -> u32 {
    rb_mul_rb(x, a) | (rb_mul_rb(x >> 8, a >> 8) << 8)
}

/// `x * a + y`, saturating.
#[inline(always)]
pub fn un8x4_mul_un8_add_un8x4(x: u32, a: u32, y: u32) -> u32 {
    un8x4_add_un8x4(un8x4_mul_un8(x, a), y)
}

/// `x * a + y * b`, saturating.
#[inline(always)]
pub fn un8x4_mul_un8_add_un8x4_mul_un8(x: u32, a: u32, y: u32, b: u32) -> u32 {
    un8x4_add_un8x4(un8x4_mul_un8(x, a), un8x4_mul_un8(y, b))
}

/// `x * a + y` with a per-channel `a`, saturating.
#[inline(always)]
pub fn un8x4_mul_un8x4_add_un8x4(x: u32, a: u32, y: u32) -> u32 {
    un8x4_add_un8x4(un8x4_mul_un8x4(x, a), y)
}

/// `x * a + y * b` with a per-channel `a` and a scalar `b`, saturating.
#[inline(always)]
pub fn un8x4_mul_un8x4_add_un8x4_mul_un8(x: u32, a: u32, y: u32, b: u32) -> u32 {
    un8x4_add_un8x4(un8x4_mul_un8x4(x, a), un8x4_mul_un8(y, b))
}

/// Porter-Duff `over` for premultiplied pixels: `src + dst * (1 - αs)`.
#[inline(always)]
pub fn over(src: u32, dst: u32) -> u32 {
    match alpha(src) {
        0xff => src,
        0 if src == 0 => dst,
        a => un8x4_mul_un8_add_un8x4(dst, 255 - a, src),
    }
}

/// `x * a` where `a` is the alpha of a mask pixel, as used by the unified-alpha combiners.
#[inline(always)]
pub fn in_un8(x: u32, a: u32) -> u32 {
    match a {
        0 => 0,
        0xff => x,
        a => un8x4_mul_un8(x, a),
    }
}

/// Channels of a wide pixel (`0xAAAA_RRRR_GGGG_BBBB`) as `[b, g, r, a]`.
#[inline(always)]
pub const fn un16x4_split(x: u64) -> [u64; 4] {
    [
        x & 0xffff,
        (x >> 16) & 0xffff,
        (x >> 32) & 0xffff,
        (x >> 48) & 0xffff,
    ]
}

/// Inverse of [`un16x4_split`].
#[inline(always)]
pub const fn un16x4_join(c: [u64; 4]) -> u64 {
    c[0] | (c[1] << 16) | (c[2] << 32) | (c[3] << 48)
}

/// Split a packed 8-bit pixel into `[b, g, r, a]`.
#[inline(always)]
pub const fn un8x4_split(x: u32) -> [u32; 4] {
    [x & 0xff, (x >> 8) & 0xff, (x >> 16) & 0xff, x >> 24]
}

/// Inverse of [`un8x4_split`].
#[inline(always)]
pub const fn un8x4_join(c: [u32; 4]) -> u32 {
    c[0] | (c[1] << 8) | (c[2] << 16) | (c[3] << 24)
}

/// Widen a packed 8-bit pixel to 16 bits per channel by bit replication.
#[inline(always)]
pub const fn expand_to_wide(x: u32) -> u64 {
    let c = un8x4_split(x);
    un16x4_join([
        c[0] as u64 * 0x101,
        c[1] as u64 * 0x101,
        c[2] as u64 * 0x101,
        c[3] as u64 * 0x101,
    ])
}

/// Narrow a wide pixel to 8 bits per channel by truncation.
#[inline(always)]
pub const fn contract_from_wide(x: u64) -> u32 {
    let c = un16x4_split(x);
    un8x4_join([
        (c[0] >> 8) as u32,
        (c[1] >> 8) as u32,
        (c[2] >> 8) as u32,
        (c[3] >> 8) as u32,
    ])
}
