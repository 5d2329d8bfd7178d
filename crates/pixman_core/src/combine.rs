// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scanline combiners.
//!
//! A combiner merges a scanline of source pixels, an optional scanline of mask pixels
//! and a scanline of destination pixels into the destination, following one operator.
//! Unified-alpha combiners only use the alpha of the mask, component-alpha combiners
//! use each mask channel as the coverage of the matching color channel.
//!
//! The same generic code is instantiated for 8-bit (`u32`) and 16-bit (`u64`) pixels.

use crate::math::{self, alpha, mul_un16, un16x4_join, un16x4_split, un8x4_join, un8x4_split};
use crate::operator::Operator;

/// Combine `src` (masked by `mask`) into `dest`. All slices have the same length.
pub(crate) type CombineFn<P> = fn(dest: &mut [P], src: &[P], mask: Option<&[P]>);

/// A premultiplied pixel with four channels of equal width.
pub(crate) trait Pixel: Copy + Default + Eq + std::ops::Not<Output = Self> + 'static {
    /// The maximum value of one channel.
    const MAX: u64;
    /// Every bit set.
    const ALL: Self;
    const ZERO: Self;

    /// Unified-alpha combiners, indexed by [`Operator::index`].
    const COMBINE: [CombineFn<Self>; Operator::COUNT];
    /// Component-alpha combiners, indexed by [`Operator::index`].
    const COMBINE_CA: [CombineFn<Self>; Operator::COUNT];

    fn alpha(self) -> u64;
    /// Every channel multiplied by `a`.
    fn mul(self, a: u64) -> Self;
    /// Channel-wise multiplication.
    fn mul_x4(self, a: Self) -> Self;
    /// Channel-wise saturating addition.
    fn add(self, other: Self) -> Self;
    /// The alpha replicated into all channels.
    fn splat_alpha(self) -> Self;
    fn split(self) -> [u64; 4];
    fn join(c: [u64; 4]) -> Self;
    fn mul_channel(a: u64, b: u64) -> u64;
    fn div_channel(a: u64, b: u64) -> u64;

    /// Every channel inverted.
    #[inline(always)]
    fn inv(self) -> Self {
        !self
    }
}

impl Pixel for u32 {
    const MAX: u64 = 0xff;
    const ALL: Self = u32::MAX;
    const ZERO: Self = 0;
    const COMBINE: [CombineFn<Self>; Operator::COUNT] = unified_table();
    const COMBINE_CA: [CombineFn<Self>; Operator::COUNT] = component_table();

    #[inline(always)]
    fn alpha(self) -> u64 {
        alpha(self) as u64
    }

    #[inline(always)]
    fn mul(self, a: u64) -> Self {
        math::un8x4_mul_un8(self, a as u32)
    }

    #[inline(always)]
    fn mul_x4(self, a: Self) -> Self {
        math::un8x4_mul_un8x4(self, a)
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        math::un8x4_add_un8x4(self, other)
    }

    #[inline(always)]
    fn splat_alpha(self) -> Self {
        (self >> 24) * 0x0101_0101
    }

    #[inline(always)]
    fn split(self) -> [u64; 4] {
        un8x4_split(self).map(|c| c as u64)
    }

    #[inline(always)]
    fn join(c: [u64; 4]) -> Self {
        un8x4_join(c.map(|c| c as u32))
    }

    #[inline(always)]
    fn mul_channel(a: u64, b: u64) -> u64 {
        math::mul_un8(a as u32, b as u32) as u64
    }

    #[inline(always)]
    fn div_channel(a: u64, b: u64) -> u64 {
        math::div_un8(a as u32, b as u32) as u64
    }
}

impl Pixel for u64 {
    const MAX: u64 = 0xffff;
    const ALL: Self = u64::MAX;
    const ZERO: Self = 0;
    const COMBINE: [CombineFn<Self>; Operator::COUNT] = unified_table();
    const COMBINE_CA: [CombineFn<Self>; Operator::COUNT] = component_table();

    #[inline(always)]
    fn alpha(self) -> u64 {
        self >> 48
    }

    #[inline(always)]
    fn mul(self, a: u64) -> Self {
        un16x4_join(un16x4_split(self).map(|c| mul_un16(c, a)))
    }

    #[inline(always)]
    fn mul_x4(self, a: Self) -> Self {
        let (x, a) = (un16x4_split(self), un16x4_split(a));
        un16x4_join([0, 1, 2, 3].map(|i| mul_un16(x[i], a[i])))
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        let (x, y) = (un16x4_split(self), un16x4_split(other));
        un16x4_join([0, 1, 2, 3].map(|i| math::add_un16(x[i], y[i])))
    }

    #[inline(always)]
    fn splat_alpha(self) -> Self {
        (self >> 48) * 0x0001_0001_0001_0001
    }

    #[inline(always)]
    fn split(self) -> [u64; 4] {
        un16x4_split(self)
    }

    #[inline(always)]
    fn join(c: [u64; 4]) -> Self {
        un16x4_join(c)
    }

    #[inline(always)]
    fn mul_channel(a: u64, b: u64) -> u64 {
        mul_un16(a, b)
    }

    #[inline(always)]
    fn div_channel(a: u64, b: u64) -> u64 {
        math::div_un16(a, b)
    }
}

const fn unified_table<P: Pixel>() -> [CombineFn<P>; Operator::COUNT] {
    [
        clear::<P>,
        src_u::<P>,
        dst::<P>,
        over_u::<P>,
        over_reverse_u::<P>,
        in_u::<P>,
        in_reverse_u::<P>,
        out_u::<P>,
        out_reverse_u::<P>,
        atop_u::<P>,
        atop_reverse_u::<P>,
        xor_u::<P>,
        add_u::<P>,
        saturate_u::<P>,
    ]
}

const fn component_table<P: Pixel>() -> [CombineFn<P>; Operator::COUNT] {
    [
        clear::<P>,
        src_ca::<P>,
        dst::<P>,
        over_ca::<P>,
        over_reverse_ca::<P>,
        in_ca::<P>,
        in_reverse_ca::<P>,
        out_ca::<P>,
        out_reverse_ca::<P>,
        atop_ca::<P>,
        atop_reverse_ca::<P>,
        xor_ca::<P>,
        add_ca::<P>,
        saturate_ca::<P>,
    ]
}

/// Look up the combiner for an operator.
pub(crate) fn combiner<P: Pixel>(op: Operator, component_alpha: bool) -> CombineFn<P> {
    if component_alpha {
        P::COMBINE_CA[op.index()]
    } else {
        P::COMBINE[op.index()]
    }
}

/// The source multiplied by the alpha of the mask.
#[inline(always)]
fn masked<P: Pixel>(src: &[P], mask: Option<&[P]>, i: usize) -> P {
    let s = src[i];

    match mask {
        None => s,
        Some(mask) => match mask[i].alpha() {
            0 => P::ZERO,
            a if a == P::MAX => s,
            a => s.mul(a),
        },
    }
}

/// Apply `f(s, d)` to every pixel, where `s` is the masked source.
#[inline(always)]
fn for_each_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>, f: impl Fn(P, P) -> P) {
    for i in 0..dest.len() {
        let s = masked(src, mask, i);
        dest[i] = f(s, dest[i]);
    }
}

fn clear<P: Pixel>(dest: &mut [P], _: &[P], _: Option<&[P]>) {
    dest.fill(P::ZERO);
}

fn dst<P: Pixel>(_: &mut [P], _: &[P], _: Option<&[P]>) {}

fn src_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    match mask {
        None => dest.copy_from_slice(src),
        Some(_) => for_each_u(dest, src, mask, |s, _| s),
    }
}

fn over_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| d.mul(P::MAX - s.alpha()).add(s));
}

fn over_reverse_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| s.mul(P::MAX - d.alpha()).add(d));
}

fn in_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| s.mul(d.alpha()));
}

fn in_reverse_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| d.mul(s.alpha()));
}

fn out_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| s.mul(P::MAX - d.alpha()));
}

fn out_reverse_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| d.mul(P::MAX - s.alpha()));
}

fn atop_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| {
        s.mul(d.alpha()).add(d.mul(P::MAX - s.alpha()))
    });
}

fn atop_reverse_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| {
        s.mul(P::MAX - d.alpha()).add(d.mul(s.alpha()))
    });
}

fn xor_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| {
        s.mul(P::MAX - d.alpha()).add(d.mul(P::MAX - s.alpha()))
    });
}

fn add_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| d.add(s));
}

fn saturate_u<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_u(dest, src, mask, |s, d| {
        let sa = s.alpha();
        let da = P::MAX - d.alpha();

        let s = if sa > da {
            s.mul(P::div_channel(da, sa))
        } else {
            s
        };

        d.add(s)
    });
}

/// Multiply the source by the mask and the mask by the source alpha.
#[inline(always)]
fn mask_ca<P: Pixel>(s: P, m: P) -> (P, P) {
    if m == P::ZERO {
        return (P::ZERO, P::ZERO);
    }
    if m == P::ALL {
        return (s, s.splat_alpha());
    }

    (s.mul_x4(m), m.mul(s.alpha()))
}

/// The source multiplied by the mask.
#[inline(always)]
fn mask_value_ca<P: Pixel>(s: P, m: P) -> P {
    if m == P::ZERO {
        P::ZERO
    } else if m == P::ALL {
        s
    } else {
        s.mul_x4(m)
    }
}

/// The mask multiplied by the source alpha.
#[inline(always)]
fn mask_alpha_ca<P: Pixel>(s: P, m: P) -> P {
    if m == P::ZERO {
        return P::ZERO;
    }

    let a = s.alpha();
    if a == P::MAX {
        m
    } else if m == P::ALL {
        s.splat_alpha()
    } else {
        m.mul(a)
    }
}

/// Apply `f(s, m, d)` to every pixel. Component-alpha combiners are only used with a mask.
#[inline(always)]
fn for_each_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>, f: impl Fn(P, P, P) -> P) {
    match mask {
        Some(mask) => {
            for i in 0..dest.len() {
                dest[i] = f(src[i], mask[i], dest[i]);
            }
        }
        None => {
            for i in 0..dest.len() {
                dest[i] = f(src[i], P::ALL, dest[i]);
            }
        }
    }
}

fn src_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, _| mask_value_ca(s, m));
}

/// `d * ~m' + s'`.
#[inline(always)]
pub(crate) fn over_ca_pixel<P: Pixel>(s: P, m: P, d: P) -> P {
    let (s, m) = mask_ca(s, m);
    let a = m.inv();

    if a == P::ZERO {
        s
    } else {
        d.mul_x4(a).add(s)
    }
}

fn over_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, over_ca_pixel);
}

fn over_reverse_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| {
        let a = P::MAX - d.alpha();

        if a == 0 {
            d
        } else {
            mask_value_ca(s, m).mul(a).add(d)
        }
    });
}

fn in_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| match d.alpha() {
        0 => P::ZERO,
        a if a == P::MAX => mask_value_ca(s, m),
        a => mask_value_ca(s, m).mul(a),
    });
}

fn in_reverse_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| {
        let m = mask_alpha_ca(s, m);

        if m == P::ALL {
            d
        } else if m == P::ZERO {
            P::ZERO
        } else {
            d.mul_x4(m)
        }
    });
}

fn out_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| match P::MAX - d.alpha() {
        0 => P::ZERO,
        a if a == P::MAX => mask_value_ca(s, m),
        a => mask_value_ca(s, m).mul(a),
    });
}

fn out_reverse_ca<P: Pixel>(
    dest: &mut [P],
    src: &[P],
    mask: Option<&[P]>,
) {
    for_each_ca(dest, src, mask, |s, m, d| {
        let a = mask_alpha_ca(s, m).inv();

        if a == P::ALL {
            d
        } else if a == P::ZERO {
            P::ZERO
        } else {
            d.mul_x4(a)
        }
    });
}

fn atop_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| {
        let (s, m) = mask_ca(s, m);
        d.mul_x4(m.inv()).add(s.mul(d.alpha()))
    });
}

fn atop_reverse_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| {
        let (s, m) = mask_ca(s, m);
        d.mul_x4(m).add(s.mul(P::MAX - d.alpha()))
    });
}

fn xor_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| {
        let (s, m) = mask_ca(s, m);
        d.mul_x4(m.inv()).add(s.mul(P::MAX - d.alpha()))
    });
}

fn add_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| mask_value_ca(s, m).add(d));
}

fn saturate_ca<P: Pixel>(dest: &mut [P], src: &[P], mask: Option<&[P]>) {
    for_each_ca(dest, src, mask, |s, m, d| {
        let (s, m) = mask_ca(s, m);
        let da = P::MAX - d.alpha();
        let (s, m, d) = (s.split(), m.split(), d.split());

        P::join([0, 1, 2, 3].map(|i| {
            let f = if m[i] <= da {
                P::MAX
            } else {
                P::div_channel(da, m[i])
            };

            (P::mul_channel(s[i], f) + d[i]).min(P::MAX)
        }))
    });
}
