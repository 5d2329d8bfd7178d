// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Seeded random inputs for benchmarks and property tests.

use pixman_core::transform::{int_to_fixed, FIXED_1};
use pixman_core::{Color, Format, Image, LineFixed, PointFixed, Trapezoid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: [u8; 32] = [0; 32];

/// A fresh generator with the fixed seed every run starts from.
pub fn rng() -> StdRng {
    StdRng::from_seed(SEED)
}

#[derive(Copy, Clone, Debug)]
pub struct Params {
    pub width: i32,
    pub height: i32,
    pub size: i32,
}

/// A premultiplied `0xAARRGGBB` color with the given alpha.
pub fn gen_premultiplied(rng: &mut impl Rng, alpha: u8) -> u32 {
    let mut channel = || rng.gen_range(0..=alpha as u32);
    let (r, g, b) = (channel(), channel(), channel());

    (alpha as u32) << 24 | r << 16 | g << 8 | b
}

/// A solid color image.
pub fn gen_solid(rng: &mut impl Rng) -> Image {
    let alpha = match rng.gen_range(0..3) {
        0 => 0xff,
        _ => rng.gen(),
    };

    Image::solid(Color::from_argb32(gen_premultiplied(rng, alpha)))
}

/// A bits image filled with random raw pixels.
///
/// Pixels of 32-bit formats with alpha are premultiplied, and a quarter of them are
/// either fully transparent or fully opaque so both shortcuts of the kernels are hit.
pub fn gen_image(rng: &mut impl Rng, format: Format, width: i32, height: i32) -> Image {
    let stride_words = (width as usize * format.bpp() as usize).div_ceil(32);
    let bits: Vec<u32> = (0..stride_words * height as usize)
        .map(|_| {
            if format.bpp() == 32 && format.has_alpha() && format.alpha_bits() == 8 {
                let alpha = match rng.gen_range(0..8) {
                    0 => 0,
                    1 => 0xff,
                    _ => rng.gen(),
                };
                let argb = gen_premultiplied(rng, alpha);
                match format {
                    Format::A8B8G8R8 => pixman_core::format::swap_rb(argb),
                    Format::B8G8R8A8 => argb.swap_bytes(),
                    _ => argb,
                }
            } else {
                rng.gen()
            }
        })
        .collect();

    match Image::from_bits(format, width, height, bits, stride_words * 4) {
        Ok(image) => image,
        Err(e) => panic!("cannot generate a {width}x{height} {format:?} image: {e}"),
    }
}

/// Random squares of `size` pixels inside the canvas, as `(x, y)` origins.
pub struct RectIterator {
    params: Params,
    rng: StdRng,
}

impl RectIterator {
    pub fn new(params: Params) -> Self {
        Self { params, rng: rng() }
    }
}

impl Iterator for RectIterator {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        let size = self.params.size;
        let x = self.rng.gen_range(0..=(self.params.width - size));
        let y = self.rng.gen_range(0..=(self.params.height - size));

        Some((x, y))
    }
}

/// Random trapezoids roughly `size` pixels tall inside the canvas, with sub-pixel
/// corners and slanted sides.
pub struct TrapezoidIterator {
    params: Params,
    rng: StdRng,
}

impl TrapezoidIterator {
    pub fn new(params: Params) -> Self {
        Self { params, rng: rng() }
    }
}

impl Iterator for TrapezoidIterator {
    type Item = Trapezoid;

    fn next(&mut self) -> Option<Self::Item> {
        Some(gen_trapezoid(&mut self.rng, self.params))
    }
}

/// A valid trapezoid whose corners lie inside the canvas.
pub fn gen_trapezoid(rng: &mut impl Rng, params: Params) -> Trapezoid {
    let Params {
        width,
        height,
        size,
    } = params;
    let size = size.clamp(1, width.min(height));
    let top = rng.gen_range(0..=int_to_fixed(height - size));
    let bottom = top + rng.gen_range(FIXED_1 / 4..=int_to_fixed(size));
    let left_top = rng.gen_range(0..=int_to_fixed(width - size));
    let left_bot = rng.gen_range(0..=int_to_fixed(width - size));
    let mut span = || rng.gen_range(0..=int_to_fixed(size - 1));

    Trapezoid {
        top,
        bottom,
        left: LineFixed::new(
            PointFixed::new(left_top, top),
            PointFixed::new(left_bot, bottom),
        ),
        right: LineFixed::new(
            PointFixed::new(left_top + span(), top),
            PointFixed::new(left_bot + span(), bottom),
        ),
    }
}
