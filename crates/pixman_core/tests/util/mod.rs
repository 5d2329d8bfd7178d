// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(dead_code)]

use pixman_core::config::Config;
use pixman_core::{ExecutionMode, Format, Image, Implementation};

pub fn general() -> Implementation {
    Implementation::with_config(ExecutionMode::General, &Config::default())
}

pub fn scalar() -> Implementation {
    Implementation::with_config(ExecutionMode::Scalar, &Config::default())
}

pub fn auto() -> Implementation {
    Implementation::with_config(ExecutionMode::Auto, &Config::default())
}

/// The raw pixels of a bits image of 8, 16, 24 or 32 bits per pixel, row by row, with
/// the padding bits of `x` formats cleared.
pub fn raw_pixels(image: &Image) -> Vec<u32> {
    let format = image.format().expect("bits image");
    let bytes: &[u8] = bytemuck::cast_slice(image.data());
    let (stride, bpp) = (image.stride(), format.bpp() as usize / 8);
    let mut out = vec![];

    for y in 0..image.height() as usize {
        let row = &bytes[y * stride..];
        for x in 0..image.width() as usize {
            let mut word = [0; 4];
            word[..bpp].copy_from_slice(&row[x * bpp..(x + 1) * bpp]);
            out.push(u32::from_le_bytes(word) & format.significant_mask());
        }
    }

    out
}

/// A bits image of `width x height` pixels all set to the raw value `raw`.
pub fn filled(format: Format, width: i32, height: i32, raw: u32) -> Image {
    let mut image = Image::new_bits(format, width, height).unwrap();
    let stride = image.stride() / 4;
    let bpp = format.bpp();
    assert!(scalar().fill(image.data_mut(), stride, bpp, 0, 0, width, height, raw));
    image
}
