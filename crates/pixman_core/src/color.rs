// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 16-bit premultiplied colors.

use peniko::color::{AlphaColor, Srgb};

/// A premultiplied color with 16 bits per channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub alpha: u16,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(red: u16, green: u16, blue: u16, alpha: u16) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Build a color from a packed `0xAARRGGBB` premultiplied pixel.
    pub const fn from_argb32(p: u32) -> Self {
        const fn channel(p: u32, shift: u32) -> u16 {
            ((p >> shift) & 0xff) as u16 * 0x101
        }

        Self::new(channel(p, 16), channel(p, 8), channel(p, 0), channel(p, 24))
    }

    /// The color as a packed `0xAARRGGBB` pixel, truncating each channel to 8 bits.
    pub const fn to_argb32(&self) -> u32 {
        ((self.alpha as u32 >> 8) << 24)
            | ((self.red as u32 >> 8) << 16)
            | (self.green as u32 & 0xff00)
            | (self.blue as u32 >> 8)
    }

    /// The color as a wide `0xAAAA_RRRR_GGGG_BBBB` pixel.
    pub const fn to_argb64(&self) -> u64 {
        ((self.alpha as u64) << 48)
            | ((self.red as u64) << 32)
            | ((self.green as u64) << 16)
            | self.blue as u64
    }
}

impl From<AlphaColor<Srgb>> for Color {
    fn from(value: AlphaColor<Srgb>) -> Self {
        let [r, g, b, a] = value.premultiply().components;
        let c = |v: f32| (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16;

        Self::new(c(r), c(g), c(b), c(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::color::palette;

    #[test]
    fn packs_channels() {
        let c = Color::new(0xff00, 0x8000, 0x0100, 0xffff);
        assert_eq!(c.to_argb32(), 0xffff_8001);
        assert_eq!(Color::from_argb32(0xffff_8001).to_argb32(), 0xffff_8001);
    }

    #[test]
    fn converts_from_peniko() {
        let c: Color = palette::css::RED.into();
        assert_eq!(c.to_argb32(), 0xffff_0000);

        let half: Color = palette::css::WHITE.with_alpha(0.5).into();
        assert_eq!(half.to_argb32() >> 24, 0x80);
        assert_eq!(half.red, half.alpha);
    }
}
