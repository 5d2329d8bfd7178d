// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel formats and lossless conversion between packed encodings.
//!
//! Every format is described by its total bits per pixel, the order its channels are
//! packed in, and the number of bits per channel. Decoding expands a channel to 8 (or 16)
//! bits by bit replication, so that truncating back recovers the original bits exactly.

/// The order channels are packed in, from the most significant bits down.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// Alpha only.
    A,
    /// Alpha, red, green, blue.
    Argb,
    /// Alpha, blue, green, red.
    Abgr,
    /// Blue, green, red, alpha.
    Bgra,
}

/// A pixel layout.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    A8R8G8B8,
    X8R8G8B8,
    A8B8G8R8,
    X8B8G8R8,
    B8G8R8A8,
    B8G8R8X8,
    A2R10G10B10,
    X2R10G10B10,
    A2B10G10R10,
    X2B10G10R10,
    R8G8B8,
    B8G8R8,
    R5G6B5,
    B5G6R5,
    A1R5G5B5,
    X1R5G5B5,
    A4R4G4B4,
    X4R4G4B4,
    A8,
    A4,
    A1,
}

/// Bit positions of the channels inside one pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) bpp: u32,
    pub(crate) a: (u32, u32),
    pub(crate) r: (u32, u32),
    pub(crate) g: (u32, u32),
    pub(crate) b: (u32, u32),
}

impl Format {
    /// All supported formats.
    pub const ALL: [Format; 21] = [
        Format::A8R8G8B8,
        Format::X8R8G8B8,
        Format::A8B8G8R8,
        Format::X8B8G8R8,
        Format::B8G8R8A8,
        Format::B8G8R8X8,
        Format::A2R10G10B10,
        Format::X2R10G10B10,
        Format::A2B10G10R10,
        Format::X2B10G10R10,
        Format::R8G8B8,
        Format::B8G8R8,
        Format::R5G6B5,
        Format::B5G6R5,
        Format::A1R5G5B5,
        Format::X1R5G5B5,
        Format::A4R4G4B4,
        Format::X4R4G4B4,
        Format::A8,
        Format::A4,
        Format::A1,
    ];

    /// `(bpp, order, a, r, g, b)`.
    const fn descriptor(self) -> (u32, ChannelOrder, u32, u32, u32, u32) {
        use ChannelOrder::*;

        match self {
            Format::A8R8G8B8 => (32, Argb, 8, 8, 8, 8),
            Format::X8R8G8B8 => (32, Argb, 0, 8, 8, 8),
            Format::A8B8G8R8 => (32, Abgr, 8, 8, 8, 8),
            Format::X8B8G8R8 => (32, Abgr, 0, 8, 8, 8),
            Format::B8G8R8A8 => (32, Bgra, 8, 8, 8, 8),
            Format::B8G8R8X8 => (32, Bgra, 0, 8, 8, 8),
            Format::A2R10G10B10 => (32, Argb, 2, 10, 10, 10),
            Format::X2R10G10B10 => (32, Argb, 0, 10, 10, 10),
            Format::A2B10G10R10 => (32, Abgr, 2, 10, 10, 10),
            Format::X2B10G10R10 => (32, Abgr, 0, 10, 10, 10),
            Format::R8G8B8 => (24, Argb, 0, 8, 8, 8),
            Format::B8G8R8 => (24, Abgr, 0, 8, 8, 8),
            Format::R5G6B5 => (16, Argb, 0, 5, 6, 5),
            Format::B5G6R5 => (16, Abgr, 0, 5, 6, 5),
            Format::A1R5G5B5 => (16, Argb, 1, 5, 5, 5),
            Format::X1R5G5B5 => (16, Argb, 0, 5, 5, 5),
            Format::A4R4G4B4 => (16, Argb, 4, 4, 4, 4),
            Format::X4R4G4B4 => (16, Argb, 0, 4, 4, 4),
            Format::A8 => (8, A, 8, 0, 0, 0),
            Format::A4 => (4, A, 4, 0, 0, 0),
            Format::A1 => (1, A, 1, 0, 0, 0),
        }
    }

    /// Bits per pixel.
    pub const fn bpp(self) -> u32 {
        self.descriptor().0
    }

    /// The channel order.
    pub const fn order(self) -> ChannelOrder {
        self.descriptor().1
    }

    /// Bits in the alpha channel, zero for formats without alpha.
    pub const fn alpha_bits(self) -> u32 {
        self.descriptor().2
    }

    /// Whether the format carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        self.alpha_bits() != 0
    }

    /// Whether the format carries color channels.
    pub const fn has_color(self) -> bool {
        !matches!(self.order(), ChannelOrder::A)
    }

    /// Whether some channel has more than 8 bits, so that the 16-bit pipeline
    /// is needed to keep full precision.
    pub const fn is_wide(self) -> bool {
        let (_, _, a, r, g, b) = self.descriptor();
        a > 8 || r > 8 || g > 8 || b > 8
    }

    /// The bits of a stored pixel that carry information. Padding bits of
    /// `x` formats are excluded.
    pub fn significant_mask(self) -> u32 {
        let l = self.layout();
        let field = |(shift, bits): (u32, u32)| {
            if bits == 0 {
                0
            } else {
                ((1u32 << bits) - 1) << shift
            }
        };
        field(l.a) | field(l.r) | field(l.g) | field(l.b)
    }

    pub(crate) fn layout(self) -> Layout {
        let (bpp, order, a, r, g, b) = self.descriptor();

        match order {
            ChannelOrder::A => Layout {
                bpp,
                a: (0, a),
                r: (0, 0),
                g: (0, 0),
                b: (0, 0),
            },
            ChannelOrder::Argb => Layout {
                bpp,
                a: (bpp - a, a),
                r: (b + g, r),
                g: (b, g),
                b: (0, b),
            },
            ChannelOrder::Abgr => Layout {
                bpp,
                a: (bpp - a, a),
                b: (r + g, b),
                g: (r, g),
                r: (0, r),
            },
            ChannelOrder::Bgra => Layout {
                bpp,
                b: (bpp - b, b),
                g: (bpp - b - g, g),
                r: (bpp - b - g - r, r),
                a: (bpp - b - g - r - a, a),
            },
        }
    }
}

/// Expand a `from`-bit channel value to `to` bits by replicating its bits.
#[inline]
pub const fn expand_channel(v: u32, from: u32, to: u32) -> u32 {
    if from == 0 {
        return (1 << to) - 1;
    }

    let mut r = v << (to - from);
    let mut shift = from;

    while shift < to {
        r |= r >> shift;
        shift *= 2;
    }

    r
}

/// Truncate an 8- or 16-bit channel to `to` bits.
#[inline]
pub const fn contract_channel(v: u32, from: u32, to: u32) -> u32 {
    v >> (from - to)
}

/// Convert a `from`-bit channel to `to` bits, expanding or truncating as needed.
#[inline]
const fn rescale_channel(v: u32, from: u32, to: u32) -> u32 {
    if from <= to {
        expand_channel(v, from, to)
    } else {
        contract_channel(v, from, to)
    }
}

#[inline]
fn field(raw: u32, (shift, bits): (u32, u32)) -> u32 {
    (raw >> shift) & ((1u32 << bits) - 1)
}

impl Layout {
    /// Decode a raw pixel into `0xAARRGGBB`.
    #[inline]
    pub(crate) fn decode(&self, raw: u32) -> u32 {
        let channel = |f: (u32, u32)| {
            if f.1 == 0 {
                0
            } else {
                rescale_channel(field(raw, f), f.1, 8)
            }
        };
        let a = if self.a.1 == 0 {
            0xff
        } else {
            rescale_channel(field(raw, self.a), self.a.1, 8)
        };

        (a << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Encode `0xAARRGGBB` into a raw pixel.
    #[inline]
    pub(crate) fn encode(&self, argb: u32) -> u32 {
        let put = |v: u32, (shift, bits): (u32, u32)| {
            if bits == 0 {
                0
            } else {
                rescale_channel(v & 0xff, 8, bits) << shift
            }
        };

        put(argb >> 24, self.a)
            | put(argb >> 16, self.r)
            | put(argb >> 8, self.g)
            | put(argb, self.b)
    }

    /// Decode a raw pixel into `0xAAAA_RRRR_GGGG_BBBB`.
    #[inline]
    pub(crate) fn decode_wide(&self, raw: u32) -> u64 {
        let channel = |f: (u32, u32)| {
            if f.1 == 0 {
                0
            } else {
                expand_channel(field(raw, f), f.1, 16) as u64
            }
        };
        let a = if self.a.1 == 0 {
            0xffff
        } else {
            expand_channel(field(raw, self.a), self.a.1, 16) as u64
        };

        (a << 48) | (channel(self.r) << 32) | (channel(self.g) << 16) | channel(self.b)
    }

    /// Encode `0xAAAA_RRRR_GGGG_BBBB` into a raw pixel.
    #[inline]
    pub(crate) fn encode_wide(&self, argb: u64) -> u32 {
        let put = |v: u64, (shift, bits): (u32, u32)| {
            if bits == 0 {
                0
            } else {
                contract_channel((v & 0xffff) as u32, 16, bits) << shift
            }
        };

        put(argb >> 48, self.a)
            | put(argb >> 32, self.r)
            | put(argb >> 16, self.g)
            | put(argb, self.b)
    }
}

/// Expand an r5g6b5 pixel to x8r8g8b8 (with an opaque alpha).
#[inline]
pub fn convert_0565_to_8888(s: u16) -> u32 {
    let s = s as u32;
    let r = expand_channel((s >> 11) & 0x1f, 5, 8);
    let g = expand_channel((s >> 5) & 0x3f, 6, 8);
    let b = expand_channel(s & 0x1f, 5, 8);

    0xff00_0000 | (r << 16) | (g << 8) | b
}

/// Contract an x8r8g8b8 pixel to r5g6b5.
#[inline]
pub fn convert_8888_to_0565(s: u32) -> u16 {
    (((s >> 8) & 0xf800) | ((s >> 5) & 0x07e0) | ((s >> 3) & 0x001f)) as u16
}

/// Swap the red and blue channels of a 32-bit pixel.
#[inline]
pub fn swap_rb(s: u32) -> u32 {
    (s & 0xff00_ff00) | ((s >> 16) & 0xff) | ((s & 0xff) << 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_round_trip_is_exact() {
        for bits in 1..=8 {
            for v in 0..(1u32 << bits) {
                let e = expand_channel(v, bits, 8);
                assert_eq!(contract_channel(e, 8, bits), v, "{bits} bits, value {v}");
            }
        }

        for bits in [10, 16] {
            for v in (0..(1u32 << bits)).step_by(3) {
                let e = expand_channel(v, bits, 16);
                assert_eq!(contract_channel(e, 16, bits), v);
            }
        }
    }

    #[test]
    fn extremes_map_to_extremes() {
        for bits in 1..=8 {
            assert_eq!(expand_channel(0, bits, 8), 0);
            assert_eq!(expand_channel((1 << bits) - 1, bits, 8), 0xff);
        }
    }

    #[test]
    fn every_format_round_trips_raw_pixels() {
        for format in Format::ALL {
            let layout = format.layout();
            let mask = format.significant_mask();
            let max = if format.bpp() == 32 {
                u32::MAX
            } else {
                (1u32 << format.bpp()) - 1
            };

            for raw in (0..=max).step_by((max / 4099).max(1) as usize) {
                let raw = raw & mask;

                if format.is_wide() {
                    assert_eq!(layout.encode_wide(layout.decode_wide(raw)), raw, "{format:?}");
                } else {
                    assert_eq!(layout.encode(layout.decode(raw)), raw, "{format:?}");
                }
            }
        }
    }

    #[test]
    fn ten_bit_channels_in_the_narrow_pipeline() {
        let layout = Format::A2R10G10B10.layout();
        assert_eq!(layout.decode(0xffff_ffff), 0xffff_ffff);
        assert_eq!(layout.encode(0xffff_ffff), 0xffff_ffff);
        assert_eq!(layout.decode(layout.encode(0x5580_4020)), 0x5580_4020);
    }

    #[test]
    fn layouts_place_channels() {
        assert_eq!(Format::A8R8G8B8.layout().decode(0x11223344), 0x11223344);
        assert_eq!(Format::A8B8G8R8.layout().decode(0x11223344), 0x11443322);
        assert_eq!(Format::B8G8R8A8.layout().decode(0x11223344), 0x44332211);
        assert_eq!(Format::X8R8G8B8.layout().decode(0x00223344), 0xff223344);
        assert_eq!(Format::A8.layout().decode(0x7f), 0x7f00_0000);
        assert_eq!(Format::X8R8G8B8.significant_mask(), 0x00ff_ffff);
    }

    #[test]
    fn rgb565_helpers_match_layout() {
        for s in (0..=0xffffu32).step_by(7) {
            let expected = Format::R5G6B5.layout().decode(s);
            assert_eq!(convert_0565_to_8888(s as u16), expected);
            assert_eq!(convert_8888_to_0565(expected) as u32, s);
        }
    }
}
