// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::error::Error;
use crate::format::Format;
use crate::image::Accessors;

/// Pixel storage.
///
/// Rows are `rowstride` 32-bit words apart. Pixels narrower than a word are packed
/// little-endian inside each row: 24-bit pixels as three bytes, 4-bit pixels with the
/// even pixel in the low nibble and 1-bit pixels starting at the least significant bit
/// of each byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitsImage {
    pub(crate) format: Format,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) bits: Vec<u32>,
    pub(crate) rowstride: usize,
}

/// The row stride in words of a tightly packed image, checking for overflow.
fn min_rowstride(format: Format, width: i32, height: i32) -> Result<usize, Error> {
    let overflow = Error::Overflow {
        width,
        height,
        bpp: format.bpp(),
    };

    let row_bits = (width as u64)
        .checked_mul(format.bpp() as u64)
        .filter(|b| *b <= i32::MAX as u64 - 0x1f)
        .ok_or(overflow.clone())?;
    let rowstride = (row_bits + 0x1f) >> 5;

    // The total byte size must fit an `i32`.
    if rowstride * 4 * height as u64 > i32::MAX as u64 {
        return Err(overflow);
    }

    Ok(rowstride as usize)
}

impl BitsImage {
    pub(crate) fn new(format: Format, width: i32, height: i32) -> Result<Self, Error> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidGeometry { width, height });
        }

        let rowstride = min_rowstride(format, width, height)?;

        Ok(Self {
            format,
            width,
            height,
            bits: vec![0; rowstride * height as usize],
            rowstride,
        })
    }

    pub(crate) fn from_vec(
        format: Format,
        width: i32,
        height: i32,
        bits: Vec<u32>,
        stride: usize,
    ) -> Result<Self, Error> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidGeometry { width, height });
        }

        let min = min_rowstride(format, width, height)?;

        if stride % 4 != 0 || stride / 4 < min {
            return Err(Error::InvalidStride { stride });
        }

        let rowstride = stride / 4;
        let required = rowstride
            .checked_mul(height as usize)
            .ok_or(Error::InvalidStride { stride })?;

        if bits.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                actual: bits.len(),
            });
        }

        Ok(Self {
            format,
            width,
            height,
            bits,
            rowstride,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The row stride in 32-bit words.
    pub fn rowstride(&self) -> usize {
        self.rowstride
    }

    /// Give back the pixel storage.
    pub fn into_vec(self) -> Vec<u32> {
        self.bits
    }

    /// The words of row `y`.
    #[inline]
    pub(crate) fn row(&self, y: i32) -> &[u32] {
        let start = y as usize * self.rowstride;
        &self.bits[start..start + self.rowstride]
    }

    #[inline]
    pub(crate) fn row_mut(&mut self, y: i32) -> &mut [u32] {
        let start = y as usize * self.rowstride;
        &mut self.bits[start..start + self.rowstride]
    }

    /// Row `y` reinterpreted as units of `T`, for the 8- and 16-bit formats.
    #[inline]
    pub(crate) fn row_as<T: bytemuck::Pod>(&self, y: i32) -> &[T] {
        bytemuck::cast_slice(self.row(y))
    }

    #[inline]
    pub(crate) fn row_as_mut<T: bytemuck::Pod>(&mut self, y: i32) -> &mut [T] {
        bytemuck::cast_slice_mut(self.row_mut(y))
    }

    /// Read the raw pixel at `(x, y)`, which must be inside the image.
    #[inline]
    pub(crate) fn read_raw(&self, x: i32, y: i32, accessors: Option<&Accessors>) -> u32 {
        read_pixel(self.row_as::<u8>(y), self.format.bpp(), x as usize, accessors)
    }

    #[inline]
    pub(crate) fn write_raw(&mut self, x: i32, y: i32, raw: u32, accessors: Option<&Accessors>) {
        let bpp = self.format.bpp();
        write_pixel(self.row_as_mut::<u8>(y), bpp, x as usize, raw, accessors);
    }

    /// The pixel at `(x, y)` as `0xAARRGGBB`.
    pub fn fetch_pixel(&self, x: i32, y: i32, accessors: Option<&Accessors>) -> u32 {
        self.format.layout().decode(self.read_raw(x, y, accessors))
    }

    /// The pixel at `(x, y)` as `0xAAAA_RRRR_GGGG_BBBB`.
    pub fn fetch_pixel_wide(&self, x: i32, y: i32, accessors: Option<&Accessors>) -> u64 {
        self.format
            .layout()
            .decode_wide(self.read_raw(x, y, accessors))
    }

    /// Decode `out.len()` pixels of row `y` starting at `x`. The span must be inside
    /// the image.
    pub(crate) fn fetch_scanline(
        &self,
        x: i32,
        y: i32,
        out: &mut [u32],
        accessors: Option<&Accessors>,
    ) {
        if accessors.is_none() && self.format == Format::A8R8G8B8 {
            let start = x as usize;
            out.copy_from_slice(&self.row(y)[start..start + out.len()]);
            return;
        }

        let layout = self.format.layout();
        let (row, bpp) = (self.row_as::<u8>(y), self.format.bpp());

        for (i, o) in out.iter_mut().enumerate() {
            *o = layout.decode(read_pixel(row, bpp, x as usize + i, accessors));
        }
    }

    pub(crate) fn fetch_scanline_wide(
        &self,
        x: i32,
        y: i32,
        out: &mut [u64],
        accessors: Option<&Accessors>,
    ) {
        let layout = self.format.layout();
        let (row, bpp) = (self.row_as::<u8>(y), self.format.bpp());

        for (i, o) in out.iter_mut().enumerate() {
            *o = layout.decode_wide(read_pixel(row, bpp, x as usize + i, accessors));
        }
    }

    /// Encode `values` into row `y` starting at `x`. The span must be inside the image.
    pub(crate) fn store_scanline(
        &mut self,
        x: i32,
        y: i32,
        values: &[u32],
        accessors: Option<&Accessors>,
    ) {
        if accessors.is_none() && self.format == Format::A8R8G8B8 {
            let start = x as usize;
            self.row_mut(y)[start..start + values.len()].copy_from_slice(values);
            return;
        }

        let layout = self.format.layout();
        let bpp = self.format.bpp();
        let row = self.row_as_mut::<u8>(y);

        for (i, v) in values.iter().enumerate() {
            write_pixel(row, bpp, x as usize + i, layout.encode(*v), accessors);
        }
    }

    pub(crate) fn store_scanline_wide(
        &mut self,
        x: i32,
        y: i32,
        values: &[u64],
        accessors: Option<&Accessors>,
    ) {
        let layout = self.format.layout();
        let bpp = self.format.bpp();
        let row = self.row_as_mut::<u8>(y);

        for (i, v) in values.iter().enumerate() {
            write_pixel(row, bpp, x as usize + i, layout.encode_wide(*v), accessors);
        }
    }
}

#[inline(always)]
fn load(bytes: &[u8], accessors: Option<&Accessors>) -> u32 {
    if let Some(a) = accessors {
        return (a.read)(bytes);
    }

    match *bytes {
        [b0, b1, b2, b3] => u32::from_ne_bytes([b0, b1, b2, b3]),
        [b0, b1, b2] => b0 as u32 | (b1 as u32) << 8 | (b2 as u32) << 16,
        [b0, b1] => u16::from_ne_bytes([b0, b1]) as u32,
        [b0] => b0 as u32,
        _ => unreachable!(),
    }
}

#[inline(always)]
fn store(bytes: &mut [u8], v: u32, accessors: Option<&Accessors>) {
    if let Some(a) = accessors {
        (a.write)(bytes, v);
        return;
    }

    match bytes.len() {
        4 => bytes.copy_from_slice(&v.to_ne_bytes()),
        3 => bytes.copy_from_slice(&v.to_le_bytes()[..3]),
        2 => bytes.copy_from_slice(&(v as u16).to_ne_bytes()),
        1 => bytes[0] = v as u8,
        _ => unreachable!(),
    }
}

#[inline(always)]
fn read_pixel(row: &[u8], bpp: u32, x: usize, accessors: Option<&Accessors>) -> u32 {
    match bpp {
        32 => load(&row[4 * x..4 * x + 4], accessors),
        24 => load(&row[3 * x..3 * x + 3], accessors),
        16 => load(&row[2 * x..2 * x + 2], accessors),
        8 => load(&row[x..x + 1], accessors),
        4 => {
            let b = load(&row[x / 2..x / 2 + 1], accessors);
            if x % 2 == 0 {
                b & 0xf
            } else {
                b >> 4
            }
        }
        1 => (load(&row[x / 8..x / 8 + 1], accessors) >> (x % 8)) & 1,
        _ => unreachable!("unsupported bpp {bpp}"),
    }
}

#[inline(always)]
fn write_pixel(row: &mut [u8], bpp: u32, x: usize, v: u32, accessors: Option<&Accessors>) {
    match bpp {
        32 => store(&mut row[4 * x..4 * x + 4], v, accessors),
        24 => store(&mut row[3 * x..3 * x + 3], v, accessors),
        16 => store(&mut row[2 * x..2 * x + 2], v, accessors),
        8 => store(&mut row[x..x + 1], v, accessors),
        4 => {
            let byte = &mut row[x / 2..x / 2 + 1];
            let old = load(byte, accessors);
            let new = if x % 2 == 0 {
                (old & 0xf0) | (v & 0xf)
            } else {
                (old & 0x0f) | ((v & 0xf) << 4)
            };
            store(byte, new, accessors);
        }
        1 => {
            let byte = &mut row[x / 8..x / 8 + 1];
            let bit = 1 << (x % 8);
            let old = load(byte, accessors);
            let new = if v & 1 != 0 { old | bit } else { old & !bit };
            store(byte, new, accessors);
        }
        _ => unreachable!("unsupported bpp {bpp}"),
    }
}
