// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Portable fast paths, plus the fill and blit primitives.
//!
//! Every kernel produces exactly the pixels the general path would, except for the
//! padding bits of `x` formats.

use super::{
    dest_format, for_each_dest_row, for_each_masked_dest_row, for_each_masked_row,
    for_each_row, solid_in, solid_mask_alpha,
};
use crate::combine::over_ca_pixel;
use crate::fast_path::{fast_path, CompositeInfo, FastPath};
use crate::format::{convert_0565_to_8888, convert_8888_to_0565};
use crate::math::{add_un8, in_un8, mul_un8, over, un8x4_add_un8x4};

pub(crate) const FAST_PATHS: &[FastPath] = &[
    fast_path!(Over, solid, A8, A8R8G8B8, over_n_8_8888),
    fast_path!(Over, solid, A8, X8R8G8B8, over_n_8_8888),
    fast_path!(Over, solid, A8, A8B8G8R8, over_n_8_8888),
    fast_path!(Over, solid, A8, X8B8G8R8, over_n_8_8888),
    fast_path!(Over, solid, A8, R5G6B5, over_n_8_0565),
    fast_path!(Over, solid, A8, B5G6R5, over_n_8_0565),
    fast_path!(Over, solid, A8R8G8B8, A8R8G8B8, COMPONENT_ALPHA, over_n_8888_8888_ca),
    fast_path!(Over, solid, A8R8G8B8, X8R8G8B8, COMPONENT_ALPHA, over_n_8888_8888_ca),
    fast_path!(Over, solid, A8B8G8R8, A8B8G8R8, COMPONENT_ALPHA, over_n_8888_8888_ca),
    fast_path!(Over, solid, A8B8G8R8, X8B8G8R8, COMPONENT_ALPHA, over_n_8888_8888_ca),
    fast_path!(Over, A8R8G8B8, A8R8G8B8, A8R8G8B8, PIXBUF, over_pixbuf_8888),
    fast_path!(Over, A8R8G8B8, A8R8G8B8, X8R8G8B8, PIXBUF, over_pixbuf_8888),
    fast_path!(Over, A8B8G8R8, A8B8G8R8, A8B8G8R8, PIXBUF, over_pixbuf_8888),
    fast_path!(Over, A8B8G8R8, A8B8G8R8, X8B8G8R8, PIXBUF, over_pixbuf_8888),
    fast_path!(Over, A8R8G8B8, solid, A8R8G8B8, over_8888_n_8888),
    fast_path!(Over, A8R8G8B8, solid, X8R8G8B8, over_8888_n_8888),
    fast_path!(Over, A8B8G8R8, solid, A8B8G8R8, over_8888_n_8888),
    fast_path!(Over, A8B8G8R8, solid, X8B8G8R8, over_8888_n_8888),
    fast_path!(Over, X8R8G8B8, A8, A8R8G8B8, over_x888_8_8888),
    fast_path!(Over, X8R8G8B8, A8, X8R8G8B8, over_x888_8_8888),
    fast_path!(Over, X8B8G8R8, A8, A8B8G8R8, over_x888_8_8888),
    fast_path!(Over, X8B8G8R8, A8, X8B8G8R8, over_x888_8_8888),
    fast_path!(Over, solid, null, A8R8G8B8, over_n_8888),
    fast_path!(Over, solid, null, X8R8G8B8, over_n_8888),
    fast_path!(Over, solid, null, A8B8G8R8, over_n_8888),
    fast_path!(Over, solid, null, X8B8G8R8, over_n_8888),
    fast_path!(Over, A8R8G8B8, null, A8R8G8B8, over_8888_8888),
    fast_path!(Over, A8R8G8B8, null, X8R8G8B8, over_8888_8888),
    fast_path!(Over, A8B8G8R8, null, A8B8G8R8, over_8888_8888),
    fast_path!(Over, A8B8G8R8, null, X8B8G8R8, over_8888_8888),
    fast_path!(Over, A8R8G8B8, null, R5G6B5, over_8888_0565),
    fast_path!(Over, A8B8G8R8, null, B5G6R5, over_8888_0565),
    fast_path!(Add, A8R8G8B8, null, A8R8G8B8, add_8888_8888),
    fast_path!(Add, A8B8G8R8, null, A8B8G8R8, add_8888_8888),
    fast_path!(Add, A8, null, A8, add_8_8),
    fast_path!(Add, solid, A8, A8, add_n_8_8),
    fast_path!(In, solid, A8, A8, in_n_8_8),
    fast_path!(In, A8, null, A8, in_8_8),
    fast_path!(Src, A8R8G8B8, A8R8G8B8, A8R8G8B8, PIXBUF, src_pixbuf_8888),
    fast_path!(Src, A8R8G8B8, A8R8G8B8, X8R8G8B8, PIXBUF, src_pixbuf_8888),
    fast_path!(Src, A8B8G8R8, A8B8G8R8, A8B8G8R8, PIXBUF, src_pixbuf_8888),
    fast_path!(Src, A8B8G8R8, A8B8G8R8, X8B8G8R8, PIXBUF, src_pixbuf_8888),
    fast_path!(Src, solid, null, A8R8G8B8, src_n),
    fast_path!(Src, solid, null, X8R8G8B8, src_n),
    fast_path!(Src, solid, null, A8B8G8R8, src_n),
    fast_path!(Src, solid, null, X8B8G8R8, src_n),
    fast_path!(Src, solid, null, R5G6B5, src_n),
    fast_path!(Src, solid, null, B5G6R5, src_n),
    fast_path!(Src, solid, null, A8, src_n),
    fast_path!(Src, X8R8G8B8, null, A8R8G8B8, src_x888_8888),
    fast_path!(Src, X8B8G8R8, null, A8B8G8R8, src_x888_8888),
    fast_path!(Src, A8R8G8B8, null, A8R8G8B8, src_copy_32),
    fast_path!(Src, A8R8G8B8, null, X8R8G8B8, src_copy_32),
    fast_path!(Src, X8R8G8B8, null, X8R8G8B8, src_copy_32),
    fast_path!(Src, A8B8G8R8, null, A8B8G8R8, src_copy_32),
    fast_path!(Src, A8B8G8R8, null, X8B8G8R8, src_copy_32),
    fast_path!(Src, X8B8G8R8, null, X8B8G8R8, src_copy_32),
    fast_path!(Src, R5G6B5, null, R5G6B5, src_copy_16),
    fast_path!(Src, B5G6R5, null, B5G6R5, src_copy_16),
    fast_path!(Src, A8, null, A8, src_copy_8),
    fast_path!(Src, R5G6B5, null, A8R8G8B8, src_0565_8888),
    fast_path!(Src, R5G6B5, null, X8R8G8B8, src_0565_8888),
    fast_path!(Src, B5G6R5, null, A8B8G8R8, src_0565_8888),
    fast_path!(Src, B5G6R5, null, X8B8G8R8, src_0565_8888),
    fast_path!(Src, A8R8G8B8, null, R5G6B5, src_8888_0565),
    fast_path!(Src, X8R8G8B8, null, R5G6B5, src_8888_0565),
    fast_path!(Src, A8B8G8R8, null, B5G6R5, src_8888_0565),
    fast_path!(Src, X8B8G8R8, null, B5G6R5, src_8888_0565),
];

fn over_n_8_8888(info: &mut CompositeInfo<'_>) {
    let src = solid_in(info.src, dest_format(info));
    if src == 0 {
        return;
    }

    for_each_masked_dest_row::<u8, u32>(info, |dest, mask| {
        for (d, &m) in dest.iter_mut().zip(mask) {
            match m {
                0 => {}
                0xff => *d = over(src, *d),
                m => *d = over(in_un8(src, m as u32), *d),
            }
        }
    });
}

fn over_n_8_0565(info: &mut CompositeInfo<'_>) {
    let src = solid_in(info.src, dest_format(info));
    if src == 0 {
        return;
    }

    for_each_masked_dest_row::<u8, u16>(info, |dest, mask| {
        for (d, &m) in dest.iter_mut().zip(mask) {
            if m != 0 {
                let s = in_un8(src, m as u32);
                *d = convert_8888_to_0565(over(s, convert_0565_to_8888(*d)));
            }
        }
    });
}

fn over_n_8888_8888_ca(info: &mut CompositeInfo<'_>) {
    let src = solid_in(info.src, dest_format(info));
    if src == 0 {
        return;
    }

    for_each_masked_dest_row::<u32, u32>(info, |dest, mask| {
        for (d, &m) in dest.iter_mut().zip(mask) {
            if m != 0 {
                *d = over_ca_pixel(src, m, *d);
            }
        }
    });
}

fn over_pixbuf_8888(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u32>(info, |dest, src| {
        for (d, &s) in dest.iter_mut().zip(src) {
            *d = over(in_un8(s, s >> 24), *d);
        }
    });
}

fn over_8888_n_8888(info: &mut CompositeInfo<'_>) {
    let m = solid_mask_alpha(info);
    if m == 0 {
        return;
    }

    for_each_row::<u32, u32>(info, |dest, src| {
        for (d, &s) in dest.iter_mut().zip(src) {
            *d = over(in_un8(s, m), *d);
        }
    });
}

fn over_x888_8_8888(info: &mut CompositeInfo<'_>) {
    for_each_masked_row::<u32, u8, u32>(info, |dest, src, mask| {
        for ((d, &s), &m) in dest.iter_mut().zip(src).zip(mask) {
            let s = s | 0xff00_0000;
            match m {
                0 => {}
                0xff => *d = s,
                m => *d = over(in_un8(s, m as u32), *d),
            }
        }
    });
}

fn over_n_8888(info: &mut CompositeInfo<'_>) {
    let src = solid_in(info.src, dest_format(info));
    if src == 0 {
        return;
    }

    for_each_dest_row::<u32>(info, |dest| over_n_row(dest, src));
}

/// `over` of one solid color onto a row.
pub(crate) fn over_n_row(dest: &mut [u32], src: u32) {
    if src >> 24 == 0xff {
        dest.fill(src);
    } else {
        for d in dest {
            *d = over(src, *d);
        }
    }
}

fn over_8888_8888(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u32>(info, over_8888_row);
}

pub(crate) fn over_8888_row(dest: &mut [u32], src: &[u32]) {
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = over(s, *d);
    }
}

fn over_8888_0565(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u16>(info, |dest, src| {
        for (d, &s) in dest.iter_mut().zip(src) {
            match s >> 24 {
                0 if s == 0 => {}
                0xff => *d = convert_8888_to_0565(s),
                _ => *d = convert_8888_to_0565(over(s, convert_0565_to_8888(*d))),
            }
        }
    });
}

fn add_8888_8888(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u32>(info, add_8888_row);
}

pub(crate) fn add_8888_row(dest: &mut [u32], src: &[u32]) {
    for (d, &s) in dest.iter_mut().zip(src) {
        if s != 0 {
            *d = un8x4_add_un8x4(s, *d);
        }
    }
}

fn add_8_8(info: &mut CompositeInfo<'_>) {
    for_each_row::<u8, u8>(info, add_8_row);
}

pub(crate) fn add_8_row(dest: &mut [u8], src: &[u8]) {
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = add_un8(s as u32, *d as u32) as u8;
    }
}

fn add_n_8_8(info: &mut CompositeInfo<'_>) {
    let sa = solid_in(info.src, dest_format(info)) >> 24;
    if sa == 0 {
        return;
    }

    for_each_masked_dest_row::<u8, u8>(info, |dest, mask| {
        for (d, &m) in dest.iter_mut().zip(mask) {
            *d = add_un8(mul_un8(sa, m as u32), *d as u32) as u8;
        }
    });
}

fn in_n_8_8(info: &mut CompositeInfo<'_>) {
    let sa = solid_in(info.src, dest_format(info)) >> 24;

    for_each_masked_dest_row::<u8, u8>(info, |dest, mask| {
        for (d, &m) in dest.iter_mut().zip(mask) {
            *d = mul_un8(mul_un8(sa, m as u32), *d as u32) as u8;
        }
    });
}

fn in_8_8(info: &mut CompositeInfo<'_>) {
    for_each_row::<u8, u8>(info, |dest, src| {
        for (d, &s) in dest.iter_mut().zip(src) {
            *d = mul_un8(s as u32, *d as u32) as u8;
        }
    });
}

fn src_pixbuf_8888(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u32>(info, |dest, src| {
        for (d, &s) in dest.iter_mut().zip(src) {
            *d = in_un8(s, s >> 24);
        }
    });
}

fn src_n(info: &mut CompositeInfo<'_>) {
    let format = dest_format(info);
    let filler = format.layout().encode(info.src.solid_color().unwrap_or(0));
    let (x, y, width, height) = (info.dest_x, info.dest_y, info.width, info.height);

    if let Some(bits) = info.dest.bits_mut() {
        let stride = bits.rowstride;
        let filled = fill(&mut bits.bits, stride, format.bpp(), x, y, width, height, filler);
        debug_assert!(filled);
    }
}

fn src_x888_8888(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u32>(info, src_x888_row);
}

pub(crate) fn src_x888_row(dest: &mut [u32], src: &[u32]) {
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = s | 0xff00_0000;
    }
}

fn src_copy_32(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u32>(info, |dest, src| dest.copy_from_slice(src));
}

fn src_copy_16(info: &mut CompositeInfo<'_>) {
    for_each_row::<u16, u16>(info, |dest, src| dest.copy_from_slice(src));
}

fn src_copy_8(info: &mut CompositeInfo<'_>) {
    for_each_row::<u8, u8>(info, |dest, src| dest.copy_from_slice(src));
}

fn src_0565_8888(info: &mut CompositeInfo<'_>) {
    for_each_row::<u16, u32>(info, |dest, src| {
        for (d, &s) in dest.iter_mut().zip(src) {
            *d = convert_0565_to_8888(s);
        }
    });
}

fn src_8888_0565(info: &mut CompositeInfo<'_>) {
    for_each_row::<u32, u16>(info, |dest, src| {
        for (d, &s) in dest.iter_mut().zip(src) {
            *d = convert_8888_to_0565(s);
        }
    });
}

/// Fill a rectangle of a `bpp` bits-per-pixel buffer with `filler`. `stride` is in
/// 32-bit words. Returns `false` for an unsupported depth or a rectangle outside the
/// buffer.
#[allow(clippy::too_many_arguments)]
pub(crate) fn fill(
    bits: &mut [u32],
    stride: usize,
    bpp: u32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    filler: u32,
) -> bool {
    if x < 0 || y < 0 || width < 0 || height < 0 {
        return false;
    }

    let rect = [x, y, width, height].map(|v| v as usize);

    match bpp {
        8 => fill_rows(bits, stride, rect, filler as u8),
        16 => fill_rows(bits, stride, rect, filler as u16),
        32 => fill_rows(bits, stride, rect, filler),
        _ => false,
    }
}

fn fill_rows<T: bytemuck::Pod>(
    bits: &mut [u32],
    stride: usize,
    [x, y, width, height]: [usize; 4],
    value: T,
) -> bool {
    if width == 0 || height == 0 {
        return true;
    }

    let per_row = stride * 4 / std::mem::size_of::<T>();
    if x + width > per_row || (y + height) * stride > bits.len() {
        return false;
    }

    for row in bits.chunks_exact_mut(stride).skip(y).take(height) {
        bytemuck::cast_slice_mut::<u32, T>(row)[x..x + width].fill(value);
    }

    true
}

/// Copy a rectangle between two buffers of the same, byte-aligned depth. Strides are
/// in 32-bit words. Returns `false` when the depths differ or are not a whole number of
/// bytes, or when a rectangle does not fit its buffer.
#[allow(clippy::too_many_arguments)]
pub(crate) fn blt(
    src: &[u32],
    dst: &mut [u32],
    src_stride: usize,
    dst_stride: usize,
    src_bpp: u32,
    dst_bpp: u32,
    src_x: i32,
    src_y: i32,
    dest_x: i32,
    dest_y: i32,
    width: i32,
    height: i32,
) -> bool {
    if src_bpp != dst_bpp || !matches!(src_bpp, 8 | 16 | 24 | 32) {
        return false;
    }
    if [src_x, src_y, dest_x, dest_y, width, height].iter().any(|&v| v < 0) {
        return false;
    }
    if width == 0 || height == 0 {
        return true;
    }

    let bytes = src_bpp as usize / 8;
    let row_bytes = width as usize * bytes;
    let (src_stride, dst_stride) = (src_stride * 4, dst_stride * 4);
    let src_start = src_y as usize * src_stride + src_x as usize * bytes;
    let dst_start = dest_y as usize * dst_stride + dest_x as usize * bytes;
    let src: &[u8] = bytemuck::cast_slice(src);
    let dst: &mut [u8] = bytemuck::cast_slice_mut(dst);

    let fits = |start: usize, stride: usize, len: usize| {
        start % stride + row_bytes <= stride
            && start + (height as usize - 1) * stride + row_bytes <= len
    };
    if !fits(src_start, src_stride, src.len()) || !fits(dst_start, dst_stride, dst.len()) {
        return false;
    }

    for row in 0..height as usize {
        let s = src_start + row * src_stride;
        let d = dst_start + row * dst_stride;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::fast_path::{FormatSpec, PathFlags};
    use crate::format::Format;
    use crate::general::general_composite_rect;
    use crate::image::{Image, Repeat};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const WIDTH: i32 = 13;
    const HEIGHT: i32 = 3;

    fn random_bits(rng: &mut StdRng, format: Format) -> Image {
        let mut image = Image::new_bits(format, WIDTH, HEIGHT).unwrap();
        for word in image.data_mut() {
            // Mostly opaque or transparent pixels, to reach the special cases.
            *word = match rng.gen_range(0..4) {
                0 => 0,
                1 => rng.gen::<u32>() | 0xff00_00ff,
                _ => rng.gen(),
            };
        }
        image
    }

    fn image_for(rng: &mut StdRng, spec: FormatSpec) -> Option<Image> {
        match spec {
            FormatSpec::Null => None,
            FormatSpec::Solid => {
                if rng.gen() {
                    Some(Image::solid(Color::from_argb32(rng.gen())))
                } else {
                    let mut one = Image::new_bits(Format::A8R8G8B8, 1, 1).unwrap();
                    one.data_mut()[0] = rng.gen();
                    one.set_repeat(Repeat::Normal);
                    Some(one)
                }
            }
            FormatSpec::Format(format) => Some(random_bits(rng, format)),
        }
    }

    fn info<'a>(
        path: &FastPath,
        src: &'a Image,
        mask: Option<&'a Image>,
        dest: &'a mut Image,
    ) -> CompositeInfo<'a> {
        CompositeInfo {
            op: path.op,
            src,
            mask,
            dest,
            src_x: 1,
            src_y: 1,
            mask_x: if path.flags.contains(PathFlags::PIXBUF) { 1 } else { 2 },
            mask_y: if path.flags.contains(PathFlags::PIXBUF) { 1 } else { 0 },
            dest_x: 3,
            dest_y: 1,
            width: WIDTH - 3,
            height: HEIGHT - 1,
        }
    }

    #[test]
    fn every_fast_path_matches_the_general_path() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for (index, path) in FAST_PATHS.iter().enumerate() {
            for _ in 0..8 {
                let src = image_for(&mut rng, path.src).unwrap();
                let mut mask = if path.flags.contains(PathFlags::PIXBUF) {
                    None
                } else {
                    image_for(&mut rng, path.mask)
                };
                if let Some(mask) = &mut mask {
                    mask.set_component_alpha(path.flags.contains(PathFlags::COMPONENT_ALPHA));
                }
                let mask = if path.flags.contains(PathFlags::PIXBUF) {
                    Some(&src)
                } else {
                    mask.as_ref()
                };

                let mut fast = random_bits(&mut rng, path.dest);
                let mut general = fast.clone();

                (path.func)(&mut info(path, &src, mask, &mut fast));
                general_composite_rect(&mut info(path, &src, mask, &mut general));

                let significant = path.dest.significant_mask();
                let pixels = |image: &Image| {
                    let bits = image.bits().unwrap();
                    (0..HEIGHT)
                        .flat_map(|y| (0..WIDTH).map(move |x| bits.read_raw(x, y, None)))
                        .map(|p| p & significant)
                        .collect::<Vec<_>>()
                };
                assert_eq!(pixels(&fast), pixels(&general), "entry {index}: {:?}", path.dest);
            }
        }
    }

    #[test]
    fn fill_each_depth() {
        let mut bits = vec![0_u32; 4 * 3];
        assert!(fill(&mut bits, 4, 8, 1, 1, 3, 2, 0xab));
        assert_eq!(bits[4], 0xabab_ab00);
        assert_eq!(bits[8], 0xabab_ab00);
        assert_eq!(bits[0], 0);

        let mut bits = vec![0_u32; 2 * 2];
        assert!(fill(&mut bits, 2, 16, 1, 0, 2, 1, 0x1234));
        assert_eq!(bits[0], 0x1234_0000);
        assert_eq!(bits[1], 0x0000_1234);

        let mut bits = vec![0_u32; 4];
        assert!(fill(&mut bits, 2, 32, 0, 1, 2, 1, 7));
        assert_eq!(bits, [0, 0, 7, 7]);
    }

    #[test]
    fn fill_rejects_bad_requests() {
        let mut bits = vec![0_u32; 4];
        assert!(!fill(&mut bits, 2, 24, 0, 0, 1, 1, 0));
        assert!(!fill(&mut bits, 2, 32, 1, 0, 2, 1, 0));
        assert!(!fill(&mut bits, 2, 32, 0, 1, 1, 2, 0));
        assert!(!fill(&mut bits, 2, 32, -1, 0, 1, 1, 0));
        assert!(bits.iter().all(|&w| w == 0));
    }

    #[test]
    fn blt_copies_same_depth_only() {
        let src: Vec<u32> = (0..8).collect();
        let mut dst = vec![0_u32; 8];

        assert!(blt(&src, &mut dst, 4, 4, 32, 32, 1, 0, 0, 1, 2, 1));
        assert_eq!(dst, [0, 0, 0, 0, 1, 2, 0, 0]);

        assert!(!blt(&src, &mut dst, 4, 4, 32, 16, 0, 0, 0, 0, 1, 1));
        assert!(!blt(&src, &mut dst, 4, 4, 4, 4, 0, 0, 0, 0, 1, 1));
        assert!(!blt(&src, &mut dst, 4, 4, 32, 32, 3, 0, 0, 0, 2, 1));
    }

    #[test]
    fn blt_24bpp_moves_whole_pixels() {
        let src: Vec<u32> = vec![0x0403_0201, 0x0807_0605, 0x0c0b_0a09];
        let mut dst = vec![0_u32; 3];

        assert!(blt(&src, &mut dst, 3, 3, 24, 24, 1, 0, 0, 0, 2, 1));
        let bytes: &[u8] = bytemuck::cast_slice(&dst);
        assert_eq!(&bytes[..6], &[4, 5, 6, 7, 8, 9]);
    }
}
