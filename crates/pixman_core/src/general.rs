// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The general compositing path.
//!
//! Handles every combination of images, formats and attributes by fetching each row
//! of the source, mask and destination into scanline buffers, combining them and
//! storing the result. Rows are processed in the 16-bit pipeline as soon as any of
//! the images has a format with more than 8 bits per channel.

use crate::combine::{combiner, Pixel};
use crate::fast_path::CompositeInfo;
use crate::fetch;
use crate::format::Format;
use crate::image::{Classification, Image};
use crate::operator::Operator;
use smallvec::{smallvec, SmallVec};

/// Pixels held on the stack before the scanline buffers spill to the heap.
const SCANLINE_BUFFER_SIZE: usize = 2048;

/// A pixel type with fetch and store routines.
trait Scanline: Pixel {
    fn fetch(image: &Image, x: i32, y: i32, out: &mut [Self]);
    fn fetch_dest(image: &Image, x: i32, y: i32, out: &mut [Self]);
    fn store(image: &mut Image, x: i32, y: i32, values: &[Self]);
    /// The destination row itself, when it can be combined into without conversion.
    fn dest_in_place(image: &mut Image, x: i32, y: i32, width: usize) -> Option<&mut [Self]>;
}

impl Scanline for u32 {
    fn fetch(image: &Image, x: i32, y: i32, out: &mut [Self]) {
        fetch::fetch_scanline(image, x, y, out);
    }

    fn fetch_dest(image: &Image, x: i32, y: i32, out: &mut [Self]) {
        fetch::fetch_dest_scanline(image, x, y, out);
    }

    fn store(image: &mut Image, x: i32, y: i32, values: &[Self]) {
        fetch::store_scanline(image, x, y, values);
    }

    fn dest_in_place(image: &mut Image, x: i32, y: i32, width: usize) -> Option<&mut [Self]> {
        let row = image.bits_mut()?.row_mut(y);
        Some(&mut row[x as usize..x as usize + width])
    }
}

impl Scanline for u64 {
    fn fetch(image: &Image, x: i32, y: i32, out: &mut [Self]) {
        fetch::fetch_scanline_wide(image, x, y, out);
    }

    fn fetch_dest(image: &Image, x: i32, y: i32, out: &mut [Self]) {
        fetch::fetch_dest_scanline_wide(image, x, y, out);
    }

    fn store(image: &mut Image, x: i32, y: i32, values: &[Self]) {
        fetch::store_scanline_wide(image, x, y, values);
    }

    fn dest_in_place(_: &mut Image, _: i32, _: i32, _: usize) -> Option<&mut [Self]> {
        None
    }
}

/// Whether the destination can be combined into directly: its raw pixels already are
/// `0xAARRGGBB` and the operator does not care about the padding byte.
fn can_write_in_place(info: &CompositeInfo<'_>) -> bool {
    let dest = &*info.dest;

    matches!(info.op, Operator::Over | Operator::Add)
        && matches!(dest.format(), Some(Format::A8R8G8B8 | Format::X8R8G8B8))
        && dest.common.accessors.is_none()
        && dest.common.alpha_map.is_none()
        && !info.mask.is_some_and(|m| m.component_alpha())
}

/// Composite one rectangle with no restrictions on the images.
pub(crate) fn general_composite_rect(info: &mut CompositeInfo<'_>) {
    let wide = [Some(info.src), info.mask, Some(&*info.dest)]
        .into_iter()
        .flatten()
        .any(|image| image.format().is_some_and(Format::is_wide));

    if wide {
        composite_rows::<u64>(info, false);
    } else {
        let in_place = can_write_in_place(info);
        composite_rows::<u32>(info, in_place);
    }
}

fn composite_rows<P: Scanline>(info: &mut CompositeInfo<'_>, in_place: bool) {
    let width = info.width as usize;
    let mut buffer: SmallVec<[P; SCANLINE_BUFFER_SIZE]> = smallvec![P::ZERO; width * 3];
    let (src_line, rest) = buffer.split_at_mut(width);
    let (mask_line, dest_line) = rest.split_at_mut(width);

    let src_invariant = info.src.classify() == Classification::HorizontalInvariant;
    let mask_invariant = info
        .mask
        .is_some_and(|m| m.classify() == Classification::HorizontalInvariant);
    let component_alpha = info.mask.is_some_and(|m| m.component_alpha());
    let combine = combiner::<P>(info.op, component_alpha);
    let reads_dest = !matches!(info.op, Operator::Src | Operator::Clear);

    for row in 0..info.height {
        let y = info.dest_y + row;

        if row == 0 || !src_invariant {
            P::fetch(info.src, info.src_x, info.src_y + row, src_line);
        }

        let mask = match info.mask {
            Some(m) => {
                if row == 0 || !mask_invariant {
                    P::fetch(m, info.mask_x, info.mask_y + row, mask_line);
                }
                Some(&mask_line[..])
            }
            None => None,
        };

        if in_place {
            if let Some(dest) = P::dest_in_place(info.dest, info.dest_x, y, width) {
                combine(dest, src_line, mask);
                continue;
            }
        }

        if reads_dest {
            P::fetch_dest(info.dest, info.dest_x, y, dest_line);
        }

        combine(dest_line, src_line, mask);
        P::store(info.dest, info.dest_x, y, dest_line);
    }
}
