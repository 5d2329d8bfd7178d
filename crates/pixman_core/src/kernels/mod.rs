// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Specialized compositing kernels.
//!
//! Every kernel handles one `(operator, source, mask, destination)` combination and
//! relies on the fast-path matcher and the region walker for its preconditions: the
//! images have exactly the formats of its table entry, the rectangle is clipped and
//! non-empty, and no coordinate needs wrapping.

pub(crate) mod scalar;

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
pub(crate) mod avx2;
#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub(crate) mod neon;

use crate::fast_path::CompositeInfo;
use crate::format::{swap_rb, ChannelOrder, Format};
use crate::image::{BitsImage, Image};

fn bits(image: &Image) -> &BitsImage {
    match image.bits() {
        Some(bits) => bits,
        None => unreachable!("kernel called with a non-bits image"),
    }
}

fn bits_mut(image: &mut Image) -> &mut BitsImage {
    match image.bits_mut() {
        Some(bits) => bits,
        None => unreachable!("kernel called with a non-bits destination"),
    }
}

fn mask_of<'a>(info: &CompositeInfo<'a>) -> &'a Image {
    match info.mask {
        Some(mask) => mask,
        None => unreachable!("kernel called without a mask"),
    }
}

/// The solid color of an image in the channel order of `format`.
pub(crate) fn solid_in(image: &Image, format: Format) -> u32 {
    let color = image.solid_color().unwrap_or(0);

    match format.order() {
        ChannelOrder::Abgr => swap_rb(color),
        _ => color,
    }
}

/// The format of the destination bits.
pub(crate) fn dest_format(info: &CompositeInfo<'_>) -> Format {
    bits(info.dest).format()
}

/// The solid alpha of the mask, for kernels with a solid mask.
pub(crate) fn solid_mask_alpha(info: &CompositeInfo<'_>) -> u32 {
    mask_of(info).solid_color().unwrap_or(0) >> 24
}

/// Call `f` with every destination row of the rectangle.
pub(crate) fn for_each_dest_row<D: bytemuck::Pod>(
    info: &mut CompositeInfo<'_>,
    mut f: impl FnMut(&mut [D]),
) {
    let (x, w) = (info.dest_x as usize, info.width as usize);
    let dest = bits_mut(info.dest);

    for y in info.dest_y..info.dest_y + info.height {
        f(&mut dest.row_as_mut::<D>(y)[x..x + w]);
    }
}

/// Call `f` with every destination row of the rectangle and the matching source row.
pub(crate) fn for_each_row<S: bytemuck::Pod, D: bytemuck::Pod>(
    info: &mut CompositeInfo<'_>,
    mut f: impl FnMut(&mut [D], &[S]),
) {
    let w = info.width as usize;
    let (sx, dx) = (info.src_x as usize, info.dest_x as usize);
    let src = bits(info.src);
    let dest = bits_mut(info.dest);

    for row in 0..info.height {
        let s = &src.row_as::<S>(info.src_y + row)[sx..sx + w];
        f(&mut dest.row_as_mut::<D>(info.dest_y + row)[dx..dx + w], s);
    }
}

/// Call `f` with every destination row of the rectangle and the matching mask row.
pub(crate) fn for_each_masked_dest_row<M: bytemuck::Pod, D: bytemuck::Pod>(
    info: &mut CompositeInfo<'_>,
    mut f: impl FnMut(&mut [D], &[M]),
) {
    let w = info.width as usize;
    let (mx, dx) = (info.mask_x as usize, info.dest_x as usize);
    let mask = bits(mask_of(info));
    let dest = bits_mut(info.dest);

    for row in 0..info.height {
        let m = &mask.row_as::<M>(info.mask_y + row)[mx..mx + w];
        f(&mut dest.row_as_mut::<D>(info.dest_y + row)[dx..dx + w], m);
    }
}

/// Call `f` with every destination row of the rectangle and the matching source and
/// mask rows.
pub(crate) fn for_each_masked_row<S: bytemuck::Pod, M: bytemuck::Pod, D: bytemuck::Pod>(
    info: &mut CompositeInfo<'_>,
    mut f: impl FnMut(&mut [D], &[S], &[M]),
) {
    let w = info.width as usize;
    let (sx, mx, dx) = (
        info.src_x as usize,
        info.mask_x as usize,
        info.dest_x as usize,
    );
    let src = bits(info.src);
    let mask = bits(mask_of(info));
    let dest = bits_mut(info.dest);

    for row in 0..info.height {
        let s = &src.row_as::<S>(info.src_y + row)[sx..sx + w];
        let m = &mask.row_as::<M>(info.mask_y + row)[mx..mx + w];
        f(&mut dest.row_as_mut::<D>(info.dest_y + row)[dx..dx + w], s, m);
    }
}
