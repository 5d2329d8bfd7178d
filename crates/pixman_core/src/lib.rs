// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A 2D compositing engine over packed pixel buffers.
//!
//! Images are bitmaps in one of many packed formats, solid colors or gradients. A
//! composite combines a rectangle of a source, optionally weighted by a mask, into a
//! destination bitmap with one of the Porter-Duff operators. Requests are clipped
//! against the images, then handed to the first backend of the [`Implementation`]
//! chain with a matching fast path, or to the general scanline path otherwise. Both
//! produce identical pixels.
//!
//! Antialiased coverage for trapezoids and triangles can be rasterized into alpha
//! images, or composited directly with [`composite_trapezoids`].

#![cfg_attr(not(feature = "simd"), forbid(unsafe_code))]

mod clip;
pub mod color;
mod combine;
pub mod config;
pub mod cpu;
pub mod edge;
pub mod error;
pub mod execute;
mod fast_path;
mod fetch;
pub mod format;
mod general;
pub mod image;
mod kernels;
pub mod math;
pub mod operator;
pub mod region;
pub mod transform;
pub mod trap;
#[cfg(feature = "simd")]
mod util;
mod walk;

pub use peniko::kurbo;

pub use color::Color;
pub use error::Error;
pub use execute::{global, Backend, ExecutionMode, Implementation};
pub use format::Format;
pub use image::{Filter, Image, Repeat};
pub use operator::Operator;
pub use region::{Box32, Region};
pub use transform::{Fixed, PointFixed, Transform};
pub use trap::{
    add_trapezoids, add_traps, add_triangles, rasterize_trapezoid, LineFixed, SpanFix, Trap,
    Trapezoid, Triangle,
};

/// Composite with the process-wide implementation. See [`Implementation::composite`].
#[allow(clippy::too_many_arguments)]
pub fn composite(
    op: Operator,
    src: &Image,
    mask: Option<&Image>,
    dest: &mut Image,
    src_x: i32,
    src_y: i32,
    mask_x: i32,
    mask_y: i32,
    dest_x: i32,
    dest_y: i32,
    width: i32,
    height: i32,
) {
    global().composite(
        op, src, mask, dest, src_x, src_y, mask_x, mask_y, dest_x, dest_y, width, height,
    );
}

/// Fill a rectangle of a bits image with a raw pixel value in the image's format.
///
/// Returns `false` if the image is not a bits image, its depth cannot be filled
/// directly, or the rectangle is outside of it.
pub fn fill(image: &mut Image, x: i32, y: i32, width: i32, height: i32, filler: u32) -> bool {
    let Some(bits) = image.bits_mut() else {
        return false;
    };
    let (stride, bpp) = (bits.rowstride, bits.format.bpp());

    global().fill(&mut bits.bits, stride, bpp, x, y, width, height, filler)
}

/// Copy a rectangle between two bits images of the same depth.
///
/// Returns `false` if the copy cannot be done directly, in which case a composite with
/// [`Operator::Src`] gives the same result.
#[allow(clippy::too_many_arguments)]
pub fn blt(
    src: &Image,
    dest: &mut Image,
    src_x: i32,
    src_y: i32,
    dest_x: i32,
    dest_y: i32,
    width: i32,
    height: i32,
) -> bool {
    let (Some(s), Some(d)) = (src.bits(), dest.bits_mut()) else {
        return false;
    };

    global().blt(
        &s.bits,
        &mut d.bits,
        s.rowstride,
        d.rowstride,
        s.format.bpp(),
        d.format.bpp(),
        src_x,
        src_y,
        dest_x,
        dest_y,
        width,
        height,
    )
}

/// Composite through trapezoids with the process-wide implementation. See
/// [`Implementation::composite_trapezoids`].
#[allow(clippy::too_many_arguments)]
pub fn composite_trapezoids(
    op: Operator,
    src: &Image,
    dest: &mut Image,
    mask_format: Format,
    x_src: i32,
    y_src: i32,
    x_dst: i32,
    y_dst: i32,
    traps: &[Trapezoid],
) {
    global().composite_trapezoids(op, src, dest, mask_format, x_src, y_src, x_dst, y_dst, traps);
}

/// Composite through triangles with the process-wide implementation. See
/// [`Implementation::composite_triangles`].
#[allow(clippy::too_many_arguments)]
pub fn composite_triangles(
    op: Operator,
    src: &Image,
    dest: &mut Image,
    mask_format: Format,
    x_src: i32,
    y_src: i32,
    x_dst: i32,
    y_dst: i32,
    triangles: &[Triangle],
) {
    global().composite_triangles(
        op,
        src,
        dest,
        mask_format,
        x_src,
        y_src,
        x_dst,
        y_dst,
        triangles,
    );
}
