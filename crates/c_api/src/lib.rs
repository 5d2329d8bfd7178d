// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

use pixman_core::{
    Color, Format, Image, LineFixed, Operator, PointFixed, Region, Repeat, Trapezoid,
};
use std::ptr;

pub struct pc_image(Image);

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub enum pc_format {
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

impl From<pc_format> for Format {
    fn from(value: pc_format) -> Self {
        match value {
            pc_format::A8R8G8B8 => Format::A8R8G8B8,
            pc_format::X8R8G8B8 => Format::X8R8G8B8,
            pc_format::A8B8G8R8 => Format::A8B8G8R8,
            pc_format::X8B8G8R8 => Format::X8B8G8R8,
            pc_format::B8G8R8A8 => Format::B8G8R8A8,
            pc_format::B8G8R8X8 => Format::B8G8R8X8,
            pc_format::A2R10G10B10 => Format::A2R10G10B10,
            pc_format::X2R10G10B10 => Format::X2R10G10B10,
            pc_format::A2B10G10R10 => Format::A2B10G10R10,
            pc_format::X2B10G10R10 => Format::X2B10G10R10,
            pc_format::R8G8B8 => Format::R8G8B8,
            pc_format::B8G8R8 => Format::B8G8R8,
            pc_format::R5G6B5 => Format::R5G6B5,
            pc_format::B5G6R5 => Format::B5G6R5,
            pc_format::A1R5G5B5 => Format::A1R5G5B5,
            pc_format::X1R5G5B5 => Format::X1R5G5B5,
            pc_format::A4R4G4B4 => Format::A4R4G4B4,
            pc_format::X4R4G4B4 => Format::X4R4G4B4,
            pc_format::A8 => Format::A8,
            pc_format::A4 => Format::A4,
            pc_format::A1 => Format::A1,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub enum pc_op {
    Clear,
    Src,
    Dst,
    Over,
    OverReverse,
    In,
    InReverse,
    Out,
    OutReverse,
    Atop,
    AtopReverse,
    Xor,
    Add,
    Saturate,
}

impl From<pc_op> for Operator {
    fn from(value: pc_op) -> Self {
        match value {
            pc_op::Clear => Operator::Clear,
            pc_op::Src => Operator::Src,
            pc_op::Dst => Operator::Dst,
            pc_op::Over => Operator::Over,
            pc_op::OverReverse => Operator::OverReverse,
            pc_op::In => Operator::In,
            pc_op::InReverse => Operator::InReverse,
            pc_op::Out => Operator::Out,
            pc_op::OutReverse => Operator::OutReverse,
            pc_op::Atop => Operator::Atop,
            pc_op::AtopReverse => Operator::AtopReverse,
            pc_op::Xor => Operator::Xor,
            pc_op::Add => Operator::Add,
            pc_op::Saturate => Operator::Saturate,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub enum pc_repeat {
    None,
    Normal,
    Pad,
    Reflect,
}

impl From<pc_repeat> for Repeat {
    fn from(value: pc_repeat) -> Self {
        match value {
            pc_repeat::None => Repeat::None,
            pc_repeat::Normal => Repeat::Normal,
            pc_repeat::Pad => Repeat::Pad,
            pc_repeat::Reflect => Repeat::Reflect,
        }
    }
}

/// A 16.16 fixed-point point.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct pc_point {
    pub x: i32,
    pub y: i32,
}

impl From<pc_point> for PointFixed {
    fn from(value: pc_point) -> Self {
        PointFixed::new(value.x, value.y)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct pc_line {
    pub p1: pc_point,
    pub p2: pc_point,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct pc_trapezoid {
    pub top: i32,
    pub bottom: i32,
    pub left: pc_line,
    pub right: pc_line,
}

impl From<pc_trapezoid> for Trapezoid {
    fn from(value: pc_trapezoid) -> Self {
        let line = |l: pc_line| LineFixed::new(l.p1.into(), l.p2.into());

        Trapezoid {
            top: value.top,
            bottom: value.bottom,
            left: line(value.left),
            right: line(value.right),
        }
    }
}

unsafe fn trapezoids(traps: *const pc_trapezoid, n: usize) -> Vec<Trapezoid> {
    if traps.is_null() || n == 0 {
        return vec![];
    }

    std::slice::from_raw_parts(traps, n)
        .iter()
        .map(|t| (*t).into())
        .collect()
}

/// Create a zero-initialized bits image. Returns null for invalid sizes.
#[no_mangle]
pub extern "C" fn pc_image_create_bits(
    format: pc_format,
    width: i32,
    height: i32,
) -> *mut pc_image {
    match Image::new_bits(format.into(), width, height) {
        Ok(image) => Box::into_raw(Box::new(pc_image(image))),
        Err(_) => ptr::null_mut(),
    }
}

/// Create a solid image from a premultiplied `0xAARRGGBB` color.
#[no_mangle]
pub extern "C" fn pc_image_create_solid(argb: u32) -> *mut pc_image {
    Box::into_raw(Box::new(pc_image(Image::solid(Color::from_argb32(argb)))))
}

#[no_mangle]
pub unsafe extern "C" fn pc_image_destroy(image: *mut pc_image) {
    if !image.is_null() {
        let _ = Box::from_raw(image);
    }
}

/// The pixel storage of a bits image, or null for other images.
#[no_mangle]
pub unsafe extern "C" fn pc_image_data(image: *mut pc_image) -> *mut u32 {
    match (*image).0.data_mut() {
        [] => ptr::null_mut(),
        data => data.as_mut_ptr(),
    }
}

/// The distance between rows in bytes.
#[no_mangle]
pub unsafe extern "C" fn pc_image_stride(image: *const pc_image) -> usize {
    (*image).0.stride()
}

#[no_mangle]
pub unsafe extern "C" fn pc_image_set_repeat(image: *mut pc_image, repeat: pc_repeat) {
    (*image).0.set_repeat(repeat.into());
}

#[no_mangle]
pub unsafe extern "C" fn pc_image_set_clip_rect(
    image: *mut pc_image,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) {
    (*image)
        .0
        .set_clip_region(Some(Region::from_rect(x, y, width, height)));
}

#[no_mangle]
pub unsafe extern "C" fn pc_image_reset_clip(image: *mut pc_image) {
    (*image).0.set_clip_region(None);
}

/// Composite `src` through the optional `mask` onto `dest`. Requests where the
/// destination is also the source or the mask are ignored.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn pc_composite(
    op: pc_op,
    src: *const pc_image,
    mask: *const pc_image,
    dest: *mut pc_image,
    src_x: i32,
    src_y: i32,
    mask_x: i32,
    mask_y: i32,
    dest_x: i32,
    dest_y: i32,
    width: i32,
    height: i32,
) {
    if ptr::eq(src, dest) || ptr::eq(mask, dest) {
        return;
    }

    let mask = mask.as_ref().map(|m| &m.0);
    pixman_core::composite(
        op.into(),
        &(*src).0,
        mask,
        &mut (*dest).0,
        src_x,
        src_y,
        mask_x,
        mask_y,
        dest_x,
        dest_y,
        width,
        height,
    );
}

/// Fill a rectangle with a raw pixel value in the image's format.
#[no_mangle]
pub unsafe extern "C" fn pc_fill(
    image: *mut pc_image,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    filler: u32,
) -> bool {
    pixman_core::fill(&mut (*image).0, x, y, width, height, filler)
}

/// Add the coverage of `n` trapezoids to an alpha image. Returns false if the image
/// is not an alpha image the rasterizer supports.
#[no_mangle]
pub unsafe extern "C" fn pc_rasterize_trapezoids(
    image: *mut pc_image,
    traps: *const pc_trapezoid,
    n: usize,
    x_off: i32,
    y_off: i32,
) -> bool {
    let traps = trapezoids(traps, n);

    traps
        .iter()
        .try_for_each(|t| pixman_core::rasterize_trapezoid(&mut (*image).0, t, x_off, y_off))
        .is_ok()
}

#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn pc_composite_trapezoids(
    op: pc_op,
    src: *const pc_image,
    dest: *mut pc_image,
    mask_format: pc_format,
    x_src: i32,
    y_src: i32,
    x_dst: i32,
    y_dst: i32,
    traps: *const pc_trapezoid,
    n: usize,
) {
    if ptr::eq(src, dest) {
        return;
    }

    pixman_core::composite_trapezoids(
        op.into(),
        &(*src).0,
        &mut (*dest).0,
        mask_format.into(),
        x_src,
        y_src,
        x_dst,
        y_dst,
        &trapezoids(traps, n),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_through_the_c_surface() {
        unsafe {
            let dest = pc_image_create_bits(pc_format::A8R8G8B8, 4, 4);
            let src = pc_image_create_solid(0xff00_ff00);
            assert!(!dest.is_null());

            pc_composite(
                pc_op::Over,
                src,
                ptr::null(),
                dest,
                0,
                0,
                0,
                0,
                1,
                1,
                2,
                2,
            );

            let stride = pc_image_stride(dest) / 4;
            let data = std::slice::from_raw_parts(pc_image_data(dest), stride * 4);
            assert_eq!(data[stride + 1], 0xff00_ff00);
            assert_eq!(data[0], 0);

            assert!(pc_fill(dest, 0, 0, 1, 1, 0x1234_5678));
            assert_eq!(*pc_image_data(dest), 0x1234_5678);

            pc_image_destroy(src);
            pc_image_destroy(dest);
        }
    }

    #[test]
    fn invalid_sizes_give_null() {
        assert!(pc_image_create_bits(pc_format::A8, 0, 4).is_null());
    }

    #[test]
    fn rasterize_rejects_color_images() {
        let one = 1 << 16;
        let trap = pc_trapezoid {
            top: 0,
            bottom: one,
            left: pc_line {
                p1: pc_point { x: 0, y: 0 },
                p2: pc_point { x: 0, y: one },
            },
            right: pc_line {
                p1: pc_point { x: one, y: 0 },
                p2: pc_point { x: one, y: one },
            },
        };

        unsafe {
            let alpha = pc_image_create_bits(pc_format::A8, 2, 2);
            let color = pc_image_create_bits(pc_format::R5G6B5, 2, 2);

            assert!(pc_rasterize_trapezoids(alpha, &trap, 1, 0, 0));
            assert!(!pc_rasterize_trapezoids(color, &trap, 1, 0, 0));
            assert_eq!(*pc_image_data(alpha) & 0xff, 0xff);

            pc_image_destroy(alpha);
            pc_image_destroy(color);
        }
    }
}
