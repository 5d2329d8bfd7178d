// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by image constructors and setters.

use crate::format::Format;

/// An error that occurred while constructing an image.
///
/// Compositing itself never fails: empty or degenerate requests are silent no-ops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested image has a zero or negative extent.
    #[error("invalid image geometry {width}x{height}")]
    InvalidGeometry { width: i32, height: i32 },
    /// Computing the size of the pixel storage overflowed.
    #[error("image storage size overflows for {width}x{height} at {bpp} bits per pixel")]
    Overflow { width: i32, height: i32, bpp: u32 },
    /// The stride is not a whole number of 32-bit words or is too small for a row.
    #[error("invalid stride of {stride} bytes")]
    InvalidStride { stride: usize },
    /// The supplied pixel buffer cannot hold the image.
    #[error("buffer of {actual} words is too small, need {required}")]
    BufferTooSmall { required: usize, actual: usize },
    /// The convolution kernel does not match its declared size.
    #[error("convolution filter expects [width, height, weights...], got {len} values")]
    InvalidFilterParams { len: usize },
    /// The operation does not support the given format.
    #[error("format {0:?} is not supported here")]
    UnsupportedFormat(Format),
}
