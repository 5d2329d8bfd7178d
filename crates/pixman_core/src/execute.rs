// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The implementation chain.
//!
//! An [`Implementation`] is an ordered list of backends. A composite is handed to the
//! first backend whose fast-path table has a matching entry, and to the general path
//! when none does. Fill and blit requests go down the chain the same way.

use crate::clip::compute_composite_region;
use crate::config::Config;
#[cfg(feature = "simd")]
use crate::cpu;
use crate::fast_path::{
    is_simple_destination, is_simple_source, lookup, CompositeInfo, FastPath, LookupKey,
};
use crate::general::general_composite_rect;
use crate::image::{Image, Repeat};
use crate::kernels::scalar;
use crate::operator::Operator;
use crate::region::Box32;
use crate::walk::walk_region;
use log::{debug, trace};
use once_cell::sync::OnceCell;

/// The execution mode used to build an implementation chain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Only use the general path. Every composite goes through scanline fetch, combine
    /// and store, which makes this the reference the other modes are checked against.
    General,
    /// Use the portable fast paths, then the general path. This is recommended if you
    /// want to avoid unsafe code, and gives identical results on every platform.
    Scalar,
    /// Select the best backends the host supports. This is the recommended option for
    /// highest performance.
    #[default]
    Auto,
    /// Force the usage of AVX2 instructions. This will lead to panics in case the CPU
    /// doesn't support AVX2.
    #[cfg(all(target_arch = "x86_64", feature = "simd"))]
    Avx2,
    /// Force the usage of NEON instructions. This will lead to panics in case the CPU
    /// doesn't support NEON.
    #[cfg(all(target_arch = "aarch64", feature = "simd"))]
    Neon,
}

/// One link of the implementation chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    /// AVX2 fast paths.
    #[cfg(all(target_arch = "x86_64", feature = "simd"))]
    Avx2,
    /// NEON fast paths.
    #[cfg(all(target_arch = "aarch64", feature = "simd"))]
    Neon,
    /// Portable fast paths, fill and blit.
    Fast,
    /// The general path, which handles everything.
    General,
}

impl Backend {
    fn fast_paths(self) -> &'static [FastPath] {
        match self {
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            Backend::Avx2 => crate::kernels::avx2::FAST_PATHS,
            #[cfg(all(target_arch = "aarch64", feature = "simd"))]
            Backend::Neon => crate::kernels::neon::FAST_PATHS,
            Backend::Fast => scalar::FAST_PATHS,
            Backend::General => &[],
        }
    }

    /// Whether this link handles fills and blits itself rather than delegating.
    fn has_raw_ops(self) -> bool {
        self == Backend::Fast
    }
}

macro_rules! avx2 {
    ($links:expr) => {
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        if cpu::have_avx2() {
            $links.push(Backend::Avx2);
        }
    };
}

macro_rules! neon {
    ($links:expr) => {
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        if cpu::have_neon() {
            $links.push(Backend::Neon);
        }
    };
}

/// An ordered chain of backends, ending with the general path.
#[derive(Clone, Debug)]
pub struct Implementation {
    links: Vec<Backend>,
}

impl Implementation {
    /// Build a chain for `mode`, honoring the disable list in `PIXMAN_DISABLE`.
    ///
    /// Panics when forcing an execution mode not supported by the current CPU.
    pub fn new(mode: ExecutionMode) -> Self {
        Self::with_config(mode, &Config::from_env())
    }

    /// NOTE: BE CAREFUL WHEN CHANGING THIS METHOD! A SIMD link must only be added when
    /// the CPU supports it. Unsafe code relies on the correctness of this method!
    pub fn with_config(mode: ExecutionMode, config: &Config) -> Self {
        let mut links = Vec::with_capacity(3);

        match mode {
            ExecutionMode::General => {}
            ExecutionMode::Scalar => {
                if !config.disable_fast {
                    links.push(Backend::Fast);
                }
            }
            ExecutionMode::Auto => {
                if !config.disable_neon {
                    neon!(links);
                }
                if !config.disable_avx2 {
                    avx2!(links);
                }
                if !config.disable_fast {
                    links.push(Backend::Fast);
                }
            }
            #[cfg(all(target_arch = "x86_64", feature = "simd"))]
            ExecutionMode::Avx2 => {
                avx2!(links);

                if links.is_empty() {
                    panic!(
                        "attempted to force execution mode AVX2, but CPU doesn't support AVX2 instructions"
                    );
                }
                links.push(Backend::Fast);
            }
            #[cfg(all(target_arch = "aarch64", feature = "simd"))]
            ExecutionMode::Neon => {
                neon!(links);

                if links.is_empty() {
                    panic!(
                        "attempted to force execution mode NEON, but CPU doesn't support NEON instructions"
                    );
                }
                links.push(Backend::Fast);
            }
        }

        links.push(Backend::General);
        debug!("implementation chain for {mode:?}: {links:?} ({config:?})");

        Self { links }
    }

    /// The backends of the chain, in the order they are tried.
    pub fn backends(&self) -> &[Backend] {
        &self.links
    }

    /// Composite a `width x height` rectangle of `src` (through `mask`) onto `dest`.
    ///
    /// Nothing happens when the clipped rectangle is empty or when the operator turns
    /// out to leave the destination unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn composite(
        &self,
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
        if dest.bits().is_none() {
            trace!("composite into a non-bits image skipped");
            return;
        }

        let Some(region) = compute_composite_region(
            src, mask, dest, src_x, src_y, mask_x, mask_y, dest_x, dest_y, width, height,
        ) else {
            trace!("composite with an empty region skipped");
            return;
        };

        let extents = region.extents();
        let samples = |x: i32, y: i32| {
            let (dx, dy) = (x - dest_x, y - dest_y);
            Box32::new(extents.x1 + dx, extents.y1 + dy, extents.x2 + dx, extents.y2 + dy)
        };
        let src_samples = samples(src_x, src_y);
        let mask_samples = samples(mask_x, mask_y);

        let src_opaque =
            src.is_opaque(src_samples) && mask.map_or(true, |m| m.is_opaque(mask_samples));
        let op = op.optimize(src_opaque, dest.is_opaque_destination());

        if op == Operator::Dst {
            trace!("composite reduced to a no-op");
            return;
        }

        let simple = is_simple_source(src, src_samples)
            && mask.map_or(true, |m| is_simple_source(m, mask_samples))
            && is_simple_destination(dest);
        let func = if simple {
            LookupKey::new(op, src, mask, dest, src_x, src_y, mask_x, mask_y).and_then(|key| {
                self.links
                    .iter()
                    .find_map(|link| lookup(link.fast_paths(), &key).map(|f| (*link, f)))
            })
        } else {
            None
        };

        let mut info = CompositeInfo {
            op,
            src,
            mask,
            dest,
            src_x,
            src_y,
            mask_x,
            mask_y,
            dest_x,
            dest_y,
            width,
            height,
        };

        match func {
            Some((link, func)) => {
                trace!("{op:?} handled by a {link:?} fast path");
                let tile_src = tiles(src);
                let tile_mask = mask.is_some_and(tiles);
                walk_region(&mut info, &region, tile_src, tile_mask, func);
            }
            None => walk_region(&mut info, &region, false, false, general_composite_rect),
        }
    }

    /// Fill a rectangle of a raw pixel buffer with `filler`, which is already encoded in
    /// the buffer's format. `stride` is in 32-bit words and `bpp` has to be 8, 16 or 32.
    /// Returns `false` if no backend could do it.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(
        &self,
        bits: &mut [u32],
        stride: usize,
        bpp: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        filler: u32,
    ) -> bool {
        self.links.iter().any(|link| {
            link.has_raw_ops() && scalar::fill(bits, stride, bpp, x, y, width, height, filler)
        })
    }

    /// Copy a rectangle between two raw pixel buffers of the same depth. Strides are in
    /// 32-bit words. Returns `false` if no backend could do it, in which case the caller
    /// has to fall back to compositing with [`Operator::Src`].
    #[allow(clippy::too_many_arguments)]
    pub fn blt(
        &self,
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
        self.links.iter().any(|link| {
            link.has_raw_ops()
                && scalar::blt(
                    src, dst, src_stride, dst_stride, src_bpp, dst_bpp, src_x, src_y, dest_x,
                    dest_y, width, height,
                )
        })
    }
}

/// Whether the walker has to split rectangles at the tile boundaries of `image`.
fn tiles(image: &Image) -> bool {
    image.repeat() == Repeat::Normal && !image.is_solid()
}

static GLOBAL: OnceCell<Implementation> = OnceCell::new();

/// The process-wide implementation, built on first use with [`ExecutionMode::Auto`].
pub fn global() -> &'static Implementation {
    GLOBAL.get_or_init(|| Implementation::new(ExecutionMode::default()))
}
