// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! NEON fast paths.

use super::{dest_format, for_each_dest_row, for_each_row, solid_in};
use crate::fast_path::{fast_path, CompositeInfo, FastPath};

pub(crate) const FAST_PATHS: &[FastPath] = &[
    fast_path!(Over, solid, null, A8R8G8B8, over_n_8888),
    fast_path!(Over, solid, null, X8R8G8B8, over_n_8888),
    fast_path!(Over, solid, null, A8B8G8R8, over_n_8888),
    fast_path!(Over, solid, null, X8B8G8R8, over_n_8888),
    fast_path!(Over, A8R8G8B8, null, A8R8G8B8, over_8888_8888),
    fast_path!(Over, A8R8G8B8, null, X8R8G8B8, over_8888_8888),
    fast_path!(Over, A8B8G8R8, null, A8B8G8R8, over_8888_8888),
    fast_path!(Over, A8B8G8R8, null, X8B8G8R8, over_8888_8888),
    fast_path!(Add, A8R8G8B8, null, A8R8G8B8, add_8888_8888),
    fast_path!(Add, A8B8G8R8, null, A8B8G8R8, add_8888_8888),
    fast_path!(Add, A8, null, A8, add_8_8),
    fast_path!(Src, X8R8G8B8, null, A8R8G8B8, src_x888_8888),
    fast_path!(Src, X8B8G8R8, null, A8B8G8R8, src_x888_8888),
];

fn over_n_8888(info: &mut CompositeInfo<'_>) {
    let src = solid_in(info.src, dest_format(info));
    if src == 0 {
        return;
    }

    for_each_dest_row::<u32>(info, |dest| {
        if src >> 24 == 0xff {
            dest.fill(src);
        } else {
            // SAFETY: The table is only used when the CPU supports neon.
            unsafe { rows::over_n(dest, src) }
        }
    });
}

fn over_8888_8888(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports neon.
    for_each_row::<u32, u32>(info, |dest, src| unsafe { rows::over(dest, src) });
}

fn add_8888_8888(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports neon.
    for_each_row::<u32, u32>(info, |dest, src| unsafe {
        rows::add_bytes(bytemuck::cast_slice_mut(dest), bytemuck::cast_slice(src))
    });
}

fn add_8_8(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports neon.
    for_each_row::<u8, u8>(info, |dest, src| unsafe { rows::add_bytes(dest, src) });
}

fn src_x888_8888(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports neon.
    for_each_row::<u32, u32>(info, |dest, src| unsafe { rows::src_x888(dest, src) });
}

/// Row kernels, eight pixels (or sixteen bytes) at a time with a zero-padded copy for
/// the rest of the row.
pub(crate) mod rows {
    use crate::util::neon::{load_planes, over as over_x8, store_planes};
    use std::arch::aarch64::*;

    const LANES: usize = 8;

    fn padded<T: Copy + Default, const N: usize>(x: &[T]) -> [T; N] {
        let mut buf = [T::default(); N];
        buf[..x.len()].copy_from_slice(x);
        buf
    }

    /// SAFETY: The CPU needs to support the target feature `neon`.
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn over_n(dest: &mut [u32], src: u32) {
        let s = load_planes(&[src; LANES]);
        let mut chunks = dest.chunks_exact_mut(LANES);

        for d in &mut chunks {
            store_planes(d, over_x8(s, load_planes(d)));
        }

        let tail = chunks.into_remainder();
        if !tail.is_empty() {
            let mut d = padded::<u32, LANES>(tail);
            store_planes(&mut d, over_x8(s, load_planes(&d)));
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }

    /// SAFETY: The CPU needs to support the target feature `neon`.
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn over(dest: &mut [u32], src: &[u32]) {
        let mut d_chunks = dest.chunks_exact_mut(LANES);
        let mut s_chunks = src.chunks_exact(LANES);

        for (d, s) in (&mut d_chunks).zip(&mut s_chunks) {
            store_planes(d, over_x8(load_planes(s), load_planes(d)));
        }

        let tail = d_chunks.into_remainder();
        if !tail.is_empty() {
            let s = padded::<u32, LANES>(s_chunks.remainder());
            let mut d = padded::<u32, LANES>(tail);
            store_planes(&mut d, over_x8(load_planes(&s), load_planes(&d)));
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }

    /// SAFETY: The CPU needs to support the target feature `neon`.
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn add_bytes(dest: &mut [u8], src: &[u8]) {
        const BYTES: usize = 16;
        let mut d_chunks = dest.chunks_exact_mut(BYTES);
        let mut s_chunks = src.chunks_exact(BYTES);

        for (d, s) in (&mut d_chunks).zip(&mut s_chunks) {
            let sum = vqaddq_u8(vld1q_u8(s.as_ptr()), vld1q_u8(d.as_ptr()));
            vst1q_u8(d.as_mut_ptr(), sum);
        }

        let tail = d_chunks.into_remainder();
        if !tail.is_empty() {
            let s = padded::<u8, BYTES>(s_chunks.remainder());
            let mut d = padded::<u8, BYTES>(tail);
            let sum = vqaddq_u8(vld1q_u8(s.as_ptr()), vld1q_u8(d.as_ptr()));
            vst1q_u8(d.as_mut_ptr(), sum);
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }

    /// SAFETY: The CPU needs to support the target feature `neon`.
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn src_x888(dest: &mut [u32], src: &[u32]) {
        const QUAD: usize = 4;
        let alpha = vdupq_n_u32(0xff00_0000);
        let mut d_chunks = dest.chunks_exact_mut(QUAD);
        let mut s_chunks = src.chunks_exact(QUAD);

        for (d, s) in (&mut d_chunks).zip(&mut s_chunks) {
            vst1q_u32(d.as_mut_ptr(), vorrq_u32(vld1q_u32(s.as_ptr()), alpha));
        }

        let tail = d_chunks.into_remainder();
        if !tail.is_empty() {
            let s = padded::<u32, QUAD>(s_chunks.remainder());
            let mut d = [0; QUAD];
            vst1q_u32(d.as_mut_ptr(), vorrq_u32(vld1q_u32(s.as_ptr()), alpha));
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::rows;
    use crate::kernels::scalar;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pixels(rng: &mut StdRng, len: usize) -> Vec<u32> {
        (0..len)
            .map(|_| match rng.gen_range(0..4) {
                0 => 0,
                1 => rng.gen::<u32>() | 0xff00_0000,
                _ => rng.gen(),
            })
            .collect()
    }

    #[test]
    fn vector_and_scalar_rows_agree_at_every_width() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            return;
        }

        let mut rng = StdRng::seed_from_u64(9);

        for width in (0..=9).chain([16, 17, 31, 40]) {
            let src = pixels(&mut rng, width);
            let dest = pixels(&mut rng, width);

            let (mut a, mut b) = (dest.clone(), dest.clone());
            scalar::over_8888_row(&mut a, &src);
            unsafe { rows::over(&mut b, &src) };
            assert_eq!(a, b, "over, width {width}");

            let (mut a, mut b) = (dest.clone(), dest.clone());
            scalar::src_x888_row(&mut a, &src);
            unsafe { rows::src_x888(&mut b, &src) };
            assert_eq!(a, b, "src_x888, width {width}");

            let color = rng.gen::<u32>() & 0xfeff_ffff;
            let (mut a, mut b) = (dest.clone(), dest.clone());
            scalar::over_n_row(&mut a, color);
            unsafe { rows::over_n(&mut b, color) };
            assert_eq!(a, b, "over_n, width {width}");

            let src: Vec<u8> = (0..width * 4).map(|_| rng.gen()).collect();
            let dest: Vec<u8> = (0..width * 4).map(|_| rng.gen()).collect();
            let (mut a, mut b) = (dest.clone(), dest);
            scalar::add_8_row(&mut a, &src);
            unsafe { rows::add_bytes(&mut b, &src) };
            assert_eq!(a, b, "add_8, width {}", width * 4);
        }
    }
}
