// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! AVX2 fast paths.
//!
//! The table is only installed by the AVX2 link of the implementation chain, which is
//! only built when the CPU supports `avx2`.

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
            // SAFETY: The table is only used when the CPU supports avx2.
            unsafe { rows::over_n(dest, src) }
        }
    });
}

fn over_8888_8888(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports avx2.
    for_each_row::<u32, u32>(info, |dest, src| unsafe { rows::over(dest, src) });
}

fn add_8888_8888(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports avx2.
    for_each_row::<u32, u32>(info, |dest, src| unsafe { rows::add(dest, src) });
}

fn add_8_8(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports avx2.
    for_each_row::<u8, u8>(info, |dest, src| unsafe { rows::add_bytes(dest, src) });
}

fn src_x888_8888(info: &mut CompositeInfo<'_>) {
    // SAFETY: The table is only used when the CPU supports avx2.
    for_each_row::<u32, u32>(info, |dest, src| unsafe { rows::src_x888(dest, src) });
}

/// Row kernels. Each one runs eight pixels at a time and finishes the row by running
/// the same vector code on a zero-padded copy of the remaining pixels.
pub(crate) mod rows {
    use crate::util::avx2::{load, load_bytes, over as over_x8, store, store_bytes};
    use std::arch::x86_64::*;

    const LANES: usize = 8;

    fn padded<T: Copy + Default, const N: usize>(x: &[T]) -> [T; N] {
        let mut buf = [T::default(); N];
        buf[..x.len()].copy_from_slice(x);
        buf
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn over_n(dest: &mut [u32], src: u32) {
        let s = _mm256_set1_epi32(src as i32);
        let mut chunks = dest.chunks_exact_mut(LANES);

        for d in &mut chunks {
            store(d, over_x8(s, load(d)));
        }

        let tail = chunks.into_remainder();
        if !tail.is_empty() {
            let mut d = padded::<u32, LANES>(tail);
            let v = over_x8(s, load(&d));
            store(&mut d, v);
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn over(dest: &mut [u32], src: &[u32]) {
        let mut d_chunks = dest.chunks_exact_mut(LANES);
        let mut s_chunks = src.chunks_exact(LANES);

        for (d, s) in (&mut d_chunks).zip(&mut s_chunks) {
            store(d, over_x8(load(s), load(d)));
        }

        let tail = d_chunks.into_remainder();
        if !tail.is_empty() {
            let s = padded::<u32, LANES>(s_chunks.remainder());
            let mut d = padded::<u32, LANES>(tail);
            let v = over_x8(load(&s), load(&d));
            store(&mut d, v);
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn add(dest: &mut [u32], src: &[u32]) {
        let mut d_chunks = dest.chunks_exact_mut(LANES);
        let mut s_chunks = src.chunks_exact(LANES);

        for (d, s) in (&mut d_chunks).zip(&mut s_chunks) {
            store(d, _mm256_adds_epu8(load(s), load(d)));
        }

        let tail = d_chunks.into_remainder();
        if !tail.is_empty() {
            let s = padded::<u32, LANES>(s_chunks.remainder());
            let mut d = padded::<u32, LANES>(tail);
            let v = _mm256_adds_epu8(load(&s), load(&d));
            store(&mut d, v);
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn add_bytes(dest: &mut [u8], src: &[u8]) {
        const BYTES: usize = 32;
        let mut d_chunks = dest.chunks_exact_mut(BYTES);
        let mut s_chunks = src.chunks_exact(BYTES);

        for (d, s) in (&mut d_chunks).zip(&mut s_chunks) {
            store_bytes(d, _mm256_adds_epu8(load_bytes(s), load_bytes(d)));
        }

        let tail = d_chunks.into_remainder();
        if !tail.is_empty() {
            let s = padded::<u8, BYTES>(s_chunks.remainder());
            let mut d = padded::<u8, BYTES>(tail);
            let v = _mm256_adds_epu8(load_bytes(&s), load_bytes(&d));
            store_bytes(&mut d, v);
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn src_x888(dest: &mut [u32], src: &[u32]) {
        let alpha = _mm256_set1_epi32(0xff00_0000_u32 as i32);
        let mut d_chunks = dest.chunks_exact_mut(LANES);
        let mut s_chunks = src.chunks_exact(LANES);

        for (d, s) in (&mut d_chunks).zip(&mut s_chunks) {
            store(d, _mm256_or_si256(load(s), alpha));
        }

        let tail = d_chunks.into_remainder();
        if !tail.is_empty() {
            let s = padded::<u32, LANES>(s_chunks.remainder());
            let mut d = [0; LANES];
            store(&mut d, _mm256_or_si256(load(&s), alpha));
            tail.copy_from_slice(&d[..tail.len()]);
        }
    }
}
