// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lane helpers shared by the SIMD kernels.
//!
//! All of them round exactly like [`crate::math::mul_un8`], so vector kernels agree
//! with the scalar ones bit for bit.

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
pub(crate) mod avx2 {
    use std::arch::x86_64::*;

    /// Load eight pixels.
    ///
    /// SAFETY: The CPU needs to support the target feature `avx2`, and `x` must hold
    /// at least eight elements.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn load(x: &[u32]) -> __m256i {
        debug_assert!(x.len() >= 8);
        _mm256_loadu_si256(x.as_ptr() as *const __m256i)
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`, and `x` must hold
    /// at least eight elements.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn store(x: &mut [u32], v: __m256i) {
        debug_assert!(x.len() >= 8);
        _mm256_storeu_si256(x.as_mut_ptr() as *mut __m256i, v);
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`, and `x` must hold
    /// at least 32 bytes.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn load_bytes(x: &[u8]) -> __m256i {
        debug_assert!(x.len() >= 32);
        _mm256_loadu_si256(x.as_ptr() as *const __m256i)
    }

    /// SAFETY: The CPU needs to support the target feature `avx2`, and `x` must hold
    /// at least 32 bytes.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn store_bytes(x: &mut [u8], v: __m256i) {
        debug_assert!(x.len() >= 32);
        _mm256_storeu_si256(x.as_mut_ptr() as *mut __m256i, v);
    }

    /// `x * y / 255` on 16-bit lanes holding 8-bit values.
    ///
    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn mul_un8(x: __m256i, y: __m256i) -> __m256i {
        let t = _mm256_add_epi16(_mm256_mullo_epi16(x, y), _mm256_set1_epi16(0x80));
        _mm256_srli_epi16::<8>(_mm256_add_epi16(t, _mm256_srli_epi16::<8>(t)))
    }

    /// Copy the alpha of every unpacked pixel into its four lanes.
    ///
    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn splat_alpha(x: __m256i) -> __m256i {
        _mm256_shufflehi_epi16::<0xff>(_mm256_shufflelo_epi16::<0xff>(x))
    }

    /// `src + dst * (1 - αs)` for eight packed pixels.
    ///
    /// SAFETY: The CPU needs to support the target feature `avx2`.
    #[inline]
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn over(src: __m256i, dst: __m256i) -> __m256i {
        let zero = _mm256_setzero_si256();
        let max = _mm256_set1_epi16(0xff);

        let inv_lo = _mm256_sub_epi16(max, splat_alpha(_mm256_unpacklo_epi8(src, zero)));
        let inv_hi = _mm256_sub_epi16(max, splat_alpha(_mm256_unpackhi_epi8(src, zero)));
        let lo = mul_un8(_mm256_unpacklo_epi8(dst, zero), inv_lo);
        let hi = mul_un8(_mm256_unpackhi_epi8(dst, zero), inv_hi);

        _mm256_adds_epu8(_mm256_packus_epi16(lo, hi), src)
    }
}

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub(crate) mod neon {
    use std::arch::aarch64::*;

    /// `x * y / 255` for eight 8-bit lanes.
    ///
    /// SAFETY: The CPU needs to support the target feature `neon`.
    #[inline]
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn mul_un8(x: uint8x8_t, y: uint8x8_t) -> uint8x8_t {
        let t = vaddq_u16(vmull_u8(x, y), vdupq_n_u16(0x80));
        vshrn_n_u16::<8>(vaddq_u16(t, vshrq_n_u16::<8>(t)))
    }

    /// `src + dst * (1 - αs)` for eight pixels split into channel planes.
    ///
    /// SAFETY: The CPU needs to support the target feature `neon`.
    #[inline]
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn over(src: uint8x8x4_t, dst: uint8x8x4_t) -> uint8x8x4_t {
        let inv = vmvn_u8(src.3);

        uint8x8x4_t(
            vqadd_u8(mul_un8(dst.0, inv), src.0),
            vqadd_u8(mul_un8(dst.1, inv), src.1),
            vqadd_u8(mul_un8(dst.2, inv), src.2),
            vqadd_u8(mul_un8(dst.3, inv), src.3),
        )
    }

    /// Load eight pixels as channel planes.
    ///
    /// SAFETY: The CPU needs to support the target feature `neon`, and `x` must hold
    /// at least eight elements.
    #[inline]
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn load_planes(x: &[u32]) -> uint8x8x4_t {
        debug_assert!(x.len() >= 8);
        vld4_u8(x.as_ptr() as *const u8)
    }

    /// SAFETY: The CPU needs to support the target feature `neon`, and `x` must hold
    /// at least eight elements.
    #[inline]
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn store_planes(x: &mut [u32], v: uint8x8x4_t) {
        debug_assert!(x.len() >= 8);
        vst4_u8(x.as_mut_ptr() as *mut u8, v);
    }
}
