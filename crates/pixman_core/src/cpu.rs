// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU capability queries. Each capability is probed once and then remembered.

use once_cell::sync::Lazy;

/// Whether the CPU supports AVX2.
pub fn have_avx2() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        static AVX2: Lazy<bool> = Lazy::new(|| std::arch::is_x86_feature_detected!("avx2"));
        *AVX2
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Whether the CPU supports NEON.
pub fn have_neon() -> bool {
    #[cfg(target_arch = "aarch64")]
    {
        static NEON: Lazy<bool> = Lazy::new(|| std::arch::is_aarch64_feature_detected!("neon"));
        *NEON
    }

    #[cfg(not(target_arch = "aarch64"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_are_stable() {
        assert_eq!(have_avx2(), have_avx2());
        assert_eq!(have_neon(), have_neon());
        assert!(!(have_avx2() && have_neon()));
    }
}
