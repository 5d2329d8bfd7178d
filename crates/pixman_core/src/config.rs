// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime configuration of the implementation chain.

use log::warn;

/// The environment variable holding the space-separated list of disabled backends.
pub const DISABLE_VAR: &str = "PIXMAN_DISABLE";

/// Which backends may be used when building the implementation chain.
///
/// The general path can never be disabled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Skip the portable fast paths.
    pub disable_fast: bool,
    /// Skip the AVX2 fast paths.
    pub disable_avx2: bool,
    /// Skip the NEON fast paths.
    pub disable_neon: bool,
}

impl Config {
    /// Read the disable list from `PIXMAN_DISABLE`.
    pub fn from_env() -> Self {
        match std::env::var(DISABLE_VAR) {
            Ok(list) => Self::parse(&list),
            Err(_) => Self::default(),
        }
    }

    /// Parse a disable list such as `"fast avx2"`. Unknown names are ignored.
    pub fn parse(list: &str) -> Self {
        let mut config = Self::default();

        for name in list.split_whitespace() {
            match name {
                "fast" => config.disable_fast = true,
                "avx2" => config.disable_avx2 = true,
                "neon" | "arm-neon" => config.disable_neon = true,
                other => warn!("{DISABLE_VAR}: unknown backend `{other}`"),
            }
        }

        config
    }
}
