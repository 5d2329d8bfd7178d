// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scanline fetch and store for every image kind.
//!
//! Fetching produces premultiplied `0xAARRGGBB` (or `0xAAAA_RRRR_GGGG_BBBB`) pixels for
//! a horizontal span in the image's own coordinate space, applying the repeat mode,
//! the transform and filter, and the alpha map. Storing is the inverse for bits images.

use crate::image::{AlphaMap, BitsImage, Common, Filter, Image, ImageKind};
use crate::math::{expand_to_wide, un8x4_join, un8x4_split};
use crate::transform::{fixed_frac, fixed_to_int, int_to_fixed, PointFixed, FIXED_E, FIXED_HALF};

/// Fetch `out.len()` pixels of row `y` starting at `x`.
pub(crate) fn fetch_scanline(image: &Image, x: i32, y: i32, out: &mut [u32]) {
    let common = &image.common;

    match &image.kind {
        ImageKind::Solid(s) => out.fill(s.argb32),
        ImageKind::Bits(bits) => {
            if common.is_untransformed() {
                fetch_untransformed(bits, common, x, y, out);
            } else {
                fetch_transformed(bits, common, x, y, out);
            }

            if let Some(alpha_map) = &common.alpha_map {
                merge_alpha(alpha_map, x, y, out);
            }
        }
        ImageKind::Linear(g) => g.fetch_scanline(common, x, y, out),
        ImageKind::Radial(g) => g.fetch_scanline(common, x, y, out),
        ImageKind::Conical(g) => g.fetch_scanline(common, x, y, out),
    }
}

/// Fetch in the 16-bit pipeline. Untransformed bits images are decoded at full
/// precision; everything else is fetched narrow and widened.
pub(crate) fn fetch_scanline_wide(image: &Image, x: i32, y: i32, out: &mut [u64]) {
    let common = &image.common;

    match &image.kind {
        ImageKind::Solid(s) => out.fill(s.argb64),
        ImageKind::Bits(bits) if common.is_untransformed() && common.alpha_map.is_none() => {
            let accessors = common.accessors.as_ref();
            let Some(sy) = common.repeat.apply(y, bits.height) else {
                out.fill(0);
                return;
            };

            for (i, o) in out.iter_mut().enumerate() {
                *o = common
                    .repeat
                    .apply(x + i as i32, bits.width)
                    .map_or(0, |sx| bits.fetch_pixel_wide(sx, sy, accessors));
            }
        }
        _ => {
            let mut narrow = vec![0u32; out.len()];
            fetch_scanline(image, x, y, &mut narrow);

            for (o, n) in out.iter_mut().zip(narrow) {
                *o = expand_to_wide(n);
            }
        }
    }
}

fn fetch_untransformed(bits: &BitsImage, common: &Common, x: i32, y: i32, out: &mut [u32]) {
    let accessors = common.accessors.as_ref();
    let width = out.len() as i32;

    let Some(sy) = common.repeat.apply(y, bits.height) else {
        out.fill(0);
        return;
    };

    if x >= 0 && x + width <= bits.width {
        bits.fetch_scanline(x, sy, out, accessors);
        return;
    }

    for (i, o) in out.iter_mut().enumerate() {
        *o = common
            .repeat
            .apply(x + i as i32, bits.width)
            .map_or(0, |sx| bits.fetch_pixel(sx, sy, accessors));
    }
}

/// The pixel at `(x, y)` after the repeat mode, transparent when it falls outside.
#[inline]
fn sample(bits: &BitsImage, common: &Common, x: i32, y: i32) -> u32 {
    match (
        common.repeat.apply(x, bits.width),
        common.repeat.apply(y, bits.height),
    ) {
        (Some(x), Some(y)) => bits.fetch_pixel(x, y, common.accessors.as_ref()),
        _ => 0,
    }
}

fn fetch_transformed(bits: &BitsImage, common: &Common, x: i32, y: i32, out: &mut [u32]) {
    let transform = common.transform.unwrap_or_default();
    let filter = common.filter.resolve();

    for (i, o) in out.iter_mut().enumerate() {
        let center = PointFixed::new(
            int_to_fixed(x + i as i32) + FIXED_HALF,
            int_to_fixed(y) + FIXED_HALF,
        );

        let Some(p) = transform.transform_point(center) else {
            *o = 0;
            continue;
        };

        *o = match filter {
            Filter::Nearest => sample(
                bits,
                common,
                fixed_to_int(p.x - FIXED_E),
                fixed_to_int(p.y - FIXED_E),
            ),
            Filter::Convolution => convolve(bits, common, p),
            _ => bilinear(bits, common, p),
        };
    }
}

fn bilinear(bits: &BitsImage, common: &Common, p: PointFixed) -> u32 {
    let (u, v) = (p.x - FIXED_HALF, p.y - FIXED_HALF);
    let (x1, y1) = (fixed_to_int(u), fixed_to_int(v));
    let distx = (fixed_frac(u) >> 9) as u32;
    let disty = (fixed_frac(v) >> 9) as u32;

    let tl = un8x4_split(sample(bits, common, x1, y1));
    let tr = un8x4_split(sample(bits, common, x1 + 1, y1));
    let bl = un8x4_split(sample(bits, common, x1, y1 + 1));
    let br = un8x4_split(sample(bits, common, x1 + 1, y1 + 1));

    let distxy = distx * disty;
    let w_tl = (128 - distx) * 128 - 128 * disty + distxy;
    let w_tr = distx * 128 - distxy;
    let w_bl = disty * 128 - distxy;
    let w_br = distxy;

    un8x4_join(
        [0, 1, 2, 3].map(|c| (tl[c] * w_tl + tr[c] * w_tr + bl[c] * w_bl + br[c] * w_br) >> 14),
    )
}

fn convolve(bits: &BitsImage, common: &Common, p: PointFixed) -> u32 {
    let params = &common.filter_params;
    let (cw, ch) = (params[0], params[1]);
    let (width, height) = (fixed_to_int(cw), fixed_to_int(ch));

    let x1 = fixed_to_int(p.x - FIXED_E - ((cw - int_to_fixed(1)) >> 1));
    let y1 = fixed_to_int(p.y - FIXED_E - ((ch - int_to_fixed(1)) >> 1));

    let mut sums = [0i64; 4];
    let mut weights = params[2..].iter();

    for j in 0..height {
        for i in 0..width {
            let f = weights.next().copied().unwrap_or(0) as i64;
            if f == 0 {
                continue;
            }

            let px = un8x4_split(sample(bits, common, x1 + i, y1 + j));
            for c in 0..4 {
                sums[c] += px[c] as i64 * f;
            }
        }
    }

    un8x4_join(sums.map(|s| ((s + 0x8000) >> 16).clamp(0, 0xff) as u32))
}

/// Replace the alpha of every pixel by the alpha map's, transparent outside the map.
fn merge_alpha(alpha_map: &AlphaMap, x: i32, y: i32, out: &mut [u32]) {
    let Some(map) = alpha_map.image.bits() else {
        return;
    };
    let accessors = alpha_map.image.common.accessors.as_ref();
    let ay = y - alpha_map.origin_y as i32;

    for (i, o) in out.iter_mut().enumerate() {
        let ax = x + i as i32 - alpha_map.origin_x as i32;
        let a = if ax >= 0 && ax < map.width && ay >= 0 && ay < map.height {
            map.fetch_pixel(ax, ay, accessors) >> 24
        } else {
            0
        };

        *o = (*o & 0x00ff_ffff) | (a << 24);
    }
}

/// Read back destination pixels. Destinations are sampled without transform or
/// repeat, the span must be inside the image.
pub(crate) fn fetch_dest_scanline(image: &Image, x: i32, y: i32, out: &mut [u32]) {
    let ImageKind::Bits(bits) = &image.kind else {
        unreachable!("only bits images can be written");
    };

    bits.fetch_scanline(x, y, out, image.common.accessors.as_ref());

    if let Some(alpha_map) = &image.common.alpha_map {
        merge_alpha(alpha_map, x, y, out);
    }
}

pub(crate) fn fetch_dest_scanline_wide(image: &Image, x: i32, y: i32, out: &mut [u64]) {
    let ImageKind::Bits(bits) = &image.kind else {
        unreachable!("only bits images can be written");
    };

    bits.fetch_scanline_wide(x, y, out, image.common.accessors.as_ref());

    if let Some(alpha_map) = &image.common.alpha_map {
        let mut alphas = vec![0u32; out.len()];
        merge_alpha(alpha_map, x, y, &mut alphas);

        for (o, a) in out.iter_mut().zip(alphas) {
            *o = (*o & 0x0000_ffff_ffff_ffff) | (((a >> 24) as u64 * 0x101) << 48);
        }
    }
}

/// Store `values` into row `y` starting at `x`. The span must be inside the image.
pub(crate) fn store_scanline(image: &mut Image, x: i32, y: i32, values: &[u32]) {
    let common = &mut image.common;
    let ImageKind::Bits(bits) = &mut image.kind else {
        unreachable!("only bits images can be written");
    };

    bits.store_scanline(x, y, values, common.accessors.as_ref());

    if let Some(alpha_map) = &mut common.alpha_map {
        store_alpha(alpha_map, x, y, values.iter().map(|v| v & 0xff00_0000));
    }
}

pub(crate) fn store_scanline_wide(image: &mut Image, x: i32, y: i32, values: &[u64]) {
    let common = &mut image.common;
    let ImageKind::Bits(bits) = &mut image.kind else {
        unreachable!("only bits images can be written");
    };

    bits.store_scanline_wide(x, y, values, common.accessors.as_ref());

    if let Some(alpha_map) = &mut common.alpha_map {
        store_alpha(
            alpha_map,
            x,
            y,
            values.iter().map(|v| ((v >> 56) as u32) << 24),
        );
    }
}

/// Write the alpha of each pixel into the alpha map, skipping pixels outside it.
fn store_alpha(alpha_map: &mut AlphaMap, x: i32, y: i32, alphas: impl Iterator<Item = u32>) {
    let accessors = alpha_map.image.common.accessors;
    let (ox, oy) = (alpha_map.origin_x as i32, alpha_map.origin_y as i32);
    let Some(map) = alpha_map.image.bits_mut() else {
        return;
    };

    let ay = y - oy;
    if ay < 0 || ay >= map.height {
        return;
    }

    let layout = map.format.layout();

    for (i, a) in alphas.enumerate() {
        let ax = x + i as i32 - ox;
        if ax >= 0 && ax < map.width {
            map.write_raw(ax, ay, layout.encode(a), accessors.as_ref());
        }
    }
}
