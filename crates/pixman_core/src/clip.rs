// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Computing the set of destination pixels a composite touches.

use crate::image::Image;
use crate::region::{Box32, Region};

/// Coordinates are clamped to 16 bits when a single-rectangle clip is applied.
#[inline]
fn bound(v: i32) -> i32 {
    v.clamp(i16::MIN as i32, i16::MAX as i32)
}

/// Intersect `region` with `clip` translated by `(dx, dy)`. Returns `None` once the
/// region is empty.
fn clip_general_image(region: Region, clip: &Region, dx: i32, dy: i32) -> Option<Region> {
    if region.rectangles().len() == 1 && clip.rectangles().len() == 1 {
        let (r, c) = (region.extents(), clip.extents());
        let b = Box32::new(
            if r.x1 < c.x1 + dx { bound(c.x1 + dx) } else { r.x1 },
            if r.y1 < c.y1 + dy { bound(c.y1 + dy) } else { r.y1 },
            if r.x2 > c.x2 + dx { bound(c.x2 + dx) } else { r.x2 },
            if r.y2 > c.y2 + dy { bound(c.y2 + dy) } else { r.y2 },
        );

        return (!b.is_empty()).then(|| Region::from_box(b));
    }

    if !clip.is_not_empty() {
        return None;
    }

    let mut region = region;
    region.translate(-dx, -dy);
    let mut region = region.intersect(clip);
    region.translate(dx, dy);

    region.is_not_empty().then_some(region)
}

/// Clip against a source's clip region, which only applies when the client set it and
/// asked for source clipping.
fn clip_source_image(region: Region, image: &Image, dx: i32, dy: i32) -> Option<Region> {
    if !image.common.clip_sources || !image.common.client_clip {
        return Some(region);
    }

    clip_general_image(region, &image.common.clip_region, dx, dy)
}

/// Clip against a source (or mask) positioned at `(x, y)` relative to the destination
/// origin `(dest_x, dest_y)`, including its alpha map.
fn clip_source(
    region: Region,
    image: &Image,
    x: i32,
    y: i32,
    dest_x: i32,
    dest_y: i32,
) -> Option<Region> {
    let mut region = region;

    if image.common.have_clip_region {
        region = clip_source_image(region, image, dest_x - x, dest_y - y)?;
    }

    if let Some(alpha_map) = image.alpha_map() {
        if alpha_map.image.common.have_clip_region {
            region = clip_source_image(
                region,
                &alpha_map.image,
                dest_x - (x - alpha_map.origin_x as i32),
                dest_y - (y - alpha_map.origin_y as i32),
            )?;
        }
    }

    Some(region)
}

/// The destination pixels written by a composite of a `width x height` rectangle at
/// `(dest_x, dest_y)`, or `None` if there are none.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_composite_region(
    src: &Image,
    mask: Option<&Image>,
    dest: &Image,
    src_x: i32,
    src_y: i32,
    mask_x: i32,
    mask_y: i32,
    dest_x: i32,
    dest_y: i32,
    width: i32,
    height: i32,
) -> Option<Region> {
    let extents = Box32::new(
        dest_x.max(0),
        dest_y.max(0),
        dest_x.saturating_add(width).min(dest.width()),
        dest_y.saturating_add(height).min(dest.height()),
    );

    if extents.is_empty() {
        return None;
    }

    let mut region = Region::from_box(extents);

    if dest.common.have_clip_region {
        region = clip_general_image(region, &dest.common.clip_region, 0, 0)?;
    }

    if let Some(alpha_map) = dest.alpha_map() {
        let (ox, oy) = (alpha_map.origin_x as i32, alpha_map.origin_y as i32);
        region = region.intersect_rect(
            ox,
            oy,
            alpha_map.image.width() as u32,
            alpha_map.image.height() as u32,
        );

        if !region.is_not_empty() {
            return None;
        }

        if alpha_map.image.common.have_clip_region {
            region = clip_general_image(region, &alpha_map.image.common.clip_region, -ox, -oy)?;
        }
    }

    region = clip_source(region, src, src_x, src_y, dest_x, dest_y)?;

    if let Some(mask) = mask {
        region = clip_source(region, mask, mask_x, mask_y, dest_x, dest_y)?;
    }

    Some(region)
}
