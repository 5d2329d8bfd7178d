// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Splitting a composite region into kernel calls.

use crate::fast_path::{CompositeFn, CompositeInfo};
use crate::region::Region;

/// Run `func` over every rectangle of `region` (in destination space).
///
/// When `tile_src` or `tile_mask` is set, the rectangles are further split at the
/// tile boundaries of the repeating source or mask, and the coordinates passed to the
/// kernel are reduced into the image, so that kernels never have to wrap.
pub(crate) fn walk_region(
    info: &mut CompositeInfo<'_>,
    region: &Region,
    tile_src: bool,
    tile_mask: bool,
    func: CompositeFn,
) {
    let (src_x, src_y) = (info.src_x, info.src_y);
    let (mask_x, mask_y) = (info.mask_x, info.mask_y);
    let (dest_x, dest_y) = (info.dest_x, info.dest_y);
    let (src_w, src_h) = (info.src.width(), info.src.height());
    let (mask_w, mask_h) = info.mask.map_or((0, 0), |m| (m.width(), m.height()));

    for b in region.rectangles() {
        let mut h = b.height();
        let mut y_src = b.y1 - dest_y + src_y;
        let mut y_mask = b.y1 - dest_y + mask_y;
        let mut y_dst = b.y1;

        while h > 0 {
            let mut h_this = h;

            if tile_mask {
                y_mask = y_mask.rem_euclid(mask_h);
                h_this = h_this.min(mask_h - y_mask);
            }
            if tile_src {
                y_src = y_src.rem_euclid(src_h);
                h_this = h_this.min(src_h - y_src);
            }

            let mut w = b.width();
            let mut x_src = b.x1 - dest_x + src_x;
            let mut x_mask = b.x1 - dest_x + mask_x;
            let mut x_dst = b.x1;

            while w > 0 {
                let mut w_this = w;

                if tile_mask {
                    x_mask = x_mask.rem_euclid(mask_w);
                    w_this = w_this.min(mask_w - x_mask);
                }
                if tile_src {
                    x_src = x_src.rem_euclid(src_w);
                    w_this = w_this.min(src_w - x_src);
                }

                info.src_x = x_src;
                info.src_y = y_src;
                info.mask_x = x_mask;
                info.mask_y = y_mask;
                info.dest_x = x_dst;
                info.dest_y = y_dst;
                info.width = w_this;
                info.height = h_this;
                func(info);

                w -= w_this;
                x_src += w_this;
                x_mask += w_this;
                x_dst += w_this;
            }

            h -= h_this;
            y_src += h_this;
            y_mask += h_this;
            y_dst += h_this;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::image::{Image, Repeat};
    use crate::operator::Operator;
    use crate::region::Box32;

    /// Records each call in the destination: pixel `(dest_x, dest_y)` gets the call's
    /// source coordinates and size.
    fn record(info: &mut CompositeInfo<'_>) {
        let bits = info.dest.bits_mut().unwrap();
        let v = (info.src_x as u32) << 24
            | (info.src_y as u32) << 16
            | (info.width as u32) << 8
            | info.height as u32;
        bits.row_mut(info.dest_y)[info.dest_x as usize] = v;
    }

    #[test]
    fn tiles_a_repeating_source() {
        let mut src = Image::new_bits(Format::A8R8G8B8, 3, 2).unwrap();
        src.set_repeat(Repeat::Normal);
        let mut dest = Image::new_bits(Format::A8R8G8B8, 8, 8).unwrap();

        let mut info = CompositeInfo {
            op: Operator::Src,
            src: &src,
            mask: None,
            dest: &mut dest,
            src_x: 1,
            src_y: -1,
            mask_x: 0,
            mask_y: 0,
            dest_x: 0,
            dest_y: 0,
            width: 5,
            height: 3,
        };
        let region = Region::from_box(Box32::new(0, 0, 5, 3));
        walk_region(&mut info, &region, true, false, record);

        let row = |y: i32| dest.bits().unwrap().row(y).to_vec();
        // First band: source row 1 only, tiles of width 2 then 3.
        assert_eq!(row(0)[0], 1 << 24 | 1 << 16 | 2 << 8 | 1);
        assert_eq!(row(0)[2], 0 << 24 | 1 << 16 | 3 << 8 | 1);
        // Second band: source rows 0..2.
        assert_eq!(row(1)[0], 1 << 24 | 0 << 16 | 2 << 8 | 2);
        assert_eq!(row(1)[2], 0 << 24 | 0 << 16 | 3 << 8 | 2);
    }

    #[test]
    fn untiled_walk_visits_each_box_once() {
        let src = Image::new_bits(Format::A8R8G8B8, 3, 2).unwrap();
        let mut dest = Image::new_bits(Format::A8R8G8B8, 8, 8).unwrap();

        let mut info = CompositeInfo {
            op: Operator::Src,
            src: &src,
            mask: None,
            dest: &mut dest,
            src_x: 0,
            src_y: 0,
            mask_x: 0,
            mask_y: 0,
            dest_x: 1,
            dest_y: 1,
            width: 6,
            height: 6,
        };
        let region = Region::from_boxes(&[Box32::new(1, 1, 3, 3), Box32::new(5, 5, 7, 6)]);
        walk_region(&mut info, &region, false, false, record);

        let bits = dest.bits().unwrap();
        assert_eq!(bits.row(1)[1], 2 << 8 | 2);
        assert_eq!(bits.row(5)[5], 4 << 24 | 4 << 16 | 2 << 8 | 1);
    }
}
