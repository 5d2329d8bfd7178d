// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::util::{auto, filled, general, raw_pixels, scalar};
use pixman_core::image::{Circle, GradientStop};
use pixman_core::transform::{int_to_fixed, FIXED_1};
use pixman_core::{Color, Filter, Format, Image, Operator, PointFixed, Repeat, Transform};

mod util;

const SENTINEL: u32 = 0xdead_beef;

#[test]
fn opaque_over_replaces_destination() {
    for imp in [general(), scalar(), auto()] {
        let src = filled(Format::A8R8G8B8, 10, 10, 0xffff_0000);
        let mut dest = filled(Format::A8R8G8B8, 10, 10, 0xff00_00ff);

        imp.composite(Operator::Over, &src, None, &mut dest, 0, 0, 0, 0, 0, 0, 10, 10);

        assert!(raw_pixels(&dest).iter().all(|p| *p == 0xffff_0000));
    }
}

#[test]
fn repeating_translucent_pixel_blends_uniformly() {
    let expected = {
        // 0x7f + 0xff * 0x80 / 0xff for alpha, 0xff * 0x80 / 0xff for blue.
        let a: u32 = 0x7f + 0x80;
        let r: u32 = 0x40;
        let b: u32 = 0x80;
        a << 24 | r << 16 | b
    };

    for imp in [general(), scalar(), auto()] {
        let mut src = filled(Format::A8R8G8B8, 1, 1, 0x7f40_0000);
        src.set_repeat(Repeat::Normal);
        let mut dest = filled(Format::X8R8G8B8, 100, 100, 0xff00_00ff);

        imp.composite(Operator::Over, &src, None, &mut dest, 3, 7, 0, 0, 0, 0, 100, 100);

        let pixels = raw_pixels(&dest);
        assert_eq!(pixels.len(), 100 * 100);
        assert!(pixels.iter().all(|p| *p == expected & 0x00ff_ffff));
    }
}

#[test]
fn repeating_bitmap_and_solid_agree() {
    let solid = Image::solid(Color::from_argb32(0x7f40_0000));
    let mut tiled = filled(Format::A8R8G8B8, 1, 1, 0x7f40_0000);
    tiled.set_repeat(Repeat::Normal);

    let mut a = filled(Format::A8R8G8B8, 37, 5, 0xff12_3456);
    let mut b = a.clone();
    general().composite(Operator::Over, &solid, None, &mut a, 0, 0, 0, 0, 0, 0, 37, 5);
    auto().composite(Operator::Over, &tiled, None, &mut b, -5, 9, 0, 0, 0, 0, 37, 5);

    assert_eq!(raw_pixels(&a), raw_pixels(&b));
}

/// An image whose rows are padded with sentinel words that must never change.
fn padded(format: Format, width: i32, height: i32, pad_words: usize, raw: u32) -> Image {
    let stride_words = width as usize + pad_words;
    let mut bits = vec![SENTINEL; stride_words * height as usize];
    for row in bits.chunks_mut(stride_words) {
        row[..width as usize].fill(raw);
    }

    Image::from_bits(format, width, height, bits, stride_words * 4).unwrap()
}

fn padding_is_intact(image: &Image) {
    let stride_words = image.stride() / 4;
    for row in image.data().chunks(stride_words) {
        assert!(row[image.width() as usize..].iter().all(|w| *w == SENTINEL));
    }
}

#[test]
fn out_of_bounds_requests_are_clipped() {
    for imp in [general(), scalar(), auto()] {
        let src = padded(Format::A8R8G8B8, 8, 4, 2, 0xffff_0000);
        let mut dest = padded(Format::A8R8G8B8, 8, 4, 4, 0xff00_00ff);

        // Starts left of the destination and extends past its right and bottom edges.
        imp.composite(Operator::Over, &src, None, &mut dest, 0, 0, 0, 0, -1, 1, 12, 5);

        padding_is_intact(&src);
        padding_is_intact(&dest);

        let stride_words = dest.stride() / 4;
        for (y, row) in dest.data().chunks(stride_words).enumerate() {
            for (x, p) in row[..8].iter().enumerate() {
                // Source column x + 1 is outside the source for x = 7.
                let covered = y >= 1 && x < 7;
                let expected = if covered { 0xffff_0000 } else { 0xff00_00ff };
                assert_eq!(*p, expected, "({x}, {y})");
            }
        }
    }
}

#[test]
fn empty_and_negative_sizes_do_nothing() {
    let src = filled(Format::A8R8G8B8, 4, 4, 0xffff_ffff);
    let mut dest = filled(Format::A8R8G8B8, 4, 4, 0);

    for (x, y, w, h) in [(0, 0, 0, 4), (0, 0, 4, -1), (4, 0, 4, 4), (-9, 0, 8, 4)] {
        auto().composite(Operator::Src, &src, None, &mut dest, 0, 0, 0, 0, x, y, w, h);
    }

    assert!(raw_pixels(&dest).iter().all(|p| *p == 0));
}

#[test]
fn clip_region_limits_destination_writes() {
    let src = Image::solid(Color::from_argb32(0xffff_ffff));
    let mut dest = filled(Format::A8, 6, 6, 0);
    dest.set_clip_region(Some(pixman_core::Region::from_rect(2, 2, 2, 3)));

    auto().composite(Operator::Src, &src, None, &mut dest, 0, 0, 0, 0, 0, 0, 6, 6);

    let pixels = raw_pixels(&dest);
    for y in 0..6 {
        for x in 0..6 {
            let inside = (2..4).contains(&x) && (2..5).contains(&y);
            assert_eq!(pixels[y * 6 + x], if inside { 0xff } else { 0 }, "({x}, {y})");
        }
    }
}

#[test]
fn global_entry_points() {
    let src = filled(Format::R5G6B5, 3, 3, 0xf800);
    let mut dest = filled(Format::R5G6B5, 3, 3, 0);

    pixman_core::composite(Operator::Src, &src, None, &mut dest, 0, 0, 0, 0, 0, 0, 3, 3);
    assert!(raw_pixels(&dest).iter().all(|p| *p == 0xf800));

    let mut copy = filled(Format::R5G6B5, 3, 3, 0);
    if pixman_core::blt(&src, &mut copy, 1, 1, 0, 0, 2, 2) {
        let pixels = raw_pixels(&copy);
        assert_eq!(&pixels[..2], &[0xf800, 0xf800]);
        assert_eq!(pixels[2], 0);
    }
}

fn red_stops() -> [GradientStop; 2] {
    [
        GradientStop {
            x: 0,
            color: Color::from_argb32(0xffff_0000),
        },
        GradientStop {
            x: FIXED_1,
            color: Color::from_argb32(0xff80_0000),
        },
    ]
}

fn circle(x: i32, y: i32, radius: i32) -> Circle {
    Circle {
        x: int_to_fixed(x),
        y: int_to_fixed(y),
        radius: int_to_fixed(radius),
    }
}

/// Sources whose stops or pixels are opaque but whose samples may still carry
/// less than full alpha, next to sources that really are opaque.
fn opacity_sources() -> Vec<(&'static str, Image)> {
    let mut sources = vec![];

    let mut linear = Image::linear_gradient(
        PointFixed::new(0, 0),
        PointFixed::new(int_to_fixed(6), 0),
        &red_stops(),
    );
    linear.set_repeat(Repeat::Pad);
    sources.push(("linear", linear));

    let mut contained = Image::radial_gradient(circle(3, 3, 0), circle(3, 3, 8), &red_stops());
    contained.set_repeat(Repeat::Pad);
    sources.push(("contained radial", contained));

    let mut disjoint = Image::radial_gradient(circle(0, 0, 1), circle(10, 0, 1), &red_stops());
    disjoint.set_repeat(Repeat::Pad);
    sources.push(("disjoint radial", disjoint));

    sources.push((
        "conical",
        Image::conical_gradient(PointFixed::new(int_to_fixed(3), int_to_fixed(3)), 0, &red_stops()),
    ));

    let mut convolved = filled(Format::X8R8G8B8, 2, 2, 0x00ff_0000);
    convolved.set_repeat(Repeat::Pad);
    convolved
        .set_filter(Filter::Convolution, &[FIXED_1, FIXED_1, FIXED_1 / 2])
        .unwrap();
    sources.push(("convolution", convolved));

    let mut alpha_mapped = filled(Format::X8R8G8B8, 8, 8, 0x00ff_0000);
    alpha_mapped.set_alpha_map(Some(filled(Format::A8, 8, 8, 0x80)), 0, 0);
    sources.push(("alpha map", alpha_mapped));

    let mut projective = filled(Format::X8R8G8B8, 3, 3, 0x00ff_0000);
    projective.set_repeat(Repeat::Normal);
    let mut transform = Transform::IDENTITY;
    transform.matrix[2] = [-FIXED_1 / 4, 0, FIXED_1 + FIXED_1 / 8];
    projective.set_transform(Some(transform));
    sources.push(("projective", projective));

    let mut scaled = filled(Format::X8R8G8B8, 3, 3, 0x00ff_0000);
    scaled.set_repeat(Repeat::Normal);
    scaled.set_transform(Some(Transform::scale(FIXED_1 / 2, FIXED_1 / 2)));
    sources.push(("scaled", scaled));

    let mut pixel = filled(Format::X8R8G8B8, 1, 1, 0x00ff_0000);
    pixel.set_repeat(Repeat::Normal);
    sources.push(("repeating pixel", pixel));

    sources
}

#[test]
fn opacity_shortcuts_match_unoptimized_blending() {
    let (width, height) = (8, 8);
    // A8 masks never count as opaque, so a full mask keeps OVER as OVER.
    let full_mask = filled(Format::A8, width, height, 0xff);

    for (name, src) in opacity_sources() {
        let mut results = vec![];

        for imp in [general(), scalar(), auto()] {
            let mut plain = filled(Format::A8R8G8B8, width, height, 0xff00_00ff);
            let mut masked = plain.clone();

            imp.composite(Operator::Over, &src, None, &mut plain, 0, 0, 0, 0, 0, 0, width, height);
            imp.composite(
                Operator::Over,
                &src,
                Some(&full_mask),
                &mut masked,
                0,
                0,
                0,
                0,
                0,
                0,
                width,
                height,
            );

            assert_eq!(raw_pixels(&plain), raw_pixels(&masked), "{name}");
            results.push(raw_pixels(&plain));
        }

        assert!(results.windows(2).all(|w| w[0] == w[1]), "{name}");
    }
}

#[test]
fn disjoint_radial_over_keeps_uncovered_destination() {
    let mut src = Image::radial_gradient(circle(0, 0, 1), circle(10, 0, 1), &red_stops());
    src.set_repeat(Repeat::Pad);

    for imp in [general(), scalar(), auto()] {
        let mut dest = filled(Format::A8R8G8B8, 1, 1, 0xff00_ff00);
        imp.composite(Operator::Over, &src, None, &mut dest, 5, 20, 0, 0, 0, 0, 1, 1);

        assert_eq!(raw_pixels(&dest), [0xff00_ff00]);
    }
}

#[test]
fn convolution_weights_are_not_treated_as_opaque() {
    let mut src = filled(Format::X8R8G8B8, 2, 2, 0x00ff_0000);
    src.set_repeat(Repeat::Pad);
    src.set_filter(Filter::Convolution, &[FIXED_1, FIXED_1, FIXED_1 / 2])
        .unwrap();

    for imp in [general(), scalar(), auto()] {
        let mut dest = filled(Format::A8R8G8B8, 2, 2, 0xff00_00ff);
        imp.composite(Operator::Over, &src, None, &mut dest, 0, 0, 0, 0, 0, 0, 2, 2);

        // Half-weighted red over opaque blue stays opaque and keeps some blue.
        for p in raw_pixels(&dest) {
            assert_eq!(p >> 24, 0xff);
            assert_ne!(p & 0xff, 0);
        }
    }
}
