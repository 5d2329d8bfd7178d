// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bench_gen::{Params, RectIterator};
use criterion::Criterion;
use pixman_core::{ExecutionMode, Format, Image, Implementation, Operator};
use rand::rngs::StdRng;

const PARAMS: Params = Params {
    width: 512,
    height: 512,
    size: 64,
};
const COMPOSITE_ITERS: usize = 100;

fn bits(rng: &mut StdRng, format: Format) -> Image {
    bench_gen::gen_image(rng, format, PARAMS.width, PARAMS.height)
}

pub fn composite(c: &mut Criterion) {
    let mut g = c.benchmark_group("composite");

    macro_rules! composite_single {
        ($name:ident, $op:path, $src:expr, $mask:expr, $dest:expr, $mode:ident) => {
            let imp = Implementation::new(ExecutionMode::$mode);
            let mut rng = bench_gen::rng();
            let src: Image = $src(&mut rng);
            let mask_format: Option<Format> = $mask;
            let mask = mask_format.map(|format| bits(&mut rng, format));
            let mut dest = bench_gen::gen_image(&mut rng, $dest, PARAMS.width, PARAMS.height);

            g.bench_function(
                format!("{} - {}", stringify!($name), stringify!($mode)),
                |b| {
                    b.iter(|| {
                        for (x, y) in RectIterator::new(PARAMS).take(COMPOSITE_ITERS) {
                            imp.composite(
                                $op,
                                &src,
                                mask.as_ref(),
                                &mut dest,
                                x,
                                y,
                                x,
                                y,
                                x,
                                y,
                                PARAMS.size,
                                PARAMS.size,
                            );
                        }
                    })
                },
            );
        };
    }

    macro_rules! composite {
        ($name:ident, $op:path, $src:expr, $mask:expr, $dest:expr) => {
            composite_single!($name, $op, $src, $mask, $dest, General);
            composite_single!($name, $op, $src, $mask, $dest, Scalar);
            composite_single!($name, $op, $src, $mask, $dest, Auto);
        };
    }

    let argb = |rng: &mut StdRng| bits(rng, Format::A8R8G8B8);
    let a8 = |rng: &mut StdRng| bits(rng, Format::A8);

    composite!(over_8888_8888, Operator::Over, argb, None, Format::A8R8G8B8);
    composite!(over_8888_0565, Operator::Over, argb, None, Format::R5G6B5);
    composite!(src_8888_0565, Operator::Src, argb, None, Format::R5G6B5);
    composite!(add_8_8, Operator::Add, a8, None, Format::A8);
    composite!(
        over_n_8_8888,
        Operator::Over,
        bench_gen::gen_solid,
        Some(Format::A8),
        Format::A8R8G8B8
    );
    // No specialized path covers this one.
    composite!(
        xor_8888_8_8888,
        Operator::Xor,
        argb,
        Some(Format::A8),
        Format::A8R8G8B8
    );
}
