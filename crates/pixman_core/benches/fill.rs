// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use bench_gen::{Params, RectIterator};
use criterion::Criterion;
use pixman_core::{ExecutionMode, Format, Image, Implementation, Operator};

const PARAMS: Params = Params {
    width: 512,
    height: 512,
    size: 48,
};
const FILL_ITERS: usize = 200;

pub fn fill(c: &mut Criterion) {
    let mut g = c.benchmark_group("fill");

    macro_rules! fill {
        ($name:ident, $format:expr) => {
            let imp = Implementation::new(ExecutionMode::Auto);
            let mut rng = bench_gen::rng();
            let mut dest = Image::new_bits($format, PARAMS.width, PARAMS.height).unwrap();
            let solid = bench_gen::gen_solid(&mut rng);

            // The raw fill primitive.
            g.bench_function(format!("{} - raw", stringify!($name)), |b| {
                b.iter(|| {
                    for (x, y) in RectIterator::new(PARAMS).take(FILL_ITERS) {
                        let stride_words = dest.stride() / 4;
                        let bpp = $format.bpp();
                        imp.fill(
                            dest.data_mut(),
                            stride_words,
                            bpp,
                            x,
                            y,
                            PARAMS.size,
                            PARAMS.size,
                            0x8080_8080,
                        );
                    }
                })
            });

            // A solid source with Src, which reduces to the same primitive.
            g.bench_function(format!("{} - composite", stringify!($name)), |b| {
                b.iter(|| {
                    for (x, y) in RectIterator::new(PARAMS).take(FILL_ITERS) {
                        imp.composite(
                            Operator::Src,
                            &solid,
                            None,
                            &mut dest,
                            0,
                            0,
                            0,
                            0,
                            x,
                            y,
                            PARAMS.size,
                            PARAMS.size,
                        );
                    }
                })
            });
        };
    }

    fill!(a8r8g8b8, Format::A8R8G8B8);
    fill!(r5g6b5, Format::R5G6B5);
    fill!(a8, Format::A8);
}
