// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle sets.
//!
//! A region is stored as a list of disjoint rectangles in y-x banded order: rectangles
//! are sorted top to bottom, every rectangle in a band shares the same vertical span,
//! rectangles inside a band are sorted left to right and never touch, and vertically
//! adjacent bands with identical horizontal spans are merged.

/// An axis-aligned box with exclusive lower-right corner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Box32 {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Box32 {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub const fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub const fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub const fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
}

/// A set of pixels described by disjoint rectangles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    extents: Box32,
    rects: Vec<Box32>,
}

impl Region {
    /// An empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// A region covering `width x height` pixels at `(x, y)`.
    pub fn from_rect(x: i32, y: i32, width: u32, height: u32) -> Self {
        let x2 = x.saturating_add(width.min(i32::MAX as u32) as i32);
        let y2 = y.saturating_add(height.min(i32::MAX as u32) as i32);

        Self::from_box(Box32::new(x, y, x2, y2))
    }

    /// A region covering one box.
    pub fn from_box(b: Box32) -> Self {
        if b.is_empty() {
            return Self::new();
        }

        Self {
            extents: b,
            rects: vec![b],
        }
    }

    /// The union of an arbitrary list of (possibly overlapping) boxes.
    pub fn from_boxes(boxes: &[Box32]) -> Self {
        boxes
            .iter()
            .fold(Self::new(), |acc, b| acc.union(&Self::from_box(*b)))
    }

    /// The bounding box, all zeros when empty.
    pub fn extents(&self) -> Box32 {
        self.extents
    }

    /// The banded rectangles making up the region.
    pub fn rectangles(&self) -> &[Box32] {
        &self.rects
    }

    pub fn is_not_empty(&self) -> bool {
        !self.rects.is_empty()
    }

    /// Returns the rectangle containing the point, if any.
    pub fn contains_point(&self, x: i32, y: i32) -> Option<Box32> {
        if !self.extents.contains_point(x, y) {
            return None;
        }

        self.rects.iter().copied().find(|r| r.contains_point(x, y))
    }

    /// Shift the region by `(dx, dy)`.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }

        let shift = |b: &mut Box32| {
            b.x1 = b.x1.saturating_add(dx);
            b.x2 = b.x2.saturating_add(dx);
            b.y1 = b.y1.saturating_add(dy);
            b.y2 = b.y2.saturating_add(dy);
        };

        shift(&mut self.extents);
        self.rects.iter_mut().for_each(shift);
    }

    pub fn intersect(&self, other: &Region) -> Region {
        if self.rects.len() == 1 && other.rects.len() == 1 {
            let (a, b) = (self.extents, other.extents);

            return Self::from_box(Box32::new(
                a.x1.max(b.x1),
                a.y1.max(b.y1),
                a.x2.min(b.x2),
                a.y2.min(b.y2),
            ));
        }

        self.combine(other, |a, b| a && b)
    }

    /// Intersect with a single rectangle.
    pub fn intersect_rect(&self, x: i32, y: i32, width: u32, height: u32) -> Region {
        self.intersect(&Self::from_rect(x, y, width, height))
    }

    pub fn union(&self, other: &Region) -> Region {
        if !other.is_not_empty() {
            return self.clone();
        }
        if !self.is_not_empty() {
            return other.clone();
        }

        self.combine(other, |a, b| a || b)
    }

    /// The pixels of `self` that are not in `other`.
    pub fn subtract(&self, other: &Region) -> Region {
        self.combine(other, |a, b| a && !b)
    }

    fn combine(&self, other: &Region, keep: impl Fn(bool, bool) -> bool) -> Region {
        let mut ys: Vec<i32> = self
            .rects
            .iter()
            .chain(&other.rects)
            .flat_map(|r| [r.y1, r.y2])
            .collect();
        ys.sort_unstable();
        ys.dedup();

        let mut builder = Builder::default();
        let mut spans = vec![];

        for band in ys.windows(2) {
            let (top, bottom) = (band[0], band[1]);
            let a = band_spans(&self.rects, top, bottom);
            let b = band_spans(&other.rects, top, bottom);

            spans.clear();
            combine_spans(&a, &b, &keep, &mut spans);
            builder.push_band(top, bottom, &spans);
        }

        builder.finish()
    }
}

/// The horizontal spans of the band covering `[top, bottom)`.
fn band_spans(rects: &[Box32], top: i32, bottom: i32) -> Vec<(i32, i32)> {
    rects
        .iter()
        .filter(|r| r.y1 <= top && r.y2 >= bottom)
        .map(|r| (r.x1, r.x2))
        .collect()
}

fn combine_spans(
    a: &[(i32, i32)],
    b: &[(i32, i32)],
    keep: &impl Fn(bool, bool) -> bool,
    out: &mut Vec<(i32, i32)>,
) {
    let mut xs: Vec<i32> = a.iter().chain(b).flat_map(|s| [s.0, s.1]).collect();
    xs.sort_unstable();
    xs.dedup();

    let inside = |spans: &[(i32, i32)], x: i32| spans.iter().any(|s| s.0 <= x && x < s.1);

    for w in xs.windows(2) {
        let (x1, x2) = (w[0], w[1]);

        if keep(inside(a, x1), inside(b, x1)) {
            match out.last_mut() {
                Some(last) if last.1 == x1 => last.1 = x2,
                _ => out.push((x1, x2)),
            }
        }
    }
}

#[derive(Default)]
struct Builder {
    rects: Vec<Box32>,
    /// Index of the first rectangle of the last band.
    last_band: usize,
}

impl Builder {
    fn push_band(&mut self, top: i32, bottom: i32, spans: &[(i32, i32)]) {
        if spans.is_empty() {
            return;
        }

        let prev = &mut self.rects[self.last_band..];
        let coalesce = !prev.is_empty()
            && prev[0].y2 == top
            && prev.len() == spans.len()
            && prev.iter().zip(spans).all(|(r, s)| r.x1 == s.0 && r.x2 == s.1);

        if coalesce {
            prev.iter_mut().for_each(|r| r.y2 = bottom);
        } else {
            self.last_band = self.rects.len();
            self.rects
                .extend(spans.iter().map(|s| Box32::new(s.0, top, s.1, bottom)));
        }
    }

    fn finish(self) -> Region {
        let Some(first) = self.rects.first() else {
            return Region::new();
        };

        let mut extents = *first;
        for r in &self.rects {
            extents.x1 = extents.x1.min(r.x1);
            extents.x2 = extents.x2.max(r.x2);
            extents.y2 = extents.y2.max(r.y2);
        }

        Region {
            extents,
            rects: self.rects,
        }
    }
}
