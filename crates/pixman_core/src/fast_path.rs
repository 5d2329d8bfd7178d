// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fast-path tables and lookup.
//!
//! A backend owns an ordered table of specialized kernels keyed by operator, source
//! format, mask format and destination format. The first entry matching a composite
//! wins, so more specific entries have to come before more general ones.

use crate::format::Format;
use crate::image::{Image, ImageKind, Repeat};
use crate::operator::Operator;
use crate::region::Box32;
use bitflags::bitflags;

/// Everything a compositing kernel needs to process one rectangle.
///
/// Coordinates are the top-left corners in the source, mask and destination, and
/// the rectangle is `width x height` pixels. The walker updates them before every call.
pub(crate) struct CompositeInfo<'a> {
    pub(crate) op: Operator,
    pub(crate) src: &'a Image,
    pub(crate) mask: Option<&'a Image>,
    pub(crate) dest: &'a mut Image,
    pub(crate) src_x: i32,
    pub(crate) src_y: i32,
    pub(crate) mask_x: i32,
    pub(crate) mask_y: i32,
    pub(crate) dest_x: i32,
    pub(crate) dest_y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

/// A compositing kernel for one rectangle.
pub(crate) type CompositeFn = fn(&mut CompositeInfo<'_>);

/// What a fast-path entry accepts for the source or mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FormatSpec {
    /// No image (only meaningful for the mask).
    Null,
    /// A solid fill or a repeating 1x1 bits image.
    Solid,
    /// A bits image of exactly this format.
    Format(Format),
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub(crate) struct PathFlags: u32 {
        /// The mask must use component alpha.
        const COMPONENT_ALPHA = 1 << 0;
        /// The mask, if any, must use unified alpha.
        const UNIFIED_ALPHA = 1 << 1;
        /// Source and mask are the same image at the same position.
        const PIXBUF = 1 << 2;
    }
}

#[derive(Copy, Clone)]
pub(crate) struct FastPath {
    pub(crate) op: Operator,
    pub(crate) src: FormatSpec,
    pub(crate) mask: FormatSpec,
    pub(crate) dest: Format,
    pub(crate) flags: PathFlags,
    pub(crate) func: CompositeFn,
}

impl FastPath {
    pub(crate) const fn new(
        op: Operator,
        src: FormatSpec,
        mask: FormatSpec,
        dest: Format,
        flags: PathFlags,
        func: CompositeFn,
    ) -> Self {
        Self {
            op,
            src,
            mask,
            dest,
            flags,
            func,
        }
    }
}

/// Build a [`FastPath`] entry: `fast_path!(Over, solid, A8, A8R8G8B8, kernel)`. Source
/// and mask are `solid`, `null` or a format name; flags default to unified alpha.
macro_rules! fast_path {
    (@spec null) => {
        $crate::fast_path::FormatSpec::Null
    };
    (@spec solid) => {
        $crate::fast_path::FormatSpec::Solid
    };
    (@spec $format:ident) => {
        $crate::fast_path::FormatSpec::Format($crate::format::Format::$format)
    };
    ($op:ident, $src:tt, $mask:tt, $dest:ident, $func:expr) => {
        $crate::fast_path::fast_path!($op, $src, $mask, $dest, UNIFIED_ALPHA, $func)
    };
    ($op:ident, $src:tt, $mask:tt, $dest:ident, $flags:ident, $func:expr) => {
        $crate::fast_path::FastPath::new(
            $crate::operator::Operator::$op,
            $crate::fast_path::fast_path!(@spec $src),
            $crate::fast_path::fast_path!(@spec $mask),
            $crate::format::Format::$dest,
            $crate::fast_path::PathFlags::$flags,
            $func,
        )
    };
}

pub(crate) use fast_path;

/// How an image presents itself to the matcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Code {
    Null,
    Solid,
    Bits(Format),
    Other,
}

impl Code {
    fn of(image: Option<&Image>) -> Self {
        match image {
            None => Code::Null,
            Some(image) if image.is_solid() => Code::Solid,
            Some(image) => match &image.kind {
                ImageKind::Bits(b) => Code::Bits(b.format),
                _ => Code::Other,
            },
        }
    }
}

impl FormatSpec {
    fn accepts(self, code: Code) -> bool {
        match self {
            FormatSpec::Null => code == Code::Null,
            FormatSpec::Solid => code == Code::Solid,
            FormatSpec::Format(f) => code == Code::Bits(f),
        }
    }
}

/// The properties of a composite the tables are searched with.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LookupKey {
    op: Operator,
    src: Code,
    mask: Code,
    component_alpha: bool,
    pixbuf: bool,
    dest: Format,
}

impl LookupKey {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        op: Operator,
        src: &Image,
        mask: Option<&Image>,
        dest: &Image,
        src_x: i32,
        src_y: i32,
        mask_x: i32,
        mask_y: i32,
    ) -> Option<Self> {
        let dest = dest.format()?;
        let component_alpha = mask.is_some_and(|m| m.component_alpha());
        let pixbuf = mask.is_some_and(|m| {
            std::ptr::eq(src, m)
                && src_x == mask_x
                && src_y == mask_y
                && !m.component_alpha()
                && m.repeat() == Repeat::None
        });

        Some(Self {
            op,
            src: Code::of(Some(src)),
            mask: Code::of(mask),
            component_alpha,
            pixbuf,
            dest,
        })
    }
}

impl FastPath {
    fn matches(&self, key: &LookupKey) -> bool {
        if self.op != key.op || self.dest != key.dest {
            return false;
        }
        if !self.src.accepts(key.src) || !self.mask.accepts(key.mask) {
            return false;
        }
        if self.flags.contains(PathFlags::COMPONENT_ALPHA) && !key.component_alpha {
            return false;
        }
        if self.flags.contains(PathFlags::UNIFIED_ALPHA) && key.component_alpha {
            return false;
        }

        !self.flags.contains(PathFlags::PIXBUF) || key.pixbuf
    }
}

/// The kernel of the first matching entry.
pub(crate) fn lookup(table: &[FastPath], key: &LookupKey) -> Option<CompositeFn> {
    table.iter().find(|p| p.matches(key)).map(|p| p.func)
}

/// Whether a source or mask can be read directly by the kernels: untransformed,
/// unfiltered samples inside the image or with a tiling repeat, and no indirection.
/// `samples` is the box of image-space pixels the composite reads.
pub(crate) fn is_simple_source(image: &Image, samples: Box32) -> bool {
    let common = &image.common;

    if common.accessors.is_some() || common.alpha_map.is_some() {
        return false;
    }

    match &image.kind {
        ImageKind::Solid(_) => true,
        _ if image.is_solid() => true,
        ImageKind::Bits(b) => {
            common.is_untransformed()
                && match common.repeat {
                    Repeat::Normal => true,
                    Repeat::None => {
                        samples.x1 >= 0
                            && samples.y1 >= 0
                            && samples.x2 <= b.width
                            && samples.y2 <= b.height
                    }
                    Repeat::Pad | Repeat::Reflect => false,
                }
        }
        _ => false,
    }
}

/// Whether a destination can be written directly by the kernels.
pub(crate) fn is_simple_destination(image: &Image) -> bool {
    image.bits().is_some() && image.common.accessors.is_none() && image.common.alpha_map.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn noop(_: &mut CompositeInfo<'_>) {}
    fn other(_: &mut CompositeInfo<'_>) {}

    const TABLE: &[FastPath] = &[
        fast_path!(Over, solid, A8, A8R8G8B8, noop),
        fast_path!(Over, solid, A8R8G8B8, A8R8G8B8, COMPONENT_ALPHA, noop),
        fast_path!(Src, A8R8G8B8, A8R8G8B8, A8R8G8B8, PIXBUF, noop),
        fast_path!(Over, A8R8G8B8, null, A8R8G8B8, other),
    ];

    fn key(op: Operator, src: &Image, mask: Option<&Image>, dest: &Image) -> LookupKey {
        LookupKey::new(op, src, mask, dest, 0, 0, 0, 0).unwrap()
    }

    fn position(key: &LookupKey) -> Option<usize> {
        TABLE.iter().position(|p| p.matches(key))
    }

    #[test]
    fn solid_sources_only_match_solid_entries() {
        let dest = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        let mask = Image::new_bits(Format::A8, 4, 4).unwrap();
        let solid = Image::solid(Color::from_argb32(0xff00_00ff));
        assert_eq!(position(&key(Operator::Over, &solid, Some(&mask), &dest)), Some(0));

        let mut one = Image::new_bits(Format::A8R8G8B8, 1, 1).unwrap();
        one.set_repeat(Repeat::Normal);
        assert_eq!(position(&key(Operator::Over, &one, Some(&mask), &dest)), Some(0));
        assert_eq!(position(&key(Operator::Over, &one, None, &dest)), None);
    }

    #[test]
    fn component_alpha_is_matched_exactly() {
        let dest = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        let solid = Image::solid(Color::from_argb32(0xff00_00ff));
        let mut mask = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();

        assert_eq!(position(&key(Operator::Over, &solid, Some(&mask), &dest)), None);
        mask.set_component_alpha(true);
        assert_eq!(position(&key(Operator::Over, &solid, Some(&mask), &dest)), Some(1));
    }

    #[test]
    fn pixbuf_needs_the_same_image() {
        let dest = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        let src = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        let copy = src.clone();

        assert_eq!(position(&key(Operator::Src, &src, Some(&src), &dest)), Some(2));
        assert_eq!(position(&key(Operator::Src, &src, Some(&copy), &dest)), None);

        let shifted = LookupKey::new(Operator::Src, &src, Some(&src), &dest, 1, 0, 0, 0).unwrap();
        assert_eq!(position(&shifted), None);
    }

    #[test]
    fn first_match_wins() {
        let dest = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        let src = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        let key = key(Operator::Over, &src, None, &dest);
        assert_eq!(position(&key), Some(3));
        assert!(lookup(TABLE, &key).is_some());
    }

    #[test]
    fn simple_sources() {
        let mut image = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        assert!(is_simple_source(&image, Box32::new(0, 0, 4, 4)));
        assert!(!is_simple_source(&image, Box32::new(-1, 0, 4, 4)));

        image.set_repeat(Repeat::Normal);
        assert!(is_simple_source(&image, Box32::new(-1, 0, 40, 4)));

        image.set_repeat(Repeat::Pad);
        assert!(!is_simple_source(&image, Box32::new(0, 0, 4, 4)));
    }
}
