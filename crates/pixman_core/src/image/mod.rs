// Copyright 2024 the Piet Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Images: solid fills, pixel buffers and gradients, together with the
//! attributes (clip, repeat, transform, filter, alpha map) that control how they
//! are sampled and written.

mod bits;
mod gradient;

pub use bits::BitsImage;
pub use gradient::{Circle, ConicalGradient, GradientStop, LinearGradient, RadialGradient};

use crate::color::Color;
use crate::error::Error;
use crate::format::Format;
use crate::region::{Box32, Region};
use crate::transform::{Fixed, PointFixed, Transform, FIXED_1};
use log::warn;

/// How coordinates outside an image are mapped back into it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Repeat {
    /// Pixels outside the image are transparent.
    #[default]
    None,
    /// The image is tiled.
    Normal,
    /// The edge pixels are extended.
    Pad,
    /// The image is tiled with every other tile mirrored.
    Reflect,
}

impl Repeat {
    /// Map `coord` into `0..size`, or `None` if it falls outside with [`Repeat::None`].
    #[inline(always)]
    pub fn apply(self, coord: i32, size: i32) -> Option<i32> {
        match self {
            Repeat::None => (coord >= 0 && coord < size).then_some(coord),
            Repeat::Normal => Some(coord.rem_euclid(size)),
            Repeat::Pad => Some(coord.clamp(0, size - 1)),
            Repeat::Reflect => {
                let c = coord.rem_euclid(2 * size);
                Some(if c >= size { 2 * size - 1 - c } else { c })
            }
        }
    }
}

/// The sampling filter used for transformed images.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    Fast,
    #[default]
    Good,
    Best,
    Nearest,
    Bilinear,
    /// A convolution with the kernel given as filter parameters.
    Convolution,
}

impl Filter {
    /// The filter that is actually run.
    pub(crate) fn resolve(self) -> Filter {
        match self {
            Filter::Fast | Filter::Nearest => Filter::Nearest,
            Filter::Good | Filter::Best | Filter::Bilinear => Filter::Bilinear,
            Filter::Convolution => Filter::Convolution,
        }
    }
}

/// Read a raw pixel from the bytes that hold it.
pub type ReadFn = fn(&[u8]) -> u32;
/// Write a raw pixel into the bytes that hold it.
pub type WriteFn = fn(&mut [u8], u32);

/// Custom memory accessors used instead of direct loads and stores.
#[derive(Copy, Clone, Debug)]
pub struct Accessors {
    pub read: ReadFn,
    pub write: WriteFn,
}

/// A separate image providing the alpha channel of another image.
#[derive(Clone, Debug)]
pub struct AlphaMap {
    pub(crate) image: Image,
    pub(crate) origin_x: i16,
    pub(crate) origin_y: i16,
}

/// How the rows of an image vary.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Unknown,
    /// Every row is identical.
    HorizontalInvariant,
    /// Every column is identical.
    VerticalInvariant,
}

/// A solid color fill.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SolidFill {
    pub color: Color,
    pub(crate) argb32: u32,
    pub(crate) argb64: u64,
}

#[derive(Clone, Debug)]
pub enum ImageKind {
    Solid(SolidFill),
    Bits(BitsImage),
    Linear(LinearGradient),
    Radial(RadialGradient),
    Conical(ConicalGradient),
}

/// Attributes shared by every image kind.
#[derive(Clone, Debug)]
pub(crate) struct Common {
    pub(crate) clip_region: Region,
    pub(crate) have_clip_region: bool,
    pub(crate) client_clip: bool,
    pub(crate) clip_sources: bool,
    pub(crate) repeat: Repeat,
    pub(crate) transform: Option<Transform>,
    pub(crate) filter: Filter,
    pub(crate) filter_params: Vec<Fixed>,
    pub(crate) alpha_map: Option<Box<AlphaMap>>,
    pub(crate) component_alpha: bool,
    pub(crate) accessors: Option<Accessors>,
}

impl Common {
    fn new(clip_region: Region) -> Self {
        Self {
            clip_region,
            have_clip_region: false,
            client_clip: false,
            clip_sources: false,
            repeat: Repeat::None,
            transform: None,
            filter: Filter::default(),
            filter_params: vec![],
            alpha_map: None,
            component_alpha: false,
            accessors: None,
        }
    }

    /// Whether samples are taken at integer positions without a transform.
    pub(crate) fn is_untransformed(&self) -> bool {
        self.transform.map_or(true, |t| t.is_identity())
            && self.filter.resolve() != Filter::Convolution
    }
}

/// An image that can be composited from or into.
#[derive(Clone, Debug)]
pub struct Image {
    pub(crate) common: Common,
    pub(crate) kind: ImageKind,
}

impl Image {
    fn with_kind(kind: ImageKind) -> Self {
        let clip = match &kind {
            ImageKind::Bits(b) => Region::from_rect(0, 0, b.width as u32, b.height as u32),
            _ => Region::new(),
        };

        Self {
            common: Common::new(clip),
            kind,
        }
    }

    /// A solid color image of infinite extent.
    pub fn solid(color: Color) -> Self {
        Self::with_kind(ImageKind::Solid(SolidFill {
            color,
            argb32: color.to_argb32(),
            argb64: color.to_argb64(),
        }))
    }

    /// A zero-initialized image.
    pub fn new_bits(format: Format, width: i32, height: i32) -> Result<Self, Error> {
        Ok(Self::with_kind(ImageKind::Bits(BitsImage::new(
            format, width, height,
        )?)))
    }

    /// An image over existing pixel storage. `stride` is the distance between rows
    /// in bytes and must be a multiple of four.
    pub fn from_bits(
        format: Format,
        width: i32,
        height: i32,
        bits: Vec<u32>,
        stride: usize,
    ) -> Result<Self, Error> {
        Ok(Self::with_kind(ImageKind::Bits(BitsImage::from_vec(
            format, width, height, bits, stride,
        )?)))
    }

    /// A linear gradient from `p1` to `p2`.
    pub fn linear_gradient(p1: PointFixed, p2: PointFixed, stops: &[GradientStop]) -> Self {
        Self::with_kind(ImageKind::Linear(LinearGradient::new(p1, p2, stops)))
    }

    /// A gradient between two circles.
    pub fn radial_gradient(inner: Circle, outer: Circle, stops: &[GradientStop]) -> Self {
        Self::with_kind(ImageKind::Radial(RadialGradient::new(inner, outer, stops)))
    }

    /// A gradient sweeping around `center`, starting at `angle` degrees.
    pub fn conical_gradient(center: PointFixed, angle: Fixed, stops: &[GradientStop]) -> Self {
        Self::with_kind(ImageKind::Conical(ConicalGradient::new(
            center, angle, stops,
        )))
    }

    pub fn kind(&self) -> &ImageKind {
        &self.kind
    }

    pub fn bits(&self) -> Option<&BitsImage> {
        match &self.kind {
            ImageKind::Bits(b) => Some(b),
            _ => None,
        }
    }

    pub fn bits_mut(&mut self) -> Option<&mut BitsImage> {
        match &mut self.kind {
            ImageKind::Bits(b) => Some(b),
            _ => None,
        }
    }

    /// The pixel format, for bits images.
    pub fn format(&self) -> Option<Format> {
        self.bits().map(|b| b.format)
    }

    /// The width of a bits image, zero otherwise.
    pub fn width(&self) -> i32 {
        self.bits().map_or(0, |b| b.width)
    }

    /// The height of a bits image, zero otherwise.
    pub fn height(&self) -> i32 {
        self.bits().map_or(0, |b| b.height)
    }

    /// The row stride in bytes of a bits image, zero otherwise.
    pub fn stride(&self) -> usize {
        self.bits().map_or(0, |b| b.rowstride * 4)
    }

    /// The pixel storage of a bits image.
    pub fn data(&self) -> &[u32] {
        match &self.kind {
            ImageKind::Bits(b) => &b.bits,
            _ => &[],
        }
    }

    pub fn data_mut(&mut self) -> &mut [u32] {
        match &mut self.kind {
            ImageKind::Bits(b) => &mut b.bits,
            _ => &mut [],
        }
    }

    pub fn repeat(&self) -> Repeat {
        self.common.repeat
    }

    pub fn set_repeat(&mut self, repeat: Repeat) {
        self.common.repeat = repeat;
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.common.transform.as_ref()
    }

    /// Set the transform mapping destination space to image space. An identity
    /// transform is stored as no transform.
    pub fn set_transform(&mut self, transform: Option<Transform>) {
        self.common.transform = transform.filter(|t| !t.is_identity());
    }

    pub fn filter(&self) -> Filter {
        self.common.filter
    }

    /// Set the sampling filter. A convolution expects `[width, height, weights...]`
    /// with the dimensions as fixed-point integers.
    pub fn set_filter(&mut self, filter: Filter, params: &[Fixed]) -> Result<(), Error> {
        if filter == Filter::Convolution {
            let valid = params.len() >= 2 && {
                let (w, h) = (params[0] / FIXED_1, params[1] / FIXED_1);
                w > 0 && h > 0 && params.len() == 2 + (w * h) as usize
            };

            if !valid {
                return Err(Error::InvalidFilterParams { len: params.len() });
            }
        }

        self.common.filter = filter;
        self.common.filter_params = params.to_vec();

        Ok(())
    }

    /// Restrict the pixels that can be written (and, for sources with source
    /// clipping enabled, read). `None` resets the clip to the whole image.
    pub fn set_clip_region(&mut self, region: Option<Region>) {
        match region {
            Some(region) => {
                self.common.clip_region = region;
                self.common.have_clip_region = true;
            }
            None => {
                self.common.clip_region =
                    Region::from_rect(0, 0, self.width() as u32, self.height() as u32);
                self.common.have_clip_region = false;
            }
        }
    }

    pub fn clip_region(&self) -> &Region {
        &self.common.clip_region
    }

    /// Mark the clip region as set by the client, so that it also restricts reads
    /// when source clipping is enabled.
    pub fn set_has_client_clip(&mut self, client_clip: bool) {
        self.common.client_clip = client_clip;
    }

    pub fn set_source_clipping(&mut self, clip_sources: bool) {
        self.common.clip_sources = clip_sources;
    }

    pub fn component_alpha(&self) -> bool {
        self.common.component_alpha
    }

    pub fn set_component_alpha(&mut self, component_alpha: bool) {
        self.common.component_alpha = component_alpha;
    }

    /// Use `alpha_map`, placed at `(x, y)`, as the alpha channel of this image.
    /// Only bits images are accepted as alpha maps, and they may not carry one of
    /// their own.
    pub fn set_alpha_map(&mut self, alpha_map: Option<Image>, x: i16, y: i16) {
        self.common.alpha_map = match alpha_map {
            Some(image) if image.bits().is_some() && image.common.alpha_map.is_none() => {
                Some(Box::new(AlphaMap {
                    image,
                    origin_x: x,
                    origin_y: y,
                }))
            }
            Some(_) => {
                warn!("ignoring alpha map that is not a plain bits image");
                None
            }
            None => None,
        };
    }

    pub fn alpha_map(&self) -> Option<&AlphaMap> {
        self.common.alpha_map.as_deref()
    }

    pub fn set_accessors(&mut self, accessors: Option<Accessors>) {
        self.common.accessors = accessors;
    }

    /// Whether every sample of the image is the same color: a solid fill, or a
    /// repeating 1x1 bits image.
    pub fn is_solid(&self) -> bool {
        match &self.kind {
            ImageKind::Solid(_) => true,
            ImageKind::Bits(b) => {
                b.width == 1
                    && b.height == 1
                    && self.common.repeat != Repeat::None
                    && self.common.alpha_map.is_none()
                    && self.common.filter.resolve() != Filter::Convolution
                    && self.common.transform.map_or(true, |t| t.is_affine())
            }
            _ => false,
        }
    }

    /// The color of a solid image as `0xAARRGGBB`.
    pub(crate) fn solid_color(&self) -> Option<u32> {
        match &self.kind {
            ImageKind::Solid(s) => Some(s.argb32),
            ImageKind::Bits(b) if self.is_solid() => {
                Some(b.fetch_pixel(0, 0, self.common.accessors.as_ref()))
            }
            _ => None,
        }
    }

    /// Whether every sample read from `samples` (in image space) has full alpha.
    /// Solid and repeating images ignore `samples`.
    pub(crate) fn is_opaque(&self, samples: Box32) -> bool {
        if self.common.component_alpha {
            return self.solid_color() == Some(0xffff_ffff);
        }

        // Kernel weights and projective sampling can both yield alpha below 0xff.
        if self.common.alpha_map.is_some()
            || self.common.filter.resolve() == Filter::Convolution
            || !self.common.transform.map_or(true, |t| t.is_affine())
        {
            return false;
        }

        match &self.kind {
            ImageKind::Solid(s) => s.argb32 >> 24 == 0xff,
            ImageKind::Bits(b) => {
                if self.is_solid() {
                    return self.solid_color().is_some_and(|c| c >> 24 == 0xff);
                }

                if b.format.has_alpha() {
                    return false;
                }

                self.common.repeat != Repeat::None
                    || (self.common.transform.is_none()
                        && samples.x1 >= 0
                        && samples.y1 >= 0
                        && samples.x2 <= b.width
                        && samples.y2 <= b.height)
            }
            ImageKind::Linear(g) => {
                g.is_opaque() && self.common.repeat != Repeat::None
            }
            ImageKind::Radial(g) => {
                g.is_opaque() && self.common.repeat != Repeat::None
            }
            ImageKind::Conical(g) => g.is_opaque(),
        }
    }

    /// Whether the image, used as a destination, has no alpha to lose.
    pub(crate) fn is_opaque_destination(&self) -> bool {
        self.format().is_some_and(|f| !f.has_alpha()) && self.common.alpha_map.is_none()
    }

    /// How the rows of the image vary.
    pub fn classify(&self) -> Classification {
        match &self.kind {
            ImageKind::Solid(_) => Classification::HorizontalInvariant,
            ImageKind::Bits(_) if self.is_solid() => Classification::HorizontalInvariant,
            ImageKind::Linear(g) if self.common.transform.is_none() => g.classify(),
            _ => Classification::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_modes() {
        assert_eq!(Repeat::None.apply(-1, 4), None);
        assert_eq!(Repeat::None.apply(3, 4), Some(3));
        assert_eq!(Repeat::Normal.apply(-1, 4), Some(3));
        assert_eq!(Repeat::Normal.apply(9, 4), Some(1));
        assert_eq!(Repeat::Pad.apply(-7, 4), Some(0));
        assert_eq!(Repeat::Pad.apply(7, 4), Some(3));

        for x in -20..20 {
            assert_eq!(Repeat::Reflect.apply(x, 4), Repeat::Reflect.apply(2 * 4 - 1 - x, 4));
            assert_eq!(Repeat::Normal.apply(x, 4), Repeat::Normal.apply(x + 4, 4));
        }
    }

    #[test]
    fn solid_reduction() {
        let mut image = Image::new_bits(Format::A8R8G8B8, 1, 1).unwrap();
        assert!(!image.is_solid());

        image.set_repeat(Repeat::Normal);
        image.data_mut()[0] = 0xff10_2030;
        assert!(image.is_solid());
        assert_eq!(image.solid_color(), Some(0xff10_2030));
        assert!(image.is_opaque(Box32::new(0, 0, 100, 100)));
    }

    #[test]
    fn opacity() {
        let mut image = Image::new_bits(Format::X8R8G8B8, 4, 4).unwrap();
        assert!(image.is_opaque(Box32::new(0, 0, 4, 4)));
        assert!(!image.is_opaque(Box32::new(0, 0, 5, 4)));

        image.set_repeat(Repeat::Pad);
        assert!(image.is_opaque(Box32::new(-3, 0, 5, 4)));

        let image = Image::new_bits(Format::A8R8G8B8, 4, 4).unwrap();
        assert!(!image.is_opaque(Box32::new(0, 0, 4, 4)));
        assert!(!image.is_opaque_destination());

        assert!(Image::solid(Color::from_argb32(0xff00_0000)).is_opaque(Box32::default()));
        assert!(!Image::solid(Color::from_argb32(0x8000_0000)).is_opaque(Box32::default()));
    }

    #[test]
    fn sampling_state_clears_opacity() {
        let samples = Box32::new(0, 0, 2, 2);
        let fresh = || {
            let mut image = Image::new_bits(Format::X8R8G8B8, 2, 2).unwrap();
            image.set_repeat(Repeat::Pad);
            image
        };
        assert!(fresh().is_opaque(samples));

        let mut image = fresh();
        image
            .set_filter(Filter::Convolution, &[FIXED_1, FIXED_1, FIXED_1 / 2])
            .unwrap();
        assert!(!image.is_opaque(samples));

        let mut image = fresh();
        image.set_alpha_map(Some(Image::new_bits(Format::A8, 2, 2).unwrap()), 0, 0);
        assert!(!image.is_opaque(samples));

        let mut image = fresh();
        let mut projective = Transform::IDENTITY;
        projective.matrix[2][0] = FIXED_1 / 4;
        image.set_transform(Some(projective));
        assert!(!image.is_opaque(samples));

        let mut image = fresh();
        image.set_transform(Some(Transform::translate(FIXED_1 * 3, 0)));
        assert!(image.is_opaque(samples));
    }

    #[test]
    fn convolved_pixel_is_not_solid() {
        let mut image = Image::new_bits(Format::X8R8G8B8, 1, 1).unwrap();
        image.set_repeat(Repeat::Normal);
        assert!(image.is_solid());

        image
            .set_filter(Filter::Convolution, &[FIXED_1, FIXED_1, FIXED_1 / 2])
            .unwrap();
        assert!(!image.is_solid());
        assert!(!image.is_opaque(Box32::new(0, 0, 1, 1)));
    }

    #[test]
    fn convolution_params_are_validated() {
        let mut image = Image::new_bits(Format::A8, 4, 4).unwrap();
        let params = [FIXED_1 * 3, FIXED_1, 1, 2, 3];
        assert!(image.set_filter(Filter::Convolution, &params).is_ok());
        assert!(image.set_filter(Filter::Convolution, &params[..4]).is_err());
    }

    #[test]
    fn clip_reset_covers_the_image() {
        let mut image = Image::new_bits(Format::A8, 7, 3).unwrap();
        image.set_clip_region(Some(Region::from_rect(1, 1, 2, 2)));
        assert!(image.common.have_clip_region);
        image.set_clip_region(None);
        assert_eq!(image.clip_region().extents(), Box32::new(0, 0, 7, 3));
        assert!(!image.common.have_clip_region);
    }
}
