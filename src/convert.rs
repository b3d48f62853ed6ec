//! Channel and representation conversions.
//!
//! Every conversion returns a fresh buffer of the source's size; fractional
//! size hints are carried over.

use rgb::Rgba;

use crate::rows::{self, Threading};
use crate::{GrayMap, PixelBuffer, Rgba8, Rgba8Map, RgbaF32Map};

fn map_pixels<S, D>(src: &PixelBuffer<S>, f: impl Fn(S) -> D + Sync) -> PixelBuffer<D>
where
    S: Copy + Sync,
    D: Copy + Default + Send,
{
    let width = src.width();
    let mut dst = PixelBuffer::new(width, src.height(), D::default());
    let pixels = src.as_slice();
    rows::for_each_row(dst.as_mut_slice(), width, Threading::Auto, |y, row| {
        for (d, s) in row.iter_mut().zip(&pixels[y * width..]) {
            *d = f(*s);
        }
    });
    dst.set_fractional_size(src.fw(), src.fh());
    dst
}

#[inline]
fn channel_sum(p: Rgba8) -> u32 {
    u32::from(p.r) + u32::from(p.g) + u32::from(p.b)
}

/// Mean of the color channels, `(r + g + b) / 3` rounded down.
pub fn to_gray(src: &Rgba8Map) -> GrayMap {
    map_pixels(src, |p| (channel_sum(p) / 3) as u8)
}

/// `255` where a gray value exceeds `threshold`, `0` elsewhere.
pub fn to_mono_gray(src: &GrayMap, threshold: u8) -> GrayMap {
    map_pixels(src, |v| if v > threshold { 255 } else { 0 })
}

/// `255` where `r + g + b` exceeds `threshold`, `0` elsewhere.
///
/// The sum ranges over `0..=765`.
pub fn to_mono(src: &Rgba8Map, threshold: u32) -> GrayMap {
    map_pixels(src, |p| if channel_sum(p) > threshold { 255 } else { 0 })
}

/// The red channel as a gray map.
pub fn red_channel(src: &Rgba8Map) -> GrayMap {
    map_pixels(src, |p| p.r)
}

/// Opaque RGBA with every color channel set to the gray value.
pub fn gray_to_rgba(src: &GrayMap) -> Rgba8Map {
    map_pixels(src, |v| Rgba::new(v, v, v, 255))
}

/// Bytes to `[0, 1]` floats.
pub fn to_float(src: &Rgba8Map) -> RgbaF32Map {
    let f = |c: u8| f32::from(c) / 255.0;
    map_pixels(src, move |p| Rgba::new(f(p.r), f(p.g), f(p.b), f(p.a)))
}

/// Floats to bytes, clamped to `[0, 1]` and rounded to nearest.
pub fn from_float(src: &RgbaF32Map) -> Rgba8Map {
    let b = |c: f32| ((c * 255.0).clamp(0.0, 255.0) + 0.5) as u8;
    map_pixels(src, move |p| Rgba::new(b(p.r), b(p.g), b(p.b), b(p.a)))
}

// ---------------------------------------------------------------------------
// Channel combination
// ---------------------------------------------------------------------------

/// One input of [`combine_channels`]: a channel (0 = r .. 3 = a) of an image.
/// Indices above 3 read alpha.
#[derive(Clone, Copy, Debug)]
pub struct ChannelSource<'a> {
    /// Image to read from.
    pub image: &'a Rgba8Map,
    /// Channel index: 0 = r, 1 = g, 2 = b, anything else = a.
    pub channel: usize,
}

impl<'a> ChannelSource<'a> {
    /// Read `channel` of `image`.
    pub fn new(image: &'a Rgba8Map, channel: usize) -> Self {
        Self { image, channel }
    }

    fn read(&self, x: usize, y: usize, default: u8) -> u8 {
        let splat = Rgba::new(default, default, default, default);
        let p = self.image.pixel(x, y, splat);
        match self.channel {
            0 => p.r,
            1 => p.g,
            2 => p.b,
            _ => p.a,
        }
    }
}

/// Assemble an RGBA image channel by channel.
///
/// `sources` holds the inputs for r, g, b and a in order. The output is as
/// large as the largest present source (at least 1×1). A missing source, or
/// a read past the edge of a smaller one, yields the matching channel of
/// `default`.
pub fn combine_channels(sources: [Option<ChannelSource<'_>>; 4], default: Rgba8) -> Rgba8Map {
    let (width, height) = sources
        .iter()
        .flatten()
        .fold((1, 1), |(w, h), s| (w.max(s.image.width()), h.max(s.image.height())));

    let defaults = [default.r, default.g, default.b, default.a];
    let mut dst = Rgba8Map::new(width, height, default);
    rows::for_each_row(dst.as_mut_slice(), width, Threading::Auto, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut c = defaults;
            for (slot, source) in c.iter_mut().zip(&sources) {
                if let Some(source) = source {
                    *slot = source.read(x, y, *slot);
                }
            }
            *out = Rgba::new(c[0], c[1], c[2], c[3]);
        }
    });
    dst
}
