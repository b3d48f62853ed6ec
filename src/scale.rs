//! Area-weighted resampling.
//!
//! Every destination pixel maps to a rectangle in source space. An
//! aggregation routine turns that rectangle into one pixel; the default,
//! [`box_filter`], averages the source cells it overlaps weighted by the
//! overlap area.
//!
//! ```rust
//! use vellum::scale::{box_filter, resample};
//! use vellum::{Rgba8, Rgba8Map, ScaleDetails, ScaleMode, Threading};
//!
//! let src = Rgba8Map::new(640, 480, Rgba8::new(10, 20, 30, 255));
//! let details = ScaleDetails::new(ScaleMode::PadCenter, Rgba8::default());
//! let thumb = resample(&src, 128, 128, box_filter, &details, Threading::Auto);
//! assert_eq!((thumb.width(), thumb.height()), (128, 128));
//! ```

use alloc::vec::Vec;

use rgb::Rgba;

use crate::rows::{self, Threading};
use crate::PixelBuffer;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How to reconcile a source aspect ratio that differs from the destination.
///
/// `Crop` scales by the smaller of the two axis factors and the `Pad` modes
/// by the larger one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScaleMode {
    /// Scale each axis independently; the image may be distorted.
    #[default]
    Stretch,
    /// Scale uniformly so the destination is covered; the source overflow on
    /// one axis is cut off (right/bottom).
    Crop,
    /// Scale uniformly so the whole source fits; the leftover destination on
    /// one axis reads the fill value (right/bottom).
    Pad,
    /// Like [`Pad`](Self::Pad), with the source centered.
    PadCenter,
}

/// Resampling configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScaleDetails<T> {
    /// Fit policy.
    pub mode: ScaleMode,
    /// Value read for source coordinates outside the image.
    pub fill: T,
}

impl<T> ScaleDetails<T> {
    /// Bundle a fit policy with a fill value.
    pub const fn new(mode: ScaleMode, fill: T) -> Self {
        Self { mode, fill }
    }
}

// ---------------------------------------------------------------------------
// Source access for aggregation routines
// ---------------------------------------------------------------------------

/// Read-only view of the source handed to aggregation routines.
///
/// Coordinates are signed because source rectangles can start left of or
/// above the image when padding is centered.
pub struct SourceView<'a, T> {
    src: &'a PixelBuffer<T>,
    fill: T,
}

impl<'a, T: Copy + Default> SourceView<'a, T> {
    /// View `src`, reading `fill` outside its bounds.
    pub fn new(src: &'a PixelBuffer<T>, fill: T) -> Self {
        Self { src, fill }
    }

    /// Source pixel at `(x, y)`, or the fill value if out of range.
    #[inline]
    pub fn pixel(&self, x: isize, y: isize) -> T {
        if x < 0 || y < 0 {
            return self.fill;
        }
        self.src.pixel(x as usize, y as usize, self.fill)
    }

    /// Value read outside the source.
    #[inline]
    pub fn fill(&self) -> T {
        self.fill
    }

    /// Source width.
    #[inline]
    pub fn width(&self) -> usize {
        self.src.width()
    }

    /// Source height.
    #[inline]
    pub fn height(&self) -> usize {
        self.src.height()
    }
}

// ---------------------------------------------------------------------------
// Box filter
// ---------------------------------------------------------------------------

/// Pixel types the default [`box_filter`] knows how to average.
pub trait AreaAverage: Copy + Default {
    /// Overlap-weighted mean of the source over `[x1, x2) × [y1, y2)`.
    fn area_average(src: &SourceView<'_, Self>, x1: f64, y1: f64, x2: f64, y2: f64) -> Self;
}

/// Default aggregation routine: overlap-area weighted mean.
///
/// Channels are accumulated as `f64`. Integer channels are stored with a
/// truncating cast, so results carry a slight downward bias.
pub fn box_filter<T: AreaAverage>(src: &SourceView<'_, T>, x1: f64, y1: f64, x2: f64, y2: f64) -> T {
    T::area_average(src, x1, y1, x2, y2)
}

#[inline]
fn overlap(min1: f64, max1: f64, min2: f64, max2: f64) -> f64 {
    (max1.min(max2) - min1.max(min2)).max(0.0)
}

// `f64::floor`/`ceil` live in std; these are exact for the coordinate range
// a buffer can address.
#[inline]
fn floor_index(v: f64) -> isize {
    let t = v as isize;
    if (t as f64) > v { t - 1 } else { t }
}

#[inline]
fn ceil_index(v: f64) -> isize {
    let t = v as isize;
    if (t as f64) < v { t + 1 } else { t }
}

fn integrate<T: Copy + Default, const N: usize>(
    src: &SourceView<'_, T>,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    channels: impl Fn(T) -> [f64; N],
) -> [f64; N] {
    // An empty band only occurs before the image (centered padding).
    if x2 <= x1 || y2 <= y1 {
        return channels(src.fill());
    }

    let (px1, py1) = (floor_index(x1), floor_index(y1));
    let (px2, py2) = (ceil_index(x2), ceil_index(y2));
    let total = (x2 - x1) * (y2 - y1);

    let mut acc = [0.0f64; N];
    for y in py1..py2 {
        let oy = overlap(y1, y2, y as f64, y as f64 + 1.0);
        for x in px1..px2 {
            let ox = overlap(x1, x2, x as f64, x as f64 + 1.0);
            let area = ox * oy;
            for (a, v) in acc.iter_mut().zip(channels(src.pixel(x, y))) {
                *a += area * v;
            }
        }
    }

    acc.map(|a| a / total)
}

impl AreaAverage for u8 {
    fn area_average(src: &SourceView<'_, Self>, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let [v] = integrate(src, x1, y1, x2, y2, |p| [f64::from(p)]);
        v as u8
    }
}

impl AreaAverage for Rgba<u8> {
    fn area_average(src: &SourceView<'_, Self>, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let [r, g, b, a] = integrate(src, x1, y1, x2, y2, |p| {
            [p.r.into(), p.g.into(), p.b.into(), p.a.into()]
        });
        Rgba::new(r as u8, g as u8, b as u8, a as u8)
    }
}

impl AreaAverage for Rgba<f32> {
    fn area_average(src: &SourceView<'_, Self>, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let [r, g, b, a] = integrate(src, x1, y1, x2, y2, |p| {
            [p.r.into(), p.g.into(), p.b.into(), p.a.into()]
        });
        Rgba::new(r as f32, g as f32, b as f32, a as f32)
    }
}

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// Source-space scale factors and origin offset for one resample call.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Mapping {
    fx: f64,
    fy: f64,
    ox: f64,
    oy: f64,
}

impl Mapping {
    fn new(src_w: usize, src_h: usize, width: usize, height: usize, mode: ScaleMode) -> Self {
        let mut fx = src_w as f64 / width as f64;
        let mut fy = src_h as f64 / height as f64;
        let (mut ox, mut oy) = (0.0, 0.0);

        match mode {
            ScaleMode::Stretch => {}
            ScaleMode::Crop => {
                let f = fx.min(fy);
                (fx, fy) = (f, f);
            }
            ScaleMode::Pad => {
                let f = fx.max(fy);
                (fx, fy) = (f, f);
            }
            ScaleMode::PadCenter => {
                let f = fx.max(fy);
                (fx, fy) = (f, f);
                ox = (width as f64 * fx - src_w as f64) / 2.0;
                oy = (height as f64 * fy - src_h as f64) / 2.0;
            }
        }

        Self { fx, fy, ox, oy }
    }

    /// Source band `[start, end)` covered by destination index `i` on one axis.
    ///
    /// The band starts where the previous one ended, and the first band
    /// starts at 0.
    #[inline]
    fn band(i: usize, f: f64, o: f64) -> (f64, f64) {
        let start = if i == 0 { 0.0 } else { i as f64 * f - o };
        let end = (i + 1) as f64 * f - o;
        (start, end)
    }
}

/// Resample `src` to `width × height`.
///
/// `filter(view, x1, y1, x2, y2)` computes one destination pixel from the
/// source rectangle `[x1, x2) × [y1, y2)`. Pass [`box_filter`] for the
/// default area average.
///
/// Returns the empty buffer if the source or the destination has a zero
/// dimension. Rows are computed through the [row scheduler](crate::rows);
/// the result does not depend on `threading`.
pub fn resample<T, F>(
    src: &PixelBuffer<T>,
    width: usize,
    height: usize,
    filter: F,
    details: &ScaleDetails<T>,
    threading: Threading,
) -> PixelBuffer<T>
where
    T: Copy + Default + Send + Sync,
    F: Fn(&SourceView<'_, T>, f64, f64, f64, f64) -> T + Sync,
{
    if src.width() < 1 || src.height() < 1 || width < 1 || height < 1 {
        return PixelBuffer::default();
    }

    let map = Mapping::new(src.width(), src.height(), width, height, details.mode);
    let view = SourceView::new(src, details.fill);

    let mut dst = PixelBuffer::new(width, height, T::default());
    rows::for_each_row(dst.as_mut_slice(), width, threading, |y, row| {
        let (py, sy) = Mapping::band(y, map.fy, map.oy);
        for (x, out) in row.iter_mut().enumerate() {
            let (px, sx) = Mapping::band(x, map.fx, map.ox);
            *out = filter(&view, px, py, sx, sy);
        }
    });
    dst
}

/// Stretch `src` to `width × height` with the box filter.
pub fn scale<T>(src: &PixelBuffer<T>, width: usize, height: usize) -> PixelBuffer<T>
where
    T: AreaAverage + Send + Sync,
{
    resample(
        src,
        width,
        height,
        box_filter,
        &ScaleDetails::default(),
        Threading::Auto,
    )
}

/// Halve an 8-bit RGBA image in place with a 2×2 integer average.
///
/// The new size is `max(1, w/2) × max(1, h/2)`; an odd trailing row or column
/// is dropped. Images narrower or shorter than 2 go through [`scale`]
/// instead. Fractional-size hints are kept.
pub fn half_scale_in_place(img: &mut PixelBuffer<Rgba<u8>>) {
    let width = (img.width() / 2).max(1);
    let height = (img.height() / 2).max(1);
    let (fw, fh) = (img.fw(), img.fh());

    if img.width() < 2 || img.height() < 2 {
        *img = scale(img, width, height);
        img.set_fractional_size(fw, fh);
        return;
    }

    let sw = img.width();
    let src = img.as_slice();
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let r0 = &src[sw * 2 * y..sw * (2 * y + 1)];
        let r1 = &src[sw * (2 * y + 1)..sw * (2 * y + 2)];
        for (top, bottom) in r0.chunks_exact(2).zip(r1.chunks_exact(2)).take(width) {
            let avg = |c: fn(&Rgba<u8>) -> u8| {
                let sum = u32::from(c(&top[0]))
                    + u32::from(c(&top[1]))
                    + u32::from(c(&bottom[0]))
                    + u32::from(c(&bottom[1]));
                (sum / 4) as u8
            };
            out.push(Rgba::new(avg(|p| p.r), avg(|p| p.g), avg(|p| p.b), avg(|p| p.a)));
        }
    }

    img.set_size(width, height);
    img.as_mut_slice().copy_from_slice(&out);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
