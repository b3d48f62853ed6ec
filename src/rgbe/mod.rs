// ---------------------------------------------------------------------------
// Shared-exponent RGBE packing.
//
// A float pixel becomes three 8-bit mantissas plus one biased exponent byte
// (stored in the alpha slot) common to all three channels. The row loop is
// plain per-pixel code; the v3 variant is the same loop compiled under
// #[arcane] with AVX2/FMA enabled and left to the autovectorizer. Both
// variants run identical arithmetic, so output bits never depend on the tier.
// ---------------------------------------------------------------------------

use archmage::incant;
use archmage::prelude::*;
use rgb::Rgba;

use crate::rows::{self, Threading};
use crate::{Rgba8Map, RgbaF32Map};


/// Exponent bias of the alpha byte.
pub const EXPONENT_BIAS: i32 = 128;

/// Maxima below this encode as black.
const BLACK_THRESHOLD: f32 = 1e-32;

// ===========================================================================
// Float helpers (no libm in core)
// ===========================================================================

/// `2^n` for `n` in the range an exponent byte can express.
#[inline(always)]
fn exp2i(n: i32) -> f32 {
    if n >= -126 {
        f32::from_bits(((n + 127) as u32) << 23)
    } else {
        f32::from_bits(1u32 << (n + 149))
    }
}

/// Split a positive finite `v` into `m * 2^e` with `m` in `[0.5, 1)`.
#[inline(always)]
fn frexp(v: f32) -> (f32, i32) {
    let bits = v.to_bits();
    let exp = ((bits >> 23) & 0xff) as i32;
    if exp == 0 {
        // Subnormal: renormalise, then undo the shift.
        let (m, e) = frexp(v * exp2i(25));
        return (m, e - 25);
    }
    let m = f32::from_bits((bits & 0x807f_ffff) | (126 << 23));
    (m, exp - 126)
}

// ===========================================================================
// Per-pixel codec
// ===========================================================================

#[inline(always)]
fn quantize(c: f32, scale: f32) -> u8 {
    ((c * scale).clamp(0.0, 255.0) + 0.5) as u8
}

/// Pack one float pixel. Alpha is ignored.
#[inline(always)]
pub fn encode_pixel(px: Rgba<f32>) -> Rgba<u8> {
    let v = px.r.max(px.g).max(px.b);
    if v.is_nan() || v < BLACK_THRESHOLD {
        return Rgba::new(0, 0, 0, 0);
    }
    let v = v.min(f32::MAX);
    let (m, e) = frexp(v);

    if e + EXPONENT_BIAS > 255 {
        let scale = exp2i(8 + EXPONENT_BIAS - 255);
        return Rgba::new(quantize(px.r, scale), quantize(px.g, scale), quantize(px.b, scale), 255);
    }

    let scale = m * 256.0 / v;
    Rgba::new(
        quantize(px.r, scale),
        quantize(px.g, scale),
        quantize(px.b, scale),
        (e + EXPONENT_BIAS) as u8,
    )
}

/// Unpack one RGBE pixel. Alpha comes back as 1.
#[inline(always)]
pub fn decode_pixel(px: Rgba<u8>) -> Rgba<f32> {
    let d = exp2i(i32::from(px.a) - EXPONENT_BIAS);
    let ch = |b: u8| f32::from(b) / 255.0 * d;
    Rgba::new(ch(px.r), ch(px.g), ch(px.b), 1.0)
}

// ===========================================================================
// Row kernels
// ===========================================================================

fn encode_row_impl_scalar(_token: ScalarToken, src: &[Rgba<f32>], dst: &mut [Rgba<u8>]) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = encode_pixel(*s);
    }
}

fn decode_row_impl_scalar(_token: ScalarToken, src: &[Rgba<u8>], dst: &mut [Rgba<f32>]) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = decode_pixel(*s);
    }
}

#[cfg(target_arch = "x86_64")]
#[arcane]
fn encode_row_impl_v3(_token: X64V3Token, src: &[Rgba<f32>], dst: &mut [Rgba<u8>]) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = encode_pixel(*s);
    }
}

#[cfg(target_arch = "x86_64")]
#[arcane]
fn decode_row_impl_v3(_token: X64V3Token, src: &[Rgba<u8>], dst: &mut [Rgba<f32>]) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = decode_pixel(*s);
    }
}

/// Pack a row of float pixels into `dst` (pairs beyond the shorter slice are skipped).
pub fn encode_row(src: &[Rgba<f32>], dst: &mut [Rgba<u8>]) {
    incant!(encode_row_impl(src, dst), [v3, scalar]);
}

/// Unpack a row of RGBE pixels into `dst` (pairs beyond the shorter slice are skipped).
pub fn decode_row(src: &[Rgba<u8>], dst: &mut [Rgba<f32>]) {
    incant!(decode_row_impl(src, dst), [v3, scalar]);
}

// ===========================================================================
// Public API: whole buffers
// ===========================================================================

/// Pack a float buffer into a new RGBE buffer.
pub fn encode_rgbe(src: &RgbaF32Map) -> Rgba8Map {
    let mut dst = Rgba8Map::default();
    encode_rgbe_into(src, &mut dst, Threading::Auto);
    dst
}

/// Pack `src` into `dst`, resizing `dst` to match. Fractional-size hints are
/// carried over.
pub fn encode_rgbe_into(src: &RgbaF32Map, dst: &mut Rgba8Map, threading: Threading) {
    let width = src.width();
    dst.set_size(width, src.height());
    dst.set_fractional_size(src.fw(), src.fh());
    let src = src.as_slice();
    rows::for_each_row(dst.as_mut_slice(), width, threading, |y, row| {
        encode_row(&src[y * width..(y + 1) * width], row);
    });
}

/// Unpack an RGBE buffer into a new float buffer.
pub fn decode_rgbe(src: &Rgba8Map) -> RgbaF32Map {
    let mut dst = RgbaF32Map::default();
    decode_rgbe_into(src, &mut dst, Threading::Auto);
    dst
}

/// Unpack `src` into `dst`, resizing `dst` to match. Fractional-size hints
/// are carried over.
pub fn decode_rgbe_into(src: &Rgba8Map, dst: &mut RgbaF32Map, threading: Threading) {
    let width = src.width();
    dst.set_size(width, src.height());
    dst.set_fractional_size(src.fw(), src.fh());
    let src = src.as_slice();
    rows::for_each_row(dst.as_mut_slice(), width, threading, |y, row| {
        decode_row(&src[y * width..(y + 1) * width], row);
    });
}
