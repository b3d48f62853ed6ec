//! Persisted buffer layouts.
//!
//! - **JSON** (feature `json`): `{"w": 3, "h": 2, "data": "<base64>"}` with
//!   the raw pixel bytes in row-major order. `data` is omitted for empty
//!   buffers.
//! - **Float binary**: two native-endian `u32` (width, height) followed by
//!   `w*h*4` native-endian `f32` in RGBA order.
//!
//! `try_*` functions return a [`FormatError`]; the others report the error to
//! a [`Diagnostics`] sink (or the log) and return an empty result.

use alloc::vec::Vec;

use bytemuck::allocation::pod_collect_to_vec;

use crate::codec::{Diagnostics, report};
use crate::{FormatError, PixelBuffer, RgbaF32Map};

#[cfg(feature = "json")]
pub use json::*;

const FLOAT_HEADER: usize = 2 * core::mem::size_of::<u32>();
const FLOAT_PIXEL: usize = 4 * core::mem::size_of::<f32>();

fn payload_len(width: usize, height: usize, bpp: usize) -> Result<usize, FormatError> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(bpp))
        .ok_or_else(|| FormatError::Malformed(alloc::format!("{width}x{height} overflows")))
}

// ---------------------------------------------------------------------------
// Float binary layout
// ---------------------------------------------------------------------------

/// Serialize a float buffer. Fails only if a dimension exceeds `u32`.
pub fn try_to_float_bytes(img: &RgbaF32Map) -> Result<Vec<u8>, FormatError> {
    let dim = |v: usize| {
        u32::try_from(v).map_err(|_| FormatError::Malformed(alloc::format!("dimension {v} exceeds u32")))
    };
    let (w, h) = (dim(img.width())?, dim(img.height())?);

    let pixels: &[u8] = bytemuck::cast_slice(img.as_slice());
    let mut out = Vec::with_capacity(FLOAT_HEADER + pixels.len());
    out.extend_from_slice(&w.to_ne_bytes());
    out.extend_from_slice(&h.to_ne_bytes());
    out.extend_from_slice(pixels);
    Ok(out)
}

/// Serialize a float buffer, reporting failures.
pub fn to_float_bytes(img: &RgbaF32Map, diag: Option<&mut Diagnostics>) -> Vec<u8> {
    try_to_float_bytes(img).unwrap_or_else(|err| {
        report(diag, err);
        Vec::new()
    })
}

/// Parse the float binary layout. The input length must match the header
/// exactly.
pub fn try_from_float_bytes(bytes: &[u8]) -> Result<RgbaF32Map, FormatError> {
    let Some((header, body)) = bytes.split_first_chunk::<FLOAT_HEADER>() else {
        return Err(FormatError::SizeMismatch {
            expected: FLOAT_HEADER,
            actual: bytes.len(),
        });
    };
    let (w, h) = header.split_at(4);
    let width = u32::from_ne_bytes([w[0], w[1], w[2], w[3]]) as usize;
    let height = u32::from_ne_bytes([h[0], h[1], h[2], h[3]]) as usize;

    let expected = payload_len(width, height, FLOAT_PIXEL)?;
    if body.len() != expected {
        return Err(FormatError::SizeMismatch {
            expected: FLOAT_HEADER + expected,
            actual: bytes.len(),
        });
    }

    PixelBuffer::from_vec(width, height, pod_collect_to_vec(body))
        .ok_or_else(|| FormatError::Malformed(alloc::format!("{width}x{height} payload")))
}

/// Parse the float binary layout, reporting failures.
pub fn from_float_bytes(bytes: &[u8], diag: Option<&mut Diagnostics>) -> RgbaF32Map {
    try_from_float_bytes(bytes).unwrap_or_else(|err| {
        report(diag, err);
        RgbaF32Map::default()
    })
}

// ---------------------------------------------------------------------------
// JSON + base64
// ---------------------------------------------------------------------------

#[cfg(feature = "json")]
mod json {
    use alloc::string::String;

    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Serialize};

    use super::*;

    mod sealed {
        pub trait Sealed {}
        impl Sealed for u8 {}
        impl Sealed for crate::Rgba8 {}
    }

    /// Pixel types with a JSON layout: `u8` (1 byte) and `Rgba8` (4 bytes).
    pub trait JsonPixel: sealed::Sealed + bytemuck::Pod + Default {}

    impl JsonPixel for u8 {}
    impl JsonPixel for crate::Rgba8 {}

    #[derive(Serialize, Deserialize)]
    struct Document {
        w: usize,
        h: usize,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        data: String,
    }

    /// Serialize to the JSON layout.
    pub fn try_to_json<P: JsonPixel>(img: &PixelBuffer<P>) -> Result<String, FormatError> {
        let doc = Document {
            w: img.width(),
            h: img.height(),
            data: if img.is_empty() {
                String::new()
            } else {
                STANDARD.encode(img.as_bytes())
            },
        };
        serde_json::to_string(&doc).map_err(|e| FormatError::Malformed(alloc::format!("{e}")))
    }

    /// Serialize to the JSON layout, reporting failures.
    pub fn to_json<P: JsonPixel>(img: &PixelBuffer<P>, diag: Option<&mut Diagnostics>) -> String {
        try_to_json(img).unwrap_or_else(|err| {
            report(diag, err);
            String::new()
        })
    }

    /// Parse the JSON layout.
    ///
    /// A zero width or height yields the empty buffer whatever `data` holds.
    pub fn try_from_json<P: JsonPixel>(text: &str) -> Result<PixelBuffer<P>, FormatError> {
        let doc: Document =
            serde_json::from_str(text).map_err(|e| FormatError::Malformed(alloc::format!("json: {e}")))?;
        if doc.w < 1 || doc.h < 1 {
            return Ok(PixelBuffer::default());
        }

        let bytes = STANDARD
            .decode(doc.data.as_bytes())
            .map_err(|e| FormatError::Malformed(alloc::format!("base64: {e}")))?;
        let expected = payload_len(doc.w, doc.h, core::mem::size_of::<P>())?;
        if bytes.len() != expected {
            return Err(FormatError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        PixelBuffer::from_vec(doc.w, doc.h, pod_collect_to_vec(&bytes))
            .ok_or_else(|| FormatError::Malformed(alloc::format!("{}x{} payload", doc.w, doc.h)))
    }

    /// Parse the JSON layout, reporting failures.
    pub fn from_json<P: JsonPixel>(text: &str, diag: Option<&mut Diagnostics>) -> PixelBuffer<P> {
        try_from_json(text).unwrap_or_else(|err| {
            report(diag, err);
            PixelBuffer::default()
        })
    }
}
