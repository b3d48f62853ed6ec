//! # vellum
//!
//! *Stretch your pixels without tearing them.*
//!
//! In-memory 2D pixel buffers for asset pipelines that need to hold, reshape,
//! resample and repack raster data without pulling in an image codec.
//!
//! ## Core pieces
//!
//! - [`PixelBuffer`]: row-major storage with copy-on-write value semantics.
//!   Cloning is O(1); the first mutation of a shared handle detaches it.
//! - [`scale`]: area-weighted box resampling with [`ScaleMode`] fit policies
//!   and pluggable per-pixel aggregation.
//! - [`rgbe`]: float RGBA ⇄ shared-exponent RGBE packing, dispatched to the
//!   best available CPU tier.
//! - [`rows`]: the row scheduler both of the above fan out through.
//!
//! Around those sit channel [`convert`]ers, the [`codec`] plugin contract and
//! the [`serial`] layouts used to persist buffers.
//!
//! ## Feature flags
//!
//! - **`std`** (default): row work runs on the rayon pool. Without it
//!   every row runs on the calling thread, with identical results.
//! - **`json`** (default): JSON + base64 buffer serialization.
//! - **`imgref`**: borrow buffers as `imgref` images and build them from
//!   `ImgVec`.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod buffer;
mod error;

pub mod codec;
pub mod convert;
pub mod rgbe;
pub mod rows;
pub mod scale;
pub mod serial;

pub use buffer::PixelBuffer;
pub use codec::Diagnostics;
pub use error::FormatError;
pub use rows::Threading;
pub use scale::{ScaleDetails, ScaleMode};

pub use rgb;

/// 8-bit RGBA pixel.
pub type Rgba8 = rgb::Rgba<u8>;

/// Linear float RGBA pixel.
pub type RgbaF32 = rgb::Rgba<f32>;

/// Buffer of 8-bit RGBA pixels.
pub type Rgba8Map = PixelBuffer<Rgba8>;

/// Buffer of float RGBA pixels.
pub type RgbaF32Map = PixelBuffer<RgbaF32>;

/// Single-channel 8-bit buffer (masks, gray maps).
pub type GrayMap = PixelBuffer<u8>;
