//! Codec plugin contract.
//!
//! This crate decodes and encodes nothing itself. Hosts implement
//! [`ImageCodec`] on top of whatever codec libraries they ship and hand the
//! implementations to a [`CodecRegistry`], which picks one per call by
//! [`ImageFormat`].
//!
//! Failures never panic and never return `Err`: the call yields an empty
//! result and a human-readable message goes to the caller's [`Diagnostics`]
//! sink, or to `log::warn!` if the caller passed none.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::{FormatError, Rgba8Map};

/// Sink for human-readable failure messages.
pub type Diagnostics = Vec<String>;

/// Push `msg` into `diag`, or log it if there is no sink.
pub fn report(diag: Option<&mut Diagnostics>, msg: impl fmt::Display) {
    match diag {
        Some(sink) => sink.push(alloc::format!("{msg}")),
        None => log::warn!("{msg}"),
    }
}

// ---------------------------------------------------------------------------
// ImageFormat
// ---------------------------------------------------------------------------

/// Container formats a codec can claim.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
    WebP,
    Ico,
}

impl ImageFormat {
    /// Every format, in declaration order.
    pub const ALL: [ImageFormat; 7] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::Tiff,
        ImageFormat::Bmp,
        ImageFormat::WebP,
        ImageFormat::Ico,
    ];

    /// Detect format from magic bytes. Returns `None` if unrecognized.
    pub fn detect(data: &[u8]) -> Option<Self> {
        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        // GIF: "GIF87a" or "GIF89a"
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }

        // TIFF: little-endian "II*\0" or big-endian "MM\0*"
        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            return Some(ImageFormat::Tiff);
        }

        // WebP: "RIFF....WEBP"
        if data.len() >= 12 && data[..4] == *b"RIFF" && data[8..12] == *b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        // ICO: reserved 0, type 1
        if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            return Some(ImageFormat::Ico);
        }

        // BMP: "BM", checked last since two bytes match easily
        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }

        None
    }

    /// Detect format from file extension (case-insensitive, no leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let mut buf = [0u8; 8];
        let ext_bytes = ext.as_bytes();
        if ext_bytes.len() > buf.len() {
            return None;
        }
        for (dst, &b) in buf.iter_mut().zip(ext_bytes) {
            *dst = b.to_ascii_lowercase();
        }

        match &buf[..ext_bytes.len()] {
            b"jpg" | b"jpeg" | b"jpe" | b"jfif" => Some(ImageFormat::Jpeg),
            b"png" => Some(ImageFormat::Png),
            b"gif" => Some(ImageFormat::Gif),
            b"tif" | b"tiff" => Some(ImageFormat::Tiff),
            b"bmp" | b"dib" => Some(ImageFormat::Bmp),
            b"webp" => Some(ImageFormat::WebP),
            b"ico" => Some(ImageFormat::Ico),
            _ => None,
        }
    }

    /// Magic bytes first, then the extension of `name` (if given).
    pub fn guess(data: &[u8], name: Option<&str>) -> Option<Self> {
        Self::detect(data).or_else(|| {
            let (_, ext) = name?.rsplit_once('.')?;
            Self::from_extension(ext)
        })
    }

    /// Common file extensions, preferred one first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg", "jpe", "jfif"],
            ImageFormat::Png => &["png"],
            ImageFormat::Gif => &["gif"],
            ImageFormat::Tiff => &["tif", "tiff"],
            ImageFormat::Bmp => &["bmp", "dib"],
            ImageFormat::WebP => &["webp"],
            ImageFormat::Ico => &["ico"],
        }
    }

    /// Whether `encode` quality settings mean anything for this format.
    pub fn supports_lossy(self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::WebP)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Bmp => "BMP",
            ImageFormat::WebP => "WebP",
            ImageFormat::Ico => "ICO",
        })
    }
}

// ---------------------------------------------------------------------------
// ImageCodec
// ---------------------------------------------------------------------------

/// A host-supplied decoder/encoder for one or more formats.
///
/// Implementations report failures through `diag` (see [`report`]) and
/// return an empty buffer or empty byte vector.
pub trait ImageCodec: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Formats this codec handles.
    fn formats(&self) -> &[ImageFormat];

    /// Decode `data` into 8-bit RGBA.
    fn decode(&self, data: &[u8], diag: Option<&mut Diagnostics>) -> Rgba8Map;

    /// Encode `image` as `format`. `quality` is 0..=100 and only meaningful
    /// for lossy formats.
    fn encode(
        &self,
        image: &Rgba8Map,
        format: ImageFormat,
        quality: u8,
        diag: Option<&mut Diagnostics>,
    ) -> Vec<u8>;
}

// ---------------------------------------------------------------------------
// CodecRegistry
// ---------------------------------------------------------------------------

/// Codecs available to one host, looked up per format.
///
/// When several codecs claim a format the one registered last wins.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: Vec<Box<dyn ImageCodec>>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codecs.iter().map(|c| c.name())).finish()
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, codec: impl ImageCodec + 'static) -> Self {
        self.register(codec);
        self
    }

    pub fn register(&mut self, codec: impl ImageCodec + 'static) {
        log::debug!("registered codec {} for {:?}", codec.name(), codec.formats());
        self.codecs.push(Box::new(codec));
    }

    /// Codec that handles `format`, if any.
    pub fn codec_for(&self, format: ImageFormat) -> Option<&dyn ImageCodec> {
        self.codecs
            .iter()
            .rev()
            .find(|c| c.formats().contains(&format))
            .map(|c| &**c)
    }

    /// Whether some registered codec handles `format`.
    pub fn supports(&self, format: ImageFormat) -> bool {
        self.codec_for(format).is_some()
    }

    /// Extensions of every supported format, in [`ImageFormat::ALL`] order.
    pub fn extensions(&self) -> Vec<&'static str> {
        ImageFormat::ALL
            .into_iter()
            .filter(|&f| self.supports(f))
            .flat_map(ImageFormat::extensions)
            .copied()
            .collect()
    }

    fn lookup(&self, format: Option<ImageFormat>) -> Result<&dyn ImageCodec, FormatError> {
        format
            .and_then(|f| self.codec_for(f))
            .ok_or(FormatError::UnsupportedFormat { format })
    }

    /// Decode `data`, picking the codec by magic bytes or by `name`'s extension.
    pub fn decode(
        &self,
        data: &[u8],
        name: Option<&str>,
        mut diag: Option<&mut Diagnostics>,
    ) -> Rgba8Map {
        let format = ImageFormat::guess(data, name);
        match self.lookup(format) {
            Ok(codec) => {
                let image = codec.decode(data, diag.as_deref_mut());
                if image.is_empty() {
                    log::debug!("{} returned an empty image", codec.name());
                }
                image
            }
            Err(err) => {
                report(diag, err);
                Rgba8Map::default()
            }
        }
    }

    /// Encode `image` with the codec registered for `format`.
    pub fn encode(
        &self,
        image: &Rgba8Map,
        format: ImageFormat,
        quality: u8,
        diag: Option<&mut Diagnostics>,
    ) -> Vec<u8> {
        match self.lookup(Some(format)) {
            Ok(codec) => codec.encode(image, format, quality.min(100), diag),
            Err(err) => {
                report(diag, err);
                Vec::new()
            }
        }
    }
}
