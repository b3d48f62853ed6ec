use alloc::string::String;
use core::fmt;

use crate::codec::ImageFormat;

/// Failure of a fallible conversion or codec dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    /// Decoded payload length does not match the declared dimensions.
    SizeMismatch {
        /// Bytes implied by the header.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// No registered codec handles the format (`None` if it was not recognised).
    UnsupportedFormat {
        /// Detected format, if any.
        format: Option<ImageFormat>,
    },
    /// Input could not be parsed.
    Malformed(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "payload size mismatch: expected {expected} bytes, got {actual}")
            }
            Self::UnsupportedFormat { format: Some(format) } => {
                write!(f, "no codec registered for {format}")
            }
            Self::UnsupportedFormat { format: None } => f.write_str("unrecognised image format"),
            Self::Malformed(msg) => write!(f, "malformed input: {msg}"),
        }
    }
}

impl core::error::Error for FormatError {}
