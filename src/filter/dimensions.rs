//! Image dimension probing.
//!
//! Only the header is inspected; no pixel data is decoded.

use std::fmt;

use thiserror::Error;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The bytes could not be read as an image.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot read image dimensions: {reason}")]
pub struct DecodeError {
    reason: String,
}

impl DecodeError {
    /// Creates a decode error with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The reason the bytes were rejected.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Reads image dimensions from raw bytes.
pub trait DimensionProbe: Send + Sync + fmt::Debug {
    /// Returns the dimensions encoded in `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the format is unknown or the header is
    /// truncated.
    fn dimensions(&self, bytes: &[u8]) -> Result<Dimensions, DecodeError>;
}

/// Header-only probe backed by the `imagesize` crate.
#[cfg(feature = "dimensions")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSizeProbe;

#[cfg(feature = "dimensions")]
impl DimensionProbe for ImageSizeProbe {
    fn dimensions(&self, bytes: &[u8]) -> Result<Dimensions, DecodeError> {
        let size = imagesize::blob_size(bytes).map_err(|e| DecodeError::new(e.to_string()))?;
        Ok(Dimensions {
            width: u32::try_from(size.width).unwrap_or(u32::MAX),
            height: u32::try_from(size.height).unwrap_or(u32::MAX),
        })
    }
}

/// The probe compiled into this build, if any.
#[must_use]
pub fn default_probe() -> Option<Box<dyn DimensionProbe>> {
    #[cfg(feature = "dimensions")]
    {
        Some(Box::new(ImageSizeProbe))
    }
    #[cfg(not(feature = "dimensions"))]
    {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Minimal PNG: signature plus IHDR chunk for a `width`x`height` image.
    pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes
    }
}
