//! Decode resource limits
//!
//! Headers declare their own geometry, and compressed pixel data can
//! describe an image far larger than the file. Decoders check the declared
//! size against [`Limits`] before allocating the pixel grid.

use crate::{IoError, IoResult};

/// Caps on the geometry and pixel memory a decoder may allocate.
///
/// A `None` field is unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height)
    pub max_pixels: Option<u64>,
    /// Maximum bytes for the decoded pixel grid
    pub max_memory_bytes: Option<u64>,
}

impl Default for Limits {
    /// No per-axis caps, 2^28 pixels and 1 GiB of pixel memory.
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: Some(1 << 28),
            max_memory_bytes: Some(1 << 30),
        }
    }
}

impl Limits {
    /// Limits that accept anything addressable.
    pub fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: None,
            max_memory_bytes: None,
        }
    }

    /// Check dimensions against the limits.
    pub fn check(&self, width: u32, height: u32) -> IoResult<()> {
        if let Some(max_w) = self.max_width
            && u64::from(width) > max_w
        {
            return Err(IoError::LimitExceeded(format!(
                "width {} exceeds limit {}",
                width, max_w
            )));
        }
        if let Some(max_h) = self.max_height
            && u64::from(height) > max_h
        {
            return Err(IoError::LimitExceeded(format!(
                "height {} exceeds limit {}",
                height, max_h
            )));
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(IoError::LimitExceeded(format!(
                    "pixel count {} exceeds limit {}",
                    pixels, max_px
                )));
            }
        }
        Ok(())
    }

    /// Check that an allocation size is within the memory limit.
    pub fn check_memory(&self, bytes: u64) -> IoResult<()> {
        if let Some(max_mem) = self.max_memory_bytes
            && bytes > max_mem
        {
            return Err(IoError::LimitExceeded(format!(
                "allocation of {} bytes exceeds limit {}",
                bytes, max_mem
            )));
        }
        Ok(())
    }
}
