//! Error types for pixkit-core
//!
//! Every fallible operation on an [`Image`](crate::Image) or a
//! [`Palette`](crate::Palette) reports one of these variants. Conversions
//! consume their input, so an error also means the input image is gone.

use crate::image::ColorModel;
use thiserror::Error;

/// pixkit-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// The image is not in the color model the operation expects
    #[error("color model mismatch: expected {expected}, got {actual}")]
    ColorModelMismatch {
        expected: ColorModel,
        actual: ColorModel,
    },

    /// Index out of bounds (pixel index past the palette, or coordinates)
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// More distinct colors than a palette can hold
    #[error("palette overflow: {0} colors exceed 256 entries")]
    PaletteOverflow(usize),

    /// Palette required but not present
    #[error("palette required but not present")]
    PaletteRequired,

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pixkit-core operations
pub type Result<T> = std::result::Result<T, Error>;
