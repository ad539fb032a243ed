//! pixkit core - In-memory pixel store and color models
//!
//! This crate provides the data structures every pixkit codec decodes into
//! and encodes from:
//!
//! - [`Image`] - The canonical pixel store
//! - [`ColorModel`] - How an image's cells are interpreted
//! - [`Palette`] / [`RgbaQuad`] - Color table for index images
//!
//! Conversions between color models live on [`Image`]; see
//! [`image::convert`].

pub mod error;
pub mod image;
pub mod palette;

pub use error::{Error, Result};
pub use image::convert::rgb_to_luma;
pub use image::{ColorModel, Image};
pub use palette::{MAX_PALETTE_ENTRIES, Palette, RgbaQuad, color_from_rgb, color_from_rgba};

/// Packing of RGB/RGBA cells into the `u32` returned by
/// [`Image::get_pixel`]: `0xRRGGBBAA`, red in the most significant byte.
pub mod color {
    #[inline]
    pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
        u32::from_be_bytes([r, g, b, a])
    }

    #[inline]
    pub fn extract_rgba(pixel: u32) -> (u8, u8, u8, u8) {
        let [r, g, b, a] = pixel.to_be_bytes();
        (r, g, b, a)
    }

}
