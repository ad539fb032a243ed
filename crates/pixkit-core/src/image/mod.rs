//! Image - The canonical pixel store
//!
//! An [`Image`] is a width×height grid of pixel cells plus a
//! [`ColorModel`] tag that says how each cell is read, and a palette when the
//! model is [`ColorModel::Index`].
//!
//! # Pixel layout
//!
//! - Rows are stored top to bottom with no padding
//! - Index and Gray cells are one byte
//! - RGB and RGBA cells are four bytes in `R, G, B, A` order; RGB consumers
//!   ignore the alpha byte, which is normally 255
//!
//! # Ownership model
//!
//! An `Image` owns its grid and palette outright. `Clone` is a deep copy.
//! Color-model conversions (see [`convert`]) consume the image and hand it
//! back in the new model.

mod access;
pub mod convert;

use crate::error::{Error, Result};
use crate::palette::Palette;
use std::fmt;

/// Color model of an image
///
/// The discriminants are the type codes printed by [`Image::dump_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorModel {
    /// Palette index per pixel
    Index = 0,
    /// Single gray byte per pixel
    Gray = 1,
    /// Opaque red/green/blue
    Rgb = 2,
    /// Red/green/blue with alpha
    Rgba = 3,
}

impl ColorModel {
    /// Bytes used by one pixel cell.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorModel::Index | ColorModel::Gray => 1,
            ColorModel::Rgb | ColorModel::Rgba => 4,
        }
    }

    /// Check whether cells are (R,G,B,A) quadruples.
    #[inline]
    pub fn is_color(self) -> bool {
        self.bytes_per_pixel() == 4
    }

    /// Lowercase name of the model.
    pub fn name(self) -> &'static str {
        match self {
            ColorModel::Index => "index",
            ColorModel::Gray => "gray",
            ColorModel::Rgb => "rgb",
            ColorModel::Rgba => "rgba",
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image - Canonical pixel store
///
/// # Examples
///
/// ```
/// use pixkit_core::{ColorModel, Image};
///
/// let img = Image::new(640, 480, ColorModel::Rgb).unwrap();
/// assert_eq!(img.width(), 640);
/// assert_eq!(img.height(), 480);
/// assert_eq!(img.data().len(), 640 * 480 * 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    model: ColorModel,
    /// Present exactly when `model == ColorModel::Index`
    palette: Option<Palette>,
    data: Vec<u8>,
}

impl Image {
    /// Create a new image with every cell zeroed.
    ///
    /// Index images start with an empty palette.
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels (must be > 0)
    /// * `height` - Height in pixels (must be > 0)
    /// * `model` - Color model of the cells
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0, or if the
    /// grid size does not fit in memory addressing.
    pub fn new(width: u32, height: u32, model: ColorModel) -> Result<Self> {
        let len = Self::grid_len(width, height, model)?;
        // Zeroed allocation; pages are committed on first write
        let data = vec![0u8; len];
        Ok(Image {
            width,
            height,
            model,
            palette: (model == ColorModel::Index).then(Palette::new),
            data,
        })
    }

    /// Create an index image with the given palette.
    ///
    /// # Errors
    ///
    /// Same as [`Image::new`].
    pub fn new_indexed(width: u32, height: u32, palette: Palette) -> Result<Self> {
        let mut img = Self::new(width, height, ColorModel::Index)?;
        img.palette = Some(palette);
        Ok(img)
    }

    fn grid_len(width: u32, height: u32, model: ColorModel) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(model.bytes_per_pixel()))
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or(Error::InvalidDimension { width, height })
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the color model.
    #[inline]
    pub fn model(&self) -> ColorModel {
        self.model
    }

    /// Bytes per stored row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.model.bytes_per_pixel()
    }

    /// Get the palette, if this is an index image.
    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Number of palette entries (0 when there is no palette).
    #[inline]
    pub fn palette_len(&self) -> usize {
        self.palette.as_ref().map_or(0, Palette::len)
    }

    /// Replace the palette of an index image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not an index
    /// image.
    pub fn set_palette(&mut self, palette: Palette) -> Result<()> {
        self.expect_model(ColorModel::Index)?;
        self.palette = Some(palette);
        Ok(())
    }

    /// Get raw access to the cell bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable access to the cell bytes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the bytes of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Get the mutable bytes of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// Reverse the row order in place (top becomes bottom).
    pub fn flip_rows(&mut self) {
        let stride = self.stride();
        let height = self.height as usize;
        for y in 0..height / 2 {
            let (upper, lower) = self.data.split_at_mut((height - 1 - y) * stride);
            upper[y * stride..(y + 1) * stride].swap_with_slice(&mut lower[..stride]);
        }
    }

    /// Check that every index cell addresses an existing palette entry.
    ///
    /// Non-index images always pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] naming the first offending index.
    pub fn validate_indices(&self) -> Result<()> {
        if self.model != ColorModel::Index {
            return Ok(());
        }
        let len = self.palette_len();
        match self.data.iter().find(|&&i| i as usize >= len) {
            Some(&index) => Err(Error::IndexOutOfBounds {
                index: index as usize,
                len,
            }),
            None => Ok(()),
        }
    }

    /// Write image metadata to a writer (for debugging).
    pub fn dump_info(&self, writer: &mut impl std::io::Write) -> Result<()> {
        writeln!(writer, "width:  {}", self.width)?;
        writeln!(writer, "height: {}", self.height)?;
        writeln!(writer, "type:   {}", self.model as u8)?;
        writeln!(writer, "pnum:   {}", self.palette_len())?;
        writeln!(
            writer,
            "palette:{}",
            if self.palette.is_some() { "yes" } else { "no" }
        )?;
        Ok(())
    }

    pub(crate) fn expect_model(&self, expected: ColorModel) -> Result<()> {
        if self.model != expected {
            return Err(Error::ColorModelMismatch {
                expected,
                actual: self.model,
            });
        }
        Ok(())
    }

    /// Swap in a new grid and model. `data` must already be sized for it.
    pub(crate) fn replace_grid(
        &mut self,
        model: ColorModel,
        data: Vec<u8>,
        palette: Option<Palette>,
    ) {
        debug_assert_eq!(
            data.len(),
            self.width as usize * self.height as usize * model.bytes_per_pixel()
        );
        self.model = model;
        self.data = data;
        self.palette = palette;
    }

    /// Change the model tag of a four-byte image without touching the cells.
    pub(crate) fn retag_color(&mut self, model: ColorModel) {
        debug_assert!(self.model.is_color() && model.is_color());
        self.model = model;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::RgbaQuad;

    #[test]
    fn test_image_creation() {
        let img = Image::new(100, 200, ColorModel::Gray).unwrap();
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 200);
        assert_eq!(img.model(), ColorModel::Gray);
        assert_eq!(img.stride(), 100);
        assert!(img.palette().is_none());
        assert!(img.data().iter().all(|&b| b == 0));

        let img = Image::new(3, 2, ColorModel::Rgba).unwrap();
        assert_eq!(img.data().len(), 24);

        let img = Image::new(3, 2, ColorModel::Index).unwrap();
        assert_eq!(img.palette_len(), 0);
        assert!(img.palette().is_some());
    }

    #[test]
    fn test_image_creation_invalid() {
        assert!(Image::new(0, 100, ColorModel::Gray).is_err());
        assert!(Image::new(100, 0, ColorModel::Rgb).is_err());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut img = Image::new_indexed(4, 4, Palette::black_and_white()).unwrap();
        let copy = img.clone();
        img.data_mut()[0] = 1;
        img.set_palette(Palette::gray_ramp()).unwrap();
        assert_eq!(copy.data()[0], 0);
        assert_eq!(copy.palette_len(), 2);
        assert_ne!(img.data().as_ptr(), copy.data().as_ptr());
    }

    #[test]
    fn test_set_palette_requires_index() {
        let mut img = Image::new(2, 2, ColorModel::Gray).unwrap();
        assert!(matches!(
            img.set_palette(Palette::gray_ramp()),
            Err(Error::ColorModelMismatch {
                expected: ColorModel::Index,
                actual: ColorModel::Gray
            })
        ));
    }

    #[test]
    fn test_flip_rows() {
        let mut img = Image::new(2, 3, ColorModel::Gray).unwrap();
        img.data_mut().copy_from_slice(&[1, 1, 2, 2, 3, 3]);
        img.flip_rows();
        assert_eq!(img.data(), &[3, 3, 2, 2, 1, 1]);

        let mut img = Image::new(1, 4, ColorModel::Gray).unwrap();
        img.data_mut().copy_from_slice(&[1, 2, 3, 4]);
        img.flip_rows();
        assert_eq!(img.data(), &[4, 3, 2, 1]);
    }

    #[test]
    fn test_validate_indices() {
        let mut img = Image::new_indexed(2, 1, Palette::black_and_white()).unwrap();
        assert!(img.validate_indices().is_ok());
        img.data_mut()[1] = 2;
        assert!(matches!(
            img.validate_indices(),
            Err(Error::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_dump_info() {
        let img = Image::new_indexed(
            5,
            7,
            Palette::from_colors(vec![RgbaQuad::BLACK; 3]).unwrap(),
        )
        .unwrap();
        let mut out = Vec::new();
        img.dump_info(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "width:  5\nheight: 7\ntype:   0\npnum:   3\npalette:yes\n"
        );
    }
}
