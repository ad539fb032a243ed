//! Pixel access functions
//!
//! Typed views over the cell bytes. Each getter only answers for the color
//! model it reads; asking an RGB image for a gray value yields `None`, and
//! setters report [`Error::ColorModelMismatch`].

use super::{ColorModel, Image};
use crate::color;
use crate::error::{Error, Result};
use crate::palette::RgbaQuad;

impl Image {
    #[inline]
    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * self.model.bytes_per_pixel())
    }

    fn checked_offset(&self, x: u32, y: u32) -> Result<usize> {
        self.offset(x, y).ok_or(Error::IndexOutOfBounds {
            index: y as usize * self.width as usize + x as usize,
            len: self.width as usize * self.height as usize,
        })
    }

    /// Get a raw pixel value at (x, y).
    ///
    /// Index and gray cells yield their byte; color cells yield
    /// `0xRRGGBBAA`. Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        let off = self.offset(x, y)?;
        if self.model.is_color() {
            let c = &self.data[off..off + 4];
            Some(color::compose_rgba(c[0], c[1], c[2], c[3]))
        } else {
            Some(self.data[off] as u32)
        }
    }

    /// Get the palette index at (x, y) of an index image.
    pub fn index_at(&self, x: u32, y: u32) -> Option<u8> {
        if self.model != ColorModel::Index {
            return None;
        }
        self.offset(x, y).map(|off| self.data[off])
    }

    /// Get the gray value at (x, y) of a gray image.
    pub fn gray_at(&self, x: u32, y: u32) -> Option<u8> {
        if self.model != ColorModel::Gray {
            return None;
        }
        self.offset(x, y).map(|off| self.data[off])
    }

    /// Get the color at (x, y) of an RGB or RGBA image.
    pub fn color_at(&self, x: u32, y: u32) -> Option<RgbaQuad> {
        if !self.model.is_color() {
            return None;
        }
        self.offset(x, y).map(|off| {
            let c = &self.data[off..off + 4];
            RgbaQuad::new(c[0], c[1], c[2], c[3])
        })
    }

    /// Get the displayed color at (x, y) in any model.
    ///
    /// Index cells go through the palette; gray cells become opaque gray.
    /// Returns `None` out of bounds or for an index past the palette.
    pub fn resolve_color(&self, x: u32, y: u32) -> Option<RgbaQuad> {
        match self.model {
            ColorModel::Index => {
                let index = self.index_at(x, y)?;
                self.palette()?.get(index as usize)
            }
            ColorModel::Gray => self.gray_at(x, y).map(RgbaQuad::gray),
            ColorModel::Rgb | ColorModel::Rgba => self.color_at(x, y),
        }
    }

    /// Set the palette index at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] for non-index images and
    /// [`Error::IndexOutOfBounds`] when the coordinates are outside the
    /// image or `index` is not a palette entry.
    pub fn set_index(&mut self, x: u32, y: u32, index: u8) -> Result<()> {
        self.expect_model(ColorModel::Index)?;
        let len = self.palette_len();
        if index as usize >= len {
            return Err(Error::IndexOutOfBounds {
                index: index as usize,
                len,
            });
        }
        let off = self.checked_offset(x, y)?;
        self.data[off] = index;
        Ok(())
    }

    /// Set the gray value at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] for non-gray images and
    /// [`Error::IndexOutOfBounds`] when the coordinates are outside the
    /// image.
    pub fn set_gray(&mut self, x: u32, y: u32, value: u8) -> Result<()> {
        self.expect_model(ColorModel::Gray)?;
        let off = self.checked_offset(x, y)?;
        self.data[off] = value;
        Ok(())
    }

    /// Set the color at (x, y). RGB images store the color opaque.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] for index and gray images and
    /// [`Error::IndexOutOfBounds`] when the coordinates are outside the
    /// image.
    pub fn set_color(&mut self, x: u32, y: u32, color: RgbaQuad) -> Result<()> {
        if !self.model.is_color() {
            return Err(Error::ColorModelMismatch {
                expected: ColorModel::Rgba,
                actual: self.model,
            });
        }
        let color = if self.model == ColorModel::Rgb {
            color.opaque()
        } else {
            color
        };
        let off = self.checked_offset(x, y)?;
        self.data[off..off + 4].copy_from_slice(&[color.red, color.green, color.blue, color.alpha]);
        Ok(())
    }

    /// Set every cell of an index or gray image to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] for color images and
    /// [`Error::IndexOutOfBounds`] for an index past the palette.
    pub fn fill_value(&mut self, value: u8) -> Result<()> {
        match self.model {
            ColorModel::Gray => {}
            ColorModel::Index => {
                let len = self.palette_len();
                if value as usize >= len {
                    return Err(Error::IndexOutOfBounds {
                        index: value as usize,
                        len,
                    });
                }
            }
            ColorModel::Rgb | ColorModel::Rgba => {
                return Err(Error::ColorModelMismatch {
                    expected: ColorModel::Gray,
                    actual: self.model,
                });
            }
        }
        self.data.fill(value);
        Ok(())
    }

    /// Set every cell of an RGB or RGBA image to `color`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] for index and gray images.
    pub fn fill_color(&mut self, color: RgbaQuad) -> Result<()> {
        if !self.model.is_color() {
            return Err(Error::ColorModelMismatch {
                expected: ColorModel::Rgba,
                actual: self.model,
            });
        }
        let color = if self.model == ColorModel::Rgb {
            color.opaque()
        } else {
            color
        };
        for cell in self.data.chunks_exact_mut(4) {
            cell.copy_from_slice(&[color.red, color.green, color.blue, color.alpha]);
        }
        Ok(())
    }
}
