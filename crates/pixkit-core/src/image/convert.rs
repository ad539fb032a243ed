//! Color-model conversion functions
//!
//! Every conversion consumes the image and returns it in the target model.
//! Pairwise steps check their source model and fail with
//! [`Error::ColorModelMismatch`] otherwise; the `to_*` entry points chain
//! the steps from whatever model the image is in.
//!
//! Leaving RGBA for any other model composites onto opaque white first.

use super::{ColorModel, Image};
use crate::error::{Error, Result};
use crate::palette::{MAX_PALETTE_ENTRIES, Palette, RgbaQuad};
use log::debug;

/// BT.601 luma weights used by [`Image::rgb_to_gray`].
const RED_WEIGHT: f32 = 0.299;
const GREEN_WEIGHT: f32 = 0.587;
const BLUE_WEIGHT: f32 = 0.114;

/// Gray values below this become black in [`Image::gray_to_binary`].
const BINARY_THRESHOLD: u8 = 128;

/// Composite one channel over a background: `(fg*a + bg*(255-a) + 127) / 255`.
#[inline]
fn blend_channel(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
}

/// Luma of an RGB triple, rounded.
#[inline]
pub fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    (RED_WEIGHT * r as f32 + GREEN_WEIGHT * g as f32 + BLUE_WEIGHT * b as f32 + 0.5) as u8
}

impl Image {
    /// Replace every index with its palette entry and drop the palette.
    ///
    /// Cells take the palette entry verbatim, alpha included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not an index
    /// image and [`Error::IndexOutOfBounds`] if any index is not a palette
    /// entry.
    pub fn index_to_rgb(mut self) -> Result<Image> {
        self.expect_model(ColorModel::Index)?;
        let palette = self.palette.take().ok_or(Error::PaletteRequired)?;
        let colors = palette.colors();
        let mut data = Vec::with_capacity(self.data.len() * 4);
        for &index in &self.data {
            let c = colors.get(index as usize).ok_or(Error::IndexOutOfBounds {
                index: index as usize,
                len: colors.len(),
            })?;
            data.extend_from_slice(&[c.red, c.green, c.blue, c.alpha]);
        }
        self.replace_grid(ColorModel::Rgb, data, None);
        Ok(self)
    }

    /// Build a palette from the distinct colors, in first-seen order, and
    /// replace each pixel with its palette index.
    ///
    /// Colors are compared on all four components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not RGB and
    /// [`Error::PaletteOverflow`] if it holds more than 256 distinct colors.
    pub fn rgb_to_index(mut self) -> Result<Image> {
        self.expect_model(ColorModel::Rgb)?;
        let mut palette = Palette::new();
        let mut data = Vec::with_capacity(self.data.len() / 4);
        let mut last: Option<(RgbaQuad, u8)> = None;
        for cell in self.data.chunks_exact(4) {
            let color = RgbaQuad::new(cell[0], cell[1], cell[2], cell[3]);
            let index = match last {
                Some((c, i)) if c == color => i,
                _ => {
                    let i = match palette.find(color) {
                        Some(i) => i,
                        None => {
                            if palette.len() == MAX_PALETTE_ENTRIES {
                                return Err(Error::PaletteOverflow(MAX_PALETTE_ENTRIES + 1));
                            }
                            palette.add_color(color)?
                        }
                    } as u8;
                    last = Some((color, i));
                    i
                }
            };
            data.push(index);
        }
        debug!("rgb_to_index: {} palette entries", palette.len());
        self.replace_grid(ColorModel::Index, data, Some(palette));
        Ok(self)
    }

    /// Reinterpret gray values as indices into the identity gray ramp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not gray.
    pub fn gray_to_index(mut self) -> Result<Image> {
        self.expect_model(ColorModel::Gray)?;
        let data = std::mem::take(&mut self.data);
        self.replace_grid(ColorModel::Index, data, Some(Palette::gray_ramp()));
        Ok(self)
    }

    /// Composite onto an opaque background color; alpha becomes 255.
    ///
    /// # Arguments
    ///
    /// * `background` - Color under transparent pixels; its alpha is ignored
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not RGBA.
    pub fn rgba_to_rgb(mut self, background: RgbaQuad) -> Result<Image> {
        self.expect_model(ColorModel::Rgba)?;
        for cell in self.data.chunks_exact_mut(4) {
            let a = cell[3];
            cell[0] = blend_channel(cell[0], background.red, a);
            cell[1] = blend_channel(cell[1], background.green, a);
            cell[2] = blend_channel(cell[2], background.blue, a);
            cell[3] = 255;
        }
        self.retag_color(ColorModel::Rgb);
        Ok(self)
    }

    /// Drop alpha without compositing; alpha becomes 255.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not RGBA.
    pub fn rgba_to_rgb_ignore_alpha(mut self) -> Result<Image> {
        self.expect_model(ColorModel::Rgba)?;
        for cell in self.data.chunks_exact_mut(4) {
            cell[3] = 255;
        }
        self.retag_color(ColorModel::Rgb);
        Ok(self)
    }

    /// Spread each gray value over R, G and B.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not gray.
    pub fn gray_to_rgb(mut self) -> Result<Image> {
        self.expect_model(ColorModel::Gray)?;
        let data = self.data.iter().flat_map(|&g| [g, g, g, 255]).collect();
        self.replace_grid(ColorModel::Rgb, data, None);
        Ok(self)
    }

    /// Reduce to gray using `0.299 R + 0.587 G + 0.114 B`, rounded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not RGB.
    pub fn rgb_to_gray(mut self) -> Result<Image> {
        self.expect_model(ColorModel::Rgb)?;
        let data = self
            .data
            .chunks_exact(4)
            .map(|c| rgb_to_luma(c[0], c[1], c[2]))
            .collect();
        self.replace_grid(ColorModel::Gray, data, None);
        Ok(self)
    }

    /// Threshold gray into a bilevel index image.
    ///
    /// Gray values below 128 become index 1 (black), the rest index 0
    /// (white), with the palette `[white, black]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColorModelMismatch`] if the image is not gray.
    pub fn gray_to_binary(mut self) -> Result<Image> {
        self.expect_model(ColorModel::Gray)?;
        let data = self
            .data
            .iter()
            .map(|&g| u8::from(g < BINARY_THRESHOLD))
            .collect();
        self.replace_grid(ColorModel::Index, data, Some(Palette::black_and_white()));
        Ok(self)
    }

    /// Convert to an index image from any model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteOverflow`] when a color image holds more than
    /// 256 distinct colors.
    pub fn to_index(self) -> Result<Image> {
        match self.model {
            ColorModel::Index => Ok(self),
            ColorModel::Gray => self.gray_to_index(),
            ColorModel::Rgb => self.rgb_to_index(),
            ColorModel::Rgba => self.rgba_to_rgb(RgbaQuad::WHITE)?.rgb_to_index(),
        }
    }

    /// Convert to a gray image from any model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] for an index image whose pixels
    /// address missing palette entries.
    pub fn to_gray(self) -> Result<Image> {
        match self.model {
            ColorModel::Index => self.index_to_rgb()?.rgb_to_gray(),
            ColorModel::Gray => Ok(self),
            ColorModel::Rgb => self.rgb_to_gray(),
            ColorModel::Rgba => self.rgba_to_rgb(RgbaQuad::WHITE)?.rgb_to_gray(),
        }
    }

    /// Convert to an RGB image from any model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] for an index image whose pixels
    /// address missing palette entries.
    pub fn to_rgb(self) -> Result<Image> {
        match self.model {
            ColorModel::Index => self.index_to_rgb(),
            ColorModel::Gray => self.gray_to_rgb(),
            ColorModel::Rgb => Ok(self),
            ColorModel::Rgba => self.rgba_to_rgb(RgbaQuad::WHITE),
        }
    }

    /// Convert to an RGBA image from any model.
    ///
    /// Index and gray images go through RGB and are then retagged, so
    /// palette alpha survives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] for an index image whose pixels
    /// address missing palette entries.
    pub fn to_rgba(self) -> Result<Image> {
        let mut img = match self.model {
            ColorModel::Index => self.index_to_rgb()?,
            ColorModel::Gray => self.gray_to_rgb()?,
            ColorModel::Rgb | ColorModel::Rgba => self,
        };
        img.retag_color(ColorModel::Rgba);
        Ok(img)
    }

    /// Convert to `target` from any model.
    ///
    /// # Errors
    ///
    /// See [`to_index`](Self::to_index), [`to_gray`](Self::to_gray),
    /// [`to_rgb`](Self::to_rgb) and [`to_rgba`](Self::to_rgba).
    pub fn convert(self, target: ColorModel) -> Result<Image> {
        match target {
            ColorModel::Index => self.to_index(),
            ColorModel::Gray => self.to_gray(),
            ColorModel::Rgb => self.to_rgb(),
            ColorModel::Rgba => self.to_rgba(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_image(colors: &[RgbaQuad], width: u32) -> Image {
        let height = colors.len() as u32 / width;
        let mut img = Image::new(width, height, ColorModel::Rgb).unwrap();
        for (i, &c) in colors.iter().enumerate() {
            let i = i as u32;
            img.set_color(i % width, i / width, c).unwrap();
        }
        img
    }

    #[test]
    fn test_blend_channel() {
        assert_eq!(blend_channel(200, 0, 255), 200);
        assert_eq!(blend_channel(200, 50, 0), 50);
        // (100*128 + 255*127 + 127) / 255 = 177
        assert_eq!(blend_channel(100, 255, 128), 177);
    }

    #[test]
    fn test_rgb_to_luma() {
        assert_eq!(rgb_to_luma(255, 255, 255), 255);
        assert_eq!(rgb_to_luma(0, 0, 0), 0);
        assert_eq!(rgb_to_luma(255, 0, 0), 76);
        assert_eq!(rgb_to_luma(0, 255, 0), 150);
        assert_eq!(rgb_to_luma(0, 0, 255), 29);
    }

    #[test]
    fn test_index_to_rgb() {
        let pal = Palette::from_colors(vec![RgbaQuad::rgb(1, 2, 3), RgbaQuad::rgb(4, 5, 6)]).unwrap();
        let mut img = Image::new_indexed(2, 1, pal).unwrap();
        img.set_index(1, 0, 1).unwrap();
        let img = img.index_to_rgb().unwrap();
        assert_eq!(img.model(), ColorModel::Rgb);
        assert!(img.palette().is_none());
        assert_eq!(img.color_at(0, 0), Some(RgbaQuad::rgb(1, 2, 3)));
        assert_eq!(img.color_at(1, 0), Some(RgbaQuad::rgb(4, 5, 6)));
    }

    #[test]
    fn test_index_to_rgb_rejects_bad_index() {
        let mut img = Image::new_indexed(2, 2, Palette::black_and_white()).unwrap();
        img.data_mut()[3] = 2;
        assert!(matches!(
            img.index_to_rgb(),
            Err(Error::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_rgb_to_index_first_seen_order() {
        let red = RgbaQuad::rgb(255, 0, 0);
        let blue = RgbaQuad::rgb(0, 0, 255);
        let img = rgb_image(&[blue, red, blue, red, red, blue], 3);
        let img = img.rgb_to_index().unwrap();
        assert_eq!(img.palette().unwrap().colors(), &[blue, red]);
        assert_eq!(img.data(), &[0, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn test_rgb_to_index_overflow() {
        let colors: Vec<RgbaQuad> = (0..257u32)
            .map(|i| RgbaQuad::rgb((i % 256) as u8, (i / 256) as u8, 0))
            .collect();
        let img = rgb_image(&colors, 257);
        assert!(matches!(img.rgb_to_index(), Err(Error::PaletteOverflow(_))));

        let img = rgb_image(&colors[..256], 256);
        assert_eq!(img.rgb_to_index().unwrap().palette_len(), 256);
    }

    #[test]
    fn test_gray_to_index() {
        let mut img = Image::new(2, 1, ColorModel::Gray).unwrap();
        img.set_gray(1, 0, 200).unwrap();
        let img = img.gray_to_index().unwrap();
        assert_eq!(img.palette_len(), 256);
        assert_eq!(img.index_at(1, 0), Some(200));
        assert_eq!(img.resolve_color(1, 0), Some(RgbaQuad::gray(200)));
    }

    #[test]
    fn test_rgba_to_rgb_composites() {
        let mut img = Image::new(2, 1, ColorModel::Rgba).unwrap();
        img.set_color(0, 0, RgbaQuad::new(100, 0, 255, 128)).unwrap();
        img.set_color(1, 0, RgbaQuad::new(10, 20, 30, 255)).unwrap();
        let img = img.rgba_to_rgb(RgbaQuad::WHITE).unwrap();
        assert_eq!(img.model(), ColorModel::Rgb);
        assert_eq!(img.color_at(0, 0), Some(RgbaQuad::rgb(177, 127, 255)));
        assert_eq!(img.color_at(1, 0), Some(RgbaQuad::rgb(10, 20, 30)));
    }

    #[test]
    fn test_rgba_round_trip_loses_alpha() {
        let mut img = Image::new(1, 1, ColorModel::Rgba).unwrap();
        img.set_color(0, 0, RgbaQuad::new(10, 20, 30, 40)).unwrap();
        let img = img.to_rgb().unwrap().to_rgba().unwrap();
        assert_eq!(img.model(), ColorModel::Rgba);
        assert_eq!(img.color_at(0, 0).unwrap().alpha, 255);
    }

    #[test]
    fn test_rgba_to_rgb_ignore_alpha() {
        let mut img = Image::new(1, 1, ColorModel::Rgba).unwrap();
        img.set_color(0, 0, RgbaQuad::new(10, 20, 30, 0)).unwrap();
        let img = img.rgba_to_rgb_ignore_alpha().unwrap();
        assert_eq!(img.color_at(0, 0), Some(RgbaQuad::rgb(10, 20, 30)));
    }

    #[test]
    fn test_gray_rgb_round_trip() {
        let mut img = Image::new(3, 1, ColorModel::Gray).unwrap();
        img.set_gray(0, 0, 0).unwrap();
        img.set_gray(1, 0, 128).unwrap();
        img.set_gray(2, 0, 255).unwrap();
        let rgb = img.clone().gray_to_rgb().unwrap();
        assert_eq!(rgb.color_at(1, 0), Some(RgbaQuad::gray(128)));
        let back = rgb.rgb_to_gray().unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_gray_to_binary_threshold() {
        let mut img = Image::new(2, 1, ColorModel::Gray).unwrap();
        img.set_gray(0, 0, 127).unwrap();
        img.set_gray(1, 0, 128).unwrap();
        let img = img.gray_to_binary().unwrap();
        assert_eq!(img.index_at(0, 0), Some(1));
        assert_eq!(img.index_at(1, 0), Some(0));
        assert!(img.palette().unwrap().is_black_and_white());
    }

    #[test]
    fn test_precondition_mismatch() {
        let img = Image::new(1, 1, ColorModel::Gray).unwrap();
        assert!(matches!(
            img.rgb_to_gray(),
            Err(Error::ColorModelMismatch {
                expected: ColorModel::Rgb,
                actual: ColorModel::Gray
            })
        ));
        let img = Image::new(1, 1, ColorModel::Rgb).unwrap();
        assert!(img.clone().index_to_rgb().is_err());
        assert!(img.clone().gray_to_binary().is_err());
        assert!(img.rgba_to_rgb(RgbaQuad::WHITE).is_err());
    }

    #[test]
    fn test_rgb_to_rgb_is_noop() {
        let img = rgb_image(&[RgbaQuad::rgb(1, 2, 3), RgbaQuad::rgb(4, 5, 6)], 2);
        assert_eq!(img.clone().to_rgb().unwrap(), img);
        assert_eq!(img.clone().convert(ColorModel::Rgb).unwrap(), img);
    }

    #[test]
    fn test_to_rgba_keeps_palette_alpha() {
        let pal = Palette::from_colors(vec![RgbaQuad::new(9, 9, 9, 0)]).unwrap();
        let img = Image::new_indexed(1, 1, pal).unwrap();
        let img = img.to_rgba().unwrap();
        assert_eq!(img.color_at(0, 0), Some(RgbaQuad::new(9, 9, 9, 0)));
    }

    #[test]
    fn test_to_index_from_rgba() {
        let mut img = Image::new(2, 1, ColorModel::Rgba).unwrap();
        img.set_color(0, 0, RgbaQuad::new(0, 0, 0, 0)).unwrap();
        img.set_color(1, 0, RgbaQuad::new(255, 255, 255, 255)).unwrap();
        let img = img.to_index().unwrap();
        // Transparent black composites to white, so both pixels share it
        assert_eq!(img.palette().unwrap().colors(), &[RgbaQuad::WHITE]);
    }

    #[test]
    fn test_to_gray_from_index() {
        let pal = Palette::from_colors(vec![RgbaQuad::rgb(255, 0, 0)]).unwrap();
        let img = Image::new_indexed(1, 1, pal).unwrap();
        let img = img.to_gray().unwrap();
        assert_eq!(img.gray_at(0, 0), Some(76));
    }
}
