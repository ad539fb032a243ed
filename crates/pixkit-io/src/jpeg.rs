//! JPEG image format support
//!
//! Reads baseline and progressive JPEG through `jpeg-decoder` and writes
//! through `jpeg-encoder`. Only three-component RGB (YCbCr) streams are
//! accepted on read; grayscale and CMYK sources are rejected.

use crate::{IoError, IoResult};
use jpeg_decoder::PixelFormat;
use log::debug;
use pixkit_core::{ColorModel, Image};
use std::io::{Read, Write};

/// Default encoder quality
pub const DEFAULT_QUALITY: u8 = 75;

/// Options for [`write_jpeg`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegOptions {
    /// Quality 1..=100; 0 selects [`DEFAULT_QUALITY`]
    pub quality: u8,
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Read a JPEG image from a reader.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] unless the stream decodes to
/// 8-bit RGB.
pub fn read_jpeg<R: Read>(reader: R) -> IoResult<Image> {
    let mut decoder = jpeg_decoder::Decoder::new(reader);
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG: missing frame header".to_string()))?;
    debug!(
        "JPEG: {}x{} {:?}",
        info.width, info.height, info.pixel_format
    );
    if !matches!(info.pixel_format, PixelFormat::RGB24) {
        return Err(IoError::UnsupportedFormat(format!(
            "JPEG color space {:?}",
            info.pixel_format
        )));
    }

    let mut image = Image::new(info.width as u32, info.height as u32, ColorModel::Rgb)?;
    if pixels.len() < image.data().len() / 4 * 3 {
        return Err(IoError::DecodeError("JPEG: short pixel buffer".to_string()));
    }
    for (cell, rgb) in image.data_mut().chunks_exact_mut(4).zip(pixels.chunks_exact(3)) {
        cell.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 0xff]);
    }
    Ok(image)
}

/// Read a JPEG image from memory.
pub fn read_jpeg_mem(data: &[u8]) -> IoResult<Image> {
    read_jpeg(data)
}

/// Write an image as JPEG.
///
/// Any color model is accepted; a clone of the image is converted to RGB
/// for encoding.
pub fn write_jpeg<W: Write>(image: &Image, mut writer: W, options: &JpegOptions) -> IoResult<()> {
    let data = write_jpeg_mem(image, options)?;
    writer.write_all(&data)?;
    Ok(())
}

/// Encode an image as JPEG in memory.
pub fn write_jpeg_mem(image: &Image, options: &JpegOptions) -> IoResult<Vec<u8>> {
    let rgb = image.clone().to_rgb()?;
    let (width, height) = (rgb.width(), rgb.height());
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(IoError::EncodeError(format!(
            "JPEG: {}x{} exceeds 65535 pixels per side",
            width, height
        )));
    }
    let quality = if options.quality == 0 {
        DEFAULT_QUALITY
    } else {
        options.quality.min(100)
    };

    let samples: Vec<u8> = rgb
        .data()
        .chunks_exact(4)
        .flat_map(|c| [c[0], c[1], c[2]])
        .collect();

    let mut jpeg_buf = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut jpeg_buf, quality);
    encoder
        .encode(&samples, width as u16, height as u16, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| IoError::EncodeError(format!("JPEG encode error: {}", e)))?;
    debug!("JPEG: encoded {}x{} at quality {}", width, height, quality);
    Ok(jpeg_buf)
}
