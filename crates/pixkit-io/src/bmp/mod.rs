//! BMP image format support
//!
//! Reads Windows and OS/2 bitmaps: core, V3, V4 and V5 info headers at
//! 1/4/8/16/24/32 bits, with RGB, RLE4, RLE8 or BITFIELDS compression.
//!
//! Writes Windows V3 headers, or V5 headers with A8R8G8B8 bitfields for
//! RGBA images. Index images are written at 1, 4 or 8 bits depending on
//! the palette size, optionally RLE-compressed; gray images are written as
//! 8-bit index images with a gray ramp palette.

pub mod header;
mod pixels;
mod rle;

use crate::cursor::ByteCursor;
use crate::{IoError, IoResult, Limits};
use header::{BmpHeader, Compression};
use log::debug;
use pixkit_core::{ColorModel, Image};
use std::io::{Read, Write};

/// Options for [`write_bmp`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BmpWriteOptions {
    /// RLE-compress 4- and 8-bit index images
    pub compress: bool,
}

/// Read a BMP image from a stream.
pub fn read_bmp<R: Read>(mut reader: R) -> IoResult<Image> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    read_bmp_mem(&data)
}

/// Read a BMP image from memory with the default [`Limits`].
///
/// # Errors
///
/// Fails on a structurally invalid or truncated file, and with
/// [`pixkit_core::Error::IndexOutOfBounds`] if a pixel addresses a missing
/// palette entry.
pub fn read_bmp_mem(data: &[u8]) -> IoResult<Image> {
    read_bmp_mem_with_limits(data, &Limits::default())
}

/// Read a BMP image from memory, checking the declared geometry against
/// `limits` before the pixel grid is allocated.
///
/// # Errors
///
/// As [`read_bmp_mem`], plus [`IoError::LimitExceeded`] when the header
/// declares an image beyond `limits`.
pub fn read_bmp_mem_with_limits(data: &[u8], limits: &Limits) -> IoResult<Image> {
    let mut cursor = ByteCursor::new(data);
    let header = BmpHeader::read(&mut cursor)?;

    let width = header.pixel_width();
    let height = header.rows();
    let offset = header.pixel_offset as usize;

    let rle = matches!(header.compression, Compression::Rle4 | Compression::Rle8);
    if !rle {
        let needed = header.stride() as u64 * height as u64;
        let available = data.len().saturating_sub(offset) as u64;
        if needed > available {
            return Err(IoError::InvalidData(format!(
                "BMP pixel data truncated: {} of {} bytes",
                available, needed
            )));
        }
    }

    let model = if header.bit_count <= 8 {
        ColorModel::Index
    } else if header.has_alpha() {
        ColorModel::Rgba
    } else {
        ColorModel::Rgb
    };
    limits.check(width, height)?;
    limits.check_memory(u64::from(width) * u64::from(height) * model.bytes_per_pixel() as u64)?;
    let mut image = Image::new(width, height, model)?;
    if model == ColorModel::Index {
        image.set_palette(header.read_palette(&mut cursor)?)?;
    }

    cursor.seek(offset);
    cursor.finish("BMP file")?;
    if rle {
        rle::read_rle(header.bit_count, &mut cursor, &mut image)?;
    } else {
        pixels::read_rows(&header, &mut cursor, &mut image)?;
    }

    if header.top_down() {
        image.flip_rows();
    }
    image.validate_indices()?;
    Ok(image)
}

/// Bits per pixel the writer uses for an image.
fn bit_count_for(image: &Image) -> u16 {
    match image.model() {
        ColorModel::Index => match image.palette_len() {
            0..=2 => 1,
            3..=16 => 4,
            _ => 8,
        },
        ColorModel::Gray => 8,
        ColorModel::Rgb => 24,
        ColorModel::Rgba => 32,
    }
}

/// Encode an image as a BMP file in memory.
///
/// # Errors
///
/// Returns [`pixkit_core::Error::IndexOutOfBounds`] for an index image whose
/// pixels address missing palette entries.
pub fn write_bmp_mem(image: &Image, options: &BmpWriteOptions) -> IoResult<Vec<u8>> {
    let converted;
    let image = if image.model() == ColorModel::Gray {
        converted = image.clone().gray_to_index()?;
        &converted
    } else {
        image
    };
    image.validate_indices()?;

    let bit_count = bit_count_for(image);
    let rle = options.compress && matches!(bit_count, 4 | 8);
    let compression = match bit_count {
        32 => Compression::Bitfields,
        4 if rle => Compression::Rle4,
        8 if rle => Compression::Rle8,
        _ => Compression::Rgb,
    };
    let raw_size = header::stride(image.width(), bit_count) * image.height() as usize;
    let header = BmpHeader::for_image(
        image.width(),
        image.height(),
        bit_count,
        compression,
        image.palette_len(),
        raw_size as u32,
    );
    debug!(
        "BMP write: {}x{} bit_count={} compression={:?}",
        image.width(),
        image.height(),
        bit_count,
        compression
    );

    let mut out = vec![0u8; header.pixel_offset as usize];
    let mut cursor = ByteCursor::new(&mut out[..]);
    header.write(&mut cursor);
    if let Some(palette) = image.palette() {
        header::write_palette(&mut cursor, palette, bit_count);
    }
    if cursor.has_error() || cursor.remaining() != 0 {
        return Err(IoError::EncodeError(
            "BMP header layout mismatch".to_string(),
        ));
    }

    if rle {
        out.reserve(raw_size / 2);
        let image_size = rle::write_rle(image, bit_count, &mut out);
        BmpHeader::patch_sizes(&mut out, image_size as u32);
        debug!("BMP RLE: {} bytes (uncompressed {})", image_size, raw_size);
    } else {
        out.reserve(raw_size);
        pixels::write_rows(image, bit_count, &mut out);
    }
    Ok(out)
}

/// Write a BMP image to a stream.
pub fn write_bmp<W: Write>(image: &Image, mut writer: W, options: &BmpWriteOptions) -> IoResult<()> {
    let data = write_bmp_mem(image, options)?;
    writer.write_all(&data)?;
    Ok(())
}
