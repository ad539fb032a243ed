//! PNG image format support
//!
//! Decoding keeps palettes: an indexed PNG loads as an index image with
//! tRNS alpha merged into its entries. 16-bit samples are stripped to 8
//! bits and sub-byte gray samples are rescaled to 0-255.
//!
//! Encoding is always 8 bits per sample.

use crate::{IoError, IoResult};
use log::{debug, warn};
use pixkit_core::{ColorModel, Image, Palette, RgbaQuad};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::io::{BufRead, Cursor, Seek, Write};

/// Sample `x` of a packed row at `depth` bits (1, 2, 4 or 8).
#[inline]
fn sample(row: &[u8], x: usize, depth: usize) -> u8 {
    if depth == 8 {
        return row[x];
    }
    let bit = x * depth;
    let mask = ((1u16 << depth) - 1) as u8;
    (row[bit / 8] >> (8 - depth - bit % 8)) & mask
}

/// Read a PNG image
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<Image> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let width = frame.width;
    let height = frame.height;
    let depth = frame.bit_depth as u8 as usize;
    let line_size = frame.line_size;
    let data = &buf[..frame.buffer_size()];
    debug!(
        "PNG: {}x{} {:?} depth={}",
        width, height, frame.color_type, depth
    );
    if depth > 8 {
        return Err(IoError::UnsupportedFormat(format!(
            "PNG: {}-bit samples after stripping",
            depth
        )));
    }

    let rows = (0..height).map(|y| {
        let start = y as usize * line_size;
        &data[start..start + line_size]
    });

    let image = match frame.color_type {
        ColorType::Indexed => {
            let info = reader.info();
            let plte = info
                .palette
                .as_deref()
                .ok_or_else(|| IoError::DecodeError("PNG: missing PLTE chunk".to_string()))?;
            let trns = info.trns.as_deref().unwrap_or(&[]);
            let entries = plte.len() / 3;
            if trns.len() > entries {
                warn!(
                    "PNG: tRNS has {} entries for a {}-entry palette",
                    trns.len(),
                    entries
                );
            }
            let colors = plte
                .chunks_exact(3)
                .enumerate()
                .map(|(i, c)| RgbaQuad::new(c[0], c[1], c[2], trns.get(i).copied().unwrap_or(255)))
                .collect();
            debug!("PNG palette: {} entries, {} with alpha", entries, trns.len().min(entries));

            let mut image = Image::new_indexed(width, height, Palette::from_colors(colors)?)?;
            for (y, src) in rows.enumerate() {
                for (x, cell) in image.row_mut(y as u32).iter_mut().enumerate() {
                    *cell = sample(src, x, depth);
                }
            }
            image.validate_indices()?;
            image
        }
        ColorType::Grayscale => {
            let max = (1u32 << depth) - 1;
            let mut image = Image::new(width, height, ColorModel::Gray)?;
            for (y, src) in rows.enumerate() {
                for (x, cell) in image.row_mut(y as u32).iter_mut().enumerate() {
                    *cell = (sample(src, x, depth) as u32 * 255 / max) as u8;
                }
            }
            image
        }
        ColorType::GrayscaleAlpha => {
            let mut image = Image::new(width, height, ColorModel::Rgba)?;
            for (y, src) in rows.enumerate() {
                for (cell, ga) in image.row_mut(y as u32).chunks_exact_mut(4).zip(src.chunks_exact(2)) {
                    cell.copy_from_slice(&[ga[0], ga[0], ga[0], ga[1]]);
                }
            }
            image
        }
        ColorType::Rgb => {
            let mut image = Image::new(width, height, ColorModel::Rgb)?;
            for (y, src) in rows.enumerate() {
                for (cell, rgb) in image.row_mut(y as u32).chunks_exact_mut(4).zip(src.chunks_exact(3)) {
                    cell.copy_from_slice(&[rgb[0], rgb[1], rgb[2], 0xff]);
                }
            }
            image
        }
        ColorType::Rgba => {
            let mut image = Image::new(width, height, ColorModel::Rgba)?;
            for (y, src) in rows.enumerate() {
                image.row_mut(y as u32).copy_from_slice(&src[..width as usize * 4]);
            }
            image
        }
    };
    Ok(image)
}

/// Read a PNG image from memory.
pub fn read_png_mem(data: &[u8]) -> IoResult<Image> {
    read_png(Cursor::new(data))
}

/// Write a PNG image
///
/// Index images become palette PNGs. tRNS covers the palette only up to
/// its last translucent entry and is left out when every entry is opaque.
pub fn write_png<W: Write>(image: &Image, writer: W) -> IoResult<()> {
    let (color_type, data) = match image.model() {
        ColorModel::Index => (ColorType::Indexed, image.data().to_vec()),
        ColorModel::Gray => (ColorType::Grayscale, image.data().to_vec()),
        ColorModel::Rgb => (
            ColorType::Rgb,
            image
                .data()
                .chunks_exact(4)
                .flat_map(|c| [c[0], c[1], c[2]])
                .collect(),
        ),
        ColorModel::Rgba => (ColorType::Rgba, image.data().to_vec()),
    };

    let mut encoder = Encoder::new(writer, image.width(), image.height());
    encoder.set_color(color_type);
    encoder.set_depth(BitDepth::Eight);

    if let Some(palette) = image.palette() {
        image.validate_indices()?;
        let plte: Vec<u8> = palette
            .colors()
            .iter()
            .flat_map(|c| [c.red, c.green, c.blue])
            .collect();
        encoder.set_palette(plte);
        let translucent = palette.translucent_len();
        if translucent > 0 {
            let trns: Vec<u8> = palette.colors()[..translucent]
                .iter()
                .map(|c| c.alpha)
                .collect();
            encoder.set_trns(trns);
        }
        debug!("PNG palette: {} entries, tRNS {}", palette.len(), translucent);
    }

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;
    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;

    Ok(())
}

/// Encode an image as PNG in memory.
pub fn write_png_mem(image: &Image) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_png(image, &mut buffer)?;
    Ok(buffer)
}
