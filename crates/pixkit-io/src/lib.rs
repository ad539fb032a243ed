//! pixkit-io - Image I/O for pixkit
//!
//! This crate provides reading and writing for:
//!
//! - BMP (Windows V3/V4/V5 and OS/2 core headers, RLE4/RLE8, bitfields)
//! - PNG (via `png`)
//! - JPEG (via `jpeg-decoder` and `jpeg-encoder`)
//! - PNM (PBM, PGM, PPM in ASCII and binary)
//!
//! Each format sits behind a Cargo feature; a disabled format is reported
//! as [`IoError::UnsupportedFormat`] by the dispatch functions.

mod error;
pub mod cursor;
pub mod format;
pub mod limits;

#[cfg(feature = "bmp")]
pub mod bmp;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png-format")]
pub mod png;
#[cfg(feature = "pnm")]
pub mod pnm;

pub use error::{IoError, IoResult};
pub use format::{ImageFormat, detect_format, detect_format_from_bytes};
pub use limits::Limits;

#[cfg(feature = "bmp")]
pub use crate::bmp::{
    BmpWriteOptions, read_bmp, read_bmp_mem, read_bmp_mem_with_limits, write_bmp, write_bmp_mem,
};
#[cfg(feature = "jpeg")]
pub use crate::jpeg::{JpegOptions, read_jpeg, read_jpeg_mem, write_jpeg, write_jpeg_mem};
#[cfg(feature = "png-format")]
pub use crate::png::{read_png, read_png_mem, write_png, write_png_mem};
#[cfg(feature = "pnm")]
pub use crate::pnm::{PnmType, read_pnm, read_pnm_mem, write_pnm, write_pnm_mem};

use pixkit_core::Image;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[cfg(not(all(
    feature = "bmp",
    feature = "jpeg",
    feature = "png-format",
    feature = "pnm"
)))]
fn disabled(format: ImageFormat) -> IoError {
    IoError::UnsupportedFormat(format!("{:?} support is not enabled", format))
}

/// Decode `data` as `format`.
fn decode(data: &[u8], format: ImageFormat) -> IoResult<Image> {
    match format {
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => bmp::read_bmp_mem(data),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::read_jpeg_mem(data),
        #[cfg(feature = "png-format")]
        ImageFormat::Png => crate::png::read_png_mem(data),
        #[cfg(feature = "pnm")]
        ImageFormat::Pnm => pnm::read_pnm_mem(data),
        #[cfg(not(feature = "bmp"))]
        ImageFormat::Bmp => Err(disabled(format)),
        #[cfg(not(feature = "jpeg"))]
        ImageFormat::Jpeg => Err(disabled(format)),
        #[cfg(not(feature = "png-format"))]
        ImageFormat::Png => Err(disabled(format)),
        #[cfg(not(feature = "pnm"))]
        ImageFormat::Pnm => Err(disabled(format)),
    }
}

/// Read an image from a file.
///
/// The format comes from the file extension, falling back to the magic
/// number when the extension is missing or unknown.
pub fn read_image<P: AsRef<Path>>(path: P) -> IoResult<Image> {
    let path = path.as_ref();
    let format = match ImageFormat::from_path(path) {
        Some(format) => format,
        None => detect_format(path)?,
    };
    let data = std::fs::read(path)?;
    decode(&data, format)
}

/// Read an image from memory, detecting the format by magic number.
pub fn read_image_mem(data: &[u8]) -> IoResult<Image> {
    decode(data, detect_format_from_bytes(data)?)
}

/// PNM variant used when writing through [`write_image`]: P4 for bilevel
/// index images, P5 for gray, P6 otherwise.
#[cfg(feature = "pnm")]
fn default_pnm_type(image: &Image) -> PnmType {
    use pixkit_core::ColorModel;
    match image.model() {
        ColorModel::Index
            if image
                .palette()
                .is_some_and(pixkit_core::Palette::is_black_and_white) =>
        {
            PnmType::BinaryBitmap
        }
        ColorModel::Gray => PnmType::BinaryGraymap,
        _ => PnmType::BinaryPixmap,
    }
}

/// Encode an image in memory with default options.
pub fn write_image_mem(image: &Image, format: ImageFormat) -> IoResult<Vec<u8>> {
    match format {
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => bmp::write_bmp_mem(image, &BmpWriteOptions::default()),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::write_jpeg_mem(image, &JpegOptions::default()),
        #[cfg(feature = "png-format")]
        ImageFormat::Png => crate::png::write_png_mem(image),
        #[cfg(feature = "pnm")]
        ImageFormat::Pnm => pnm::write_pnm_mem(image, default_pnm_type(image)),
        #[cfg(not(feature = "bmp"))]
        ImageFormat::Bmp => Err(disabled(format)),
        #[cfg(not(feature = "jpeg"))]
        ImageFormat::Jpeg => Err(disabled(format)),
        #[cfg(not(feature = "png-format"))]
        ImageFormat::Png => Err(disabled(format)),
        #[cfg(not(feature = "pnm"))]
        ImageFormat::Pnm => Err(disabled(format)),
    }
}

/// Write an image to a file with default options.
///
/// The file is only created once encoding has succeeded.
pub fn write_image<P: AsRef<Path>>(image: &Image, path: P, format: ImageFormat) -> IoResult<()> {
    let data = write_image_mem(image, format)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}
