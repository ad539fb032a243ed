//! pixkit - Image codec toolkit
//!
//! Decodes BMP, PNG, JPEG and PNM files into one in-memory pixel store,
//! converts between color models, and encodes back out.
//!
//! # Overview
//!
//! - [`Image`] holds index, gray, RGB or RGBA pixels
//! - [`io`] reads and writes every supported format
//! - The `pixkit` binary runs each input through a fixed battery of
//!   conversions and writes the results to an output directory
//!
//! # Example
//!
//! ```
//! use pixkit::{ColorModel, Image, RgbaQuad};
//! use pixkit::io::{ImageFormat, read_image_mem, write_image_mem};
//!
//! let mut img = Image::new(4, 4, ColorModel::Rgb).unwrap();
//! img.fill_color(RgbaQuad::rgb(40, 80, 120)).unwrap();
//! let bmp = write_image_mem(&img, ImageFormat::Bmp).unwrap();
//! assert_eq!(read_image_mem(&bmp).unwrap(), img);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use pixkit_core::*;

// Re-export the codec crate as a module to avoid name conflicts
pub use pixkit_io as io;

mod cli;
mod driver;
mod logger;

pub use cli::{Arguments, CLIParser};
pub use driver::{Outcome, run};
pub use logger::{LoggerError, init_logger};
