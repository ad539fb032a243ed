//! Deterministic test images
//!
//! Each builder fills every pixel from its coordinates, so two calls with
//! the same arguments produce identical images.

use pixkit_core::{ColorModel, Image, Palette, RgbaQuad};

fn scale(v: u32, max: u32) -> u8 {
    if max == 0 {
        0
    } else {
        (v * 255 / max) as u8
    }
}

/// RGB image with red rising left to right and green rising top to bottom.
///
/// # Panics
///
/// Panics if either dimension is 0.
pub fn gradient_rgb(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height, ColorModel::Rgb).expect("valid dimensions");
    for y in 0..height {
        for x in 0..width {
            let r = scale(x, width - 1);
            let g = scale(y, height - 1);
            let b = ((x * 7 + y * 13) % 256) as u8;
            img.set_color(x, y, RgbaQuad::rgb(r, g, b))
                .expect("in bounds");
        }
    }
    img
}

/// RGBA image like [`gradient_rgb`] with alpha cycling through 0..=255.
pub fn gradient_rgba(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height, ColorModel::Rgba).expect("valid dimensions");
    for y in 0..height {
        for x in 0..width {
            let r = scale(x, width - 1);
            let g = scale(y, height - 1);
            let a = ((x * 31 + y * 17) % 256) as u8;
            img.set_color(x, y, RgbaQuad::new(r, g, 128, a))
                .expect("in bounds");
        }
    }
    img
}

/// Gray image with a diagonal ramp.
pub fn gray_ramp(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height, ColorModel::Gray).expect("valid dimensions");
    for y in 0..height {
        for x in 0..width {
            img.set_gray(x, y, ((x + 3 * y) % 256) as u8)
                .expect("in bounds");
        }
    }
    img
}

/// Index image with `colors` distinct opaque palette entries in diagonal
/// stripes.
///
/// # Panics
///
/// Panics if `colors` is 0 or greater than 256.
pub fn striped_index(width: u32, height: u32, colors: usize) -> Image {
    assert!((1..=256).contains(&colors));
    let palette = Palette::from_colors(
        (0..colors)
            .map(|i| {
                let i = i as u32;
                RgbaQuad::rgb((i * 37 % 256) as u8, (i * 101 % 256) as u8, i as u8)
            })
            .collect(),
    )
    .expect("at most 256 colors");
    let mut img = Image::new_indexed(width, height, palette).expect("valid dimensions");
    for y in 0..height {
        for x in 0..width {
            // Runs of four equal pixels so run-length coders have work to do
            let index = ((x / 4 + y) as usize % colors) as u8;
            img.set_index(x, y, index).expect("in bounds");
        }
    }
    img
}

/// Bilevel index image (palette `[white, black]`) with a checkerboard of
/// `cell`-pixel squares.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> Image {
    let cell = cell.max(1);
    let mut img =
        Image::new_indexed(width, height, Palette::black_and_white()).expect("valid dimensions");
    for y in 0..height {
        for x in 0..width {
            let index = ((x / cell + y / cell) % 2) as u8;
            img.set_index(x, y, index).expect("in bounds");
        }
    }
    img
}
