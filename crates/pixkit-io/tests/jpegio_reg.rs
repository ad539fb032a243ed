//! JPEG I/O regression test
//!
//! JPEG is lossy, so decoded images are checked for closeness: the mean
//! absolute channel difference must stay small while files shrink as
//! quality drops.

use pixkit_core::{ColorModel, Image, RgbaQuad};
use pixkit_io::{ImageFormat, JpegOptions, read_jpeg_mem, write_jpeg_mem};
use pixkit_test::{RegParams, synth};

/// Mean absolute difference over the RGB channels of two RGB images.
fn mean_diff(a: &Image, b: &Image) -> f64 {
    let total: u64 = a
        .data()
        .chunks_exact(4)
        .zip(b.data().chunks_exact(4))
        .map(|(p, q)| (0..3).map(|i| p[i].abs_diff(q[i]) as u64).sum::<u64>())
        .sum();
    total as f64 / (a.width() as f64 * a.height() as f64 * 3.0)
}

/// Smooth two-axis gradient; JPEG handles it without ringing.
fn smooth(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height, ColorModel::Rgb).expect("image");
    for y in 0..height {
        for x in 0..width {
            let color = RgbaQuad::rgb((x * 3) as u8, (y * 4) as u8, (96 + x + y) as u8);
            img.set_color(x, y, color).expect("in bounds");
        }
    }
    img
}

#[test]
fn jpegio_reg() {
    let mut rp = RegParams::new("jpegio");
    let src = smooth(64, 48);

    eprintln!("=== Quality sweep ===");
    let mut diffs = Vec::new();
    for quality in [95u8, 75, 30] {
        let data = write_jpeg_mem(&src, &JpegOptions { quality }).expect("write JPEG");
        let back = read_jpeg_mem(&data).expect("read JPEG");
        rp.compare_values(1.0, if back.model() == ColorModel::Rgb { 1.0 } else { 0.0 }, 0.0);
        rp.compare_values(64.0, back.width() as f64, 0.0);
        rp.compare_values(48.0, back.height() as f64, 0.0);
        let diff = mean_diff(&src, &back);
        eprintln!("  quality {}: {} bytes, mean diff {:.2}", quality, data.len(), diff);
        diffs.push((data.len(), diff));
    }
    // Smaller files at lower quality, every one still close
    rp.compare_values(1.0, if diffs[0].0 > diffs[2].0 { 1.0 } else { 0.0 }, 0.0);
    for &(_, diff) in &diffs {
        rp.compare_values(0.0, diff, 12.0);
    }

    // Quality 0 means the default
    let zero = write_jpeg_mem(&src, &JpegOptions { quality: 0 }).expect("write q0");
    let default = write_jpeg_mem(&src, &JpegOptions::default()).expect("write default");
    rp.compare_strings(&default, &zero);

    // --- Other models are converted on write ---
    eprintln!("=== Model conversion ===");
    let gray = synth::gray_ramp(32, 32);
    let back = read_jpeg_mem(&write_jpeg_mem(&gray, &JpegOptions::default()).expect("write"))
        .expect("read");
    let expected = gray.clone().to_rgb().expect("gray to rgb");
    rp.compare_values(0.0, mean_diff(&expected, &back), 8.0);

    let rgba = synth::gradient_rgba(16, 16);
    rp.compare_values(
        1.0,
        if write_jpeg_mem(&rgba, &JpegOptions::default()).is_ok() { 1.0 } else { 0.0 },
        0.0,
    );

    rp.write_image_and_check(&src, ImageFormat::Jpeg)
        .expect("write jpeg");

    assert!(rp.cleanup(), "jpegio regression test failed");
}
