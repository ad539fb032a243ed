//! PNG I/O regression test
//!
//! Lossless round trips for every color model, palette transparency, and
//! decoding of low-depth files the writer never produces.

use pixkit_core::{ColorModel, Image, Palette, RgbaQuad};
use pixkit_io::{ImageFormat, read_png_mem, write_png_mem};
use pixkit_test::{RegParams, synth};

fn roundtrip(rp: &mut RegParams, name: &str, img: &Image) {
    let data = write_png_mem(img).expect("write PNG");
    let back = read_png_mem(&data).expect("read PNG");
    let ok = rp.compare_images(img, &back);
    eprintln!("  {} ({}): {}", name, img.model(), if ok { "OK" } else { "FAIL" });
    rp.write_image_and_check(img, ImageFormat::Png)
        .expect("write png");
}

/// Index image whose first entries fade from transparent to opaque.
fn translucent_index() -> Image {
    let colors = (0..8u8)
        .map(|i| RgbaQuad::new(i * 30, 255 - i * 30, 90, if i < 4 { i * 60 } else { 255 }))
        .collect();
    let mut img =
        Image::new_indexed(16, 8, Palette::from_colors(colors).expect("palette")).expect("image");
    for y in 0..8 {
        for x in 0..16 {
            img.set_index(x, y, ((x + y) % 8) as u8).expect("in bounds");
        }
    }
    img
}

#[test]
fn pngio_reg() {
    let mut rp = RegParams::new("pngio");

    eprintln!("=== Round trips ===");
    roundtrip(&mut rp, "gray ramp", &synth::gray_ramp(64, 20));
    roundtrip(&mut rp, "gradient", &synth::gradient_rgb(50, 30));
    roundtrip(&mut rp, "gradient alpha", &synth::gradient_rgba(33, 21));
    roundtrip(&mut rp, "stripes", &synth::striped_index(40, 12, 200));
    roundtrip(&mut rp, "checkerboard", &synth::checkerboard(24, 24, 6));
    roundtrip(&mut rp, "translucent", &translucent_index());

    // Palettes survive as palettes, alpha included
    let back = read_png_mem(&write_png_mem(&translucent_index()).expect("write"))
        .expect("read");
    rp.compare_values(
        1.0,
        if back.model() == ColorModel::Index { 1.0 } else { 0.0 },
        0.0,
    );
    rp.compare_values(0.0, back.resolve_color(0, 0).map_or(-1.0, |c| c.alpha as f64), 0.0);
    rp.compare_values(180.0, back.resolve_color(3, 0).map_or(-1.0, |c| c.alpha as f64), 0.0);

    // --- Foreign depths ---
    eprintln!("=== 4-bit gray ===");
    let mut data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut data, 3, 1);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Four);
        let mut writer = encoder.write_header().expect("header");
        writer.write_image_data(&[0x05, 0xf0]).expect("data");
    }
    let img = read_png_mem(&data).expect("read 4-bit gray");
    rp.compare_values(1.0, if img.model() == ColorModel::Gray { 1.0 } else { 0.0 }, 0.0);
    rp.compare_strings(&[0, 85, 255], img.row(0));

    // --- Garbage ---
    let mut bad = write_png_mem(&synth::gray_ramp(8, 8)).expect("write");
    bad.truncate(bad.len() / 2);
    rp.compare_values(1.0, if read_png_mem(&bad).is_err() { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "pngio regression test failed");
}
