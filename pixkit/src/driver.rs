//! Batch conversion driver
//!
//! Each input image is decoded once and written back out in every PNM
//! variant, then through RGBA, RGB, index and gray into PNG, JPEG and BMP.
//! Output names are `<prefix>-<input file name><suffix>` inside the output
//! directory.

use crate::cli::Arguments;
use log::{debug, error, info, warn};
use pixkit_core::Image;
use pixkit_io::{
    BmpWriteOptions, ImageFormat, IoResult, JpegOptions, PnmType, read_image, write_bmp_mem,
    write_jpeg_mem, write_png_mem, write_pnm_mem,
};
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one input path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No extension, or one no decoder handles
    Skipped,
    /// The decoder rejected the file
    ReadFailed,
    /// Decoded; `failed_writes` outputs could not be produced
    Converted { failed_writes: usize },
}

/// Decoder for an input path, chosen by extension.
fn input_format(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("pnm") {
        return None;
    }
    ImageFormat::from_extension(ext)
}

/// Writes the outputs for one input and counts the failures.
struct Battery<'a> {
    out_dir: &'a Path,
    name: String,
    failed: usize,
}

impl Battery<'_> {
    fn save(&mut self, prefix: &str, suffix: &str, encoded: IoResult<Vec<u8>>) {
        let path = self.out_dir.join(format!("{}-{}{}", prefix, self.name, suffix));
        let result = encoded.and_then(|data| fs::write(&path, data).map_err(Into::into));
        match result {
            Ok(()) => debug!("wrote {}", path.display()),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                self.failed += 1;
            }
        }
    }

    /// Run a conversion, logging and counting a failure.
    fn convert<F>(&mut self, what: &str, f: F) -> Option<Image>
    where
        F: FnOnce() -> pixkit_core::Result<Image>,
    {
        match f() {
            Ok(img) => Some(img),
            Err(e) => {
                error!("{}: {} failed: {}", self.name, what, e);
                self.failed += 1;
                None
            }
        }
    }

    fn run(&mut self, image: Image) {
        for pnm_type in PnmType::ALL {
            let suffix = format!(
                ".{}.{}",
                if pnm_type.is_binary() { "b" } else { "a" },
                pnm_type.extension()
            );
            self.save("0", &suffix, write_pnm_mem(&image, pnm_type));
        }

        let Some(rgba) = self.convert("to_rgba", || image.to_rgba()) else {
            return;
        };
        self.save("a", ".png", write_png_mem(&rgba));

        // Translucent colors are composited onto white here
        let Some(rgb) = self.convert("to_rgb", || rgba.to_rgb()) else {
            return;
        };
        self.save("b", ".png", write_png_mem(&rgb));
        self.save("b", ".jpg", write_jpeg_mem(&rgb, &JpegOptions::default()));
        self.save("b", ".bmp", write_bmp_mem(&rgb, &BmpWriteOptions::default()));
        self.save("simple", ".bmp", write_bmp_mem(&rgb, &BmpWriteOptions { compress: false }));

        // Too many colors for a palette is expected, not a failure
        match rgb.clone().to_index() {
            Ok(index) => {
                self.save("c", ".png", write_png_mem(&index));
                self.save("c", ".bmp", write_bmp_mem(&index, &BmpWriteOptions::default()));
            }
            Err(e) => debug!("{}: no index output: {}", self.name, e),
        }

        if let Some(gray) = self.convert("to_gray", || rgb.to_gray()) {
            self.save("d", ".png", write_png_mem(&gray));
        }
    }
}

/// Process one input path.
pub fn process_file(path: &Path, out_dir: &Path) -> Outcome {
    let Some(format) = input_format(path) else {
        warn!("{}: no usable extension, skipped", path.display());
        return Outcome::Skipped;
    };
    debug!("{}: decoding as {:?}", path.display(), format);

    let image = match read_image(path) {
        Ok(image) => image,
        Err(e) => {
            error!("{}: {}", path.display(), e);
            println!("read fail {}", path.display());
            return Outcome::ReadFailed;
        }
    };
    info!("{}", path.display());
    if let Err(e) = image.dump_info(&mut std::io::stderr()) {
        warn!("{}: cannot dump image info: {}", path.display(), e);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut battery = Battery {
        out_dir,
        name,
        failed: 0,
    };
    battery.run(image);
    Outcome::Converted {
        failed_writes: battery.failed,
    }
}

/// Process every input named in `arguments`, in order.
///
/// Failures are logged and never stop the run.
pub fn run(arguments: &Arguments) -> Vec<Outcome> {
    if let Err(e) = fs::create_dir_all(&arguments.out_dir) {
        error!(
            "cannot create output directory {}: {}",
            arguments.out_dir.display(),
            e
        );
    }
    arguments
        .inputs
        .iter()
        .map(|input: &PathBuf| process_file(input, &arguments.out_dir))
        .collect()
}
