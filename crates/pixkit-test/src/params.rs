//! Regression test state and checks
//!
//! Every check bumps a running index. Artifacts written through
//! [`RegParams`] are named `<test>.<index>.<ext>` in the regout directory,
//! and their golden counterparts `<test>_golden.<index>.<ext>`.

use crate::error::{TestError, TestResult};
use crate::{golden_dir, regout_dir};
use pixkit_core::Image;
use pixkit_io::ImageFormat;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

/// How artifacts are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Copy every artifact into the golden directory
    Generate,
    /// Check artifacts against golden files that exist (default)
    #[default]
    Compare,
    /// Write artifacts only
    Display,
}

impl RegTestMode {
    /// Read the mode from `REGTEST_MODE`.
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("REGTEST_MODE").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("generate") {
            Self::Generate
        } else if value.eq_ignore_ascii_case("display") {
            Self::Display
        } else {
            Self::Compare
        }
    }
}

/// State of one regression test run.
pub struct RegParams {
    /// Name of the test (e.g., "bmpio")
    pub test_name: String,
    pub mode: RegTestMode,
    index: usize,
    failures: Vec<String>,
}

impl RegParams {
    /// Start a run in the mode given by `REGTEST_MODE`.
    pub fn new(test_name: &str) -> Self {
        Self::with_mode(test_name, RegTestMode::from_env())
    }

    pub fn with_mode(test_name: &str, mode: RegTestMode) -> Self {
        let _ = fs::create_dir_all(golden_dir());
        let _ = fs::create_dir_all(regout_dir());
        eprintln!("\n######## {}_reg ({:?}) ########", test_name, mode);

        Self {
            test_name: test_name.to_string(),
            mode,
            index: 0,
            failures: Vec::new(),
        }
    }

    /// Index of the most recent check
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn next(&mut self) -> usize {
        self.index += 1;
        self.index
    }

    /// Record a failure of the current check; always returns `false`.
    fn fail(&mut self, check: &str, detail: impl Display) -> bool {
        let msg = format!(
            "Failure in {}_reg: {} check {}: {}",
            self.test_name, check, self.index, detail
        );
        eprintln!("{}", msg);
        self.failures.push(msg);
        false
    }

    /// Check that `actual` is within `delta` of `expected`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.next();
        let diff = (expected - actual).abs();
        if diff > delta {
            return self.fail(
                "value",
                format_args!("expected {}, got {} (diff {} > {})", expected, actual, diff, delta),
            );
        }
        true
    }

    /// Check two images for identical geometry, model, palette and cells.
    ///
    /// RGB cells include their alpha byte.
    pub fn compare_images(&mut self, img1: &Image, img2: &Image) -> bool {
        self.next();
        let shape = |img: &Image| (img.width(), img.height(), img.model());
        if shape(img1) != shape(img2) {
            return self.fail("image", format_args!("{:?} vs {:?}", shape(img1), shape(img2)));
        }
        if img1.palette() != img2.palette() {
            return self.fail(
                "image",
                format_args!(
                    "palettes differ ({} vs {} entries)",
                    img1.palette_len(),
                    img2.palette_len()
                ),
            );
        }

        let bpp = img1.model().bytes_per_pixel();
        for y in 0..img1.height() {
            let (row1, row2) = (img1.row(y), img2.row(y));
            if let Some(i) = row1.iter().zip(row2).position(|(a, b)| a != b) {
                let x = (i / bpp) as u32;
                return self.fail(
                    "image",
                    format_args!(
                        "cell ({}, {}) is {:?} vs {:?}",
                        x,
                        y,
                        img1.get_pixel(x, y),
                        img2.get_pixel(x, y)
                    ),
                );
            }
        }
        true
    }

    /// Check that two images show the same colors, whatever their models.
    ///
    /// Index cells are looked up in their palette and gray cells read as
    /// opaque gray, so an index image can match an RGB image.
    pub fn compare_colors(&mut self, img1: &Image, img2: &Image) -> bool {
        self.next();
        if (img1.width(), img1.height()) != (img2.width(), img2.height()) {
            return self.fail(
                "color",
                format_args!(
                    "{}x{} vs {}x{}",
                    img1.width(),
                    img1.height(),
                    img2.width(),
                    img2.height()
                ),
            );
        }

        let coords = (0..img1.height()).flat_map(|y| (0..img1.width()).map(move |x| (x, y)));
        for (x, y) in coords {
            let (c1, c2) = (img1.resolve_color(x, y), img2.resolve_color(x, y));
            if c1.is_none() || c1 != c2 {
                return self.fail("color", format_args!("{:?} vs {:?} at ({}, {})", c1, c2, x, y));
            }
        }
        true
    }

    /// Check two byte strings for equality.
    pub fn compare_strings(&mut self, data1: &[u8], data2: &[u8]) -> bool {
        self.next();
        if data1 == data2 {
            return true;
        }
        let at = data1
            .iter()
            .zip(data2)
            .position(|(a, b)| a != b)
            .unwrap_or(data1.len().min(data2.len()));
        self.fail(
            "string",
            format_args!(
                "first difference at byte {} (lengths {} and {})",
                at,
                data1.len(),
                data2.len()
            ),
        )
    }

    fn artifact_path(&self, dir: &str, tag: &str, ext: &str) -> PathBuf {
        Path::new(dir).join(format!("{}{}.{:02}.{}", self.test_name, tag, self.index, ext))
    }

    /// Encode `image` as an artifact and check it against its golden file.
    pub fn write_image_and_check(&mut self, image: &Image, format: ImageFormat) -> TestResult<()> {
        self.next();
        let path = self.artifact_path(&regout_dir(), "", format.extension());
        pixkit_io::write_image(image, &path, format).map_err(|source| TestError::Encode {
            path: path.display().to_string(),
            source,
        })?;
        self.check_golden(&path, format.extension())
    }

    /// Store raw bytes as an artifact and check them against the golden
    /// file.
    pub fn write_data_and_check(&mut self, data: &[u8], ext: &str) -> TestResult<()> {
        self.next();
        let path = self.artifact_path(&regout_dir(), "", ext);
        fs::write(&path, data)?;
        self.check_golden(&path, ext)
    }

    fn check_golden(&mut self, local: &Path, ext: &str) -> TestResult<()> {
        let golden = self.artifact_path(&golden_dir(), "_golden", ext);
        match self.mode {
            RegTestMode::Generate => {
                fs::copy(local, &golden)?;
                eprintln!("Generated: {}", golden.display());
            }
            // Golden files are optional: none ship with the sources
            RegTestMode::Compare if !golden.exists() => {
                eprintln!("No golden file, skipping: {}", golden.display());
            }
            RegTestMode::Compare => {
                if fs::read(local)? != fs::read(&golden)? && !same_image(local, &golden) {
                    self.fail(
                        "file",
                        format_args!("{} differs from {}", local.display(), golden.display()),
                    );
                }
            }
            RegTestMode::Display => {}
        }
        Ok(())
    }

    /// Report the outcome; `true` when every check passed.
    pub fn cleanup(self) -> bool {
        if self.failures.is_empty() {
            eprintln!("SUCCESS: {}_reg ({} checks)", self.test_name, self.index);
            return true;
        }
        eprintln!(
            "FAILURE: {}_reg ({} of {} checks)",
            self.test_name,
            self.failures.len(),
            self.index
        );
        for failure in &self.failures {
            eprintln!("  {}", failure);
        }
        false
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

/// Whether two encoded files decode to the same pixels.
fn same_image(path1: &Path, path2: &Path) -> bool {
    match (pixkit_io::read_image(path1), pixkit_io::read_image(path2)) {
        (Ok(img1), Ok(img2)) => img1 == img2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth;

    #[test]
    fn test_mode_parse() {
        assert_eq!(RegTestMode::parse("generate"), RegTestMode::Generate);
        assert_eq!(RegTestMode::parse("DISPLAY"), RegTestMode::Display);
        assert_eq!(RegTestMode::parse(""), RegTestMode::Compare);
        assert_eq!(RegTestMode::parse("bogus"), RegTestMode::Compare);
    }

    #[test]
    fn test_compare_values() {
        let mut rp = RegParams::with_mode("test", RegTestMode::Display);
        assert!(rp.compare_values(100.0, 100.0, 0.0));
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert!(rp.is_success());
        assert!(!rp.compare_values(100.0, 200.0, 0.0));
        assert!(!rp.is_success());
        assert_eq!(rp.failures().len(), 1);
        assert_eq!(rp.index(), 3);
    }

    #[test]
    fn test_compare_images_and_colors() {
        let mut rp = RegParams::with_mode("test", RegTestMode::Display);
        let img = synth::striped_index(8, 4, 5);
        assert!(rp.compare_images(&img, &img.clone()));

        let rgb = img.clone().to_rgb().unwrap();
        assert!(rp.compare_colors(&img, &rgb));
        assert!(rp.is_success());
        assert!(!rp.compare_images(&img, &rgb));

        let mut other = img.clone();
        other.set_index(5, 2, 4).unwrap();
        assert!(!rp.compare_images(&img, &other));
        assert!(rp.failures()[1].contains("(5, 2)"));
    }

    #[test]
    fn test_compare_strings_reports_offset() {
        let mut rp = RegParams::with_mode("test", RegTestMode::Display);
        assert!(rp.compare_strings(b"abc", b"abc"));
        assert!(!rp.compare_strings(b"abcd", b"abXd"));
        assert!(rp.failures()[0].contains("byte 2"));
        assert!(!rp.compare_strings(b"ab", b"abc"));
        assert!(rp.failures()[1].contains("byte 2"));
    }

    #[test]
    fn test_write_in_display_mode() {
        let mut rp = RegParams::with_mode("paramsdisplay", RegTestMode::Display);
        rp.write_data_and_check(b"abc", "txt").unwrap();
        rp.write_image_and_check(&synth::gray_ramp(4, 4), ImageFormat::Pnm)
            .unwrap();
        assert_eq!(rp.index(), 2);
        assert!(rp.cleanup());
    }
}
