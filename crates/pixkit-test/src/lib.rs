//! pixkit-test - Regression test framework for pixkit
//!
//! [`RegParams`] counts checks, collects failures and writes codec output
//! to `tests/regout`. `REGTEST_MODE` picks what happens to that output:
//!
//! - **generate**: copy it to `tests/golden`
//! - **compare** (default): check it against golden files where present
//! - **display**: keep it for inspection only
//!
//! Test images are never read from disk; [`synth`] builds them from their
//! coordinates.
//!
//! # Usage
//!
//! ```ignore
//! use pixkit_test::{RegParams, synth};
//!
//! let mut rp = RegParams::new("bmpio");
//! let img = synth::gradient_rgb(64, 48);
//! rp.compare_values(64.0, img.width() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

use std::path::{Path, PathBuf};

fn tests_dir() -> PathBuf {
    // crates/pixkit-test -> workspace root
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests")
}

/// Directory holding `<test>_golden.<index>.<ext>` reference files.
pub fn golden_dir() -> String {
    tests_dir().join("golden").display().to_string()
}

/// Directory receiving the artifacts a regression run writes.
pub fn regout_dir() -> String {
    tests_dir().join("regout").display().to_string()
}
