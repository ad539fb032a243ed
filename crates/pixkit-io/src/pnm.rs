//! PNM (Portable Any Map) format support
//!
//! Reads and writes all six classic variants: PBM (P1 ASCII, P4 binary),
//! PGM (P2, P5) and PPM (P3, P6). Samples with any maxval up to 65535 are
//! rescaled to 8 bits on read; output is always written with maxval 255.
//!
//! Bitmaps load as index images with the palette `[white, black]`, so a
//! set bit (black) is index 1.

use crate::{IoError, IoResult};
use log::debug;
use pixkit_core::{ColorModel, Image, Palette};
use std::io::{Read, Write};

/// Output variant for [`write_pnm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PnmType {
    /// P1
    AsciiBitmap = 1,
    /// P2
    AsciiGraymap = 2,
    /// P3
    AsciiPixmap = 3,
    /// P4
    BinaryBitmap = 4,
    /// P5
    BinaryGraymap = 5,
    /// P6
    BinaryPixmap = 6,
}

impl PnmType {
    /// All variants in magic-number order.
    pub const ALL: [PnmType; 6] = [
        PnmType::AsciiBitmap,
        PnmType::AsciiGraymap,
        PnmType::AsciiPixmap,
        PnmType::BinaryBitmap,
        PnmType::BinaryGraymap,
        PnmType::BinaryPixmap,
    ];

    /// Map a magic number digit (1..=6) to a variant.
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get((n as usize).wrapping_sub(1)).copied()
    }

    /// The magic number digit.
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn is_binary(self) -> bool {
        self.number() > 3
    }

    pub fn is_bitmap(self) -> bool {
        matches!(self, PnmType::AsciiBitmap | PnmType::BinaryBitmap)
    }

    /// Conventional file extension: "pbm", "pgm" or "ppm".
    pub fn extension(self) -> &'static str {
        match self {
            PnmType::AsciiBitmap | PnmType::BinaryBitmap => "pbm",
            PnmType::AsciiGraymap | PnmType::BinaryGraymap => "pgm",
            PnmType::AsciiPixmap | PnmType::BinaryPixmap => "ppm",
        }
    }

    fn model(self) -> ColorModel {
        match self {
            PnmType::AsciiBitmap | PnmType::BinaryBitmap => ColorModel::Index,
            PnmType::AsciiGraymap | PnmType::BinaryGraymap => ColorModel::Gray,
            PnmType::AsciiPixmap | PnmType::BinaryPixmap => ColorModel::Rgb,
        }
    }
}

/// Rescale a sample in `0..=max` to `0..=255`, rounding to nearest.
/// Values above `max` clamp to `max`.
#[inline]
fn normalize(value: u32, max: u32) -> u8 {
    ((value.min(max) * 255 + max / 2) / max) as u8
}

/// Whitespace and comment aware reader over an in-memory PNM file.
struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Skip whitespace and `#` comments, which run to the end of the line.
    fn skip_blank(&mut self) {
        let mut comment = false;
        while let Some(&c) = self.data.get(self.pos) {
            if comment {
                comment = c != b'\n' && c != b'\r';
            } else if c == b'#' {
                comment = true;
            } else if !c.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    /// Next whitespace-delimited token. The single whitespace byte ending
    /// the token is consumed with it.
    fn token(&mut self) -> &'a [u8] {
        self.skip_blank();
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|c| !c.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        let token = &self.data[start..self.pos];
        if self.pos < self.data.len() {
            self.pos += 1;
        }
        token
    }

    /// Next token parsed as an unsigned decimal.
    fn uint(&mut self, what: &str) -> IoResult<u32> {
        let token = self.token();
        if token.is_empty() {
            return Err(IoError::InvalidData(format!("PNM: missing {}", what)));
        }
        token.iter().try_fold(0u32, |acc, &c| {
            if !c.is_ascii_digit() {
                return Err(IoError::InvalidData(format!(
                    "PNM: bad {} {:?}",
                    what,
                    String::from_utf8_lossy(token)
                )));
            }
            acc.checked_mul(10)
                .and_then(|v| v.checked_add((c - b'0') as u32))
                .ok_or_else(|| IoError::InvalidData(format!("PNM: {} out of range", what)))
        })
    }

    /// Next non-blank byte, for P1 digits.
    fn bit(&mut self) -> IoResult<u8> {
        self.skip_blank();
        let c = self.data.get(self.pos).copied();
        self.pos += 1;
        match c {
            Some(b'0') => Ok(0),
            Some(b'1') => Ok(1),
            Some(c) => Err(IoError::InvalidData(format!(
                "PNM: bad bitmap digit {:?}",
                c as char
            ))),
            None => Err(IoError::InvalidData("PNM: truncated bitmap".to_string())),
        }
    }

    fn bytes(&mut self, n: usize) -> IoResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(IoError::InvalidData("PNM: truncated raster".to_string()));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}

/// Read a PNM image from a stream.
pub fn read_pnm<R: Read>(mut reader: R) -> IoResult<Image> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    read_pnm_mem(&data)
}

/// Read a PNM image from memory.
///
/// # Errors
///
/// Returns [`IoError::InvalidData`] for a bad magic number, a malformed or
/// out-of-range header value, a bad sample token, or a truncated raster.
pub fn read_pnm_mem(data: &[u8]) -> IoResult<Image> {
    let mut scan = Scanner::new(data);
    let pnm_type = match scan.token() {
        [b'P', n @ b'1'..=b'6'] => PnmType::from_number(n - b'0'),
        _ => None,
    }
    .ok_or_else(|| IoError::InvalidData("PNM: bad magic number".to_string()))?;

    let width = scan.uint("width")?;
    let height = scan.uint("height")?;
    let max = if pnm_type.is_bitmap() {
        1
    } else {
        let max = scan.uint("maxval")?;
        if !(1..=65535).contains(&max) {
            return Err(IoError::InvalidData(format!("PNM: maxval {} out of range", max)));
        }
        max
    };
    debug!(
        "PNM: P{} {}x{} maxval={}",
        pnm_type.number(),
        width,
        height,
        max
    );

    // Every sample takes at least one byte, text or binary
    let channels = if pnm_type.model() == ColorModel::Rgb { 3 } else { 1 };
    let min_len = if pnm_type == PnmType::BinaryBitmap {
        (width as u64).div_ceil(8) * height as u64
    } else {
        width as u64 * height as u64 * channels
    };
    if min_len > scan.remaining() as u64 {
        return Err(IoError::InvalidData("PNM: truncated raster".to_string()));
    }

    let mut image = if pnm_type.is_bitmap() {
        Image::new_indexed(width, height, Palette::black_and_white())?
    } else {
        Image::new(width, height, pnm_type.model())?
    };
    let bytes_per_sample = if max > 255 { 2 } else { 1 };
    let w = width as usize;

    for y in 0..height {
        let row = image.row_mut(y);
        match pnm_type {
            PnmType::AsciiBitmap => {
                for cell in row.iter_mut() {
                    *cell = scan.bit()?;
                }
            }
            PnmType::AsciiGraymap => {
                for cell in row.iter_mut() {
                    *cell = normalize(scan.uint("sample")?, max);
                }
            }
            PnmType::AsciiPixmap => {
                for cell in row.chunks_exact_mut(4) {
                    for c in &mut cell[..3] {
                        *c = normalize(scan.uint("sample")?, max);
                    }
                    cell[3] = 0xff;
                }
            }
            PnmType::BinaryBitmap => {
                let packed = scan.bytes(w.div_ceil(8))?;
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = (packed[x / 8] >> (7 - x % 8)) & 1;
                }
            }
            PnmType::BinaryGraymap | PnmType::BinaryPixmap => {
                let samples = scan.bytes(w * channels as usize * bytes_per_sample)?;
                let mut values = samples.chunks_exact(bytes_per_sample).map(|s| {
                    let v = s.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                    normalize(v, max)
                });
                if pnm_type == PnmType::BinaryGraymap {
                    for (cell, v) in row.iter_mut().zip(values) {
                        *cell = v;
                    }
                } else {
                    for cell in row.chunks_exact_mut(4) {
                        for c in &mut cell[..3] {
                            *c = values.next().unwrap_or(0);
                        }
                        cell[3] = 0xff;
                    }
                }
            }
        }
    }
    Ok(image)
}

/// Clone `image` into the color model `pnm_type` stores.
///
/// Bitmaps reuse an index image whose palette is exactly `[white, black]`;
/// anything else is thresholded through gray.
fn prepare(image: &Image, pnm_type: PnmType) -> IoResult<Image> {
    let work = image.clone();
    let work = match pnm_type.model() {
        ColorModel::Index => {
            let bilevel = work.model() == ColorModel::Index
                && work.palette().is_some_and(Palette::is_black_and_white);
            if bilevel {
                work.validate_indices()?;
                work
            } else {
                work.to_gray()?.gray_to_binary()?
            }
        }
        ColorModel::Gray => work.to_gray()?,
        _ => work.to_rgb()?,
    };
    Ok(work)
}

/// Encode an image as PNM in memory.
///
/// The image is converted to the model `pnm_type` stores; the source is
/// left untouched.
pub fn write_pnm_mem(image: &Image, pnm_type: PnmType) -> IoResult<Vec<u8>> {
    let work = prepare(image, pnm_type)?;
    let (w, h) = (work.width(), work.height());

    let mut out = Vec::new();
    write!(out, "P{}\n{} {}\n", pnm_type.number(), w, h)?;
    if !pnm_type.is_bitmap() {
        out.extend_from_slice(b"255\n");
    }

    for y in 0..h {
        let row = work.row(y);
        match pnm_type {
            PnmType::AsciiBitmap => {
                // At most 69 digits plus the newline per line
                for (x, &i) in row.iter().enumerate() {
                    if x > 0 && x % 69 == 0 {
                        out.push(b'\n');
                    }
                    out.push(b'0' + i);
                }
                out.push(b'\n');
            }
            PnmType::AsciiGraymap => {
                for &g in row {
                    writeln!(out, "{}", g)?;
                }
            }
            PnmType::AsciiPixmap => {
                for c in row.chunks_exact(4) {
                    writeln!(out, "{} {} {}", c[0], c[1], c[2])?;
                }
            }
            PnmType::BinaryBitmap => {
                let mut packed = vec![0u8; (w as usize).div_ceil(8)];
                for (x, &i) in row.iter().enumerate() {
                    packed[x / 8] |= (i & 1) << (7 - x % 8);
                }
                out.extend_from_slice(&packed);
            }
            PnmType::BinaryGraymap => out.extend_from_slice(row),
            PnmType::BinaryPixmap => {
                for c in row.chunks_exact(4) {
                    out.extend_from_slice(&c[..3]);
                }
            }
        }
    }
    Ok(out)
}

/// Write an image as PNM to a stream.
pub fn write_pnm<W: Write>(image: &Image, mut writer: W, pnm_type: PnmType) -> IoResult<()> {
    let data = write_pnm_mem(image, pnm_type)?;
    writer.write_all(&data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixkit_core::RgbaQuad;

    fn color_image() -> Image {
        let mut img = Image::new(3, 2, ColorModel::Rgb).unwrap();
        img.fill_color(RgbaQuad::BLACK).unwrap();
        img.set_color(0, 0, RgbaQuad::rgb(255, 0, 0)).unwrap();
        img.set_color(1, 0, RgbaQuad::rgb(0, 128, 7)).unwrap();
        img.set_color(2, 1, RgbaQuad::WHITE).unwrap();
        img
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0, 255), 0);
        assert_eq!(normalize(255, 255), 255);
        assert_eq!(normalize(300, 255), 255);
        assert_eq!(normalize(1, 1), 255);
        assert_eq!(normalize(7, 15), 119);
        assert_eq!(normalize(65535, 65535), 255);
    }

    #[test]
    fn test_read_ascii_bitmap_unseparated() {
        let img = read_pnm_mem(b"P1\n# comment\n4 2\n0110\n1 0 0 1\n").unwrap();
        assert_eq!(img.model(), ColorModel::Index);
        assert_eq!(img.palette(), Some(&Palette::black_and_white()));
        assert_eq!(img.row(0), &[0, 1, 1, 0]);
        assert_eq!(img.row(1), &[1, 0, 0, 1]);
    }

    #[test]
    fn test_read_ascii_graymap_maxval() {
        let img = read_pnm_mem(b"P2 2 1 15\n15 7\n").unwrap();
        assert_eq!(img.model(), ColorModel::Gray);
        assert_eq!(img.row(0), &[255, 119]);
    }

    #[test]
    fn test_read_binary_16bit() {
        let mut data = b"P6\n1 1\n65535\n".to_vec();
        data.extend_from_slice(&[0xff, 0xff, 0x00, 0x00, 0x80, 0x00]);
        let img = read_pnm_mem(&data).unwrap();
        assert_eq!(img.color_at(0, 0), Some(RgbaQuad::rgb(255, 0, 128)));
    }

    #[test]
    fn test_read_binary_one_whitespace() {
        // The raster's first byte is itself whitespace
        let data = b"P5\n2 1\n255\n\n\x07";
        let img = read_pnm_mem(data).unwrap();
        assert_eq!(img.row(0), &[b'\n', 7]);
    }

    #[test]
    fn test_read_rejects() {
        assert!(read_pnm_mem(b"P7\n1 1\n255\n").is_err());
        assert!(read_pnm_mem(b"PX").is_err());
        assert!(read_pnm_mem(b"P2\n1 1\n0\n0\n").is_err());
        assert!(read_pnm_mem(b"P2\n1 1\n70000\n0\n").is_err());
        assert!(read_pnm_mem(b"P2\n1 x\n255\n0\n").is_err());
        assert!(read_pnm_mem(b"P1\n2 1\n02\n").is_err());
        assert!(read_pnm_mem(b"P5\n4 4\n255\n\x00\x01").is_err());
        assert!(read_pnm_mem(b"P3\n1 1\n255\n1 2\n").is_err());
    }

    #[test]
    fn test_write_headers() {
        let img = color_image();
        let p1 = write_pnm_mem(&img, PnmType::AsciiBitmap).unwrap();
        assert_eq!(p1, b"P1\n3 2\n111\n110\n");
        let p6 = write_pnm_mem(&img, PnmType::BinaryPixmap).unwrap();
        assert!(p6.starts_with(b"P6\n3 2\n255\n"));
        assert_eq!(p6.len(), 11 + 18);
        let p3 = write_pnm_mem(&img, PnmType::AsciiPixmap).unwrap();
        assert_eq!(&p3[11..], b"255 0 0\n0 128 7\n0 0 0\n0 0 0\n0 0 0\n255 255 255\n");
    }

    #[test]
    fn test_ascii_bitmap_wraps() {
        let img = Image::new_indexed(140, 1, Palette::black_and_white()).unwrap();
        let data = write_pnm_mem(&img, PnmType::AsciiBitmap).unwrap();
        let body = std::str::from_utf8(&data[9..]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.iter().map(|l| l.len()).collect::<Vec<_>>(), vec![69, 69, 2]);
        assert_eq!(read_pnm_mem(&data).unwrap(), img);
    }

    #[test]
    fn test_roundtrip_all_types() {
        let img = color_image();
        for t in PnmType::ALL {
            let data = write_pnm_mem(&img, t).unwrap();
            let back = read_pnm_mem(&data).unwrap();
            assert_eq!(back.model(), t.model(), "P{}", t.number());
            assert_eq!(back, prepare(&img, t).unwrap(), "P{}", t.number());
        }
    }

    #[test]
    fn test_bitmap_reuse_and_threshold() {
        let mut bw = Image::new_indexed(2, 1, Palette::black_and_white()).unwrap();
        bw.set_index(1, 0, 1).unwrap();
        assert_eq!(prepare(&bw, PnmType::BinaryBitmap).unwrap(), bw);

        // Same colors, other order: goes through gray
        let swapped = Palette::from_colors(vec![RgbaQuad::BLACK, RgbaQuad::WHITE]).unwrap();
        let mut img = Image::new_indexed(2, 1, swapped).unwrap();
        img.set_index(1, 0, 1).unwrap();
        let out = prepare(&img, PnmType::BinaryBitmap).unwrap();
        assert_eq!(out.row(0), &[1, 0]);
    }

    #[test]
    fn test_binary_bitmap_padding() {
        let mut img = Image::new_indexed(10, 1, Palette::black_and_white()).unwrap();
        img.set_index(0, 0, 1).unwrap();
        img.set_index(9, 0, 1).unwrap();
        let data = write_pnm_mem(&img, PnmType::BinaryBitmap).unwrap();
        assert_eq!(&data[8..], &[0x80, 0x40]);
        assert_eq!(read_pnm_mem(&data).unwrap(), img);
    }
}
