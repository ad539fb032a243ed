//! RLE4 / RLE8 pixel data
//!
//! Opcodes are byte pairs. A nonzero first byte is an encoded run: that
//! many pixels taken alternately from the fields of the second byte. A
//! zero first byte escapes: 0 = end of line, 1 = end of bitmap, 2 = delta
//! (two more bytes, dx and dy), and anything above 2 starts an absolute
//! run of that many literal pixels padded to a 16-bit boundary.

use super::pixels::pack_indices;
use crate::cursor::ByteCursor;
use crate::IoResult;
use pixkit_core::Image;

const ESCAPE: u8 = 0;
const END_OF_LINE: u8 = 0;
const END_OF_BITMAP: u8 = 1;
const DELTA: u8 = 2;

/// Decode RLE4/RLE8 data into `image`.
///
/// The walk starts at the bottom-left pixel. Pixels no opcode touches stay
/// 0. Any short read fails.
pub fn read_rle(
    bit_count: u16,
    cursor: &mut ByteCursor<&[u8]>,
    image: &mut Image,
) -> IoResult<()> {
    let bc = bit_count as usize;
    let mask = ((1u16 << bc) - 1) as u8;
    let width = image.width() as i64;
    let mut x: i64 = 0;
    let mut y: i64 = image.height() as i64 - 1;

    while y >= 0 && x <= width {
        let count = cursor.read8();
        let value = cursor.read8();
        if cursor.has_error() {
            return cursor.finish("BMP RLE data");
        }

        if count != ESCAPE {
            let row = image.row_mut(y as u32);
            let mut i = 0;
            while i < count && x < width {
                let mut shift = 8 - bc as i32;
                while shift >= 0 && i < count && x < width {
                    row[x as usize] = (value >> shift) & mask;
                    x += 1;
                    i += 1;
                    shift -= bc as i32;
                }
            }
            continue;
        }

        match value {
            END_OF_LINE => {
                x = 0;
                y -= 1;
            }
            END_OF_BITMAP => break,
            DELTA => {
                let dx = cursor.read8();
                let dy = cursor.read8();
                if cursor.has_error() {
                    return cursor.finish("BMP RLE delta");
                }
                x += dx as i64;
                y -= dy as i64;
            }
            n => {
                let n = n as usize;
                let len = (n * bc).div_ceil(16) * 2;
                let data = cursor.read_bytes(len);
                if data.len() < len {
                    return cursor.finish("BMP RLE absolute run");
                }
                let row = image.row_mut(y as u32);
                for i in 0..n {
                    if x >= width {
                        break;
                    }
                    let bit = i * bc;
                    row[x as usize] = (data[bit / 8] >> (8 - bc - bit % 8)) & mask;
                    x += 1;
                }
            }
        }
    }
    Ok(())
}

/// Encode an index image as RLE4 (`bit_count` 4) or RLE8 (`bit_count` 8).
///
/// Each row is packed, split into maximal runs of equal bytes, and emitted
/// as encoded runs, or as an absolute run once more than two singleton
/// bytes gather in a stretch of short runs. Rows end with end-of-line and
/// the last row with end-of-bitmap.
///
/// Returns the number of bytes appended to `out`.
pub fn write_rle(image: &Image, bit_count: u16, out: &mut Vec<u8>) -> usize {
    let bc = bit_count as usize;
    let cpb = 8 / bc;
    let count_max = 255 / cpb;
    let width = image.width() as usize;
    let stride = (width * bc).div_ceil(8);
    let start = out.len();

    // Pixel count of `len` bytes from byte `pos`, less any trailing pad field
    let pixels = |pos: usize, len: usize| -> u8 {
        let num = len * cpb;
        if num + pos * cpb > width {
            (num - 1) as u8
        } else {
            num as u8
        }
    };

    let mut raw = vec![0u8; stride];
    let mut run = vec![0usize; stride];
    for y in (0..image.height()).rev() {
        raw.fill(0);
        pack_indices(image.row(y), bit_count, &mut raw);

        // Length of the equal-byte run starting at every position
        for x in (0..stride).rev() {
            run[x] = if x + 1 < stride && raw[x + 1] == raw[x] {
                (run[x + 1] + 1).min(count_max)
            } else {
                1
            };
        }

        let mut x = 0;
        while x < stride {
            if run[x] >= 2 {
                let count = run[x];
                out.extend_from_slice(&[pixels(x, count), raw[x]]);
                x += count;
                continue;
            }

            // A stretch of runs no longer than 2
            let mut count = 0;
            let mut singles = 0;
            while x + count < stride && count < count_max && run[x + count] <= 2 {
                if run[x + count] == 1 {
                    singles += 1;
                }
                count += run[x + count];
            }
            if count * cpb > 255 {
                count -= 2;
            }

            if singles > 2 {
                out.extend_from_slice(&[ESCAPE, pixels(x, count)]);
                out.extend_from_slice(&raw[x..x + count]);
                if count % 2 == 1 {
                    out.push(0);
                }
            } else {
                let end = x + count;
                let mut i = x;
                while i < end {
                    let len = run[i].min(end - i);
                    out.extend_from_slice(&[pixels(i, len), raw[i]]);
                    i += len;
                }
            }
            x += count;
        }

        let end = if y == 0 { END_OF_BITMAP } else { END_OF_LINE };
        out.extend_from_slice(&[ESCAPE, end]);
    }
    out.len() - start
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixkit_core::Palette;

    fn index_image(width: u32, rows: &[&[u8]], colors: usize) -> Image {
        let palette = Palette::from_colors(
            (0..colors).map(|i| pixkit_core::RgbaQuad::gray(i as u8)).collect(),
        )
        .unwrap();
        let mut img = Image::new_indexed(width, rows.len() as u32, palette).unwrap();
        for (y, row) in rows.iter().enumerate() {
            img.row_mut(y as u32).copy_from_slice(row);
        }
        img
    }

    fn round_trip(img: &Image, bit_count: u16) -> (Image, usize) {
        let mut data = Vec::new();
        let n = write_rle(img, bit_count, &mut data);
        assert_eq!(n, data.len());
        let mut out = Image::new_indexed(img.width(), img.height(), img.palette().unwrap().clone())
            .unwrap();
        let mut cursor = ByteCursor::new(&data[..]);
        read_rle(bit_count, &mut cursor, &mut out).unwrap();
        assert_eq!(cursor.remaining(), 0);
        (out, n)
    }

    #[test]
    fn test_rle8_solid() {
        let row = [5u8; 100];
        let rows: Vec<&[u8]> = vec![&row[..]; 10];
        let img = index_image(100, &rows, 8);
        let (out, n) = round_trip(&img, 8);
        assert_eq!(out, img);
        // One encoded run plus the row terminator per row
        assert_eq!(n, 40);
    }

    #[test]
    fn test_rle8_opcodes() {
        let img = index_image(6, &[&[1, 1, 1, 2, 3, 4]], 8);
        let mut data = Vec::new();
        write_rle(&img, 8, &mut data);
        assert_eq!(data, vec![3, 1, 0, 3, 2, 3, 4, 0, 0, 1]);
    }

    #[test]
    fn test_rle8_mixed_runs() {
        let row1: Vec<u8> = (0..300u32).map(|x| ((x / 3) % 7) as u8).collect();
        let row2: Vec<u8> = (0..300u32).map(|x| (x % 5) as u8).collect();
        let row3: Vec<u8> = (0..300u32).map(|x| ((x * x) % 11 / 4) as u8).collect();
        let img = index_image(300, &[&row1, &row2, &row3], 16);
        let (out, _) = round_trip(&img, 8);
        assert_eq!(out, img);
    }

    #[test]
    fn test_rle8_long_pairs_back_off() {
        // Two singletons then runs of two, so a stretch overshoots 255 bytes
        let row: Vec<u8> = (0..400u32)
            .map(|x| if x < 2 { 7 + x as u8 } else { ((x - 2) / 2 % 2) as u8 })
            .collect();
        let img = index_image(400, &[&row, &row], 9);
        let (out, _) = round_trip(&img, 8);
        assert_eq!(out, img);

        let row: Vec<u8> = row.iter().map(|&v| v % 9).collect();
        let img = index_image(400, &[&row], 9);
        let (out, _) = round_trip(&img, 4);
        assert_eq!(out, img);
    }

    #[test]
    fn test_rle4_odd_width() {
        let row1: Vec<u8> = (0..37u32).map(|x| (x % 16) as u8).collect();
        let row2: Vec<u8> = (0..37u32).map(|x| if x < 20 { 3 } else { (x % 3) as u8 }).collect();
        let img = index_image(37, &[&row1, &row2], 16);
        let (out, _) = round_trip(&img, 4);
        assert_eq!(out, img);
    }

    #[test]
    fn test_rle4_wide_fragments() {
        let row: Vec<u8> = (0..601u32).map(|x| ((x / 5 + x / 2) % 4) as u8).collect();
        let img = index_image(601, &[&row], 4);
        let (out, _) = round_trip(&img, 4);
        assert_eq!(out, img);
    }

    #[test]
    fn test_decode_delta_and_truncation() {
        let mut img = index_image(4, &[&[0; 4], &[0; 4]], 4);
        // Bottom row: skip 2, then write two 3s; end of bitmap
        let data = [0, 2, 2, 0, 2, 3, 0, 1];
        let mut cursor = ByteCursor::new(&data[..]);
        read_rle(8, &mut cursor, &mut img).unwrap();
        assert_eq!(img.row(1), &[0, 0, 3, 3]);

        let data = [0, 5, 1, 2];
        let mut cursor = ByteCursor::new(&data[..]);
        assert!(read_rle(8, &mut cursor, &mut img).is_err());

        let data = [4, 1];
        let mut cursor = ByteCursor::new(&data[..]);
        assert!(read_rle(8, &mut cursor, &mut img).is_err());
    }
}
