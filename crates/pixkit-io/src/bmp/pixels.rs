//! Uncompressed BMP pixel rows
//!
//! Stored rows run bottom to top and are padded to a 32-bit boundary.

use super::header::BmpHeader;
use crate::cursor::ByteCursor;
use crate::IoResult;
use pixkit_core::Image;

/// Unpack the MSB-first `bit_count`-bit fields of `packed` into `out`.
pub(crate) fn unpack_indices(packed: &[u8], bit_count: u16, out: &mut [u8]) {
    let bc = bit_count as usize;
    let mask = ((1u16 << bc) - 1) as u8;
    for (x, cell) in out.iter_mut().enumerate() {
        let bit = x * bc;
        let shift = 8 - bc - bit % 8;
        *cell = packed.get(bit / 8).map_or(0, |b| (b >> shift) & mask);
    }
}

/// Pack indices into MSB-first `bit_count`-bit fields. `out` must be
/// zeroed and at least `ceil(len * bit_count / 8)` bytes long.
pub(crate) fn pack_indices(indices: &[u8], bit_count: u16, out: &mut [u8]) {
    let bc = bit_count as usize;
    let mask = ((1u16 << bc) - 1) as u8;
    for (x, &index) in indices.iter().enumerate() {
        let bit = x * bc;
        let shift = 8 - bc - bit % 8;
        out[bit / 8] |= (index & mask) << shift;
    }
}

/// Decode uncompressed pixel data into `image`.
///
/// `cursor` must sit at the start of the pixel data. Rows are filled from
/// the bottom up; the caller handles top-down files.
pub fn read_rows(
    header: &BmpHeader,
    cursor: &mut ByteCursor<&[u8]>,
    image: &mut Image,
) -> IoResult<()> {
    let stride = header.stride();
    let width = image.width() as usize;
    let [rm, gm, bm, am] = header.masks;
    let has_alpha = header.has_alpha();

    for y in (0..image.height()).rev() {
        let src = cursor.read_bytes(stride);
        if src.len() < stride {
            break;
        }
        let dst = image.row_mut(y);
        match header.bit_count {
            32 => {
                for (cell, word) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    let w = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                    let a = if has_alpha { am.extract(w) } else { 0xff };
                    cell.copy_from_slice(&[rm.extract(w), gm.extract(w), bm.extract(w), a]);
                }
            }
            16 => {
                for (cell, word) in dst.chunks_exact_mut(4).zip(src.chunks_exact(2)) {
                    let w = u16::from_le_bytes([word[0], word[1]]) as u32;
                    let a = if has_alpha { am.extract(w) } else { 0xff };
                    cell.copy_from_slice(&[rm.extract(w), gm.extract(w), bm.extract(w), a]);
                }
            }
            24 => {
                for (cell, bgr) in dst.chunks_exact_mut(4).zip(src.chunks_exact(3)) {
                    cell.copy_from_slice(&[bgr[2], bgr[1], bgr[0], 0xff]);
                }
            }
            bc => unpack_indices(src, bc, &mut dst[..width]),
        }
    }
    cursor.finish("BMP pixel data")
}

/// Encode `image` as uncompressed rows at `bit_count`.
///
/// Index images take 1, 4 or 8; color images take 24 (B,G,R) or 32
/// (B,G,R,A).
pub fn write_rows(image: &Image, bit_count: u16, out: &mut Vec<u8>) {
    let stride = super::header::stride(image.width(), bit_count);
    let mut row = vec![0u8; stride];
    for y in (0..image.height()).rev() {
        row.fill(0);
        let src = image.row(y);
        match bit_count {
            32 => {
                for (dst, c) in row.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                    dst.copy_from_slice(&[c[2], c[1], c[0], c[3]]);
                }
            }
            24 => {
                for (dst, c) in row.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                    dst.copy_from_slice(&[c[2], c[1], c[0]]);
                }
            }
            bc => pack_indices(src, bc, &mut row),
        }
        out.extend_from_slice(&row);
    }
}
