//! Bounds-checked little-endian byte cursor
//!
//! A [`ByteCursor`] walks a fixed-size buffer. Any read or write whose span
//! would pass the end of the buffer latches an error flag instead of
//! panicking; reads then yield 0 and writes are dropped. Codecs parse a
//! whole header through the cursor and check [`ByteCursor::has_error`]
//! once at the end.

use crate::{IoError, IoResult};

/// Cursor over a byte buffer with a sticky overflow flag.
///
/// Reading works over any `AsRef<[u8]>` buffer; writing additionally needs
/// `AsMut<[u8]>`.
#[derive(Debug, Clone)]
pub struct ByteCursor<B> {
    buf: B,
    pos: usize,
    error: bool,
}

impl<B: AsRef<[u8]>> ByteCursor<B> {
    /// Create a cursor at offset 0.
    pub fn new(buf: B) -> Self {
        Self {
            buf,
            pos: 0,
            error: false,
        }
    }

    /// Current offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total buffer length.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }

    /// Check if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes left between the offset and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.len() - self.pos
    }

    /// Whether any access has run past the end of the buffer.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Move to an absolute offset. Offsets past the end latch the error
    /// flag and leave the position unchanged.
    pub fn seek(&mut self, pos: usize) {
        if pos > self.len() {
            self.error = true;
        } else {
            self.pos = pos;
        }
    }

    /// Advance by `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.take(n);
    }

    /// Claim the next `n` bytes, or latch the error flag.
    fn take(&mut self, n: usize) -> Option<std::ops::Range<usize>> {
        if n > self.remaining() {
            self.error = true;
            return None;
        }
        let start = self.pos;
        self.pos += n;
        Some(start..self.pos)
    }

    /// Read `n` raw bytes; empty on overflow.
    pub fn read_bytes(&mut self, n: usize) -> &[u8] {
        match self.take(n) {
            Some(range) => &self.buf.as_ref()[range],
            None => &[],
        }
    }

    fn read_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(range) = self.take(N) {
            out.copy_from_slice(&self.buf.as_ref()[range]);
        }
        out
    }

    pub fn read8(&mut self) -> u8 {
        self.read_array::<1>()[0]
    }

    pub fn read16(&mut self) -> u16 {
        u16::from_le_bytes(self.read_array())
    }

    pub fn read32(&mut self) -> u32 {
        u32::from_le_bytes(self.read_array())
    }

    pub fn read_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.read_array())
    }

    /// Turn a latched error flag into [`IoError::InvalidData`].
    pub fn finish(&self, what: &str) -> IoResult<()> {
        if self.error {
            return Err(IoError::InvalidData(format!("truncated {}", what)));
        }
        Ok(())
    }

    /// Get a reference to the underlying buffer.
    pub fn get_ref(&self) -> &B {
        &self.buf
    }

    /// Unwrap the underlying buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ByteCursor<B> {
    /// Write raw bytes; dropped entirely on overflow.
    pub fn write_bytes(&mut self, data: &[u8]) {
        if let Some(range) = self.take(data.len()) {
            self.buf.as_mut()[range].copy_from_slice(data);
        }
    }

    pub fn write8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut c = ByteCursor::new(&data[..]);
        assert_eq!(c.read8(), 0x01);
        assert_eq!(c.read16(), 0x0302);
        assert_eq!(c.read32(), 0x0706_0504);
        assert_eq!(c.remaining(), 0);
        assert!(!c.has_error());
    }

    #[test]
    fn test_read_overflow_latches() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut c = ByteCursor::new(&data[..]);
        assert_eq!(c.read32(), 0);
        assert!(c.has_error());
        // Position did not move past the end
        assert_eq!(c.position(), 0);
        // Flag stays set even after a read that fits
        assert_eq!(c.read16(), 0xBBAA);
        assert!(c.has_error());
        assert!(c.finish("header").is_err());
    }

    #[test]
    fn test_write_little_endian() {
        let mut c = ByteCursor::new(vec![0u8; 7]);
        c.write8(0x01);
        c.write16(0x0302);
        c.write32(0x0706_0504);
        assert!(!c.has_error());
        assert_eq!(c.into_inner(), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_write_overflow_drops() {
        let mut buf = [0u8; 3];
        let mut c = ByteCursor::new(&mut buf[..]);
        c.write32(0xFFFF_FFFF);
        assert!(c.has_error());
        assert_eq!(buf, [0, 0, 0]);
    }

    #[test]
    fn test_seek() {
        let data = [1u8, 2, 3, 4];
        let mut c = ByteCursor::new(&data[..]);
        c.seek(2);
        assert_eq!(c.read16(), 0x0403);
        c.seek(5);
        assert!(c.has_error());
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn test_read_bytes_and_signed() {
        let data = [0xFE, 0xFF, 0xFF, 0xFF, 9, 8];
        let mut c = ByteCursor::new(&data[..]);
        assert_eq!(c.read_i32(), -2);
        assert_eq!(c.read_bytes(2), &[9, 8]);
        assert!(c.read_bytes(1).is_empty());
        assert!(c.has_error());
    }
}
