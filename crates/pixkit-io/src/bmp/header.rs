//! BMP file/info header codec
//!
//! Parses the 14-byte file header and one of the info-header dialects
//! (OS/2 core, Windows V3 / OS/2 V2, V4, V5) into a [`BmpHeader`], derives
//! the channel masks used to unpack 16/32-bit pixels, and emits the
//! Windows V3 or V5 headers the writer produces.

use crate::cursor::ByteCursor;
use crate::{IoError, IoResult};
use log::debug;
use pixkit_core::{Palette, RgbaQuad};

/// "BM" read as a little-endian u16
pub const FILE_TYPE: u16 = 0x4D42;

/// BMP file header size
pub const FILE_HEADER_SIZE: u32 = 14;

/// Info header sizes, one per dialect
pub const CORE_HEADER_SIZE: u32 = 12;
pub const INFO_HEADER_SIZE: u32 = 40;
pub const OS2_V2_HEADER_SIZE: u32 = 64;
pub const V4_HEADER_SIZE: u32 = 108;
pub const V5_HEADER_SIZE: u32 = 124;

/// Largest palette a file may carry (256 four-byte entries)
pub const MAX_PALETTE_BYTES: u32 = 4 * 256;

/// Largest accepted pixel-data offset
pub const MAX_PIXEL_OFFSET: u32 = FILE_HEADER_SIZE + V5_HEADER_SIZE + MAX_PALETTE_BYTES;

const LCS_SRGB: u32 = 0x7352_4742;
const LCS_GM_GRAPHICS: u32 = 2;

/// Offsets of the size fields patched after RLE encoding
const BF_SIZE_OFFSET: usize = 2;
const BI_SIZE_IMAGE_OFFSET: usize = FILE_HEADER_SIZE as usize + 20;

/// Info-header dialect, selected by the declared header size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDialect {
    /// OS/2 core header (12 bytes): 16-bit geometry, 3-byte palette entries
    Core,
    /// Windows V3 (40 bytes) or OS/2 V2 (64 bytes)
    V3,
    /// Windows V4 (108 bytes), masks embedded
    V4,
    /// Windows V5 (124 bytes), masks embedded
    V5,
}

impl HeaderDialect {
    /// Map a declared info-header size to its dialect.
    pub fn from_size(size: u32) -> Option<Self> {
        match size {
            CORE_HEADER_SIZE => Some(Self::Core),
            INFO_HEADER_SIZE | OS2_V2_HEADER_SIZE => Some(Self::V3),
            V4_HEADER_SIZE => Some(Self::V4),
            V5_HEADER_SIZE => Some(Self::V5),
            _ => None,
        }
    }

    /// Bytes per palette entry.
    pub fn palette_entry_size(self) -> u32 {
        match self {
            Self::Core => 3,
            _ => 4,
        }
    }
}

/// Pixel-data compression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Compression {
    Rgb = 0,
    Rle8 = 1,
    Rle4 = 2,
    Bitfields = 3,
}

impl Compression {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Rgb),
            1 => Some(Self::Rle8),
            2 => Some(Self::Rle4),
            3 => Some(Self::Bitfields),
            _ => None,
        }
    }

    /// Check whether this compression is legal at `bit_count`.
    pub fn pairs_with(self, bit_count: u16) -> bool {
        match self {
            Self::Rgb => true,
            Self::Rle4 => bit_count == 4,
            Self::Rle8 => bit_count == 8,
            Self::Bitfields => bit_count == 16 || bit_count == 32,
        }
    }
}

/// One channel of a packed 16/32-bit pixel.
///
/// `max` is the largest raw channel value; extraction rescales
/// `0..=max` to `0..=255`, rounding to nearest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMask {
    pub mask: u32,
    pub shift: u32,
    pub max: u32,
}

impl ChannelMask {
    /// Derive shift and max from a raw mask word.
    ///
    /// A zero mask yields shift 0 and max 0xFF, so extraction returns 0.
    pub fn from_mask(mask: u32) -> Self {
        if mask == 0 {
            return Self {
                mask,
                shift: 0,
                max: 0xff,
            };
        }
        let shift = mask.trailing_zeros();
        let max = match mask >> shift {
            0 => 0xff,
            m => m,
        };
        Self { mask, shift, max }
    }

    /// Extract this channel from a packed word, scaled to 8 bits.
    #[inline]
    pub fn extract(&self, word: u32) -> u8 {
        let raw = ((word & self.mask) >> self.shift) as u64;
        let max = self.max as u64;
        ((raw * 255 + max / 2) / max).min(255) as u8
    }
}

/// Default (R, G, B, A) masks for uncompressed 16/32-bit data.
fn default_masks(bit_count: u16) -> [u32; 4] {
    match bit_count {
        32 => [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0],
        16 => [0x7c00, 0x03e0, 0x001f, 0],
        _ => [0; 4],
    }
}

fn derive_masks(raw: [u32; 4]) -> [ChannelMask; 4] {
    raw.map(ChannelMask::from_mask)
}

/// Parsed BMP file and info headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmpHeader {
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    /// Offset of the pixel data from the start of the file
    pub pixel_offset: u32,

    pub dialect: HeaderDialect,
    /// Declared info-header size
    pub info_size: u32,
    pub width: i32,
    /// Negative for top-down row order
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: Compression,
    pub image_size: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,

    /// Channel masks in R, G, B, A order
    pub masks: [ChannelMask; 4],
}

impl BmpHeader {
    /// Parse the file header and info header at the start of `cursor`.
    ///
    /// On success the cursor sits just past the info header (and the
    /// separate bitfield masks, when present), where the palette starts.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidData`] for a bad magic, an out-of-range
    /// pixel offset or header size, a truncated header, or bad geometry,
    /// and [`IoError::UnsupportedFormat`] for an unsupported bit count or
    /// compression.
    pub fn read(cursor: &mut ByteCursor<&[u8]>) -> IoResult<Self> {
        let magic = cursor.read16();
        let file_size = cursor.read32();
        let reserved1 = cursor.read16();
        let reserved2 = cursor.read16();
        let pixel_offset = cursor.read32();
        cursor.finish("BMP file header")?;

        if magic != FILE_TYPE {
            return Err(IoError::InvalidData("not a BMP file".to_string()));
        }
        if pixel_offset > MAX_PIXEL_OFFSET {
            return Err(IoError::InvalidData(format!(
                "BMP pixel offset {} exceeds {}",
                pixel_offset, MAX_PIXEL_OFFSET
            )));
        }

        let info_size = cursor.read32();
        cursor.finish("BMP info header")?;
        if info_size > V5_HEADER_SIZE {
            return Err(IoError::InvalidData(format!(
                "BMP info header size {} exceeds {}",
                info_size, V5_HEADER_SIZE
            )));
        }
        let dialect = HeaderDialect::from_size(info_size).ok_or_else(|| {
            IoError::InvalidData(format!("unsupported BMP info header size: {}", info_size))
        })?;

        let mut header = BmpHeader {
            file_size,
            reserved1,
            reserved2,
            pixel_offset,
            dialect,
            info_size,
            width: 0,
            height: 0,
            planes: 0,
            bit_count: 0,
            compression: Compression::Rgb,
            image_size: 0,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            clr_used: 0,
            clr_important: 0,
            masks: derive_masks([0; 4]),
        };

        let mut embedded_masks = None;
        let raw_compression = match dialect {
            HeaderDialect::Core => {
                header.width = cursor.read16() as i32;
                header.height = cursor.read16() as i32;
                header.planes = cursor.read16();
                header.bit_count = cursor.read16();
                0
            }
            HeaderDialect::V3 | HeaderDialect::V4 | HeaderDialect::V5 => {
                header.width = cursor.read_i32();
                header.height = cursor.read_i32();
                header.planes = cursor.read16();
                header.bit_count = cursor.read16();
                let raw = cursor.read32();
                header.image_size = cursor.read32();
                header.x_pels_per_meter = cursor.read_i32();
                header.y_pels_per_meter = cursor.read_i32();
                header.clr_used = cursor.read32();
                header.clr_important = cursor.read32();
                if dialect != HeaderDialect::V3 {
                    embedded_masks = Some([
                        cursor.read32(),
                        cursor.read32(),
                        cursor.read32(),
                        cursor.read32(),
                    ]);
                }
                raw
            }
        };
        cursor.seek((FILE_HEADER_SIZE + info_size) as usize);
        cursor.finish("BMP info header")?;

        header.compression = Compression::from_raw(raw_compression).ok_or_else(|| {
            IoError::UnsupportedFormat(format!("BMP compression {}", raw_compression))
        })?;

        let mut raw_masks = default_masks(header.bit_count);
        if header.compression == Compression::Bitfields {
            match embedded_masks {
                Some(masks) => raw_masks = masks,
                None => {
                    // Three masks follow the header, inside the palette area
                    let room = pixel_offset.saturating_sub(FILE_HEADER_SIZE + info_size);
                    if room < 12 {
                        return Err(IoError::InvalidData(
                            "BMP bitfield masks missing".to_string(),
                        ));
                    }
                    raw_masks = [cursor.read32(), cursor.read32(), cursor.read32(), 0];
                    cursor.finish("BMP bitfield masks")?;
                }
            }
        }
        header.masks = derive_masks(raw_masks);

        header.validate()?;
        debug!(
            "BMP {:?} header: {}x{} bit_count={} compression={:?} offset={}",
            header.dialect,
            header.width,
            header.height,
            header.bit_count,
            header.compression,
            header.pixel_offset
        );
        Ok(header)
    }

    /// Check bit count, compression pairing and geometry.
    pub fn validate(&self) -> IoResult<()> {
        if !matches!(self.bit_count, 1 | 4 | 8 | 16 | 24 | 32) {
            return Err(IoError::UnsupportedFormat(format!(
                "BMP bit count {}",
                self.bit_count
            )));
        }
        if !self.compression.pairs_with(self.bit_count) {
            return Err(IoError::UnsupportedFormat(format!(
                "BMP compression {:?} with bit count {}",
                self.compression, self.bit_count
            )));
        }
        if self.width <= 0 || self.height == 0 || self.height == i32::MIN {
            return Err(IoError::InvalidData(format!(
                "invalid BMP dimensions: {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Image width in pixels. Only meaningful after [`validate`](Self::validate).
    pub fn pixel_width(&self) -> u32 {
        self.width.unsigned_abs()
    }

    /// Number of rows. Only meaningful after [`validate`](Self::validate).
    pub fn rows(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Whether rows are stored top to bottom.
    pub fn top_down(&self) -> bool {
        self.height < 0
    }

    /// Bytes per stored row, 32-bit aligned.
    pub fn stride(&self) -> usize {
        stride(self.pixel_width(), self.bit_count)
    }

    /// Whether the alpha mask is set.
    pub fn has_alpha(&self) -> bool {
        self.masks[3].mask != 0
    }

    /// Read the palette that sits between the headers and the pixel data.
    ///
    /// The entry count comes from the room before the pixel offset, capped
    /// at `2^bit_count` and at a smaller nonzero `clr_used`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidData`] if there is room for fewer entries
    /// than `clr_used`, or if the palette is truncated.
    pub fn read_palette(&self, cursor: &mut ByteCursor<&[u8]>) -> IoResult<Palette> {
        let entry_size = self.dialect.palette_entry_size();
        let room = self
            .pixel_offset
            .saturating_sub(FILE_HEADER_SIZE + self.info_size);
        let mut count = room / entry_size;
        if count < self.clr_used {
            return Err(IoError::InvalidData(format!(
                "BMP palette holds {} entries but {} are used",
                count, self.clr_used
            )));
        }
        count = count.min(1u32.checked_shl(self.bit_count as u32).unwrap_or(u32::MAX));
        if self.clr_used != 0 && self.clr_used < count {
            count = self.clr_used;
        }

        let mut colors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let entry = cursor.read_bytes(entry_size as usize);
            if let [b, g, r, ..] = *entry {
                colors.push(RgbaQuad::rgb(r, g, b));
            }
        }
        cursor.finish("BMP palette")?;
        debug!("BMP palette: {} entries", colors.len());
        Ok(Palette::from_colors(colors)?)
    }

    /// Build the header the writer emits for an image.
    ///
    /// 32-bit images get a V5 header with A8R8G8B8 bitfields; everything
    /// else gets a 40-byte V3 header.
    pub fn for_image(
        width: u32,
        height: u32,
        bit_count: u16,
        compression: Compression,
        palette_len: usize,
        image_size: u32,
    ) -> Self {
        let (dialect, info_size, raw_masks) = if bit_count == 32 {
            (
                HeaderDialect::V5,
                V5_HEADER_SIZE,
                [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000],
            )
        } else {
            (HeaderDialect::V3, INFO_HEADER_SIZE, default_masks(bit_count))
        };
        let palette_bytes = if bit_count <= 8 {
            (1u32 << bit_count) * 4
        } else {
            0
        };
        let pixel_offset = FILE_HEADER_SIZE + info_size + palette_bytes;
        BmpHeader {
            file_size: pixel_offset + image_size,
            reserved1: 0,
            reserved2: 0,
            pixel_offset,
            dialect,
            info_size,
            width: width as i32,
            height: height as i32,
            planes: 1,
            bit_count,
            compression,
            image_size,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            clr_used: palette_len as u32,
            clr_important: 0,
            masks: derive_masks(raw_masks),
        }
    }

    /// Encoded size of the file and info headers.
    pub fn encoded_len(&self) -> usize {
        (FILE_HEADER_SIZE + self.info_size) as usize
    }

    /// Emit the file and info headers.
    ///
    /// Only the V3 and V5 layouts are written.
    pub fn write<B: AsRef<[u8]> + AsMut<[u8]>>(&self, cursor: &mut ByteCursor<B>) {
        cursor.write16(FILE_TYPE);
        cursor.write32(self.file_size);
        cursor.write16(self.reserved1);
        cursor.write16(self.reserved2);
        cursor.write32(self.pixel_offset);

        cursor.write32(self.info_size);
        cursor.write_i32(self.width);
        cursor.write_i32(self.height);
        cursor.write16(self.planes);
        cursor.write16(self.bit_count);
        cursor.write32(self.compression as u32);
        cursor.write32(self.image_size);
        cursor.write_i32(self.x_pels_per_meter);
        cursor.write_i32(self.y_pels_per_meter);
        cursor.write32(self.clr_used);
        cursor.write32(self.clr_important);

        if self.dialect == HeaderDialect::V5 {
            for m in &self.masks {
                cursor.write32(m.mask);
            }
            cursor.write32(LCS_SRGB);
            // CIEXYZTRIPLE endpoints (9 words) and three gamma words
            for _ in 0..12 {
                cursor.write32(0);
            }
            cursor.write32(LCS_GM_GRAPHICS);
            // Profile data, profile size, reserved
            for _ in 0..3 {
                cursor.write32(0);
            }
        }
    }

    /// Rewrite the file-size and image-size fields of an encoded file.
    pub fn patch_sizes(file: &mut [u8], image_size: u32) {
        let file_size = file.len() as u32;
        let mut cursor = ByteCursor::new(file);
        cursor.seek(BF_SIZE_OFFSET);
        cursor.write32(file_size);
        cursor.seek(BI_SIZE_IMAGE_OFFSET);
        cursor.write32(image_size);
    }
}

/// Bytes per row at `bit_count`, padded to a 32-bit boundary.
#[inline]
pub fn stride(width: u32, bit_count: u16) -> usize {
    (width as usize * bit_count as usize).div_ceil(32) * 4
}

/// Write `palette` as 4-byte B,G,R,0 entries, zero-padded to
/// `2^bit_count` entries.
pub fn write_palette<B: AsRef<[u8]> + AsMut<[u8]>>(
    cursor: &mut ByteCursor<B>,
    palette: &Palette,
    bit_count: u16,
) {
    let slots = 1usize << bit_count;
    for i in 0..slots {
        match palette.get(i) {
            Some(c) => cursor.write_bytes(&[c.blue, c.green, c.red, 0]),
            None => cursor.write_bytes(&[0; 4]),
        }
    }
}
