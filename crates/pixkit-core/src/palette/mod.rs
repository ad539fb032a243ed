//! Palette - Color table for index-model images
//!
//! A palette holds up to 256 [`RgbaQuad`] entries. Index-model pixels are
//! bytes that address entries `0..len()`.

use crate::error::{Error, Result};

/// Maximum number of palette entries.
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// RGBA color entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RgbaQuad {
    /// Blue component (stored first for BMP compatibility)
    pub blue: u8,
    /// Green component
    pub green: u8,
    /// Red component
    pub red: u8,
    /// Alpha component
    pub alpha: u8,
}

impl RgbaQuad {
    /// Opaque white
    pub const WHITE: RgbaQuad = RgbaQuad::rgb(255, 255, 255);
    /// Opaque black
    pub const BLACK: RgbaQuad = RgbaQuad::rgb(0, 0, 0);

    /// Create a new RGBA color
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Create an RGB color (alpha = 255)
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, 255)
    }

    /// Create an opaque grayscale color
    pub const fn gray(value: u8) -> Self {
        Self::rgb(value, value, value)
    }

    /// Same color with alpha forced to 255.
    pub const fn opaque(self) -> Self {
        Self::rgb(self.red, self.green, self.blue)
    }

    /// Whether alpha is 255.
    pub const fn is_opaque(self) -> bool {
        self.alpha == 255
    }
}

/// Build an opaque color from its components.
pub fn color_from_rgb(red: u8, green: u8, blue: u8) -> RgbaQuad {
    RgbaQuad::rgb(red, green, blue)
}

/// Build a color from its components, alpha included.
pub fn color_from_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> RgbaQuad {
    RgbaQuad::new(red, green, blue, alpha)
}

/// Ordered color table for index-model images
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<RgbaQuad>,
}

impl Palette {
    /// Create an empty palette
    pub fn new() -> Self {
        Self { colors: Vec::new() }
    }

    /// Create a palette from a list of colors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteOverflow`] if more than 256 colors are given.
    pub fn from_colors(colors: Vec<RgbaQuad>) -> Result<Self> {
        if colors.len() > MAX_PALETTE_ENTRIES {
            return Err(Error::PaletteOverflow(colors.len()));
        }
        Ok(Self { colors })
    }

    /// The 256-entry opaque identity gray ramp: entry `i` is gray `i`.
    pub fn gray_ramp() -> Self {
        Self {
            colors: (0..=255u8).map(RgbaQuad::gray).collect(),
        }
    }

    /// The 2-entry bilevel palette: 0 = white, 1 = black.
    pub fn black_and_white() -> Self {
        Self {
            colors: vec![RgbaQuad::WHITE, RgbaQuad::BLACK],
        }
    }

    /// Get the number of colors
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get a color by index
    #[inline]
    pub fn get(&self, index: usize) -> Option<RgbaQuad> {
        self.colors.get(index).copied()
    }

    /// Get a mutable color by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut RgbaQuad> {
        self.colors.get_mut(index)
    }

    /// Append a color, returning its index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteOverflow`] if the palette is already full.
    pub fn add_color(&mut self, color: RgbaQuad) -> Result<usize> {
        if self.colors.len() >= MAX_PALETTE_ENTRIES {
            return Err(Error::PaletteOverflow(self.colors.len() + 1));
        }
        self.colors.push(color);
        Ok(self.colors.len() - 1)
    }

    /// Find the first entry equal to `color` in all four components.
    pub fn find(&self, color: RgbaQuad) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    /// Check if this is exactly the [`black_and_white`](Self::black_and_white)
    /// palette.
    pub fn is_black_and_white(&self) -> bool {
        self.colors == [RgbaQuad::WHITE, RgbaQuad::BLACK]
    }

    /// Index one past the last entry that is not fully opaque, or 0 when
    /// every entry is opaque.
    pub fn translucent_len(&self) -> usize {
        self.colors
            .iter()
            .rposition(|c| !c.is_opaque())
            .map_or(0, |i| i + 1)
    }

    /// Get all colors as a slice
    pub fn colors(&self) -> &[RgbaQuad] {
        &self.colors
    }
}
