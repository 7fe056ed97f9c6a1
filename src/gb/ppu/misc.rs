use crate::gb::utils::bit_at;

/// Defines a Palette to colorize a Pixel
/// used by bgp, obp0 and obp1 registers.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct Palette {
    map: [ColoredPixel; 4],
}

impl Palette {
    #[inline]
    pub fn colorize(&self, pixel: Pixel) -> ColoredPixel {
        self.map[u8::from(pixel) as usize]
    }
}

impl From<u8> for Palette {
    /// Every two bits in the palette data byte represent a colour.
    /// Bits 7-6 maps to colour id 11, bits 5-4 map to colour id 10,
    /// bits 3-2 map to colour id 01 and bits 1-0 map to colour id 00
    #[inline]
    fn from(value: u8) -> Self {
        Self {
            map: [
                ColoredPixel::from(value),
                ColoredPixel::from(value >> 2),
                ColoredPixel::from(value >> 4),
                ColoredPixel::from(value >> 6),
            ],
        }
    }
}

impl From<Palette> for u8 {
    #[inline]
    fn from(palette: Palette) -> u8 {
        palette
            .map
            .iter()
            .enumerate()
            .fold(0, |value, (i, color)| value | u8::from(*color) << (i * 2))
    }
}

/// Represents an non-colorized Pixel, the 2-bit colour index of a tile.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub enum Pixel {
    #[default]
    Zero,
    One,
    Two,
    Three,
}

impl Pixel {
    /// Combines the bit at the given position of both tile bitplanes.
    #[inline]
    pub fn from_bitplanes(low: u8, high: u8, bit: u8) -> Self {
        Pixel::from((bit_at(high, bit) as u8) << 1 | bit_at(low, bit) as u8)
    }
}

impl From<Pixel> for u8 {
    #[inline]
    fn from(value: Pixel) -> u8 {
        match value {
            Pixel::Zero => 0b00,
            Pixel::One => 0b01,
            Pixel::Two => 0b10,
            Pixel::Three => 0b11,
        }
    }
}

impl From<u8> for Pixel {
    /// Only the lower two bits are considered.
    #[inline]
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Pixel::Zero,
            0b01 => Pixel::One,
            0b10 => Pixel::Two,
            _ => Pixel::Three,
        }
    }
}

/// Defines a colorized Pixel created from a non-colorized Pixel with a Palette.
#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub enum ColoredPixel {
    #[default]
    White,
    LightGrey,
    DarkGrey,
    Black,
}

impl From<ColoredPixel> for u8 {
    #[inline]
    fn from(value: ColoredPixel) -> u8 {
        match value {
            ColoredPixel::White => 0b00,
            ColoredPixel::LightGrey => 0b01,
            ColoredPixel::DarkGrey => 0b10,
            ColoredPixel::Black => 0b11,
        }
    }
}

impl From<u8> for ColoredPixel {
    /// Only the lower two bits are considered.
    #[inline]
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => ColoredPixel::White,
            0b01 => ColoredPixel::LightGrey,
            0b10 => ColoredPixel::DarkGrey,
            _ => ColoredPixel::Black,
        }
    }
}

bitflags! {
    /// Attribute byte of an OAM entry.
    #[derive(Copy, Clone, Debug, Default, PartialEq)]
    pub struct SpriteAttributes: u8 {
        const DMG_PALETTE = 0b0001_0000; // 0 = OBP0, 1 = OBP1
        const X_FLIP      = 0b0010_0000;
        const Y_FLIP      = 0b0100_0000;
        const PRIORITY    = 0b1000_0000; // 1 = BG and Window colors 1-3 are drawn over this OBJ
    }
}

/// A single OAM entry, the position is kept in screen coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sprite {
    pub y: u8, // screen y + 16
    pub x: u8, // screen x + 8
    pub tile_index: u8,
    pub attributes: SpriteAttributes,
}

impl Sprite {
    #[inline]
    pub fn new(y: u8, x: u8, tile_index: u8, attributes: SpriteAttributes) -> Self {
        Self {
            y,
            x,
            tile_index,
            attributes,
        }
    }

    /// Returns true if the sprite covers the given scanline.
    #[inline]
    pub const fn is_on_line(&self, ly: u8, height: u8) -> bool {
        let line = ly as i16 + 16 - self.y as i16;
        line >= 0 && line < height as i16
    }

    /// Returns true if the sprite covers the given screen column.
    #[inline]
    pub const fn covers_column(&self, x: u8) -> bool {
        let column = x as i16 + 8 - self.x as i16;
        column >= 0 && column < 8
    }
}

impl From<&[u8]> for Sprite {
    fn from(entry: &[u8]) -> Self {
        match entry {
            &[y, x, tile_index, flags, ..] => {
                Sprite::new(y, x, tile_index, SpriteAttributes::from_bits_truncate(flags))
            }
            // Partial entries can't be produced by chunks_exact(4)
            _ => Sprite::new(0, 0, 0, SpriteAttributes::empty()),
        }
    }
}
