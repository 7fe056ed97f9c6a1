use crate::gb::ppu::misc::Palette;

/// Holds all PPU Registers
#[derive(Copy, Clone, Debug, Default)]
pub struct Registers {
    pub lcd_control: LCDControl, // PPU_LCDC
    pub lcd_stat: LCDState,      // PPU_STAT
    pub ly: u8,                  // PPU_LY
    pub lyc: u8,                 // PPU_LYC
    pub scy: u8,                 // PPU_SCY
    pub scx: u8,                 // PPU_SCX
    pub dma: u8,                 // PPU_DMA, last written source page
    pub bg_palette: Palette,     // PPU_BGP
    pub obj_palette0: Palette,   // PPU_OBP0
    pub obj_palette1: Palette,   // PPU_OBP1
    pub wy: u8,                  // PPU_WY
    pub wx: u8,                  // PPU_WX
}

bitflags! {
    /// Represents PPU_LCDC at 0xFF40
    #[derive(Copy, Clone, Debug, Default, PartialEq)]
    pub struct LCDControl: u8 {
        const BG_EN    = 0b00000001; // BG & Window Enable
        const OBJ_EN   = 0b00000010; // OBJ Enable
        const OBJ_SIZE = 0b00000100; // OBJ Size
        const BG_MAP   = 0b00001000; // BG Tile Map Address
        const TILE_SEL = 0b00010000; // BG & Window Tile Data
        const WIN_EN   = 0b00100000; // Window Enable
        const WIN_MAP  = 0b01000000; // Window Tile Map Address
        const LCD_EN   = 0b10000000; // LCD Display Enable
    }

    /// Represents PPU_STAT at 0xFF41
    #[derive(Copy, Clone, Debug, Default, PartialEq)]
    pub struct LCDState: u8 {
        const PPU_MODE1   = 0b00000001; // PPU Mode
        const PPU_MODE2   = 0b00000010; // PPU Mode
        const LYC_STAT    = 0b00000100; // LYC == LY
        const H_BLANK_INT = 0b00001000; // Mode 0 H-Blank Interrupt
        const V_BLANK_INT = 0b00010000; // Mode 1 V-Blank Interrupt
        const OAM_INT     = 0b00100000; // Mode 2 OAM Interrupt
        const LY_INT      = 0b01000000; // LYC Interrupt
    }
}

impl LCDControl {
    /// Returns the VRAM offset of the background tile map.
    #[inline]
    pub const fn bg_tile_map(&self) -> usize {
        match self.contains(LCDControl::BG_MAP) {
            true => 0x1C00,
            false => 0x1800,
        }
    }

    /// Returns the VRAM offset of the window tile map.
    #[inline]
    pub const fn window_tile_map(&self) -> usize {
        match self.contains(LCDControl::WIN_MAP) {
            true => 0x1C00,
            false => 0x1800,
        }
    }

    /// Returns the VRAM offset of the given background or window tile.
    /// With TILE_SEL set tiles are addressed unsigned from 0x8000,
    /// otherwise the index is signed relative to 0x9000.
    #[inline]
    pub const fn bg_tile_data(&self, tile: u8) -> usize {
        match self.contains(LCDControl::TILE_SEL) {
            true => tile as usize * 16,
            false => (0x1000 + tile as i8 as isize * 16) as usize,
        }
    }

    /// Returns the sprite height in pixels.
    #[inline]
    pub const fn sprite_height(&self) -> u8 {
        match self.contains(LCDControl::OBJ_SIZE) {
            true => 16,
            false => 8,
        }
    }
}

impl LCDState {
    /// Returns the `PPUMode` based on the first two bits of PPU_STAT.
    #[inline]
    pub fn mode(&self) -> PPUMode {
        PPUMode::from(self.bits())
    }

    /// Sets the first two bits of PPU_STAT to the given `PPUMode`.
    #[inline]
    pub fn set_mode(&mut self, mode: PPUMode) {
        *self = LCDState::from_bits_truncate((self.bits() & 0b11111100) | u8::from(mode));
    }
}

/// Represents the first two bits in LCDState for convenience.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PPUMode {
    HBlank,     // 0b00
    VBlank,     // 0b01
    AccessOAM,  // 0b10
    AccessVRAM, // 0b11
}

impl From<PPUMode> for u8 {
    #[inline]
    fn from(value: PPUMode) -> u8 {
        match value {
            PPUMode::HBlank => 0b00,
            PPUMode::VBlank => 0b01,
            PPUMode::AccessOAM => 0b10,
            PPUMode::AccessVRAM => 0b11,
        }
    }
}

impl From<u8> for PPUMode {
    /// Only the lower two bits are considered.
    #[inline]
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => PPUMode::HBlank,
            0b01 => PPUMode::VBlank,
            0b10 => PPUMode::AccessOAM,
            _ => PPUMode::AccessVRAM,
        }
    }
}
