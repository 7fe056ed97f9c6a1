pub mod buffer;
pub mod misc;
pub mod registers;

use crate::gb::constants::*;
use crate::gb::interrupt::InterruptRegister;
use crate::gb::ppu::buffer::FrameBuffer;
use crate::gb::ppu::misc::{ColoredPixel, Palette, Pixel, Sprite, SpriteAttributes};
use crate::gb::ppu::registers::{LCDControl, LCDState, PPUMode, Registers};
use crate::gb::timer::Clock;
use crate::gb::{AddressSpace, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Duration of the OAM scan at the beginning of each visible line.
pub const OAM_SCAN_CYCLES: u32 = 80;

/// Duration of the pixel transfer to the LCD.
pub const PIXEL_TRANSFER_CYCLES: u32 = 172;

/// A full scanline takes 456 clock cycles, including HBlank.
pub const SCANLINE_CYCLES: u32 = 456;

/// The remaining part of a visible line.
pub const HBLANK_CYCLES: u32 = SCANLINE_CYCLES - OAM_SCAN_CYCLES - PIXEL_TRANSFER_CYCLES;

/// Last line of the VBlank period, 144 visible lines followed by 10 VBlank lines.
pub const VERTICAL_BLANK_SCAN_LINE_MAX: u8 = 153;

/// The OAM scan selects at most 10 sprites for a single line.
pub const MAX_SPRITES_PER_LINE: usize = 10;

/// Pixel Processing Unit
#[derive(Clone)]
pub struct PPU {
    r: Registers,
    vram: [u8; VRAM_SIZE],
    oam: [u8; OAM_SIZE],
    clock: Clock,
    buffer: FrameBuffer,
    line_sprites: Vec<Sprite>, // sprites of the current line, in priority order
    window_line_counter: u8,
    frame_ready: bool,
}

impl Default for PPU {
    fn default() -> Self {
        Self {
            r: Registers::default(),
            vram: [0u8; VRAM_SIZE],
            oam: [0u8; OAM_SIZE],
            clock: Clock::default(),
            buffer: FrameBuffer::default(),
            line_sprites: Vec::with_capacity(MAX_SPRITES_PER_LINE),
            window_line_counter: 0,
            frame_ready: false,
        }
    }
}

impl PPU {
    /// Steps the PPU for a given number of cycles.
    pub fn step(&mut self, int_reg: &mut InterruptRegister, cycles: u16) {
        if !self.r.lcd_control.contains(LCDControl::LCD_EN) {
            // Screen is off, PPU remains idle.
            return;
        }

        self.clock.advance(cycles as u32);

        loop {
            let mode = self.r.lcd_stat.mode();
            let duration = match mode {
                PPUMode::AccessOAM => OAM_SCAN_CYCLES,
                PPUMode::AccessVRAM => PIXEL_TRANSFER_CYCLES,
                PPUMode::HBlank => HBLANK_CYCLES,
                PPUMode::VBlank => SCANLINE_CYCLES,
            };
            if self.clock.ticks() < duration {
                break;
            }
            self.clock.consume(duration);

            match mode {
                // The sprites of the line have been selected on entry,
                // continue with the pixel transfer.
                PPUMode::AccessOAM => self.switch_mode(PPUMode::AccessVRAM, int_reg),
                PPUMode::AccessVRAM => {
                    self.draw_line();
                    self.switch_mode(PPUMode::HBlank, int_reg);
                }
                // At the end of a visible scanline the PPU goes back to the OAM scan,
                // after line 143 it enters VBlank instead.
                PPUMode::HBlank => {
                    self.set_ly(self.r.ly + 1, int_reg);
                    match self.r.ly as usize >= SCREEN_HEIGHT {
                        true => self.switch_mode(PPUMode::VBlank, int_reg),
                        false => self.switch_mode(PPUMode::AccessOAM, int_reg),
                    }
                }
                // VBlank lasts as many cycles as would be needed to keep
                // displaying scanlines up to line 153.
                PPUMode::VBlank => match self.r.ly >= VERTICAL_BLANK_SCAN_LINE_MAX {
                    true => {
                        self.window_line_counter = 0;
                        self.set_ly(0, int_reg);
                        self.switch_mode(PPUMode::AccessOAM, int_reg);
                    }
                    false => self.set_ly(self.r.ly + 1, int_reg),
                },
            }
        }
    }

    /// Returns true once after the PPU entered VBlank with a completed frame.
    #[inline]
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    /// Returns the most recent frame.
    #[inline]
    pub fn frame(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Returns the current scanline.
    #[inline]
    pub fn ly(&self) -> u8 {
        self.r.ly
    }

    /// Returns the current PPU mode.
    #[inline]
    pub fn mode(&self) -> PPUMode {
        self.r.lcd_stat.mode()
    }

    /// Returns the sprites selected for the current scanline.
    #[inline]
    pub fn line_sprites(&self) -> &[Sprite] {
        &self.line_sprites
    }

    /// Switches the PPU mode and requests interrupts if needed.
    fn switch_mode(&mut self, mode: PPUMode, int_reg: &mut InterruptRegister) {
        self.r.lcd_stat.set_mode(mode);
        let stat_source = match mode {
            PPUMode::AccessOAM => {
                self.select_sprites();
                LCDState::OAM_INT
            }
            PPUMode::HBlank => LCDState::H_BLANK_INT,
            PPUMode::VBlank => {
                self.frame_ready = true;
                int_reg.insert(InterruptRegister::VBLANK);
                LCDState::V_BLANK_INT
            }
            PPUMode::AccessVRAM => return,
        };
        if self.r.lcd_stat.contains(stat_source) {
            int_reg.insert(InterruptRegister::STAT);
        }
    }

    /// Updates LY and compares it against LYC exactly once.
    fn set_ly(&mut self, ly: u8, int_reg: &mut InterruptRegister) {
        self.r.ly = ly;
        self.compare_ly(int_reg);
    }

    /// Handles the coincidence flag, which is set when the LY register matches the LYC register.
    fn compare_ly(&mut self, int_reg: &mut InterruptRegister) {
        if self.r.ly != self.r.lyc {
            self.r.lcd_stat.remove(LCDState::LYC_STAT);
            return;
        }
        self.r.lcd_stat.insert(LCDState::LYC_STAT);
        if self.r.lcd_stat.contains(LCDState::LY_INT) {
            int_reg.insert(InterruptRegister::STAT);
        }
    }

    /// Handles writes to LCDC, switching the display on or off resets the line state.
    fn write_control(&mut self, value: u8) {
        let was_enabled = self.r.lcd_control.contains(LCDControl::LCD_EN);
        self.r.lcd_control = LCDControl::from_bits_truncate(value);
        let is_enabled = self.r.lcd_control.contains(LCDControl::LCD_EN);

        match (was_enabled, is_enabled) {
            (true, false) => {
                log::debug!("LCD disabled");
                self.reset_line_state();
                self.r.lcd_stat.set_mode(PPUMode::HBlank);
            }
            (false, true) => {
                log::debug!("LCD enabled");
                self.reset_line_state();
                self.r.lcd_stat.set_mode(PPUMode::AccessOAM);
                self.select_sprites();
                match self.r.ly == self.r.lyc {
                    true => self.r.lcd_stat.insert(LCDState::LYC_STAT),
                    false => self.r.lcd_stat.remove(LCDState::LYC_STAT),
                }
            }
            _ => {}
        }
    }

    #[inline]
    fn reset_line_state(&mut self) {
        self.clock.reset();
        self.r.ly = 0;
        self.window_line_counter = 0;
    }

    /// Selects up to 10 sprites of the current line in OAM order,
    /// then orders them by their priority: smaller X first, OAM order on ties.
    fn select_sprites(&mut self) {
        let height = self.r.lcd_control.sprite_height();
        let ly = self.r.ly;
        self.line_sprites.clear();
        self.line_sprites.extend(
            self.oam
                .chunks_exact(4)
                .map(Sprite::from)
                .filter(|sprite| sprite.is_on_line(ly, height))
                .take(MAX_SPRITES_PER_LINE),
        );
        // sort_by_key is stable, equal X keeps the OAM order
        self.line_sprites.sort_by_key(|sprite| sprite.x);
    }

    /// Returns the colour index of a background or window tile map position.
    fn tile_pixel(&self, map: usize, map_x: u8, map_y: u8) -> Pixel {
        let tile = self.vram[map + (map_y as usize / 8) * 32 + map_x as usize / 8];
        let offset = self.r.lcd_control.bg_tile_data(tile) + (map_y as usize % 8) * 2;
        Pixel::from_bitplanes(self.vram[offset], self.vram[offset + 1], 7 - map_x % 8)
    }

    /// Fetches the background colour indices of the current scan line.
    fn fetch_background(&self, line: &mut [Pixel; SCREEN_WIDTH]) {
        let map = self.r.lcd_control.bg_tile_map();
        let y = self.r.ly.wrapping_add(self.r.scy);
        for (i, pixel) in line.iter_mut().enumerate() {
            let x = (i as u8).wrapping_add(self.r.scx);
            *pixel = self.tile_pixel(map, x, y);
        }
    }

    /// Replaces the background with the window where it covers the current line.
    /// Returns true if any window pixel has been fetched.
    fn fetch_window(&self, line: &mut [Pixel; SCREEN_WIDTH]) -> bool {
        // WX holds the window position plus 7
        let window_x = self.r.wx as usize;
        if self.r.ly < self.r.wy || window_x >= SCREEN_WIDTH + 7 {
            return false;
        }
        let map = self.r.lcd_control.window_tile_map();
        let y = self.window_line_counter;
        for (i, pixel) in line.iter_mut().enumerate().skip(window_x.saturating_sub(7)) {
            let x = (i + 7 - window_x) as u8;
            *pixel = self.tile_pixel(map, x, y);
        }
        true
    }

    /// Returns the colour index of the given sprite at the given screen column.
    fn sprite_pixel(&self, sprite: &Sprite, x: usize) -> Pixel {
        let height = self.r.lcd_control.sprite_height();
        let line = (self.r.ly as i16 + 16 - sprite.y as i16) as u8;
        if line >= height {
            // LCDC changed the sprite size since the OAM scan
            return Pixel::Zero;
        }
        let line = match sprite.attributes.contains(SpriteAttributes::Y_FLIP) {
            true => height - 1 - line,
            false => line,
        };
        // Bit 0 of the tile index is ignored for 8x16 sprites
        let tile = match height {
            16 => sprite.tile_index & 0xFE,
            _ => sprite.tile_index,
        } as usize;
        let offset = tile * 16 + line as usize * 2;

        let column = (x as i16 + 8 - sprite.x as i16) as u8;
        let bit = match sprite.attributes.contains(SpriteAttributes::X_FLIP) {
            true => column,
            false => 7 - column,
        };
        Pixel::from_bitplanes(self.vram[offset], self.vram[offset + 1], bit)
    }

    /// Draws the sprites on the current scan line.
    /// The first opaque pixel in priority order wins, it is hidden if the
    /// sprite yields to a non-zero background colour.
    fn draw_sprites(&mut self, background: &[Pixel; SCREEN_WIDTH]) {
        let ly = self.r.ly as usize;
        for (x, bg_pixel) in background.iter().enumerate() {
            let found = self
                .line_sprites
                .iter()
                .filter(|sprite| sprite.covers_column(x as u8))
                .find_map(|sprite| match self.sprite_pixel(sprite, x) {
                    Pixel::Zero => None,
                    pixel => Some((*sprite, pixel)),
                });
            let Some((sprite, pixel)) = found else {
                continue;
            };
            if sprite.attributes.contains(SpriteAttributes::PRIORITY) && *bg_pixel != Pixel::Zero {
                continue;
            }
            let palette = match sprite.attributes.contains(SpriteAttributes::DMG_PALETTE) {
                true => self.r.obj_palette1,
                false => self.r.obj_palette0,
            };
            self.buffer.write_pixel(x, ly, palette.colorize(pixel));
        }
    }

    /// Draws the current scan line to the frame buffer.
    fn draw_line(&mut self) {
        let ly = self.r.ly as usize;
        if ly >= SCREEN_HEIGHT {
            return;
        }

        let mut line = [Pixel::Zero; SCREEN_WIDTH];
        // On DMG a cleared BG_EN blanks both background and window
        let bg_enabled = self.r.lcd_control.contains(LCDControl::BG_EN);
        if bg_enabled {
            self.fetch_background(&mut line);
            if self.r.lcd_control.contains(LCDControl::WIN_EN) && self.fetch_window(&mut line) {
                self.window_line_counter = self.window_line_counter.wrapping_add(1);
            }
        }

        for (x, pixel) in line.iter().enumerate() {
            let color = match bg_enabled {
                true => self.r.bg_palette.colorize(*pixel),
                false => ColoredPixel::White,
            };
            self.buffer.write_pixel(x, ly, color);
        }

        if self.r.lcd_control.contains(LCDControl::OBJ_EN) {
            self.draw_sprites(&line);
        }
    }
}

impl AddressSpace for PPU {
    fn write(&mut self, address: u16, value: u8) {
        match address {
            VRAM_BEGIN..=VRAM_END => self.vram[(address - VRAM_BEGIN) as usize] = value,
            OAM_BEGIN..=OAM_END => self.oam[(address - OAM_BEGIN) as usize] = value,
            PPU_LCDC => self.write_control(value),
            // The mode and the coincidence flag are read-only
            PPU_STAT => {
                let value = (value & 0b0111_1000) | (self.r.lcd_stat.bits() & 0b0000_0111);
                self.r.lcd_stat = LCDState::from_bits_truncate(value);
            }
            PPU_SCY => self.r.scy = value,
            PPU_SCX => self.r.scx = value,
            PPU_LY => log::warn!("ignoring write to read-only LY: {value:#04x}"),
            PPU_LYC => self.r.lyc = value,
            PPU_DMA => self.r.dma = value,
            PPU_BGP => self.r.bg_palette = Palette::from(value),
            PPU_OBP0 => self.r.obj_palette0 = Palette::from(value),
            PPU_OBP1 => self.r.obj_palette1 = Palette::from(value),
            PPU_WY => self.r.wy = value,
            PPU_WX => self.r.wx = value,
            _ => log::trace!("ignoring PPU write to {address:#06x}"),
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match address {
            VRAM_BEGIN..=VRAM_END => self.vram[(address - VRAM_BEGIN) as usize],
            OAM_BEGIN..=OAM_END => self.oam[(address - OAM_BEGIN) as usize],
            PPU_LCDC => self.r.lcd_control.bits(),
            PPU_STAT => self.r.lcd_stat.bits() | 0b1000_0000, // Undocumented bit should be 1
            PPU_SCY => self.r.scy,
            PPU_SCX => self.r.scx,
            PPU_LY => self.r.ly,
            PPU_LYC => self.r.lyc,
            PPU_DMA => self.r.dma,
            PPU_BGP => u8::from(self.r.bg_palette),
            PPU_OBP0 => u8::from(self.r.obj_palette0),
            PPU_OBP1 => u8::from(self.r.obj_palette1),
            PPU_WY => self.r.wy,
            PPU_WX => self.r.wx,
            _ => UNDEFINED_READ,
        }
    }
}
