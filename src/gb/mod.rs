use crate::gb::bus::MainBus;
use crate::gb::cartridge::CartridgeError;
use crate::gb::constants::*;
use crate::gb::cpu::CPU;
use crate::gb::cpu::instruction::DispatchTable;
use crate::gb::cpu::registers::Registers;
use crate::gb::interrupt::InterruptController;
use crate::gb::ppu::buffer::FrameBuffer;
use std::path::PathBuf;
use thiserror::Error;

pub mod audio;
pub mod bus;
pub mod cartridge;
pub mod constants;
pub mod cpu;
pub mod interrupt;
pub mod joypad;
pub mod ppu;
pub mod serial;
#[cfg(test)]
pub mod tests;
pub mod timer;
mod utils;

/// Refresh rate of the DMG LCD in frames per second.
pub const DISPLAY_REFRESH_RATE: f64 = 59.73;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// Clock cycles per frame, 154 scanlines of 456 cycles each.
pub const CYCLES_PER_FRAME: u32 = 70224;

pub type GBResult<T> = Result<T, GBError>;

#[derive(Error, Debug)]
pub enum GBError {
    #[error("illegal opcode {opcode:#04x} at {address:#06x}, CPU locked up")]
    IllegalOpcode { opcode: u8, address: u16 },
    #[error("unable to load cartridge: {0}")]
    Cartridge(#[from] CartridgeError),
    #[error("boot image must not exceed 256 bytes, got {len} bytes")]
    BootImage { len: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// This trait defines a common interface for everything that is mapped into the address space.
pub trait AddressSpace {
    /// Writes a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Reads a byte from the given address.
    fn read(&mut self, address: u16) -> u8;
}

/// This trait defines the interface the CPU uses to interact with the Hardware Bus.
pub trait Bus: AddressSpace {
    fn interrupts(&self) -> &InterruptController;
    fn interrupts_mut(&mut self) -> &mut InterruptController;
}

/// Holds the configuration for the emulator.
#[derive(Clone, Debug, Default)]
pub struct EmulatorConfig {
    pub rom: PathBuf,              // Path to the ROM file
    pub boot_rom: Option<PathBuf>, // Boot image, skipped (fastboot) if absent
    pub debug: bool,               // Trace every executed instruction
    pub print_serial: bool,        // Print serial data to stdout
    pub frame_limit: bool,         // Limit emulation speed to the display refresh rate
    pub frames: Option<u64>,       // Stop after the given number of frames
}

/// Holds and manages the state of the whole emulator backend.
/// The cartridge and the PPU are owned by the caller for the whole session,
/// the bus only borrows them.
pub struct GameBoy<'a> {
    pub cpu: CPU<'a>,
    pub bus: MainBus<'a>,
}

impl<'a> GameBoy<'a> {
    /// Creates a new `GameBoy`, if the bus carries no boot image
    /// the machine starts in the post-boot state.
    pub fn new(table: &'a DispatchTable, bus: MainBus<'a>) -> Self {
        let mut gb = Self {
            cpu: CPU::new(table),
            bus,
        };
        if !gb.bus.is_boot_rom_active() {
            log::info!("no boot image mapped, skipping boot sequence");
            gb.fastboot();
        }
        gb
    }

    /// Steps the `CPU` once and advances the remaining hardware by the elapsed cycles.
    #[inline]
    pub fn step(&mut self) -> GBResult<u16> {
        let cycles = self.cpu.step(&mut self.bus)?;
        self.bus.step(cycles);
        Ok(cycles)
    }

    /// Runs until the PPU completes a frame and returns it.
    /// Returns after one frame worth of cycles if the LCD is disabled.
    pub fn run_frame(&mut self) -> GBResult<&FrameBuffer> {
        let mut elapsed = 0;
        while elapsed < CYCLES_PER_FRAME {
            elapsed += u32::from(self.step()?);
            if self.bus.ppu_mut().take_frame_ready() {
                break;
            }
        }
        Ok(self.bus.ppu().frame())
    }

    /// Fastboot the emulator by setting the CPU registers and I/O registers as if it had booted normally.
    pub fn fastboot(&mut self) {
        self.cpu.r = Registers::post_boot();
        for (address, value) in [
            (TIMER_CTRL, 0xF8),
            (INTERRUPT_FLAG, 0xE1),
            (PPU_LCDC, 0x91),
            (PPU_STAT, 0x85),
            (PPU_BGP, 0xFC),
            (BOOT_ROM_OFF, 0x01),
        ] {
            self.bus.write(address, value);
        }
    }
}
