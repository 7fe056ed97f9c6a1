/// An optional boot image overlays the very bottom 256 bytes of memory
/// until it gets unmapped through `BOOT_ROM_OFF`.
pub const BOOT_BEGIN: u16 = 0x0000;
pub const BOOT_END: u16 = 0x00FF;
pub const BOOT_SIZE: usize = (BOOT_END - BOOT_BEGIN + 1) as usize;

/// This area of memory always contains the first bank from the cartridge.
pub const ROM_LOW_BANK_BEGIN: u16 = 0x0000;
pub const ROM_LOW_BANK_END: u16 = 0x3FFF;

/// This area of memory contains a switchable bank from the cartridge (01..nn).
/// Writing to this area of memory changes the currently selected bank.
pub const ROM_HIGH_BANK_BEGIN: u16 = 0x4000;
pub const ROM_HIGH_BANK_END: u16 = 0x7FFF;

/// Tile data and the two tile maps used by the PPU.
pub const VRAM_BEGIN: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;
pub const VRAM_SIZE: usize = (VRAM_END - VRAM_BEGIN + 1) as usize;

/// Switchable bank of external cartridge RAM, only present if the cartridge declares it.
pub const CRAM_BANK_BEGIN: u16 = 0xA000;
pub const CRAM_BANK_END: u16 = 0xBFFF;

/// Internal work RAM.
pub const WRAM_BEGIN: u16 = 0xC000;
pub const WRAM_END: u16 = 0xDFFF;
pub const WRAM_SIZE: usize = (WRAM_END - WRAM_BEGIN + 1) as usize;

/// This section of memory directly mirrors the working RAM section - meaning
/// if you write into the first address of working RAM (0xC000),
/// the same value will appear in the first spot of echo RAM (0xE000).
pub const ERAM_BEGIN: u16 = 0xE000;
pub const ERAM_END: u16 = 0xFDFF;

/// Sprite attribute table, 40 entries of 4 bytes each.
pub const OAM_BEGIN: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;
pub const OAM_SIZE: usize = (OAM_END - OAM_BEGIN + 1) as usize;

/// This area is unmapped: reading from it just returns `UNDEFINED_READ`
pub const UNUSED_BEGIN: u16 = 0xFEA0;
pub const UNUSED_END: u16 = 0xFEFF;

/// Memory mapped I/O registers of all peripherals.
pub const IO_BEGIN: u16 = 0xFF00;
pub const IO_END: u16 = 0xFF7F;

/// High RAM, reachable with the short LDH instructions.
pub const HRAM_BEGIN: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;
pub const HRAM_SIZE: usize = (HRAM_END - HRAM_BEGIN + 1) as usize;

/// Joypad Input Register
pub const JOYPAD: u16 = 0xFF00;

pub const SERIAL_TRANSFER_DATA: u16 = 0xFF01;
pub const SERIAL_TRANSFER_CTRL: u16 = 0xFF02;

// Timer Registers
/// Upper byte of the internal 16-bit divider, resets to 0 whenever written to (DIV).
pub const TIMER_DIVIDER: u16 = 0xFF04;

/// Counts up at a specified rate. Triggers INT (0x50) when overflows (TIMA).
pub const TIMER_COUNTER: u16 = 0xFF05;

/// When counter overflows, it's reset to start at modulo (TMA).
pub const TIMER_MODULO: u16 = 0xFF06;

/// Timer Controller (TAC) which uses 3 bits,
/// bit 2 specifies whether the timer is enabled (1) or disabled (0).
pub const TIMER_CTRL: u16 = 0xFF07;

// Interrupt Controller Registers
pub const INTERRUPT_FLAG: u16 = 0xFF0F;
pub const INTERRUPT_ENABLE: u16 = 0xFFFF;

/// Audio Registers area, including the wave pattern RAM
pub const AUDIO_REGISTERS_START: u16 = 0xFF10;
pub const AUDIO_REGISTERS_END: u16 = 0xFF3F;
pub const AUDIO_REGISTERS_SIZE: usize = (AUDIO_REGISTERS_END - AUDIO_REGISTERS_START + 1) as usize;

// Pixel Processing Unit
pub const PPU_LCDC: u16 = 0xFF40;
pub const PPU_STAT: u16 = 0xFF41;
pub const PPU_SCY: u16 = 0xFF42;
pub const PPU_SCX: u16 = 0xFF43;
pub const PPU_LY: u16 = 0xFF44;
pub const PPU_LYC: u16 = 0xFF45;
pub const PPU_DMA: u16 = 0xFF46;
pub const PPU_BGP: u16 = 0xFF47;
pub const PPU_OBP0: u16 = 0xFF48;
pub const PPU_OBP1: u16 = 0xFF49;
pub const PPU_WY: u16 = 0xFF4A;
pub const PPU_WX: u16 = 0xFF4B;

/// Boot ROM lock register
/// 0b0 = the boot image is active and intercepts access to 0x0000-0x00FF
/// any other value = the boot image is unmapped and 0x0000-0x00FF works normally
/// Can only transition once, the boot image stays unmapped until the next power cycle.
pub const BOOT_ROM_OFF: u16 = 0xFF50;

/// This defines the default value when reading from an undefined memory address,
/// or when reading from a memory region that is currently not readable.
pub const UNDEFINED_READ: u8 = 0xFF;
