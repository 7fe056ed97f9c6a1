use crate::gb::audio::AudioRegisters;
use crate::gb::cartridge::Cartridge;
use crate::gb::constants::*;
use crate::gb::interrupt::{InterruptController, InterruptRegister};
use crate::gb::joypad::{Joypad, JoypadButton, JoypadInput};
use crate::gb::ppu::PPU;
use crate::gb::serial::SerialTransfer;
use crate::gb::timer::Timer;
use crate::gb::{AddressSpace, Bus, GBError, GBResult};

/// Number of bytes copied by an OAM DMA transfer.
const OAM_DMA_LENGTH: u16 = 0xA0;

/// Defines a global Bus, all processing units should access memory through it.
/// The bus owns work RAM, high RAM and the smaller peripherals,
/// the cartridge and the PPU are borrowed from the owner of the session.
pub struct MainBus<'a> {
    cartridge: &'a mut Cartridge,
    ppu: &'a mut PPU,
    boot_rom: Option<Box<[u8]>>, // present until unmapped through BOOT_ROM_OFF
    apu: AudioRegisters,
    serial: SerialTransfer,
    timer: Timer,
    joypad: Joypad,
    interrupts: InterruptController,
    wram: [u8; WRAM_SIZE],
    hram: [u8; HRAM_SIZE],
}

impl<'a> MainBus<'a> {
    pub fn new(cartridge: &'a mut Cartridge, ppu: &'a mut PPU, print_serial: bool) -> Self {
        Self {
            cartridge,
            ppu,
            boot_rom: None,
            apu: AudioRegisters::default(),
            serial: SerialTransfer::new(print_serial),
            timer: Timer::default(),
            joypad: Joypad::default(),
            interrupts: InterruptController::default(),
            wram: [0u8; WRAM_SIZE],
            hram: [0u8; HRAM_SIZE],
        }
    }

    /// Maps the given boot image to 0x0000 until it gets unmapped by the boot code.
    pub fn with_boot_rom(mut self, image: &[u8]) -> GBResult<Self> {
        if image.len() > BOOT_SIZE {
            return Err(GBError::BootImage { len: image.len() });
        }
        log::info!("Mapped boot image ({} bytes)", image.len());
        self.boot_rom = Some(image.into());
        Ok(self)
    }

    #[inline]
    pub fn is_boot_rom_active(&self) -> bool {
        self.boot_rom.is_some()
    }

    /// Advances all peripherals by the given clock cycles.
    pub fn step(&mut self, cycles: u16) {
        self.timer.step(&mut self.interrupts.flag, cycles);
        self.ppu.step(&mut self.interrupts.flag, cycles);
    }

    #[inline]
    pub fn ppu(&self) -> &PPU {
        &*self.ppu
    }

    #[inline]
    pub fn ppu_mut(&mut self) -> &mut PPU {
        &mut *self.ppu
    }

    #[inline]
    pub fn cartridge(&self) -> &Cartridge {
        &*self.cartridge
    }

    /// Returns all bytes that have been sent over the serial port.
    #[inline]
    pub fn serial_output(&self) -> &[u8] {
        self.serial.output()
    }

    /// Returns a copy of all audio registers for an external synthesizer.
    #[inline]
    pub fn audio_snapshot(&self) -> [u8; AUDIO_REGISTERS_SIZE] {
        self.apu.snapshot()
    }

    /// Replaces the state of all buttons.
    #[inline]
    pub fn handle_input(&mut self, input: JoypadInput) {
        self.joypad.handle_input(input, &mut self.interrupts.flag);
    }

    #[inline]
    pub fn press(&mut self, button: JoypadButton) {
        self.set_button(button, true);
    }

    #[inline]
    pub fn release(&mut self, button: JoypadButton) {
        self.set_button(button, false);
    }

    fn set_button(&mut self, button: JoypadButton, pressed: bool) {
        let mut input = self.joypad.input();
        input.set(button, pressed);
        self.handle_input(input);
    }

    /// Reads value from boot ROM or cartridge
    /// depending on `BOOT_ROM_OFF` register
    fn read_cartridge(&mut self, address: u16) -> u8 {
        let boot_value = match (&self.boot_rom, address) {
            (Some(image), BOOT_BEGIN..=BOOT_END) => image.get(address as usize).copied(),
            _ => None,
        };
        match boot_value {
            Some(value) => value,
            None => self.cartridge.read(address),
        }
    }

    /// Copies 160 bytes from `source * 0x100` into OAM.
    /// The transfer completes immediately.
    fn oam_transfer(&mut self, source: u8) {
        let source_address = u16::from(source) << 8;
        log::trace!("OAM DMA transfer from {source_address:#06x}");
        for offset in 0..OAM_DMA_LENGTH {
            let value = self.read(source_address.wrapping_add(offset));
            self.ppu.write(OAM_BEGIN + offset, value);
        }
    }

    /// Handles all writes to the I/O registers (0xFF00-0xFF7F)
    fn write_io(&mut self, address: u16, value: u8) {
        match address {
            JOYPAD => self.joypad.write(value, &mut self.interrupts.flag),
            SERIAL_TRANSFER_DATA | SERIAL_TRANSFER_CTRL => {
                self.serial.write_register(&mut self.interrupts.flag, address, value)
            }
            // Whenever a ROM writes to DIV it will reset to 0
            TIMER_DIVIDER..=TIMER_CTRL => {
                self.timer.write_register(&mut self.interrupts.flag, address, value)
            }
            INTERRUPT_FLAG => self.interrupts.flag = InterruptRegister::from_bits_truncate(value),
            AUDIO_REGISTERS_START..=AUDIO_REGISTERS_END => self.apu.write(address, value),
            PPU_DMA => {
                self.ppu.write(address, value);
                self.oam_transfer(value);
            }
            PPU_LCDC..=PPU_WX => self.ppu.write(address, value),
            BOOT_ROM_OFF => {
                if value != 0 && self.boot_rom.take().is_some() {
                    log::debug!("Boot image unmapped");
                }
            }
            _ => log::trace!("ignoring write to unmapped I/O register {address:#06x}"),
        }
    }

    /// Handles all reads from the I/O registers (0xFF00-0xFF7F)
    fn read_io(&mut self, address: u16) -> u8 {
        match address {
            JOYPAD => self.joypad.read(),
            SERIAL_TRANSFER_DATA | SERIAL_TRANSFER_CTRL => self.serial.read(address),
            TIMER_DIVIDER..=TIMER_CTRL => self.timer.read(address),
            // Undocumented bits should be 1
            INTERRUPT_FLAG => self.interrupts.flag.bits() | 0b1110_0000,
            AUDIO_REGISTERS_START..=AUDIO_REGISTERS_END => self.apu.read(address),
            PPU_LCDC..=PPU_WX => self.ppu.read(address),
            // When read, this register is always 0xFF
            BOOT_ROM_OFF => UNDEFINED_READ,
            _ => {
                log::trace!("read from unmapped I/O register {address:#06x}");
                UNDEFINED_READ
            }
        }
    }
}

impl AddressSpace for MainBus<'_> {
    fn write(&mut self, address: u16, value: u8) {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_HIGH_BANK_END => self.cartridge.write(address, value),
            VRAM_BEGIN..=VRAM_END => self.ppu.write(address, value),
            CRAM_BANK_BEGIN..=CRAM_BANK_END => self.cartridge.write(address, value),
            WRAM_BEGIN..=WRAM_END => self.wram[(address & 0x1FFF) as usize] = value,
            // Writes to Echo RAM, effectively mirroring to Working RAM
            ERAM_BEGIN..=ERAM_END => self.wram[(address & 0x1FFF) as usize] = value,
            OAM_BEGIN..=OAM_END => self.ppu.write(address, value),
            UNUSED_BEGIN..=UNUSED_END => log::trace!("ignoring write to unused {address:#06x}"),
            IO_BEGIN..=IO_END => self.write_io(address, value),
            HRAM_BEGIN..=HRAM_END => self.hram[(address - HRAM_BEGIN) as usize] = value,
            INTERRUPT_ENABLE => self.interrupts.enable = InterruptRegister::from_bits_retain(value),
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_HIGH_BANK_END => self.read_cartridge(address),
            VRAM_BEGIN..=VRAM_END => self.ppu.read(address),
            CRAM_BANK_BEGIN..=CRAM_BANK_END => self.cartridge.read(address),
            WRAM_BEGIN..=WRAM_END => self.wram[(address & 0x1FFF) as usize],
            // Reads from Echo RAM, effectively mirroring to Working RAM
            ERAM_BEGIN..=ERAM_END => self.wram[(address & 0x1FFF) as usize],
            OAM_BEGIN..=OAM_END => self.ppu.read(address),
            UNUSED_BEGIN..=UNUSED_END => UNDEFINED_READ,
            IO_BEGIN..=IO_END => self.read_io(address),
            HRAM_BEGIN..=HRAM_END => self.hram[(address - HRAM_BEGIN) as usize],
            INTERRUPT_ENABLE => self.interrupts.enable.bits(),
        }
    }
}

impl Bus for MainBus<'_> {
    #[inline(always)]
    fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    #[inline(always)]
    fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }
}
