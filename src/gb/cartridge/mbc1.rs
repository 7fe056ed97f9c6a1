use crate::gb::cartridge::controller::BankController;
use crate::gb::cartridge::{CartridgeConfig, RAM_BANK_SIZE, ROM_BANK_SIZE, bank_mask};
use crate::gb::constants::*;
use std::sync::Arc;

/// Before external RAM can be read or written,
/// it must be enabled by writing 0x0A to anywhere in this address space.
/// Any value with 0x0A in the lower 4 bits enables the RAM attached to the MBC,
/// and any other value disables the RAM.
const RAM_ENABLE_BEGIN: u16 = 0x0000;
const RAM_ENABLE_END: u16 = 0x1FFF;

/// This 5-bit register (range $01-$1F) selects the ROM bank number for the 4000–7FFF region.
/// Higher bits are discarded, writing $E1 (binary 11100001) to this register would select bank $01.
/// If this register is set to $00, it behaves as if it is set to $01.
const ROM_BANK_NUMBER_BEGIN: u16 = 0x2000;
const ROM_BANK_NUMBER_END: u16 = 0x3FFF;

/// This 2-bit register range can be used to select a RAM Bank in range from $00–$03 (32 KiB ram
/// carts only), or to specify the upper two bits (bits 5-6) of the ROM Bank number (1 MiB ROM or
/// larger carts only). If neither ROM nor RAM is large enough, setting this register does nothing.
const RAM_BANK_NUMBER_BEGIN: u16 = 0x4000;
const RAM_BANK_NUMBER_END: u16 = 0x5FFF;

/// This 1-bit register selects between the two MBC1 banking modes,
/// controlling the behaviour of the secondary 2-bit banking register (above).
/// If the cart is not large enough to use the 2-bit register (≤ 8 KiB RAM and ≤ 512 KiB ROM)
/// this mode select has no observable effect. The program may freely switch between the two
/// modes at any time.
const BANKING_MODE_SELECT_BEGIN: u16 = 0x6000;
const BANKING_MODE_SELECT_END: u16 = 0x7FFF;

/// This 1-bit register selects between the two MBC1 banking modes,
/// controlling the behaviour of the secondary 2-bit banking register (0x4000 - 0x5FFF).
/// If the cart is not large enough to use the 2-bit register (≤ 8 KiB RAM and ≤ 512 KiB ROM)
/// this mode select has no observable effect. The program may freely switch between the two modes
/// at any time.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BankingMode {
    Simple,
    Advanced,
}

/// In its default configuration, MBC1 supports up to 512 KiB ROM with up to 32 KiB of banked RAM.
/// Some cartridges wire the MBC differently, where the 2-bit RAM banking register is wired as an
/// extension of the ROM banking register (instead of to RAM) in order to support up to 2 MiB ROM,
/// at the cost of only supporting a fixed 8 KiB of cartridge RAM. All MBC1 cartridges with 1 MiB
/// of ROM or more use this alternate wiring. Also see the note on MBC1M multi-game compilation
/// carts below. Bank numbers beyond the declared ROM size wrap around.
#[derive(Clone)]
pub struct MBC1 {
    config: CartridgeConfig,
    rom: Arc<[u8]>,
    ram: Vec<u8>,
    low_rom_bank_offset: usize, // current selected ROM bank offset for 0x0000 - 0x3FFF
    high_rom_bank_offset: usize, // current selected ROM bank offset for 0x4000 - 0x7FFF
    ram_bank_offset: usize,     // current selected RAM bank offset for 0xA000 - 0xBFFF
    has_ram_access: bool,
    bank_low_bits: u8,  // lower 5 bits of the ROM bank number
    bank_high_bits: u8, // RAM bank number or upper 2 bits of the ROM bank number
    banking_mode: BankingMode,
}

impl MBC1 {
    pub fn new(config: CartridgeConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            low_rom_bank_offset: 0,
            high_rom_bank_offset: ROM_HIGH_BANK_BEGIN as usize,
            ram_bank_offset: 0,
            has_ram_access: false,
            banking_mode: BankingMode::Simple,
            bank_low_bits: 0b0000_0001,
            bank_high_bits: 0b0000_0000,
            rom,
            config,
        }
    }

    /// Updates the ROM banks offsets on the current banking mode.
    /// The upper 2 bits only reach the fixed bank in advanced mode,
    /// the resulting bank numbers are wrapped into the available banks.
    fn update_rom_offsets(&mut self) {
        let mask = bank_mask(self.config.rom_banks);
        let upper_bits = (self.bank_high_bits as usize) << 5;

        let low_bank_nr = match self.banking_mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => upper_bits,
        };
        self.low_rom_bank_offset = ROM_BANK_SIZE * (low_bank_nr & mask);

        let high_bank_nr = upper_bits | self.bank_low_bits as usize;
        if high_bank_nr > mask {
            log::trace!("MBC1: ROM bank {high_bank_nr} wrapped to {}", high_bank_nr & mask);
        }
        self.high_rom_bank_offset = ROM_BANK_SIZE * (high_bank_nr & mask);
    }

    /// Updates the RAM bank offset based on the current banking mode.
    /// Only cartridges with 4 banks support RAM banking.
    fn update_ram_offset(&mut self) {
        // RAM banking is only available with cartridges with 4 banks
        if self.config.ram_banks == 4 && self.banking_mode == BankingMode::Advanced {
            let bank = self.bank_high_bits as usize & bank_mask(self.config.ram_banks);
            self.ram_bank_offset = RAM_BANK_SIZE * bank;
        } else {
            self.ram_bank_offset = 0;
        }
    }
}

impl BankController for MBC1 {
    fn read(&mut self, address: u16) -> u8 {
        let value = match address {
            ROM_LOW_BANK_BEGIN..=ROM_LOW_BANK_END => self
                .rom
                .get(self.low_rom_bank_offset + (address - ROM_LOW_BANK_BEGIN) as usize),
            ROM_HIGH_BANK_BEGIN..=ROM_HIGH_BANK_END => self
                .rom
                .get(self.high_rom_bank_offset + (address - ROM_HIGH_BANK_BEGIN) as usize),
            CRAM_BANK_BEGIN..=CRAM_BANK_END if self.has_ram_access => self
                .ram
                .get(self.ram_bank_offset + (address - CRAM_BANK_BEGIN) as usize),
            _ => None,
        };
        value.copied().unwrap_or(UNDEFINED_READ)
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            // Any value with 0x0A in the lower 4 bits enables ram, any other value disables it.
            RAM_ENABLE_BEGIN..=RAM_ENABLE_END => {
                self.has_ram_access = value & 0b1111 == 0b1010;
                log::trace!("MBC1: RAM access enabled: {}", self.has_ram_access);
            }
            // Sets the lower 5 bits of the ROM bank number.
            ROM_BANK_NUMBER_BEGIN..=ROM_BANK_NUMBER_END => {
                self.bank_low_bits = match value & 0b0001_1111 {
                    0 => 1,
                    n => n,
                };
                log::debug!("MBC1: ROM bank low bits set to {:#04x}", self.bank_low_bits);
                self.update_rom_offsets();
            }
            // Sets the upper 2 bits of the ROM bank number or the RAM bank number,
            // depending on the current banking mode.
            RAM_BANK_NUMBER_BEGIN..=RAM_BANK_NUMBER_END => {
                self.bank_high_bits = value & 0b11;
                log::debug!("MBC1: secondary bank register set to {}", self.bank_high_bits);
                self.update_rom_offsets();
                self.update_ram_offset();
            }
            // Selects the banking mode.
            BANKING_MODE_SELECT_BEGIN..=BANKING_MODE_SELECT_END => {
                self.banking_mode = match value & 0b1 {
                    0b0 => BankingMode::Simple,
                    _ => BankingMode::Advanced,
                };
                log::debug!("MBC1: switched to {:?} banking mode", self.banking_mode);
                self.update_rom_offsets();
                self.update_ram_offset();
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END if self.has_ram_access => {
                let offset = self.ram_bank_offset + (address - CRAM_BANK_BEGIN) as usize;
                if let Some(cell) = self.ram.get_mut(offset) {
                    *cell = value;
                }
            }
            _ => {}
        }
    }
}
