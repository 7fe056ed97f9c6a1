use crate::gb::cartridge::CartridgeConfig;
use crate::gb::cartridge::controller::BankController;
use crate::gb::constants::*;
use std::sync::Arc;

/// Small games of not more than 32 KiB ROM do not require a MBC chip for ROM banking.
/// The ROM is directly mapped to memory at 0x0000 - 0x7FFF.
/// Optionally up to 8 KiB of RAM could be connected at 0xA000 - 0xBFFF,
/// using a discrete logic decoder in place of a full MBC chip.
#[derive(Clone)]
pub struct NoMBC {
    rom: Arc<[u8]>,
    ram: Vec<u8>,
}

impl NoMBC {
    #[inline]
    pub fn new(config: CartridgeConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            rom,
        }
    }
}

impl BankController for NoMBC {
    fn read(&mut self, address: u16) -> u8 {
        let value = match address {
            ROM_LOW_BANK_BEGIN..=ROM_HIGH_BANK_END => self.rom.get(address as usize),
            CRAM_BANK_BEGIN..=CRAM_BANK_END => self.ram.get((address - CRAM_BANK_BEGIN) as usize),
            _ => None,
        };
        value.copied().unwrap_or(UNDEFINED_READ)
    }

    fn write(&mut self, address: u16, value: u8) {
        if let CRAM_BANK_BEGIN..=CRAM_BANK_END = address {
            if let Some(cell) = self.ram.get_mut((address - CRAM_BANK_BEGIN) as usize) {
                *cell = value;
            }
        }
    }
}
