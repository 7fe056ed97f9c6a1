use crate::gb::cartridge::controller::BankController;
use crate::gb::{AddressSpace, GBError};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

mod controller;
mod mbc1;
mod nombc;

/// This area of memory contains the cartridge title
const CARTRIDGE_TITLE_BEGIN: u16 = 0x0134;
const CARTRIDGE_TITLE_END: u16 = 0x0142;

/// Typically 0x80 for games which support both CGB and monochrome Game Boys,
/// and 0xC0 for games which work on CGBs only.
const CARTRIDGE_CGB_FLAG: u16 = 0x0143;

/// This address contains the cartridge type and what kind of hardware is present
/// 0x00  => ROM Only
/// 0x01  => MBC1
/// 0x02  => MBC1 + RAM
/// 0x03  => MBC1 + RAM + Battery
/// ...
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html#0147--cartridge-type
const CARTRIDGE_TYPE: u16 = 0x0147;

/// This byte indicates how much ROM is present on the cartridge.
/// In most cases, the ROM size is given by 32KiB * (1 << value).
const CARTRIDGE_ROM_SIZE: u16 = 0x0148;

/// This byte indicates how much RAM is present on the cartridge.
const CARTRIDGE_RAM_SIZE: u16 = 0x0149;

/// These bytes contain a 16-bit (big-endian) checksum simply computed as the sum of all
/// the bytes of the cartridge ROM (except these two checksum bytes).
const CARTRIDGE_GLOBAL_CHECKSUM1: u16 = 0x014E;
const CARTRIDGE_GLOBAL_CHECKSUM2: u16 = 0x014F;

/// The header ends right before the first instruction at 0x0150.
const CARTRIDGE_HEADER_END: usize = 0x0150;

const ROM_BANK_SIZE: usize = 16384;
const RAM_BANK_SIZE: usize = 8192;

#[derive(Error, Debug, PartialEq)]
pub enum CartridgeError {
    #[error("image is {len} bytes, too small to contain a cartridge header")]
    TooSmall { len: usize },
    #[error("cartridge type {0:#04x} is not supported")]
    UnsupportedController(u8),
    #[error("unsupported ROM size: {0:#04x}")]
    UnsupportedRomSize(u8),
    #[error("unsupported RAM size: {0:#04x}")]
    UnsupportedRamSize(u8),
}

#[derive(PartialEq, Copy, Clone, Debug)]
/// The controller type of the cartridge.
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html#0147--cartridge-type
pub enum ControllerType {
    NoMBC,
    NoMBCWithRAM,
    MBC1,
    MBC1WithRAM,
}

impl TryFrom<u8> for ControllerType {
    type Error = CartridgeError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let mode = match value {
            0x00 => ControllerType::NoMBC,
            0x01 => ControllerType::MBC1,
            0x02 | 0x03 => ControllerType::MBC1WithRAM,
            0x08 | 0x09 => ControllerType::NoMBCWithRAM,
            _ => return Err(CartridgeError::UnsupportedController(value)),
        };
        Ok(mode)
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerType::NoMBC => "ROM Only",
            ControllerType::NoMBCWithRAM => "ROM + RAM",
            ControllerType::MBC1 => "MBC1",
            ControllerType::MBC1WithRAM => "MBC1 + RAM",
        };
        write!(f, "{name}")
    }
}

/// Color support declared by the cartridge.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum ColorSupport {
    Monochrome,
    CgbEnhanced,
    CgbOnly,
}

impl From<u8> for ColorSupport {
    fn from(value: u8) -> Self {
        match value {
            0xC0 => ColorSupport::CgbOnly,
            0x80 => ColorSupport::CgbEnhanced,
            _ => ColorSupport::Monochrome,
        }
    }
}

/// Contains the configuration of the cartridge. This includes the controller type,
/// ROM size, RAM size, and the number of banks.
#[derive(Copy, Clone, Debug)]
pub struct CartridgeConfig {
    pub controller: ControllerType,
    pub rom_size: usize,
    pub rom_banks: u16,
    pub ram_size: usize,
    pub ram_banks: u16,
}

impl CartridgeConfig {
    pub fn new(controller: ControllerType, rom_size: u8, ram_size: u8) -> Result<Self, CartridgeError> {
        let ram_banks = match ram_size {
            0x00 | 0x01 => 0,
            0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            value => return Err(CartridgeError::UnsupportedRamSize(value)),
        };

        // This can be expressed as 2^(value + 1) up until 8 MiB
        let rom_banks = match rom_size {
            0x00..=0x08 => 2 << rom_size,
            value => return Err(CartridgeError::UnsupportedRomSize(value)),
        };

        Ok(Self {
            rom_size: ROM_BANK_SIZE * rom_banks as usize,
            ram_size: RAM_BANK_SIZE * ram_banks as usize,
            rom_banks,
            controller,
            ram_banks,
        })
    }
}

/// Returns the bit mask to wrap a bank number into the available banks,
/// bank counts are always powers of two.
#[inline]
pub const fn bank_mask(banks: u16) -> usize {
    match banks {
        0 => 0,
        n => n as usize - 1,
    }
}

/// Contains the cartridge header information.
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html
#[derive(Clone, Debug)]
pub struct CartridgeHeader {
    pub title: String,
    pub color: ColorSupport,
    pub config: CartridgeConfig,
}

impl TryFrom<&[u8]> for CartridgeHeader {
    type Error = CartridgeError;
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        if buf.len() < CARTRIDGE_HEADER_END {
            return Err(CartridgeError::TooSmall { len: buf.len() });
        }
        let controller = ControllerType::try_from(buf[CARTRIDGE_TYPE as usize])?;
        let config = CartridgeConfig::new(
            controller,
            buf[CARTRIDGE_ROM_SIZE as usize],
            buf[CARTRIDGE_RAM_SIZE as usize],
        )?;
        Ok(Self {
            title: CartridgeHeader::parse_title(buf),
            color: ColorSupport::from(buf[CARTRIDGE_CGB_FLAG as usize]),
            config,
        })
    }
}

impl CartridgeHeader {
    /// Returns the cartridge title from the cartridge header.
    fn parse_title(buf: &[u8]) -> String {
        let title = buf[CARTRIDGE_TITLE_BEGIN as usize..=CARTRIDGE_TITLE_END as usize]
            .iter()
            .take_while(|b| **b != 0)
            .filter(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|b| char::from(*b))
            .collect::<String>();
        match title.trim().is_empty() {
            true => "Unnamed".to_string(),
            false => title.trim().to_string(),
        }
    }
}

impl fmt::Display for CartridgeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} KiB ROM, {} KiB RAM)",
            self.title,
            self.config.controller,
            self.config.rom_size / 1024,
            self.config.ram_size / 1024
        )
    }
}

/// Holds all relevant cartridge information data.
/// The ROM image itself is shared, the controller keeps the banking state and RAM.
#[derive(Clone)]
pub struct Cartridge {
    pub header: CartridgeHeader,
    controller: Box<dyn BankController>,
}

impl TryFrom<Arc<[u8]>> for Cartridge {
    type Error = CartridgeError;

    fn try_from(rom: Arc<[u8]>) -> Result<Self, Self::Error> {
        let header = CartridgeHeader::try_from(rom.as_ref())?;
        if let Err(msg) = verify_checksum(rom.as_ref()) {
            log::warn!("{msg}");
        }
        if rom.len() != header.config.rom_size {
            log::warn!(
                "image is {} bytes but the header declares {} bytes",
                rom.len(),
                header.config.rom_size
            );
        }
        let controller = controller::new(header.config, rom);
        Ok(Self { controller, header })
    }
}

impl TryFrom<&Path> for Cartridge {
    type Error = GBError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let rom: Arc<[u8]> = std::fs::read(path)?.into();
        Ok(Cartridge::try_from(rom)?)
    }
}

impl fmt::Display for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)
    }
}

impl AddressSpace for Cartridge {
    #[inline]
    fn write(&mut self, address: u16, value: u8) {
        self.controller.write(address, value);
    }

    #[inline]
    fn read(&mut self, address: u16) -> u8 {
        self.controller.read(address)
    }
}

/// Validates the global checksum of the given buffer containing the whole cartridge.
fn verify_checksum(buf: &[u8]) -> Result<(), String> {
    if buf.len() <= CARTRIDGE_GLOBAL_CHECKSUM2 as usize {
        return Err("Cartridge is too small to calculate the checksum".into());
    }

    let byte1 = buf[CARTRIDGE_GLOBAL_CHECKSUM1 as usize];
    let byte2 = buf[CARTRIDGE_GLOBAL_CHECKSUM2 as usize];

    let checksum = u16::from_be_bytes([byte1, byte2]);
    let calculated_checksum = calculate_global_checksum(buf);

    if checksum == calculated_checksum {
        return Ok(());
    }

    Err(format!(
        "Global checksum mismatch! Expected: {checksum:#06x} Got: {calculated_checksum:#06x}"
    ))
}

/// Calculates the global checksum by adding all bytes from the given cartridge buffer except
/// the two checksum bytes.
fn calculate_global_checksum(buf: &[u8]) -> u16 {
    buf.iter()
        .enumerate()
        .fold(0, |sum, (address, &byte)| match address {
            0x014E | 0x014F => sum,
            _ => sum.wrapping_add(byte as u16),
        })
}
