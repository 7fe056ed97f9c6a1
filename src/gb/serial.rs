use crate::gb::AddressSpace;
use crate::gb::constants::*;
use crate::gb::interrupt::InterruptRegister;
use std::io::Write;

bitflags! {
    /// Represents the Serial transfer control register at 0xFF02
    #[derive(Copy, Clone, Debug, Default, PartialEq)]
    pub struct SerialTransferControl: u8 {
        // 0 = External clock, 1 = Internal clock.
        const CLOCK_SELECT    = 0b0000_0001;
        // If set to 1, enable high speed serial clock (~256 kHz in single-speed mode)
        const CLOCK_SPEED     = 0b0000_0010;
        // If 1, a transfer is either requested or in progress.
        const TRANSFER_ENABLE = 0b1000_0000;
    }
}

/// Serial port without a link partner.
/// A requested transfer completes immediately and shifts in 0xFF.
#[derive(Clone, Default, Debug)]
pub struct SerialTransfer {
    /// The transfer control register.
    pub control: SerialTransferControl,
    /// The transfer data register.
    pub data: u8,
    /// Every byte sent so far.
    output: Vec<u8>,
    print_serial: bool,
}

impl SerialTransfer {
    pub fn new(print_serial: bool) -> Self {
        Self {
            print_serial,
            ..Self::default()
        }
    }

    /// Returns all bytes that have been sent over the serial port.
    #[inline]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Writes a register and completes a transfer if one has been requested.
    pub fn write_register(&mut self, int_reg: &mut InterruptRegister, address: u16, value: u8) {
        self.write(address, value);
        if self.control.contains(SerialTransferControl::TRANSFER_ENABLE) {
            self.transfer(int_reg);
        }
    }

    fn transfer(&mut self, int_reg: &mut InterruptRegister) {
        let byte = self.data;
        self.output.push(byte);
        if self.print_serial {
            let mut stdout = std::io::stdout();
            if let Err(err) = stdout.write_all(&[byte]).and_then(|_| stdout.flush()) {
                log::warn!("unable to print serial data: {err}");
            }
        }
        log::trace!("serial transfer: {byte:#04x}");

        self.data = UNDEFINED_READ;
        self.control.remove(SerialTransferControl::TRANSFER_ENABLE);
        int_reg.insert(InterruptRegister::SERIAL);
    }
}

impl AddressSpace for SerialTransfer {
    fn write(&mut self, address: u16, value: u8) {
        match address {
            SERIAL_TRANSFER_DATA => self.data = value,
            SERIAL_TRANSFER_CTRL => self.control = SerialTransferControl::from_bits_truncate(value),
            _ => log::trace!("ignoring serial write to {address:#06x}"),
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match address {
            SERIAL_TRANSFER_DATA => self.data,
            // Undocumented bits should be 1
            SERIAL_TRANSFER_CTRL => self.control.bits() | 0b0111_1110,
            _ => UNDEFINED_READ,
        }
    }
}
