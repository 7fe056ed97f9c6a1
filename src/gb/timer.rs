use crate::gb::AddressSpace;
use crate::gb::constants::*;
use crate::gb::interrupt::InterruptRegister;

bitflags! {
    /// Represents the timer control register (TAC) at 0xFF07
    #[derive(Copy, Clone, Debug, Default, PartialEq)]
    pub struct TimerControl: u8 {
        const SPEED1  = 0b0000_0001;
        const SPEED2  = 0b0000_0010;
        const ENABLED = 0b0000_0100;
    }
}

impl TimerControl {
    #[inline]
    pub const fn is_enabled(&self) -> bool {
        self.contains(TimerControl::ENABLED)
    }

    /// Returns the divider bit whose falling edge increments the counter.
    #[inline]
    pub const fn clock_bit(&self) -> u16 {
        match self.bits() & 0b11 {
            0b00 => 9, // every 1024 cycles, 4096 Hz
            0b01 => 3, // every 16 cycles, 262144 Hz
            0b10 => 5, // every 64 cycles, 65536 Hz
            _ => 7,    // every 256 cycles, 16384 Hz
        }
    }
}

/// System Timer, counts up at configurable frequency.
#[derive(Clone, Default, Debug)]
pub struct Timer {
    pub divider: u16, // internal 16-bit counter, DIV exposes the upper byte
    pub counter: u8,  // TIMA
    pub modulo: u8,   // TMA
    pub control: TimerControl,
}

impl Timer {
    /// Advances the timer by the given clock cycles.
    pub fn step(&mut self, int_reg: &mut InterruptRegister, cycles: u16) {
        for _ in 0..cycles {
            let before = self.timer_signal();
            self.divider = self.divider.wrapping_add(1);
            if before && !self.timer_signal() {
                self.increment_counter(int_reg);
            }
        }
    }

    /// The counter increments on the falling edge of the selected divider bit ANDed with ENABLED.
    #[inline]
    fn timer_signal(&self) -> bool {
        self.control.is_enabled() && (self.divider >> self.control.clock_bit()) & 1 == 1
    }

    fn increment_counter(&mut self, int_reg: &mut InterruptRegister) {
        let (counter, overflow) = self.counter.overflowing_add(1);
        self.counter = match overflow {
            true => {
                int_reg.insert(InterruptRegister::TIMER);
                self.modulo
            }
            false => counter,
        };
    }

    /// Writes to TIMER_DIVIDER or TIMER_CTRL can produce a falling edge as well.
    fn write_with_edge(&mut self, address: u16, value: u8) -> bool {
        let before = self.timer_signal();
        match address {
            TIMER_DIVIDER => self.divider = 0,
            _ => self.control = TimerControl::from_bits_truncate(value),
        }
        before && !self.timer_signal()
    }

    /// Writes a register and raises the timer interrupt in case the write caused an overflow.
    pub fn write_register(&mut self, int_reg: &mut InterruptRegister, address: u16, value: u8) {
        match address {
            TIMER_DIVIDER | TIMER_CTRL => {
                if self.write_with_edge(address, value) {
                    self.increment_counter(int_reg);
                }
            }
            _ => self.write(address, value),
        }
    }
}

impl AddressSpace for Timer {
    fn write(&mut self, address: u16, value: u8) {
        match address {
            TIMER_DIVIDER | TIMER_CTRL => {
                self.write_with_edge(address, value);
            }
            TIMER_COUNTER => self.counter = value,
            TIMER_MODULO => self.modulo = value,
            _ => log::trace!("ignoring timer write to {address:#06x}"),
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        match address {
            TIMER_DIVIDER => (self.divider >> 8) as u8,
            TIMER_COUNTER => self.counter,
            TIMER_MODULO => self.modulo,
            // Undocumented bits should be 1
            TIMER_CTRL => self.control.bits() | 0b1111_1000,
            _ => UNDEFINED_READ,
        }
    }
}

/// Represents the internal Clock which
/// can be used for each processing unit.
#[derive(Clone, Default, Debug)]
pub struct Clock {
    t_cycle: u32,
}

impl Clock {
    #[inline]
    pub fn advance(&mut self, cycles: u32) {
        self.t_cycle = self.t_cycle.wrapping_add(cycles);
    }

    #[inline]
    pub fn ticks(&self) -> u32 {
        self.t_cycle
    }

    /// Removes the given amount of cycles, keeping the remainder.
    #[inline]
    pub fn consume(&mut self, cycles: u32) {
        self.t_cycle = self.t_cycle.saturating_sub(cycles);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.t_cycle = 0;
    }
}
