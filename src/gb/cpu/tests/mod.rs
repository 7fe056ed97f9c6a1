mod cpu;

use crate::gb::cpu::CPU;
use crate::gb::cpu::instruction::DispatchTable;
use crate::gb::cpu::registers::FlagsRegister;
use crate::gb::interrupt::InterruptController;
use crate::gb::{AddressSpace, Bus};

/// Represents a mock for MainBus, a flat 64 KiB memory with an interrupt controller.
struct MockBus {
    data: Vec<u8>,
    pub interrupts: InterruptController,
}

impl MockBus {
    /// Places the given program at address 0x0000, the rest of memory is zeroed (NOP).
    pub fn new(mut program: Vec<u8>) -> Self {
        program.resize(0x10000, 0x00);
        Self {
            data: program,
            interrupts: InterruptController::default(),
        }
    }

    /// Places the given program at `address`.
    pub fn at(address: u16, program: &[u8]) -> Self {
        let mut bus = Self::new(Vec::new());
        let start = address as usize;
        bus.data[start..start + program.len()].copy_from_slice(program);
        bus
    }
}

impl AddressSpace for MockBus {
    fn write(&mut self, address: u16, value: u8) {
        self.data[address as usize] = value;
    }

    fn read(&mut self, address: u16) -> u8 {
        self.data[address as usize]
    }
}

impl Bus for MockBus {
    fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }
}

fn assert_flags(r: FlagsRegister, zero: bool, negative: bool, half_carry: bool, carry: bool) {
    assert_eq!(
        r.contains(FlagsRegister::ZERO),
        zero,
        "Expected zero flag to be {}, but it was {}",
        zero,
        r.contains(FlagsRegister::ZERO)
    );
    assert_eq!(
        r.contains(FlagsRegister::SUBTRACTION),
        negative,
        "Expected negative flag to be {}, but it was {}",
        negative,
        r.contains(FlagsRegister::SUBTRACTION)
    );
    assert_eq!(
        r.contains(FlagsRegister::HALF_CARRY),
        half_carry,
        "Expected half carry flag to be {}, but it was {}",
        half_carry,
        r.contains(FlagsRegister::HALF_CARRY)
    );
    assert_eq!(
        r.contains(FlagsRegister::CARRY),
        carry,
        "Expected carry flag to be {}, but it was {}",
        carry,
        r.contains(FlagsRegister::CARRY)
    );
}

#[test]
fn test_af_register() {
    let table = DispatchTable::new();
    let mut cpu = CPU::new(&table);
    cpu.r.set_af(0b1101_1111_1111_1111);
    assert_eq!(cpu.r.a, 0b1101_1111);
    assert_eq!(cpu.r.f.bits(), 0b1111_0000, "Lower nibble of F is always zero");
    assert_eq!(cpu.r.get_af(), 0b1101_1111_1111_0000);
}

#[test]
fn test_bc_register() {
    let table = DispatchTable::new();
    let mut cpu = CPU::new(&table);
    cpu.r.set_bc(0b0110_1111_1111_1011);
    assert_eq!(cpu.r.b, 0b0110_1111);
    assert_eq!(cpu.r.c, 0b1111_1011);
    assert_eq!(cpu.r.get_bc(), 0b0110_1111_1111_1011);
}

#[test]
fn test_de_register() {
    let table = DispatchTable::new();
    let mut cpu = CPU::new(&table);
    cpu.r.set_de(0b0110_1101_1101_1011);
    assert_eq!(cpu.r.d, 0b0110_1101);
    assert_eq!(cpu.r.e, 0b1101_1011);
    assert_eq!(cpu.r.get_de(), 0b0110_1101_1101_1011);
}

#[test]
fn test_hl_register() {
    let table = DispatchTable::new();
    let mut cpu = CPU::new(&table);
    cpu.r.set_hl(0b0110_1110_1111_1010);
    assert_eq!(cpu.r.h, 0b0110_1110);
    assert_eq!(cpu.r.l, 0b1111_1010);
    assert_eq!(cpu.r.get_hl(), 0b0110_1110_1111_1010);
}

#[test]
fn test_post_boot_registers() {
    let r = crate::gb::cpu::registers::Registers::post_boot();
    assert_eq!(r.get_af(), 0x01B0);
    assert_eq!(r.get_bc(), 0x0013);
    assert_eq!(r.get_de(), 0x00D8);
    assert_eq!(r.get_hl(), 0x014D);
    assert_eq!(r.sp, 0xFFFE);
    assert_eq!(r.pc, 0x0100);
}
