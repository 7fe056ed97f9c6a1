use crate::gb::AddressSpace;
use crate::gb::cpu::CPU;
use crate::gb::cpu::registers::FlagsRegister;
use std::fmt;
use std::fmt::Formatter;

/// Defines an operation on the 8-bit registers of the CPU.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Register {
    /// Reads value from the register.
    #[inline]
    pub fn read(&self, cpu: &CPU<'_>) -> u8 {
        match self {
            Register::A => cpu.r.a,
            Register::B => cpu.r.b,
            Register::C => cpu.r.c,
            Register::D => cpu.r.d,
            Register::E => cpu.r.e,
            Register::H => cpu.r.h,
            Register::L => cpu.r.l,
        }
    }

    /// Writes value to the register.
    #[inline]
    pub fn write(&self, cpu: &mut CPU<'_>, value: u8) {
        match self {
            Register::A => cpu.r.a = value,
            Register::B => cpu.r.b = value,
            Register::C => cpu.r.c = value,
            Register::D => cpu.r.d = value,
            Register::E => cpu.r.e = value,
            Register::H => cpu.r.h = value,
            Register::L => cpu.r.l = value,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::D => "D",
            Register::E => "E",
            Register::H => "H",
            Register::L => "L",
        };
        f.write_str(ident)
    }
}

/// Defines an operation on word registers of the CPU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WordRegister {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl WordRegister {
    /// Read from register.
    #[inline]
    pub fn read(&self, cpu: &CPU<'_>) -> u16 {
        match self {
            WordRegister::AF => cpu.r.get_af(),
            WordRegister::BC => cpu.r.get_bc(),
            WordRegister::DE => cpu.r.get_de(),
            WordRegister::HL => cpu.r.get_hl(),
            WordRegister::SP => cpu.r.sp,
        }
    }

    /// Write value to register
    #[inline]
    pub fn write(&self, cpu: &mut CPU<'_>, value: u16) {
        match self {
            WordRegister::AF => cpu.r.set_af(value),
            WordRegister::BC => cpu.r.set_bc(value),
            WordRegister::DE => cpu.r.set_de(value),
            WordRegister::HL => cpu.r.set_hl(value),
            WordRegister::SP => cpu.r.sp = value,
        }
    }
}

impl fmt::Display for WordRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            WordRegister::AF => "AF",
            WordRegister::BC => "BC",
            WordRegister::DE => "DE",
            WordRegister::HL => "HL",
            WordRegister::SP => "SP",
        };
        f.write_str(ident)
    }
}

/// Defines a location a byte can be read from and written back to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ByteTarget {
    R(Register),
    I(ByteRef),
}

impl ByteTarget {
    /// Maps the 3-bit register index used throughout the opcode space:
    /// B, C, D, E, H, L, (HL), A.
    pub const fn from_index(index: u8) -> Self {
        match index & 0b111 {
            0 => ByteTarget::R(Register::B),
            1 => ByteTarget::R(Register::C),
            2 => ByteTarget::R(Register::D),
            3 => ByteTarget::R(Register::E),
            4 => ByteTarget::R(Register::H),
            5 => ByteTarget::R(Register::L),
            6 => ByteTarget::I(ByteRef::R(WordRegister::HL)),
            _ => ByteTarget::R(Register::A),
        }
    }

    /// Reads the referring value from the CPU or memory
    #[inline]
    pub fn read<T: AddressSpace>(&self, cpu: &mut CPU<'_>, bus: &mut T) -> u8 {
        match self {
            ByteTarget::R(reg) => reg.read(cpu),
            ByteTarget::I(indirect) => {
                let address = indirect.resolve(cpu, bus);
                bus.read(address)
            }
        }
    }

    /// Writes to the referring register or memory location
    #[inline]
    pub fn write<T: AddressSpace>(&self, cpu: &mut CPU<'_>, bus: &mut T, value: u8) {
        match self {
            ByteTarget::R(reg) => reg.write(cpu, value),
            ByteTarget::I(indirect) => {
                let address = indirect.resolve(cpu, bus);
                bus.write(address, value);
            }
        }
    }

    /// Returns true if the target lives in memory.
    #[inline]
    pub const fn is_indirect(&self) -> bool {
        matches!(self, ByteTarget::I(_))
    }

    /// Returns the number of additional clock cycles spent to access the target.
    pub const fn access_cycles(&self) -> u8 {
        match self {
            ByteTarget::R(_) => 0,
            ByteTarget::I(indirect) => indirect.access_cycles(),
        }
    }
}

impl From<ByteTarget> for ByteSource {
    fn from(target: ByteTarget) -> Self {
        match target {
            ByteTarget::R(reg) => ByteSource::R(reg),
            ByteTarget::I(indirect) => ByteSource::I(indirect),
        }
    }
}

impl fmt::Display for ByteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteTarget::R(reg) => write!(f, "{reg}"),
            ByteTarget::I(indirect) => write!(f, "{indirect}"),
        }
    }
}

/// Defines a source which yields an address that can be used to read or write a byte value
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ByteRef {
    R(WordRegister), // value refers to memory at address from one of the paired registers
    D16,             // value refers to memory at address from the next 16 bits
    C,               // value refers to memory at address from C register | 0xFF00
    D8,              // value refers to memory at the address from the next 8 bits | 0xFF00
}

impl ByteRef {
    /// Resolves and returns the referring address,
    /// consuming immediate operands from the instruction stream.
    #[inline]
    pub fn resolve<T: AddressSpace>(&self, cpu: &mut CPU<'_>, bus: &mut T) -> u16 {
        match self {
            ByteRef::R(reg) => reg.read(cpu),
            ByteRef::D16 => cpu.consume_word(bus),
            ByteRef::C => u16::from(cpu.r.c) | 0xFF00,
            ByteRef::D8 => u16::from(cpu.consume_byte(bus)) | 0xFF00,
        }
    }

    /// Returns the number of additional clock cycles spent to access the referred location.
    pub const fn access_cycles(&self) -> u8 {
        match self {
            ByteRef::R(_) | ByteRef::C => 4,
            ByteRef::D8 => 8,
            ByteRef::D16 => 12,
        }
    }
}

impl fmt::Display for ByteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteRef::R(reg) => write!(f, "({reg})"),
            ByteRef::D16 => f.write_str("(a16)"),
            ByteRef::C => f.write_str("(C)"),
            ByteRef::D8 => f.write_str("(a8)"),
        }
    }
}

/// Defines a source we can read from to get a byte value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ByteSource {
    R(Register),
    I(ByteRef),
    D8, // value comes from the next 8 bits
}

impl ByteSource {
    /// Read byte from the CPU or memory.
    pub fn read<T: AddressSpace>(&self, cpu: &mut CPU<'_>, bus: &mut T) -> u8 {
        match self {
            ByteSource::R(reg) => reg.read(cpu),
            ByteSource::D8 => cpu.consume_byte(bus),
            ByteSource::I(indirect) => {
                let address = indirect.resolve(cpu, bus);
                bus.read(address)
            }
        }
    }

    /// Returns the number of additional clock cycles spent to fetch the value.
    pub const fn access_cycles(&self) -> u8 {
        match self {
            ByteSource::R(_) => 0,
            ByteSource::D8 => 4,
            ByteSource::I(indirect) => indirect.access_cycles(),
        }
    }
}

impl fmt::Display for ByteSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::R(reg) => write!(f, "{reg}"),
            ByteSource::D8 => f.write_str("d8"),
            ByteSource::I(indirect) => write!(f, "{indirect}"),
        }
    }
}

/// Defines the source of a word value
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WordSource {
    R(WordRegister),
    D16, // value comes from the next 16 bits
}

impl WordSource {
    /// Resolves the referring value
    #[inline]
    pub fn read<T: AddressSpace>(&self, cpu: &mut CPU<'_>, bus: &mut T) -> u16 {
        match self {
            WordSource::R(reg) => reg.read(cpu),
            WordSource::D16 => cpu.consume_word(bus),
        }
    }
}

impl fmt::Display for WordSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WordSource::R(reg) => write!(f, "{reg}"),
            WordSource::D16 => f.write_str("d16"),
        }
    }
}

/// Defines the possible load operations
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Load {
    Byte(ByteTarget, ByteSource),
    Word(WordRegister, WordSource),
    // Store the contents of register A into the memory location specified by register pair HL,
    // and simultaneously increment the contents of HL.
    HLIFromAInc,
    // Store the contents of register A into the memory location specified by register pair HL,
    // and simultaneously decrement the contents of HL.
    HLIFromADec,
    // Load the contents of memory specified by register pair HL into register A,
    // and simultaneously increment the contents of HL.
    HLIToAInc,
    // Load the contents of memory specified by register pair HL into register A,
    // and simultaneously decrement the contents of HL.
    HLIToADec,
    // Store the lower byte of stack pointer SP at the address specified by the 16-bit immediate
    // operand a16, and store the upper byte of SP at address a16 + 1.
    IndirectFromSP,
    // Add the 8-bit signed operand to the stack pointer SP,
    // and store the result in register pair HL.
    HLFromSPi8,
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Load::Byte(target, source) => write!(f, "{target}, {source}"),
            Load::Word(target, source) => write!(f, "{target}, {source}"),
            Load::HLIFromAInc => f.write_str("(HL+), A"),
            Load::HLIFromADec => f.write_str("(HL-), A"),
            Load::HLIToAInc => f.write_str("A, (HL+)"),
            Load::HLIToADec => f.write_str("A, (HL-)"),
            Load::IndirectFromSP => f.write_str("(a16), SP"),
            Load::HLFromSPi8 => f.write_str("HL, SP+r8"),
        }
    }
}

/// Possible conditions for conditional instructions like JP, JR, CALL and RET
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum JumpCondition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
    Always,
}

impl JumpCondition {
    /// Resolves whether the condition is met
    #[inline]
    pub fn resolve(&self, cpu: &CPU<'_>) -> bool {
        match self {
            JumpCondition::NotZero => !cpu.r.f.contains(FlagsRegister::ZERO),
            JumpCondition::Zero => cpu.r.f.contains(FlagsRegister::ZERO),
            JumpCondition::NotCarry => !cpu.r.f.contains(FlagsRegister::CARRY),
            JumpCondition::Carry => cpu.r.f.contains(FlagsRegister::CARRY),
            JumpCondition::Always => true,
        }
    }
}

impl fmt::Display for JumpCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ident = match self {
            JumpCondition::NotZero => "NZ",
            JumpCondition::Zero => "Z",
            JumpCondition::NotCarry => "NC",
            JumpCondition::Carry => "C",
            JumpCondition::Always => "",
        };
        f.write_str(ident)
    }
}

/// Defines a target address we can jump to
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum JumpTarget {
    D16, // value comes from the next 16 bits
    HL,
}

impl JumpTarget {
    /// Resolves and returns the referring target address
    #[inline]
    pub fn read<T: AddressSpace>(&self, cpu: &mut CPU<'_>, bus: &mut T) -> u16 {
        match self {
            JumpTarget::D16 => cpu.consume_word(bus),
            JumpTarget::HL => cpu.r.get_hl(),
        }
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JumpTarget::D16 => f.write_str("a16"),
            JumpTarget::HL => f.write_str("HL"),
        }
    }
}

#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ResetCode {
    RST00 = 0x00,
    RST08 = 0x08,
    RST10 = 0x10,
    RST18 = 0x18,
    RST20 = 0x20,
    RST28 = 0x28,
    RST30 = 0x30,
    RST38 = 0x38,
}

impl fmt::Display for ResetCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", *self as u16)
    }
}
