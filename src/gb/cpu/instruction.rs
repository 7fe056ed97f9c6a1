use crate::gb::cpu::instruction::Instruction::*;
use crate::gb::cpu::ops::JumpCondition::{Always, Carry, NotCarry, NotZero, Zero};
use crate::gb::cpu::ops::Register::A;
use crate::gb::cpu::ops::WordRegister::{AF, BC, DE, HL, SP};
use crate::gb::cpu::ops::*;
use std::fmt;
use std::fmt::Formatter;

pub const OPCODE_PREFIX_16BIT: u8 = 0xCB;

/// Decoded instruction. Operands that live in the instruction stream (d8, d16, r8, a8, a16)
/// are templates which are fetched from memory while the instruction executes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Instruction {
    ADD(ByteSource),               // Add n to target
    ADDHL(WordRegister),           // Add nn to HL
    ADDSP,                         // Add signed immediate 8 bit value to Stack Pointer
    ADC(ByteSource),               // Add n + Carry flag to A
    AND(ByteSource),               // Logically AND n with A, result in A
    BIT(u8, ByteTarget),           // Test bit b in register r
    INC(ByteTarget),               // Increment single byte register n
    INC2(WordRegister),            // Increment word register n
    CALL(JumpCondition),           // Push address of next instruction onto stack and then jump to address nn
    CCF,                           // Complement carry flag
    CP(ByteSource),                // Compare A with source
    CPL,                           // Flips all bits in A register, sets N and H flags
    DAA,                           // Adjusts A for BCD arithmetic
    DI,                            // Disables interrupt handling
    DEC(ByteTarget),               // Decrement single byte register n
    DEC2(WordRegister),            // Decrement word register n
    EI,                            // Enables interrupt handling after the next instruction
    HALT,                          // Halts and wait for interrupt
    JR(JumpCondition),             // Relative jump by a signed offset
    JP(JumpCondition, JumpTarget), // Jump to address nn
    LD(Load),                      // Put value into n
    NOP,                           // No operation
    OR(ByteSource),                // Logical OR n with register A, result in A.
    PUSH(WordRegister),            // Push to the stack memory, data from the 16-bit register
    POP(WordRegister),             // Pops to the 16-bit register
    RES(u8, ByteTarget),           // Reset bit b in register r
    RET(JumpCondition),            // Pop two bytes from stack & jump to that address
    RETI,                          // Unconditional return which also enables interrupts
    RL(ByteTarget),                // Rotate n left through Carry flag
    RLA,                           // Rotate `A` left through carry
    RLC(ByteTarget),               // Rotate target left
    RLCA,                          // Rotate A left. Old bit 7 to Carry flag
    RR(ByteTarget),                // Rotate n right through Carry flag
    RRA,                           // Rotate A right through Carry flag
    RRC(ByteTarget),               // Rotate n right. Old bit 0 to Carry flag
    RRCA,                          // Rotate A right. Old bit 0 to Carry flag
    RST(ResetCode),                // Push present address onto stack. Jump to address 0x0000 + n
    SBC(ByteSource),               // Subtract n + Carry flag from A
    SCF,                           // Set carry flag
    SET(u8, ByteTarget),           // Set bit b in register r
    SLA(ByteTarget),               // Shift n left into Carry. LSB of n set to 0
    SRA(ByteTarget),               // Shift n right into Carry. MSB doesn't change
    SRL(ByteTarget),               // Shift right into Carry, MSB set to 0
    SUB(ByteSource),               // Subtract n from A
    STOP,                          // Halt CPU & LCD display until button pressed
    SWAP(ByteTarget),              // Swap upper & lower nibbles of n
    XOR(ByteSource),               // Logical exclusive OR n with register A, result in A
}

impl Instruction {
    /// Decodes an opcode following the 0xCB prefix, all 256 of them are defined.
    pub fn prefixed(opcode: u8) -> Instruction {
        let target = ByteTarget::from_index(opcode);
        let bit = (opcode >> 3) & 0b111;
        match opcode >> 6 {
            0b00 => match bit {
                0 => RLC(target),
                1 => RRC(target),
                2 => RL(target),
                3 => RR(target),
                4 => SLA(target),
                5 => SRA(target),
                6 => SWAP(target),
                _ => SRL(target),
            },
            0b01 => BIT(bit, target),
            0b10 => RES(bit, target),
            _ => SET(bit, target),
        }
    }

    /// Decodes an unprefixed opcode. Returns `None` for the eleven illegal opcodes
    /// and for the prefix byte itself.
    pub fn not_prefixed(opcode: u8) -> Option<Instruction> {
        let instruction = match opcode {
            0x00 => NOP,
            0x01 => LD(Load::Word(BC, WordSource::D16)),
            0x02 => LD(Load::Byte(ByteTarget::I(ByteRef::R(BC)), ByteSource::R(A))),
            0x03 => INC2(BC),
            0x07 => RLCA,
            0x08 => LD(Load::IndirectFromSP),
            0x09 => ADDHL(BC),
            0x0a => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::R(BC)))),
            0x0b => DEC2(BC),
            0x0f => RRCA,

            0x10 => STOP,
            0x11 => LD(Load::Word(DE, WordSource::D16)),
            0x12 => LD(Load::Byte(ByteTarget::I(ByteRef::R(DE)), ByteSource::R(A))),
            0x13 => INC2(DE),
            0x17 => RLA,
            0x18 => JR(Always),
            0x19 => ADDHL(DE),
            0x1a => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::R(DE)))),
            0x1b => DEC2(DE),
            0x1f => RRA,

            0x20 => JR(NotZero),
            0x21 => LD(Load::Word(HL, WordSource::D16)),
            0x22 => LD(Load::HLIFromAInc),
            0x23 => INC2(HL),
            0x27 => DAA,
            0x28 => JR(Zero),
            0x29 => ADDHL(HL),
            0x2a => LD(Load::HLIToAInc),
            0x2b => DEC2(HL),
            0x2f => CPL,

            0x30 => JR(NotCarry),
            0x31 => LD(Load::Word(SP, WordSource::D16)),
            0x32 => LD(Load::HLIFromADec),
            0x33 => INC2(SP),
            0x37 => SCF,
            0x38 => JR(Carry),
            0x39 => ADDHL(SP),
            0x3a => LD(Load::HLIToADec),
            0x3b => DEC2(SP),
            0x3f => CCF,

            // INC r, DEC r and LD r, d8 share the register index in bits 3-5
            0x04 | 0x0c | 0x14 | 0x1c | 0x24 | 0x2c | 0x34 | 0x3c => {
                INC(ByteTarget::from_index(opcode >> 3))
            }
            0x05 | 0x0d | 0x15 | 0x1d | 0x25 | 0x2d | 0x35 | 0x3d => {
                DEC(ByteTarget::from_index(opcode >> 3))
            }
            0x06 | 0x0e | 0x16 | 0x1e | 0x26 | 0x2e | 0x36 | 0x3e => {
                LD(Load::Byte(ByteTarget::from_index(opcode >> 3), ByteSource::D8))
            }

            0x76 => HALT,
            0x40..=0x7f => LD(Load::Byte(
                ByteTarget::from_index(opcode >> 3),
                ByteTarget::from_index(opcode).into(),
            )),

            0x80..=0xbf => {
                let source = ByteTarget::from_index(opcode).into();
                match (opcode >> 3) & 0b111 {
                    0 => ADD(source),
                    1 => ADC(source),
                    2 => SUB(source),
                    3 => SBC(source),
                    4 => AND(source),
                    5 => XOR(source),
                    6 => OR(source),
                    _ => CP(source),
                }
            }

            0xc0 => RET(NotZero),
            0xc1 => POP(BC),
            0xc2 => JP(NotZero, JumpTarget::D16),
            0xc3 => JP(Always, JumpTarget::D16),
            0xc4 => CALL(NotZero),
            0xc5 => PUSH(BC),
            0xc6 => ADD(ByteSource::D8),
            0xc7 => RST(ResetCode::RST00),
            0xc8 => RET(Zero),
            0xc9 => RET(Always),
            0xca => JP(Zero, JumpTarget::D16),
            0xcc => CALL(Zero),
            0xcd => CALL(Always),
            0xce => ADC(ByteSource::D8),
            0xcf => RST(ResetCode::RST08),

            0xd0 => RET(NotCarry),
            0xd1 => POP(DE),
            0xd2 => JP(NotCarry, JumpTarget::D16),
            0xd4 => CALL(NotCarry),
            0xd5 => PUSH(DE),
            0xd6 => SUB(ByteSource::D8),
            0xd7 => RST(ResetCode::RST10),
            0xd8 => RET(Carry),
            0xd9 => RETI,
            0xda => JP(Carry, JumpTarget::D16),
            0xdc => CALL(Carry),
            0xde => SBC(ByteSource::D8),
            0xdf => RST(ResetCode::RST18),

            0xe0 => LD(Load::Byte(ByteTarget::I(ByteRef::D8), ByteSource::R(A))),
            0xe1 => POP(HL),
            0xe2 => LD(Load::Byte(ByteTarget::I(ByteRef::C), ByteSource::R(A))),
            0xe5 => PUSH(HL),
            0xe6 => AND(ByteSource::D8),
            0xe7 => RST(ResetCode::RST20),
            0xe8 => ADDSP,
            0xe9 => JP(Always, JumpTarget::HL),
            0xea => LD(Load::Byte(ByteTarget::I(ByteRef::D16), ByteSource::R(A))),
            0xee => XOR(ByteSource::D8),
            0xef => RST(ResetCode::RST28),

            0xf0 => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::D8))),
            0xf1 => POP(AF),
            0xf2 => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::C))),
            0xf3 => DI,
            0xf5 => PUSH(AF),
            0xf6 => OR(ByteSource::D8),
            0xf7 => RST(ResetCode::RST30),
            0xf8 => LD(Load::HLFromSPi8),
            0xf9 => LD(Load::Word(SP, WordSource::R(HL))),
            0xfa => LD(Load::Byte(ByteTarget::R(A), ByteSource::I(ByteRef::D16))),
            0xfb => EI,
            0xfe => CP(ByteSource::D8),
            0xff => RST(ResetCode::RST38),

            // 0xcb is the prefix, the others are not wired in the silicon
            0xcb | 0xd3 | 0xdb | 0xdd | 0xe3 | 0xe4 | 0xeb | 0xec | 0xed | 0xf4 | 0xfc | 0xfd => {
                return None;
            }
        };
        Some(instruction)
    }

    /// Returns the condition which decides whether a branch is taken.
    #[inline]
    pub fn condition(&self) -> Option<JumpCondition> {
        match *self {
            JR(test) | JP(test, _) | CALL(test) | RET(test) => Some(test),
            _ => None,
        }
    }

    /// Returns the clock cycles spent if a branch is not taken and if it is taken,
    /// both values are equal for unconditional instructions.
    /// Prefixed instructions include the cycles needed to fetch the prefix.
    pub fn cycles(&self) -> (u8, u8) {
        let fixed = |cycles: u8| (cycles, cycles);
        let byte_op = |target: &ByteTarget, register: u8, memory: u8| match target.is_indirect() {
            true => memory,
            false => register,
        };

        match self {
            NOP | DAA | CPL | CCF | SCF | DI | EI | HALT | STOP | RLA | RLCA | RRA | RRCA => {
                fixed(4)
            }
            ADD(source) | ADC(source) | SUB(source) | SBC(source) | AND(source) | XOR(source)
            | OR(source) | CP(source) => fixed(4 + source.access_cycles()),
            INC(target) | DEC(target) => fixed(byte_op(target, 4, 12)),
            INC2(_) | DEC2(_) | ADDHL(_) => fixed(8),
            ADDSP => fixed(16),

            JR(Always) => fixed(12),
            JR(_) => (8, 12),
            JP(_, JumpTarget::HL) => fixed(4),
            JP(Always, _) => fixed(16),
            JP(_, _) => (12, 16),
            CALL(Always) => fixed(24),
            CALL(_) => (12, 24),
            RET(Always) => fixed(16),
            RET(_) => (8, 20),
            RETI | RST(_) | PUSH(_) => fixed(16),
            POP(_) => fixed(12),

            LD(load) => fixed(match load {
                Load::Byte(target, source) => 4 + target.access_cycles() + source.access_cycles(),
                Load::Word(_, WordSource::D16) => 12,
                Load::Word(_, WordSource::R(_)) => 8,
                Load::HLIFromAInc | Load::HLIFromADec | Load::HLIToAInc | Load::HLIToADec => 8,
                Load::IndirectFromSP => 20,
                Load::HLFromSPi8 => 12,
            }),

            BIT(_, target) => fixed(byte_op(target, 8, 12)),
            RES(_, target) | SET(_, target) => fixed(byte_op(target, 8, 16)),
            RL(target) | RLC(target) | RR(target) | RRC(target) | SLA(target) | SRA(target)
            | SRL(target) | SWAP(target) => fixed(byte_op(target, 8, 16)),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NOP => write!(f, "NOP"),
            HALT => write!(f, "HALT"),
            STOP => write!(f, "STOP"),
            DAA => write!(f, "DAA"),
            CPL => write!(f, "CPL"),
            CCF => write!(f, "CCF"),
            SCF => write!(f, "SCF"),
            RLA => write!(f, "RLA"),
            RRA => write!(f, "RRA"),
            EI => write!(f, "EI"),
            DI => write!(f, "DI"),
            RST(code) => write!(f, "RST {code}"),
            RET(Always) => write!(f, "RET"),
            RET(test) => write!(f, "RET {test}"),
            RETI => write!(f, "RETI"),
            JP(Always, target) => write!(f, "JP {target}"),
            JP(test, target) => write!(f, "JP {test}, {target}"),
            JR(Always) => write!(f, "JR r8"),
            JR(test) => write!(f, "JR {test}, r8"),
            CALL(Always) => write!(f, "CALL a16"),
            CALL(test) => write!(f, "CALL {test}, a16"),
            ADDHL(source) => write!(f, "ADD HL, {source}"),
            ADDSP => write!(f, "ADD SP, r8"),
            ADD(source) => write!(f, "ADD A, {source}"),
            ADC(source) => write!(f, "ADC A, {source}"),
            SUB(source) => write!(f, "SUB A, {source}"),
            SBC(source) => write!(f, "SBC A, {source}"),
            AND(source) => write!(f, "AND A, {source}"),
            OR(source) => write!(f, "OR A, {source}"),
            XOR(source) => write!(f, "XOR A, {source}"),
            CP(source) => write!(f, "CP A, {source}"),
            INC(target) => write!(f, "INC {target}"),
            INC2(target) => write!(f, "INC {target}"),
            DEC(target) => write!(f, "DEC {target}"),
            DEC2(target) => write!(f, "DEC {target}"),
            LD(load) => write!(f, "LD {load}"),
            BIT(bit, source) => write!(f, "BIT {bit}, {source}"),
            PUSH(target) => write!(f, "PUSH {target}"),
            POP(target) => write!(f, "POP {target}"),
            RES(bit, source) => write!(f, "RES {bit}, {source}"),
            RL(source) => write!(f, "RL {source}"),
            RLC(source) => write!(f, "RLC {source}"),
            RLCA => write!(f, "RLCA"),
            RR(source) => write!(f, "RR {source}"),
            RRC(source) => write!(f, "RRC {source}"),
            RRCA => write!(f, "RRCA"),
            SET(bit, source) => write!(f, "SET {bit}, {source}"),
            SLA(source) => write!(f, "SLA {source}"),
            SRA(source) => write!(f, "SRA {source}"),
            SRL(source) => write!(f, "SRL {source}"),
            SWAP(source) => write!(f, "SWAP {source}"),
        }
    }
}

/// Descriptor of a single opcode: the decoded instruction and its timing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Opcode {
    pub instruction: Instruction,
    pub cycles: u8,       // clock cycles if no branch is taken
    pub cycles_taken: u8, // clock cycles if the branch is taken
}

impl Opcode {
    fn new(instruction: Instruction) -> Self {
        let (cycles, cycles_taken) = instruction.cycles();
        Self {
            instruction,
            cycles,
            cycles_taken,
        }
    }

    /// Returns the clock cycles for the resolved branch outcome.
    #[inline]
    pub const fn cycles(&self, taken: bool) -> u8 {
        match taken {
            true => self.cycles_taken,
            false => self.cycles,
        }
    }
}

/// Immutable decode tables for both opcode pages.
/// Built once at startup and shared by reference with every CPU instance.
pub struct DispatchTable {
    unprefixed: [Option<Opcode>; 256],
    prefixed: [Opcode; 256],
}

impl DispatchTable {
    pub fn new() -> Self {
        Self {
            unprefixed: std::array::from_fn(|opcode| {
                Instruction::not_prefixed(opcode as u8).map(Opcode::new)
            }),
            prefixed: std::array::from_fn(|opcode| Opcode::new(Instruction::prefixed(opcode as u8))),
        }
    }

    /// Looks up an unprefixed opcode, `None` marks an illegal opcode.
    #[inline]
    pub fn lookup(&self, opcode: u8) -> Option<&Opcode> {
        self.unprefixed[opcode as usize].as_ref()
    }

    /// Looks up an opcode following the 0xCB prefix.
    #[inline]
    pub fn lookup_prefixed(&self, opcode: u8) -> &Opcode {
        &self.prefixed[opcode as usize]
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}
