use crate::gb::cpu::instruction::Instruction::*;
use crate::gb::cpu::instruction::{DispatchTable, Instruction, OPCODE_PREFIX_16BIT, Opcode};
use crate::gb::cpu::ops::*;
use crate::gb::cpu::registers::FlagsRegister;
use crate::gb::{AddressSpace, Bus, GBError, GBResult, utils};
use registers::Registers;

pub mod instruction;
mod interrupt;
pub mod ops;
pub mod registers;
#[cfg(test)]
mod tests;

pub use interrupt::INTERRUPT_DISPATCH_CYCLES;

/// Clock cycles a halted CPU idles per step.
pub const HALTED_STEP_CYCLES: u16 = 4;

/// Implements the CPU for the GB (DMG-01),
/// the CPU is LR35902 which is a subset of i8080 & Z80.
#[derive(Clone)]
pub struct CPU<'t> {
    pub r: Registers, // CPU registers
    pub is_halted: bool,
    locked_up: Option<(u8, u16)>, // offending opcode and its address
    table: &'t DispatchTable,
}

impl<'t> CPU<'t> {
    /// Creates a CPU in its power-on state which executes through the given dispatch table.
    pub fn new(table: &'t DispatchTable) -> Self {
        Self {
            r: Registers::default(),
            is_halted: false,
            locked_up: None,
            table,
        }
    }

    /// Returns the opcode and address of the illegal instruction that locked up the CPU.
    #[inline]
    pub fn locked_up(&self) -> Option<(u8, u16)> {
        self.locked_up
    }

    /// Makes one CPU step, this consumes one or more bytes depending on the
    /// next instruction and current CPU state (halted, interrupted, etc.).
    /// Returns the clock cycles elapsed, the caller advances the remaining hardware.
    pub fn step<T: Bus>(&mut self, bus: &mut T) -> GBResult<u16> {
        if let Some((opcode, address)) = self.locked_up {
            return Err(GBError::IllegalOpcode { opcode, address });
        }

        // CPU should be always woken up from HALT if there is a pending interrupt
        if self.is_halted && bus.interrupts().has_irq() {
            self.is_halted = false;
        }

        // EI takes effect after the following instruction
        let mut cycles = match bus.interrupts_mut().commit_delayed_enable() {
            true => 0,
            false => interrupt::handle(self, bus),
        };

        if self.is_halted {
            return Ok(cycles + HALTED_STEP_CYCLES);
        }

        let address = self.r.pc;
        let opcode = self.decode(address, bus)?;
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{address:#06x}: {:<16} {}", opcode.instruction, self.r);
        }

        let taken = opcode
            .instruction
            .condition()
            .is_none_or(|test| test.resolve(self));
        self.r.pc = self.execute(opcode.instruction, bus);
        cycles += u16::from(opcode.cycles(taken));
        Ok(cycles)
    }

    /// Fetches the opcode at `address` and resolves it through the dispatch table,
    /// advancing PC past the opcode bytes.
    fn decode<T: AddressSpace>(&mut self, address: u16, bus: &mut T) -> GBResult<Opcode> {
        let opcode = self.consume_byte(bus);
        if opcode == OPCODE_PREFIX_16BIT {
            let opcode = self.consume_byte(bus);
            return Ok(*self.table.lookup_prefixed(opcode));
        }

        match self.table.lookup(opcode) {
            Some(entry) => Ok(*entry),
            None => {
                log::error!("illegal opcode {opcode:#04x} at {address:#06x}, CPU locked up");
                self.locked_up = Some((opcode, address));
                Err(GBError::IllegalOpcode { opcode, address })
            }
        }
    }

    /// Reads the byte at PC and advances PC.
    #[inline]
    pub(crate) fn consume_byte<T: AddressSpace>(&mut self, bus: &mut T) -> u8 {
        let value = bus.read(self.r.pc);
        self.r.pc = self.r.pc.wrapping_add(1);
        value
    }

    /// Reads the little-endian word at PC and advances PC.
    #[inline]
    pub(crate) fn consume_word<T: AddressSpace>(&mut self, bus: &mut T) -> u16 {
        let lsb = self.consume_byte(bus);
        let msb = self.consume_byte(bus);
        u16::from_le_bytes([lsb, msb])
    }

    /// Executes the given instruction and returns the updated program counter.
    fn execute<T: Bus>(&mut self, instruction: Instruction, bus: &mut T) -> u16 {
        match instruction {
            ADD(source) => self.handle_add(source, bus),
            ADDHL(source) => self.handle_add_hl(source),
            ADDSP => self.handle_add_sp(bus),
            ADC(source) => self.handle_adc(source, bus),
            AND(source) => self.handle_and(source, bus),
            BIT(bit, source) => self.handle_bit(bit, source, bus),
            CALL(test) => self.handle_call(test, bus),
            CCF => self.handle_ccf(),
            CP(source) => self.handle_cp(source, bus),
            CPL => self.handle_cpl(),
            DAA => self.handle_daa(),
            DI => self.handle_di(bus),
            DEC(target) => self.handle_dec_byte(target, bus),
            DEC2(target) => self.handle_dec_word(target),
            EI => self.handle_ei(bus),
            HALT => self.handle_halt(),
            INC(target) => self.handle_inc_byte(target, bus),
            INC2(target) => self.handle_inc_word(target),
            JR(test) => self.handle_jr(test, bus),
            JP(test, target) => self.handle_jp(test, target, bus),
            LD(load_type) => self.handle_ld(load_type, bus),
            NOP => self.r.pc,
            OR(source) => self.handle_or(source, bus),
            RES(bit, target) => self.handle_res(bit, target, bus),
            RET(test) => self.handle_ret(test, bus),
            RETI => self.handle_reti(bus),
            RL(target) => self.handle_rl(target, bus),
            RLA => self.handle_rla(),
            RLC(target) => self.handle_rlc(target, bus),
            RLCA => self.handle_rlca(),
            RR(target) => self.handle_rr(target, bus),
            RRA => self.handle_rra(),
            RRC(target) => self.handle_rrc(target, bus),
            RRCA => self.handle_rrca(),
            RST(code) => self.handle_rst(code, bus),
            SBC(source) => self.handle_sbc(source, bus),
            SCF => self.handle_scf(),
            SET(bit, target) => self.handle_set(bit, target, bus),
            SLA(target) => self.handle_sla(target, bus),
            SRA(target) => self.handle_sra(target, bus),
            SRL(target) => self.handle_srl(target, bus),
            STOP => self.handle_stop(bus),
            SUB(source) => self.handle_sub(source, bus),
            SWAP(target) => self.handle_swap(target, bus),
            PUSH(target) => self.handle_push(target, bus),
            POP(target) => self.handle_pop(target, bus),
            XOR(source) => self.handle_xor(source, bus),
        }
    }

    /// Push an u16 value onto the stack.
    pub fn push<T: AddressSpace>(&mut self, value: u16, bus: &mut T) {
        let [lsb, msb] = value.to_le_bytes();
        // Write the most significant byte first
        self.r.sp = self.r.sp.wrapping_sub(1);
        bus.write(self.r.sp, msb);
        self.r.sp = self.r.sp.wrapping_sub(1);
        bus.write(self.r.sp, lsb);
    }

    /// Pop an u16 value from the stack.
    pub fn pop<T: AddressSpace>(&mut self, bus: &mut T) -> u16 {
        let lsb = bus.read(self.r.sp);
        self.r.sp = self.r.sp.wrapping_add(1);
        let msb = bus.read(self.r.sp);
        self.r.sp = self.r.sp.wrapping_add(1);
        u16::from_le_bytes([lsb, msb])
    }

    /// Handles ADD A, n instructions
    fn handle_add<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        let (result, carry) = self.r.a.overflowing_add(value);
        self.r.f.update(
            result == 0,
            false,
            utils::half_carry_u8(self.r.a, value),
            carry,
        );
        self.r.a = result;
        self.r.pc
    }

    /// Handles ADD HL, nn instructions
    fn handle_add_hl(&mut self, source: WordRegister) -> u16 {
        let value = source.read(self);
        let hl = self.r.get_hl();
        let (result, carry) = hl.overflowing_add(value);

        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r
            .f
            .set(FlagsRegister::HALF_CARRY, utils::half_carry_u16(hl, value));
        self.r.f.set(FlagsRegister::CARRY, carry);
        self.r.set_hl(result);
        self.r.pc
    }

    /// Adds a signed immediate to SP and returns the result,
    /// flags are derived from the unsigned addition on the low byte.
    fn offset_sp<T: AddressSpace>(&mut self, bus: &mut T) -> u16 {
        let sp = self.r.sp as i32;
        let offset = self.consume_byte(bus) as i8 as i32;
        let result = sp.wrapping_add(offset);

        let carry_bits = sp ^ offset ^ result;
        self.r
            .f
            .update(false, false, carry_bits & 0x010 != 0, carry_bits & 0x100 != 0);
        result as u16
    }

    /// Handles ADD SP, r8 instruction
    fn handle_add_sp<T: Bus>(&mut self, bus: &mut T) -> u16 {
        self.r.sp = self.offset_sp(bus);
        self.r.pc
    }

    /// Handles ADC instructions
    fn handle_adc<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        let carry_in = u8::from(self.r.f.contains(FlagsRegister::CARRY));
        let half_carry = (self.r.a & 0x0F) + (value & 0x0F) + carry_in > 0x0F;

        let (result, overflow) = self.r.a.overflowing_add(value);
        let (result, overflow_carry) = result.overflowing_add(carry_in);
        self.r
            .f
            .update(result == 0, false, half_carry, overflow || overflow_carry);
        self.r.a = result;
        self.r.pc
    }

    /// Handles AND instructions
    #[inline]
    fn handle_and<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        self.r.a &= value;
        self.r.f.update(self.r.a == 0, false, true, false);
        self.r.pc
    }

    /// Handles BIT instructions
    fn handle_bit<T: Bus>(&mut self, bit: u8, source: ByteTarget, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        self.r.f.set(FlagsRegister::ZERO, !utils::bit_at(value, bit));
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.f.insert(FlagsRegister::HALF_CARRY);
        self.r.pc
    }

    /// Handle CALL instructions
    fn handle_call<T: Bus>(&mut self, test: JumpCondition, bus: &mut T) -> u16 {
        let address = self.consume_word(bus);
        if test.resolve(self) {
            self.push(self.r.pc, bus);
            address
        } else {
            self.r.pc
        }
    }

    /// Handle CCF instruction
    #[inline]
    fn handle_ccf(&mut self) -> u16 {
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.f.remove(FlagsRegister::HALF_CARRY);
        self.r.f.toggle(FlagsRegister::CARRY);
        self.r.pc
    }

    /// Subtracts `value` and the optional carry from A, updates all flags
    /// and returns the result without storing it.
    fn subtract(&mut self, value: u8, carry_in: bool) -> u8 {
        let a = u16::from(self.r.a);
        let value = u16::from(value);
        let result = a.wrapping_sub(value).wrapping_sub(u16::from(carry_in));

        let carry_bits = a ^ value ^ result;
        self.r.f.update(
            result as u8 == 0,
            true,
            carry_bits & 0x010 != 0,
            carry_bits & 0x100 != 0,
        );
        result as u8
    }

    /// Handles CP instructions
    fn handle_cp<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        self.subtract(value, false);
        self.r.pc
    }

    /// Handles CPL instruction
    #[inline]
    fn handle_cpl(&mut self) -> u16 {
        self.r.a = !self.r.a;
        self.r.f.insert(FlagsRegister::SUBTRACTION);
        self.r.f.insert(FlagsRegister::HALF_CARRY);
        self.r.pc
    }

    /// Handles DAA instruction
    fn handle_daa(&mut self) -> u16 {
        if self.r.f.contains(FlagsRegister::SUBTRACTION) {
            if self.r.f.contains(FlagsRegister::CARRY) {
                self.r.a = self.r.a.wrapping_sub(0x60);
            }
            if self.r.f.contains(FlagsRegister::HALF_CARRY) {
                self.r.a = self.r.a.wrapping_sub(0x06);
            }
        } else {
            if self.r.f.contains(FlagsRegister::CARRY) || self.r.a > 0x99 {
                self.r.a = self.r.a.wrapping_add(0x60);
                self.r.f.insert(FlagsRegister::CARRY);
            }
            if self.r.f.contains(FlagsRegister::HALF_CARRY) || (self.r.a & 0x0F) > 0x09 {
                self.r.a = self.r.a.wrapping_add(0x06);
            }
        }
        self.r.f.set(FlagsRegister::ZERO, self.r.a == 0);
        self.r.f.remove(FlagsRegister::HALF_CARRY);
        self.r.pc
    }

    /// Handles DEC instructions for bytes
    fn handle_dec_byte<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let result = value.wrapping_sub(1);
        target.write(self, bus, result);
        self.r
            .f
            .set(FlagsRegister::HALF_CARRY, utils::half_borrow_u8(value, 1));
        self.r.f.set(FlagsRegister::ZERO, result == 0);
        self.r.f.insert(FlagsRegister::SUBTRACTION);
        self.r.pc
    }

    /// Handles DEC instructions for words
    fn handle_dec_word(&mut self, target: WordRegister) -> u16 {
        let value = target.read(self);
        target.write(self, value.wrapping_sub(1));
        self.r.pc
    }

    /// Handles DI instruction
    #[inline]
    fn handle_di<T: Bus>(&mut self, bus: &mut T) -> u16 {
        bus.interrupts_mut().set_master_enable(false);
        self.r.pc
    }

    /// Handles EI instruction
    #[inline]
    fn handle_ei<T: Bus>(&mut self, bus: &mut T) -> u16 {
        bus.interrupts_mut().request_delayed_enable();
        self.r.pc
    }

    /// Handles HALT instruction
    #[inline]
    fn handle_halt(&mut self) -> u16 {
        self.is_halted = true;
        self.r.pc
    }

    /// Handles INC instructions for bytes
    fn handle_inc_byte<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let result = value.wrapping_add(1);
        target.write(self, bus, result);
        self.r
            .f
            .set(FlagsRegister::HALF_CARRY, utils::half_carry_u8(value, 1));
        self.r.f.set(FlagsRegister::ZERO, result == 0);
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.pc
    }

    /// Handles INC instructions for words
    fn handle_inc_word(&mut self, target: WordRegister) -> u16 {
        let value = target.read(self);
        target.write(self, value.wrapping_add(1));
        self.r.pc
    }

    /// Handles JR instructions,
    /// the offset is relative to the address following the instruction.
    fn handle_jr<T: Bus>(&mut self, test: JumpCondition, bus: &mut T) -> u16 {
        let offset = self.consume_byte(bus) as i8;
        match test.resolve(self) {
            true => self.r.pc.wrapping_add_signed(i16::from(offset)),
            false => self.r.pc,
        }
    }

    /// Handles JP instructions
    fn handle_jp<T: Bus>(&mut self, test: JumpCondition, target: JumpTarget, bus: &mut T) -> u16 {
        let address = target.read(self, bus);
        match test.resolve(self) {
            true => address,
            false => self.r.pc,
        }
    }

    /// Handles LD instructions
    fn handle_ld<T: Bus>(&mut self, load_type: Load, bus: &mut T) -> u16 {
        match load_type {
            Load::Byte(target, source) => {
                let value = source.read(self, bus);
                target.write(self, bus, value);
            }
            Load::Word(target, source) => {
                let value = source.read(self, bus);
                target.write(self, value);
            }
            Load::HLIFromAInc => {
                let address = self.r.get_hl();
                bus.write(address, self.r.a);
                self.r.set_hl(address.wrapping_add(1));
            }
            Load::HLIFromADec => {
                let address = self.r.get_hl();
                bus.write(address, self.r.a);
                self.r.set_hl(address.wrapping_sub(1));
            }
            Load::HLIToAInc => {
                let address = self.r.get_hl();
                self.r.a = bus.read(address);
                self.r.set_hl(address.wrapping_add(1));
            }
            Load::HLIToADec => {
                let address = self.r.get_hl();
                self.r.a = bus.read(address);
                self.r.set_hl(address.wrapping_sub(1));
            }
            Load::IndirectFromSP => {
                let address = self.consume_word(bus);
                let [lsb, msb] = self.r.sp.to_le_bytes();
                bus.write(address, lsb);
                bus.write(address.wrapping_add(1), msb);
            }
            Load::HLFromSPi8 => {
                let result = self.offset_sp(bus);
                self.r.set_hl(result);
            }
        }
        self.r.pc
    }

    /// Handles OR instructions
    #[inline]
    fn handle_or<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        self.r.a |= value;
        self.r.f.update(self.r.a == 0, false, false, false);
        self.r.pc
    }

    /// Handles POP instruction
    #[inline]
    fn handle_pop<T: Bus>(&mut self, target: WordRegister, bus: &mut T) -> u16 {
        let word = self.pop(bus);
        target.write(self, word);
        self.r.pc
    }

    /// Handles PUSH instruction
    #[inline]
    fn handle_push<T: Bus>(&mut self, target: WordRegister, bus: &mut T) -> u16 {
        let word = target.read(self);
        self.push(word, bus);
        self.r.pc
    }

    /// Handles RES instructions
    #[inline]
    fn handle_res<T: Bus>(&mut self, bit: u8, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, false));
        self.r.pc
    }

    /// Handles RET instruction
    fn handle_ret<T: Bus>(&mut self, test: JumpCondition, bus: &mut T) -> u16 {
        match test.resolve(self) {
            true => self.pop(bus),
            false => self.r.pc,
        }
    }

    /// Handles RETI instruction, IME is restored immediately.
    #[inline]
    fn handle_reti<T: Bus>(&mut self, bus: &mut T) -> u16 {
        bus.interrupts_mut().set_master_enable(true);
        self.pop(bus)
    }

    /// Handles RL instructions
    /// Rotate n left through Carry flag.
    #[inline]
    fn handle_rl<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let carry = value & 0b1000_0000 != 0;
        let result = (value << 1) | u8::from(self.r.f.contains(FlagsRegister::CARRY));
        self.r.f.update(result == 0, false, false, carry);
        target.write(self, bus, result);
        self.r.pc
    }

    /// Handles RLA instruction
    /// Rotates the A register one bit to the left. Previous carry flag becomes the
    /// least-significant bit, and previous Most Significant Bit becomes Carry.
    #[inline]
    fn handle_rla(&mut self) -> u16 {
        let carry = self.r.a & 0b1000_0000 != 0;
        self.r.a = (self.r.a << 1) | u8::from(self.r.f.contains(FlagsRegister::CARRY));
        self.r.f.update(false, false, false, carry);
        self.r.pc
    }

    /// Handles RLC instructions
    /// Rotates register to the left and updates CPU flags
    fn handle_rlc<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let result = value.rotate_left(1);
        self.r
            .f
            .update(result == 0, false, false, value & 0b1000_0000 != 0);
        target.write(self, bus, result);
        self.r.pc
    }

    /// Handles RLCA instruction
    #[inline]
    fn handle_rlca(&mut self) -> u16 {
        let carry = self.r.a & 0b1000_0000 != 0;
        self.r.a = self.r.a.rotate_left(1);
        self.r.f.update(false, false, false, carry);
        self.r.pc
    }

    /// Handles RR instructions
    fn handle_rr<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let carry = value & 0x01 != 0;
        let result = (value >> 1) | (u8::from(self.r.f.contains(FlagsRegister::CARRY)) << 7);
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, carry);
        self.r.pc
    }

    /// Handles RRA instruction
    #[inline]
    fn handle_rra(&mut self) -> u16 {
        let carry = self.r.a & 0x01 != 0;
        self.r.a = (self.r.a >> 1) | (u8::from(self.r.f.contains(FlagsRegister::CARRY)) << 7);
        self.r.f.update(false, false, false, carry);
        self.r.pc
    }

    /// Handles RRC instructions
    fn handle_rrc<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let result = value.rotate_right(1);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        target.write(self, bus, result);
        self.r.pc
    }

    /// Handles RRCA instruction
    #[inline]
    fn handle_rrca(&mut self) -> u16 {
        let carry = self.r.a & 0x01 != 0;
        self.r.a = self.r.a.rotate_right(1);
        self.r.f.update(false, false, false, carry);
        self.r.pc
    }

    /// Handles RST instructions
    #[inline]
    fn handle_rst<T: Bus>(&mut self, code: ResetCode, bus: &mut T) -> u16 {
        self.push(self.r.pc, bus);
        code as u16
    }

    /// Handles SBC instructions
    fn handle_sbc<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        let carry_in = self.r.f.contains(FlagsRegister::CARRY);
        self.r.a = self.subtract(value, carry_in);
        self.r.pc
    }

    /// Handles SCF instruction
    #[inline]
    fn handle_scf(&mut self) -> u16 {
        self.r.f.remove(FlagsRegister::SUBTRACTION);
        self.r.f.remove(FlagsRegister::HALF_CARRY);
        self.r.f.insert(FlagsRegister::CARRY);
        self.r.pc
    }

    /// Handles SET instructions
    fn handle_set<T: Bus>(&mut self, bit: u8, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        target.write(self, bus, utils::set_bit(value, bit, true));
        self.r.pc
    }

    /// Handles SLA instructions
    fn handle_sla<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let result = value << 1;
        self.r
            .f
            .update(result == 0, false, false, value & 0b1000_0000 != 0);
        target.write(self, bus, result);
        self.r.pc
    }

    /// Handles SRA instructions
    fn handle_sra<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let result = (value >> 1) | (value & 0b1000_0000);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        target.write(self, bus, result);
        self.r.pc
    }

    /// Handles SRL instructions
    fn handle_srl<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        let result = value >> 1;
        target.write(self, bus, result);
        self.r.f.update(result == 0, false, false, value & 0x01 != 0);
        self.r.pc
    }

    /// Handles STOP instruction, the padding byte is skipped.
    /// Low power mode is not emulated, execution simply continues.
    fn handle_stop<T: Bus>(&mut self, bus: &mut T) -> u16 {
        self.consume_byte(bus);
        log::debug!("STOP at {:#06x} treated as NOP", self.r.pc.wrapping_sub(2));
        self.r.pc
    }

    /// Handles SUB instructions
    fn handle_sub<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        self.r.a = self.subtract(value, false);
        self.r.pc
    }

    /// Handles SWAP instructions
    #[inline]
    fn handle_swap<T: Bus>(&mut self, target: ByteTarget, bus: &mut T) -> u16 {
        let value = target.read(self, bus);
        self.r.f.update(value == 0, false, false, false);
        target.write(self, bus, value.rotate_right(4));
        self.r.pc
    }

    /// Handles XOR instructions
    #[inline]
    fn handle_xor<T: Bus>(&mut self, source: ByteSource, bus: &mut T) -> u16 {
        let value = source.read(self, bus);
        self.r.a ^= value;
        self.r.f.update(self.r.a == 0, false, false, false);
        self.r.pc
    }
}
