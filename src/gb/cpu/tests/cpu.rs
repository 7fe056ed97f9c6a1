use crate::gb::cpu::CPU;
use crate::gb::cpu::instruction::DispatchTable;
use crate::gb::cpu::registers::FlagsRegister;
use crate::gb::cpu::tests::{MockBus, assert_flags};
use crate::gb::interrupt::{ImeState, InterruptRegister};
use crate::gb::{AddressSpace, GBError};

#[test]
fn test_illegal_opcodes() {
    let table = DispatchTable::new();
    for opcode in [0xd3, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd] {
        let mut bus = MockBus::new(vec![opcode]);
        let mut cpu = CPU::new(&table);
        let result = cpu.step(&mut bus);
        assert!(
            matches!(result, Err(GBError::IllegalOpcode { opcode: o, address: 0 }) if o == opcode),
            "{opcode:#04x} should be rejected"
        );
        assert_eq!(cpu.locked_up(), Some((opcode, 0x0000)));
    }
}

#[test]
fn test_illegal_opcode_locks_up() {
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x00, 0xdd, 0x04]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);

    for _ in 0..3 {
        let result = cpu.step(&mut bus);
        assert!(matches!(
            result,
            Err(GBError::IllegalOpcode {
                opcode: 0xdd,
                address: 0x0001
            })
        ));
    }
    assert_eq!(cpu.r.pc, 2, "Locked up CPU should not fetch anymore");
    assert_eq!(cpu.r.b, 0x00);
}

#[test]
fn test_nop() {
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x00]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.pc, 1);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_add_a_d8_half_carry() {
    // ADD A, d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc6, 0x01]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x0f;
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.pc, 2);
    assert_eq!(cpu.r.a, 0x10);
    assert_flags(cpu.r.f, false, false, true, false);
}

#[test]
fn test_add_a_d8_overflow_zero() {
    // ADD A, d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc6, 0x01]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0xff;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, true, false, true, true);
}

#[test]
fn test_add_a_hli() {
    // ADD A, (HL)
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x86, 0x42]);
    let mut cpu = CPU::new(&table);
    cpu.r.set_hl(0x01);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.pc, 1);
    assert_eq!(cpu.r.a, 0x42);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_add_hl_de_half_carry() {
    // ADD HL, DE
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x19]);
    let mut cpu = CPU::new(&table);
    cpu.r.f.insert(FlagsRegister::ZERO | FlagsRegister::SUBTRACTION);
    cpu.r.set_hl(0x0fff);
    cpu.r.set_de(0x0001);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.get_hl(), 0x1000);
    assert_flags(cpu.r.f, true, false, true, false);
}

#[test]
fn test_add_hl_de_overflow() {
    // ADD HL, DE
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x19]);
    let mut cpu = CPU::new(&table);
    cpu.r.set_hl(0xffff);
    cpu.r.set_de(0x0001);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.get_hl(), 0x0000);
    assert_flags(cpu.r.f, false, false, true, true);
}

#[test]
fn test_add_sp_s8_pos() {
    // ADD SP, r8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xe8, 0x01]);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0x00ff;
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.sp, 0x0100);
    assert_flags(cpu.r.f, false, false, true, true);
}

#[test]
fn test_add_sp_s8_neg() {
    // ADD SP, r8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xe8, 0xfe]);
    let mut cpu = CPU::new(&table);
    cpu.r.f.insert(FlagsRegister::ZERO);
    cpu.r.sp = 0x0001;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.sp, 0xffff);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_ld_hl_sp_s8() {
    // LD HL, SP+r8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xf8, 0x02]);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfff8;
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(cpu.r.get_hl(), 0xfffa);
    assert_eq!(cpu.r.sp, 0xfff8, "SP should be untouched");
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_adc_a_d8_carry_in() {
    // ADC A, d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xce, 0x00]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x0f;
    cpu.r.f.insert(FlagsRegister::CARRY);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.a, 0x10);
    assert_flags(cpu.r.f, false, false, true, false);
}

#[test]
fn test_adc_a_e_overflow() {
    // ADC A, E
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x8b]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0xff;
    cpu.r.e = 0x00;
    cpu.r.f.insert(FlagsRegister::CARRY);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, true, false, true, true);
}

#[test]
fn test_sub_d8_half_borrow() {
    // SUB d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xd6, 0x01]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x10;
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.a, 0x0f);
    assert_flags(cpu.r.f, false, true, true, false);
}

#[test]
fn test_sub_b_zero() {
    // SUB B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x90]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x42;
    cpu.r.b = 0x42;
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, true, true, false, false);
}

#[test]
fn test_sbc_a_d8_carry() {
    // SBC A, d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xde, 0x00]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x00;
    cpu.r.f.insert(FlagsRegister::CARRY);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0xff);
    assert_flags(cpu.r.f, false, true, true, true);
}

#[test]
fn test_sbc_a_d8_no_carry() {
    // SBC A, d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xde, 0x02]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x05;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x03);
    assert_flags(cpu.r.f, false, true, false, false);
}

#[test]
fn test_cp_d8_borrow() {
    // CP d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xfe, 0x02]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x01;
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.a, 0x01, "CP should not modify A");
    assert_flags(cpu.r.f, false, true, true, true);
}

#[test]
fn test_cp_b_equal() {
    // CP B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xb8]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x3c;
    cpu.r.b = 0x3c;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x3c);
    assert_flags(cpu.r.f, true, true, false, false);
}

#[test]
fn test_and_d8() {
    // AND d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xe6, 0b1010]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0b1100;
    cpu.r.f.insert(FlagsRegister::CARRY);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0b1000);
    assert_flags(cpu.r.f, false, false, true, false);
}

#[test]
fn test_xor_a_a() {
    // XOR A
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xaf]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x55;
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, true, false, false, false);
}

#[test]
fn test_or_a_c() {
    // OR C
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xb1, 0xb1]);
    let mut cpu = CPU::new(&table);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, true, false, false, false);

    cpu.r.c = 0x81;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x81);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_inc_b_half_carry() {
    // INC B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x04]);
    let mut cpu = CPU::new(&table);
    cpu.r.b = 0x0f;
    cpu.r.f.insert(FlagsRegister::CARRY);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.b, 0x10);
    assert_flags(cpu.r.f, false, false, true, true);
}

#[test]
fn test_inc_b_overflow() {
    // INC B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x04]);
    let mut cpu = CPU::new(&table);
    cpu.r.b = 0xff;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.b, 0x00);
    assert_flags(cpu.r.f, true, false, true, false);
}

#[test]
fn test_inc_hli() {
    // INC (HL)
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x34]);
    bus.write(0xc000, 0xff);
    let mut cpu = CPU::new(&table);
    cpu.r.set_hl(0xc000);
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(bus.read(0xc000), 0x00);
    assert_flags(cpu.r.f, true, false, true, false);
}

#[test]
fn test_dec_b_zero() {
    // DEC B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x05]);
    let mut cpu = CPU::new(&table);
    cpu.r.b = 0x01;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.b, 0x00);
    assert_flags(cpu.r.f, true, true, false, false);
}

#[test]
fn test_dec_b_half_borrow() {
    // DEC B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x05]);
    let mut cpu = CPU::new(&table);
    cpu.r.b = 0x10;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.b, 0x0f);
    assert_flags(cpu.r.f, false, true, true, false);
}

#[test]
fn test_inc_dec_word() {
    // INC BC, DEC DE
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x03, 0x1b]);
    let mut cpu = CPU::new(&table);
    cpu.r.set_bc(0xffff);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.get_bc(), 0x0000);
    assert_flags(cpu.r.f, false, false, false, false);

    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.get_de(), 0xffff);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_jr_s8_pos_offset() {
    // JR r8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x18, 0x05]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(cpu.r.pc, 0x0007);
}

#[test]
fn test_jr_s8_neg_offset() {
    // JR r8
    let table = DispatchTable::new();
    let mut bus = MockBus::at(0x0100, &[0x18, 0xfe]);
    let mut cpu = CPU::new(&table);
    cpu.r.pc = 0x0100;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.pc, 0x0100, "JR -2 should loop on itself");

    let mut bus = MockBus::at(0x0100, &[0x18, 0x80]);
    cpu.r.pc = 0x0100;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.pc, 0x0082);
}

#[test]
fn test_jr_nz_s8() {
    // JR NZ, r8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x20, 0x05]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(cpu.r.pc, 0x0007);

    cpu.r.pc = 0x0000;
    cpu.r.f.insert(FlagsRegister::ZERO);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.pc, 0x0002);
}

#[test]
fn test_jp_a16() {
    // JP a16
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc3, 0x34, 0x12]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.pc, 0x1234);
}

#[test]
fn test_jp_nc_a16() {
    // JP NC, a16
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xd2, 0x34, 0x12]);
    let mut cpu = CPU::new(&table);
    cpu.r.f.insert(FlagsRegister::CARRY);
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(cpu.r.pc, 0x0003);

    cpu.r.pc = 0x0000;
    cpu.r.f.remove(FlagsRegister::CARRY);
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.pc, 0x1234);
}

#[test]
fn test_jp_hl() {
    // JP HL
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xe9]);
    let mut cpu = CPU::new(&table);
    cpu.r.set_hl(0x4000);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.pc, 0x4000);
}

#[test]
fn test_call_a16() {
    // CALL a16
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcd, 0x34, 0x12]);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfffe;
    assert_eq!(cpu.step(&mut bus).unwrap(), 24);
    assert_eq!(cpu.r.pc, 0x1234);
    assert_eq!(cpu.r.sp, 0xfffc);
    assert_eq!(bus.read(0xfffd), 0x00, "High byte of return address");
    assert_eq!(bus.read(0xfffc), 0x03, "Low byte of return address");
}

#[test]
fn test_call_z_a16_no_jump() {
    // CALL Z, a16
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcc, 0x34, 0x12]);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfffe;
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(cpu.r.pc, 0x0003);
    assert_eq!(cpu.r.sp, 0xfffe, "Nothing should be pushed");
}

#[test]
fn test_ret() {
    // RET
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc9]);
    bus.write(0xfffc, 0x34);
    bus.write(0xfffd, 0x12);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfffc;
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.pc, 0x1234);
    assert_eq!(cpu.r.sp, 0xfffe);
}

#[test]
fn test_ret_z() {
    // RET Z
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc8]);
    bus.write(0xfffc, 0x34);
    bus.write(0xfffd, 0x12);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfffc;
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.pc, 0x0001);
    assert_eq!(cpu.r.sp, 0xfffc);

    cpu.r.pc = 0x0000;
    cpu.r.f.insert(FlagsRegister::ZERO);
    assert_eq!(cpu.step(&mut bus).unwrap(), 20);
    assert_eq!(cpu.r.pc, 0x1234);
    assert_eq!(cpu.r.sp, 0xfffe);
}

#[test]
fn test_reti() {
    // RETI
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xd9]);
    bus.write(0xfffc, 0x00);
    bus.write(0xfffd, 0x02);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfffc;
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.pc, 0x0200);
    assert_eq!(
        bus.interrupts.ime,
        ImeState::Enabled,
        "RETI should enable IME without delay"
    );
}

#[test]
fn test_rst_28h() {
    // RST 28H
    let table = DispatchTable::new();
    let mut bus = MockBus::at(0x0200, &[0xef]);
    let mut cpu = CPU::new(&table);
    cpu.r.pc = 0x0200;
    cpu.r.sp = 0xfffe;
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.pc, 0x0028);
    assert_eq!(cpu.r.sp, 0xfffc);
    assert_eq!(bus.read(0xfffd), 0x02);
    assert_eq!(bus.read(0xfffc), 0x01);
}

#[test]
fn test_push_pop() {
    // PUSH BC, POP DE
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc5, 0xd1]);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfffe;
    cpu.r.set_bc(0x1234);
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.sp, 0xfffc);
    assert_eq!(bus.read(0xfffd), 0x12, "High byte should be pushed first");
    assert_eq!(bus.read(0xfffc), 0x34);

    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(cpu.r.sp, 0xfffe);
    assert_eq!(cpu.r.get_de(), 0x1234);
}

#[test]
fn test_pop_af_masks_flags() {
    // POP AF
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xf1]);
    bus.write(0xfffc, 0xff);
    bus.write(0xfffd, 0x12);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xfffc;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.get_af(), 0x12f0, "Lower nibble of F is always zero");
}

#[test]
fn test_ld_registers() {
    // LD B, d8; LD C, B; LD BC, d16; LD (HL), d8
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x06, 0x42, 0x48, 0x01, 0x34, 0x12, 0x36, 0x99]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.b, 0x42);

    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.c, 0x42);

    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(cpu.r.get_bc(), 0x1234);

    cpu.r.set_hl(0xc000);
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(bus.read(0xc000), 0x99);
    assert_eq!(cpu.r.pc, 0x0008);
}

#[test]
fn test_ld_hl_plus_minus() {
    // LD (HL+), A; LD A, (HL-)
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x22, 0x3a]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x42;
    cpu.r.set_hl(0xc000);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(bus.read(0xc000), 0x42);
    assert_eq!(cpu.r.get_hl(), 0xc001);

    bus.write(0xc001, 0x24);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.a, 0x24);
    assert_eq!(cpu.r.get_hl(), 0xc000);
}

#[test]
fn test_ld_high_ram() {
    // LDH (a8), A; LD A, (C)
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xe0, 0x80, 0xf2]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x42;
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_eq!(bus.read(0xff80), 0x42);

    cpu.r.a = 0x00;
    cpu.r.c = 0x80;
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.a, 0x42);
}

#[test]
fn test_ld_a16_a() {
    // LD (a16), A; LD A, (a16)
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xea, 0x00, 0xc0, 0xfa, 0x01, 0xc0]);
    bus.write(0xc001, 0x24);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x42;
    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(bus.read(0xc000), 0x42);

    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(cpu.r.a, 0x24);
    assert_eq!(cpu.r.pc, 0x0006);
}

#[test]
fn test_ld_a16_sp() {
    // LD (a16), SP
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x08, 0x00, 0xc0]);
    let mut cpu = CPU::new(&table);
    cpu.r.sp = 0xbeef;
    assert_eq!(cpu.step(&mut bus).unwrap(), 20);
    assert_eq!(cpu.r.pc, 0x0003);
    assert_eq!(bus.read(0xc000), 0xef);
    assert_eq!(bus.read(0xc001), 0xbe);
}

#[test]
fn test_daa_after_add() {
    // ADD A, d8; DAA
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc6, 0x38, 0x27]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x45;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.a, 0x83);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_daa_carry_zero() {
    // ADD A, d8; DAA
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xc6, 0x01, 0x27]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x99;
    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, true, false, false, true);
}

#[test]
fn test_daa_after_sub() {
    // SUB d8; DAA
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xd6, 0x01, 0x27]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x10;
    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x09);
    assert_flags(cpu.r.f, false, true, false, false);
}

#[test]
fn test_cpl_scf_ccf() {
    // CPL; SCF; CCF
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x2f, 0x37, 0x3f]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x35;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0xca);
    assert_flags(cpu.r.f, false, true, true, false);

    cpu.step(&mut bus).unwrap();
    assert_flags(cpu.r.f, false, false, false, true);

    cpu.step(&mut bus).unwrap();
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_rotate_a() {
    // RLCA; RLA; RRA
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x07, 0x17, 0x1f]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x85;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x0b);
    assert_flags(cpu.r.f, false, false, false, true);

    cpu.r.a = 0x80;
    cpu.r.f.remove(FlagsRegister::CARRY);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, false, false, false, true);

    cpu.r.a = 0x01;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x80, "Carry should be rotated into bit 7");
    assert_flags(cpu.r.f, false, false, false, true);
}

#[test]
fn test_rl_c_zero() {
    // RL C
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcb, 0x11]);
    let mut cpu = CPU::new(&table);
    cpu.r.c = 0x80;
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.pc, 2);
    assert_eq!(cpu.r.c, 0x00);
    assert_flags(cpu.r.f, true, false, false, true);
}

#[test]
fn test_rr_c_zero() {
    // RR C
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcb, 0x19]);
    let mut cpu = CPU::new(&table);
    cpu.r.c = 0x01;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.c, 0x00);
    assert_flags(cpu.r.f, true, false, false, true);
}

#[test]
fn test_rrc_l() {
    // RRC L
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcb, 0x0d]);
    let mut cpu = CPU::new(&table);
    cpu.r.l = 0x01;
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.l, 0x80);
    assert_flags(cpu.r.f, false, false, false, true);
}

#[test]
fn test_bit_7_h() {
    // BIT 7, H
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcb, 0x7c, 0xcb, 0x7c]);
    let mut cpu = CPU::new(&table);
    cpu.r.f.insert(FlagsRegister::CARRY);
    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_flags(cpu.r.f, true, false, true, true);

    cpu.r.h = 0x80;
    cpu.step(&mut bus).unwrap();
    assert_flags(cpu.r.f, false, false, true, true);
}

#[test]
fn test_bit_set_res_hli() {
    // BIT 0, (HL); SET 7, (HL); RES 4, L
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcb, 0x46, 0xcb, 0xfe, 0xcb, 0xa5]);
    bus.write(0xc010, 0x01);
    let mut cpu = CPU::new(&table);
    cpu.r.set_hl(0xc010);
    assert_eq!(cpu.step(&mut bus).unwrap(), 12);
    assert_flags(cpu.r.f, false, false, true, false);

    assert_eq!(cpu.step(&mut bus).unwrap(), 16);
    assert_eq!(bus.read(0xc010), 0x81);

    assert_eq!(cpu.step(&mut bus).unwrap(), 8);
    assert_eq!(cpu.r.l, 0x00);
}

#[test]
fn test_swap_a() {
    // SWAP A
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcb, 0x37]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0xf1;
    cpu.r.f.insert(FlagsRegister::CARRY);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x1f);
    assert_flags(cpu.r.f, false, false, false, false);
}

#[test]
fn test_shifts() {
    // SLA A; SRA E; SRL B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xcb, 0x27, 0xcb, 0x2b, 0xcb, 0x38]);
    let mut cpu = CPU::new(&table);
    cpu.r.a = 0x80;
    cpu.r.e = 0x81;
    cpu.r.b = 0x01;

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.a, 0x00);
    assert_flags(cpu.r.f, true, false, false, true);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.e, 0xc0, "SRA keeps the sign bit");
    assert_flags(cpu.r.f, false, false, false, true);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.b, 0x00);
    assert_flags(cpu.r.f, true, false, false, true);
}

#[test]
fn test_stop() {
    // STOP; INC B
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x10, 0x00, 0x04]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.pc, 2, "STOP should skip its padding byte");

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.b, 0x01);
}

#[test]
fn test_halt() {
    // HALT
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0x76, 0x04]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(cpu.r.pc, 1);
    assert!(cpu.is_halted);

    for _ in 0..3 {
        assert_eq!(cpu.step(&mut bus).unwrap(), 4);
        assert_eq!(cpu.r.pc, 1, "HALT should not change PC");
    }
    assert_eq!(cpu.r.b, 0x00);
}

#[test]
fn test_di() {
    // DI
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xf3]);
    bus.interrupts.set_master_enable(true);
    let mut cpu = CPU::new(&table);
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.interrupts.ime, ImeState::Disabled);
}

#[test]
fn test_ei_sequence() {
    // EI should be set to enabled after the next instruction
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xfb, 0x00]);
    let mut cpu = CPU::new(&table);
    assert_eq!(cpu.step(&mut bus).unwrap(), 4);
    assert_eq!(bus.interrupts.ime, ImeState::Pending);

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.interrupts.ime, ImeState::Enabled);
    assert_eq!(cpu.r.pc, 2);
}

#[test]
fn test_ei_di_rapid() {
    // Rapid EI/DI should not result in any interrupts
    let table = DispatchTable::new();
    let mut bus = MockBus::new(vec![0xfb, 0xf3, 0x00]);
    bus.interrupts.enable = InterruptRegister::VBLANK;
    bus.interrupts.raise(InterruptRegister::VBLANK);
    let mut cpu = CPU::new(&table);

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.interrupts.ime, ImeState::Pending);
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.interrupts.ime, ImeState::Disabled);
    assert_eq!(cpu.r.pc, 2);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.r.pc, 3);
    assert_eq!(bus.interrupts.flag, InterruptRegister::VBLANK);
}
