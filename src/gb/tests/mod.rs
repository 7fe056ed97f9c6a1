
use crate::gb::bus::MainBus;
use crate::gb::cartridge::Cartridge;
use crate::gb::constants::*;
use crate::gb::cpu::instruction::DispatchTable;
use crate::gb::cpu::registers::Registers;
use crate::gb::interrupt::InterruptRegister;
use crate::gb::joypad::JoypadButton;
use crate::gb::ppu::PPU;
use crate::gb::ppu::misc::ColoredPixel;
use crate::gb::ppu::registers::PPUMode;
use crate::gb::utils::{bit_at, half_carry_u8, half_carry_u16, set_bit};
use crate::gb::{AddressSpace, Bus, GBError, GameBoy};
use std::sync::Arc;

/// Builds a 32 KiB cartridge without controller,
/// the entry point jumps to `program` which is placed at 0x0150.
pub fn test_cartridge(program: &[u8]) -> Cartridge {
    let mut rom = vec![0x00; 0x8000];
    rom[0x0100..0x0104].copy_from_slice(&[0x00, 0xc3, 0x50, 0x01]);
    rom[0x0134..0x013b].copy_from_slice(b"DOTTEST");
    rom[0x0150..0x0150 + program.len()].copy_from_slice(program);
    Cartridge::try_from(Arc::<[u8]>::from(rom)).unwrap()
}

#[test]
fn test_work_ram_echo() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    bus.write(0xc123, 0x42);
    assert_eq!(bus.read(0xe123), 0x42, "Echo RAM mirrors work RAM");

    bus.write(0xfdff, 0x24);
    assert_eq!(bus.read(0xddff), 0x24, "Writes to echo RAM reach work RAM");

    bus.write(0xff80, 0x11);
    bus.write(0xfffe, 0x22);
    assert_eq!(bus.read(0xff80), 0x11);
    assert_eq!(bus.read(0xfffe), 0x22);
}

#[test]
fn test_unmapped_reads() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    bus.write(UNUSED_BEGIN, 0x12);
    assert_eq!(bus.read(UNUSED_BEGIN), UNDEFINED_READ);
    assert_eq!(bus.read(UNUSED_END), UNDEFINED_READ);
    assert_eq!(bus.read(0xff4c), UNDEFINED_READ, "Unmapped I/O register");
    assert_eq!(bus.read(0xa000), UNDEFINED_READ, "Cartridge has no RAM");
}

#[test]
fn test_interrupt_registers() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    bus.write(INTERRUPT_FLAG, 0x01);
    assert_eq!(bus.read(INTERRUPT_FLAG), 0xe1, "Upper bits of IF read as 1");
    assert_eq!(bus.interrupts().flag, InterruptRegister::VBLANK);

    bus.write(INTERRUPT_FLAG, 0xff);
    assert_eq!(bus.read(INTERRUPT_FLAG), 0xff);
    assert_eq!(bus.interrupts().flag, InterruptRegister::all());

    bus.write(INTERRUPT_ENABLE, 0xff);
    assert_eq!(bus.read(INTERRUPT_ENABLE), 0xff, "IE keeps all written bits");
    assert_eq!(bus.interrupts().pending_interrupt(), Some(InterruptRegister::VBLANK));
}

#[test]
fn test_boot_rom_overlay() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false)
        .with_boot_rom(&[0xaa; BOOT_SIZE])
        .unwrap();

    assert!(bus.is_boot_rom_active());
    assert_eq!(bus.read(0x0000), 0xaa);
    assert_eq!(bus.read(BOOT_END), 0xaa);
    assert_eq!(bus.read(0x0101), 0xc3, "Cartridge is visible above the boot image");

    bus.write(BOOT_ROM_OFF, 0x00);
    assert!(bus.is_boot_rom_active(), "Writing zero keeps the boot image mapped");

    bus.write(BOOT_ROM_OFF, 0x01);
    assert!(!bus.is_boot_rom_active());
    assert_eq!(bus.read(0x0000), 0x00);
    assert_eq!(bus.read(BOOT_ROM_OFF), UNDEFINED_READ);

    bus.write(BOOT_ROM_OFF, 0x00);
    assert!(!bus.is_boot_rom_active(), "Boot image can't be mapped again");
}

#[test]
fn test_boot_image_too_large() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let result = MainBus::new(&mut cartridge, &mut ppu, false).with_boot_rom(&[0x00; 257]);
    assert!(matches!(result, Err(GBError::BootImage { len: 257 })));
}

#[test]
fn test_oam_dma() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    for offset in 0..0xa0u16 {
        bus.write(0xc000 + offset, offset as u8);
    }
    bus.write(PPU_DMA, 0xc0);
    assert_eq!(bus.read(PPU_DMA), 0xc0);
    for offset in 0..0xa0u16 {
        assert_eq!(bus.read(OAM_BEGIN + offset), offset as u8);
    }
}

#[test]
fn test_serial_output() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    for byte in b"OK" {
        bus.write(SERIAL_TRANSFER_DATA, *byte);
        bus.write(SERIAL_TRANSFER_CTRL, 0x81);
    }
    assert_eq!(bus.serial_output(), b"OK");
    assert!(bus.interrupts().flag.contains(InterruptRegister::SERIAL));
}

#[test]
fn test_audio_registers() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    bus.write(0xff24, 0x77);
    bus.write(0xff30, 0x12);
    bus.write(0xff3f, 0x34);
    let snapshot = bus.audio_snapshot();
    assert_eq!(snapshot[0x14], 0x77);
    assert_eq!(snapshot[0x20], 0x12);
    assert_eq!(snapshot[0x2f], 0x34);
    assert_eq!(bus.read(0xff26), 0x70, "Unused bits of NR52 read as 1");
}

#[test]
fn test_joypad_buttons() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    bus.write(JOYPAD, 0b0010_0000);
    assert_eq!(bus.read(JOYPAD), 0b1110_1111);

    bus.press(JoypadButton::Down);
    assert_eq!(bus.read(JOYPAD), 0b1110_0111);
    assert!(bus.interrupts().flag.contains(InterruptRegister::JOYPAD));

    bus.press(JoypadButton::Start);
    assert_eq!(bus.read(JOYPAD), 0b1110_0111, "Action keys are not selected");

    bus.release(JoypadButton::Down);
    assert_eq!(bus.read(JOYPAD), 0b1110_1111);
}

#[test]
fn test_timer_steps_with_bus() {
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let mut bus = MainBus::new(&mut cartridge, &mut ppu, false);

    bus.write(TIMER_CTRL, 0b0000_0101);
    bus.write(TIMER_MODULO, 0x80);
    bus.write(TIMER_COUNTER, 0xff);
    bus.step(16);
    assert_eq!(bus.read(TIMER_COUNTER), 0x80, "Overflow reloads TMA");
    assert!(bus.interrupts().flag.contains(InterruptRegister::TIMER));

    bus.step(240);
    assert_eq!(bus.read(TIMER_DIVIDER), 0x01);
    bus.write(TIMER_DIVIDER, 0x42);
    assert_eq!(bus.read(TIMER_DIVIDER), 0x00, "Writing DIV resets it");
}

#[test]
fn test_fastboot() {
    let table = DispatchTable::new();
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let bus = MainBus::new(&mut cartridge, &mut ppu, false);
    let mut gb = GameBoy::new(&table, bus);

    assert_eq!(gb.cpu.r, Registers::post_boot());
    assert!(!gb.bus.is_boot_rom_active());
    assert_eq!(gb.bus.read(PPU_LCDC), 0x91);
    assert_eq!(gb.bus.read(PPU_BGP), 0xfc);
    assert_eq!(gb.bus.read(INTERRUPT_FLAG), 0xe1);
    assert_eq!(gb.bus.read(TIMER_CTRL), 0xf8);
    assert_eq!(gb.bus.ppu().mode(), PPUMode::AccessOAM);
}

#[test]
fn test_boot_image_execution() {
    // LD A, 0x01; LDH (0x50), A
    let boot = [0x3e, 0x01, 0xe0, 0x50];
    let table = DispatchTable::new();
    let mut cartridge = test_cartridge(&[]);
    let mut ppu = PPU::default();
    let bus = MainBus::new(&mut cartridge, &mut ppu, false)
        .with_boot_rom(&boot)
        .unwrap();
    let mut gb = GameBoy::new(&table, bus);
    assert_eq!(gb.cpu.r.pc, 0x0000, "Execution should start in the boot image");

    assert_eq!(gb.step().unwrap(), 8);
    assert_eq!(gb.step().unwrap(), 12);
    assert!(!gb.bus.is_boot_rom_active());
    assert_eq!(gb.cpu.r.pc, 0x0004);
    assert_eq!(gb.bus.read(0x0000), 0x00, "Cartridge should be visible now");
}

#[test]
fn test_run_frame() {
    // JR -2
    let table = DispatchTable::new();
    let mut cartridge = test_cartridge(&[0x18, 0xfe]);
    let mut ppu = PPU::default();
    let bus = MainBus::new(&mut cartridge, &mut ppu, false);
    let mut gb = GameBoy::new(&table, bus);

    for _ in 0..2 {
        let frame = gb.run_frame().unwrap();
        assert_eq!(frame.pixel(0, 0), Some(ColoredPixel::White));
        assert_eq!(frame.pixel(159, 143), Some(ColoredPixel::White));
        assert_eq!(gb.bus.ppu().ly(), 144, "Frame completes when V-Blank starts");
        assert_eq!(gb.bus.ppu().mode(), PPUMode::VBlank);
        assert_eq!(gb.cpu.r.pc, 0x0150);
    }
    assert!(gb.bus.interrupts().flag.contains(InterruptRegister::VBLANK));
}

#[test]
fn test_run_frame_lcd_disabled() {
    // JR -2
    let table = DispatchTable::new();
    let mut cartridge = test_cartridge(&[0x18, 0xfe]);
    let mut ppu = PPU::default();
    let bus = MainBus::new(&mut cartridge, &mut ppu, false);
    let mut gb = GameBoy::new(&table, bus);
    gb.bus.write(PPU_LCDC, 0x00);

    gb.run_frame().unwrap();
    assert_eq!(gb.bus.ppu().ly(), 0);
    assert_eq!(gb.bus.ppu().mode(), PPUMode::HBlank);
}

#[test]
fn test_run_frame_illegal_opcode() {
    let table = DispatchTable::new();
    let mut cartridge = test_cartridge(&[0x00, 0xd3]);
    let mut ppu = PPU::default();
    let bus = MainBus::new(&mut cartridge, &mut ppu, false);
    let mut gb = GameBoy::new(&table, bus);

    let result = gb.run_frame();
    assert!(matches!(
        result,
        Err(GBError::IllegalOpcode {
            opcode: 0xd3,
            address: 0x0151
        })
    ));
    assert!(gb.step().is_err(), "CPU stays locked up");
}

#[test]
fn test_bit_at() {
    let x = 0b11110000u8;
    assert!(!bit_at(x, 3));
    assert!(bit_at(x, 4));
    assert!(!bit_at(x, 8), "Out of range bits are never set");
}

#[test]
fn test_set_bit() {
    let x = 0b11110000u8;
    assert_eq!(set_bit(x, 0, true), 0b11110001u8);
    assert_eq!(set_bit(x, 1, true), 0b11110010u8);
    assert_eq!(set_bit(x, 0, false), 0b11110000u8);
    assert_eq!(set_bit(x, 7, false), 0b01110000u8);
}

#[test]
fn test_half_carry() {
    assert!(half_carry_u8(62, 34));
    assert!(!half_carry_u8(34, 34));
    assert!(half_carry_u16(0x0fff, 0x0001));
    assert!(!half_carry_u16(0x00ff, 0x0001));
}
