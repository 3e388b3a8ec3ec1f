//! The non-CB-prefixed opcode table. Organized by the bit-field groupings the LR35902
//! encoding is actually built from (`r8_from_code`, ALU group via `(opcode>>3)&7`,
//! condition codes) rather than as 256 independent hand-written cases.

use super::{alu, decode_r8, Cpu};
use crate::bus::Bus;

fn cond(cpu: &Cpu, code: u8) -> bool {
    match code & 0x03 {
        0 => !cpu.regs.zf(),
        1 => cpu.regs.zf(),
        2 => !cpu.regs.cf(),
        _ => cpu.regs.cf(),
    }
}

/// Genuinely illegal DMG opcodes with no defined behavior on real hardware.
const ILLEGAL_OPCODES: [u8; 11] = [0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD];

pub fn exec(cpu: &mut Cpu, bus: &mut Bus, opcode: u8) -> u32 {
    if ILLEGAL_OPCODES.contains(&opcode) {
        panic!("illegal opcode {:#04x} at PC={:#06x}", opcode, cpu.regs.pc.wrapping_sub(1));
    }

    match opcode {
        0x00 => 4, // NOP
        0x10 => {
            // STOP: the hardware reads one padding byte, then (absent CGB speed-switch
            // or serial-bootstrap concerns, both out of scope) halts like HALT does.
            cpu.fetch8(bus);
            cpu.enter_halt(bus.interrupts.pending_mask());
            4
        }
        0x76 => {
            cpu.enter_halt(bus.interrupts.pending_mask());
            4
        }
        0xF3 => {
            cpu.ime = false;
            cpu.clear_ei_latches();
            4
        }
        0xFB => {
            cpu.set_ei_pending();
            4
        }

        // 8-bit loads: LD r8,r8 (0x40-0x7F excluding 0x76 HALT, handled above)
        0x40..=0x7F => {
            let dst = decode_r8(opcode >> 3);
            let src = decode_r8(opcode);
            let value = cpu.read_r8(bus, src);
            cpu.write_r8(bus, dst, value);
            4
        }

        // LD r8,d8
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let dst = decode_r8(opcode >> 3);
            let value = cpu.fetch8(bus);
            cpu.write_r8(bus, dst, value);
            4
        }

        // INC r8 / DEC r8
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            let r = decode_r8(opcode >> 3);
            let value = cpu.read_r8(bus, r);
            let result = alu::inc(&mut cpu.regs, value);
            cpu.write_r8(bus, r, result);
            4
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            let r = decode_r8(opcode >> 3);
            let value = cpu.read_r8(bus, r);
            let result = alu::dec(&mut cpu.regs, value);
            cpu.write_r8(bus, r, result);
            4
        }

        // 16-bit loads/arith on BC/DE/HL/SP
        0x01 | 0x11 | 0x21 | 0x31 => {
            let value = cpu.fetch16(bus);
            cpu.write_r16(opcode >> 4, value);
            4
        }
        0x03 | 0x13 | 0x23 | 0x33 => {
            let value = cpu.read_r16(opcode >> 4).wrapping_add(1);
            cpu.write_r16(opcode >> 4, value);
            cpu.internal_cycle(bus);
            4
        }
        0x0B | 0x1B | 0x2B | 0x3B => {
            let value = cpu.read_r16(opcode >> 4).wrapping_sub(1);
            cpu.write_r16(opcode >> 4, value);
            cpu.internal_cycle(bus);
            4
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            let hl = cpu.regs.hl();
            let operand = cpu.read_r16(opcode >> 4);
            let result = alu::add16(&mut cpu.regs, hl, operand);
            cpu.regs.set_hl(result);
            cpu.internal_cycle(bus);
            4
        }

        // Indirect 8-bit loads through BC/DE/HL(+/-)
        0x02 => {
            let addr = cpu.regs.bc();
            cpu.write8(bus, addr, cpu.regs.a);
            4
        }
        0x12 => {
            let addr = cpu.regs.de();
            cpu.write8(bus, addr, cpu.regs.a);
            4
        }
        0x22 => {
            let addr = cpu.regs.hl();
            cpu.write8(bus, addr, cpu.regs.a);
            cpu.regs.set_hl(addr.wrapping_add(1));
            4
        }
        0x32 => {
            let addr = cpu.regs.hl();
            cpu.write8(bus, addr, cpu.regs.a);
            cpu.regs.set_hl(addr.wrapping_sub(1));
            4
        }
        0x0A => {
            let addr = cpu.regs.bc();
            cpu.regs.a = cpu.read8(bus, addr);
            4
        }
        0x1A => {
            let addr = cpu.regs.de();
            cpu.regs.a = cpu.read8(bus, addr);
            4
        }
        0x2A => {
            let addr = cpu.regs.hl();
            cpu.regs.a = cpu.read8(bus, addr);
            cpu.regs.set_hl(addr.wrapping_add(1));
            4
        }
        0x3A => {
            let addr = cpu.regs.hl();
            cpu.regs.a = cpu.read8(bus, addr);
            cpu.regs.set_hl(addr.wrapping_sub(1));
            4
        }

        0x08 => {
            // LD (a16),SP
            let addr = cpu.fetch16(bus);
            let sp = cpu.regs.sp;
            cpu.write8(bus, addr, sp as u8);
            cpu.write8(bus, addr.wrapping_add(1), (sp >> 8) as u8);
            4
        }

        // Rotates on A (unlike the CB-space equivalents, these never set ZF from the
        // result — only from the carry-out shifted through).
        0x07 => {
            cpu.regs.a = alu::rlc(&mut cpu.regs, cpu.regs.a);
            cpu.regs.set_zf(false);
            4
        }
        0x0F => {
            cpu.regs.a = alu::rrc(&mut cpu.regs, cpu.regs.a);
            cpu.regs.set_zf(false);
            4
        }
        0x17 => {
            cpu.regs.a = alu::rl(&mut cpu.regs, cpu.regs.a);
            cpu.regs.set_zf(false);
            4
        }
        0x1F => {
            cpu.regs.a = alu::rr(&mut cpu.regs, cpu.regs.a);
            cpu.regs.set_zf(false);
            4
        }

        0x27 => {
            alu::daa(&mut cpu.regs);
            4
        }
        0x2F => {
            cpu.regs.a = !cpu.regs.a;
            cpu.regs.set_n(true);
            cpu.regs.set_h(true);
            4
        }
        0x37 => {
            cpu.regs.set_n(false);
            cpu.regs.set_h(false);
            cpu.regs.set_cf(true);
            4
        }
        0x3F => {
            cpu.regs.set_n(false);
            cpu.regs.set_h(false);
            let cf = cpu.regs.cf();
            cpu.regs.set_cf(!cf);
            4
        }

        0x18 => {
            let offset = cpu.fetch8(bus) as i8;
            jump_relative(cpu, bus, offset);
            4
        }
        0x20 | 0x28 | 0x30 | 0x38 => {
            let offset = cpu.fetch8(bus) as i8;
            if cond(cpu, opcode >> 3) {
                jump_relative(cpu, bus, offset);
            }
            4
        }

        // ALU A,r8 (0x80-0xBF) via the standard (opcode>>3)&7 group index
        0x80..=0xBF => {
            let src = decode_r8(opcode);
            let value = cpu.read_r8(bus, src);
            alu_op(cpu, (opcode >> 3) & 0x07, value);
            4
        }
        // ALU A,d8 (0xC6,CE,D6,DE,E6,EE,F6,FE)
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            let value = cpu.fetch8(bus);
            alu_op(cpu, (opcode >> 3) & 0x07, value);
            4
        }

        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            cpu.internal_cycle(bus);
            if cond(cpu, opcode >> 3) {
                cpu.internal_cycle(bus);
                let addr = cpu.pop16(bus);
                cpu.regs.pc = addr;
            }
            4
        }
        0xC9 => {
            let addr = cpu.pop16(bus);
            cpu.regs.pc = addr;
            cpu.internal_cycle(bus);
            4
        }
        0xD9 => {
            let addr = cpu.pop16(bus);
            cpu.regs.pc = addr;
            cpu.ime = true;
            cpu.internal_cycle(bus);
            4
        }

        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let addr = cpu.fetch16(bus);
            if cond(cpu, opcode >> 3) {
                cpu.internal_cycle(bus);
                cpu.regs.pc = addr;
            }
            4
        }
        0xC3 => {
            let addr = cpu.fetch16(bus);
            cpu.internal_cycle(bus);
            cpu.regs.pc = addr;
            4
        }
        0xE9 => {
            cpu.regs.pc = cpu.regs.hl();
            4
        }

        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let addr = cpu.fetch16(bus);
            if cond(cpu, opcode >> 3) {
                cpu.internal_cycle(bus);
                let pc = cpu.regs.pc;
                cpu.push16(bus, pc);
                cpu.regs.pc = addr;
            }
            4
        }
        0xCD => {
            let addr = cpu.fetch16(bus);
            cpu.internal_cycle(bus);
            let pc = cpu.regs.pc;
            cpu.push16(bus, pc);
            cpu.regs.pc = addr;
            4
        }

        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            let value = cpu.pop16(bus);
            cpu.write_r16_stack(opcode >> 4, value);
            4
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            cpu.internal_cycle(bus);
            let value = cpu.read_r16_stack(opcode >> 4);
            cpu.push16(bus, value);
            4
        }

        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            cpu.internal_cycle(bus);
            let pc = cpu.regs.pc;
            cpu.push16(bus, pc);
            cpu.regs.pc = (opcode & 0x38) as u16;
            4
        }

        0xE0 => {
            let offset = cpu.fetch8(bus);
            let addr = 0xFF00 + offset as u16;
            let a = cpu.regs.a;
            cpu.write8(bus, addr, a);
            4
        }
        0xF0 => {
            let offset = cpu.fetch8(bus);
            let addr = 0xFF00 + offset as u16;
            cpu.regs.a = cpu.read8(bus, addr);
            4
        }
        0xE2 => {
            let addr = 0xFF00 + cpu.regs.c as u16;
            let a = cpu.regs.a;
            cpu.write8(bus, addr, a);
            4
        }
        0xF2 => {
            let addr = 0xFF00 + cpu.regs.c as u16;
            cpu.regs.a = cpu.read8(bus, addr);
            4
        }
        0xEA => {
            let addr = cpu.fetch16(bus);
            let a = cpu.regs.a;
            cpu.write8(bus, addr, a);
            4
        }
        0xFA => {
            let addr = cpu.fetch16(bus);
            cpu.regs.a = cpu.read8(bus, addr);
            4
        }

        0xE8 => {
            let offset = cpu.fetch8(bus) as i8;
            let sp = cpu.regs.sp;
            let result = alu::add_sp_signed(&mut cpu.regs, sp, offset);
            cpu.internal_cycle(bus);
            cpu.internal_cycle(bus);
            cpu.regs.sp = result;
            4
        }
        0xF8 => {
            let offset = cpu.fetch8(bus) as i8;
            let sp = cpu.regs.sp;
            let result = alu::add_sp_signed(&mut cpu.regs, sp, offset);
            cpu.internal_cycle(bus);
            cpu.regs.set_hl(result);
            4
        }
        0xF9 => {
            cpu.regs.sp = cpu.regs.hl();
            cpu.internal_cycle(bus);
            4
        }

        _ => unreachable!("opcode {:#04x} not covered by any group", opcode),
    }
}

fn alu_op(cpu: &mut Cpu, group: u8, value: u8) {
    let a = cpu.regs.a;
    match group {
        0 => cpu.regs.a = alu::add(&mut cpu.regs, a, value, 0),
        1 => cpu.regs.a = alu::add(&mut cpu.regs, a, value, cpu.regs.cf() as u8),
        2 => cpu.regs.a = alu::sub(&mut cpu.regs, a, value, 0),
        3 => cpu.regs.a = alu::sub(&mut cpu.regs, a, value, cpu.regs.cf() as u8),
        4 => cpu.regs.a = alu::and(&mut cpu.regs, a, value),
        5 => cpu.regs.a = alu::xor(&mut cpu.regs, a, value),
        6 => cpu.regs.a = alu::or(&mut cpu.regs, a, value),
        _ => {
            alu::sub(&mut cpu.regs, a, value, 0); // CP: flags only
        }
    }
}

fn jump_relative(cpu: &mut Cpu, bus: &mut Bus, offset: i8) {
    cpu.internal_cycle(bus);
    cpu.regs.pc = cpu.regs.pc.wrapping_add(offset as i16 as u16);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootrom::BootRom;
    use crate::bus::Bus;
    use crate::cartridge::Cartridge;
    use pretty_assertions::assert_eq;

    fn test_bus() -> Bus {
        let mut rom = vec![0u8; 0x8000];
        rom[0x147] = 0x00;
        Bus::new(Cartridge::new(rom).unwrap(), BootRom::new(None))
    }

    #[test]
    fn test_ld_r8_r8() {
        let mut bus = test_bus();
        let mut cpu = Cpu::new_post_boot();
        cpu.regs.b = 0x42;
        exec(&mut cpu, &mut bus, 0x78); // LD A,B
        assert_eq!(cpu.regs.a, 0x42);
    }

    #[test]
    fn test_inc_hl_indirect_round_trips_through_bus() {
        let mut bus = test_bus();
        let mut cpu = Cpu::new_post_boot();
        cpu.regs.set_hl(0xC000);
        bus.write(0xC000, 0x0F);
        exec(&mut cpu, &mut bus, 0x34); // INC (HL)
        assert_eq!(bus.read(0xC000), 0x10);
        assert!(cpu.regs.h());
    }

    #[test]
    fn test_cp_leaves_accumulator_unchanged() {
        let mut bus = test_bus();
        let mut cpu = Cpu::new_post_boot();
        cpu.regs.a = 0x10;
        exec(&mut cpu, &mut bus, 0xFE); // CP d8, operand fetched from PC (0x00 in fresh ROM)
        assert_eq!(cpu.regs.a, 0x10);
        assert!(!cpu.regs.zf());
    }

    #[test]
    fn test_call_and_ret_round_trip() {
        let mut bus = test_bus();
        let mut cpu = Cpu::new_post_boot();
        cpu.regs.pc = 0xC000;
        cpu.regs.sp = 0xFFFE;
        bus.write(0xC000, 0x01); // jump target low
        bus.write(0xC001, 0xD0); // jump target high -> 0xD001
        exec(&mut cpu, &mut bus, 0xCD); // CALL a16
        assert_eq!(cpu.regs.pc, 0xD001);
        assert_eq!(cpu.regs.sp, 0xFFFC);

        exec(&mut cpu, &mut bus, 0xC9); // RET
        assert_eq!(cpu.regs.pc, 0xC002);
        assert_eq!(cpu.regs.sp, 0xFFFE);
    }

    #[test]
    #[should_panic(expected = "illegal opcode")]
    fn test_illegal_opcode_panics() {
        let mut bus = test_bus();
        let mut cpu = Cpu::new_post_boot();
        exec(&mut cpu, &mut bus, 0xD3);
    }

    #[test]
    fn test_rlca_always_clears_zero_flag() {
        let mut bus = test_bus();
        let mut cpu = Cpu::new_post_boot();
        cpu.regs.a = 0x00;
        exec(&mut cpu, &mut bus, 0x07); // RLCA
        assert!(!cpu.regs.zf(), "RLCA always clears ZF even when the result is zero");
    }
}
