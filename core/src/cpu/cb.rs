//! The CB-prefixed opcode space: fully regular, eight groups of 32 opcodes each
//! addressing one of the eight `R8Code` operand slots via the low 3 bits.

use super::{alu, decode_r8, Cpu};
use crate::bus::Bus;

pub fn exec(cpu: &mut Cpu, bus: &mut Bus, opcode: u8) -> u32 {
    let operand = decode_r8(opcode);
    let group = opcode >> 6;
    let bit_index = (opcode >> 3) & 0x07;

    let cycles = match group {
        0 => {
            let value = cpu.read_r8(bus, operand);
            let result = match bit_index {
                0 => alu::rlc(&mut cpu.regs, value),
                1 => alu::rrc(&mut cpu.regs, value),
                2 => alu::rl(&mut cpu.regs, value),
                3 => alu::rr(&mut cpu.regs, value),
                4 => alu::sla(&mut cpu.regs, value),
                5 => alu::sra(&mut cpu.regs, value),
                6 => alu::swap(&mut cpu.regs, value),
                _ => alu::srl(&mut cpu.regs, value),
            };
            cpu.write_r8(bus, operand, result);
            4
        }
        1 => {
            // BIT b,r8: (HL) variant reads but never writes back, and never extends
            // cycle count for the write stage.
            let value = cpu.read_r8(bus, operand);
            alu::bit(&mut cpu.regs, value, bit_index);
            4
        }
        2 => {
            let value = cpu.read_r8(bus, operand);
            cpu.write_r8(bus, operand, alu::res(value, bit_index));
            4
        }
        _ => {
            let value = cpu.read_r8(bus, operand);
            cpu.write_r8(bus, operand, alu::set(value, bit_index));
            4
        }
    };

    // (HL) operand costs two extra M-cycles over the register form (one for the read,
    // one for the write-back); BIT's (HL) form only pays for the read.
    if operand == super::R8Code::HlIndirect {
        match group {
            1 => cycles + 8, // fetch + 1 read = 12 total
            _ => cycles + 12, // fetch + read + write = 16 total
        }
    } else {
        cycles + 4 // fetch + register-only op = 8 total
    }
}
