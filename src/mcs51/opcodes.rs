//! The 256-entry dispatch table.

use crate::mcs51::cpu::Mcu;
use crate::mcs51::{disasm, ops};

/// Executes the instruction at the program counter; returns its cost in ticks.
pub type Operation = fn(&mut Mcu) -> u32;

/// Appends the text of the instruction at a position; returns its length.
pub type Decoder = fn(&Mcu, u16, &mut String) -> u16;

#[derive(Clone, Copy)]
pub struct Opcode {
    pub operation: Operation,
    pub decoder: Decoder,
}

const fn entry(operation: Operation, decoder: Decoder) -> Opcode {
    Opcode { operation, decoder }
}

/// Handlers for `opcode`, straight from the instruction map.
pub const fn lookup(opcode: u8) -> Opcode {
    match opcode {
        0x00 => entry(ops::nop, disasm::nop),
        0xA5 => entry(ops::illegal, disasm::illegal),

        0x01 | 0x21 | 0x41 | 0x61 | 0x81 | 0xA1 | 0xC1 | 0xE1 => {
            entry(ops::ajmp, disasm::absolute)
        }
        0x11 | 0x31 | 0x51 | 0x71 | 0x91 | 0xB1 | 0xD1 | 0xF1 => {
            entry(ops::acall, disasm::absolute)
        }
        0x02 => entry(ops::ljmp, disasm::long),
        0x12 => entry(ops::lcall, disasm::long),
        0x22 => entry(ops::ret, disasm::implied),
        0x32 => entry(ops::reti, disasm::implied),
        0x73 => entry(ops::jmp_indirect, disasm::implied),

        0x03 | 0x13 | 0x23 | 0x33 => entry(ops::rotate, disasm::implied),

        0x04..=0x0F => entry(ops::inc, disasm::inc_dec),
        0x14..=0x1F => entry(ops::dec, disasm::inc_dec),
        0xA3 => entry(ops::inc_dptr, disasm::implied),

        0x10 | 0x20 | 0x30 => entry(ops::jump_bit, disasm::jump_bit),
        0x40 | 0x50 | 0x60 | 0x70 | 0x80 => entry(ops::jump_short, disasm::jump_short),

        0x24..=0x2F | 0x34..=0x3F | 0x94..=0x9F => entry(ops::arithmetic, disasm::arithmetic),
        0x42..=0x4F | 0x52..=0x5F | 0x62..=0x6F => entry(ops::logical, disasm::logical),

        0x72 | 0x82 | 0xA0 | 0xB0 => entry(ops::logical_carry, disasm::bit),
        0xA2 => entry(ops::mov_c_bit, disasm::bit),
        0x92 => entry(ops::mov_bit_c, disasm::bit),
        0xB2 | 0xC2 | 0xD2 => entry(ops::bit_op, disasm::bit),
        0xB3 | 0xC3 | 0xD3 => entry(ops::bit_op, disasm::implied),

        0x74..=0x7F => entry(ops::mov_immediate, disasm::mov_immediate),
        0x85..=0x8F => entry(ops::mov_to_direct, disasm::mov_to_direct),
        0xA6..=0xAF => entry(ops::mov_from_direct, disasm::mov_from_direct),
        0xE5..=0xEF => entry(ops::mov_a_source, disasm::mov_a_source),
        0xF5..=0xFF => entry(ops::mov_destination_a, disasm::mov_destination_a),
        0x90 => entry(ops::mov_dptr, disasm::mov_dptr),

        0x83 | 0x93 => entry(ops::movc, disasm::implied),
        0xE0 | 0xE2 | 0xE3 => entry(ops::movx_read, disasm::implied),
        0xF0 | 0xF2 | 0xF3 => entry(ops::movx_write, disasm::implied),

        0x84 => entry(ops::div, disasm::implied),
        0xA4 => entry(ops::mul, disasm::implied),

        0xB4..=0xBF => entry(ops::cjne, disasm::cjne),
        0xD5 | 0xD8..=0xDF => entry(ops::djnz, disasm::djnz),

        0xC0 => entry(ops::push, disasm::stack),
        0xD0 => entry(ops::pop, disasm::stack),

        0xC4 => entry(ops::swap, disasm::implied),
        0xC5..=0xCF => entry(ops::xch, disasm::xch),
        0xD6 | 0xD7 => entry(ops::xchd, disasm::xchd),
        0xD4 => entry(ops::da, disasm::implied),
        0xE4 => entry(ops::clr_a, disasm::implied),
        0xF4 => entry(ops::cpl_a, disasm::implied),
    }
}

const fn build_table() -> [Opcode; 256] {
    let mut table = [lookup(0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = lookup(i as u8);
        i += 1;
    }
    table
}

/// Shared by every core; built at compile time.
pub static OPCODES: [Opcode; 256] = build_table();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_lookup() {
        for opcode in 0..=0xFFu8 {
            let from_table = OPCODES[opcode as usize];
            let direct = lookup(opcode);
            assert_eq!(
                from_table.operation as usize, direct.operation as usize,
                "operation for {:02X}",
                opcode
            );
            assert_eq!(
                from_table.decoder as usize, direct.decoder as usize,
                "decoder for {:02X}",
                opcode
            );
        }
    }
}
