//! The disassembler and the executor must agree on instruction lengths.

mod common;

use common::{load_at, mcu_with};
use proptest::prelude::*;

const ORIGIN: u16 = 0x0200;

// instructions that load the program counter from an operand or the stack
fn transfers_control(opcode: u8) -> bool {
    matches!(opcode & 0x1F, 0x01 | 0x11) || matches!(opcode, 0x02 | 0x12 | 0x22 | 0x32 | 0x73 | 0x80)
}

// offset of the relative displacement of a conditional branch
fn displacement(opcode: u8) -> Option<usize> {
    match opcode {
        0x10 | 0x20 | 0x30 => Some(2),
        0x40 | 0x50 | 0x60 | 0x70 => Some(1),
        0xB4..=0xBF | 0xD5 => Some(2),
        0xD8..=0xDF => Some(1),
        _ => None,
    }
}

/// Decode and execute one instruction at `ORIGIN`. Returns the decoded
/// length, the PC advance and the decoded text.
fn decode_and_execute(opcode: u8, first: u8, second: u8) -> (u16, u16, String) {
    let mut program = [opcode, first, second];
    if let Some(offset) = displacement(opcode) {
        program[offset] = 0;
    }

    let mut mcu = mcu_with(&[]);
    load_at(&mut mcu, ORIGIN as usize, &program);
    mcu.set_pc(ORIGIN);
    mcu.set_sp(0x40);

    let mut text = String::new();
    let length = mcu.decode(ORIGIN, &mut text);
    mcu.do_operation();
    (length, mcu.pc().wrapping_sub(ORIGIN), text)
}

#[test]
fn every_opcode_advances_by_its_decoded_length() {
    const OPERANDS: [u8; 8] = [0x00, 0x30, 0x7F, 0x80, 0x81, 0xD0, 0xE0, 0xFF];

    for opcode in (0..=0xFFu8).filter(|op| !transfers_control(*op)) {
        for first in OPERANDS {
            for second in OPERANDS {
                let (length, advance, text) = decode_and_execute(opcode, first, second);
                assert!(!text.is_empty(), "{:02X} decoded to nothing", opcode);
                assert_eq!(
                    advance, length,
                    "{:02X} {:02X} {:02X}: {}",
                    opcode, first, second, text
                );
            }
        }
    }
}

proptest! {
    #[test]
    fn decoded_length_matches_pc_advance(
        opcode in any::<u8>().prop_filter("control transfer", |op| !transfers_control(*op)),
        first in any::<u8>(),
        second in any::<u8>(),
    ) {
        let (length, advance, text) = decode_and_execute(opcode, first, second);
        prop_assert!(!text.is_empty());
        prop_assert_eq!(advance, length, "{:02X}: {}", opcode, text);
    }
}

#[test]
fn reserved_opcode_is_one_byte() {
    let mut mcu = mcu_with(&[0xA5, 0x00]);
    let mut text = String::new();
    assert_eq!(mcu.decode(0, &mut text), 1);
    assert_eq!(text, "DB 0A5h");
    mcu.do_operation();
    assert_eq!(mcu.pc(), 1);
}
