//! Decoder handlers. Each appends the assembler text of the instruction at
//! `position` to the buffer and returns its length in bytes; none of them
//! touch the core's state.

use std::fmt::Write;

use crate::mcs51::cpu::Mcu;
use crate::mcs51::isa::{decode_operand, AddressingMode, Bit, Direct, Hex, Register};

fn byte(mcu: &Mcu, position: u16, offset: u16) -> u8 {
    mcu.memory().code_byte(position.wrapping_add(offset))
}

fn relative(position: u16, length: u16, offset: u8) -> Hex {
    let next = position.wrapping_add(length);
    Hex(next.wrapping_add(offset as i8 as i16 as u16) as u32)
}

fn inc_dec_operand(opcode: u8, arg: u8) -> (AddressingMode, u16) {
    match decode_operand(opcode, arg) {
        (AddressingMode::Immediate(_), _) => (AddressingMode::Register(Register::A), 0),
        operand => operand,
    }
}

pub fn nop(_mcu: &Mcu, _position: u16, buffer: &mut String) -> u16 {
    buffer.push_str("NOP");
    1
}

pub fn illegal(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let _ = write!(buffer, "DB {}", Hex(byte(mcu, position, 0) as u32));
    1
}

pub fn absolute(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0) as u16;
    let next = position.wrapping_add(2);
    let target = (next & 0xF800) | ((opcode & 0xE0) << 3) | byte(mcu, position, 1) as u16;
    let mnemonic = if opcode & 0x10 == 0 { "AJMP" } else { "ACALL" };
    let _ = write!(buffer, "{} {}", mnemonic, Hex(target as u32));
    2
}

pub fn long(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let mnemonic = if byte(mcu, position, 0) == 0x02 {
        "LJMP"
    } else {
        "LCALL"
    };
    let target = u16::from_be_bytes([byte(mcu, position, 1), byte(mcu, position, 2)]);
    let _ = write!(buffer, "{} {}", mnemonic, Hex(target as u32));
    3
}

/// Single-byte instructions whose text depends only on the opcode.
pub fn implied(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let text = match byte(mcu, position, 0) {
        0x03 => "RR A",
        0x13 => "RRC A",
        0x22 => "RET",
        0x23 => "RL A",
        0x32 => "RETI",
        0x33 => "RLC A",
        0x73 => "JMP @A+DPTR",
        0x83 => "MOVC A,@A+PC",
        0x84 => "DIV AB",
        0x93 => "MOVC A,@A+DPTR",
        0xA3 => "INC DPTR",
        0xA4 => "MUL AB",
        0xB3 => "CPL C",
        0xC3 => "CLR C",
        0xC4 => "SWAP A",
        0xD3 => "SETB C",
        0xD4 => "DA A",
        0xE0 => "MOVX A,@DPTR",
        0xE2 => "MOVX A,@R0",
        0xE3 => "MOVX A,@R1",
        0xE4 => "CLR A",
        0xF0 => "MOVX @DPTR,A",
        0xF2 => "MOVX @R0,A",
        0xF3 => "MOVX @R1,A",
        _ => "CPL A",
    };
    buffer.push_str(text);
    1
}

pub fn inc_dec(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0);
    let (operand, extra) = inc_dec_operand(opcode, byte(mcu, position, 1));
    let mnemonic = if opcode & 0xF0 == 0 { "INC" } else { "DEC" };
    let _ = write!(buffer, "{} {}", mnemonic, operand);
    1 + extra
}

pub fn jump_bit(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let mnemonic = match byte(mcu, position, 0) {
        0x10 => "JBC",
        0x20 => "JB",
        _ => "JNB",
    };
    let _ = write!(
        buffer,
        "{} {},{}",
        mnemonic,
        Bit(byte(mcu, position, 1)),
        relative(position, 3, byte(mcu, position, 2))
    );
    3
}

pub fn jump_short(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let mnemonic = match byte(mcu, position, 0) {
        0x40 => "JC",
        0x50 => "JNC",
        0x60 => "JZ",
        0x70 => "JNZ",
        _ => "SJMP",
    };
    let _ = write!(
        buffer,
        "{} {}",
        mnemonic,
        relative(position, 2, byte(mcu, position, 1))
    );
    2
}

pub fn arithmetic(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0);
    let mnemonic = match opcode & 0xF0 {
        0x20 => "ADD",
        0x30 => "ADDC",
        _ => "SUBB",
    };
    let (operand, extra) = decode_operand(opcode, byte(mcu, position, 1));
    let _ = write!(buffer, "{} A,{}", mnemonic, operand);
    1 + extra
}

pub fn logical(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0);
    let mnemonic = match opcode & 0xF0 {
        0x40 => "ORL",
        0x50 => "ANL",
        _ => "XRL",
    };
    let arg = byte(mcu, position, 1);
    match opcode & 0x0F {
        0x2 => {
            let _ = write!(buffer, "{} {},A", mnemonic, Direct(arg));
            2
        }
        0x3 => {
            let data = AddressingMode::Immediate(byte(mcu, position, 2));
            let _ = write!(buffer, "{} {},{}", mnemonic, Direct(arg), data);
            3
        }
        _ => {
            let (operand, extra) = decode_operand(opcode, arg);
            let _ = write!(buffer, "{} A,{}", mnemonic, operand);
            1 + extra
        }
    }
}

/// Two-byte bit instructions: ORL/ANL C,[/]bit, MOV C,bit / bit,C and
/// CPL/CLR/SETB bit.
pub fn bit(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let bit = Bit(byte(mcu, position, 1));
    let _ = match byte(mcu, position, 0) {
        0x72 => write!(buffer, "ORL C,{}", bit),
        0x82 => write!(buffer, "ANL C,{}", bit),
        0x92 => write!(buffer, "MOV {},C", bit),
        0xA0 => write!(buffer, "ORL C,/{}", bit),
        0xA2 => write!(buffer, "MOV C,{}", bit),
        0xB0 => write!(buffer, "ANL C,/{}", bit),
        0xB2 => write!(buffer, "CPL {}", bit),
        0xC2 => write!(buffer, "CLR {}", bit),
        _ => write!(buffer, "SETB {}", bit),
    };
    2
}

pub fn mov_immediate(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0);
    let arg = byte(mcu, position, 1);
    match opcode {
        0x74 => {
            let _ = write!(buffer, "MOV A,{}", AddressingMode::Immediate(arg));
            2
        }
        0x75 => {
            let data = AddressingMode::Immediate(byte(mcu, position, 2));
            let _ = write!(buffer, "MOV {},{}", Direct(arg), data);
            3
        }
        _ => {
            let (operand, _) = decode_operand(opcode, 0);
            let _ = write!(buffer, "MOV {},{}", operand, AddressingMode::Immediate(arg));
            2
        }
    }
}

pub fn mov_to_direct(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0);
    let arg = byte(mcu, position, 1);
    if opcode == 0x85 {
        let destination = Direct(byte(mcu, position, 2));
        let _ = write!(buffer, "MOV {},{}", destination, Direct(arg));
        3
    } else {
        let (operand, _) = decode_operand(opcode, 0);
        let _ = write!(buffer, "MOV {},{}", Direct(arg), operand);
        2
    }
}

pub fn mov_from_direct(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let (operand, _) = decode_operand(byte(mcu, position, 0), 0);
    let _ = write!(buffer, "MOV {},{}", operand, Direct(byte(mcu, position, 1)));
    2
}

pub fn mov_a_source(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let (operand, extra) = decode_operand(byte(mcu, position, 0), byte(mcu, position, 1));
    let _ = write!(buffer, "MOV A,{}", operand);
    1 + extra
}

pub fn mov_destination_a(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let (operand, extra) = decode_operand(byte(mcu, position, 0), byte(mcu, position, 1));
    let _ = write!(buffer, "MOV {},A", operand);
    1 + extra
}

pub fn mov_dptr(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let value = u16::from_be_bytes([byte(mcu, position, 1), byte(mcu, position, 2)]);
    let _ = write!(buffer, "MOV DPTR,#{}", Hex(value as u32));
    3
}

pub fn cjne(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0);
    let arg = byte(mcu, position, 1);
    let target = relative(position, 3, byte(mcu, position, 2));
    let _ = match opcode {
        0xB4 => write!(buffer, "CJNE A,{},{}", AddressingMode::Immediate(arg), target),
        0xB5 => write!(buffer, "CJNE A,{},{}", Direct(arg), target),
        _ => {
            let (operand, _) = decode_operand(opcode, 0);
            write!(
                buffer,
                "CJNE {},{},{}",
                operand,
                AddressingMode::Immediate(arg),
                target
            )
        }
    };
    3
}

pub fn djnz(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let opcode = byte(mcu, position, 0);
    if opcode == 0xD5 {
        let target = relative(position, 3, byte(mcu, position, 2));
        let _ = write!(buffer, "DJNZ {},{}", Direct(byte(mcu, position, 1)), target);
        3
    } else {
        let target = relative(position, 2, byte(mcu, position, 1));
        let _ = write!(buffer, "DJNZ {},{}", Register::from_opcode(opcode), target);
        2
    }
}

pub fn stack(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let mnemonic = if byte(mcu, position, 0) == 0xC0 {
        "PUSH"
    } else {
        "POP"
    };
    let _ = write!(buffer, "{} {}", mnemonic, Direct(byte(mcu, position, 1)));
    2
}

pub fn xch(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let (operand, extra) = decode_operand(byte(mcu, position, 0), byte(mcu, position, 1));
    let _ = write!(buffer, "XCH A,{}", operand);
    1 + extra
}

pub fn xchd(mcu: &Mcu, position: u16, buffer: &mut String) -> u16 {
    let register = Register::from_opcode(byte(mcu, position, 0) & 1);
    let _ = write!(buffer, "XCHD A,@{}", register);
    1
}
