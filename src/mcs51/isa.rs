//! Operand encoding shared by the operation handlers and the disassembler.

use std::fmt;

use crate::mcs51::memory::sfr_index;
use crate::mcs51::sfr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    A,
}

impl Register {
    // low three bits of an opcode select Rn
    pub fn from_opcode(opcode: u8) -> Register {
        match opcode & 0x7 {
            0 => Register::R0,
            1 => Register::R1,
            2 => Register::R2,
            3 => Register::R3,
            4 => Register::R4,
            5 => Register::R5,
            6 => Register::R6,
            _ => Register::R7,
        }
    }

    /// Offset of Rn inside the active register bank.
    pub fn index(self) -> Option<u8> {
        match self {
            Register::R0 => Some(0),
            Register::R1 => Some(1),
            Register::R2 => Some(2),
            Register::R3 => Some(3),
            Register::R4 => Some(4),
            Register::R5 => Some(5),
            Register::R6 => Some(6),
            Register::R7 => Some(7),
            Register::A => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(n) => write!(f, "R{}", n),
            None => f.write_str("A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Immediate(u8),
    Register(Register),
    Direct(u8),
    Indirect(Register),
}

/// Operand selected by the low nibble of an arithmetic / logic / move opcode:
/// 4 immediate (or A for INC/DEC), 5 direct, 6-7 `@Ri`, 8-F `Rn`.
/// `arg` is the byte following the opcode; the second value is the number of
/// operand bytes consumed.
pub fn decode_operand(opcode: u8, arg: u8) -> (AddressingMode, u16) {
    match opcode & 0x0F {
        0x4 => (AddressingMode::Immediate(arg), 1),
        0x5 => (AddressingMode::Direct(arg), 1),
        0x6 => (AddressingMode::Indirect(Register::R0), 0),
        0x7 => (AddressingMode::Indirect(Register::R1), 0),
        _ => (AddressingMode::Register(Register::from_opcode(opcode)), 0),
    }
}

/// Hex number in assembler notation: `12h`, `0A5h`.
pub struct Hex(pub u32);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = format!("{:X}", self.0);
        if digits.starts_with(|c: char| c.is_ascii_alphabetic()) {
            write!(f, "0{}h", digits)
        } else {
            write!(f, "{}h", digits)
        }
    }
}

/// Direct address, shown by name when it is a known SFR.
pub struct Direct(pub u8);

impl fmt::Display for Direct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 0x80 {
            if let Some(name) = sfr::name(sfr_index(self.0)) {
                return f.write_str(name);
            }
        }
        write!(f, "{}", Hex(self.0 as u32))
    }
}

/// Bit address: `20h.3` for the bit-addressable RAM, `ACC.7` for SFRs.
pub struct Bit(pub u8);

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = self.0 & 0x07;
        if self.0 < 0x80 {
            write!(f, "{}.{}", Hex(0x20 + (self.0 >> 3) as u32), bit)
        } else {
            write!(f, "{}.{}", Direct(self.0 & 0xF8), bit)
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingMode::Immediate(value) => write!(f, "#{}", Hex(*value as u32)),
            AddressingMode::Register(register) => write!(f, "{}", register),
            AddressingMode::Direct(address) => write!(f, "{}", Direct(*address)),
            AddressingMode::Indirect(register) => write!(f, "@{}", register),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_nibble_selects_operand() {
        assert_eq!(
            decode_operand(0x24, 0x12),
            (AddressingMode::Immediate(0x12), 1)
        );
        assert_eq!(decode_operand(0x25, 0xE0), (AddressingMode::Direct(0xE0), 1));
        assert_eq!(
            decode_operand(0x27, 0x00),
            (AddressingMode::Indirect(Register::R1), 0)
        );
        assert_eq!(
            decode_operand(0x2D, 0x00),
            (AddressingMode::Register(Register::R5), 0)
        );
    }

    #[test]
    fn operand_text() {
        assert_eq!(AddressingMode::Immediate(0x12).to_string(), "#12h");
        assert_eq!(AddressingMode::Immediate(0xA5).to_string(), "#0A5h");
        assert_eq!(AddressingMode::Direct(0xE0).to_string(), "ACC");
        assert_eq!(AddressingMode::Direct(0x30).to_string(), "30h");
        assert_eq!(AddressingMode::Direct(0x94).to_string(), "94h");
        assert_eq!(AddressingMode::Indirect(Register::R0).to_string(), "@R0");
        assert_eq!(Bit(0x03).to_string(), "20h.3");
        assert_eq!(Bit(0xD7).to_string(), "PSW.7");
    }
}
