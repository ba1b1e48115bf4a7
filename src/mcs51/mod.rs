pub mod config;
pub mod cpu;
pub mod disasm;
pub mod hooks;
pub mod interrupt;
pub mod isa;
pub mod memory;
pub mod opcodes;
pub mod ops;
pub mod peripherals;
pub mod sfr;
pub mod soc;

pub fn set_bit(value: u8, bit: u8) -> u8 {
    value | (1 << (bit & 7))
}

pub fn clear_bit(value: u8, bit: u8) -> u8 {
    value & !(1 << (bit & 7))
}

pub fn assign_bit(value: u8, bit: u8, set: bool) -> u8 {
    if set {
        set_bit(value, bit)
    } else {
        clear_bit(value, bit)
    }
}

pub fn get_bit(value: u8, bit: u8) -> bool {
    value & (1 << (bit & 7)) != 0
}

/// Odd parity of `value`: true when the number of set bits is odd, which is
/// what PSW.P holds for the accumulator.
pub fn parity(value: u8) -> bool {
    value.count_ones() & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_helpers() {
        assert_eq!(set_bit(0x00, 3), 0x08);
        assert_eq!(clear_bit(0xFF, 7), 0x7F);
        assert_eq!(assign_bit(0x01, 0, false), 0x00);
        assert_eq!(assign_bit(0x00, 6, true), 0x40);
        assert!(get_bit(0x80, 7));
        assert!(!get_bit(0x7F, 7));
    }

    #[test]
    fn parity_counts_ones() {
        assert!(!parity(0x00));
        assert!(parity(0x01));
        assert!(!parity(0x03));
        assert!(parity(0x07));
        assert!(!parity(0xFF));
    }
}
