//! Operation handlers, one per instruction family.
//!
//! Every handler executes the instruction at the program counter, leaves the
//! program counter on the next instruction (or the jump target) and returns
//! the cost in ticks. Families that differ only in addressing mode share a
//! handler and pick the operand from the low bits of the opcode.

use crate::mcs51::cpu::{Mcu, TICKS_PER_CYCLE};
use crate::mcs51::hooks::Exception;
use crate::mcs51::interrupt;
use crate::mcs51::isa::{decode_operand, AddressingMode, Register};
use crate::mcs51::memory::sfr_address;
use crate::mcs51::sfr::{PSW, REG_ACC};

const ONE_CYCLE: u32 = TICKS_PER_CYCLE;
const TWO_CYCLES: u32 = 2 * TICKS_PER_CYCLE;
const FOUR_CYCLES: u32 = 4 * TICKS_PER_CYCLE;

/// Result of an 8-bit addition or subtraction with its PSW side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub carry: bool,
    pub aux_carry: bool,
    pub overflow: bool,
}

pub fn add(a: u8, b: u8, carry_in: bool) -> AluResult {
    let c = carry_in as u16;
    let sum = a as u16 + b as u16 + c;
    let carry = sum > 0xFF;
    let carry6 = (a & 0x7F) as u16 + (b & 0x7F) as u16 + c > 0x7F;
    AluResult {
        value: sum as u8,
        carry,
        aux_carry: (a & 0x0F) as u16 + (b & 0x0F) as u16 + c > 0x0F,
        overflow: carry6 != carry,
    }
}

/// `a - b - borrow`, with C as the borrow out of bit 7.
pub fn subtract(a: u8, b: u8, borrow_in: bool) -> AluResult {
    let c = borrow_in as i16;
    let difference = a as i16 - b as i16 - c;
    let carry = difference < 0;
    let borrow6 = (a & 0x7F) as i16 - (b & 0x7F) as i16 - c < 0;
    AluResult {
        value: difference as u8,
        carry,
        aux_carry: (a & 0x0F) as i16 - (b & 0x0F) as i16 - c < 0,
        overflow: borrow6 != carry,
    }
}

/// Decimal adjust after a BCD addition. Returns the adjusted value and the
/// new carry; DA only ever sets the carry.
pub fn decimal_adjust(a: u8, carry: bool, aux_carry: bool) -> (u8, bool) {
    let mut value = a as u16;
    let mut carry = carry;
    if (value & 0x0F) > 9 || aux_carry {
        value += 0x06;
        if value > 0xFF {
            carry = true;
        }
    }
    if (value & 0xF0) > 0x90 || carry {
        value += 0x60;
        if value > 0xFF {
            carry = true;
        }
    }
    (value as u8, carry)
}

fn set_alu_flags(mcu: &mut Mcu, result: &AluResult) {
    let mut psw = mcu.flags();
    psw.set(PSW::CY, result.carry);
    psw.set(PSW::AC, result.aux_carry);
    psw.set(PSW::OV, result.overflow);
    mcu.set_psw(psw.bits());
}

fn relative(from: u16, offset: u8) -> u16 {
    from.wrapping_add(offset as i8 as i16 as u16)
}

// branch to `offset` relative to the end of an instruction of `length` bytes
fn branch(mcu: &mut Mcu, length: u16, offset: u8, taken: bool) -> u32 {
    let next = mcu.pc().wrapping_add(length);
    mcu.set_pc(if taken { relative(next, offset) } else { next });
    TWO_CYCLES
}

// the INC/DEC families use A where the others take an immediate
fn inc_dec_operand(opcode: u8, arg: u8) -> (AddressingMode, u16) {
    match decode_operand(opcode, arg) {
        (AddressingMode::Immediate(_), _) => (AddressingMode::Register(Register::A), 0),
        operand => operand,
    }
}

pub fn nop(mcu: &mut Mcu) -> u32 {
    mcu.advance(1);
    ONE_CYCLE
}

pub fn illegal(mcu: &mut Mcu) -> u32 {
    mcu.raise(Exception::IllegalOpcode);
    mcu.advance(1);
    ONE_CYCLE
}

fn absolute_target(mcu: &Mcu) -> u16 {
    let opcode = mcu.fetch(0) as u16;
    let next = mcu.pc().wrapping_add(2);
    (next & 0xF800) | ((opcode & 0xE0) << 3) | mcu.fetch(1) as u16
}

pub fn ajmp(mcu: &mut Mcu) -> u32 {
    let target = absolute_target(mcu);
    mcu.set_pc(target);
    TWO_CYCLES
}

fn call(mcu: &mut Mcu, length: u16, target: u16) -> u32 {
    let next = mcu.pc().wrapping_add(length);
    mcu.push_to_stack((next & 0xFF) as u8);
    mcu.push_to_stack((next >> 8) as u8);
    mcu.set_pc(target);
    TWO_CYCLES
}

pub fn acall(mcu: &mut Mcu) -> u32 {
    let target = absolute_target(mcu);
    call(mcu, 2, target)
}

fn long_target(mcu: &Mcu) -> u16 {
    u16::from_be_bytes([mcu.fetch(1), mcu.fetch(2)])
}

pub fn ljmp(mcu: &mut Mcu) -> u32 {
    let target = long_target(mcu);
    mcu.set_pc(target);
    TWO_CYCLES
}

pub fn lcall(mcu: &mut Mcu) -> u32 {
    let target = long_target(mcu);
    call(mcu, 3, target)
}

pub fn ret(mcu: &mut Mcu) -> u32 {
    let high = mcu.pop_from_stack();
    let low = mcu.pop_from_stack();
    mcu.set_pc(u16::from_be_bytes([high, low]));
    TWO_CYCLES
}

pub fn reti(mcu: &mut Mcu) -> u32 {
    interrupt::leave(mcu);
    TWO_CYCLES
}

pub fn jmp_indirect(mcu: &mut Mcu) -> u32 {
    let target = mcu.dptr().wrapping_add(mcu.acc() as u16);
    mcu.set_pc(target);
    TWO_CYCLES
}

/// RR, RRC, RL, RLC on the accumulator.
pub fn rotate(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    let a = mcu.acc();
    let carry = mcu.carry();
    let value = match opcode {
        0x03 => a.rotate_right(1),
        0x13 => {
            mcu.set_carry(a & 0x01 != 0);
            (a >> 1) | ((carry as u8) << 7)
        }
        0x23 => a.rotate_left(1),
        _ => {
            mcu.set_carry(a & 0x80 != 0);
            (a << 1) | carry as u8
        }
    };
    mcu.set_acc(value);
    mcu.advance(1);
    ONE_CYCLE
}

pub fn inc(mcu: &mut Mcu) -> u32 {
    let (operand, extra) = inc_dec_operand(mcu.fetch(0), mcu.fetch(1));
    let value = mcu.load_latch(operand).wrapping_add(1);
    mcu.store(operand, value);
    mcu.advance(1 + extra);
    ONE_CYCLE
}

pub fn dec(mcu: &mut Mcu) -> u32 {
    let (operand, extra) = inc_dec_operand(mcu.fetch(0), mcu.fetch(1));
    let value = mcu.load_latch(operand).wrapping_sub(1);
    mcu.store(operand, value);
    mcu.advance(1 + extra);
    ONE_CYCLE
}

pub fn inc_dptr(mcu: &mut Mcu) -> u32 {
    let dptr = mcu.dptr().wrapping_add(1);
    mcu.set_dptr(dptr);
    mcu.advance(1);
    TWO_CYCLES
}

/// JBC, JB, JNB.
pub fn jump_bit(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    let bit = mcu.fetch(1);
    let offset = mcu.fetch(2);
    let taken = match opcode {
        0x10 => {
            let set = mcu.read_bit_latch(bit);
            if set {
                mcu.write_bit(bit, false);
            }
            set
        }
        0x20 => mcu.read_bit(bit),
        _ => !mcu.read_bit(bit),
    };
    branch(mcu, 3, offset, taken)
}

/// JC, JNC, JZ, JNZ, SJMP.
pub fn jump_short(mcu: &mut Mcu) -> u32 {
    let offset = mcu.fetch(1);
    let taken = match mcu.fetch(0) {
        0x40 => mcu.carry(),
        0x50 => !mcu.carry(),
        0x60 => mcu.acc() == 0,
        0x70 => mcu.acc() != 0,
        _ => true,
    };
    branch(mcu, 2, offset, taken)
}

/// ADD, ADDC, SUBB.
pub fn arithmetic(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    let (operand, extra) = decode_operand(opcode, mcu.fetch(1));
    let value = mcu.load(operand);
    let a = mcu.acc();
    let result = match opcode & 0xF0 {
        0x20 => add(a, value, false),
        0x30 => add(a, value, mcu.carry()),
        _ => subtract(a, value, mcu.carry()),
    };
    mcu.set_acc(result.value);
    set_alu_flags(mcu, &result);
    mcu.advance(1 + extra);
    ONE_CYCLE
}

fn logic(opcode: u8, a: u8, b: u8) -> u8 {
    match opcode & 0xF0 {
        0x40 => a | b,
        0x50 => a & b,
        _ => a ^ b,
    }
}

/// ORL, ANL, XRL on bytes: `dir,A`, `dir,#data` and `A,src`.
pub fn logical(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    match opcode & 0x0F {
        0x2 => {
            let address = mcu.fetch(1);
            let value = logic(opcode, mcu.read_direct_latch(address), mcu.acc());
            mcu.write_direct(address, value);
            mcu.advance(2);
            ONE_CYCLE
        }
        0x3 => {
            let address = mcu.fetch(1);
            let value = logic(opcode, mcu.read_direct_latch(address), mcu.fetch(2));
            mcu.write_direct(address, value);
            mcu.advance(3);
            TWO_CYCLES
        }
        _ => {
            let (operand, extra) = decode_operand(opcode, mcu.fetch(1));
            let value = mcu.load(operand);
            let a = mcu.acc();
            mcu.set_acc(logic(opcode, a, value));
            mcu.advance(1 + extra);
            ONE_CYCLE
        }
    }
}

/// ORL C,bit  ANL C,bit  ORL C,/bit  ANL C,/bit.
pub fn logical_carry(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    let bit = mcu.fetch(1);
    let mut value = mcu.read_bit(bit);
    if opcode == 0xA0 || opcode == 0xB0 {
        value = !value;
    }
    let carry = match opcode {
        0x72 | 0xA0 => mcu.carry() || value,
        _ => mcu.carry() && value,
    };
    mcu.set_carry(carry);
    mcu.advance(2);
    TWO_CYCLES
}

pub fn mov_c_bit(mcu: &mut Mcu) -> u32 {
    let value = mcu.read_bit(mcu.fetch(1));
    mcu.set_carry(value);
    mcu.advance(2);
    ONE_CYCLE
}

pub fn mov_bit_c(mcu: &mut Mcu) -> u32 {
    let carry = mcu.carry();
    mcu.write_bit(mcu.fetch(1), carry);
    mcu.advance(2);
    TWO_CYCLES
}

/// CPL, CLR, SETB on an addressable bit or on C.
pub fn bit_op(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    let apply = |old: bool| match opcode & 0xF0 {
        0xB0 => !old,
        0xC0 => false,
        _ => true,
    };
    if opcode & 0x0F == 0x2 {
        let bit = mcu.fetch(1);
        let value = apply(mcu.read_bit_latch(bit));
        mcu.write_bit(bit, value);
        mcu.advance(2);
    } else {
        let value = apply(mcu.carry());
        mcu.set_carry(value);
        mcu.advance(1);
    }
    ONE_CYCLE
}

/// MOV with an immediate source: `A,#`, `dir,#`, `@Ri,#`, `Rn,#`.
pub fn mov_immediate(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    match opcode {
        0x74 => {
            let value = mcu.fetch(1);
            mcu.set_acc(value);
            mcu.advance(2);
            ONE_CYCLE
        }
        0x75 => {
            let address = mcu.fetch(1);
            let value = mcu.fetch(2);
            mcu.write_direct(address, value);
            mcu.advance(3);
            TWO_CYCLES
        }
        _ => {
            let (operand, _) = decode_operand(opcode, 0);
            let value = mcu.fetch(1);
            mcu.store(operand, value);
            mcu.advance(2);
            ONE_CYCLE
        }
    }
}

/// `MOV dir,dir` (85 src dst) and `MOV dir,@Ri / Rn`.
pub fn mov_to_direct(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    if opcode == 0x85 {
        let value = mcu.read_direct(mcu.fetch(1));
        mcu.write_direct(mcu.fetch(2), value);
        mcu.advance(3);
    } else {
        let (operand, _) = decode_operand(opcode, 0);
        let value = mcu.load(operand);
        mcu.write_direct(mcu.fetch(1), value);
        mcu.advance(2);
    }
    TWO_CYCLES
}

/// `MOV @Ri / Rn, dir`.
pub fn mov_from_direct(mcu: &mut Mcu) -> u32 {
    let (operand, _) = decode_operand(mcu.fetch(0), 0);
    let value = mcu.read_direct(mcu.fetch(1));
    mcu.store(operand, value);
    mcu.advance(2);
    TWO_CYCLES
}

pub fn mov_a_source(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    let (operand, extra) = decode_operand(opcode, mcu.fetch(1));
    if operand == AddressingMode::Direct(sfr_address(REG_ACC)) {
        mcu.raise(Exception::AccToA);
    }
    let value = mcu.load(operand);
    mcu.set_acc(value);
    mcu.advance(1 + extra);
    ONE_CYCLE
}

pub fn mov_destination_a(mcu: &mut Mcu) -> u32 {
    let (operand, extra) = decode_operand(mcu.fetch(0), mcu.fetch(1));
    let a = mcu.acc();
    mcu.store(operand, a);
    mcu.advance(1 + extra);
    ONE_CYCLE
}

pub fn mov_dptr(mcu: &mut Mcu) -> u32 {
    let value = long_target(mcu);
    mcu.set_dptr(value);
    mcu.advance(3);
    TWO_CYCLES
}

/// MOVC A,@A+PC and MOVC A,@A+DPTR.
pub fn movc(mcu: &mut Mcu) -> u32 {
    let base = if mcu.fetch(0) == 0x83 {
        mcu.pc().wrapping_add(1)
    } else {
        mcu.dptr()
    };
    let value = mcu.memory().code_byte(base.wrapping_add(mcu.acc() as u16));
    mcu.set_acc(value);
    mcu.advance(1);
    TWO_CYCLES
}

// MOVX @Ri drives only the low address byte
fn movx_address(mcu: &Mcu, opcode: u8) -> u16 {
    match opcode & 0x0F {
        0x0 => mcu.dptr(),
        n => mcu.register(n & 1) as u16,
    }
}

/// MOVX A,@DPTR and MOVX A,@Ri.
pub fn movx_read(mcu: &mut Mcu) -> u32 {
    let address = movx_address(mcu, mcu.fetch(0));
    let value = mcu.read_xdata(address);
    mcu.set_acc(value);
    mcu.advance(1);
    TWO_CYCLES
}

/// MOVX @DPTR,A and MOVX @Ri,A.
pub fn movx_write(mcu: &mut Mcu) -> u32 {
    let address = movx_address(mcu, mcu.fetch(0));
    let a = mcu.acc();
    mcu.write_xdata(address, a);
    mcu.advance(1);
    TWO_CYCLES
}

pub fn mul(mcu: &mut Mcu) -> u32 {
    let product = mcu.acc() as u16 * mcu.b() as u16;
    let [low, high] = product.to_le_bytes();
    mcu.set_acc(low);
    mcu.set_b(high);
    let mut psw = mcu.flags();
    psw.remove(PSW::CY);
    psw.set(PSW::OV, product > 0xFF);
    mcu.set_psw(psw.bits());
    mcu.advance(1);
    FOUR_CYCLES
}

pub fn div(mcu: &mut Mcu) -> u32 {
    let a = mcu.acc();
    let b = mcu.b();
    let mut psw = mcu.flags();
    psw.remove(PSW::CY);
    if b == 0 {
        psw.insert(PSW::OV);
    } else {
        psw.remove(PSW::OV);
        mcu.set_acc(a / b);
        mcu.set_b(a % b);
    }
    mcu.set_psw(psw.bits());
    mcu.advance(1);
    FOUR_CYCLES
}

pub fn cjne(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    let (left, right) = match opcode {
        0xB4 => (mcu.acc(), mcu.fetch(1)),
        0xB5 => {
            let a = mcu.acc();
            (a, mcu.read_direct(mcu.fetch(1)))
        }
        _ => {
            let (operand, _) = decode_operand(opcode, 0);
            (mcu.load(operand), mcu.fetch(1))
        }
    };
    let offset = mcu.fetch(2);
    mcu.set_carry(left < right);
    branch(mcu, 3, offset, left != right)
}

pub fn djnz(mcu: &mut Mcu) -> u32 {
    let opcode = mcu.fetch(0);
    if opcode == 0xD5 {
        let address = mcu.fetch(1);
        let value = mcu.read_direct_latch(address).wrapping_sub(1);
        mcu.write_direct(address, value);
        let offset = mcu.fetch(2);
        branch(mcu, 3, offset, value != 0)
    } else {
        let n = opcode & 7;
        let value = mcu.register(n).wrapping_sub(1);
        mcu.set_register(n, value);
        let offset = mcu.fetch(1);
        branch(mcu, 2, offset, value != 0)
    }
}

pub fn push(mcu: &mut Mcu) -> u32 {
    let value = mcu.read_direct(mcu.fetch(1));
    mcu.push_to_stack(value);
    mcu.advance(2);
    TWO_CYCLES
}

pub fn pop(mcu: &mut Mcu) -> u32 {
    let value = mcu.pop_from_stack();
    mcu.write_direct(mcu.fetch(1), value);
    mcu.advance(2);
    TWO_CYCLES
}

pub fn swap(mcu: &mut Mcu) -> u32 {
    let a = mcu.acc();
    mcu.set_acc(a.rotate_left(4));
    mcu.advance(1);
    ONE_CYCLE
}

pub fn xch(mcu: &mut Mcu) -> u32 {
    let (operand, extra) = decode_operand(mcu.fetch(0), mcu.fetch(1));
    let value = mcu.load(operand);
    let a = mcu.acc();
    mcu.store(operand, a);
    mcu.set_acc(value);
    mcu.advance(1 + extra);
    ONE_CYCLE
}

pub fn xchd(mcu: &mut Mcu) -> u32 {
    let operand = AddressingMode::Indirect(Register::from_opcode(mcu.fetch(0) & 1));
    let value = mcu.load(operand);
    let a = mcu.acc();
    mcu.store(operand, (value & 0xF0) | (a & 0x0F));
    mcu.set_acc((a & 0xF0) | (value & 0x0F));
    mcu.advance(1);
    ONE_CYCLE
}

pub fn da(mcu: &mut Mcu) -> u32 {
    let psw = mcu.flags();
    let (value, carry) =
        decimal_adjust(mcu.acc(), psw.contains(PSW::CY), psw.contains(PSW::AC));
    mcu.set_acc(value);
    mcu.set_carry(carry);
    mcu.advance(1);
    ONE_CYCLE
}

pub fn clr_a(mcu: &mut Mcu) -> u32 {
    mcu.set_acc(0);
    mcu.advance(1);
    ONE_CYCLE
}

pub fn cpl_a(mcu: &mut Mcu) -> u32 {
    let a = mcu.acc();
    mcu.set_acc(!a);
    mcu.advance(1);
    ONE_CYCLE
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(0x00, 0x00, false, 0x00, false, false, false)]
    #[case(0x0F, 0x01, false, 0x10, false, true, false)]
    #[case(0x7F, 0x01, false, 0x80, false, true, true)]
    #[case(0x80, 0x80, false, 0x00, true, false, true)]
    #[case(0xFF, 0x01, false, 0x00, true, true, false)]
    #[case(0xFF, 0x00, true, 0x00, true, true, false)]
    #[case(0x3C, 0x42, true, 0x7F, false, false, false)]
    fn addition_flags(
        #[case] a: u8,
        #[case] b: u8,
        #[case] carry_in: bool,
        #[case] value: u8,
        #[case] carry: bool,
        #[case] aux_carry: bool,
        #[case] overflow: bool,
    ) {
        assert_eq!(
            add(a, b, carry_in),
            AluResult {
                value,
                carry,
                aux_carry,
                overflow
            }
        );
    }

    #[rstest]
    #[case(0x05, 0x03, false, 0x02, false, false, false)]
    #[case(0x00, 0x01, false, 0xFF, true, true, false)]
    #[case(0x10, 0x01, false, 0x0F, false, true, false)]
    #[case(0x80, 0x01, false, 0x7F, false, true, true)]
    #[case(0x7F, 0xFF, false, 0x80, true, false, true)]
    #[case(0x05, 0x05, true, 0xFF, true, true, false)]
    fn subtraction_flags(
        #[case] a: u8,
        #[case] b: u8,
        #[case] borrow_in: bool,
        #[case] value: u8,
        #[case] carry: bool,
        #[case] aux_carry: bool,
        #[case] overflow: bool,
    ) {
        assert_eq!(
            subtract(a, b, borrow_in),
            AluResult {
                value,
                carry,
                aux_carry,
                overflow
            }
        );
    }

    #[rstest]
    #[case(0x0A, false, false, 0x10, false)]
    #[case(0x9A, false, false, 0x00, true)]
    #[case(0x12, false, true, 0x18, false)]
    #[case(0x45, true, false, 0xA5, true)]
    #[case(0x99, false, false, 0x99, false)]
    #[case(0xA0, false, false, 0x00, true)]
    fn decimal_adjust_table(
        #[case] a: u8,
        #[case] carry_in: bool,
        #[case] aux_carry: bool,
        #[case] value: u8,
        #[case] carry: bool,
    ) {
        assert_eq!(decimal_adjust(a, carry_in, aux_carry), (value, carry));
    }

    #[test]
    fn relative_targets_wrap_backwards() {
        assert_eq!(relative(0x0102, 0xFE), 0x0100);
        assert_eq!(relative(0x0000, 0xFF), 0xFFFF);
        assert_eq!(relative(0x0010, 0x7F), 0x008F);
    }
}
