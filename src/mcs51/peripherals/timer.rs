use crate::mcs51::get_bit;
use crate::mcs51::sfr::{
    REG_P3, REG_TCON, REG_TH0, REG_TH1, REG_TL0, REG_TL1, REG_TMOD, TCON, TMOD,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerMode {
    Mode13Bit,
    Mode16Bit,
    Mode8BitAutoReload,
    ModeSplit,
}

impl TMOD {
    pub fn timer0_mode(&self) -> TimerMode {
        match self.bits() & (TMOD::T0_M1 | TMOD::T0_M0).bits() {
            0 => TimerMode::Mode13Bit,
            1 => TimerMode::Mode16Bit,
            2 => TimerMode::Mode8BitAutoReload,
            _ => TimerMode::ModeSplit,
        }
    }

    pub fn timer1_mode(&self) -> TimerMode {
        match self.bits() & (TMOD::T1_M1 | TMOD::T1_M0).bits() {
            0x00 => TimerMode::Mode13Bit,
            0x10 => TimerMode::Mode16Bit,
            0x20 => TimerMode::Mode8BitAutoReload,
            _ => TimerMode::ModeSplit,
        }
    }
}

// INT0 and INT1 pins as seen in the P3 latch
const P3_INT0: u8 = 2;
const P3_INT1: u8 = 3;

/// Count one machine cycle on a low/high register pair. Returns true on
/// overflow.
fn count(low: &mut u8, high: &mut u8, mode: TimerMode) -> bool {
    match mode {
        TimerMode::Mode13Bit => {
            let lower = (*low & 0x1f) + 1;
            let mut overflow = false;
            if lower == 32 {
                *high = match high.checked_add(1) {
                    Some(v) => v,
                    None => {
                        overflow = true;
                        0
                    }
                };
            }
            *low = lower & 0x1f;
            overflow
        }
        TimerMode::Mode16Bit => {
            let value = u16::from_le_bytes([*low, *high]);
            let (next, overflow) = match value.checked_add(1) {
                Some(v) => (v, false),
                None => (0, true),
            };
            let bytes = next.to_le_bytes();
            *low = bytes[0];
            *high = bytes[1];
            overflow
        }
        TimerMode::Mode8BitAutoReload => match low.checked_add(1) {
            Some(v) => {
                *low = v;
                false
            }
            None => {
                *low = *high;
                true
            }
        },
        // split mode halves are handled by the caller
        TimerMode::ModeSplit => false,
    }
}

fn count8(value: &mut u8) -> bool {
    match value.checked_add(1) {
        Some(v) => {
            *value = v;
            false
        }
        None => {
            *value = 0;
            true
        }
    }
}

/// Advance timers 0 and 1 by one machine cycle, straight on the SFR bank.
///
/// A timer runs while its TRx bit is set and C/T is clear. With GATE set it
/// additionally needs its INTx pin high. When timer 0 is in split mode, TH0
/// borrows TR1 and TF1 and timer 1 keeps counting without raising a flag.
/// Timer 1 in mode 3 is stopped.
pub fn tick(sfr: &mut [u8; 128]) {
    let mut tcon = TCON::from_bits_truncate(sfr[REG_TCON as usize]);
    let tmod = TMOD::from_bits_truncate(sfr[REG_TMOD as usize]);
    let p3 = sfr[REG_P3 as usize];

    let gate0 = !tmod.contains(TMOD::T0_GATE) || get_bit(p3, P3_INT0);
    let gate1 = !tmod.contains(TMOD::T1_GATE) || get_bit(p3, P3_INT1);
    let run0 = tcon.contains(TCON::TR0) && !tmod.contains(TMOD::T0_CT) && gate0;
    let run1 = tcon.contains(TCON::TR1) && !tmod.contains(TMOD::T1_CT) && gate1;

    let mut tl0 = sfr[REG_TL0 as usize];
    let mut th0 = sfr[REG_TH0 as usize];
    let split = tmod.timer0_mode() == TimerMode::ModeSplit;

    if split {
        if run0 && count8(&mut tl0) {
            tcon.insert(TCON::TF0);
        }
        if tcon.contains(TCON::TR1) && count8(&mut th0) {
            tcon.insert(TCON::TF1);
        }
    } else if run0 && count(&mut tl0, &mut th0, tmod.timer0_mode()) {
        tcon.insert(TCON::TF0);
    }

    let mut tl1 = sfr[REG_TL1 as usize];
    let mut th1 = sfr[REG_TH1 as usize];
    let mode1 = tmod.timer1_mode();
    if mode1 != TimerMode::ModeSplit {
        if split {
            if !tmod.contains(TMOD::T1_CT) && gate1 {
                count(&mut tl1, &mut th1, mode1);
            }
        } else if run1 && count(&mut tl1, &mut th1, mode1) {
            tcon.insert(TCON::TF1);
        }
    }

    sfr[REG_TL0 as usize] = tl0;
    sfr[REG_TH0 as usize] = th0;
    sfr[REG_TL1 as usize] = tl1;
    sfr[REG_TH1 as usize] = th1;
    sfr[REG_TCON as usize] = tcon.bits();
}
