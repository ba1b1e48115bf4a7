//! Two-level interrupt controller.
//!
//! Sources are polled at every dispatch boundary in their natural order.
//! A high-priority request preempts an active low-priority service; nothing
//! preempts an active high-priority service. Each level remembers ACC, PSW
//! and SP as they were right after the return address was pushed, so that
//! RETI can report a service routine that failed to restore them.

use tracing::debug;

use crate::mcs51::cpu::{Mcu, TICKS_PER_CYCLE};
use crate::mcs51::hooks::Exception;
use crate::mcs51::sfr::{
    IE, IP, PSW_PRESERVED, REG_IE, REG_IP, REG_SCON, REG_T2CON, REG_TCON, SCON, T2CON, TCON,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    High,
}

/// Registers captured when a service routine is entered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Shadow {
    pub acc: u8,
    pub psw: u8,
    pub sp: u8,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub active: bool,
    pub shadow: Shadow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    External0,
    Timer0,
    External1,
    Timer1,
    Serial,
    Timer2,
}

impl Source {
    /// Polling order, which is also the order of precedence within a level.
    pub const ALL: [Source; 6] = [
        Source::External0,
        Source::Timer0,
        Source::External1,
        Source::Timer1,
        Source::Serial,
        Source::Timer2,
    ];

    pub fn vector(self) -> u16 {
        match self {
            Source::External0 => 0x03,
            Source::Timer0 => 0x0B,
            Source::External1 => 0x13,
            Source::Timer1 => 0x1B,
            Source::Serial => 0x23,
            Source::Timer2 => 0x2B,
        }
    }

    fn enable(self) -> IE {
        match self {
            Source::External0 => IE::EX0,
            Source::Timer0 => IE::ET0,
            Source::External1 => IE::EX1,
            Source::Timer1 => IE::ET1,
            Source::Serial => IE::ES,
            Source::Timer2 => IE::ET2,
        }
    }

    fn priority(self) -> IP {
        match self {
            Source::External0 => IP::PX0,
            Source::Timer0 => IP::PT0,
            Source::External1 => IP::PX1,
            Source::Timer1 => IP::PT1,
            Source::Serial => IP::PS,
            Source::Timer2 => IP::PT2,
        }
    }

    /// Whether the request flag of this source is raised in the SFR bank.
    pub fn requested(self, sfr: &[u8; 128]) -> bool {
        let tcon = TCON::from_bits_truncate(sfr[REG_TCON as usize]);
        match self {
            Source::External0 => tcon.contains(TCON::IE0),
            Source::Timer0 => tcon.contains(TCON::TF0),
            Source::External1 => tcon.contains(TCON::IE1),
            Source::Timer1 => tcon.contains(TCON::TF1),
            Source::Serial => SCON::from_bits_truncate(sfr[REG_SCON as usize])
                .intersects(SCON::RI | SCON::TI),
            Source::Timer2 => T2CON::from_bits_truncate(sfr[REG_T2CON as usize])
                .intersects(T2CON::TF2 | T2CON::EXF2),
        }
    }

    // flags the hardware clears itself when vectoring
    fn acknowledge(self, sfr: &mut [u8; 128]) {
        let mut tcon = TCON::from_bits_truncate(sfr[REG_TCON as usize]);
        match self {
            Source::External0 if tcon.contains(TCON::IT0) => tcon.remove(TCON::IE0),
            Source::Timer0 => tcon.remove(TCON::TF0),
            Source::External1 if tcon.contains(TCON::IT1) => tcon.remove(TCON::IE1),
            Source::Timer1 => tcon.remove(TCON::TF1),
            _ => return,
        }
        sfr[REG_TCON as usize] = tcon.bits();
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InterruptController {
    low: Level,
    high: Level,
    hold_off: bool,
}

impl InterruptController {
    pub fn new() -> InterruptController {
        InterruptController::default()
    }

    pub fn reset(&mut self) {
        *self = InterruptController::default();
    }

    pub fn level(&self, priority: Priority) -> &Level {
        match priority {
            Priority::Low => &self.low,
            Priority::High => &self.high,
        }
    }

    fn level_mut(&mut self, priority: Priority) -> &mut Level {
        match priority {
            Priority::Low => &mut self.low,
            Priority::High => &mut self.high,
        }
    }

    /// Innermost active service level.
    pub fn active(&self) -> Option<Priority> {
        if self.high.active {
            Some(Priority::High)
        } else if self.low.active {
            Some(Priority::Low)
        } else {
            None
        }
    }

    /// Source that should be serviced now, given the current SFR state.
    pub fn select(&self, sfr: &[u8; 128]) -> Option<(Source, Priority)> {
        let ie = IE::from_bits_truncate(sfr[REG_IE as usize]);
        let ip = IP::from_bits_truncate(sfr[REG_IP as usize]);
        if !ie.contains(IE::EA) || self.high.active {
            return None;
        }

        let mut pending = Source::ALL
            .iter()
            .copied()
            .filter(|s| ie.contains(s.enable()) && s.requested(sfr));

        let high = pending.clone().find(|s| ip.contains(s.priority()));
        if let Some(source) = high {
            return Some((source, Priority::High));
        }
        if self.low.active {
            return None;
        }
        pending.next().map(|source| (source, Priority::Low))
    }

    // decision taken at a dispatch boundary
    pub(crate) fn poll(&mut self, sfr: &[u8; 128]) -> Option<(Source, Priority)> {
        if self.hold_off {
            self.hold_off = false;
            return None;
        }
        self.select(sfr)
    }
}

/// Vector to `source`: push the return address, jump, acknowledge and take
/// the shadow snapshot. Returns the cost in ticks.
pub(crate) fn enter(mcu: &mut Mcu, source: Source, priority: Priority) -> u32 {
    let pc = mcu.pc();
    mcu.push_to_stack((pc & 0xFF) as u8);
    mcu.push_to_stack((pc >> 8) as u8);
    mcu.set_pc(source.vector());
    source.acknowledge(mcu.memory_mut().sfr_bank_mut());

    let shadow = Shadow {
        acc: mcu.acc(),
        psw: mcu.psw(),
        sp: mcu.sp(),
    };
    let level = mcu.interrupts_mut().level_mut(priority);
    level.active = true;
    level.shadow = shadow;

    debug!(
        ?source,
        ?priority,
        return_address = pc,
        "entering interrupt service"
    );
    2 * TICKS_PER_CYCLE
}

/// RETI: leave the innermost active level, report anything the service
/// routine failed to restore, then return.
pub(crate) fn leave(mcu: &mut Mcu) {
    if let Some(priority) = mcu.interrupts().active() {
        let level = mcu.interrupts_mut().level_mut(priority);
        level.active = false;
        let shadow = level.shadow;

        if mcu.acc() != shadow.acc {
            mcu.raise(Exception::IretAccMismatch);
        }
        if mcu.sp() != shadow.sp {
            mcu.raise(Exception::IretSpMismatch);
        }
        if (mcu.psw() ^ shadow.psw) & PSW_PRESERVED.bits() != 0 {
            mcu.raise(Exception::IretPswMismatch);
        }
        debug!(?priority, "leaving interrupt service");
    }

    let high = mcu.pop_from_stack() as u16;
    let low = mcu.pop_from_stack() as u16;
    mcu.set_pc((high << 8) | low);
    mcu.interrupts_mut().hold_off = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(ie: IE, ip: IP, tcon: TCON) -> [u8; 128] {
        let mut sfr = [0u8; 128];
        sfr[REG_IE as usize] = ie.bits();
        sfr[REG_IP as usize] = ip.bits();
        sfr[REG_TCON as usize] = tcon.bits();
        sfr
    }

    #[test]
    fn nothing_without_ea() {
        let controller = InterruptController::new();
        let sfr = bank(IE::ET0, IP::empty(), TCON::TF0);
        assert_eq!(controller.select(&sfr), None);
    }

    #[test]
    fn high_priority_wins_over_natural_order() {
        let controller = InterruptController::new();
        let sfr = bank(IE::EA | IE::EX0 | IE::ET1, IP::PT1, TCON::IE0 | TCON::TF1);
        assert_eq!(
            controller.select(&sfr),
            Some((Source::Timer1, Priority::High))
        );
    }

    #[test]
    fn natural_order_within_a_level() {
        let controller = InterruptController::new();
        let sfr = bank(IE::EA | IE::ET0 | IE::EX1, IP::empty(), TCON::TF0 | TCON::IE1);
        assert_eq!(controller.select(&sfr), Some((Source::Timer0, Priority::Low)));
    }

    #[test]
    fn active_levels_block() {
        let mut controller = InterruptController::new();
        controller.low.active = true;
        let low_only = bank(IE::EA | IE::ET0, IP::empty(), TCON::TF0);
        assert_eq!(controller.select(&low_only), None);

        let high = bank(IE::EA | IE::ET0, IP::PT0, TCON::TF0);
        assert_eq!(controller.select(&high), Some((Source::Timer0, Priority::High)));

        controller.high.active = true;
        assert_eq!(controller.select(&high), None);
        assert_eq!(controller.active(), Some(Priority::High));
    }

    #[test]
    fn hold_off_skips_one_boundary() {
        let mut controller = InterruptController::new();
        controller.hold_off = true;
        let sfr = bank(IE::EA | IE::ET0, IP::empty(), TCON::TF0);
        assert_eq!(controller.poll(&sfr), None);
        assert_eq!(controller.poll(&sfr), Some((Source::Timer0, Priority::Low)));
    }

    #[test]
    fn level_triggered_external_flag_survives_acknowledge() {
        let mut sfr = bank(IE::empty(), IP::empty(), TCON::IE0 | TCON::TF0);
        Source::External0.acknowledge(&mut sfr);
        Source::Timer0.acknowledge(&mut sfr);
        assert_eq!(sfr[REG_TCON as usize], TCON::IE0.bits());

        sfr[REG_TCON as usize] = (TCON::IT1 | TCON::IE1).bits();
        Source::External1.acknowledge(&mut sfr);
        assert_eq!(sfr[REG_TCON as usize], TCON::IT1.bits());
    }
}
