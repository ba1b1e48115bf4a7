mod common;

use common::{load_at, mcu_with, record_exceptions, run};
use mcs51_emu::mcs51::sfr::{IE, IP, REG_IE, REG_IP, REG_TCON, REG_TH0, REG_TL0, REG_TMOD, TCON};
use mcs51_emu::{Exception, Mcu, Priority, TICKS_PER_CYCLE};

// main loop at 0x100: NOP ; SJMP back
fn with_main_loop(mcu: &mut Mcu) {
    load_at(mcu, 0, &[0x02, 0x01, 0x00]);
    load_at(mcu, 0x100, &[0x00, 0x80, 0xFD]);
}

fn enable(mcu: &mut Mcu, ie: IE, ip: IP) {
    mcu.poke_sfr(REG_IE, (IE::EA | ie).bits());
    mcu.poke_sfr(REG_IP, ip.bits());
}

fn request(mcu: &mut Mcu, flags: TCON) {
    let tcon = mcu.peek_sfr(REG_TCON) | flags.bits();
    mcu.poke_sfr(REG_TCON, tcon);
}

#[test]
fn service_routine_that_preserves_state_is_silent() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    // PUSH ACC ; PUSH PSW ; MOV A,#0FFh ; ADD A,#01h ; POP PSW ; POP ACC ; RETI
    load_at(
        &mut mcu,
        0x0B,
        &[0xC0, 0xE0, 0xC0, 0xD0, 0x74, 0xFF, 0x24, 0x01, 0xD0, 0xD0, 0xD0, 0xE0, 0x32],
    );
    let seen = record_exceptions(&mut mcu);
    enable(&mut mcu, IE::ET0, IP::empty());
    run(&mut mcu, 2);

    request(&mut mcu, TCON::TF0);
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x0B);
    assert_eq!(mcu.interrupts().active(), Some(Priority::Low));
    assert_eq!(mcu.peek_sfr(REG_TCON) & TCON::TF0.bits(), 0);

    run(&mut mcu, 7);
    assert_eq!(mcu.interrupts().active(), None);
    assert!(seen.borrow().is_empty());
    assert!(mcu.pc() >= 0x100 && mcu.pc() <= 0x102);
    assert_eq!(mcu.sp(), 0x07);
}

#[test]
fn unbalanced_push_reports_sp_mismatch_only() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    // PUSH ACC ; RETI
    load_at(&mut mcu, 0x0B, &[0xC0, 0xE0, 0x32]);
    let seen = record_exceptions(&mut mcu);
    enable(&mut mcu, IE::ET0, IP::empty());
    run(&mut mcu, 1);

    request(&mut mcu, TCON::TF0);
    run(&mut mcu, 3);
    assert_eq!(*seen.borrow(), vec![Exception::IretSpMismatch]);
}

#[test]
fn clobbered_accumulator_and_psw_are_reported() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    // MOV A,#0FFh ; ADD A,#01h ; RETI
    load_at(&mut mcu, 0x0B, &[0x74, 0xFF, 0x24, 0x01, 0x32]);
    let seen = record_exceptions(&mut mcu);
    enable(&mut mcu, IE::ET0, IP::empty());
    mcu.set_acc(0x10);
    run(&mut mcu, 1);

    request(&mut mcu, TCON::TF0);
    run(&mut mcu, 4);
    assert_eq!(
        *seen.borrow(),
        vec![Exception::IretAccMismatch, Exception::IretPswMismatch]
    );
}

#[test]
fn parity_and_user_flags_are_not_checked() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    // CPL PSW.5 (F0) ; CPL PSW.1 (F1) ; RETI
    load_at(&mut mcu, 0x0B, &[0xB2, 0xD5, 0xB2, 0xD1, 0x32]);
    let seen = record_exceptions(&mut mcu);
    enable(&mut mcu, IE::ET0, IP::empty());
    run(&mut mcu, 1);

    request(&mut mcu, TCON::TF0);
    run(&mut mcu, 4);
    assert!(seen.borrow().is_empty());
}

#[test]
fn high_priority_request_preempts_low_service() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    // timer 0 service at 0x0B: NOP ; NOP ; RETI
    load_at(&mut mcu, 0x0B, &[0x00, 0x00, 0x32]);
    // INT1 service at 0x13: RETI
    load_at(&mut mcu, 0x13, &[0x32]);
    enable(&mut mcu, IE::ET0 | IE::EX1, IP::PX1);
    run(&mut mcu, 1);

    request(&mut mcu, TCON::TF0);
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x0B);
    assert_eq!(mcu.interrupts().active(), Some(Priority::Low));

    request(&mut mcu, TCON::IT1 | TCON::IE1);
    assert_eq!(mcu.step(), 2 * TICKS_PER_CYCLE);
    assert_eq!(mcu.pc(), 0x13);
    assert_eq!(mcu.interrupts().active(), Some(Priority::High));
    assert!(mcu.interrupts().level(Priority::Low).active);
    assert_eq!(mcu.peek_sfr(REG_TCON) & TCON::IE1.bits(), 0);

    // RETI back into the low service, which then runs one instruction
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x0B);
    assert_eq!(mcu.interrupts().active(), Some(Priority::Low));
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x0C);
}

#[test]
fn low_request_waits_for_low_service_to_finish() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    // timer 0 service: NOP ; RETI
    load_at(&mut mcu, 0x0B, &[0x00, 0x32]);
    // INT0 service: RETI
    load_at(&mut mcu, 0x03, &[0x32]);
    enable(&mut mcu, IE::ET0 | IE::EX0, IP::empty());
    run(&mut mcu, 1);

    request(&mut mcu, TCON::TF0);
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x0B);

    request(&mut mcu, TCON::IT0 | TCON::IE0);
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x0C);
    // RETI, then one main-loop instruction before INT0 is taken
    run(&mut mcu, 1);
    let resumed = mcu.pc();
    assert!(resumed >= 0x100);
    run(&mut mcu, 1);
    assert_ne!(mcu.pc(), 0x03);
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x03);
}

#[test]
fn level_triggered_int0_is_not_cleared_by_hardware() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    load_at(&mut mcu, 0x03, &[0x32]);
    enable(&mut mcu, IE::EX0, IP::empty());
    run(&mut mcu, 1);
    request(&mut mcu, TCON::IE0);
    run(&mut mcu, 1);
    assert_eq!(mcu.pc(), 0x03);
    assert_ne!(mcu.peek_sfr(REG_TCON) & TCON::IE0.bits(), 0);
}

#[test]
fn timer_overflow_raises_its_interrupt() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    load_at(&mut mcu, 0x0B, &[0x32]);
    enable(&mut mcu, IE::ET0, IP::empty());
    mcu.poke_sfr(REG_TMOD, 0x01);
    mcu.poke_sfr(REG_TL0, 0xFE);
    mcu.poke_sfr(REG_TH0, 0xFF);
    mcu.poke_sfr(REG_TCON, TCON::TR0.bits());

    let mut vectored = false;
    for _ in 0..20 {
        mcu.step();
        if mcu.pc() == 0x0B {
            vectored = true;
            break;
        }
    }
    assert!(vectored);
    assert_eq!(mcu.peek_sfr(REG_TCON) & TCON::TF0.bits(), 0);
}

#[test]
fn nothing_is_taken_without_ea() {
    let mut mcu = mcu_with(&[]);
    with_main_loop(&mut mcu);
    mcu.poke_sfr(REG_IE, IE::ET0.bits());
    request(&mut mcu, TCON::TF0);
    run(&mut mcu, 10);
    assert!(mcu.pc() >= 0x100);
    assert_eq!(mcu.interrupts().active(), None);
}
