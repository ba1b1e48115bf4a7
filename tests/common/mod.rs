//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use mcs51_emu::{Exception, Mcu, MemoryConfig};

/// Core with the default 8052 layout and `program` at address 0.
pub fn mcu_with(program: &[u8]) -> Mcu {
    let mut mcu = Mcu::new(MemoryConfig::default()).expect("default layout is valid");
    load_at(&mut mcu, 0, program);
    mcu
}

pub fn load_at(mcu: &mut Mcu, address: usize, program: &[u8]) {
    mcu.memory_mut().code_mut()[address..address + program.len()].copy_from_slice(program);
}

/// Install an exception hook that records every exception raised.
pub fn record_exceptions(mcu: &mut Mcu) -> Rc<RefCell<Vec<Exception>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    mcu.set_exception_hook(move |_: &mut Mcu, exception: Exception| {
        sink.borrow_mut().push(exception)
    });
    seen
}

/// Run `count` instructions (or service entries).
pub fn run(mcu: &mut Mcu, count: usize) {
    for _ in 0..count {
        mcu.step();
    }
}
