//! Extension points through which a host models peripherals and receives
//! diagnostics.
//!
//! Every hook is a strategy object owned by the [`Mcu`]. While a hook runs it
//! is detached from the core, so it can freely inspect and mutate the core it
//! is handed; accesses of the same kind made from inside the hook take the
//! built-in path. A hook may clear or replace itself, and that change sticks.

use std::fmt;

use crate::mcs51::cpu::Mcu;

/// Anomaly detected while executing firmware. Execution always continues
/// after the exception has been delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    Stack,
    AccToA,
    IretPswMismatch,
    IretSpMismatch,
    IretAccMismatch,
    IllegalOpcode,
}

impl Exception {
    /// Stable numeric code for hosts that bridge exceptions across an FFI.
    pub fn code(self) -> i32 {
        match self {
            Exception::Stack => 0,
            Exception::AccToA => 1,
            Exception::IretPswMismatch => 2,
            Exception::IretSpMismatch => 3,
            Exception::IretAccMismatch => 4,
            Exception::IllegalOpcode => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Exception> {
        match code {
            0 => Some(Exception::Stack),
            1 => Some(Exception::AccToA),
            2 => Some(Exception::IretPswMismatch),
            3 => Some(Exception::IretSpMismatch),
            4 => Some(Exception::IretAccMismatch),
            5 => Some(Exception::IllegalOpcode),
            _ => None,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Exception::Stack => {
                "SP exception: stack address > 127 with no upper memory, or SP roll over"
            }
            Exception::AccToA => "invalid operation: acc-to-a move",
            Exception::IretPswMismatch => "PSW not preserved over interrupt call",
            Exception::IretSpMismatch => "SP not preserved over interrupt call",
            Exception::IretAccMismatch => "ACC not preserved over interrupt call",
            Exception::IllegalOpcode => "invalid opcode: 0xA5 encountered",
        };
        f.write_str(message)
    }
}

pub trait ExceptionHook {
    fn exception(&mut self, mcu: &mut Mcu, exception: Exception);
}

impl<F> ExceptionHook for F
where
    F: FnMut(&mut Mcu, Exception),
{
    fn exception(&mut self, mcu: &mut Mcu, exception: Exception) {
        self(mcu, exception)
    }
}

/// Intercepts firmware access to the SFR bank. `register` is the bank index
/// (address minus 0x80). The defaults behave like plain storage.
pub trait SfrHook {
    fn read(&mut self, mcu: &mut Mcu, register: u8) -> u8 {
        mcu.peek_sfr(register)
    }

    fn write(&mut self, mcu: &mut Mcu, register: u8, value: u8) {
        mcu.poke_sfr(register, value)
    }
}

/// Intercepts MOVX traffic. The defaults go to the installed external memory.
pub trait XdataHook {
    fn read(&mut self, mcu: &mut Mcu, address: u16) -> u8 {
        mcu.peek_xdata(address)
    }

    fn write(&mut self, mcu: &mut Mcu, address: u16, value: u8) {
        mcu.poke_xdata(address, value)
    }
}

/// Storage for one installed hook.
///
/// A running hook is taken out of its slot. On return it goes back only if
/// the hook did not install a replacement or clear the slot meanwhile.
pub(crate) struct HookSlot<H: ?Sized> {
    hook: Option<Box<H>>,
    cleared: bool,
}

impl<H: ?Sized> HookSlot<H> {
    pub(crate) fn empty() -> HookSlot<H> {
        HookSlot {
            hook: None,
            cleared: false,
        }
    }

    pub(crate) fn install(&mut self, hook: Box<H>) {
        self.hook = Some(hook);
    }

    pub(crate) fn clear(&mut self) {
        self.hook = None;
        self.cleared = true;
    }

    pub(crate) fn take(&mut self) -> Option<Box<H>> {
        let hook = self.hook.take();
        if hook.is_some() {
            self.cleared = false;
        }
        hook
    }

    pub(crate) fn restore(&mut self, hook: Box<H>) {
        if self.hook.is_none() && !self.cleared {
            self.hook = Some(hook);
        }
    }
}
