use std::fmt;

use tracing::{debug, trace, warn};

use crate::error::ConfigError;
use crate::mcs51::config::MemoryConfig;
use crate::mcs51::hooks::{Exception, ExceptionHook, HookSlot, SfrHook, XdataHook};
use crate::mcs51::interrupt::{self, InterruptController};
use crate::mcs51::isa::{AddressingMode, Register};
use crate::mcs51::memory::{sfr_index, Address, Memory};
use crate::mcs51::opcodes::{lookup, Opcode, OPCODES};
use crate::mcs51::peripherals::timer;
use crate::mcs51::sfr::{
    PSW, REG_ACC, REG_B, REG_DPH, REG_DPL, REG_P0, REG_P1, REG_P2, REG_P3, REG_PSW, REG_SP,
};
use crate::mcs51::{assign_bit, get_bit, parity};

/// Clock ticks in one machine cycle.
pub const TICKS_PER_CYCLE: u32 = 12;

/// Where the tick engine stands between two calls to [`Mcu::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// The next tick crosses an instruction boundary.
    Ready,
    /// Ticks still owed to the instruction or service entry in flight.
    Waiting(u32),
}

/// One emulated MCS-51 core.
pub struct Mcu {
    memory: Memory,
    pc: u16,
    pending_ticks: u32,
    cycle_phase: u32,
    opcodes: &'static [Opcode; 256],
    interrupts: InterruptController,
    exception_hook: HookSlot<dyn ExceptionHook>,
    sfr_hook: HookSlot<dyn SfrHook>,
    xdata_hook: HookSlot<dyn XdataHook>,
}

impl fmt::Debug for Mcu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mcu")
            .field("pc", &self.pc)
            .field("acc", &self.acc())
            .field("psw", &self.psw())
            .field("sp", &self.sp())
            .field("dptr", &self.dptr())
            .field("state", &self.state())
            .field("interrupts", &self.interrupts)
            .finish()
    }
}

impl Mcu {
    /// Build a core with the given memory layout, already in the power-on
    /// reset state with all memory zeroed.
    pub fn new(config: MemoryConfig) -> Result<Mcu, ConfigError> {
        let mut mcu = Mcu {
            memory: Memory::new(&config)?,
            pc: 0,
            pending_ticks: 0,
            cycle_phase: 0,
            opcodes: &OPCODES,
            interrupts: InterruptController::new(),
            exception_hook: HookSlot::empty(),
            sfr_hook: HookSlot::empty(),
            xdata_hook: HookSlot::empty(),
        };
        mcu.reset(true);
        Ok(mcu)
    }

    /// Return to the power-on state. With `wipe` every memory region is
    /// zeroed as well; otherwise code and data survive. Installed hooks are
    /// kept.
    pub fn reset(&mut self, wipe: bool) {
        self.opcodes = &OPCODES;
        if wipe {
            self.memory.wipe();
        }
        *self.memory.sfr_bank_mut() = [0; 128];
        self.memory.set_sfr(REG_SP, 0x07);
        for port in [REG_P0, REG_P1, REG_P2, REG_P3] {
            self.memory.set_sfr(port, 0xFF);
        }
        self.pc = 0;
        self.pending_ticks = 0;
        self.cycle_phase = 0;
        self.interrupts.reset();
        debug!(wipe, "reset");
    }

    /// Advance by one clock tick. Returns true when this tick began a new
    /// instruction or interrupt service entry.
    pub fn tick(&mut self) -> bool {
        if self.pending_ticks > 0 {
            self.pending_ticks -= 1;
        }

        let boundary = self.pending_ticks == 0;
        if boundary {
            self.pending_ticks = self.dispatch();
            let acc = self.acc();
            self.update_psw(PSW::P, parity(acc));
        }

        self.cycle_phase += 1;
        if self.cycle_phase == TICKS_PER_CYCLE {
            self.cycle_phase = 0;
            timer::tick(self.memory.sfr_bank_mut());
        }
        boundary
    }

    // service entry or one instruction; returns its cost in ticks
    fn dispatch(&mut self) -> u32 {
        if let Some((source, priority)) = self.interrupts.poll(self.memory.sfr_bank()) {
            return interrupt::enter(self, source, priority);
        }

        let opcode = self.memory.code_byte(self.pc);
        trace!(pc = self.pc, opcode, "dispatch");
        (self.opcodes[opcode as usize].operation)(self)
    }

    /// Tick until the next boundary has been crossed. Returns the number of
    /// ticks that took.
    pub fn step(&mut self) -> u32 {
        let mut ticks = 1;
        while !self.tick() {
            ticks += 1;
        }
        ticks
    }

    pub fn state(&self) -> EngineState {
        match self.pending_ticks {
            0 => EngineState::Ready,
            n => EngineState::Waiting(n),
        }
    }

    /// Execute the instruction at the program counter right away, bypassing
    /// the tick counter and the interrupt controller. Returns its cost in
    /// ticks.
    pub fn do_operation(&mut self) -> u32 {
        let opcode = self.memory.code_byte(self.pc);
        let ticks = (lookup(opcode).operation)(self);
        let acc = self.acc();
        self.update_psw(PSW::P, parity(acc));
        ticks
    }

    /// Render the instruction at `position` into `buffer` and return its
    /// length in bytes.
    pub fn decode(&self, position: u16, buffer: &mut String) -> u16 {
        let opcode = self.memory.code_byte(position);
        (self.opcodes[opcode as usize].decoder)(self, position, buffer)
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    pub(crate) fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn acc(&self) -> u8 {
        self.memory.sfr(REG_ACC)
    }

    pub fn set_acc(&mut self, value: u8) {
        self.memory.set_sfr(REG_ACC, value)
    }

    pub fn b(&self) -> u8 {
        self.memory.sfr(REG_B)
    }

    pub fn set_b(&mut self, value: u8) {
        self.memory.set_sfr(REG_B, value)
    }

    pub fn psw(&self) -> u8 {
        self.memory.sfr(REG_PSW)
    }

    pub fn set_psw(&mut self, value: u8) {
        self.memory.set_sfr(REG_PSW, value)
    }

    pub fn sp(&self) -> u8 {
        self.memory.sfr(REG_SP)
    }

    pub fn set_sp(&mut self, value: u8) {
        self.memory.set_sfr(REG_SP, value)
    }

    pub fn dptr(&self) -> u16 {
        u16::from_le_bytes([self.memory.sfr(REG_DPL), self.memory.sfr(REG_DPH)])
    }

    pub fn set_dptr(&mut self, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.memory.set_sfr(REG_DPL, low);
        self.memory.set_sfr(REG_DPH, high);
    }

    pub fn flags(&self) -> PSW {
        PSW::from_bits_truncate(self.psw())
    }

    pub(crate) fn update_psw(&mut self, flag: PSW, set: bool) {
        let mut psw = self.flags();
        psw.set(flag, set);
        self.set_psw(psw.bits());
    }

    pub fn carry(&self) -> bool {
        self.flags().contains(PSW::CY)
    }

    pub fn set_carry(&mut self, carry: bool) {
        self.update_psw(PSW::CY, carry)
    }

    // active register bank base, 0x00/0x08/0x10/0x18
    fn bank(&self) -> u8 {
        self.psw() & (PSW::RS1 | PSW::RS0).bits()
    }

    /// Rn in the active register bank.
    pub fn register(&self, n: u8) -> u8 {
        self.memory.lower_data()[(self.bank() + (n & 7)) as usize]
    }

    pub fn set_register(&mut self, n: u8, value: u8) {
        let address = (self.bank() + (n & 7)) as usize;
        self.memory.lower_data_mut()[address] = value;
    }

    pub fn set_exception_hook(&mut self, hook: impl ExceptionHook + 'static) {
        self.exception_hook.install(Box::new(hook));
    }

    pub fn clear_exception_hook(&mut self) {
        self.exception_hook.clear();
    }

    pub fn set_sfr_hook(&mut self, hook: impl SfrHook + 'static) {
        self.sfr_hook.install(Box::new(hook));
    }

    pub fn clear_sfr_hook(&mut self) {
        self.sfr_hook.clear();
    }

    pub fn set_xdata_hook(&mut self, hook: impl XdataHook + 'static) {
        self.xdata_hook.install(Box::new(hook));
    }

    pub fn clear_xdata_hook(&mut self) {
        self.xdata_hook.clear();
    }

    /// Report an anomaly to the exception hook, or to the log when none is
    /// installed.
    pub fn raise(&mut self, exception: Exception) {
        match self.exception_hook.take() {
            Some(mut hook) => {
                hook.exception(self, exception);
                self.exception_hook.restore(hook);
            }
            None => warn!(pc = self.pc, code = exception.code(), "{}", exception),
        }
    }

    /// SFR read as firmware sees it. `register` is the bank index.
    pub fn read_sfr(&mut self, register: u8) -> u8 {
        match self.sfr_hook.take() {
            Some(mut hook) => {
                let value = hook.read(self, register);
                self.sfr_hook.restore(hook);
                value
            }
            None => self.peek_sfr(register),
        }
    }

    pub fn write_sfr(&mut self, register: u8, value: u8) {
        match self.sfr_hook.take() {
            Some(mut hook) => {
                hook.write(self, register, value);
                self.sfr_hook.restore(hook);
            }
            None => self.poke_sfr(register, value),
        }
    }

    /// Stored SFR byte, without going through the hook.
    pub fn peek_sfr(&self, register: u8) -> u8 {
        self.memory.sfr(register)
    }

    pub fn poke_sfr(&mut self, register: u8, value: u8) {
        self.memory.set_sfr(register, value)
    }

    /// MOVX read as firmware sees it.
    pub fn read_xdata(&mut self, address: u16) -> u8 {
        match self.xdata_hook.take() {
            Some(mut hook) => {
                let value = hook.read(self, address);
                self.xdata_hook.restore(hook);
                value
            }
            None => self.peek_xdata(address),
        }
    }

    pub fn write_xdata(&mut self, address: u16, value: u8) {
        match self.xdata_hook.take() {
            Some(mut hook) => {
                hook.write(self, address, value);
                self.xdata_hook.restore(hook);
            }
            None => self.poke_xdata(address, value),
        }
    }

    /// External memory byte, wrapped to the installed size. Reads 0xFF when
    /// no external memory is installed.
    pub fn peek_xdata(&self, address: u16) -> u8 {
        let xdata = self.memory.xdata();
        if xdata.is_empty() {
            0xFF
        } else {
            xdata[address as usize & (xdata.len() - 1)]
        }
    }

    pub fn poke_xdata(&mut self, address: u16, value: u8) {
        let xdata = self.memory.xdata_mut();
        if !xdata.is_empty() {
            let mask = xdata.len() - 1;
            xdata[address as usize & mask] = value;
        }
    }

    // direct addressing: lower RAM below 0x80, SFRs above
    pub(crate) fn read_direct(&mut self, address: u8) -> u8 {
        if address < 0x80 {
            self.memory.lower_data()[address as usize]
        } else {
            self.read_sfr(sfr_index(address))
        }
    }

    // the stored latch value, for read-modify-write instructions
    pub(crate) fn read_direct_latch(&self, address: u8) -> u8 {
        if address < 0x80 {
            self.memory.lower_data()[address as usize]
        } else {
            self.peek_sfr(sfr_index(address))
        }
    }

    pub(crate) fn write_direct(&mut self, address: u8, value: u8) {
        if address < 0x80 {
            self.memory.lower_data_mut()[address as usize] = value;
        } else {
            self.write_sfr(sfr_index(address), value);
        }
    }

    // indirect addressing: upper RAM above 0x80, open bus when absent
    pub(crate) fn read_indirect(&self, address: u8) -> u8 {
        self.memory
            .read(Address::InternalData(address))
            .unwrap_or(0xFF)
    }

    pub(crate) fn write_indirect(&mut self, address: u8, value: u8) {
        // writes to missing upper RAM go nowhere
        let _ = self.memory.write(Address::InternalData(address), value);
    }

    // perform a load using a particular addressing mode
    pub(crate) fn load(&mut self, mode: AddressingMode) -> u8 {
        match mode {
            AddressingMode::Immediate(imm8) => imm8,
            AddressingMode::Register(Register::A) => self.acc(),
            AddressingMode::Register(register) => self.register(register.index().unwrap_or(0)),
            AddressingMode::Direct(address) => self.read_direct(address),
            AddressingMode::Indirect(register) => {
                let address = self.register(register.index().unwrap_or(0));
                self.read_indirect(address)
            }
        }
    }

    // same as load, but direct SFR operands come from the latch
    pub(crate) fn load_latch(&mut self, mode: AddressingMode) -> u8 {
        match mode {
            AddressingMode::Direct(address) => self.read_direct_latch(address),
            _ => self.load(mode),
        }
    }

    // perform a store using an addressing mode
    pub(crate) fn store(&mut self, mode: AddressingMode, data: u8) {
        match mode {
            AddressingMode::Immediate(_) => {}
            AddressingMode::Register(Register::A) => self.set_acc(data),
            AddressingMode::Register(register) => {
                self.set_register(register.index().unwrap_or(0), data)
            }
            AddressingMode::Direct(address) => self.write_direct(address, data),
            AddressingMode::Indirect(register) => {
                let address = self.register(register.index().unwrap_or(0));
                self.write_indirect(address, data)
            }
        }
    }

    /// Bit read as firmware sees it; SFR bits go through the SFR hook.
    pub(crate) fn read_bit(&mut self, bit: u8) -> bool {
        let value = self.read_direct(bit_byte(bit));
        get_bit(value, bit & 7)
    }

    pub(crate) fn read_bit_latch(&self, bit: u8) -> bool {
        get_bit(self.read_direct_latch(bit_byte(bit)), bit & 7)
    }

    // read-modify-write of the latch byte holding `bit`
    pub(crate) fn write_bit(&mut self, bit: u8, set: bool) {
        let address = bit_byte(bit);
        let value = assign_bit(self.read_direct_latch(address), bit & 7, set);
        self.write_direct(address, value);
    }

    /// Push one byte, the way PUSH and CALL do.
    pub fn push_to_stack(&mut self, value: u8) {
        let sp = self.sp().wrapping_add(1);
        self.set_sp(sp);
        if sp == 0 {
            self.raise(Exception::Stack);
        }
        if self.memory.write(Address::InternalData(sp), value).is_err() {
            self.raise(Exception::Stack);
        }
    }

    pub fn pop_from_stack(&mut self) -> u8 {
        let sp = self.sp();
        let value = self.read_indirect(sp);
        self.set_sp(sp.wrapping_sub(1));
        if sp == 0 {
            self.raise(Exception::Stack);
        }
        value
    }

    // operand byte `offset` bytes after the opcode
    pub(crate) fn fetch(&self, offset: u16) -> u8 {
        self.memory.code_byte(self.pc.wrapping_add(offset))
    }

    pub(crate) fn advance(&mut self, length: u16) {
        self.pc = self.pc.wrapping_add(length);
    }
}

// byte address holding a bit: 0x20..=0x2F for bits below 0x80, otherwise
// the SFR whose address is the bit address rounded down to a multiple of 8
pub(crate) fn bit_byte(bit: u8) -> u8 {
    if bit < 0x80 {
        0x20 + (bit >> 3)
    } else {
        bit & 0xF8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcu(program: &[u8]) -> Mcu {
        let mut mcu = Mcu::new(MemoryConfig::default()).unwrap();
        mcu.memory_mut().code_mut()[..program.len()].copy_from_slice(program);
        mcu
    }

    #[test]
    fn reset_defaults() {
        let mcu = mcu(&[]);
        assert_eq!(mcu.pc(), 0);
        assert_eq!(mcu.sp(), 0x07);
        assert_eq!(mcu.peek_sfr(REG_P0), 0xFF);
        assert_eq!(mcu.peek_sfr(REG_P3), 0xFF);
        assert_eq!(mcu.acc(), 0);
        assert_eq!(mcu.state(), EngineState::Ready);
    }

    #[test]
    fn reset_without_wipe_keeps_memory() {
        let mut mcu = mcu(&[0x74, 0x55]);
        mcu.memory_mut().lower_data_mut()[0x30] = 0x99;
        mcu.step();
        mcu.reset(false);
        assert_eq!(mcu.memory().code()[0], 0x74);
        assert_eq!(mcu.memory().lower_data()[0x30], 0x99);
        assert_eq!(mcu.acc(), 0);

        mcu.reset(true);
        assert_eq!(mcu.memory().code()[0], 0);
        assert_eq!(mcu.memory().lower_data()[0x30], 0);
    }

    #[test]
    fn wipe_reaches_upper_and_external_data() {
        let mut mcu = mcu(&[]);
        mcu.memory_mut()
            .write(Address::InternalData(0x90), 0x55)
            .unwrap();
        mcu.write_xdata(0x1234, 0x66);

        mcu.reset(false);
        assert_eq!(mcu.memory().read(Address::InternalData(0x90)), Ok(0x55));
        assert_eq!(mcu.read_xdata(0x1234), 0x66);

        mcu.reset(true);
        assert_eq!(mcu.memory().read(Address::InternalData(0x90)), Ok(0));
        assert_eq!(mcu.memory().read(Address::ExternalData(0x1234)), Ok(0));
        assert_eq!(mcu.read_xdata(0x1234), 0);
    }

    #[test]
    fn bit_addresses() {
        assert_eq!(bit_byte(0x00), 0x20);
        assert_eq!(bit_byte(0x7F), 0x2F);
        assert_eq!(bit_byte(0xD7), 0xD0);
        assert_eq!(bit_byte(0xE3), 0xE0);
    }

    #[test]
    fn register_banks_follow_psw() {
        let mut mcu = mcu(&[]);
        mcu.set_register(0, 0x11);
        mcu.set_psw(PSW::RS0.bits());
        mcu.set_register(0, 0x22);
        mcu.set_psw((PSW::RS1 | PSW::RS0).bits());
        mcu.set_register(7, 0x33);
        assert_eq!(mcu.memory().lower_data()[0x00], 0x11);
        assert_eq!(mcu.memory().lower_data()[0x08], 0x22);
        assert_eq!(mcu.memory().lower_data()[0x1F], 0x33);
    }

    #[test]
    fn parity_tracks_accumulator_after_dispatch() {
        let mut mcu = mcu(&[0x74, 0x07, 0x74, 0x03]);
        mcu.step();
        assert!(mcu.flags().contains(PSW::P));
        mcu.step();
        assert!(!mcu.flags().contains(PSW::P));
    }

    #[test]
    fn indirect_upper_ram_is_open_bus_when_absent() {
        let mut mcu = Mcu::new(MemoryConfig {
            upper_data: false,
            ..MemoryConfig::default()
        })
        .unwrap();
        mcu.write_indirect(0x90, 0x12);
        assert_eq!(mcu.read_indirect(0x90), 0xFF);
    }
}
