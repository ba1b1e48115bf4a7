//! Cycle-accurate MCS-51 instruction-set simulator.
//!
//! The [`Mcu`] owns every memory region of one emulated core and advances in
//! ticks of 1/12 machine cycle. Peripheral models plug in through the hooks
//! in [`mcs51::hooks`]; firmware images are loaded with [`ihex`].

pub mod error;
pub mod ihex;
pub mod mcs51;

pub use error::{ConfigError, LoadError, MemoryError};
pub use mcs51::config::MemoryConfig;
pub use mcs51::cpu::{EngineState, Mcu, TICKS_PER_CYCLE};
pub use mcs51::hooks::{Exception, ExceptionHook, SfrHook, XdataHook};
pub use mcs51::interrupt::{Priority, Shadow, Source};
pub use mcs51::memory::Address;
