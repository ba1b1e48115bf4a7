//! WCH CH55x derivatives.
//!
//! Each part has 256 bytes of internal data (so the upper half is always
//! present) and on-chip xRAM. Parts whose nominal flash or xRAM size is not
//! a power of two get the next power up, which keeps address wrap-around
//! cheap and leaves the extra bytes unused by well-behaved firmware.

use tracing::debug;

use crate::error::ConfigError;
use crate::mcs51::config::MemoryConfig;
use crate::mcs51::cpu::Mcu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Ch551,
    Ch552,
    Ch554,
    Ch555,
    Ch557,
    Ch558,
    Ch559,
}

impl Variant {
    pub const ALL: [Variant; 7] = [
        Variant::Ch551,
        Variant::Ch552,
        Variant::Ch554,
        Variant::Ch555,
        Variant::Ch557,
        Variant::Ch558,
        Variant::Ch559,
    ];

    /// Part by the last digit of its name, e.g. 2 for CH552.
    pub fn from_number(number: u8) -> Option<Variant> {
        match number {
            1 => Some(Variant::Ch551),
            2 => Some(Variant::Ch552),
            4 => Some(Variant::Ch554),
            5 => Some(Variant::Ch555),
            7 => Some(Variant::Ch557),
            8 => Some(Variant::Ch558),
            9 => Some(Variant::Ch559),
            _ => None,
        }
    }

    // nominal (flash, xram) in bytes as listed in the datasheets
    fn nominal(self) -> (usize, usize) {
        match self {
            Variant::Ch551 => (10 * 1024, 512),
            Variant::Ch552 => (16 * 1024, 1024),
            Variant::Ch554 => (16 * 1024, 1024),
            Variant::Ch555 => (32 * 1024, 1024),
            Variant::Ch557 => (64 * 1024, 4 * 1024),
            Variant::Ch558 => (40 * 1024, 4 * 1024),
            Variant::Ch559 => (64 * 1024, 6 * 1024),
        }
    }

    pub fn memory_config(self) -> MemoryConfig {
        let (code, xdata) = self.nominal();
        MemoryConfig {
            code_size: code.next_power_of_two(),
            xdata_size: xdata.next_power_of_two(),
            upper_data: true,
        }
    }
}

pub fn create(variant: Variant) -> Result<Mcu, ConfigError> {
    let config = variant.memory_config();
    debug!(?variant, ?config, "creating core");
    Mcu::new(config)
}
