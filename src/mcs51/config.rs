//! Memory layout of one core.
//!
//! Layouts are usually picked from a derivative preset
//! ([`crate::mcs51::soc::ch55x`]) but can also be deserialized from a host
//! configuration file; missing fields fall back to the 8052 defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

mod defaults {
    /// Full 16-bit code space.
    pub const CODE_SIZE: usize = 64 * 1024;

    /// Full 16-bit external data space.
    pub const XDATA_SIZE: usize = 64 * 1024;

    /// Smallest code memory accepted.
    pub const MIN_CODE_SIZE: usize = 1024;

    /// Largest region addressable with a 16-bit pointer.
    pub const MAX_SIZE: usize = 64 * 1024;
}

pub use defaults::{MAX_SIZE, MIN_CODE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Bytes of code memory, a power of two in 1 KiB..=64 KiB.
    #[serde(default = "MemoryConfig::default_code_size")]
    pub code_size: usize,

    /// Bytes of external data memory, zero or a power of two up to 64 KiB.
    /// Zero means every MOVX access is only visible to the external-data hook.
    #[serde(default = "MemoryConfig::default_xdata_size")]
    pub xdata_size: usize,

    /// Whether the upper 128 bytes of internal data exist (8052 layout).
    #[serde(default = "MemoryConfig::default_upper_data")]
    pub upper_data: bool,
}

impl MemoryConfig {
    fn default_code_size() -> usize {
        defaults::CODE_SIZE
    }

    fn default_xdata_size() -> usize {
        defaults::XDATA_SIZE
    }

    fn default_upper_data() -> bool {
        true
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.code_size.is_power_of_two()
            || self.code_size < defaults::MIN_CODE_SIZE
            || self.code_size > defaults::MAX_SIZE
        {
            return Err(ConfigError::CodeSize(self.code_size));
        }
        if self.xdata_size != 0
            && (!self.xdata_size.is_power_of_two() || self.xdata_size > defaults::MAX_SIZE)
        {
            return Err(ConfigError::XdataSize(self.xdata_size));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            code_size: defaults::CODE_SIZE,
            xdata_size: defaults::XDATA_SIZE,
            upper_data: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn default_is_a_full_8052() {
        let config = MemoryConfig::default();
        assert_eq!(config.code_size, 0x10000);
        assert_eq!(config.xdata_size, 0x10000);
        assert!(config.upper_data);
        assert_eq!(config.validate(), Ok(()));
    }

    #[rstest]
    #[case(512, 0, Err(ConfigError::CodeSize(512)))]
    #[case(3000, 0, Err(ConfigError::CodeSize(3000)))]
    #[case(128 * 1024, 0, Err(ConfigError::CodeSize(128 * 1024)))]
    #[case(1024, 100, Err(ConfigError::XdataSize(100)))]
    #[case(1024, 128 * 1024, Err(ConfigError::XdataSize(128 * 1024)))]
    #[case(1024, 0, Ok(()))]
    #[case(16 * 1024, 1024, Ok(()))]
    fn validation(
        #[case] code_size: usize,
        #[case] xdata_size: usize,
        #[case] expected: Result<(), ConfigError>,
    ) {
        let config = MemoryConfig {
            code_size,
            xdata_size,
            upper_data: false,
        };
        assert_eq!(config.validate(), expected);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: MemoryConfig = serde_json::from_str(r#"{ "code_size": 16384 }"#).unwrap();
        assert_eq!(config.code_size, 16384);
        assert_eq!(config.xdata_size, 0x10000);
        assert!(config.upper_data);
    }
}
