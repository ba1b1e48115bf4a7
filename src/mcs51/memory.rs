use crate::error::{ConfigError, MemoryError};
use crate::mcs51::config::MemoryConfig;

/// A location in one of the address spaces of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Code(u16),
    ExternalData(u16),
    InternalData(u8),
    SpecialFunctionRegister(u8),
}

// architectural SFR address (0x80..=0xFF) to bank index
pub fn sfr_index(address: u8) -> u8 {
    address.wrapping_sub(0x80) & 0x7F
}

// bank index back to architectural address
pub fn sfr_address(index: u8) -> u8 {
    index | 0x80
}

/// Every byte region owned by one core.
///
/// Internal data below 0x80 always exists. The upper 128 bytes exist only on
/// 8052-style parts and are reachable through indirect addressing, while
/// direct addresses 0x80..=0xFF select the SFR bank instead.
#[derive(Debug, Clone)]
pub struct Memory {
    code: Vec<u8>,
    xdata: Vec<u8>,
    lower: [u8; 128],
    upper: Option<Box<[u8; 128]>>,
    sfr: [u8; 128],
}

impl Memory {
    /// Allocate zeroed regions for a validated layout.
    pub fn new(config: &MemoryConfig) -> Result<Memory, ConfigError> {
        config.validate()?;
        Ok(Memory {
            code: vec![0; config.code_size],
            xdata: vec![0; config.xdata_size],
            lower: [0; 128],
            upper: if config.upper_data {
                Some(Box::new([0; 128]))
            } else {
                None
            },
            sfr: [0; 128],
        })
    }

    pub fn read(&self, address: Address) -> Result<u8, MemoryError> {
        match address {
            Address::Code(a) => self
                .code
                .get(a as usize)
                .copied()
                .ok_or(MemoryError::OutOfRange(address)),
            Address::ExternalData(a) => {
                if self.xdata.is_empty() {
                    return Err(MemoryError::Absent(address));
                }
                self.xdata
                    .get(a as usize)
                    .copied()
                    .ok_or(MemoryError::OutOfRange(address))
            }
            Address::InternalData(a) => {
                if a < 0x80 {
                    Ok(self.lower[a as usize])
                } else {
                    match &self.upper {
                        Some(upper) => Ok(upper[(a & 0x7F) as usize]),
                        None => Err(MemoryError::Absent(address)),
                    }
                }
            }
            Address::SpecialFunctionRegister(index) => self
                .sfr
                .get(index as usize)
                .copied()
                .ok_or(MemoryError::OutOfRange(address)),
        }
    }

    pub fn write(&mut self, address: Address, data: u8) -> Result<(), MemoryError> {
        let slot = match address {
            Address::Code(a) => self.code.get_mut(a as usize),
            Address::ExternalData(a) => {
                if self.xdata.is_empty() {
                    return Err(MemoryError::Absent(address));
                }
                self.xdata.get_mut(a as usize)
            }
            Address::InternalData(a) => {
                if a < 0x80 {
                    self.lower.get_mut(a as usize)
                } else {
                    match &mut self.upper {
                        Some(upper) => upper.get_mut((a & 0x7F) as usize),
                        None => return Err(MemoryError::Absent(address)),
                    }
                }
            }
            Address::SpecialFunctionRegister(index) => self.sfr.get_mut(index as usize),
        };

        match slot {
            Some(byte) => {
                *byte = data;
                Ok(())
            }
            None => Err(MemoryError::OutOfRange(address)),
        }
    }

    // code fetch, wrapped to the installed size
    pub fn code_byte(&self, address: u16) -> u8 {
        self.code[address as usize & (self.code.len() - 1)]
    }

    pub fn sfr(&self, index: u8) -> u8 {
        self.sfr[(index & 0x7F) as usize]
    }

    pub fn set_sfr(&mut self, index: u8, data: u8) {
        self.sfr[(index & 0x7F) as usize] = data;
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn code_mut(&mut self) -> &mut [u8] {
        &mut self.code
    }

    pub fn xdata(&self) -> &[u8] {
        &self.xdata
    }

    pub fn xdata_mut(&mut self) -> &mut [u8] {
        &mut self.xdata
    }

    pub fn lower_data(&self) -> &[u8; 128] {
        &self.lower
    }

    pub fn lower_data_mut(&mut self) -> &mut [u8; 128] {
        &mut self.lower
    }

    pub fn upper_data(&self) -> Option<&[u8; 128]> {
        self.upper.as_deref()
    }

    pub fn upper_data_mut(&mut self) -> Option<&mut [u8; 128]> {
        self.upper.as_deref_mut()
    }

    pub fn sfr_bank(&self) -> &[u8; 128] {
        &self.sfr
    }

    pub fn sfr_bank_mut(&mut self) -> &mut [u8; 128] {
        &mut self.sfr
    }

    /// Zero code, external data and both internal data halves. The SFR bank
    /// is left alone; reset rebuilds it separately.
    pub fn wipe(&mut self) {
        self.code.iter_mut().for_each(|b| *b = 0);
        self.xdata.iter_mut().for_each(|b| *b = 0);
        self.lower = [0; 128];
        if let Some(upper) = &mut self.upper {
            **upper = [0; 128];
        }
    }
}
