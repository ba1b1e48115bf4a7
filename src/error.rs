use crate::mcs51::memory::Address;

use thiserror::Error;

/// Rejected memory layout at construction time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("code memory size {0} is not a power of two between 1 KiB and 64 KiB")]
    CodeSize(usize),
    #[error("external data size {0} is not zero or a power of two up to 64 KiB")]
    XdataSize(usize),
}

/// Failed access to one of the byte regions of the memory bank.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address {0:?} is outside the installed region")]
    OutOfRange(Address),
    #[error("address {0:?} targets a region that is not installed")]
    Absent(Address),
}

/// Intel-HEX loading failure.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read object file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: malformed record")]
    BadFormat { line: usize },
    #[error("line {line}: unsupported record type {record_type:02X}")]
    Unsupported { line: usize, record_type: u8 },
    #[error("line {line}: checksum mismatch (expected {expected:02X}, found {found:02X})")]
    Checksum { line: usize, expected: u8, found: u8 },
    #[error("no end-of-file record")]
    MissingEof,
    #[error("line {line}: {length} bytes at {address:04X} do not fit in code memory")]
    AddressOutOfRange {
        line: usize,
        address: u32,
        length: usize,
    },
}

impl LoadError {
    /// Negative status code, compatible with hosts that expect the classic
    /// `load_obj` return values.
    pub fn code(&self) -> i32 {
        match self {
            LoadError::Io(_) => -1,
            LoadError::BadFormat { .. } => -2,
            LoadError::Unsupported { .. } => -3,
            LoadError::Checksum { .. } => -4,
            LoadError::MissingEof => -5,
            LoadError::AddressOutOfRange { .. } => -6,
        }
    }
}
