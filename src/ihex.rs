//! Intel-HEX object loader.
//!
//! Only the 16-bit subset makes sense for an MCS-51 code space: data and
//! end-of-file records, plus segment/linear base records as long as the base
//! is zero. Start-address records are accepted and ignored. The whole file is
//! validated before a single byte reaches code memory.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::LoadError;
use crate::mcs51::cpu::Mcu;

const DATA: u8 = 0x00;
const END_OF_FILE: u8 = 0x01;
const EXTENDED_SEGMENT_ADDRESS: u8 = 0x02;
const START_SEGMENT_ADDRESS: u8 = 0x03;
const EXTENDED_LINEAR_ADDRESS: u8 = 0x04;
const START_LINEAR_ADDRESS: u8 = 0x05;

/// A data record: `data` goes to code memory starting at `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub address: u16,
    pub data: Vec<u8>,
}

fn hex_bytes(text: &str, line: usize) -> Result<Vec<u8>, LoadError> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return Err(LoadError::BadFormat { line });
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16).map_err(|_| LoadError::BadFormat { line })
        })
        .collect()
}

/// Parse and validate every record of a HEX file. Returns the data records
/// in file order.
pub fn parse(text: &str) -> Result<Vec<Record>, LoadError> {
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let body = raw
            .strip_prefix(':')
            .ok_or(LoadError::BadFormat { line })?;
        let bytes = hex_bytes(body, line)?;
        if bytes.len() < 5 || bytes[0] as usize != bytes.len() - 5 {
            return Err(LoadError::BadFormat { line });
        }

        let (payload, checksum) = bytes.split_at(bytes.len() - 1);
        let sum = payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        let expected = sum.wrapping_neg();
        if expected != checksum[0] {
            return Err(LoadError::Checksum {
                line,
                expected,
                found: checksum[0],
            });
        }

        let address = u16::from_be_bytes([payload[1], payload[2]]);
        let record_type = payload[3];
        let data = &payload[4..];
        match record_type {
            DATA => records.push(Record {
                line,
                address,
                data: data.to_vec(),
            }),
            END_OF_FILE => return Ok(records),
            EXTENDED_SEGMENT_ADDRESS | EXTENDED_LINEAR_ADDRESS => {
                if data.len() != 2 {
                    return Err(LoadError::BadFormat { line });
                }
                // code space is 16 bits wide
                if data != [0, 0] {
                    return Err(LoadError::Unsupported { line, record_type });
                }
            }
            START_SEGMENT_ADDRESS | START_LINEAR_ADDRESS => {}
            _ => return Err(LoadError::Unsupported { line, record_type }),
        }
    }

    Err(LoadError::MissingEof)
}

/// Parse `text` and copy its data into `code`. Nothing is written unless the
/// whole file is valid and fits. Returns the number of bytes written.
pub fn load(code: &mut [u8], text: &str) -> Result<usize, LoadError> {
    let records = parse(text)?;

    for record in &records {
        let end = record.address as usize + record.data.len();
        if end > code.len() {
            return Err(LoadError::AddressOutOfRange {
                line: record.line,
                address: record.address as u32,
                length: record.data.len(),
            });
        }
    }

    let mut written = 0;
    for record in &records {
        let start = record.address as usize;
        code[start..start + record.data.len()].copy_from_slice(&record.data);
        written += record.data.len();
    }
    Ok(written)
}

/// Load a HEX file from disk into the code memory of `mcu`.
pub fn load_object_file(mcu: &mut Mcu, path: impl AsRef<Path>) -> Result<usize, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let written = load(mcu.memory_mut().code_mut(), &text)?;
    info!(path = %path.display(), bytes = written, "loaded object file");
    Ok(written)
}
