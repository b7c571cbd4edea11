//! LoRaWAN context persistence
//!
//! # Record format
//!
//! ```text
//! [length: u16 LE][context: [u8; length]][crc16: u16 LE]
//! ```
//!
//! The CRC is CRC-16-XMODEM over the length and context bytes. An erased
//! page reads back as a length of 0xFFFF and is reported as blank.

use super::traits::{NvmStorage, Region, StorageError};
use crate::config::nvm::{MAX_CONTEXT_SIZE, PAGE_SIZE};
use core::fmt;
use crc::{Crc, CRC_16_XMODEM};
use heapless::Vec;

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Record header (length) size
const HEADER_LEN: usize = 2;

/// Record trailer (CRC) size
const CRC_LEN: usize = 2;

/// Errors from saving or loading the context record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Underlying flash operation failed
    Storage(StorageError),
    /// Context larger than the page allows
    TooLarge,
    /// No record has been written yet
    Blank,
    /// Length or CRC check failed
    Corrupt,
}

impl From<StorageError> for ContextError {
    fn from(error: StorageError) -> Self {
        ContextError::Storage(error)
    }
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Storage(e) => write!(f, "storage: {}", e),
            ContextError::TooLarge => f.write_str("context too large"),
            ContextError::Blank => f.write_str("no stored context"),
            ContextError::Corrupt => f.write_str("stored context corrupt"),
        }
    }
}

/// Saves and restores the stack context in a single flash page
pub struct ContextStore {
    region: Region,
}

impl ContextStore {
    pub fn new(region: Region) -> Self {
        Self { region }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Erase the page and write a fresh record
    pub fn save<S: NvmStorage>(&self, storage: &mut S, context: &[u8]) -> Result<(), ContextError> {
        if context.len() > MAX_CONTEXT_SIZE || HEADER_LEN + context.len() + CRC_LEN > self.region.size {
            return Err(ContextError::TooLarge);
        }

        let mut record: Vec<u8, PAGE_SIZE> = Vec::new();
        record
            .extend_from_slice(&(context.len() as u16).to_le_bytes())
            .map_err(|_| ContextError::TooLarge)?;
        record
            .extend_from_slice(context)
            .map_err(|_| ContextError::TooLarge)?;
        let crc = CRC.checksum(&record);
        record
            .extend_from_slice(&crc.to_le_bytes())
            .map_err(|_| ContextError::TooLarge)?;

        storage.erase(self.region)?;
        storage.write(self.region, &record)?;
        Ok(())
    }

    /// Read the record back into `buf` and return the verified context
    pub fn load<'b, S: NvmStorage>(
        &self,
        storage: &mut S,
        buf: &'b mut [u8; PAGE_SIZE],
    ) -> Result<&'b [u8], ContextError> {
        let size = self.region.size.min(PAGE_SIZE);
        storage.read(self.region, &mut buf[..size])?;

        let length = u16::from_le_bytes([buf[0], buf[1]]);
        if length == 0xFFFF {
            return Err(ContextError::Blank);
        }

        let length = length as usize;
        if length > MAX_CONTEXT_SIZE || HEADER_LEN + length + CRC_LEN > size {
            return Err(ContextError::Corrupt);
        }

        let end = HEADER_LEN + length;
        let stored_crc = u16::from_le_bytes([buf[end], buf[end + 1]]);
        if CRC.checksum(&buf[..end]) != stored_crc {
            return Err(ContextError::Corrupt);
        }

        Ok(&buf[HEADER_LEN..end])
    }

    /// Drop the stored record
    pub fn clear<S: NvmStorage>(&self, storage: &mut S) -> Result<(), ContextError> {
        storage.erase(self.region)?;
        Ok(())
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(Region::nvm_context())
    }
}
