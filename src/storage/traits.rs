//! Flash storage trait for abstraction and testability
//!
//! Wear levelling and the flash controller itself stay on the platform side;
//! the core only erases, writes and reads one fixed region.

use core::fmt;

/// Errors that can occur during flash operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Page erase failed
    EraseFailed,
    /// Programming failed
    WriteFailed,
    /// Read failed
    ReadFailed,
    /// Data does not fit the region
    OutOfBounds,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StorageError::EraseFailed => "erase failed",
            StorageError::WriteFailed => "write failed",
            StorageError::ReadFailed => "read failed",
            StorageError::OutOfBounds => "out of bounds",
        };
        f.write_str(text)
    }
}

/// A fixed flash area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub base: u32,
    pub size: usize,
}

impl Region {
    /// The page reserved for the LoRaWAN context
    pub const fn nvm_context() -> Self {
        use crate::config::nvm;

        Self {
            base: nvm::BASE_ADDRESS,
            size: nvm::PAGE_SIZE,
        }
    }
}

/// Abstract flash interface
pub trait NvmStorage {
    /// Erase the whole region
    fn erase(&mut self, region: Region) -> Result<(), StorageError>;

    /// Program `data` at the start of the region
    fn write(&mut self, region: Region, data: &[u8]) -> Result<(), StorageError>;

    /// Fill `buf` from the start of the region
    fn read(&mut self, region: Region, buf: &mut [u8]) -> Result<(), StorageError>;
}
