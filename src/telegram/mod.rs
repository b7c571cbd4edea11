//! Meter telegram handling
//!
//! A telegram is one textual transmission from the energy meter, made of
//! OBIS-style registers such as `1.8.0(00123.45*kWh)`. The UART side fills a
//! [`TelegramSlot`] and raises its ready flag; the uplink encoder consumes it.

pub mod parser;

use crate::config::telegram::BUFFER_SIZE;
use heapless::Vec;

pub use parser::{parse_float, parse_u32, FieldKind, Reading};

/// Read-only view over one received telegram.
///
/// The view ends at the first NUL byte, matching the line buffer's own
/// terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telegram<'a> {
    bytes: &'a [u8],
}

impl<'a> Telegram<'a> {
    /// Wrap a raw buffer, cutting it at the first NUL byte if present
    pub fn new(buffer: &'a [u8]) -> Self {
        let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
        Self {
            bytes: &buffer[..end],
        }
    }

    /// Telegram content without the terminator
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset just past the first occurrence of `marker`, if any
    pub fn find(&self, marker: &str) -> Option<usize> {
        let needle = marker.as_bytes();
        if needle.is_empty() {
            return Some(0);
        }
        self.bytes
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|pos| pos + needle.len())
    }

    /// Parse the register following `marker` as a floating-point reading
    pub fn parse_float(&self, marker: &str) -> Option<f64> {
        parse_float(self, marker)
    }

    /// Parse the register following `marker` as an unsigned integer reading
    pub fn parse_u32(&self, marker: &str) -> Option<u32> {
        parse_u32(self, marker)
    }
}

/// Line buffer shared with the UART receiver plus its one-shot ready flag.
pub struct TelegramSlot {
    buffer: Vec<u8, BUFFER_SIZE>,
    ready: bool,
}

impl TelegramSlot {
    /// Create an empty slot with the ready flag cleared
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            ready: false,
        }
    }

    /// Store a freshly received telegram and mark it ready.
    ///
    /// Input longer than the line buffer is cut to its capacity, the same
    /// way the UART receiver stops writing once the buffer is full.
    pub fn store(&mut self, data: &[u8]) {
        self.buffer.clear();
        let len = data.len().min(BUFFER_SIZE);
        // Cannot fail: len is bounded by the capacity
        let _ = self.buffer.extend_from_slice(&data[..len]);
        self.ready = true;
    }

    /// Whether an unconsumed telegram is waiting
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Current buffer content, regardless of the ready flag
    pub fn telegram(&self) -> Telegram<'_> {
        Telegram::new(&self.buffer)
    }

    /// Clear the ready flag after the telegram has been encoded
    pub fn consume(&mut self) {
        self.ready = false;
    }
}

impl Default for TelegramSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_stops_at_nul() {
        let telegram = Telegram::new(b"1.8.0(1*kWh)\0garbage");
        assert_eq!(telegram.as_bytes(), b"1.8.0(1*kWh)");
        assert_eq!(telegram.len(), 12);
    }

    #[test]
    fn test_find_first_occurrence() {
        let telegram = Telegram::new(b"1.8.0(1)1.8.0(2)");
        assert_eq!(telegram.find("1.8.0("), Some(6));
        assert_eq!(telegram.find("2.8.0("), None);
    }

    #[test]
    fn test_marker_after_nul_is_invisible() {
        let telegram = Telegram::new(b"abc\01.8.0(5)");
        assert_eq!(telegram.find("1.8.0("), None);
    }

    #[test]
    fn test_slot_ready_cycle() {
        let mut slot = TelegramSlot::new();
        assert!(!slot.is_ready());
        assert!(slot.telegram().is_empty());

        slot.store(b"C.1.0(42)");
        assert!(slot.is_ready());
        assert_eq!(slot.telegram().parse_u32("C.1.0("), Some(42));

        slot.consume();
        assert!(!slot.is_ready());
        // Content stays until the next reception
        assert_eq!(slot.telegram().as_bytes(), b"C.1.0(42)");
    }

    #[test]
    fn test_slot_truncates_oversized_input() {
        let mut slot = TelegramSlot::new();
        let data = [b'7'; BUFFER_SIZE + 10];
        slot.store(&data);
        assert_eq!(slot.telegram().len(), BUFFER_SIZE);
    }
}
