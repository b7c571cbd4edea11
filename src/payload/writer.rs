//! Append-only TLV writer over a fixed-capacity buffer

use heapless::Vec;

/// Accumulates `[tag][value BE]` records.
///
/// A record is written whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvWriter<const N: usize> {
    buf: Vec<u8, N>,
}

impl<const N: usize> TlvWriter<N> {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append one record of `width` value bytes.
    ///
    /// Returns false, leaving the buffer untouched, when the record would not
    /// fit, when `width` is not 1 to 4, or when `value` needs more than
    /// `width` bytes.
    pub fn try_append(&mut self, tag: u8, width: usize, value: u32) -> bool {
        if !(1..=4).contains(&width) {
            return false;
        }
        if width < 4 && value >> (8 * width) != 0 {
            return false;
        }
        if self.remaining() < 1 + width {
            return false;
        }

        let bytes = value.to_be_bytes();
        // Capacity checked above
        let _ = self.buf.push(tag);
        let _ = self.buf.extend_from_slice(&bytes[4 - width..]);
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        N - self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<const N: usize> Default for TlvWriter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_widths() {
        let mut writer: TlvWriter<16> = TlvWriter::new();
        assert!(writer.try_append(0x02, 1, 0x64));
        assert!(writer.try_append(0x28, 2, 0x0102));
        assert!(writer.try_append(0x3C, 4, 0x0A0B0C0D));

        assert_eq!(
            writer.as_bytes(),
            &[0x02, 0x64, 0x28, 0x01, 0x02, 0x3C, 0x0A, 0x0B, 0x0C, 0x0D]
        );
    }

    #[test]
    fn test_overflow_writes_nothing() {
        let mut writer: TlvWriter<6> = TlvWriter::new();
        assert!(writer.try_append(0x3C, 4, 1));
        assert_eq!(writer.remaining(), 1);

        assert!(!writer.try_append(0x02, 1, 1));
        assert_eq!(writer.len(), 5);
    }

    #[test]
    fn test_value_must_fit_width() {
        let mut writer: TlvWriter<16> = TlvWriter::new();
        assert!(!writer.try_append(0x28, 2, 0x1_0000));
        assert!(!writer.try_append(0x02, 1, 256));
        assert!(writer.is_empty());
    }

    #[test]
    fn test_invalid_width() {
        let mut writer: TlvWriter<16> = TlvWriter::new();
        assert!(!writer.try_append(0x01, 0, 0));
        assert!(!writer.try_append(0x01, 5, 0));
        assert!(writer.is_empty());
    }
}
