//! Uplink tag table
//!
//! | Tag  | Field                        | Width | Source register |
//! |------|------------------------------|-------|-----------------|
//! | 0x02 | Battery (%)                  | 1     | board           |
//! | 0x04 | Network state                | 1     | board           |
//! | 0x0A | Active energy, total         | 4     | `15.8.0(`       |
//! | 0x0B | Reactive energy, total       | 4     | `130.8.0(`      |
//! | 0x28 | Peak demand                  | 2     | `1.6.0(`        |
//! | 0x3C | Active energy consumed       | 4     | `1.8.0(`        |
//! | 0x3D | Active energy generated      | 4     | `2.8.0(`        |
//! | 0x3E | Reactive energy consumed     | 4     | `3.8.0(`        |
//! | 0x3F | Reactive energy generated    | 4     | `4.8.0(`        |
//! | 0x5A | Meter serial number          | 4     | `C.1.0(`        |
//!
//! Values are big-endian. The length is implied by the tag.

use crate::config::payload::LORAWAN_APP_DATA_BUFFER_MAX_SIZE;
use crate::telegram::FieldKind;

/// Upper bound (exclusive) for 4-byte energy counters
const ENERGY_CEILING: f64 = 10_000_000.0;

/// Upper bound (exclusive) for the 2-byte demand field
const DEMAND_CEILING: f64 = 65_536.0;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Battery = 0x02,
    NetworkState = 0x04,
    ActiveEnergyTotal = 0x0A,
    ReactiveEnergyTotal = 0x0B,
    PeakDemand = 0x28,
    ActiveConsumed = 0x3C,
    ActiveGenerated = 0x3D,
    ReactiveConsumed = 0x3E,
    ReactiveGenerated = 0x3F,
    SerialNumber = 0x5A,
}

/// Every tag, in uplink order
pub const ALL_TAGS: [Tag; 10] = [
    Tag::Battery,
    Tag::NetworkState,
    Tag::ActiveEnergyTotal,
    Tag::ReactiveEnergyTotal,
    Tag::PeakDemand,
    Tag::ActiveConsumed,
    Tag::ActiveGenerated,
    Tag::ReactiveConsumed,
    Tag::ReactiveGenerated,
    Tag::SerialNumber,
];

/// Tags read from the meter telegram, in uplink order
pub const METER_TAGS: [Tag; 8] = [
    Tag::ActiveEnergyTotal,
    Tag::ReactiveEnergyTotal,
    Tag::PeakDemand,
    Tag::ActiveConsumed,
    Tag::ActiveGenerated,
    Tag::ReactiveConsumed,
    Tag::ReactiveGenerated,
    Tag::SerialNumber,
];

/// Payload size with every tag present
pub const MAX_PAYLOAD_LEN: usize = {
    let mut total = 0;
    let mut i = 0;
    while i < ALL_TAGS.len() {
        total += 1 + ALL_TAGS[i].width();
        i += 1;
    }
    total
};

const _: () = assert!(MAX_PAYLOAD_LEN <= LORAWAN_APP_DATA_BUFFER_MAX_SIZE);

impl Tag {
    pub fn from_byte(byte: u8) -> Option<Self> {
        ALL_TAGS.iter().copied().find(|tag| *tag as u8 == byte)
    }

    /// Value width in bytes
    pub const fn width(self) -> usize {
        match self {
            Tag::Battery | Tag::NetworkState => 1,
            Tag::PeakDemand => 2,
            Tag::ActiveEnergyTotal
            | Tag::ReactiveEnergyTotal
            | Tag::ActiveConsumed
            | Tag::ActiveGenerated
            | Tag::ReactiveConsumed
            | Tag::ReactiveGenerated
            | Tag::SerialNumber => 4,
        }
    }

    /// OBIS marker of the register feeding this tag
    pub fn marker(self) -> Option<&'static str> {
        match self {
            Tag::Battery | Tag::NetworkState => None,
            Tag::ActiveEnergyTotal => Some("15.8.0("),
            Tag::ReactiveEnergyTotal => Some("130.8.0("),
            Tag::PeakDemand => Some("1.6.0("),
            Tag::ActiveConsumed => Some("1.8.0("),
            Tag::ActiveGenerated => Some("2.8.0("),
            Tag::ReactiveConsumed => Some("3.8.0("),
            Tag::ReactiveGenerated => Some("4.8.0("),
            Tag::SerialNumber => Some("C.1.0("),
        }
    }

    pub fn field_kind(self) -> FieldKind {
        match self {
            Tag::SerialNumber => FieldKind::Uint,
            _ => FieldKind::Float,
        }
    }

    /// Exclusive upper bound accepted for floating registers
    pub fn ceiling(self) -> f64 {
        match self {
            Tag::PeakDemand => DEMAND_CEILING,
            _ => ENERGY_CEILING,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Battery => "battery",
            Tag::NetworkState => "network_state",
            Tag::ActiveEnergyTotal => "active_energy",
            Tag::ReactiveEnergyTotal => "reactive_energy",
            Tag::PeakDemand => "peak_demand",
            Tag::ActiveConsumed => "active_consumed",
            Tag::ActiveGenerated => "active_generated",
            Tag::ReactiveConsumed => "reactive_consumed",
            Tag::ReactiveGenerated => "reactive_generated",
            Tag::SerialNumber => "serial_number",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_payload_len() {
        assert_eq!(MAX_PAYLOAD_LEN, 42);
    }

    #[test]
    fn test_from_byte() {
        for tag in ALL_TAGS {
            assert_eq!(Tag::from_byte(tag as u8), Some(tag));
        }
        assert_eq!(Tag::from_byte(0x03), None);
        assert_eq!(Tag::from_byte(0xFF), None);
    }

    #[test]
    fn test_meter_tags_have_markers() {
        for tag in METER_TAGS {
            assert!(tag.marker().is_some(), "{:?} has no marker", tag);
        }
        assert!(Tag::Battery.marker().is_none());
    }
}
