//! Uplink payload decoder
//!
//! Walks a TLV stream with the same tag table as the encoder. Used by host
//! tooling and to check what actually goes over the air.

use super::tags::Tag;
use core::fmt;

/// Errors that can occur while decoding a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Tag byte not in the table
    UnknownTag(u8),
    /// Record cut short by the end of the payload
    Truncated(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownTag(tag) => write!(f, "unknown tag {:#04x}", tag),
            DecodeError::Truncated(tag) => write!(f, "record {:#04x} truncated", tag),
        }
    }
}

/// Fields carried by one uplink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Measurements {
    /// Percentage, or 0xFF when not measured
    pub battery: Option<u8>,
    pub network_present: Option<bool>,
    pub active_energy_total: Option<u32>,
    pub reactive_energy_total: Option<u32>,
    pub peak_demand: Option<u16>,
    pub active_consumed: Option<u32>,
    pub active_generated: Option<u32>,
    pub reactive_consumed: Option<u32>,
    pub reactive_generated: Option<u32>,
    pub serial_number: Option<u32>,
}

impl Measurements {
    /// Raw value carried for `tag`, if present
    pub fn get(&self, tag: Tag) -> Option<u32> {
        match tag {
            Tag::Battery => self.battery.map(u32::from),
            Tag::NetworkState => self.network_present.map(u32::from),
            Tag::ActiveEnergyTotal => self.active_energy_total,
            Tag::ReactiveEnergyTotal => self.reactive_energy_total,
            Tag::PeakDemand => self.peak_demand.map(u32::from),
            Tag::ActiveConsumed => self.active_consumed,
            Tag::ActiveGenerated => self.active_generated,
            Tag::ReactiveConsumed => self.reactive_consumed,
            Tag::ReactiveGenerated => self.reactive_generated,
            Tag::SerialNumber => self.serial_number,
        }
    }

    fn set(&mut self, tag: Tag, value: u32) {
        match tag {
            Tag::Battery => self.battery = Some(value as u8),
            Tag::NetworkState => self.network_present = Some(value != 0),
            Tag::ActiveEnergyTotal => self.active_energy_total = Some(value),
            Tag::ReactiveEnergyTotal => self.reactive_energy_total = Some(value),
            Tag::PeakDemand => self.peak_demand = Some(value as u16),
            Tag::ActiveConsumed => self.active_consumed = Some(value),
            Tag::ActiveGenerated => self.active_generated = Some(value),
            Tag::ReactiveConsumed => self.reactive_consumed = Some(value),
            Tag::ReactiveGenerated => self.reactive_generated = Some(value),
            Tag::SerialNumber => self.serial_number = Some(value),
        }
    }
}

/// Decode a complete payload
pub fn decode(bytes: &[u8]) -> Result<Measurements, DecodeError> {
    let mut measurements = Measurements::default();
    let mut rest = bytes;

    while let Some((&tag_byte, tail)) = rest.split_first() {
        let tag = Tag::from_byte(tag_byte).ok_or(DecodeError::UnknownTag(tag_byte))?;
        let width = tag.width();
        if tail.len() < width {
            return Err(DecodeError::Truncated(tag_byte));
        }

        let value = tail[..width]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        measurements.set(tag, value);
        rest = &tail[width..];
    }

    Ok(measurements)
}
