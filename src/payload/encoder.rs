//! Uplink payload encoder
//!
//! Battery and network state are always sent first. Meter registers follow
//! only when a fresh telegram is ready; a register that is missing or
//! implausible is left out rather than clamped.

use super::tags::{Tag, METER_TAGS};
use super::Payload;
use crate::board::Board;
use crate::config::battery::{MAX_LEVEL, NOT_MEASURED};
use crate::telegram::{Reading, Telegram, TelegramSlot};
use log::{debug, info, warn};

/// Convert the raw battery level to a percentage.
///
/// 0xFF (not measured) passes through, 0 stays 0, anything else is scaled
/// against [`MAX_LEVEL`] with round-half-up.
pub fn battery_percent(raw: u8) -> u8 {
    match raw {
        NOT_MEASURED => NOT_MEASURED,
        0 => 0,
        level => {
            let max = MAX_LEVEL as u32;
            ((level as u32 * 100 + max / 2) / max) as u8
        }
    }
}

/// Builds the uplink payload into an owned buffer
pub struct PayloadEncoder {
    payload: Payload,
}

impl PayloadEncoder {
    pub fn new() -> Self {
        Self {
            payload: Payload::new(),
        }
    }

    /// Build the uplink from the board readings and the telegram slot.
    ///
    /// A ready telegram is consumed: its ready flag is cleared once every
    /// register has been tried.
    pub fn encode<B: Board>(&mut self, slot: &mut TelegramSlot, board: &mut B) -> &Payload {
        let battery = board.battery_level();
        let network = board.network_present();

        if slot.is_ready() {
            self.build(Some(&slot.telegram()), battery, network);
            slot.consume();
        } else {
            self.build(None, battery, network);
        }
        &self.payload
    }

    /// Build the uplink from explicit inputs.
    ///
    /// The previous content is discarded, so identical inputs always give
    /// identical bytes.
    pub fn build(&mut self, telegram: Option<&Telegram<'_>>, battery_raw: u8, network: bool) -> &Payload {
        self.payload.clear();

        let battery = battery_percent(battery_raw);
        self.append(Tag::Battery, battery as u32);
        if battery == NOT_MEASURED {
            info!("TLV: 0x02 battery=NA");
        } else {
            info!("TLV: 0x02 battery={}%", battery);
        }

        self.append(Tag::NetworkState, network as u32);
        info!("TLV: 0x04 network_state={}", network as u8);

        let Some(telegram) = telegram else {
            info!("No meter data, sending battery and network state only");
            return &self.payload;
        };

        for tag in METER_TAGS {
            if let Some(value) = measure(telegram, tag) {
                if self.append(tag, value) {
                    info!("TLV: {:#04x} {}={}", tag as u8, tag.name(), value);
                }
            }
        }

        info!("TLV payload built: {} bytes", self.payload.len());
        &self.payload
    }

    /// Last payload built
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    fn append(&mut self, tag: Tag, value: u32) -> bool {
        let appended = self.payload.try_append(tag as u8, tag.width(), value);
        if !appended {
            warn!("TLV: {:#04x} does not fit, dropped", tag as u8);
        }
        appended
    }
}

impl Default for PayloadEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and validate the register behind `tag`.
///
/// Floating registers are checked at single precision, so a reading that
/// rounds up to the ceiling (`9999999.9` for energy, `65535.999` for demand)
/// is rejected.
fn measure(telegram: &Telegram<'_>, tag: Tag) -> Option<u32> {
    let marker = tag.marker()?;

    match Reading::parse(telegram, marker, tag.field_kind()) {
        None => {
            debug!("TLV: {:#04x} register {} not found", tag as u8, marker);
            None
        }
        Some(Reading::Float(value)) => {
            let value = value as f32;
            if value >= 0.0 && value < tag.ceiling() as f32 {
                // Truncates toward zero
                Some(value as u32)
            } else {
                debug!("TLV: {:#04x} value {} out of range", tag as u8, value);
                None
            }
        }
        Some(Reading::Uint(0)) => {
            debug!("TLV: {:#04x} zero value rejected", tag as u8);
            None
        }
        Some(Reading::Uint(value)) => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::mock::MockBoard;
    use crate::config::payload::LORAWAN_APP_DATA_BUFFER_MAX_SIZE;
    use crate::payload::tags::MAX_PAYLOAD_LEN;

    const FULL_TELEGRAM: &[u8] = b"/ISK5\\2M550T\r\n\
        0-0:C.1.0(00045678)\r\n\
        1-0:15.8.0(0001234.5*kWh)\r\n\
        1-0:130.8.0(0000321.9*kvarh)\r\n\
        1-0:1.6.0(00002.5*kW)\r\n\
        1-0:1.8.0(00123.45*kWh)\r\n\
        1-0:2.8.0(00010.00*kWh)\r\n\
        1-0:3.8.0(00020.99*kvarh)\r\n\
        1-0:4.8.0(00030.01*kvarh)\r\n\
        !\r\n";

    #[test]
    fn test_battery_percent() {
        assert_eq!(battery_percent(0xFF), 0xFF);
        assert_eq!(battery_percent(0), 0);
        assert_eq!(battery_percent(254), 100);
        assert_eq!(battery_percent(127), 50);
        assert_eq!(battery_percent(1), 0);
        assert_eq!(battery_percent(2), 1);
    }

    #[test]
    fn test_degraded_payload() {
        let mut encoder = PayloadEncoder::new();
        let mut slot = TelegramSlot::new();
        let mut board = MockBoard::new(254, true);

        let payload = encoder.encode(&mut slot, &mut board);
        assert_eq!(payload.as_bytes(), &[0x02, 0x64, 0x04, 0x01]);
    }

    #[test]
    fn test_degraded_payload_ignores_stale_buffer() {
        let mut encoder = PayloadEncoder::new();
        let mut slot = TelegramSlot::new();
        slot.store(b"1.8.0(5*kWh)");
        slot.consume();
        let mut board = MockBoard::new(0xFF, false);

        let payload = encoder.encode(&mut slot, &mut board);
        assert_eq!(payload.as_bytes(), &[0x02, 0xFF, 0x04, 0x00]);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut encoder = PayloadEncoder::new();
        let mut slot = TelegramSlot::new();
        slot.store(b"1.8.0(00123.45*kWh)C.1.0(00045678)");
        let mut board = MockBoard::new(254, true);

        let payload = encoder.encode(&mut slot, &mut board);
        let mut expected = std::vec![0x02, 0x64, 0x04, 0x01, 0x3C];
        expected.extend_from_slice(&123u32.to_be_bytes());
        expected.push(0x5A);
        expected.extend_from_slice(&45678u32.to_be_bytes());
        assert_eq!(payload.as_bytes(), expected.as_slice());

        // One-shot consumption
        assert!(!slot.is_ready());
    }

    #[test]
    fn test_full_telegram() {
        let mut encoder = PayloadEncoder::new();
        let telegram = Telegram::new(FULL_TELEGRAM);

        let payload = encoder.build(Some(&telegram), 127, false);
        assert_eq!(payload.len(), MAX_PAYLOAD_LEN);
        assert_eq!(
            payload.as_bytes(),
            &[
                0x02, 50, //
                0x04, 0, //
                0x0A, 0x00, 0x00, 0x04, 0xD2, // 1234
                0x0B, 0x00, 0x00, 0x01, 0x41, // 321
                0x28, 0x00, 0x02, // 2
                0x3C, 0x00, 0x00, 0x00, 0x7B, // 123
                0x3D, 0x00, 0x00, 0x00, 0x0A, // 10
                0x3E, 0x00, 0x00, 0x00, 0x14, // 20
                0x3F, 0x00, 0x00, 0x00, 0x1E, // 30
                0x5A, 0x00, 0x00, 0xB2, 0x6E, // 45678
            ][..]
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut encoder = PayloadEncoder::new();
        let telegram = Telegram::new(b"1.8.0(10000000.0*kWh)2.8.0(-1*kWh)1.6.0(65536*kW)3.8.0(9999999*kvarh)");

        let payload = encoder.build(Some(&telegram), 254, true);
        let mut expected = std::vec![0x02, 0x64, 0x04, 0x01, 0x3E];
        expected.extend_from_slice(&9_999_999u32.to_be_bytes());
        assert_eq!(payload.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_peak_demand_upper_edge() {
        let mut encoder = PayloadEncoder::new();
        let telegram = Telegram::new(b"1.6.0(65535.9*kW)");

        let payload = encoder.build(Some(&telegram), 0, false);
        assert_eq!(payload.as_bytes(), &[0x02, 0, 0x04, 0, 0x28, 0xFF, 0xFF]);
    }

    #[test]
    fn test_rounding_to_ceiling_rejected() {
        let mut encoder = PayloadEncoder::new();
        let telegram = Telegram::new(b"1.8.0(9999999.9*kWh)1.6.0(65535.999*kW)2.8.0(9999998*kWh)");

        let payload = encoder.build(Some(&telegram), 254, true);
        let mut expected = std::vec![0x02, 0x64, 0x04, 0x01, 0x3D];
        expected.extend_from_slice(&9_999_998u32.to_be_bytes());
        assert_eq!(payload.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_zero_serial_rejected() {
        let mut encoder = PayloadEncoder::new();
        let telegram = Telegram::new(b"C.1.0(00000000)");

        let payload = encoder.build(Some(&telegram), 254, true);
        assert_eq!(payload.as_bytes(), &[0x02, 0x64, 0x04, 0x01]);
    }

    #[test]
    fn test_ready_but_empty_telegram() {
        let mut encoder = PayloadEncoder::new();
        let mut slot = TelegramSlot::new();
        slot.store(b"garbage without registers");
        let mut board = MockBoard::new(254, false);

        let payload = encoder.encode(&mut slot, &mut board);
        assert_eq!(payload.as_bytes(), &[0x02, 0x64, 0x04, 0x00]);
        assert!(!slot.is_ready());
    }

    #[test]
    fn test_repeat_builds_identical() {
        let mut encoder = PayloadEncoder::new();
        let telegram = Telegram::new(FULL_TELEGRAM);

        let first = encoder.build(Some(&telegram), 200, true).clone();
        // A different build in between must not leak into the next one
        encoder.build(None, 1, false);
        let second = encoder.build(Some(&telegram), 200, true).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut encoder = PayloadEncoder::new();
        let markers: [&[u8]; 8] = [
            b"15.8.0(1)",
            b"130.8.0(2)",
            b"1.6.0(3)",
            b"1.8.0(4)",
            b"2.8.0(5)",
            b"3.8.0(6)",
            b"4.8.0(7)",
            b"C.1.0(8)",
        ];

        // Every subset of registers
        for mask in 0u16..(1 << markers.len()) {
            let mut text = std::vec::Vec::new();
            for (bit, marker) in markers.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    text.extend_from_slice(marker);
                }
            }
            let telegram = Telegram::new(&text);
            let payload = encoder.build(Some(&telegram), 100, true);
            assert!(payload.len() <= MAX_PAYLOAD_LEN);
            assert!(payload.len() <= LORAWAN_APP_DATA_BUFFER_MAX_SIZE);
        }
    }
}
