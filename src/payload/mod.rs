//! Uplink payload format
//!
//! The uplink is a sequence of `[tag: u8][value: BE]` records whose value
//! width is fixed per tag, see [`tags`].

pub mod decoder;
pub mod encoder;
pub mod tags;
pub mod writer;

use crate::config::payload::LORAWAN_APP_DATA_BUFFER_MAX_SIZE;

pub use decoder::{decode, DecodeError, Measurements};
pub use encoder::{battery_percent, PayloadEncoder};
pub use tags::{Tag, MAX_PAYLOAD_LEN};
pub use writer::TlvWriter;

/// Application payload buffer
pub type Payload = TlvWriter<LORAWAN_APP_DATA_BUFFER_MAX_SIZE>;
