//! Downlink application commands
//!
//! Config port frames: `[0xFF][opcode][args]`
//! - `FF 03 lo hi`: reporting interval in seconds, little-endian
//! - `FF 10 FF`: reset
//! - `FF 99 FF`: factory reset
//!
//! Class-switch port frames carry a single class index (0 = A, 1 = B, 2 = C).

use crate::config::ports;
use crate::radio::DeviceClass;
use core::fmt;

const COMMAND_PREFIX: u8 = 0xFF;
const OPCODE_SET_INTERVAL: u8 = 0x03;
const OPCODE_RESET: u8 = 0x10;
const OPCODE_FACTORY_RESET: u8 = 0x99;
const ARG_TERMINATOR: u8 = 0xFF;

/// Decoded downlink command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlinkCommand {
    /// New uplink period in seconds; zero selects the default
    SetReportingInterval { seconds: u16 },
    Reset,
    /// Erase the stored stack context, then reset
    FactoryReset,
    SwitchClass(DeviceClass),
}

impl DownlinkCommand {
    /// Uplink period in milliseconds for [`DownlinkCommand::SetReportingInterval`]
    pub fn period_ms(&self) -> Option<u32> {
        match self {
            DownlinkCommand::SetReportingInterval { seconds } => Some(u32::from(*seconds) * 1000),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlinkError {
    /// No command is defined for this port
    UnsupportedPort(u8),
    /// Frame does not start with the command prefix
    InvalidPrefix,
    /// Unknown opcode
    InvalidCommand(u8),
    /// Wrong frame length for the opcode
    InvalidLength,
    /// Malformed argument
    InvalidArgument,
}

impl fmt::Display for DownlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownlinkError::UnsupportedPort(port) => write!(f, "unsupported port {}", port),
            DownlinkError::InvalidPrefix => f.write_str("invalid prefix"),
            DownlinkError::InvalidCommand(op) => write!(f, "invalid command {:#04x}", op),
            DownlinkError::InvalidLength => f.write_str("invalid length"),
            DownlinkError::InvalidArgument => f.write_str("invalid argument"),
        }
    }
}

/// Parser for downlink frames
pub struct DownlinkParser;

impl DownlinkParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a frame received on `port`
    pub fn parse(&self, port: u8, data: &[u8]) -> Result<DownlinkCommand, DownlinkError> {
        match port {
            ports::CONFIG => Self::parse_config(data),
            ports::SWITCH_CLASS => Self::parse_class(data),
            other => Err(DownlinkError::UnsupportedPort(other)),
        }
    }

    fn parse_config(data: &[u8]) -> Result<DownlinkCommand, DownlinkError> {
        let (&prefix, rest) = data.split_first().ok_or(DownlinkError::InvalidLength)?;
        if prefix != COMMAND_PREFIX {
            return Err(DownlinkError::InvalidPrefix);
        }
        let (&opcode, args) = rest.split_first().ok_or(DownlinkError::InvalidLength)?;

        match opcode {
            OPCODE_SET_INTERVAL => match args {
                [lo, hi] => Ok(DownlinkCommand::SetReportingInterval {
                    seconds: u16::from_le_bytes([*lo, *hi]),
                }),
                _ => Err(DownlinkError::InvalidLength),
            },
            OPCODE_RESET => Self::expect_terminator(args).map(|_| DownlinkCommand::Reset),
            OPCODE_FACTORY_RESET => {
                Self::expect_terminator(args).map(|_| DownlinkCommand::FactoryReset)
            }
            other => Err(DownlinkError::InvalidCommand(other)),
        }
    }

    fn parse_class(data: &[u8]) -> Result<DownlinkCommand, DownlinkError> {
        match data {
            [index] => DeviceClass::from_byte(*index)
                .map(DownlinkCommand::SwitchClass)
                .ok_or(DownlinkError::InvalidArgument),
            _ => Err(DownlinkError::InvalidLength),
        }
    }

    fn expect_terminator(args: &[u8]) -> Result<(), DownlinkError> {
        match args {
            [ARG_TERMINATOR] => Ok(()),
            [_] => Err(DownlinkError::InvalidArgument),
            _ => Err(DownlinkError::InvalidLength),
        }
    }
}

impl Default for DownlinkParser {
    fn default() -> Self {
        Self::new()
    }
}
