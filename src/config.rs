//! Static configuration for the metering node

/// LoRaWAN stack defaults
pub mod lorawan_defaults {
    use crate::radio::ActivationMode;

    /// Activation mode tried first after boot
    pub const ACTIVATION_MODE: ActivationMode = ActivationMode::Otaa;

    /// Uplinks are sent unconfirmed unless the network asks otherwise
    pub const CONFIRMED_MSG: bool = false;

    /// Rejoin even when a session context was restored from flash
    pub const FORCE_REJOIN_AT_BOOT: bool = true;

    /// Default data rate (DR0)
    pub const DATA_RATE: u8 = 0;

    /// Adaptive data rate enabled
    pub const ADR_ENABLED: bool = true;
}

/// Application timing
pub mod timing {
    /// Nominal uplink period in milliseconds
    pub const APP_TX_DUTYCYCLE_MS: u32 = 10_000;

    /// Window after which an unanswered join flips activation mode
    pub const JOIN_TIME_MS: u32 = 600_000;

    /// Toggle period of the joining indicator
    pub const LED_PERIOD_MS: u32 = 200;
}

/// Application payload constants
pub mod payload {
    /// Capacity of the uplink application buffer
    pub const LORAWAN_APP_DATA_BUFFER_MAX_SIZE: usize = 242;
}

/// Battery scale reported by the measurement layer
pub mod battery {
    /// Highest raw reading (full battery)
    pub const MAX_LEVEL: u8 = 254;

    /// Raw reading meaning "not measured"
    pub const NOT_MEASURED: u8 = 0xFF;
}

/// Meter telegram reception
pub mod telegram {
    /// Capacity of the UART line buffer holding one telegram
    pub const BUFFER_SIZE: usize = 512;

    /// Longest numeric field copied out of a register
    pub const MAX_FIELD_LEN: usize = 31;
}

/// Flash region holding the LoRaWAN NVM context
pub mod nvm {
    /// Base address of the context page
    pub const BASE_ADDRESS: u32 = 0x080E_0000;

    /// Flash page size in bytes
    pub const PAGE_SIZE: usize = 2048;

    /// Largest context accepted (page minus length prefix and CRC)
    pub const MAX_CONTEXT_SIZE: usize = PAGE_SIZE - 4;
}

/// LoRaWAN application ports
pub mod ports {
    /// Uplink measurements / LED downlinks
    pub const USER_APP: u8 = 2;

    /// Device class switch downlinks
    pub const SWITCH_CLASS: u8 = 3;

    /// Configuration commands from the network server
    pub const CONFIG: u8 = 85;
}

/// Firmware version
pub mod version {
    pub const MAJOR: u8 = 1;
    pub const MINOR: u8 = 0;
    pub const PATCH: u8 = 0;
}
