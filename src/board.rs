//! Board services consumed by the application
//!
//! Analog acquisition and GPIO handling stay on the board side; the core only
//! reads already digitised values and can ask for a reset.

/// Sensing and system-control interface
pub trait Board {
    /// Battery level on the LoRaWAN scale: 0 (empty) to 254 (full), or
    /// 0xFF when it could not be measured
    fn battery_level(&mut self) -> u8;

    /// Logic level of the external network-presence input
    fn network_present(&mut self) -> bool;

    /// Toggle the joining indicator LED
    fn toggle_join_led(&mut self);

    /// Restart the MCU
    fn system_reset(&mut self);
}
