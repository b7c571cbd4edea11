//! Telegram capture from a meter's serial port.

use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::SerialPort;

/// Locate one complete telegram in `buf`.
///
/// A telegram starts at `/` and ends with the line holding the `!`
/// terminator (which may carry a checksum).
pub fn extract_telegram(buf: &[u8]) -> Option<&[u8]> {
    let start = buf.iter().position(|&b| b == b'/')?;
    let bang = start + buf[start..].iter().position(|&b| b == b'!')?;
    let end = bang + buf[bang..].iter().position(|&b| b == b'\n')? + 1;
    Some(&buf[start..end])
}

/// Serial connection to a meter's telegram output.
pub struct MeterClient {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl MeterClient {
    /// Open the port.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(200))
            .open()?;

        Ok(Self {
            port,
            timeout: Duration::from_secs(15),
        })
    }

    /// Set how long to wait for a complete telegram.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Clear any pending data in the serial buffer.
    pub fn clear_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }

    /// Read until one complete telegram has been received.
    pub fn read_telegram(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut buf = [0u8; 256];
        let start = Instant::now();

        while start.elapsed() < self.timeout {
            match self.port.read(&mut buf) {
                Ok(n) => {
                    data.extend_from_slice(&buf[..n]);
                    if let Some(telegram) = extract_telegram(&data) {
                        return Ok(telegram.to_vec());
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        anyhow::bail!(
            "Timeout waiting for telegram, got {} bytes",
            data.len()
        );
    }
}
