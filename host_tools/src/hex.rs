//! Hex helpers for payloads typed on the command line.

use anyhow::{bail, Context, Result};

/// Parse a hex string such as `02640401`, `02 64 04 01`, `0x02:0x64`.
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let mut digits = String::with_capacity(input.len());
    for token in input.split(|c: char| c.is_whitespace() || c == ':' || c == ',') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }

    if !digits.is_ascii() {
        bail!("Non-ASCII character in hex input");
    }
    if digits.len() % 2 != 0 {
        bail!("Odd number of hex digits ({})", digits.len());
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = &digits[i..i + 2];
            u8::from_str_radix(pair, 16).with_context(|| format!("Invalid hex byte '{}'", pair))
        })
        .collect()
}

/// Format bytes as space-separated upper-case hex.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
