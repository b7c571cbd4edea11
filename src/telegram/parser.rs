//! Marker-anchored register extraction
//!
//! Scanning starts right after the first occurrence of the marker and runs
//! while the characters belong to the field's numeric set. Any other byte,
//! including the `*` before a unit or the closing `)`, ends the field.
//! Fields longer than [`MAX_FIELD_LEN`] are cut, not rejected.

use super::Telegram;
use crate::config::telegram::MAX_FIELD_LEN;
use log::debug;

/// Which numeric grammar a register is read with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Digits, `.`, `-` and `+`
    Float,
    /// Digits only
    Uint,
}

impl FieldKind {
    fn accepts(self, byte: u8) -> bool {
        match self {
            FieldKind::Float => byte.is_ascii_digit() || matches!(byte, b'.' | b'-' | b'+'),
            FieldKind::Uint => byte.is_ascii_digit(),
        }
    }
}

/// A value extracted from a telegram, tagged by the grammar that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Float(f64),
    Uint(u32),
}

impl Reading {
    /// Parse the register following `marker` with the given grammar
    pub fn parse(telegram: &Telegram<'_>, marker: &str, kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Float => parse_float(telegram, marker).map(Reading::Float),
            FieldKind::Uint => parse_u32(telegram, marker).map(Reading::Uint),
        }
    }
}

/// Extract a floating-point register.
///
/// Returns `None` when the marker is absent or no numeric character follows
/// it. Text that only partially reads as a number yields its longest
/// convertible prefix, and text with no convertible prefix yields `0.0`.
pub fn parse_float(telegram: &Telegram<'_>, marker: &str) -> Option<f64> {
    let field = numeric_field(telegram, marker, FieldKind::Float)?;
    let value = leading_float(field);
    debug!("parse_float('{}') -> '{}'", marker, field);
    Some(value)
}

/// Extract an unsigned integer register.
///
/// Same contract as [`parse_float`] with a digits-only field. Values past
/// `u32::MAX` saturate.
pub fn parse_u32(telegram: &Telegram<'_>, marker: &str) -> Option<u32> {
    let field = numeric_field(telegram, marker, FieldKind::Uint)?;
    let value = field.parse::<u32>().unwrap_or(u32::MAX);
    debug!("parse_u32('{}') -> '{}' = {}", marker, field, value);
    Some(value)
}

/// Locate the numeric text after `marker`, cut to [`MAX_FIELD_LEN`]
fn numeric_field<'a>(telegram: &Telegram<'a>, marker: &str, kind: FieldKind) -> Option<&'a str> {
    let start = telegram.find(marker)?;
    let rest = &telegram.as_bytes()[start..];

    let len = rest.iter().take_while(|&&b| kind.accepts(b)).count();
    if len == 0 {
        return None;
    }

    // Accepted bytes are all ASCII
    core::str::from_utf8(&rest[..len.min(MAX_FIELD_LEN)]).ok()
}

/// Longest prefix of `text` that reads as a number, or zero
fn leading_float(text: &str) -> f64 {
    (1..=text.len())
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}
