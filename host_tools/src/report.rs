//! Human-readable rendering of decoded payloads.

use colored::Colorize;
use meter_node::config::battery::NOT_MEASURED;
use meter_node::payload::tags::ALL_TAGS;
use meter_node::payload::{Measurements, Tag};

/// Render one field value with its unit.
pub fn format_value(tag: Tag, value: u32) -> String {
    match tag {
        Tag::Battery if value == u32::from(NOT_MEASURED) => "not measured".to_string(),
        Tag::Battery => format!("{}%", value),
        Tag::NetworkState => if value != 0 { "present" } else { "absent" }.to_string(),
        Tag::ActiveEnergyTotal | Tag::ActiveConsumed | Tag::ActiveGenerated => {
            format!("{} kWh", value)
        }
        Tag::ReactiveEnergyTotal | Tag::ReactiveConsumed | Tag::ReactiveGenerated => {
            format!("{} kvarh", value)
        }
        Tag::PeakDemand => format!("{} kW", value),
        Tag::SerialNumber => value.to_string(),
    }
}

/// Print every field carried by the payload, in tag order.
pub fn print_measurements(measurements: &Measurements) {
    for tag in ALL_TAGS {
        if let Some(value) = measurements.get(tag) {
            println!(
                "  {} {:<24} {}",
                format!("{:#04x}", tag as u8).dimmed(),
                tag.name(),
                format_value(tag, value).bold()
            );
        }
    }
}
