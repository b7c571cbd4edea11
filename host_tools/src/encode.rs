//! Build the uplink a node would send for a given telegram.
//!
//! The telegram comes from a file or is captured live from a meter.

mod hex;
mod logging;
mod meter;
mod report;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use meter_node::payload::{decode, PayloadEncoder};
use meter_node::telegram::Telegram;

use hex::format_hex;
use meter::MeterClient;
use report::print_measurements;

#[derive(Parser)]
#[command(name = "meter-encode")]
#[command(about = "Encode a meter telegram into a metering node TLV payload")]
struct Args {
    /// Telegram file
    #[arg(short, long, conflicts_with = "port")]
    file: Option<PathBuf>,

    /// Serial port of the meter
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Seconds to wait for a telegram on the serial port
    #[arg(long, default_value = "15")]
    timeout: u64,

    /// Raw battery level (0..=254, 255 = not measured)
    #[arg(long, default_value = "254")]
    battery: u8,

    /// Network presence input level
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(0..=1))]
    network: u8,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_input(args: &Args) -> anyhow::Result<Option<Vec<u8>>> {
    if let Some(path) = &args.file {
        let data = std::fs::read(path)
            .with_context(|| format!("Cannot read telegram file {}", path.display()))?;
        return Ok(Some(data));
    }

    if let Some(port) = &args.port {
        println!("Port: {}", port);
        println!("Baud: {}", args.baud);
        println!("Waiting for telegram...");

        let mut client = MeterClient::new(port, args.baud)?;
        client.set_timeout(Duration::from_secs(args.timeout));
        client.clear_buffer()?;
        return Ok(Some(client.read_telegram()?));
    }

    Ok(None)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let input = read_input(&args)?;
    if input.is_none() {
        println!("{}", "No telegram given, building degraded payload".yellow());
    }

    let mut encoder = PayloadEncoder::new();
    let telegram = input.as_deref().map(Telegram::new);
    let payload = encoder.build(telegram.as_ref(), args.battery, args.network != 0);

    println!();
    println!("{} ({} bytes)", format_hex(payload.as_bytes()).bold(), payload.len());

    let measurements = decode(payload.as_bytes())
        .map_err(|e| anyhow::anyhow!("Encoder produced an undecodable payload: {}", e))?;
    println!("{}", "Decoded:".green());
    print_measurements(&measurements);

    Ok(())
}
