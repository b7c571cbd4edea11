//! Decode an uplink payload captured from the network server.

mod hex;
mod logging;
mod report;

use clap::Parser;
use colored::Colorize;
use meter_node::payload::decode;

use hex::{format_hex, parse_hex};
use report::print_measurements;

#[derive(Parser)]
#[command(name = "meter-decode")]
#[command(about = "Decode a metering node TLV payload")]
struct Args {
    /// Payload bytes in hex, e.g. "02 64 04 01"
    payload: String,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let bytes = parse_hex(&args.payload)?;
    println!("{} ({} bytes)", format_hex(&bytes).bold(), bytes.len());

    match decode(&bytes) {
        Ok(measurements) => {
            println!("{}", "Decoded:".green());
            print_measurements(&measurements);
            Ok(())
        }
        Err(e) => anyhow::bail!("Payload does not decode: {}", e),
    }
}
