//! Logger setup shared by the tools.

use std::io::Write;

/// Route the node core's `log` records to stderr.
///
/// `RUST_LOG` still overrides the level picked from `-v` flags.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format(|buf, record| {
        writeln!(buf, "[{:<5} {}] {}", record.level(), record.target(), record.args())
    });
    let _ = builder.try_init();
}
