use std::io::{self, Write};

use log::Record;

use crate::sink::CLEAR_LINE;

/// Sends log records to stderr, filtered by `filter` or `RUST_LOG`, at
/// `info` when neither is set.
///
/// With `clear_line`, each record first wipes the terminal line so it doesn't
/// land after a redrawn uptime; the next tick draws the uptime again below.
/// Only the first call installs a logger.
pub fn init_logging(filter: Option<&str>, clear_line: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);

    if let Some(filter) = filter {
        builder.parse_filters(filter);
    } else if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    if clear_line {
        builder.format(|buf, record| write_record(buf, record));
    }

    if builder.target(env_logger::Target::Stderr).try_init().is_ok() {
        log::debug!("logger installed, clear_line={}", clear_line);
    }
}

fn write_record<W: Write>(out: &mut W, record: &Record) -> io::Result<()> {
    writeln!(
        out,
        "{}[{} {}] {}",
        CLEAR_LINE,
        record.level(),
        record.target(),
        record.args()
    )
}
