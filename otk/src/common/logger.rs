//! Logging subsystem.
//!
//! All records are emitted as JSON on stderr and tagged with the crate name
//! and version. Modules log through child loggers tagged with their name.
use std::sync::Mutex;

use lazy_static::lazy_static;
use slog::{o, Drain, Logger};

lazy_static! {
    static ref LOGGER: Logger = Logger::root(
        Mutex::new(slog_json::Json::default(std::io::stderr())).map(slog::Fuse),
        o!(
            "crate" => env!("CARGO_PKG_NAME"),
            "version" => env!("CARGO_PKG_VERSION")
        )
    );
}

/// Get a logger for `module`, e.g. `"otk/store"`.
pub fn get_logger(module: &'static str) -> Logger {
    LOGGER.new(o!("module" => module))
}
