use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "aggregator.log";
const DEFAULT_FILTER: &str = "elections_to_watch=info,warn";

/// Console output plus a daily-rotated JSON file under `logs/`.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    if let Err(e) = fs::create_dir_all(LOG_DIR) {
        eprintln!("cannot create {}: {}", LOG_DIR, e);
    }

    let (json_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(json_writer))
        .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
        .init();

    // flushing stops when the guard drops
    std::mem::forget(guard);
}
