//! Tracing setup.
//!
//! The alternate screen owns stdout, so logs go to a file. If the file can't
//! be opened, logging is off rather than scribbling over the display.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(log_path: &Path, warnings: &[String]) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::registry().with(env_filter).init();
            eprintln!("Warning: could not open log file {}: {e}", log_path.display());
        }
    }

    for warning in warnings {
        tracing::warn!("{warning}");
    }
}
