use std::path::Path;

use tracing_appender::rolling::daily;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Install the global subscriber. Console output goes to stderr: stdout
/// carries the host-link protocol and a log line there would corrupt it.
/// With a `log_dir`, logs land in a daily-rolling file instead.
pub fn init(level: &str, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)?;
    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = daily(dir, "otsim-bridge.log");
            Registry::default()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(appender))
                .init();
        }
        None => {
            Registry::default()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}
