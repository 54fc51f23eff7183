//! Logging infrastructure
//!
//! Structured logging setup for the appliance: a console layer with
//! `RUST_LOG`-style filtering, plus an optional daily-rotating file
//! layer under the work directory so a bench session can be inspected
//! after the fact.

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system
///
/// # Arguments
/// * `level` - default log level when `RUST_LOG` is unset
/// * `log_dir` - optional directory for the daily-rotating file log
pub fn init_logger(level: &str, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(dir) = log_dir {
        fs::create_dir_all(dir)?;
        let file = RollingFileAppender::new(Rotation::DAILY, dir, "station");
        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));
        registry.with(file_layer).init();
    } else {
        registry.init();
    }

    Ok(())
}
