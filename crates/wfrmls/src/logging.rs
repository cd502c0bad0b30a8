//! Tracing setup. `RUST_LOG` always wins over flags and config.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wfrmls_core::AgentConfig;

use crate::error::CliError;

pub const AGENT_LOG_FILE: &str = "agent.log";

fn verbosity_level(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Stderr logging for one-shot commands; quiet unless `-v` is given.
pub fn init_cli(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbosity_level(verbosity).unwrap_or("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Stderr plus, when enabled, a daily `agent.log` in `log_dir`.
///
/// The returned guard flushes the file writer on drop and must be held
/// for the life of the agent.
pub fn init_agent(config: &AgentConfig, verbosity: u8) -> Result<Option<WorkerGuard>, CliError> {
    let level = verbosity_level(verbosity).unwrap_or_else(|| config.log_level.as_filter());

    let (file_layer, guard) = if config.log_to_file {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(AGENT_LOG_FILE)
            .build(&config.log_dir)
            .map_err(|e| CliError::Logging(e.to_string()))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    Ok(guard)
}
