// src/logging.rs

use crate::config::Config;
use crate::errors::{FinchatError, FinchatResult};
use crate::models::ApiCallLog;
use flexi_logger::{FileSpec, Logger, LoggerHandle};
use log::info;
use std::path::PathBuf;

/// Starts the file logger. The terminal is owned by the widget, so nothing goes to stderr.
/// Keep the returned handle alive for the lifetime of the process.
pub fn init_logging(config: &Config) -> FinchatResult<LoggerHandle> {
    config.level_filter()?;
    let directory = log_directory(config)?;

    let handle = Logger::try_with_str(&config.log_level)?
        .log_to_file(FileSpec::default().directory(directory).basename("finchat"))
        .format(flexi_logger::detailed_format)
        .start()?;

    Ok(handle)
}

fn log_directory(config: &Config) -> FinchatResult<PathBuf> {
    if let Some(dir) = &config.log_dir {
        return Ok(dir.clone());
    }

    dirs::data_local_dir()
        .map(|dir| dir.join("finchat").join("logs"))
        .ok_or_else(|| FinchatError::config_error("Could not determine a log directory"))
}

/// Logs an API call.
pub fn log_api_call(log: &ApiCallLog) {
    info!(
        target: "finchat::api",
        "[{}] {} - {} - Status: {} - Time: {}ms",
        log.timestamp.to_rfc3339(),
        log.endpoint,
        log.request_summary,
        log.response_status,
        log.response_time_ms
    );
}
