use anyhow::{Context, Result};
use chrono::Utc;
use log::{Level, LevelFilter};
use std::path::PathBuf;

use crate::config::LoggingConfig;

/// Format a single log line the way it lands in the log file
pub fn format_line(level: Level, target: &str, message: &std::fmt::Arguments) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
    format!("[{}] {:<5} {}: {}", timestamp, level, target, message)
}

/// Location of the log file under the user cache directory
pub fn get_log_file_path() -> Result<PathBuf> {
    dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))
        .map(|dir| dir.join("workshop-sync").join("workshop-sync.log"))
}

/// Install the global `log` backend
///
/// Does nothing when logging is disabled. Returns the log file path when a
/// file writer was installed.
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    if !config.enabled {
        return Ok(None);
    }

    let path = get_log_file_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("{}", format_line(record.level(), record.target(), message))))
        .level(config.level_filter()?)
        // SQL statement logging drowns out everything else
        .level_for("sqlx", LevelFilter::Warn)
        .level_for("sea_orm", LevelFilter::Warn)
        .chain(fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?)
        .apply()
        .context("A global logger is already installed")?;

    Ok(Some(path))
}
