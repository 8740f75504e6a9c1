//! The process-wide logger.
//!
//! Most code should hold a [`Logger`] handle explicitly. For applications that
//! want one logger reachable from anywhere, this module keeps a single
//! instance for the life of the process. It is created once and reconfigured
//! in place afterwards, so every access returns the same logger.

use crate::error::{LoggerError, Result};
use crate::logger::{ConfigOrigin, Logger};
use serde::Serialize;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// The process-wide logger, if one was set up.
pub fn logger() -> Option<&'static Logger> {
    GLOBAL.get()
}

/// Install `logger` as the process-wide logger.
///
/// If a logger is already installed it is kept and returned, and `logger` is
/// dropped; compare with [`Logger::ptr_eq`] to tell the cases apart.
pub fn install(logger: Logger) -> &'static Logger {
    GLOBAL.get_or_init(|| logger)
}

/// Configure the process-wide logger, creating it with default settings on
/// first use.
///
/// Calling this again reconfigures the same instance: new explicit values
/// replace the old ones, a new file path redirects the watcher.
///
/// # Examples
///
/// ```rust,no_run
/// use mqtt_hotlog::global;
/// use mqtt_hotlog::logger::ConfigOrigin;
///
/// # async fn example() -> mqtt_hotlog::error::Result<()> {
/// global::setup_logger(ConfigOrigin::values("logs/app", "localhost", 1883, "billing")?).await?;
/// global::log("INFO", "ready")?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the logger cannot be built or the configuration
/// cannot be installed.
pub async fn setup_logger(origin: ConfigOrigin) -> Result<&'static Logger> {
    let logger = match GLOBAL.get() {
        Some(logger) => logger,
        None => install(Logger::builder().build()?),
    };
    logger.configure(origin).await?;
    Ok(logger)
}

/// Log through the process-wide logger.
///
/// # Errors
///
/// Returns `NotConfigured` if no logger was set up or it has no configuration.
#[track_caller]
pub fn log(level: &str, message: &str) -> Result<()> {
    match GLOBAL.get() {
        Some(logger) => logger.log(level, message),
        None => not_installed(level),
    }
}

/// Log through the process-wide logger with extra data.
///
/// # Errors
///
/// As for [`log`], plus `Serialization` if `extra` cannot be encoded.
#[track_caller]
pub fn log_with<E>(level: &str, message: &str, extra: &E) -> Result<()>
where
    E: Serialize + ?Sized,
{
    match GLOBAL.get() {
        Some(logger) => logger.log_with(level, message, extra),
        None => not_installed(level),
    }
}

fn not_installed(level: &str) -> Result<()> {
    let err = LoggerError::NotConfigured;
    tracing::warn!(log_level = level, "dropping log record: {}", err);
    Err(err)
}
