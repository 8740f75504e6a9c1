//! Error types for mqtt-hotlog.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Result type alias for mqtt-hotlog operations.
pub type Result<T> = std::result::Result<T, LoggerError>;

/// Errors that can occur while configuring the logger or publishing through it.
///
/// None of these is fatal to the host process. Errors raised away from the
/// caller (watcher reloads, background publishes) are routed to the error
/// channel instead of being returned.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// `log()` was called before any configuration was installed.
    #[error("Logger not configured: set up the logger before logging")]
    NotConfigured,

    /// A configuration file was malformed or incomplete.
    #[error("Failed to parse configuration file {}: {reason}", path.display())]
    ConfigParse {
        /// The file that failed to parse
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    WatcherIo {
        /// The file being watched
        path: PathBuf,
        /// The underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// The configuration file extension does not map to a known format.
    #[error(
        "Unsupported configuration format: {}. Supported: .yaml, .yml, .toml, .json",
        .0.display()
    )]
    UnsupportedFormat(PathBuf),

    /// Configuration values were well-formed but out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    /// The publish client failed to deliver a record.
    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),

    /// The record or its extra data could not be encoded.
    #[error("Failed to encode log record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No tokio runtime was available to run dispatch units on.
    #[error("No tokio runtime available; build the logger inside a runtime or pass a handle")]
    NoRuntime,

    /// Filesystem change notification could not be set up.
    #[error("File watching error: {0}")]
    Watch(String),
}

/// Failure reported by a [`PublishClient`](crate::publish::PublishClient).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    /// The broker could not be reached or dropped the connection.
    #[error("connection to {host}:{port} failed: {reason}")]
    Connection {
        /// Broker host
        host: String,
        /// Broker port
        port: u16,
        /// Transport-level reason
        reason: String,
    },

    /// The publish did not complete in time.
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    /// The client rejected the request before sending it.
    #[error("client error: {0}")]
    Client(String),
}

/// Validation error for configuration snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A specific field has an invalid value.
    InvalidField {
        /// The field name
        field: String,
        /// The reason why it's invalid
        reason: String,
    },
}

impl ValidationError {
    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Callback type for errors raised away from the caller.
pub type ErrorHandler = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Where background failures go: always `tracing`, plus an optional callback.
///
/// Reloads rejected by the watcher and failed publishes are never returned
/// to a caller, so this is the only place they become visible.
#[derive(Clone, Default)]
pub struct ErrorChannel {
    handler: Option<ErrorHandler>,
}

impl ErrorChannel {
    /// An error channel that only emits `tracing` events.
    pub fn new() -> Self {
        Self { handler: None }
    }

    /// An error channel that also forwards every error to `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&LoggerError) + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
        }
    }

    /// Report `err` to tracing and the registered handler, if any.
    pub fn report(&self, err: &LoggerError) {
        match err {
            LoggerError::Publish(_) => tracing::error!(error = %err, "dropped log record"),
            _ => tracing::warn!(error = %err, "mqtt-hotlog error"),
        }

        if let Some(handler) = &self.handler {
            handler(err);
        }
    }
}

impl fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
