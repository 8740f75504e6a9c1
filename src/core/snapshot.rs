//! Immutable broker/topic configuration values.

use crate::error::ValidationError;
use serde::Serialize;
use std::fmt;

/// One complete, immutable logger configuration.
///
/// A configuration change always produces a new snapshot; fields are private
/// so an installed snapshot can never be edited in place.
///
/// # Examples
///
/// ```rust
/// use mqtt_hotlog::core::ConfigSnapshot;
///
/// let snapshot = ConfigSnapshot::new("logs/app", "localhost", 1883, "billing").unwrap();
/// assert_eq!(snapshot.port(), 1883);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    topic: String,
    broker: String,
    port: u16,
    source: String,
}

impl ConfigSnapshot {
    /// Create a snapshot from explicit values.
    ///
    /// Empty strings are accepted; only the port is range-checked.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `port` is 0.
    pub fn new(
        topic: impl Into<String>,
        broker: impl Into<String>,
        port: u16,
        source: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if port == 0 {
            return Err(ValidationError::invalid_field(
                "port",
                "must be between 1 and 65535",
            ));
        }

        Ok(Self {
            topic: topic.into(),
            broker: broker.into(),
            port,
            source: source.into(),
        })
    }

    /// Create a snapshot from a port read as a wide integer (e.g. from a file).
    pub(crate) fn from_wide_port(
        topic: String,
        broker: String,
        port: i64,
        source: String,
    ) -> Result<Self, ValidationError> {
        let port = u16::try_from(port).map_err(|_| {
            ValidationError::invalid_field("port", format!("{} is out of range 1-65535", port))
        })?;
        Self::new(topic, broker, port, source)
    }

    /// Topic log records are published to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Broker host name or address.
    pub fn broker(&self) -> &str {
        &self.broker
    }

    /// Broker port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Source identifier stamped into every record's `from` field.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MQTT logger configuration:")?;
        writeln!(f, "  Topic:  {}", self.topic)?;
        writeln!(f, "  Broker: {}", self.broker)?;
        writeln!(f, "  Port:   {}", self.port)?;
        write!(f, "  Source: {}", self.source)
    }
}
