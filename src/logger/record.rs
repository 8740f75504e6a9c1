//! The wire shape of one published log event.

use crate::core::ConfigSnapshot;
use crate::error::Result;
use serde::Serialize;
use std::panic::Location;

/// `chrono` format of the `timestamp` field: local time, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One structured log event as published to the broker.
///
/// Serializes to a JSON object with the keys `from`, `payload`, `level`,
/// `timestamp`, `caller` and, only when extra data was supplied, `extra`.
/// `extra` is itself a JSON document carried as a string, so consumers decode
/// it in a second step. Downstream viewers depend on both the key names and
/// this nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    from: String,
    payload: String,
    level: String,
    timestamp: String,
    caller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<String>,
}

impl LogRecord {
    /// Build a record stamped with the current local time.
    ///
    /// `extra` is encoded separately; a value that encodes to `null` or an
    /// empty object counts as no extra data.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::Serialization` if `extra` cannot be encoded.
    pub fn capture<E>(
        snapshot: &ConfigSnapshot,
        level: &str,
        message: &str,
        caller: &Location<'_>,
        extra: Option<&E>,
    ) -> Result<Self>
    where
        E: Serialize + ?Sized,
    {
        let extra = match extra {
            Some(extra) => encode_extra(extra)?,
            None => None,
        };

        Ok(Self {
            from: snapshot.source().to_string(),
            payload: message.to_string(),
            level: level.to_string(),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            caller: format!("{}:{}:{}", caller.file(), caller.line(), caller.column()),
            extra,
        })
    }

    /// Encode the record as the outer JSON document.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// The source identifier.
    pub fn source(&self) -> &str {
        &self.from
    }

    /// The log message.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The caller-supplied severity token.
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Local time the record was captured.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `file:line:column` of the logging call.
    pub fn caller(&self) -> &str {
        &self.caller
    }

    /// The encoded extra data, if any.
    pub fn extra(&self) -> Option<&str> {
        self.extra.as_deref()
    }
}

fn encode_extra<E>(extra: &E) -> Result<Option<String>>
where
    E: Serialize + ?Sized,
{
    let value = serde_json::to_value(extra)?;
    let empty = match &value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    };

    if empty {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(&value)?))
    }
}
