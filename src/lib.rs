//! # mqtt-hotlog
//!
//! Fire-and-forget structured log publishing over MQTT, with broker/topic
//! configuration that hot-reloads from a file.
//!
//! ## Overview
//!
//! `mqtt-hotlog` combines:
//! - Lock-free configuration reads using `arc-swap`
//! - A background watcher that reloads a YAML/TOML/JSON file and rejects bad edits
//! - A non-blocking `log()` that hands each record to its own tokio task
//! - A pluggable publish client, with an `rumqttc`-backed default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mqtt_hotlog::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let logger = Logger::builder().build()?;
//!
//! // Either explicit values...
//! logger.configure(ConfigOrigin::values("logs/app", "localhost", 1883, "billing")?).await?;
//!
//! // ...or a file that is watched for changes
//! logger.configure(ConfigOrigin::file("config/logging.yaml")).await?;
//!
//! logger.log("INFO", "service started")?;
//! logger.log_with("WARN", "slow request", &serde_json::json!({"ms": 1200}))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire format
//!
//! Each message is a JSON object:
//!
//! ```text
//! {"from":"billing","payload":"slow request","level":"WARN",
//!  "timestamp":"2024-05-01 12:00:00","caller":"src/main.rs:12:5",
//!  "extra":"{\"ms\":1200}"}
//! ```
//!
//! `extra` is present only when extra data was given and is itself encoded
//! JSON, carried as a string.
//!
//! ## Delivery
//!
//! Publishing is at-most-once. A failed publish is reported through `tracing`
//! and the optional error callback, then dropped.
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): wake the watcher on filesystem events, not just on its poll interval
//! - `mqtt` (default): the `MqttPublisher` publish client
//! - `metrics`: export dispatch counters through OpenTelemetry

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod global;
pub mod logger;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod notify;
pub mod publish;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigSnapshot, ConfigStore};
    pub use crate::error::{LoggerError, PublishError, Result, ValidationError};
    pub use crate::logger::{ConfigOrigin, DispatchStats, Logger, LoggerBuilder};
    pub use crate::publish::PublishClient;

    #[cfg(feature = "mqtt")]
    pub use crate::publish::MqttPublisher;
}
