//! OpenTelemetry export of dispatch counters.
//!
//! Tracks:
//! - Records dispatched
//! - Publishes delivered or failed
//! - Log calls rejected while unconfigured
//!
//! # Examples
//!
//! ```rust,no_run
//! use mqtt_hotlog::prelude::*;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let logger = Logger::builder()
//!     .with_metrics(global::meter("my-app"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod dispatch_metrics;

pub use dispatch_metrics::DispatchMetrics;
