//! Dispatch metrics using OpenTelemetry.

use opentelemetry::metrics::{Counter, Meter};

/// OpenTelemetry counters mirroring a logger's [`DispatchStats`].
///
/// [`DispatchStats`]: crate::logger::DispatchStats
///
/// # Examples
///
/// ```rust,no_run
/// use mqtt_hotlog::metrics::DispatchMetrics;
/// use opentelemetry::global;
///
/// let metrics = DispatchMetrics::new(global::meter("mqtt-hotlog"));
/// metrics.record_dispatched();
/// ```
#[derive(Clone)]
pub struct DispatchMetrics {
    dispatched: Counter<u64>,
    delivered: Counter<u64>,
    failed: Counter<u64>,
    unconfigured: Counter<u64>,
}

impl DispatchMetrics {
    /// Create the counters on `meter`.
    pub fn new(meter: Meter) -> Self {
        let dispatched = meter
            .u64_counter("mqtt_hotlog.dispatch.started")
            .with_description("Log records handed to a dispatch unit")
            .build();

        let delivered = meter
            .u64_counter("mqtt_hotlog.dispatch.delivered")
            .with_description("Log records published successfully")
            .build();

        let failed = meter
            .u64_counter("mqtt_hotlog.dispatch.failed")
            .with_description("Log records dropped after a failed publish")
            .build();

        let unconfigured = meter
            .u64_counter("mqtt_hotlog.log.unconfigured")
            .with_description("Log calls rejected because no configuration was installed")
            .build();

        Self {
            dispatched,
            delivered,
            failed,
            unconfigured,
        }
    }

    /// Count a record handed to a dispatch unit.
    pub fn record_dispatched(&self) {
        self.dispatched.add(1, &[]);
    }

    /// Count a successful publish.
    pub fn record_delivered(&self) {
        self.delivered.add(1, &[]);
    }

    /// Count a failed publish.
    pub fn record_failed(&self) {
        self.failed.add(1, &[]);
    }

    /// Count a log call made before any configuration was installed.
    pub fn record_unconfigured(&self) {
        self.unconfigured.add(1, &[]);
    }
}

impl std::fmt::Debug for DispatchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMetrics").finish_non_exhaustive()
    }
}
