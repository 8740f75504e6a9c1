//! Counters for dispatched log records.

#[cfg(feature = "metrics")]
use crate::metrics::DispatchMetrics;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a logger's dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Records handed to a dispatch unit.
    pub dispatched: u64,
    /// Dispatch units whose publish succeeded.
    pub delivered: u64,
    /// Dispatch units whose publish failed; those records were dropped.
    pub failed: u64,
    /// `log()` calls rejected because no configuration was installed.
    pub unconfigured: u64,
}

impl DispatchStats {
    /// Dispatch units that have not finished yet.
    pub fn in_flight(&self) -> u64 {
        self.dispatched
            .saturating_sub(self.delivered)
            .saturating_sub(self.failed)
    }
}

/// In-process counters, optionally mirrored to OpenTelemetry.
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    dispatched: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    unconfigured: AtomicU64,
    #[cfg(feature = "metrics")]
    metrics: Option<DispatchMetrics>,
}

impl DispatchCounters {
    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(metrics: Option<DispatchMetrics>) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatched();
        }
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_delivered();
        }
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_failed();
        }
    }

    pub(crate) fn record_unconfigured(&self) {
        self.unconfigured.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_unconfigured();
        }
    }

    pub(crate) fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unconfigured: self.unconfigured.load(Ordering::Relaxed),
        }
    }
}
