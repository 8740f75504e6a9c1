//! Builder for constructing Logger instances.

use crate::core::ConfigStore;
use crate::error::{ErrorChannel, LoggerError, Result};
use crate::logger::handle::{Logger, LoggerInner};
use crate::logger::stats::DispatchCounters;
#[cfg(feature = "metrics")]
use crate::metrics::DispatchMetrics;
use crate::notify::WatchOptions;
use crate::publish::PublishClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

/// Builder for constructing a [`Logger`].
///
/// Provides a fluent interface for the publish client, the error channel and
/// the watcher's timing. The logger starts unconfigured; install a
/// configuration with [`Logger::configure`].
///
/// # Examples
///
/// ```rust,no_run
/// use mqtt_hotlog::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let logger = Logger::builder()
///     .poll_interval(Duration::from_millis(250))
///     .on_error(|err| eprintln!("log pipeline: {}", err))
///     .build()?;
///
/// logger.configure(ConfigOrigin::file("logging.toml")).await?;
/// # Ok(())
/// # }
/// ```
pub struct LoggerBuilder {
    publisher: Option<Arc<dyn PublishClient>>,
    errors: ErrorChannel,
    watch_options: WatchOptions,
    runtime: Option<Handle>,
    #[cfg(feature = "metrics")]
    metrics: Option<DispatchMetrics>,
}

impl LoggerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            publisher: None,
            errors: ErrorChannel::new(),
            watch_options: WatchOptions::default(),
            runtime: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Use `publisher` to deliver records.
    ///
    /// Defaults to [`MqttPublisher`](crate::publish::MqttPublisher) when the
    /// `mqtt` feature is enabled.
    pub fn publisher<P: PublishClient + 'static>(mut self, publisher: P) -> Self {
        self.publisher = Some(Arc::new(publisher));
        self
    }

    /// Use an already shared publish client.
    pub fn shared_publisher(mut self, publisher: Arc<dyn PublishClient>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Forward background errors (rejected reloads, failed publishes) to `handler`.
    ///
    /// Errors are always emitted through `tracing` as well.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&LoggerError) + Send + Sync + 'static,
    {
        self.errors = ErrorChannel::with_handler(handler);
        self
    }

    /// How often a watched file is re-read (default: 1s).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.watch_options.poll_interval = interval;
        self
    }

    /// Quiet period after a filesystem event before re-reading (default: 100ms).
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.watch_options.debounce = debounce;
        self
    }

    /// Wake the watcher on filesystem events as well as on its poll interval.
    pub fn fs_events(mut self, enabled: bool) -> Self {
        self.watch_options.fs_events = enabled;
        self
    }

    /// Run dispatch units and the watcher on `runtime`.
    ///
    /// Defaults to the runtime `build()` is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Export dispatch counters through `meter`.
    ///
    /// [`Logger::stats`] keeps working either way.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(DispatchMetrics::new(meter));
        self
    }

    /// Build the logger.
    ///
    /// # Errors
    ///
    /// Returns `NoRuntime` if no runtime handle was given and `build()` is not
    /// called from within a tokio runtime, and `Publish` if no publish client
    /// was given and the `mqtt` feature is disabled.
    pub fn build(self) -> Result<Logger> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| LoggerError::NoRuntime)?,
        };

        let publisher = match self.publisher {
            Some(publisher) => publisher,
            None => default_publisher()?,
        };

        #[cfg(feature = "metrics")]
        let counters = DispatchCounters::with_metrics(self.metrics);
        #[cfg(not(feature = "metrics"))]
        let counters = DispatchCounters::default();

        Ok(Logger::from_inner(LoggerInner {
            store: Arc::new(ConfigStore::new()),
            publisher,
            errors: self.errors,
            watch_options: self.watch_options,
            runtime,
            watcher: Mutex::new(None),
            counters: Arc::new(counters),
        }))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "mqtt")]
fn default_publisher() -> Result<Arc<dyn PublishClient>> {
    Ok(Arc::new(crate::publish::MqttPublisher::new()))
}

#[cfg(not(feature = "mqtt"))]
fn default_publisher() -> Result<Arc<dyn PublishClient>> {
    Err(crate::error::PublishError::Client(
        "no publish client configured and the `mqtt` feature is disabled".to_string(),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_outside_runtime() {
        let result = LoggerBuilder::new().build();
        assert!(matches!(result, Err(LoggerError::NoRuntime)));
    }

    #[test]
    fn test_build_with_explicit_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let logger = LoggerBuilder::new()
            .runtime(runtime.handle().clone())
            .build();

        #[cfg(feature = "mqtt")]
        assert!(logger.is_ok());
        #[cfg(not(feature = "mqtt"))]
        assert!(logger.is_err());
    }

    #[test]
    fn test_builder_watch_options() {
        let builder = LoggerBuilder::new()
            .poll_interval(Duration::from_millis(250))
            .debounce(Duration::from_millis(5))
            .fs_events(false);

        assert_eq!(builder.watch_options.poll_interval, Duration::from_millis(250));
        assert_eq!(builder.watch_options.debounce, Duration::from_millis(5));
        assert!(!builder.watch_options.fs_events);
    }

    #[cfg(feature = "metrics")]
    #[tokio::test]
    async fn test_build_with_metrics() {
        let logger = LoggerBuilder::new()
            .runtime(Handle::current())
            .with_metrics(opentelemetry::global::meter("test"))
            .shared_publisher(Arc::new(NoopPublisher))
            .build()
            .unwrap();

        assert!(logger.log("INFO", "unconfigured").is_err());
        assert_eq!(logger.stats().unconfigured, 1);
    }

    #[cfg(feature = "metrics")]
    struct NoopPublisher;

    #[cfg(feature = "metrics")]
    #[async_trait::async_trait]
    impl PublishClient for NoopPublisher {
        async fn publish(
            &self,
            _topic: &str,
            _payload: Vec<u8>,
            _host: &str,
            _port: u16,
        ) -> std::result::Result<(), crate::error::PublishError> {
            Ok(())
        }
    }
}
