//! The logger service: configuration lifecycle and fire-and-forget dispatch.

use crate::core::{ConfigSnapshot, ConfigStore, SnapshotLoader};
use crate::error::{ErrorChannel, LoggerError, Result};
use crate::logger::LoggerBuilder;
use crate::logger::record::LogRecord;
use crate::logger::stats::{DispatchCounters, DispatchStats};
use crate::notify::{ConfigWatcher, SubscriptionHandle, WatchOptions};
use crate::publish::PublishClient;
use serde::Serialize;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

/// Where a logger's configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigOrigin {
    /// Explicit values, installed directly.
    Values(ConfigSnapshot),
    /// A configuration file, loaded now and hot-reloaded afterwards.
    File(PathBuf),
}

impl ConfigOrigin {
    /// Explicit values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `port` is 0.
    pub fn values(
        topic: impl Into<String>,
        broker: impl Into<String>,
        port: u16,
        source: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::Values(ConfigSnapshot::new(topic, broker, port, source)?))
    }

    /// A configuration file to load and watch.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

impl From<ConfigSnapshot> for ConfigOrigin {
    fn from(snapshot: ConfigSnapshot) -> Self {
        Self::Values(snapshot)
    }
}

pub(crate) struct LoggerInner {
    pub(crate) store: Arc<ConfigStore>,
    pub(crate) publisher: Arc<dyn PublishClient>,
    pub(crate) errors: ErrorChannel,
    pub(crate) watch_options: WatchOptions,
    pub(crate) runtime: Handle,
    pub(crate) watcher: Mutex<Option<ConfigWatcher>>,
    pub(crate) counters: Arc<DispatchCounters>,
}

/// Publishes structured log records to the configured MQTT topic.
///
/// `Logger` is a cheap handle: clones share one configuration store, one
/// publish client and at most one file watcher. Build one at start-up and
/// pass it around, or install it process-wide with
/// [`global::install`](crate::global::install).
///
/// Every `log` call reads the snapshot installed at that moment, builds the
/// record on the calling thread and spawns a dispatch unit that publishes it.
/// The caller never waits for the broker. Dispatch units are unbounded and
/// unqueued: a failed publish is reported on the error channel and the record
/// is dropped without retry.
///
/// # Examples
///
/// ```rust,no_run
/// use mqtt_hotlog::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let logger = Logger::builder().build()?;
/// logger.configure(ConfigOrigin::file("logging.yaml")).await?;
///
/// logger.log("INFO", "service started")?;
/// logger.log_with("ERROR", "payment failed", &serde_json::json!({"order": 42}))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Create a builder for constructing a logger.
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub(crate) fn from_inner(inner: LoggerInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Install a configuration, replacing whatever was there.
    ///
    /// With [`ConfigOrigin::Values`] the snapshot is installed directly and
    /// any running file watcher is stopped, so the last caller wins. With
    /// [`ConfigOrigin::File`] the file is parsed first; only if that succeeds
    /// is the running watcher, if any, replaced by one on the new path.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat`, `WatcherIo`, or `ConfigParse` if the file
    /// cannot be used. The previous configuration then stays in effect.
    pub async fn configure(&self, origin: ConfigOrigin) -> Result<()> {
        let mut active = self.inner.watcher.lock().await;

        match origin {
            ConfigOrigin::Values(snapshot) => {
                if let Some(watcher) = active.take() {
                    watcher.stop().await;
                }
                self.inner.store.replace(snapshot);
            }
            ConfigOrigin::File(path) => {
                let loader = SnapshotLoader::new(path)?;
                let content = loader.read()?;
                let snapshot = loader.parse(&content)?;

                // Nothing below can fail, so the old watcher is never lost.
                if let Some(watcher) = active.take() {
                    watcher.stop().await;
                }
                let watcher = ConfigWatcher::start_with(
                    loader,
                    &content,
                    snapshot,
                    Arc::clone(&self.inner.store),
                    self.inner.watch_options.clone(),
                    self.inner.errors.clone(),
                    &self.inner.runtime,
                );
                *active = Some(watcher);
            }
        }

        Ok(())
    }

    /// Stop hot-reloading. The current snapshot stays installed.
    ///
    /// Returns `false` if no watcher was running.
    pub async fn stop_watching(&self) -> bool {
        match self.inner.watcher.lock().await.take() {
            Some(watcher) => {
                watcher.stop().await;
                true
            }
            None => false,
        }
    }

    /// The file currently being watched, if any.
    pub async fn watched_path(&self) -> Option<PathBuf> {
        self.inner
            .watcher
            .lock()
            .await
            .as_ref()
            .map(|watcher| watcher.path().to_path_buf())
    }

    /// Publish a record with no extra data.
    ///
    /// Returns as soon as the record is handed to a dispatch unit.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured`, without publishing, if no configuration was
    /// ever installed. Publish failures are never returned.
    #[track_caller]
    pub fn log(&self, level: &str, message: &str) -> Result<()> {
        self.dispatch::<()>(level, message, None, Location::caller())
    }

    /// Publish a record carrying `extra` as a nested JSON document.
    ///
    /// `extra` is normally a map; it is encoded on its own and stored as a
    /// string in the record's `extra` field. An empty map is left out.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` as for [`log`](Self::log), or `Serialization`
    /// if `extra` cannot be encoded as JSON.
    #[track_caller]
    pub fn log_with<E>(&self, level: &str, message: &str, extra: &E) -> Result<()>
    where
        E: Serialize + ?Sized,
    {
        self.dispatch(level, message, Some(extra), Location::caller())
    }

    fn dispatch<E>(
        &self,
        level: &str,
        message: &str,
        extra: Option<&E>,
        caller: &Location<'_>,
    ) -> Result<()>
    where
        E: Serialize + ?Sized,
    {
        let snapshot = match self.inner.store.read() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.inner.counters.record_unconfigured();
                tracing::warn!(log_level = level, "dropping log record: {}", err);
                return Err(err);
            }
        };

        let record = LogRecord::capture(&snapshot, level, message, caller, extra)?;
        let payload = record.encode()?;

        let publisher = Arc::clone(&self.inner.publisher);
        let errors = self.inner.errors.clone();
        let counters = Arc::clone(&self.inner.counters);

        counters.record_dispatched();
        self.inner.runtime.spawn(async move {
            let result = publisher
                .publish(snapshot.topic(), payload, snapshot.broker(), snapshot.port())
                .await;

            match result {
                Ok(()) => {
                    counters.record_delivered();
                    tracing::debug!(topic = snapshot.topic(), "published log record");
                }
                Err(err) => {
                    counters.record_failed();
                    errors.report(&LoggerError::Publish(err));
                }
            }
        });

        Ok(())
    }

    /// The snapshot `log` would use right now.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` if nothing was ever installed.
    pub fn snapshot(&self) -> Result<Arc<ConfigSnapshot>> {
        self.inner.store.read()
    }

    /// Whether a configuration has been installed.
    pub fn is_configured(&self) -> bool {
        self.inner.store.is_configured()
    }

    /// The underlying configuration store.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.inner.store
    }

    /// Human-readable description of the current configuration.
    pub fn describe(&self) -> String {
        match self.inner.store.read() {
            Ok(snapshot) => snapshot.to_string(),
            Err(_) => "MQTT logger is not configured.".to_string(),
        }
    }

    /// Register a callback invoked with every newly installed snapshot.
    ///
    /// Drop the returned handle to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigSnapshot) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(callback)
    }

    /// Current dispatch counters.
    pub fn stats(&self) -> DispatchStats {
        self.inner.counters.snapshot()
    }

    /// Whether two handles refer to the same logger.
    pub fn ptr_eq(a: &Logger, b: &Logger) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("configured", &self.is_configured())
            .field("stats", &self.stats())
            .finish()
    }
}
