//! The process-wide holder of the live configuration snapshot.

use crate::core::ConfigSnapshot;
use crate::error::{LoggerError, Result};
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Lock-free holder of the current [`ConfigSnapshot`].
///
/// Reads are a single atomic pointer load, so any number of readers can run
/// while the watcher installs a replacement. A reader sees either the old or
/// the new snapshot in full, never a mix of their fields.
///
/// The store starts out unconfigured; [`read`](Self::read) reports
/// [`LoggerError::NotConfigured`] until the first [`replace`](Self::replace).
///
/// # Examples
///
/// ```rust
/// use mqtt_hotlog::core::{ConfigSnapshot, ConfigStore};
///
/// let store = ConfigStore::new();
/// assert!(store.read().is_err());
///
/// store.replace(ConfigSnapshot::new("logs", "localhost", 1883, "app").unwrap());
/// assert_eq!(store.read().unwrap().topic(), "logs");
/// ```
pub struct ConfigStore {
    current: ArcSwapOption<ConfigSnapshot>,
    subscribers: SubscriberRegistry,
}

impl ConfigStore {
    /// Create an unconfigured store.
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Create a store already holding `initial`.
    pub fn with_snapshot(initial: ConfigSnapshot) -> Self {
        Self {
            current: ArcSwapOption::from_pointee(initial),
            subscribers: SubscriberRegistry::new(),
        }
    }

    /// Get the currently installed snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::NotConfigured` if nothing was ever installed.
    pub fn read(&self) -> Result<Arc<ConfigSnapshot>> {
        self.current.load_full().ok_or(LoggerError::NotConfigured)
    }

    /// Whether a snapshot has been installed.
    pub fn is_configured(&self) -> bool {
        self.current.load().is_some()
    }

    /// Atomically install `snapshot` and notify subscribers.
    ///
    /// Every `read()` that starts after this returns observes `snapshot`.
    pub fn replace(&self, snapshot: ConfigSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(Arc::clone(&snapshot)));
        tracing::debug!(
            topic = snapshot.topic(),
            broker = snapshot.broker(),
            port = snapshot.port(),
            "installed configuration snapshot"
        );
        self.subscribers.notify_all(&snapshot);
    }

    /// Register a callback invoked after every `replace`.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigSnapshot) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
