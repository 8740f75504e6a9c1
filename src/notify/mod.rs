//! Configuration change notification system.
//!
//! Provides the file watcher that hot-reloads the configuration store, and
//! subscriber-based notifications when a new snapshot is installed.

pub mod subscriber;
pub mod watcher;

pub use subscriber::{SubscriberRegistry, SubscriptionHandle};
pub use watcher::{ConfigWatcher, WatchOptions};
