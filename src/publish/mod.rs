//! The narrow interface through which encoded records reach a broker.
//!
//! The logger never builds a transport itself. It hands each encoded record
//! to a [`PublishClient`], which delivers it best-effort and reports failure
//! through [`PublishError`].

#[cfg(feature = "mqtt")]
mod mqtt;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttPublisher, MqttPublisherBuilder};

pub use crate::error::PublishError;

use async_trait::async_trait;

/// Delivers one message to a broker, best-effort.
///
/// Implementations must be safe to call from many dispatch units at once.
/// The logger applies no timeout of its own; an implementation that can hang
/// should bound each call itself.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use mqtt_hotlog::publish::{PublishClient, PublishError};
///
/// struct StdoutPublisher;
///
/// #[async_trait]
/// impl PublishClient for StdoutPublisher {
///     async fn publish(
///         &self,
///         topic: &str,
///         payload: Vec<u8>,
///         host: &str,
///         port: u16,
///     ) -> Result<(), PublishError> {
///         println!("{}:{} {} {}", host, port, topic, String::from_utf8_lossy(&payload));
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait PublishClient: Send + Sync {
    /// Publish `payload` on `topic` at the broker `host:port`.
    ///
    /// # Errors
    ///
    /// Returns a `PublishError` on connection, timeout, or broker failure.
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        host: &str,
        port: u16,
    ) -> Result<(), PublishError>;
}
