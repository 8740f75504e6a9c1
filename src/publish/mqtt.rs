//! One-shot MQTT publishing over `rumqttc`.

use super::{PublishClient, PublishError};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, QoS};
use std::time::Duration;

/// Requests queued per connection: the publish and the disconnect.
const REQUEST_CAPACITY: usize = 4;

/// A [`PublishClient`] that opens a fresh MQTT connection per message.
///
/// Each call connects, publishes once at QoS 0 without retain, disconnects,
/// and returns. Nothing is shared between calls, so concurrent dispatch units
/// never contend on a connection. This trades throughput for simplicity and
/// suits low-volume diagnostic logging.
///
/// # Examples
///
/// ```rust,no_run
/// use mqtt_hotlog::publish::MqttPublisher;
/// use std::time::Duration;
///
/// let publisher = MqttPublisher::builder()
///     .client_id_prefix("billing")
///     .timeout(Duration::from_secs(2))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct MqttPublisher {
    client_id_prefix: String,
    timeout: Duration,
    keep_alive: Duration,
}

impl MqttPublisher {
    /// Create a publisher with default settings.
    pub fn new() -> Self {
        MqttPublisherBuilder::new().build()
    }

    /// Create a builder for customizing the publisher.
    pub fn builder() -> MqttPublisherBuilder {
        MqttPublisherBuilder::new()
    }

    /// Upper bound on one publish attempt, connect to disconnect.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client_id(&self) -> String {
        format!("{}-{:016x}", self.client_id_prefix, fastrand::u64(..))
    }

    async fn publish_once(
        &self,
        topic: &str,
        payload: Vec<u8>,
        host: &str,
        port: u16,
    ) -> Result<(), PublishError> {
        let mut opts = MqttOptions::new(self.client_id(), host, port);
        opts.set_keep_alive(self.keep_alive);
        opts.set_clean_session(true);

        let (client, mut event_loop) = AsyncClient::new(opts, REQUEST_CAPACITY);

        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| PublishError::Client(e.to_string()))?;
        client
            .disconnect()
            .await
            .map_err(|e| PublishError::Client(e.to_string()))?;

        // Drive the connection until the disconnect has gone out, which
        // means the publish before it was written too.
        loop {
            match event_loop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                Ok(_) => continue,
                Err(e) => {
                    return Err(PublishError::Connection {
                        host: host.to_string(),
                        port,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

impl Default for MqttPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PublishClient for MqttPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        host: &str,
        port: u16,
    ) -> Result<(), PublishError> {
        tokio::time::timeout(self.timeout, self.publish_once(topic, payload, host, port))
            .await
            .map_err(|_| PublishError::Timeout(self.timeout))?
    }
}

/// Builder for [`MqttPublisher`].
#[derive(Debug, Clone)]
pub struct MqttPublisherBuilder {
    client_id_prefix: String,
    timeout: Duration,
    keep_alive: Duration,
}

impl MqttPublisherBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            client_id_prefix: "mqtt-hotlog".to_string(),
            timeout: Duration::from_secs(5),
            keep_alive: Duration::from_secs(30),
        }
    }

    /// Prefix for the per-connection client id; a random suffix is appended.
    pub fn client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client_id_prefix = prefix.into();
        self
    }

    /// Upper bound on one publish attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// MQTT keep-alive interval. Rounded up to at least one second.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive.max(Duration::from_secs(1));
        self
    }

    /// Build the publisher.
    pub fn build(self) -> MqttPublisher {
        MqttPublisher {
            client_id_prefix: self.client_id_prefix,
            timeout: self.timeout,
            keep_alive: self.keep_alive,
        }
    }
}

impl Default for MqttPublisherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
