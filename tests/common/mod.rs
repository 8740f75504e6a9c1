//! Fake publish clients shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mqtt_hotlog::publish::{PublishClient, PublishError};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// One recorded `publish` call.
#[derive(Debug, Clone)]
pub struct PublishCall {
    pub topic: String,
    pub payload: Vec<u8>,
    pub host: String,
    pub port: u16,
}

impl PublishCall {
    pub fn decoded(&self) -> Value {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// Records every call and succeeds.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    calls: Arc<Mutex<Vec<PublishCall>>>,
    notify: Arc<Notify>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().clone()
    }

    /// Wait until at least `count` calls were recorded, or panic after 2s.
    pub async fn wait_for_calls(&self, count: usize) -> Vec<PublishCall> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let notified = self.notify.notified();
            let calls = self.calls();
            if calls.len() >= count {
                return calls;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                panic!("expected {} publish calls, saw {}", count, self.calls().len());
            }
        }
    }
}

#[async_trait]
impl PublishClient for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        host: &str,
        port: u16,
    ) -> Result<(), PublishError> {
        self.calls.lock().push(PublishCall {
            topic: topic.to_string(),
            payload,
            host: host.to_string(),
            port,
        });
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Takes `delay` to publish, then flags completion.
#[derive(Clone)]
pub struct SlowPublisher {
    delay: Duration,
    finished: Arc<AtomicBool>,
}

impl SlowPublisher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublishClient for SlowPublisher {
    async fn publish(
        &self,
        _topic: &str,
        _payload: Vec<u8>,
        _host: &str,
        _port: u16,
    ) -> Result<(), PublishError> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Always fails as if the broker refused the connection.
#[derive(Clone, Default)]
pub struct FailingPublisher;

#[async_trait]
impl PublishClient for FailingPublisher {
    async fn publish(
        &self,
        _topic: &str,
        _payload: Vec<u8>,
        host: &str,
        port: u16,
    ) -> Result<(), PublishError> {
        Err(PublishError::Connection {
            host: host.to_string(),
            port,
            reason: "connection refused".to_string(),
        })
    }
}
