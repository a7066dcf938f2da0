// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`Transport`] double that records publishes and can simulate
//! broker failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use consultease_core::topics::topic_matches;
use consultease_core::traits::{MessageHandler, Transport, TransportMessage};
use consultease_core::types::{Payload, QoS, WirePayload};
use consultease_core::ConsultEaseError;

/// One captured outbound publish.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: WirePayload,
    pub qos: QoS,
}

#[derive(Default)]
struct MockInner {
    published: Mutex<Vec<PublishedMessage>>,
    fail_publish: AtomicBool,
    connected: AtomicBool,
    handlers: RwLock<Vec<(String, Arc<dyn MessageHandler>)>>,
}

/// Mock transport: publishes are captured instead of sent, and inbound
/// messages are injected with [`MockTransport::deliver`].
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    /// A connected mock with no captured publishes.
    pub fn new() -> MockTransport {
        let transport = MockTransport::default();
        transport.inner.connected.store(true, Ordering::Release);
        transport
    }

    /// Make subsequent publishes fail (and report disconnected), or succeed
    /// again.
    pub fn set_broker_up(&self, up: bool) {
        self.inner.fail_publish.store(!up, Ordering::Release);
        self.inner.connected.store(up, Ordering::Release);
    }

    /// Snapshot of everything published so far.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.inner.published.lock().unwrap().clone()
    }

    /// Drain and return the captured publishes.
    pub fn take_published(&self) -> Vec<PublishedMessage> {
        std::mem::take(&mut self.inner.published.lock().unwrap())
    }

    /// Captured publishes to one topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.inner
            .published
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Inject an inbound message, invoking every matching registered
    /// handler before returning.
    pub async fn deliver(&self, topic: &str, raw: &[u8]) {
        let msg = TransportMessage {
            topic: topic.to_string(),
            payload: Payload::decode(raw),
        };
        let matching: Vec<Arc<dyn MessageHandler>> = self
            .inner
            .handlers
            .read()
            .await
            .iter()
            .filter(|(filter, _)| topic_matches(filter, topic))
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in matching {
            handler.on_message(msg.clone()).await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn publish(
        &self,
        topic: &str,
        payload: WirePayload,
        qos: QoS,
    ) -> Result<(), ConsultEaseError> {
        if self.inner.fail_publish.load(Ordering::Acquire) {
            return Err(ConsultEaseError::Transport {
                message: format!("broker down, publish to {topic} refused"),
                source: None,
            });
        }
        self.inner.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload,
            qos,
        });
        Ok(())
    }

    async fn register_topic_handler(
        &self,
        filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), ConsultEaseError> {
        self.inner
            .handlers
            .write()
            .await
            .push((filter.to_string(), handler));
        Ok(())
    }

    async fn unregister_topic_handler(&self, filter: &str) -> Result<(), ConsultEaseError> {
        self.inner
            .handlers
            .write()
            .await
            .retain(|(f, _)| f != filter);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }
}
