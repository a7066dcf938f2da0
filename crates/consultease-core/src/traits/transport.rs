// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pub/sub transport trait for broker client implementations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ConsultEaseError;
use crate::types::{Payload, QoS, WirePayload};

/// An inbound message as delivered to topic handlers.
///
/// The payload has already been decoded into the tagged variant at the
/// transport boundary; handlers match on it instead of probing raw bytes.
#[derive(Debug, Clone)]
pub struct TransportMessage {
    pub topic: String,
    pub payload: Payload,
}

/// A callback registered for a topic filter.
///
/// Handlers run on the transport's I/O context and may be invoked
/// concurrently with publish calls and with each other; implementations must
/// be idempotent and re-entrant-safe, and must not block on UI work.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, msg: TransportMessage);
}

/// Async pub/sub client owning one persistent broker connection.
///
/// `publish` succeeds once the message is handed to the underlying client
/// for send; it never waits for broker acknowledgment beyond a bounded
/// timeout. Reconnection is automatic and registered handlers survive it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand a payload to the broker connection.
    async fn publish(
        &self,
        topic: &str,
        payload: WirePayload,
        qos: QoS,
    ) -> Result<(), ConsultEaseError>;

    /// Register a handler for a topic filter (MQTT `+`/`#` wildcards).
    ///
    /// Multiple handlers may be registered for overlapping filters; all
    /// matching handlers are invoked for a given inbound message.
    async fn register_topic_handler(
        &self,
        filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), ConsultEaseError>;

    /// Remove all handlers registered for a topic filter.
    async fn unregister_topic_handler(&self, filter: &str) -> Result<(), ConsultEaseError>;

    /// Whether the broker connection is currently established.
    fn is_connected(&self) -> bool;
}
