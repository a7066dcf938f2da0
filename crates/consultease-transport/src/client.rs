// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rumqttc-backed [`Transport`] implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use consultease_core::topics::topic_matches;
use consultease_core::traits::{MessageHandler, Transport, TransportMessage};
use consultease_core::types::{Payload, QoS, WirePayload};
use consultease_core::ConsultEaseError;

type HandlerRegistry = Arc<RwLock<Vec<(String, Arc<dyn MessageHandler>)>>>;

/// Connection parameters for [`MqttTransport::connect`].
#[derive(Debug, Clone)]
pub struct MqttTransportOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    pub publish_timeout: Duration,
    pub reconnect_delay: Duration,
}

/// MQTT client owning one persistent broker connection.
///
/// Cheap to clone; all clones share the connection, the handler registry,
/// and the connected flag.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    handlers: HandlerRegistry,
    publish_timeout: Duration,
    shutdown: CancellationToken,
}

impl MqttTransport {
    /// Start the transport and its background event loop.
    ///
    /// Returns immediately; the connection is established asynchronously and
    /// [`Transport::is_connected`] reflects its current state.
    pub fn connect(options: MqttTransportOptions) -> MqttTransport {
        let mut mqtt_options =
            MqttOptions::new(options.client_id.clone(), options.host.clone(), options.port);
        mqtt_options.set_keep_alive(options.keep_alive);

        let (client, event_loop) = AsyncClient::new(mqtt_options, 64);

        let transport = MqttTransport {
            client: client.clone(),
            connected: Arc::new(AtomicBool::new(false)),
            handlers: Arc::new(RwLock::new(Vec::new())),
            publish_timeout: options.publish_timeout,
            shutdown: CancellationToken::new(),
        };

        tokio::spawn(run_event_loop(
            event_loop,
            client,
            transport.connected.clone(),
            transport.handlers.clone(),
            transport.shutdown.clone(),
            options.reconnect_delay,
        ));

        info!(
            host = options.host,
            port = options.port,
            client_id = options.client_id,
            "mqtt transport started"
        );
        transport
    }

    /// Stop the background event loop. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn publish(
        &self,
        topic: &str,
        payload: WirePayload,
        qos: QoS,
    ) -> Result<(), ConsultEaseError> {
        let send = self
            .client
            .publish(topic, map_qos(qos), false, payload.encode());
        match tokio::time::timeout(self.publish_timeout, send).await {
            Ok(Ok(())) => {
                debug!(topic = topic, "published");
                Ok(())
            }
            Ok(Err(e)) => Err(ConsultEaseError::Transport {
                message: format!("publish to {topic} failed"),
                source: Some(Box::new(e)),
            }),
            Err(_) => Err(ConsultEaseError::Transport {
                message: format!("publish to {topic} timed out"),
                source: None,
            }),
        }
    }

    async fn register_topic_handler(
        &self,
        filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), ConsultEaseError> {
        self.handlers
            .write()
            .await
            .push((filter.to_string(), handler));
        // The subscribe request is queued by the client; the ConnAck
        // re-subscribe covers the not-yet-connected case as well.
        self.client
            .subscribe(filter, rumqttc::QoS::AtLeastOnce)
            .await
            .map_err(|e| ConsultEaseError::Transport {
                message: format!("subscribe to {filter} failed"),
                source: Some(Box::new(e)),
            })?;
        info!(filter = filter, "topic handler registered");
        Ok(())
    }

    async fn unregister_topic_handler(&self, filter: &str) -> Result<(), ConsultEaseError> {
        self.handlers.write().await.retain(|(f, _)| f != filter);
        self.client
            .unsubscribe(filter)
            .await
            .map_err(|e| ConsultEaseError::Transport {
                message: format!("unsubscribe from {filter} failed"),
                source: Some(Box::new(e)),
            })?;
        info!(filter = filter, "topic handler unregistered");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    handlers: HandlerRegistry,
    shutdown: CancellationToken,
    reconnect_delay: Duration,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("mqtt event loop stopping");
                break;
            }
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    connected.store(true, Ordering::Release);
                    info!("broker connected");
                    resubscribe(&client, &handlers).await;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let msg = TransportMessage {
                        topic: publish.topic.clone(),
                        payload: Payload::decode(&publish.payload),
                    };
                    let handlers = handlers.clone();
                    // One task per message so a slow handler never stalls
                    // the broker event loop.
                    tokio::spawn(async move {
                        dispatch(&handlers, msg).await;
                    });
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    connected.store(false, Ordering::Release);
                    warn!("broker sent disconnect");
                }
                Ok(_) => {}
                Err(e) => {
                    connected.store(false, Ordering::Release);
                    warn!(error = %e, "broker connection lost, retrying");
                    tokio::time::sleep(reconnect_delay).await;
                }
            }
        }
    }
}

/// Re-subscribe every registered filter after a (re)connect. The broker may
/// have dropped session state, so this runs on every ConnAck.
async fn resubscribe(client: &AsyncClient, handlers: &HandlerRegistry) {
    let filters: Vec<String> = handlers
        .read()
        .await
        .iter()
        .map(|(filter, _)| filter.clone())
        .collect();
    for filter in filters {
        if let Err(e) = client.subscribe(&filter, rumqttc::QoS::AtLeastOnce).await {
            warn!(filter = filter, error = %e, "resubscribe failed");
        }
    }
}

/// Invoke every handler whose filter matches the message topic.
async fn dispatch(handlers: &HandlerRegistry, msg: TransportMessage) {
    let matching: Vec<Arc<dyn MessageHandler>> = handlers
        .read()
        .await
        .iter()
        .filter(|(filter, _)| topic_matches(filter, &msg.topic))
        .map(|(_, handler)| handler.clone())
        .collect();
    if matching.is_empty() {
        debug!(topic = msg.topic, "no handler for topic");
        return;
    }
    for handler in matching {
        handler.on_message(msg.clone()).await;
    }
}

fn map_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}
