// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `consultease serve` command implementation.
//!
//! Wires the storage layer, the MQTT transport, the offline queue, the
//! consultation controller, and the inbound handlers together, then runs
//! until a shutdown signal arrives. All services are constructed here once
//! and passed down as `Arc`s.

use std::sync::Arc;
use std::time::Duration;

use consultease_central::{
    queue::spawn_sweeper, ConsultationController, FacultyPresenceHandler, FacultyResponseHandler,
    OfflineQueue,
};
use consultease_config::ConsultEaseConfig;
use consultease_core::topics;
use consultease_core::traits::{NoopCacheInvalidator, Transport};
use consultease_core::ConsultEaseError;
use consultease_storage::Database;
use consultease_transport::{MqttTransport, MqttTransportOptions};
use tracing::info;

use crate::shutdown;

/// Run the central system server until SIGINT/SIGTERM.
pub async fn run_serve(config: ConsultEaseConfig) -> Result<(), ConsultEaseError> {
    init_tracing(&config.system.log_level);
    info!(name = config.system.name, "starting consultease serve");

    let db = Database::open_with_options(&config.storage.database_path, config.storage.wal_mode)
        .await?;

    let transport = MqttTransport::connect(MqttTransportOptions {
        host: config.broker.host.clone(),
        port: config.broker.port,
        client_id: config.broker.client_id.clone(),
        keep_alive: Duration::from_secs(config.broker.keep_alive_secs),
        publish_timeout: Duration::from_millis(config.broker.publish_timeout_ms),
        reconnect_delay: Duration::from_secs(config.broker.reconnect_delay_secs),
    });
    let transport_dyn: Arc<dyn Transport> = Arc::new(transport.clone());

    let queue = Arc::new(OfflineQueue::new(
        transport_dyn.clone(),
        config.queue.max_attempts,
    ));
    // The UI layer supplies a real cache when embedded; standalone serve
    // has no read-view cache.
    let cache = Arc::new(NoopCacheInvalidator);
    let controller = Arc::new(ConsultationController::new(
        db.clone(),
        transport_dyn.clone(),
        queue.clone(),
        cache.clone(),
    ));

    let responses = Arc::new(FacultyResponseHandler::new(controller.clone(), db.clone()));
    transport_dyn
        .register_topic_handler(topics::FACULTY_RESPONSES_FILTER, responses.clone())
        .await?;
    transport_dyn
        .register_topic_handler(topics::LEGACY_FACULTY_RESPONSES_FILTER, responses)
        .await?;

    let presence = Arc::new(FacultyPresenceHandler::new(
        db.clone(),
        queue.clone(),
        cache,
    ));
    transport_dyn
        .register_topic_handler(topics::FACULTY_STATUS_FILTER, presence)
        .await?;

    let cancel = shutdown::install_signal_handler();
    let sweeper = spawn_sweeper(
        queue.clone(),
        Duration::from_secs(config.queue.sweep_interval_secs),
        cancel.clone(),
    );
    info!(
        sweep_interval_secs = config.queue.sweep_interval_secs,
        max_attempts = config.queue.max_attempts,
        "offline queue sweeper started"
    );

    cancel.cancelled().await;

    info!("shutting down");
    let _ = sweeper.await;
    transport.shutdown();
    db.close().await?;
    info!("consultease serve shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("consultease={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
