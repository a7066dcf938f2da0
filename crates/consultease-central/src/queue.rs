// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Priority offline queue for outbound messages to unreachable faculty
//! desk units.
//!
//! Messages are held per faculty, ordered priority-first then FIFO within a
//! band. A message leaves the queue on a confirmed hand-off to the
//! transport, or when it hits the attempt ceiling and is dead-lettered.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use consultease_core::topics::SYSTEM_NOTIFICATIONS;
use consultease_core::traits::Transport;
use consultease_core::types::{MessagePriority, QoS, WirePayload};
use consultease_storage::database::now_timestamp;

/// A buffered outbound message awaiting hand-off to the transport.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub faculty_id: i64,
    pub consultation_id: i64,
    pub topic: String,
    pub payload: WirePayload,
    pub qos: QoS,
    pub priority: MessagePriority,
    pub enqueued_at: String,
    pub attempts: u32,
}

/// Per-faculty priority bands. FIFO within a band.
#[derive(Debug, Default)]
struct FacultyQueue {
    high: VecDeque<QueuedMessage>,
    normal: VecDeque<QueuedMessage>,
    low: VecDeque<QueuedMessage>,
}

impl FacultyQueue {
    fn band_mut(&mut self, priority: MessagePriority) -> &mut VecDeque<QueuedMessage> {
        match priority {
            MessagePriority::High => &mut self.high,
            MessagePriority::Normal => &mut self.normal,
            MessagePriority::Low => &mut self.low,
        }
    }

    /// At most one live outbound message per consultation: a newer message
    /// supersedes any queued one with the same consultation id.
    fn remove_consultation(&mut self, consultation_id: i64) -> bool {
        let mut removed = false;
        for band in [&mut self.high, &mut self.normal, &mut self.low] {
            let before = band.len();
            band.retain(|m| m.consultation_id != consultation_id);
            removed |= band.len() != before;
        }
        removed
    }

    fn pop(&mut self) -> Option<QueuedMessage> {
        self.high
            .pop_front()
            .or_else(|| self.normal.pop_front())
            .or_else(|| self.low.pop_front())
    }

    fn push_front(&mut self, msg: QueuedMessage) {
        let priority = msg.priority;
        self.band_mut(priority).push_front(msg);
    }

    fn len(&self) -> usize {
        self.high.len() + self.normal.len() + self.low.len()
    }
}

/// Observer invoked when a message exhausts its attempt ceiling.
pub type DeadLetterObserver = Box<dyn Fn(&QueuedMessage) + Send + Sync>;

/// Offline queue shared by the controller, the presence handler, and the
/// periodic sweeper.
///
/// The outer map lock is held only to look up a faculty's band set; drains
/// for different faculty ids then proceed independently under per-faculty
/// async locks.
pub struct OfflineQueue {
    transport: Arc<dyn Transport>,
    queues: Mutex<HashMap<i64, Arc<AsyncMutex<FacultyQueue>>>>,
    max_attempts: u32,
    dead_letter_observers: Mutex<Vec<DeadLetterObserver>>,
}

impl OfflineQueue {
    pub fn new(transport: Arc<dyn Transport>, max_attempts: u32) -> OfflineQueue {
        OfflineQueue {
            transport,
            queues: Mutex::new(HashMap::new()),
            max_attempts,
            dead_letter_observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer for dead-lettered messages.
    pub fn register_dead_letter_observer(&self, observer: DeadLetterObserver) {
        self.dead_letter_observers.lock().unwrap_or_else(|e| e.into_inner()).push(observer);
    }

    fn faculty_queue(&self, faculty_id: i64) -> Arc<AsyncMutex<FacultyQueue>> {
        self.queues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(faculty_id)
            .or_default()
            .clone()
    }

    /// Buffer an outbound message for later delivery.
    ///
    /// A queued message for the same consultation is superseded.
    pub async fn enqueue(
        &self,
        faculty_id: i64,
        consultation_id: i64,
        topic: String,
        payload: WirePayload,
        qos: QoS,
        priority: MessagePriority,
    ) {
        let queue = self.faculty_queue(faculty_id);
        let mut queue = queue.lock().await;
        if queue.remove_consultation(consultation_id) {
            debug!(
                faculty_id = faculty_id,
                consultation_id = consultation_id,
                "superseded queued message"
            );
        }
        queue.band_mut(priority).push_back(QueuedMessage {
            faculty_id,
            consultation_id,
            topic,
            payload,
            qos,
            priority,
            enqueued_at: now_timestamp(),
            attempts: 0,
        });
        info!(
            faculty_id = faculty_id,
            consultation_id = consultation_id,
            priority = %priority,
            pending = queue.len(),
            "message queued for offline faculty"
        );
    }

    /// Drop any queued message for a consultation, across all priority
    /// bands. Returns whether one was removed.
    ///
    /// Called when a consultation is cancelled, so a request buffered for
    /// an unreachable desk unit is never delivered after its cancel event.
    pub async fn remove(&self, faculty_id: i64, consultation_id: i64) -> bool {
        let queue = self.faculty_queue(faculty_id);
        let removed = queue.lock().await.remove_consultation(consultation_id);
        if removed {
            debug!(
                faculty_id = faculty_id,
                consultation_id = consultation_id,
                "queued message withdrawn"
            );
        }
        removed
    }

    /// Number of messages currently queued for a faculty.
    pub async fn len(&self, faculty_id: i64) -> usize {
        self.faculty_queue(faculty_id).lock().await.len()
    }

    /// Re-publish queued messages for one faculty in priority order.
    ///
    /// A message that fails again is re-queued at the front of its band with
    /// an incremented attempt count and the drain stops, since the broker is
    /// likely still unreachable. A message at the attempt ceiling is dropped
    /// and dead-lettered instead.
    pub async fn drain(&self, faculty_id: i64) {
        let queue = self.faculty_queue(faculty_id);
        let mut queue = queue.lock().await;
        while let Some(mut msg) = queue.pop() {
            match self
                .transport
                .publish(&msg.topic, msg.payload.clone(), msg.qos)
                .await
            {
                Ok(()) => {
                    info!(
                        faculty_id = faculty_id,
                        consultation_id = msg.consultation_id,
                        attempts = msg.attempts,
                        "queued message delivered"
                    );
                }
                Err(e) => {
                    msg.attempts += 1;
                    if msg.attempts >= self.max_attempts {
                        self.dead_letter(msg).await;
                    } else {
                        warn!(
                            faculty_id = faculty_id,
                            consultation_id = msg.consultation_id,
                            attempts = msg.attempts,
                            error = %e,
                            "redelivery failed, re-queued"
                        );
                        queue.push_front(msg);
                    }
                    break;
                }
            }
        }
    }

    /// Drain every faculty with pending messages. Used by the sweeper.
    pub async fn drain_all(&self) {
        let faculty_ids: Vec<i64> = self
            .queues
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect();
        for faculty_id in faculty_ids {
            self.drain(faculty_id).await;
        }
    }

    async fn dead_letter(&self, msg: QueuedMessage) {
        error!(
            faculty_id = msg.faculty_id,
            consultation_id = msg.consultation_id,
            attempts = msg.attempts,
            "delivery exhausted, message dropped"
        );
        {
            let observers = self.dead_letter_observers.lock().unwrap_or_else(|e| e.into_inner());
            for observer in observers.iter() {
                observer(&msg);
            }
        }
        // Operator-visible notification; best effort, the broker may well
        // still be down.
        let notice = WirePayload::Json(serde_json::json!({
            "type": "delivery_exhausted",
            "level": "error",
            "faculty_id": msg.faculty_id,
            "message": format!(
                "consultation {} undeliverable after {} attempts",
                msg.consultation_id, msg.attempts
            ),
        }));
        if let Err(e) = self
            .transport
            .publish(SYSTEM_NOTIFICATIONS, notice, QoS::AtMostOnce)
            .await
        {
            debug!(error = %e, "dead-letter notification not published");
        }
    }
}

/// Spawn the periodic sweep task. Runs until the token is cancelled.
pub fn spawn_sweeper(
    queue: Arc<OfflineQueue>,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a freshly started
        // process does not race its own bootstrap.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("offline queue sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    queue.drain_all().await;
                }
            }
        }
    })
}
