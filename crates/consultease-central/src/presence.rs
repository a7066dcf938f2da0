// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Faculty presence tracking from desk unit status broadcasts.
//!
//! Updates the faculty directory row and drains the offline queue when a
//! faculty becomes reachable again.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use consultease_core::topics::faculty_id_from_topic;
use consultease_core::traits::{CacheInvalidator, MessageHandler, TransportMessage};
use consultease_core::types::Payload;
use consultease_storage::queries::directory;
use consultease_storage::Database;

use crate::queue::OfflineQueue;

pub struct FacultyPresenceHandler {
    db: Database,
    queue: Arc<OfflineQueue>,
    cache: Arc<dyn CacheInvalidator>,
}

impl FacultyPresenceHandler {
    pub fn new(
        db: Database,
        queue: Arc<OfflineQueue>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> FacultyPresenceHandler {
        FacultyPresenceHandler { db, queue, cache }
    }
}

#[async_trait]
impl MessageHandler for FacultyPresenceHandler {
    async fn on_message(&self, msg: TransportMessage) {
        let Some(faculty_id) = faculty_id_from_topic(&msg.topic) else {
            debug!(topic = msg.topic, "status message without faculty id");
            return;
        };
        let Some(available) = availability_from_payload(&msg.payload) else {
            debug!(topic = msg.topic, "unrecognized status payload");
            return;
        };

        let previous = match directory::set_faculty_availability(&self.db, faculty_id, available)
            .await
        {
            Ok(previous) => previous,
            Err(e) => {
                warn!(faculty_id = faculty_id, error = %e, "presence update failed");
                return;
            }
        };
        let Some(previous) = previous else {
            warn!(faculty_id = faculty_id, "status broadcast for unknown faculty");
            return;
        };

        self.cache.invalidate_faculty_cache(faculty_id);

        if available && !previous {
            info!(faculty_id = faculty_id, "faculty reachable, draining queue");
            self.queue.drain(faculty_id).await;
        } else if available != previous {
            info!(faculty_id = faculty_id, available = available, "faculty availability changed");
        }
    }
}

/// Extract an availability flag from the heterogeneous status payloads the
/// desk unit firmware generations produce.
fn availability_from_payload(payload: &Payload) -> Option<bool> {
    match payload {
        Payload::Structured(value) => {
            if let Some(flag) = value["present"].as_bool() {
                return Some(flag);
            }
            if let Some(flag) = value["available"].as_bool() {
                return Some(flag);
            }
            value["status"].as_str().and_then(availability_word)
        }
        Payload::PlainText(text) => availability_word(text),
        Payload::Unrecognized(_) => None,
    }
}

fn availability_word(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "AVAILABLE" | "PRESENT" | "ONLINE" | "TRUE" => Some(true),
        "UNAVAILABLE" | "AWAY" | "OFFLINE" | "FALSE" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_from_plain_words() {
        assert_eq!(
            availability_from_payload(&Payload::PlainText("AVAILABLE".into())),
            Some(true)
        );
        assert_eq!(
            availability_from_payload(&Payload::PlainText("offline".into())),
            Some(false)
        );
        assert_eq!(
            availability_from_payload(&Payload::PlainText("rebooting".into())),
            None
        );
    }

    #[test]
    fn availability_from_structured_fields() {
        let json = |raw: &[u8]| Payload::decode(raw);
        assert_eq!(
            availability_from_payload(&json(br#"{"present":true}"#)),
            Some(true)
        );
        assert_eq!(
            availability_from_payload(&json(br#"{"available":false}"#)),
            Some(false)
        );
        assert_eq!(
            availability_from_payload(&json(br#"{"status":"AWAY"}"#)),
            Some(false)
        );
        assert_eq!(availability_from_payload(&json(br#"{"uptime":12}"#)), None);
    }
}
