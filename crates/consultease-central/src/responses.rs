// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The response correlator: folds heterogeneous inbound faculty desk unit
//! payloads into controller transitions.
//!
//! De-duplication is delegated to the transition guard: a re-delivered
//! response produces an `InvalidTransition`, logged at debug level, so
//! at-least-once delivery is safe.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use consultease_core::topics::faculty_id_from_topic;
use consultease_core::traits::{MessageHandler, TransportMessage};
use consultease_core::types::{FacultyResponse, Payload, ResponseType};
use consultease_core::ConsultEaseError;
use consultease_storage::database::now_timestamp;
use consultease_storage::queries::consultations;
use consultease_storage::Database;

use crate::controller::ConsultationController;

pub struct FacultyResponseHandler {
    controller: Arc<ConsultationController>,
    db: Database,
}

impl FacultyResponseHandler {
    pub fn new(controller: Arc<ConsultationController>, db: Database) -> FacultyResponseHandler {
        FacultyResponseHandler { controller, db }
    }

    async fn handle(&self, msg: &TransportMessage) -> Result<(), ConsultEaseError> {
        let response = parse_response(msg)?;

        let Some(target) = response.response_type.target_status() else {
            warn!(
                topic = msg.topic,
                response_type = ?response.response_type,
                "unrecognized response type dropped"
            );
            return Ok(());
        };

        let consultation_id = match response.consultation_id {
            Some(id) => id,
            // Legacy payloads carry no id; best-effort match against the
            // newest pending consultation for the claimed faculty.
            None => consultations::newest_pending_for_faculty(&self.db, response.faculty_id)
                .await?
                .map(|c| c.id)
                .ok_or_else(|| {
                    ConsultEaseError::Correlation(format!(
                        "no pending consultation for faculty {}",
                        response.faculty_id
                    ))
                })?,
        };

        let updated = self
            .controller
            .update_consultation_status(consultation_id, target)
            .await?;
        info!(
            consultation_id = updated.id,
            faculty_id = response.faculty_id,
            status = %updated.status,
            "faculty response applied"
        );
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for FacultyResponseHandler {
    async fn on_message(&self, msg: TransportMessage) {
        match self.handle(&msg).await {
            Ok(()) => {}
            Err(ConsultEaseError::Correlation(reason)) => {
                warn!(topic = msg.topic, reason = reason, "response not correlated");
            }
            Err(ConsultEaseError::InvalidTransition { id, from, to }) => {
                // Expected under broker re-delivery and overlapping filters.
                debug!(
                    consultation_id = id,
                    from = %from,
                    to = %to,
                    "duplicate or stale response ignored"
                );
            }
            Err(e) => {
                warn!(topic = msg.topic, error = %e, "response handling failed");
            }
        }
    }
}

/// Decode an inbound payload into a [`FacultyResponse`].
///
/// Structured payloads must carry a numeric-coercible `message_id` when they
/// carry one at all; a non-numeric id is a correlation failure, never
/// guessed around. Plain-text payloads are treated as bare legacy response
/// words with the faculty id taken from the topic.
fn parse_response(msg: &TransportMessage) -> Result<FacultyResponse, ConsultEaseError> {
    let faculty_from_topic = faculty_id_from_topic(&msg.topic);

    match &msg.payload {
        Payload::Structured(value) => {
            let response_type = value["response_type"]
                .as_str()
                .map(ResponseType::from_wire)
                .ok_or_else(|| {
                    ConsultEaseError::Correlation("structured payload without response_type".into())
                })?;
            let faculty_id = value["faculty_id"]
                .as_i64()
                .or(faculty_from_topic)
                .ok_or_else(|| {
                    ConsultEaseError::Correlation("no faculty id in payload or topic".into())
                })?;
            let consultation_id = match value.get("message_id") {
                None | Some(serde_json::Value::Null) => None,
                Some(serde_json::Value::Number(n)) => Some(n.as_i64().ok_or_else(|| {
                    ConsultEaseError::Correlation(format!("non-integer message_id: {n}"))
                })?),
                Some(serde_json::Value::String(s)) => {
                    Some(s.trim().parse::<i64>().map_err(|_| {
                        ConsultEaseError::Correlation(format!("non-numeric message_id: {s:?}"))
                    })?)
                }
                Some(other) => {
                    return Err(ConsultEaseError::Correlation(format!(
                        "unusable message_id: {other}"
                    )));
                }
            };
            Ok(FacultyResponse {
                faculty_id,
                response_type,
                consultation_id,
                status_text: value["status"].as_str().map(str::to_string),
                received_at: now_timestamp(),
            })
        }
        Payload::PlainText(text) => {
            let faculty_id = faculty_from_topic.ok_or_else(|| {
                ConsultEaseError::Correlation(format!(
                    "plain-text response on topic without faculty id: {}",
                    msg.topic
                ))
            })?;
            Ok(FacultyResponse {
                faculty_id,
                response_type: ResponseType::from_wire(text),
                consultation_id: None,
                status_text: None,
                received_at: now_timestamp(),
            })
        }
        Payload::Unrecognized(raw) => Err(ConsultEaseError::Correlation(format!(
            "undecodable {}-byte payload on {}",
            raw.len(),
            msg.topic
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consultease_core::types::ConsultationStatus;

    fn msg(topic: &str, raw: &[u8]) -> TransportMessage {
        TransportMessage {
            topic: topic.to_string(),
            payload: Payload::decode(raw),
        }
    }

    #[test]
    fn structured_response_with_string_id() {
        let parsed = parse_response(&msg(
            "consultease/faculty/2/responses",
            br#"{"response_type":"BUSY","message_id":"7","faculty_id":2}"#,
        ))
        .unwrap();
        assert_eq!(parsed.faculty_id, 2);
        assert_eq!(parsed.consultation_id, Some(7));
        assert_eq!(
            parsed.response_type.target_status(),
            Some(ConsultationStatus::Busy)
        );
    }

    #[test]
    fn structured_response_takes_faculty_from_topic() {
        let parsed = parse_response(&msg(
            "consultease/faculty/5/responses",
            br#"{"response_type":"ACKNOWLEDGE","message_id":3}"#,
        ))
        .unwrap();
        assert_eq!(parsed.faculty_id, 5);
        assert_eq!(parsed.consultation_id, Some(3));
    }

    #[test]
    fn non_numeric_message_id_is_correlation_failure() {
        let err = parse_response(&msg(
            "consultease/faculty/2/responses",
            br#"{"response_type":"BUSY","message_id":"abc","faculty_id":2}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ConsultEaseError::Correlation(_)));
    }

    #[test]
    fn missing_message_id_defers_to_fallback() {
        let parsed = parse_response(&msg(
            "consultease/faculty/2/responses",
            br#"{"response_type":"ACCEPTED","faculty_id":2}"#,
        ))
        .unwrap();
        assert_eq!(parsed.consultation_id, None);
    }

    #[test]
    fn bare_word_legacy_response() {
        let parsed =
            parse_response(&msg("faculty/4/responses", b"ACKNOWLEDGE")).unwrap();
        assert_eq!(parsed.faculty_id, 4);
        assert_eq!(parsed.consultation_id, None);
        assert_eq!(
            parsed.response_type.target_status(),
            Some(ConsultationStatus::Accepted)
        );
    }

    #[test]
    fn binary_garbage_is_correlation_failure() {
        let err = parse_response(&msg("faculty/4/responses", &[0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, ConsultEaseError::Correlation(_)));
    }
}
