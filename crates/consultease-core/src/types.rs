// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the ConsultEase crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a consultation.
///
/// Transitions only move forward through [`ConsultationStatus::permits`];
/// no transition re-enters `Pending` and there is no direct
/// `Pending -> Completed` edge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsultationStatus {
    Pending,
    Accepted,
    Busy,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    /// The transition guard: returns `true` if `self -> next` is a legal edge.
    pub fn permits(self, next: ConsultationStatus) -> bool {
        use ConsultationStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Busy)
                | (Pending, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
                | (Busy, Completed)
        )
    }

    /// Whether a consultation in this status can still be cancelled.
    pub fn cancellable(self) -> bool {
        matches!(self, ConsultationStatus::Pending | ConsultationStatus::Accepted)
    }
}

/// A student's request for faculty time. The central persisted entity.
///
/// Owned by exactly one student and targeting exactly one faculty member for
/// its entire lifetime. Each optional timestamp is set exactly once, on the
/// matching transition. Timestamps are RFC 3339 strings in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub student_id: i64,
    pub faculty_id: i64,
    pub request_message: String,
    pub course_code: Option<String>,
    pub status: ConsultationStatus,
    pub requested_at: String,
    pub accepted_at: Option<String>,
    pub busy_at: Option<String>,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Input for creating a new consultation row.
#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub student_id: i64,
    pub faculty_id: i64,
    pub request_message: String,
    pub course_code: Option<String>,
}

/// Filters for consultation queries. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ConsultationFilter {
    pub student_id: Option<i64>,
    pub faculty_id: Option<i64>,
    pub status: Option<Vec<ConsultationStatus>>,
}

/// A student directory row, joined into outbound request payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub department: String,
}

/// A faculty directory row, tracking desk unit reachability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub available: bool,
    pub last_seen: Option<String>,
}

/// Priority band for offline-queued messages. Higher drains first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
}

/// Delivery-assurance level requested from the transport.
///
/// Does not by itself prevent duplicate delivery; repeat application is made
/// safe by the status transition guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// An outbound payload handed to the transport.
///
/// Structured payloads become a canonical JSON text encoding; plain strings
/// pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePayload {
    Json(serde_json::Value),
    Text(String),
}

impl WirePayload {
    /// Serialize to the bytes sent over the wire.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            WirePayload::Json(value) => value.to_string().into_bytes(),
            WirePayload::Text(text) => text.clone().into_bytes(),
        }
    }
}

/// An inbound payload, decoded exactly once at the transport boundary.
///
/// Downstream logic matches on the variant instead of re-probing raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A JSON object.
    Structured(serde_json::Value),
    /// Valid UTF-8 that is not a JSON object.
    PlainText(String),
    /// Raw bytes that are not valid UTF-8.
    Unrecognized(Vec<u8>),
}

impl Payload {
    /// Decode raw broker bytes into the tagged variant.
    pub fn decode(raw: &[u8]) -> Payload {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(raw)
            && value.is_object()
        {
            return Payload::Structured(value);
        }
        match std::str::from_utf8(raw) {
            Ok(text) => Payload::PlainText(text.to_string()),
            Err(_) => Payload::Unrecognized(raw.to_vec()),
        }
    }
}

/// Response type claimed by a faculty desk unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseType {
    Acknowledge,
    Accepted,
    Busy,
    Unavailable,
    Other(String),
}

impl ResponseType {
    /// Parse the wire form, case-insensitively. Unknown strings become
    /// [`ResponseType::Other`] so callers can log what the device sent.
    pub fn from_wire(raw: &str) -> ResponseType {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ACKNOWLEDGE" => ResponseType::Acknowledge,
            "ACCEPTED" => ResponseType::Accepted,
            "BUSY" => ResponseType::Busy,
            "UNAVAILABLE" => ResponseType::Unavailable,
            _ => ResponseType::Other(raw.trim().to_string()),
        }
    }

    /// The status this response maps to, if any. Unrecognized types map to
    /// `None` and are dropped rather than guessed.
    pub fn target_status(&self) -> Option<ConsultationStatus> {
        match self {
            ResponseType::Acknowledge | ResponseType::Accepted => {
                Some(ConsultationStatus::Accepted)
            }
            ResponseType::Busy | ResponseType::Unavailable => Some(ConsultationStatus::Busy),
            ResponseType::Other(_) => None,
        }
    }
}

/// A parsed inbound faculty response, correlated to a consultation.
///
/// Ephemeral: constructed per inbound message, consumed immediately by the
/// correlator, never persisted.
#[derive(Debug, Clone)]
pub struct FacultyResponse {
    pub faculty_id: i64,
    pub response_type: ResponseType,
    /// Explicit consultation id, coerced from the wire's string form.
    pub consultation_id: Option<i64>,
    pub status_text: Option<String>,
    pub received_at: String,
}

/// Structured consultation request payload published to faculty desk units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPayload {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_department: String,
    pub faculty_id: i64,
    pub faculty_name: String,
    pub request_message: String,
    pub course_code: Option<String>,
    pub status: ConsultationStatus,
    pub requested_at: String,
}

/// Action string for cancellation control events.
pub const CANCEL_ACTION: &str = "CANCEL_CONSULTATION";

/// Cancellation control event published to the faculty's request topic.
///
/// The consultation id is sent as a string for the benefit of the embedded
/// JSON parsers on the desk units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelPayload {
    pub action: String,
    pub consultation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CancelPayload {
    pub fn new(consultation_id: i64) -> Self {
        Self {
            action: CANCEL_ACTION.to_string(),
            consultation_id: consultation_id.to_string(),
            student_name: None,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_permits_only_forward_edges() {
        use ConsultationStatus::*;
        assert!(Pending.permits(Accepted));
        assert!(Pending.permits(Busy));
        assert!(Pending.permits(Cancelled));
        assert!(Accepted.permits(Completed));
        assert!(Accepted.permits(Cancelled));
        assert!(Busy.permits(Completed));
    }

    #[test]
    fn guard_rejects_reentry_and_skips() {
        use ConsultationStatus::*;
        // No edge re-enters Pending.
        for from in [Accepted, Busy, Completed, Cancelled] {
            assert!(!from.permits(Pending));
        }
        // No direct Pending -> Completed.
        assert!(!Pending.permits(Completed));
        // Terminal states have no outgoing edges.
        for to in [Pending, Accepted, Busy, Completed, Cancelled] {
            assert!(!Completed.permits(to));
            assert!(!Cancelled.permits(to));
        }
        // Repeat application of the same status is a guard no-op.
        assert!(!Accepted.permits(Accepted));
        assert!(!Busy.permits(Busy));
    }

    #[test]
    fn cancellable_statuses() {
        use ConsultationStatus::*;
        assert!(Pending.cancellable());
        assert!(Accepted.cancellable());
        assert!(!Busy.cancellable());
        assert!(!Completed.cancellable());
        assert!(!Cancelled.cancellable());
    }

    #[test]
    fn status_wire_form_is_uppercase() {
        assert_eq!(ConsultationStatus::Pending.to_string(), "PENDING");
        assert_eq!(
            serde_json::to_string(&ConsultationStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
        assert_eq!(
            "BUSY".parse::<ConsultationStatus>().unwrap(),
            ConsultationStatus::Busy
        );
    }

    #[test]
    fn priority_ordering_high_first() {
        assert!(MessagePriority::High > MessagePriority::Normal);
        assert!(MessagePriority::Normal > MessagePriority::Low);
    }

    #[test]
    fn decode_json_object_is_structured() {
        let payload = Payload::decode(br#"{"response_type":"BUSY","message_id":"7"}"#);
        match payload {
            Payload::Structured(value) => {
                assert_eq!(value["response_type"], "BUSY");
            }
            other => panic!("expected structured payload, got {other:?}"),
        }
    }

    #[test]
    fn decode_plain_text_passes_through() {
        // A bare JSON scalar is still treated as text, not structured.
        assert_eq!(
            Payload::decode(b"ACKNOWLEDGE"),
            Payload::PlainText("ACKNOWLEDGE".to_string())
        );
        assert_eq!(
            Payload::decode(b"42"),
            Payload::PlainText("42".to_string())
        );
    }

    #[test]
    fn decode_invalid_utf8_is_unrecognized() {
        let raw = vec![0xff, 0xfe, 0x00];
        assert_eq!(Payload::decode(&raw), Payload::Unrecognized(raw.clone()));
    }

    #[test]
    fn response_type_mapping() {
        assert_eq!(
            ResponseType::from_wire("acknowledge").target_status(),
            Some(ConsultationStatus::Accepted)
        );
        assert_eq!(
            ResponseType::from_wire("ACCEPTED").target_status(),
            Some(ConsultationStatus::Accepted)
        );
        assert_eq!(
            ResponseType::from_wire("Busy").target_status(),
            Some(ConsultationStatus::Busy)
        );
        assert_eq!(
            ResponseType::from_wire("UNAVAILABLE").target_status(),
            Some(ConsultationStatus::Busy)
        );
        assert_eq!(ResponseType::from_wire("SNOOZE").target_status(), None);
    }

    #[test]
    fn cancel_payload_sends_string_id() {
        let payload = CancelPayload::new(42);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["action"], CANCEL_ACTION);
        assert_eq!(json["consultation_id"], "42");
        assert!(json.get("student_name").is_none());
    }

    #[test]
    fn wire_payload_encoding() {
        let json = WirePayload::Json(serde_json::json!({"a": 1}));
        assert_eq!(json.encode(), br#"{"a":1}"#.to_vec());
        let text = WirePayload::Text("Student: Ana".to_string());
        assert_eq!(text.encode(), b"Student: Ana".to_vec());
    }
}
